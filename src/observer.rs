//! Optional hooks into the heap's internals.
//!
//! The heap reports what it does to a [`HeapObserver`]. None of these calls
//! can influence the allocator; they exist for tracing and debugging.

use crate::{block::Header, error::HeapError};

/// Receives events from a [`crate::Heap`]. Every method defaults to a no-op.
pub trait HeapObserver {
  /// The arena was formatted as a single free block.
  fn on_init(
    &mut self,
    _capacity_words: u32,
  ) {
  }

  /// The locator inspected the header at `offset` while looking for
  /// `required` words.
  fn on_scan(
    &mut self,
    _offset: u32,
    _header: Header,
    _required: u32,
  ) {
  }

  /// A free block at `offset` was cut down to `kept` words and a new free
  /// block of `remainder` words was created right after it.
  fn on_split(
    &mut self,
    _offset: u32,
    _kept: u32,
    _remainder: u32,
  ) {
  }

  /// The free block at `offset` absorbed the free block at `absorbed`.
  fn on_coalesce(
    &mut self,
    _offset: u32,
    _absorbed: u32,
    _size: u32,
  ) {
  }

  fn on_allocate(
    &mut self,
    _bytes: u32,
    _offset: u32,
    _size: u32,
  ) {
  }

  fn on_release(
    &mut self,
    _offset: u32,
    _size: u32,
  ) {
  }

  fn on_error(
    &mut self,
    _error: &HeapError,
  ) {
  }
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl HeapObserver for NoopObserver {}

/// Observer that forwards events to the [`log`] facade under the `rheap`
/// target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl HeapObserver for LogObserver {
  fn on_init(
    &mut self,
    capacity_words: u32,
  ) {
    log::debug!(target: "rheap", "init arena: one free block of {} words", capacity_words);
  }

  fn on_scan(
    &mut self,
    offset: u32,
    header: Header,
    required: u32,
  ) {
    log::trace!(
      target: "rheap",
      "scan @{}: size={} allocated={} (need {})",
      offset,
      header.size(),
      header.is_allocated(),
      required
    );
  }

  fn on_split(
    &mut self,
    offset: u32,
    kept: u32,
    remainder: u32,
  ) {
    log::debug!(
      target: "rheap",
      "split @{}: kept {} words, free remainder of {} words @{}",
      offset,
      kept,
      remainder,
      offset + kept
    );
  }

  fn on_coalesce(
    &mut self,
    offset: u32,
    absorbed: u32,
    size: u32,
  ) {
    log::debug!(target: "rheap", "coalesce @{}: absorbed @{}, now {} words", offset, absorbed, size);
  }

  fn on_allocate(
    &mut self,
    bytes: u32,
    offset: u32,
    size: u32,
  ) {
    log::debug!(target: "rheap", "allocate({}) -> block @{} ({} words)", bytes, offset, size);
  }

  fn on_release(
    &mut self,
    offset: u32,
    size: u32,
  ) {
    log::debug!(target: "rheap", "release block @{} ({} words)", offset, size);
  }

  fn on_error(
    &mut self,
    error: &HeapError,
  ) {
    log::warn!(target: "rheap", "{}", error);
  }
}
