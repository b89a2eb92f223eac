use std::{fmt, ptr::NonNull};

use crate::{
  align::words_for,
  arena::Arena,
  block::{BlockInfo, Header, WORD_SIZE},
  config::HeapConfig,
  error::HeapError,
  observer::{HeapObserver, NoopObserver},
};

/// Aggregate view of the block chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  pub blocks: u32,
  pub free_blocks: u32,
  pub allocated_blocks: u32,
  /// Words held by free blocks, their headers included.
  pub free_words: u32,
  /// Words held by allocated blocks, their headers included.
  pub allocated_words: u32,
  pub largest_free: u32,
}

impl HeapStats {
  pub fn free_bytes(&self) -> usize {
    self.free_words as usize * WORD_SIZE
  }
}

/// First-fit heap over a fixed arena.
///
/// The heap is not thread-safe. It is neither `Send` nor `Sync`, and callers
/// that want to share one must serialize every `allocate`/`release`
/// themselves.
pub struct Heap {
  arena: Arena,
  observer: Box<dyn HeapObserver>,
  last_error: Option<HeapError>,
}

impl Heap {
  pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
    config.validate()?;

    Ok(Self {
      arena: Arena::reserve(config.capacity_words)?,
      observer: Box::new(NoopObserver),
      last_error: None,
    })
  }

  pub fn with_capacity(capacity_words: u32) -> Result<Self, HeapError> {
    Self::new(HeapConfig::new(capacity_words))
  }

  pub fn with_observer(
    mut self,
    observer: impl HeapObserver + 'static,
  ) -> Self {
    self.set_observer(observer);
    self
  }

  pub fn set_observer(
    &mut self,
    observer: impl HeapObserver + 'static,
  ) {
    self.observer = Box::new(observer);
  }

  pub fn capacity_words(&self) -> u32 {
    self.arena.capacity_words()
  }

  pub fn capacity_bytes(&self) -> usize {
    self.capacity_words() as usize * WORD_SIZE
  }

  /// Most recent failure of `allocate` or `release`. Successful calls leave
  /// it untouched.
  pub fn last_error(&self) -> Option<HeapError> {
    self.last_error
  }

  /// The chain is created on the first allocation; until then the first
  /// word is still zero.
  pub fn is_initialized(&self) -> bool {
    self.arena.read(0).size() != 0
  }

  /// Allocates at least `bytes` bytes and returns a pointer one word past
  /// the block header.
  pub fn allocate(
    &mut self,
    bytes: u32,
  ) -> Result<NonNull<u8>, HeapError> {
    let result = self.try_allocate(bytes);
    if let Err(error) = result {
      self.report(error);
    }
    result
  }

  /// Returns a block obtained from [`Heap::allocate`] to the heap.
  ///
  /// A null pointer is accepted and ignored. On failure nothing changes;
  /// the error is also kept in [`Heap::last_error`] and sent to the
  /// observer.
  pub fn release(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), HeapError> {
    if ptr.is_null() {
      return Ok(());
    }

    let result = self.try_release(ptr);
    if let Err(error) = result {
      self.report(error);
    }
    result
  }

  /// Merges every run of adjacent free blocks into its first block.
  ///
  /// Release only ever merges a block with its successor, so a block freed
  /// before its successor stays split from it until this sweep runs.
  /// Returns the number of merges performed.
  ///
  /// # Errors
  ///
  /// `CorruptionDetected` if the sweep meets a zero-size header. Merges made
  /// before that header stay applied; they are valid on their own.
  pub fn coalesce(&mut self) -> Result<usize, HeapError> {
    if !self.is_initialized() {
      return Ok(0);
    }

    let capacity = self.capacity_words();
    let mut merges = 0;
    let mut offset = 0u32;

    while offset < capacity {
      let header = self.arena.read(offset);
      if header.size() == 0 {
        return Err(HeapError::CorruptionDetected { offset });
      }

      if header.is_free() {
        while self.merge_forward(offset) {
          merges += 1;
        }
      }

      offset += self.arena.read(offset).size();
    }

    Ok(merges)
  }

  /// Every block on the chain, in address order.
  ///
  /// Stops at the end of the arena or at the first zero-size header, so an
  /// untouched heap yields an empty layout.
  pub fn dump_layout(&self) -> Vec<BlockInfo> {
    let capacity = self.capacity_words();
    let mut blocks = Vec::new();
    let mut offset = 0u32;

    while offset < capacity {
      let header = self.arena.read(offset);
      if header.size() == 0 {
        break;
      }

      blocks.push(BlockInfo::new(offset, header));

      match offset.checked_add(header.size()) {
        Some(next) => offset = next,
        None => break,
      }
    }

    blocks
  }

  /// Walks the chain and verifies that the blocks tile the arena exactly.
  pub fn check(&self) -> Result<(), HeapError> {
    if !self.is_initialized() {
      return Ok(());
    }

    let capacity = self.capacity_words() as u64;
    let mut offset = 0u64;
    let mut last = 0u32;

    while offset < capacity {
      last = offset as u32;
      let size = self.arena.read(last).size();
      if size == 0 {
        return Err(HeapError::CorruptionDetected { offset: last });
      }
      offset += size as u64;
    }

    if offset != capacity {
      return Err(HeapError::CorruptionDetected { offset: last });
    }

    Ok(())
  }

  /// Summarises the chain. An untouched heap counts as one free block
  /// spanning the arena.
  pub fn stats(&self) -> HeapStats {
    if !self.is_initialized() {
      let capacity = self.capacity_words();
      return HeapStats {
        blocks: 1,
        free_blocks: 1,
        free_words: capacity,
        largest_free: capacity,
        ..HeapStats::default()
      };
    }

    self.dump_layout().iter().fold(HeapStats::default(), |mut stats, block| {
      stats.blocks += 1;
      if block.is_free() {
        stats.free_blocks += 1;
        stats.free_words += block.size;
        stats.largest_free = stats.largest_free.max(block.size);
      } else {
        stats.allocated_blocks += 1;
        stats.allocated_words += block.size;
      }
      stats
    })
  }

  fn try_allocate(
    &mut self,
    bytes: u32,
  ) -> Result<NonNull<u8>, HeapError> {
    let words = words_for(bytes).ok_or(HeapError::InvalidSize { bytes })?;
    let capacity = self.capacity_words();
    let required = words as u64 + 1;

    if !self.is_initialized() {
      if required > capacity as u64 {
        return Err(HeapError::OutOfMemory {
          requested_words: required,
          capacity_words: capacity,
        });
      }

      self.arena.write(0, Header::free(capacity));
      self.observer.on_init(capacity);
    }

    let offset = self.find_block(words)?;
    // find_block guarantees required <= capacity, which fits in u32.
    let required = required as u32;
    let mut size = self.arena.read(offset).size();

    if size - required >= 2 {
      let remainder = size - required;
      self.arena.write(offset + required, Header::free(remainder));
      self.observer.on_split(offset, required, remainder);
      size = required;
    }

    self.arena.write(offset, Header::allocated(size));
    self.observer.on_allocate(bytes, offset, size);

    Ok(self.arena.data_ptr(offset))
  }

  /// First-fit scan from the start of the arena for a free block with room
  /// for `words` data words plus its header.
  fn find_block(
    &mut self,
    words: u32,
  ) -> Result<u32, HeapError> {
    let capacity = self.capacity_words();
    let required = words as u64 + 1;
    let mut offset = 0u32;

    loop {
      if offset as u64 + required > capacity as u64 {
        return Err(HeapError::OutOfMemory {
          requested_words: required,
          capacity_words: capacity,
        });
      }

      let header = self.arena.read(offset);
      self.observer.on_scan(offset, header, required as u32);

      if header.size() == 0 {
        return Err(HeapError::CorruptionDetected { offset });
      }

      if header.is_free() && header.size() as u64 >= required {
        return Ok(offset);
      }

      offset += header.size();
    }
  }

  fn try_release(
    &mut self,
    ptr: *mut u8,
  ) -> Result<(), HeapError> {
    let addr = ptr as usize;
    let offset = addr
      .checked_sub(WORD_SIZE)
      .and_then(|header| self.arena.offset_of(header))
      .ok_or(HeapError::InvalidPointer { addr })?;

    if !self.is_block_start(offset)? {
      return Err(HeapError::InvalidPointer { addr });
    }

    let header = self.arena.read(offset);
    if header.is_free() {
      return Err(HeapError::DoubleFree { offset });
    }
    if header.size() == 0 {
      return Err(HeapError::CorruptionDetected { offset });
    }

    self.arena.write(offset, header.with_allocated(false));
    self.observer.on_release(offset, header.size());
    self.merge_forward(offset);

    Ok(())
  }

  /// Whether a header starts at `target` on the current chain.
  fn is_block_start(
    &self,
    target: u32,
  ) -> Result<bool, HeapError> {
    if !self.is_initialized() {
      return Ok(false);
    }

    let capacity = self.capacity_words();
    let mut offset = 0u32;

    while offset <= target && offset < capacity {
      if offset == target {
        return Ok(true);
      }

      let size = self.arena.read(offset).size();
      if size == 0 {
        return Err(HeapError::CorruptionDetected { offset });
      }
      offset += size;
    }

    Ok(false)
  }

  /// Absorbs the block right after `offset` if it is free. Returns whether a
  /// merge happened.
  fn merge_forward(
    &mut self,
    offset: u32,
  ) -> bool {
    let capacity = self.capacity_words() as u64;
    let header = self.arena.read(offset);
    let next = offset as u64 + header.size() as u64;

    if next >= capacity {
      return false;
    }

    let next = next as u32;
    let successor = self.arena.read(next);
    if successor.is_allocated() || successor.size() == 0 {
      return false;
    }

    let merged = header.size() as u64 + successor.size() as u64;
    if offset as u64 + merged > capacity {
      return false;
    }

    let merged = merged as u32;
    self.arena.write(offset, header.with_size(merged));
    self.arena.clear(next);
    self.observer.on_coalesce(offset, next, merged);

    true
  }

  fn report(
    &mut self,
    error: HeapError,
  ) {
    self.observer.on_error(&error);
    self.last_error = Some(error);
  }
}

impl fmt::Debug for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Heap")
      .field("base", &self.arena.base())
      .field("capacity_words", &self.capacity_words())
      .field("last_error", &self.last_error)
      .finish_non_exhaustive()
  }
}

/// Prints the block chain, one block per line.
impl fmt::Display for Heap {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "heap @ {:?}, {} words", self.arena.base(), self.capacity_words())?;

    for block in self.dump_layout() {
      writeln!(
        f,
        "  @{:<8} {:>8} words ({:>8} data)  {}",
        block.offset,
        block.size,
        block.data_words(),
        block.state
      )?;
    }

    Ok(())
  }
}
