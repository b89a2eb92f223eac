use thiserror::Error;

/// Errors reported by [`crate::Heap`].
///
/// None of these are fatal to the heap: a failed call leaves the arena
/// exactly as it was and the caller decides how to escalate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HeapError {
  /// No free block can hold the request, or the request alone exceeds the
  /// arena.
  #[error("out of memory: requested {requested_words} words, capacity {capacity_words} words")]
  OutOfMemory {
    requested_words: u64,
    capacity_words: u32,
  },

  /// The byte count cannot be converted to words without overflowing.
  #[error("invalid allocation size: {bytes} bytes")]
  InvalidSize { bytes: u32 },

  /// The pointer does not name a block of this heap.
  #[error("invalid pointer {addr:#x}")]
  InvalidPointer { addr: usize },

  /// The block at `offset` is already free.
  #[error("double free of block at word offset {offset}")]
  DoubleFree { offset: u32 },

  /// A header with size 0, or a chain that runs past the arena end.
  #[error("heap corruption detected at word offset {offset}")]
  CorruptionDetected { offset: u32 },

  /// The configured capacity is zero or cannot be encoded in a header.
  #[error("invalid heap capacity: {words} words (must be 1..={max})")]
  InvalidCapacity { words: u32, max: u32 },

  /// The operating system refused to map the arena.
  #[error("failed to reserve arena of {bytes} bytes (errno {errno})")]
  ReserveFailed { bytes: usize, errno: i32 },
}
