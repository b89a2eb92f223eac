use crate::{block::MAX_BLOCK_WORDS, error::HeapError};

/// Construction parameters for a [`crate::Heap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Arena capacity in words, headers included. Fixed for the heap's
  /// lifetime.
  pub capacity_words: u32,
}

impl HeapConfig {
  /// Just under 1 MiB worth of words.
  pub const DEFAULT_CAPACITY_WORDS: u32 = (1024 * 1024 / 4) - 1;

  /// A single block must be able to span the whole arena, so capacity is
  /// bounded by what a header can encode.
  pub const MAX_CAPACITY_WORDS: u32 = MAX_BLOCK_WORDS;

  pub fn new(capacity_words: u32) -> Self {
    Self { capacity_words }
  }

  pub fn validate(&self) -> Result<(), HeapError> {
    if self.capacity_words == 0 || self.capacity_words > Self::MAX_CAPACITY_WORDS {
      return Err(HeapError::InvalidCapacity {
        words: self.capacity_words,
        max: Self::MAX_CAPACITY_WORDS,
      });
    }

    Ok(())
  }

  pub fn capacity_bytes(&self) -> usize {
    self.capacity_words as usize * crate::WORD_SIZE
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY_WORDS)
  }
}
