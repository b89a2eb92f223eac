use std::fmt;

/// Size of one heap word in bytes. All sizes and offsets are counted in words.
pub const WORD_SIZE: usize = 4;

const SIZE_BITS: u32 = 30;
const SIZE_MASK: u32 = (1 << SIZE_BITS) - 1;
const ALLOCATED_BIT: u32 = 1 << SIZE_BITS;

/// Largest block size a header can encode, in words.
pub const MAX_BLOCK_WORDS: u32 = SIZE_MASK;

/// Per-block metadata packed into a single word.
///
/// ```text
///   31 30 29                                 0
///   ┌──┬──┬───────────────────────────────────┐
///   │R │A │          size (words)             │
///   └──┴──┴───────────────────────────────────┘
///   R = reserved, A = allocated
/// ```
///
/// `size` counts the header word itself, so a block always spans at least
/// one word. A header that reads size 0 is either an untouched arena or
/// corruption.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Header(u32);

impl Header {
  pub fn new(
    size: u32,
    allocated: bool,
  ) -> Self {
    debug_assert!(size <= SIZE_MASK);
    let flag = if allocated { ALLOCATED_BIT } else { 0 };
    Self((size & SIZE_MASK) | flag)
  }

  pub fn free(size: u32) -> Self {
    Self::new(size, false)
  }

  pub fn allocated(size: u32) -> Self {
    Self::new(size, true)
  }

  pub fn from_bits(bits: u32) -> Self {
    Self(bits)
  }

  pub fn to_bits(self) -> u32 {
    self.0
  }

  pub fn size(self) -> u32 {
    self.0 & SIZE_MASK
  }

  pub fn is_allocated(self) -> bool {
    self.0 & ALLOCATED_BIT != 0
  }

  pub fn is_free(self) -> bool {
    !self.is_allocated()
  }

  pub fn with_size(
    self,
    size: u32,
  ) -> Self {
    Self::new(size, self.is_allocated())
  }

  pub fn with_allocated(
    self,
    allocated: bool,
  ) -> Self {
    Self::new(self.size(), allocated)
  }
}

impl fmt::Debug for Header {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Header")
      .field("size", &self.size())
      .field("allocated", &self.is_allocated())
      .finish()
  }
}

/// Allocation state of a block as reported by [`crate::Heap::dump_layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
  Free,
  Allocated,
}

impl fmt::Display for BlockState {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      BlockState::Free => f.write_str("free"),
      BlockState::Allocated => f.write_str("allocated"),
    }
  }
}

/// One entry of a layout dump: where a block starts, how many words it
/// spans (header included) and whether it is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  pub offset: u32,
  pub size: u32,
  pub state: BlockState,
}

impl BlockInfo {
  pub fn new(
    offset: u32,
    header: Header,
  ) -> Self {
    let state = if header.is_allocated() {
      BlockState::Allocated
    } else {
      BlockState::Free
    };

    Self {
      offset,
      size: header.size(),
      state,
    }
  }

  /// Words available to the caller, excluding the header.
  pub fn data_words(&self) -> u32 {
    self.size.saturating_sub(1)
  }

  pub fn is_free(&self) -> bool {
    self.state == BlockState::Free
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_fits_in_one_word() {
    assert_eq!(std::mem::size_of::<Header>(), WORD_SIZE);
  }

  #[test]
  fn test_header_packing() {
    let header = Header::allocated(61);
    assert_eq!(header.size(), 61);
    assert!(header.is_allocated());
    assert_eq!(header.to_bits(), 61 | (1 << 30));

    let header = header.with_allocated(false);
    assert_eq!(header.size(), 61);
    assert!(header.is_free());

    let header = header.with_size(MAX_BLOCK_WORDS);
    assert_eq!(header.size(), MAX_BLOCK_WORDS);
    assert!(header.is_free());
  }

  #[test]
  fn test_zeroed_word_is_empty_free_header() {
    let header = Header::from_bits(0);
    assert_eq!(header.size(), 0);
    assert!(header.is_free());
  }

  #[test]
  fn test_reserved_bit_is_ignored() {
    let header = Header::from_bits((1 << 31) | 5);
    assert_eq!(header.size(), 5);
    assert!(header.is_free());
  }

  #[test]
  fn test_block_info() {
    let info = BlockInfo::new(3, Header::allocated(5));
    assert_eq!(info.offset, 3);
    assert_eq!(info.size, 5);
    assert_eq!(info.state, BlockState::Allocated);
    assert_eq!(info.data_words(), 4);
    assert!(!info.is_free());
  }
}
