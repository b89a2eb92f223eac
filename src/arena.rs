use std::{io, ptr, ptr::NonNull};

use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE, c_void, mmap, munmap};

use crate::{block::Header, block::WORD_SIZE, error::HeapError};

/// A fixed run of zeroed words obtained straight from the kernel.
///
/// ```text
///   base                                              base + capacity
///   ┌──────┬──────┬──────┬──────┬─────────────────────┬──────┐
///   │ w[0] │ w[1] │ w[2] │ w[3] │        ...          │w[C-1]│
///   └──────┴──────┴──────┴──────┴─────────────────────┴──────┘
/// ```
///
/// The mapping is private and anonymous, so every word starts out as zero,
/// which is what lets the heap recognise an untouched arena. It is unmapped
/// when the arena is dropped.
pub struct Arena {
  base: NonNull<u32>,
  capacity_words: u32,
}

impl Arena {
  pub fn reserve(capacity_words: u32) -> Result<Self, HeapError> {
    let bytes = capacity_words as usize * WORD_SIZE;

    let address = unsafe {
      mmap(
        ptr::null_mut(),
        bytes,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if address == MAP_FAILED {
      let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
      return Err(HeapError::ReserveFailed { bytes, errno });
    }

    let base = NonNull::new(address as *mut u32).ok_or(HeapError::ReserveFailed { bytes, errno: 0 })?;

    Ok(Self { base, capacity_words })
  }

  pub fn capacity_words(&self) -> u32 {
    self.capacity_words
  }

  pub fn base(&self) -> *mut u8 {
    self.base.as_ptr() as *mut u8
  }

  /// Reads the header stored at word `offset`.
  ///
  /// Callers keep `offset < capacity_words`; the heap only reaches here
  /// after bounding the offset against the arena.
  pub fn read(
    &self,
    offset: u32,
  ) -> Header {
    debug_assert!(offset < self.capacity_words, "header read past arena end");
    Header::from_bits(unsafe { self.base.as_ptr().add(offset as usize).read() })
  }

  /// Writes `header` at word `offset`. Same bound as [`Arena::read`].
  pub fn write(
    &mut self,
    offset: u32,
    header: Header,
  ) {
    debug_assert!(offset < self.capacity_words, "header write past arena end");
    unsafe { self.base.as_ptr().add(offset as usize).write(header.to_bits()) }
  }

  /// Zeroes the word at `offset`, erasing whatever header lived there.
  pub fn clear(
    &mut self,
    offset: u32,
  ) {
    self.write(offset, Header::from_bits(0));
  }

  /// Address handed to callers for the block whose header is at `offset`.
  /// Same bound as [`Arena::read`].
  pub fn data_ptr(
    &self,
    offset: u32,
  ) -> NonNull<u8> {
    debug_assert!(offset < self.capacity_words, "block outside arena");
    // At most one past the end of the mapping, which is a valid address.
    unsafe { self.base.add(offset as usize + 1).cast() }
  }

  /// Maps a raw address back to a word offset.
  ///
  /// Returns `None` unless `addr` is word-aligned relative to the base and
  /// falls within `[base, base + capacity)`.
  pub fn offset_of(
    &self,
    addr: usize,
  ) -> Option<u32> {
    let base = self.base.as_ptr() as usize;
    let distance = addr.checked_sub(base)?;

    if distance % WORD_SIZE != 0 {
      return None;
    }

    let offset = distance / WORD_SIZE;
    if offset >= self.capacity_words as usize {
      return None;
    }

    Some(offset as u32)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe {
      munmap(self.base.as_ptr() as *mut c_void, self.capacity_words as usize * WORD_SIZE);
    }
  }
}
