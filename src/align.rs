use crate::block::WORD_SIZE;

/// Calculates how many heap words are needed to hold `bytes`, rounding up.
///
/// Returns `None` when the rounding overflows a `u32`.
///
/// # Examples
///
/// ```rust
/// use rheap::align::words_for;
///
/// assert_eq!(words_for(8), Some(2));
/// assert_eq!(words_for(13), Some(4));
/// assert_eq!(words_for(u32::MAX), None);
/// ```
pub fn words_for(bytes: u32) -> Option<u32> {
  let word = WORD_SIZE as u32;
  bytes.checked_add(word - 1).map(|rounded| rounded / word)
}
