//! Random presentation helpers shared by the engine.
//!
//! Both helpers take a cryptographically secure source so that word order and
//! hint choice cannot be predicted from earlier games.

use rand::{CryptoRng, RngCore};

/// Map a uniform `u32` onto `0..bound` as `floor(r / 2^32 * bound)`.
fn scale(r: u32, bound: usize) -> usize {
  ((u64::from(r) * bound as u64) >> 32) as usize
}

/// Fisher–Yates shuffle, last index down to 1, one `u32` draw per step.
pub fn shuffle_in_place<T, R>(rng: &mut R, items: &mut [T])
where
  R: RngCore + CryptoRng + ?Sized,
{
  for i in (1..items.len()).rev() {
    let j = scale(rng.next_u32(), i + 1);
    items.swap(i, j);
  }
}

/// Uniform index in `0..len`, or `None` for an empty range.
pub fn random_index<R>(rng: &mut R, len: usize) -> Option<usize>
where
  R: RngCore + CryptoRng + ?Sized,
{
  if len == 0 {
    return None;
  }
  Some(scale(rng.next_u32(), len))
}
