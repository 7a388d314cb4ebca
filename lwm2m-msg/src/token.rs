use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tinyvec::ArrayVec;

/// A per-request correlation identifier, 0 to 8 bytes, matched between request
/// and response (RFC7252 section 5.3.1).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// An empty token.
  pub fn empty() -> Self {
    Self(ArrayVec::new())
  }

  /// Construct a token from its raw bytes (truncated to 8 if longer).
  pub fn new(bytes: &[u8]) -> Self {
    let mut v = ArrayVec::new();
    v.extend_from_slice(&bytes[..bytes.len().min(8)]);
    Self(v)
  }

  /// Hash an arbitrary-length sequence of bytes into an opaque 8-byte token.
  ///
  /// ```
  /// use lwm2m_msg::Token;
  ///
  /// let token = Token::opaque(&[0, 1, 2]);
  /// assert_eq!(token.0.len(), 8);
  /// ```
  pub fn opaque(data: &[u8]) -> Token {
    use blake2::digest::consts::U8;
    use blake2::{Blake2b, Digest};

    let mut digest = Blake2b::<U8>::new();
    digest.update(data);
    let bytes: [u8; 8] = digest.finalize().into();
    Token(bytes.into())
  }

  /// Bytes of the token.
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}

/// Generates [`Token`]s from a seed, deterministic per-seed so a device can
/// avoid guessable tokens without needing a true entropy source.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
  rng: ChaCha8Rng,
}

impl TokenGenerator {
  /// Create a generator from a 16-bit seed (see [`crate::MsgIdGenerator`] for
  /// the paired message-id sequence).
  pub fn new(seed: u16) -> Self {
    Self { rng: ChaCha8Rng::seed_from_u64(seed as u64) }
  }

  /// Produce the next token, 8 bytes wide.
  pub fn next(&mut self) -> Token {
    let bytes: [u8; 8] = self.rng.gen();
    Token(bytes.into())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn deterministic_per_seed() {
    let mut a = TokenGenerator::new(42);
    let mut b = TokenGenerator::new(42);
    assert_eq!(a.next(), b.next());
    assert_eq!(a.next(), b.next());
  }

  #[test]
  fn differs_across_seeds() {
    let mut a = TokenGenerator::new(1);
    let mut b = TokenGenerator::new(2);
    assert_ne!(a.next(), b.next());
  }
}
