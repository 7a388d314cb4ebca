/// An Observe option value (RFC7641). On a request, only `0` (register) and
/// `1` (deregister) are meaningful. On a notification, it is a 24-bit
/// sequence number the client uses to discard stale out-of-order
/// notifications.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Observe(pub u32);

impl Observe {
  /// Register for observation (request-side Observe: 0).
  pub const REGISTER: Self = Self(0);
  /// Cancel observation (request-side Observe: 1).
  pub const DEREGISTER: Self = Self(1);

  /// Decode an Observe option value (0 to 3 bytes, big-endian, RFC7641
  /// section 2).
  pub fn decode(bytes: &[u8]) -> Option<Self> {
    if bytes.len() > 3 {
      return None;
    }
    let mut buf = [0u8; 4];
    buf[4 - bytes.len()..].copy_from_slice(bytes);
    Some(Self(u32::from_be_bytes(buf)))
  }

  /// Encode to the shortest big-endian representation.
  pub fn encode(&self) -> Vec<u8> {
    let bytes = self.0.to_be_bytes();
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(3);
    bytes[first_nonzero.min(3)..].to_vec()
  }

  /// Whether two notification sequence numbers indicate `self` is newer than
  /// `other`, per RFC7641 section 3.4's serial-arithmetic comparison (handles
  /// the 24-bit wraparound).
  pub fn is_newer_than(&self, other: &Self) -> bool {
    let diff = self.0.wrapping_sub(other.0) & 0x00FF_FFFF;
    diff != 0 && diff < (1 << 23)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn round_trip() {
    let obs = Observe(12345);
    assert_eq!(Observe::decode(&obs.encode()), Some(obs));
  }

  #[test]
  fn register_encodes_empty() {
    assert_eq!(Observe::REGISTER.encode(), Vec::<u8>::new());
  }

  #[test]
  fn newer_respects_wraparound() {
    let old = Observe(0x00FF_FFF0);
    let new = Observe(5);
    assert!(new.is_newer_than(&old));
    assert!(!old.is_newer_than(&new));
  }

  #[test]
  fn newer_simple_case() {
    assert!(Observe(2).is_newer_than(&Observe(1)));
    assert!(!Observe(1).is_newer_than(&Observe(2)));
  }
}
