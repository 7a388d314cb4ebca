use crate::MessageParseError;

/// Indicates if this message is of type Confirmable (0), Non-confirmable (1),
/// Acknowledgement (2), or Reset (3).
///
/// See [RFC7252 Section 3](https://datatracker.ietf.org/doc/html/rfc7252#section-3).
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug)]
pub enum Type {
  /// Some messages require an acknowledgement. When no packets are lost,
  /// each Confirmable message elicits exactly one return message of type
  /// Acknowledgement or type Reset.
  Con,
  /// Some messages do not require an acknowledgement, such as repeated
  /// sensor readings or observe notifications.
  Non,
  /// Acknowledges that a specific Confirmable message arrived. May carry a
  /// piggybacked response.
  Ack,
  /// Indicates that a specific message was received but could not be
  /// processed (e.g. after a reboot lost the matching exchange state).
  Reset,
}

impl TryFrom<u8> for Type {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    match b {
      | 0 => Ok(Type::Con),
      | 1 => Ok(Type::Non),
      | 2 => Ok(Type::Ack),
      | 3 => Ok(Type::Reset),
      | _ => Err(MessageParseError::InvalidType(b)),
    }
  }
}

impl From<Type> for u8 {
  fn from(ty: Type) -> u8 {
    match ty {
      | Type::Con => 0,
      | Type::Non => 1,
      | Type::Ack => 2,
      | Type::Reset => 3,
    }
  }
}
