use core::fmt;

/// Errors encounterable while parsing a [`crate::Message`] from bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageParseError {
  /// Reached end of stream before parsing was finished.
  UnexpectedEndOfStream,
  /// The 2-bit version field was not `1`.
  InvalidVersion(u8),
  /// Token length nibble was > 8 (RFC7252 section 3).
  InvalidTokenLength(u8),
  /// The message type is invalid (see [`crate::Type`]).
  InvalidType(u8),
  /// Error parsing an option.
  OptParseError(OptParseError),
  /// The payload exceeded the caller-supplied buffer capacity.
  PayloadTooLong(usize),
}

impl MessageParseError {
  /// Shorthand for [`MessageParseError::UnexpectedEndOfStream`].
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl fmt::Display for MessageParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::UnexpectedEndOfStream => write!(f, "unexpected end of stream"),
      | Self::InvalidVersion(v) => write!(f, "invalid CoAP version {v}"),
      | Self::InvalidTokenLength(l) => write!(f, "invalid token length {l}"),
      | Self::InvalidType(t) => write!(f, "invalid message type {t}"),
      | Self::OptParseError(e) => write!(f, "option parse error: {e}"),
      | Self::PayloadTooLong(n) => write!(f, "payload too long ({n} bytes)"),
    }
  }
}

impl std::error::Error for MessageParseError {}

impl From<OptParseError> for MessageParseError {
  fn from(e: OptParseError) -> Self {
    Self::OptParseError(e)
  }
}

/// Errors encounterable while parsing a CoAP option from bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptParseError {
  /// No more options remain (the `0xFF` payload marker or end of stream was hit).
  OptionsExhausted,
  /// An option's delta or length nibble was the reserved value `15` outside of
  /// the payload marker position.
  ReservedNibble,
  /// Stream ended mid-option.
  UnexpectedEndOfStream,
  /// Options did not arrive in ascending-number order.
  OutOfOrder,
  /// Too many options were present for the caller's declared capacity.
  TooManyOptions(usize),
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`].
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl fmt::Display for OptParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::OptionsExhausted => write!(f, "no more options"),
      | Self::ReservedNibble => write!(f, "reserved option nibble value 15"),
      | Self::UnexpectedEndOfStream => write!(f, "unexpected end of stream while parsing option"),
      | Self::OutOfOrder => write!(f, "options arrived out of ascending order"),
      | Self::TooManyOptions(n) => write!(f, "too many options ({n})"),
    }
  }
}

impl std::error::Error for OptParseError {}

/// Errors encounterable while serializing a [`crate::Message`] to bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageToBytesError {
  /// The token was longer than 8 bytes.
  TokenTooLong(usize),
  /// An option value exceeded the 16-bit extended length encoding (65804 bytes).
  OptionValueTooLong(usize),
}

impl fmt::Display for MessageToBytesError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::TokenTooLong(n) => write!(f, "token too long ({n} bytes, max 8)"),
      | Self::OptionValueTooLong(n) => write!(f, "option value too long ({n} bytes)"),
    }
  }
}

impl std::error::Error for MessageToBytesError {}
