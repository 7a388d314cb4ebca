use crate::code::Code;
use crate::cursor::Cursor;
use crate::id::Id;
use crate::opt::Options;
use crate::parse_error::{MessageParseError, MessageToBytesError};
use crate::token::Token;
use crate::ty::Type;

const VERSION: u8 = 1;
const PAYLOAD_MARKER: u8 = 0xFF;

/// A parsed CoAP message: header, code, token, options and payload
/// (RFC7252 section 3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
  /// Confirmable, Non-confirmable, Acknowledgement or Reset.
  pub ty: Type,
  /// Request or response code.
  pub code: Code,
  /// Message id, for deduplication at the UDP binding.
  pub id: Id,
  /// Request/response correlation token.
  pub token: Token,
  /// Options, already grouped and ordered by number.
  pub opts: Options,
  /// Message body, empty when there is no payload marker on the wire.
  pub payload: Vec<u8>,
}

impl Message {
  /// Parse a message from its wire representation.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageParseError> {
    let mut cur = Cursor::new(bytes);

    let head = cur.next().ok_or(MessageParseError::eof())?;
    let ver = head >> 6;
    if ver != VERSION {
      return Err(MessageParseError::InvalidVersion(ver));
    }

    let ty_bits = (head >> 4) & 0b11;
    let ty = Type::try_from(ty_bits).map_err(|_| MessageParseError::InvalidType(ty_bits))?;

    let tkl = head & 0b1111;
    if tkl > 8 {
      return Err(MessageParseError::InvalidTokenLength(tkl));
    }

    let code = Code::from(cur.next().ok_or(MessageParseError::eof())?);

    let id_bytes = cur.take_exact(2).ok_or(MessageParseError::eof())?;
    let id = Id(u16::from_be_bytes([id_bytes[0], id_bytes[1]]));

    let token_bytes = cur.take_exact(tkl as usize).ok_or(MessageParseError::eof())?;
    let token = Token::new(token_bytes);

    let opts = Options::parse(&mut cur)?;
    let payload = cur.take_rest().to_vec();

    Ok(Self { ty, code, id, token, opts, payload })
  }

  /// Serialize this message to its wire representation.
  pub fn to_bytes(&self) -> Result<Vec<u8>, MessageToBytesError> {
    let tkl = self.token.as_bytes().len();
    if tkl > 8 {
      return Err(MessageToBytesError::TokenTooLong(tkl));
    }

    let mut out = Vec::with_capacity(4 + tkl + self.payload.len());

    let head = (VERSION << 6) | (u8::from(self.ty) << 4) | tkl as u8;
    out.push(head);
    out.push(self.code.into());
    out.extend_from_slice(&self.id.0.to_be_bytes());
    out.extend_from_slice(self.token.as_bytes());

    self.opts.encode(&mut out);

    if !self.payload.is_empty() {
      out.push(PAYLOAD_MARKER);
      out.extend_from_slice(&self.payload);
    }

    Ok(out)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::opt::number;

  fn sample() -> Message {
    let mut opts = Options::new();
    opts.add(number::URI_PATH, b"3".to_vec());
    opts.add(number::URI_PATH, b"0".to_vec());
    opts.add(number::CONTENT_FORMAT, vec![60]);

    Message { ty: Type::Con,
              code: Code::GET,
              id: Id(0x1234),
              token: Token::new(&[0xAB, 0xCD]),
              opts,
              payload: b"hello".to_vec() }
  }

  #[test]
  fn round_trips() {
    let msg = sample();
    let bytes = msg.to_bytes().unwrap();
    let parsed = Message::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, msg);
  }

  #[test]
  fn empty_payload_omits_marker() {
    let mut msg = sample();
    msg.payload = vec![];
    let bytes = msg.to_bytes().unwrap();
    assert!(!bytes.contains(&PAYLOAD_MARKER));
  }

  #[test]
  fn rejects_bad_version() {
    let mut bytes = sample().to_bytes().unwrap();
    bytes[0] = 0b10_00_0010;
    assert_eq!(Message::from_bytes(&bytes).unwrap_err(), MessageParseError::InvalidVersion(2));
  }

  #[test]
  fn rejects_token_length_over_8() {
    let mut bytes = sample().to_bytes().unwrap();
    bytes[0] = (VERSION << 6) | (u8::from(Type::Con) << 4) | 9;
    assert_eq!(Message::from_bytes(&bytes).unwrap_err(),
               MessageParseError::InvalidTokenLength(9));
  }
}
