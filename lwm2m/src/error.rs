use core::fmt;

use lwm2m_msg::{Code, MessageParseError, MessageToBytesError};

/// Errors from the data model transaction protocol (begin/read/write/commit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmError {
  /// No Object with this ID is registered.
  NoSuchObject(u16),
  /// No Instance with this ID exists on the targeted Object.
  NoSuchInstance(u16, u16),
  /// No Resource with this ID is defined on the targeted Object.
  NoSuchResource(u16, u16),
  /// The targeted Resource does not support the attempted operation
  /// (e.g. a write to a read-only resource, or an EXECUTE on a non-E
  /// resource).
  OperationNotAllowed,
  /// A write supplied a value whose type did not match the resource's
  /// declared type.
  TypeMismatch,
  /// A mutation was attempted outside of an open transaction, or
  /// `read_entry`/`write_entry` was called without a prior `operation_begin`.
  NoActiveTransaction,
  /// `operation_begin` was called while a transaction was already open.
  TransactionAlreadyOpen,
  /// `operation_validate` rejected the pending mutation set.
  ValidationFailed,
  /// The handler registered for this resource returned an application-level
  /// failure.
  HandlerFailed,
  /// The targeted Object lacks a handler required by the attempted
  /// operation (`inst_create` for CREATE, `inst_reset` for WRITE_REPLACE on
  /// an Instance, `res_execute` for EXECUTE).
  NoHandler,
}

impl DmError {
  /// The CoAP response code this error maps to (§4.3's 1:1 error taxonomy).
  pub fn to_code(&self) -> Code {
    match self {
      | Self::NoSuchObject(_) | Self::NoSuchInstance(..) | Self::NoSuchResource(..) => {
        Code::NOT_FOUND
      },
      | Self::OperationNotAllowed => Code::METHOD_NOT_ALLOWED,
      | Self::TypeMismatch | Self::ValidationFailed => Code::BAD_REQUEST,
      | Self::NoActiveTransaction | Self::TransactionAlreadyOpen | Self::HandlerFailed
      | Self::NoHandler => Code::INTERNAL_SERVER_ERROR,
    }
  }
}

impl fmt::Display for DmError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::NoSuchObject(oid) => write!(f, "no such object /{oid}"),
      | Self::NoSuchInstance(oid, iid) => write!(f, "no such instance /{oid}/{iid}"),
      | Self::NoSuchResource(oid, rid) => write!(f, "no such resource /{oid}/_/{rid}"),
      | Self::OperationNotAllowed => write!(f, "operation not allowed on this resource"),
      | Self::TypeMismatch => write!(f, "value type did not match resource type"),
      | Self::NoActiveTransaction => write!(f, "no active data model transaction"),
      | Self::TransactionAlreadyOpen => write!(f, "a data model transaction is already open"),
      | Self::ValidationFailed => write!(f, "transaction validation failed"),
      | Self::HandlerFailed => write!(f, "resource handler failed"),
      | Self::NoHandler => write!(f, "object lacks a handler required by this operation"),
    }
  }
}

impl std::error::Error for DmError {}

/// Errors from the payload codecs (plain-text, opaque, CBOR, SenML-CBOR,
/// LwM2M-CBOR, link-format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
  /// The payload bytes did not match the expected format.
  Format,
  /// A numeric value's type was ambiguous and the caller did not supply a
  /// disambiguation hint (plain-text codec only).
  WantTypeDisambiguation,
  /// The payload nested structure exceeded the maximum supported depth.
  NestingTooDeep,
  /// The caller's output buffer was too small to hold the encoded value;
  /// more `get_payload` calls are needed.
  BufferTooSmall,
  /// A block-wise transfer's blocks did not arrive in strict sequence.
  BlockOutOfSequence,
}

impl fmt::Display for CodecError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Format => write!(f, "malformed payload"),
      | Self::WantTypeDisambiguation => write!(f, "ambiguous numeric type needs disambiguation"),
      | Self::NestingTooDeep => write!(f, "payload nesting exceeded the maximum depth"),
      | Self::BufferTooSmall => write!(f, "output buffer too small"),
      | Self::BlockOutOfSequence => write!(f, "block-wise transfer block out of sequence"),
    }
  }
}

impl std::error::Error for CodecError {}

/// Top-level error type for the client state machine.
#[derive(Debug)]
pub enum ClientError {
  /// A socket operation failed.
  Socket(std::io::Error),
  /// A received message failed to parse.
  Parse(MessageParseError),
  /// An outgoing message failed to serialize.
  Serialize(MessageToBytesError),
  /// The data model rejected an operation.
  Dm(DmError),
  /// A payload codec rejected an operation.
  Codec(CodecError),
  /// A CONfirmable message was retried the maximum number of times without
  /// an Acknowledgement.
  MessageNeverAcked,
  /// The registration lifetime expired without a successful Update.
  RegistrationExpired,
  /// The server rejected registration or bootstrap with this response code.
  ServerRejected(lwm2m_msg::Code),
}

impl fmt::Display for ClientError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::Socket(e) => write!(f, "socket error: {e}"),
      | Self::Parse(e) => write!(f, "message parse error: {e}"),
      | Self::Serialize(e) => write!(f, "message serialize error: {e}"),
      | Self::Dm(e) => write!(f, "data model error: {e}"),
      | Self::Codec(e) => write!(f, "codec error: {e}"),
      | Self::MessageNeverAcked => write!(f, "confirmable message was never acked"),
      | Self::RegistrationExpired => write!(f, "registration lifetime expired"),
      | Self::ServerRejected(code) => write!(f, "server rejected request with {code}"),
    }
  }
}

impl std::error::Error for ClientError {}

impl From<DmError> for ClientError {
  fn from(e: DmError) -> Self {
    Self::Dm(e)
  }
}

impl From<CodecError> for ClientError {
  fn from(e: CodecError) -> Self {
    Self::Codec(e)
  }
}

impl From<MessageParseError> for ClientError {
  fn from(e: MessageParseError) -> Self {
    Self::Parse(e)
  }
}

impl From<MessageToBytesError> for ClientError {
  fn from(e: MessageToBytesError) -> Self {
    Self::Serialize(e)
  }
}
