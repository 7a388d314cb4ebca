//! CoAP message codec for the LwM2M client core.
//!
//! [`Message`] is a parsed CoAP message very close to the actual byte
//! layout (RFC7252). [`Operation`] sits one level above it: given a decoded
//! message's method, Observe option and target [`UriPath`], it infers which
//! LwM2M operation (Read, Write, Observe, Execute, ...) the request
//! represents.
//!
//! This crate only concerns itself with the CoAP wire format and the
//! method/path/Observe shape of an LwM2M request. Resource values, object
//! definitions and the payload codecs (plain-text, CBOR, SenML-CBOR, ...)
//! live in the `lwm2m` crate.

#![cfg_attr(not(test), forbid(missing_debug_implementations, unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![deny(missing_docs)]

pub mod code;
pub mod cursor;
pub mod id;
pub mod message;
pub mod operation;
pub mod opt;
pub mod parse_error;
pub mod path;
pub mod query;
pub mod token;
pub mod ty;

#[doc(inline)]
pub use code::{Code, CodeKind};
#[doc(inline)]
pub use cursor::Cursor;
#[doc(inline)]
pub use id::{Id, MsgIdGenerator};
#[doc(inline)]
pub use message::Message;
#[doc(inline)]
pub use operation::{Operation, OperationContext, OperationInferenceError};
#[doc(inline)]
pub use opt::{Block, Observe, Options};
#[doc(inline)]
pub use parse_error::{MessageParseError, MessageToBytesError, OptParseError};
#[doc(inline)]
pub use path::{PathParseError, UriPath};
#[doc(inline)]
pub use query::{Attribute, AttributeParseError};
#[doc(inline)]
pub use token::{Token, TokenGenerator};
#[doc(inline)]
pub use ty::Type;
