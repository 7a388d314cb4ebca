//! `lwm2m` is an LwM2M client core: the data model, payload codecs and
//! registration state machine that sit on top of the CoAP wire format
//! implemented by [`lwm2m_msg`].
//!
//! ## Scope
//! This crate owns everything above the CoAP byte layer:
//! - [`sdm`] — Objects, Instances, Resources and the transactional
//!   Write/Create/Delete protocol a Server's requests apply against.
//! - [`io`] — payload codecs (plain-text, opaque, CBOR, SenML-CBOR,
//!   LwM2M-CBOR, Register/Discover link-format).
//! - [`client`] — the per-Server lifecycle state machine (Register, Update,
//!   Deregister, Observe bookkeeping) driven by non-blocking polling.
//! - [`dispatch`] — wires a decoded request to the data model and back into
//!   a response, including block-wise transfer reassembly/chunking.
//! - [`objects`] — the Security, Server and Device standard objects.
//! - [`persistence`] — binary serialization of Server Object state across
//!   restarts.
//!
//! [`lwm2m_msg`] remains responsible for message framing, CoAP options and
//! inferring which LwM2M operation an incoming message represents.

// docs
#![doc(html_root_url = "https://docs.rs/lwm2m/0.1.0")]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
// -
// style
#![allow(clippy::unused_unit)]
// -
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(missing_copy_implementations)]
#![deny(unsafe_code)]
// -
// warnings
#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod io;
pub(crate) mod logging;
pub mod net;
pub mod objects;
pub mod persistence;
pub mod retry;
pub mod sdm;
pub mod time;
