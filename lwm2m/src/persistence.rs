//! Binary persistence for Security/Server object instances: a 4-byte magic
//! (`b"SRV"` plus a version byte) followed by a length-prefixed list of
//! records, each field encoded big-endian.
//!
//! Grounded in `modules/server/src/persistence.c` and
//! `server_persistence.c`'s `MAGIC`/`MAGIC_V0`/`MAGIC_V1` header and
//! `persist_u16`/`persist_u32`/count-prefixed array encoding (`htons`/
//! `htonl` — i.e. big-endian). This is intentionally a small fixed binary
//! layout rather than a generic serde format, matching the original.

use std::io::{Read, Write};

use crate::error::CodecError;

const MAGIC: [u8; 3] = *b"SRV";
const VERSION: u8 = 1;

/// One persisted Server Object instance's registration-relevant fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerRecord {
  /// Object Instance ID.
  pub iid: u16,
  /// Short Server ID (resource 0).
  pub short_server_id: u16,
  /// Lifetime, seconds (resource 1).
  pub lifetime_sec: u32,
  /// Notification Storing (resource 6).
  pub notification_storing: bool,
  /// Binding (resource 7), stored as UTF-8.
  pub binding: String,
}

fn write_u16(out: &mut Vec<u8>, v: u16) {
  out.extend_from_slice(&v.to_be_bytes());
}

fn write_u32(out: &mut Vec<u8>, v: u32) {
  out.extend_from_slice(&v.to_be_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
  write_u32(out, s.len() as u32);
  out.extend_from_slice(s.as_bytes());
}

fn read_u16(input: &mut impl Read) -> Result<u16, CodecError> {
  let mut buf = [0u8; 2];
  input.read_exact(&mut buf).map_err(|_| CodecError::Format)?;
  Ok(u16::from_be_bytes(buf))
}

fn read_u32(input: &mut impl Read) -> Result<u32, CodecError> {
  let mut buf = [0u8; 4];
  input.read_exact(&mut buf).map_err(|_| CodecError::Format)?;
  Ok(u32::from_be_bytes(buf))
}

fn read_string(input: &mut impl Read) -> Result<String, CodecError> {
  let len = read_u32(input)? as usize;
  let mut buf = vec![0u8; len];
  input.read_exact(&mut buf).map_err(|_| CodecError::Format)?;
  String::from_utf8(buf).map_err(|_| CodecError::Format)
}

/// Serialize a set of Server Object records.
pub fn store(records: &[ServerRecord]) -> Vec<u8> {
  let mut out = Vec::new();
  out.extend_from_slice(&MAGIC);
  out.push(VERSION);
  write_u32(&mut out, records.len() as u32);

  for record in records {
    write_u16(&mut out, record.iid);
    write_u16(&mut out, record.short_server_id);
    write_u32(&mut out, record.lifetime_sec);
    out.push(record.notification_storing as u8);
    write_string(&mut out, &record.binding);
  }

  out
}

/// Parse a set of Server Object records, validating the magic header
/// before trusting any record contents.
pub fn restore(bytes: &[u8]) -> Result<Vec<ServerRecord>, CodecError> {
  let mut cursor = bytes;

  let mut magic = [0u8; 3];
  cursor.read_exact(&mut magic).map_err(|_| CodecError::Format)?;
  if magic != MAGIC {
    return Err(CodecError::Format);
  }

  let mut version = [0u8; 1];
  cursor.read_exact(&mut version).map_err(|_| CodecError::Format)?;
  if version[0] != VERSION {
    return Err(CodecError::Format);
  }

  let count = read_u32(&mut cursor)?;
  let mut records = Vec::with_capacity(count as usize);

  for _ in 0..count {
    let iid = read_u16(&mut cursor)?;
    let short_server_id = read_u16(&mut cursor)?;
    let lifetime_sec = read_u32(&mut cursor)?;

    let mut notification_storing = [0u8; 1];
    cursor.read_exact(&mut notification_storing).map_err(|_| CodecError::Format)?;

    let binding = read_string(&mut cursor)?;

    if lifetime_sec == 0 {
      return Err(CodecError::Format);
    }

    records.push(ServerRecord { iid,
                                short_server_id,
                                lifetime_sec,
                                notification_storing: notification_storing[0] != 0,
                                binding });
  }

  Ok(records)
}

/// Write a persisted record set to a writer (e.g. a file), for callers that
/// want to stream rather than build the whole buffer in memory first.
pub fn store_to(writer: &mut impl Write, records: &[ServerRecord]) -> std::io::Result<()> {
  writer.write_all(&store(records))
}

#[cfg(test)]
mod test {
  use super::*;

  fn sample() -> Vec<ServerRecord> {
    vec![ServerRecord { iid: 0,
                        short_server_id: 123,
                        lifetime_sec: 86400,
                        notification_storing: true,
                        binding: "U".into() },
         ServerRecord { iid: 1,
                        short_server_id: 456,
                        lifetime_sec: 3600,
                        notification_storing: false,
                        binding: "UQ".into() }]
  }

  #[test]
  fn round_trips() {
    let bytes = store(&sample());
    assert_eq!(restore(&bytes).unwrap(), sample());
  }

  #[test]
  fn starts_with_magic_and_version() {
    let bytes = store(&sample());
    assert_eq!(&bytes[..3], b"SRV");
    assert_eq!(bytes[3], VERSION);
  }

  #[test]
  fn rejects_bad_magic() {
    let mut bytes = store(&sample());
    bytes[0] = b'X';
    assert_eq!(restore(&bytes).unwrap_err(), CodecError::Format);
  }

  #[test]
  fn rejects_zero_lifetime_as_invalid() {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    write_u32(&mut out, 1);
    write_u16(&mut out, 0);
    write_u16(&mut out, 1);
    write_u32(&mut out, 0);
    out.push(1);
    write_string(&mut out, "U");

    assert_eq!(restore(&out).unwrap_err(), CodecError::Format);
  }
}
