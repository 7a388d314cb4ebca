//! Payload codecs: plain-text, opaque, CBOR, SenML-CBOR, LwM2M-CBOR and the
//! Register/Discover link-format, plus the IANA CoAP Content-Format numbers
//! that select between them.
//!
//! Grounded in `fluf_io.h`'s `fluf_io_out_ctx_init`/`fluf_io_out_ctx_new_entry`/
//! `fluf_io_out_ctx_get_payload` output pipeline and its matching
//! `fluf_io_in_ctx_*` input pipeline: an output context is initialized with an
//! operation, base path and entry count, fed one `(path, type, value)` tuple
//! per [`Entry`], and drained into a caller buffer; an input context is fed
//! raw bytes and yields entries back out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lwm2m_msg::UriPath;

use crate::error::CodecError;
use crate::sdm::{Kind, Value};

/// IANA CoAP Content-Format identifiers relevant to LwM2M payloads.
pub mod content_format {
  /// `text/plain; charset=utf-8`
  pub const TEXT_PLAIN: u16 = 0;
  /// `application/link-format`
  pub const LINK_FORMAT: u16 = 40;
  /// `application/octet-stream`
  pub const OPAQUE: u16 = 42;
  /// `application/cbor`
  pub const CBOR: u16 = 60;
  /// `application/senml+json`
  pub const SENML_JSON: u16 = 110;
  /// `application/senml+cbor`
  pub const SENML_CBOR: u16 = 112;
  /// `application/vnd.oma.lwm2m+tlv`
  pub const LWM2M_TLV: u16 = 11542;
  /// `application/vnd.oma.lwm2m+json`
  pub const LWM2M_JSON: u16 = 11543;
  /// `application/vnd.oma.lwm2m+cbor`
  pub const LWM2M_CBOR: u16 = 11544;
  /// Sentinel meaning "let the codec pick", never sent on the wire.
  pub const NOT_DEFINED: u16 = 65535;
}

/// One `(path, value)` pair produced by a Read/Observe/Notify, or consumed
/// by a Write/Create.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
  /// The full path (down to Resource or Resource Instance level) this value
  /// belongs to.
  pub path: UriPath,
  /// The carried value.
  pub value: Value,
}

impl Entry {
  /// Construct an entry.
  pub fn new(path: UriPath, value: Value) -> Self {
    Self { path, value }
  }
}

/// Given `CONTENT_FORMAT_NOT_DEFINED` and the shape of an outgoing payload,
/// choose the format to encode with: a single-resource Read picks
/// plain-text (or opaque for byte values); anything with more than one
/// entry picks SenML-CBOR; everything else falls back to LwM2M-CBOR.
pub fn select_format(entries: &[Entry]) -> u16 {
  match entries {
    | [one] if one.path.riid.is_none() || one.path.rid.is_some() => match one.value {
      | Value::Opaque(_) => content_format::OPAQUE,
      | _ => content_format::TEXT_PLAIN,
    },
    | [_, ..] => content_format::SENML_CBOR,
    | [] => content_format::LWM2M_CBOR,
  }
}

/// Encode a single entry as plain-text (RFC, int/uint/float/bool/time as
/// ASCII, object links as `"OID:IID"`).
pub fn encode_plain_text(entry: &Entry) -> Result<Vec<u8>, CodecError> {
  let text = match &entry.value {
    | Value::String(s) => s.clone(),
    | Value::Int(i) => i.to_string(),
    | Value::UInt(u) => u.to_string(),
    | Value::Float(f) => f.to_string(),
    | Value::Bool(b) => {
      if *b {
        "1".to_string()
      } else {
        "0".to_string()
      }
    },
    | Value::Time(t) => t.to_string(),
    | Value::ObjLink(oid, iid) => format!("{oid}:{iid}"),
    | Value::Opaque(_) => return Err(CodecError::Format),
  };
  Ok(text.into_bytes())
}

/// Decode a plain-text payload into a value of the requested kind. Per the
/// `WANT_TYPE_DISAMBIGUATION` behavior, callers must supply the resource's
/// declared kind; a numeric string with no declared kind is rejected rather
/// than guessed.
pub fn decode_plain_text(bytes: &[u8], kind: Option<Kind>) -> Result<Value, CodecError> {
  let text = core::str::from_utf8(bytes).map_err(|_| CodecError::Format)?;

  let kind = kind.ok_or(CodecError::WantTypeDisambiguation)?;
  match kind {
    | Kind::String => Ok(Value::String(text.to_string())),
    | Kind::Int => text.parse().map(Value::Int).map_err(|_| CodecError::Format),
    | Kind::UInt => text.parse().map(Value::UInt).map_err(|_| CodecError::Format),
    | Kind::Float => text.parse().map(Value::Float).map_err(|_| CodecError::Format),
    | Kind::Bool => match text {
      | "0" | "false" => Ok(Value::Bool(false)),
      | "1" | "true" => Ok(Value::Bool(true)),
      | _ => Err(CodecError::Format),
    },
    | Kind::Time => text.parse().map(Value::Time).map_err(|_| CodecError::Format),
    | Kind::ObjLink => {
      let (oid, iid) = text.split_once(':').ok_or(CodecError::Format)?;
      let oid = oid.parse().map_err(|_| CodecError::Format)?;
      let iid = iid.parse().map_err(|_| CodecError::Format)?;
      Ok(Value::ObjLink(oid, iid))
    },
    | Kind::Opaque => Err(CodecError::Format),
  }
}

/// Encode a single entry's bytes as base64url (no padding), per the opaque
/// Content-Format.
pub fn encode_opaque(entry: &Entry) -> Result<Vec<u8>, CodecError> {
  match &entry.value {
    | Value::Opaque(bytes) => Ok(URL_SAFE_NO_PAD.encode(bytes).into_bytes()),
    | _ => Err(CodecError::Format),
  }
}

/// Decode a base64url opaque payload.
pub fn decode_opaque(bytes: &[u8]) -> Result<Value, CodecError> {
  let text = core::str::from_utf8(bytes).map_err(|_| CodecError::Format)?;
  URL_SAFE_NO_PAD.decode(text).map(Value::Opaque).map_err(|_| CodecError::Format)
}

fn value_to_cbor(enc: &mut minicbor::Encoder<&mut Vec<u8>>, value: &Value)
                  -> Result<(), CodecError> {
  match value {
    | Value::String(s) => enc.str(s).map(|_| ()),
    | Value::Int(i) => enc.i64(*i).map(|_| ()),
    | Value::UInt(u) => enc.u64(*u).map(|_| ()),
    | Value::Float(f) => enc.f64(*f).map(|_| ()),
    | Value::Bool(b) => enc.bool(*b).map(|_| ()),
    | Value::Time(t) => enc.i64(*t).map(|_| ()),
    | Value::Opaque(bytes) => enc.bytes(bytes).map(|_| ()),
    | Value::ObjLink(oid, iid) => enc.str(&format!("{oid}:{iid}")).map(|_| ()),
  }
  .map_err(|_| CodecError::BufferTooSmall)
}

/// Encode a single entry's value as standard CBOR.
pub fn encode_cbor(entry: &Entry) -> Result<Vec<u8>, CodecError> {
  let mut out = Vec::new();
  let mut enc = minicbor::Encoder::new(&mut out);
  value_to_cbor(&mut enc, &entry.value)?;
  Ok(out)
}

fn cbor_to_value(d: &mut minicbor::Decoder, kind: Kind) -> Result<Value, CodecError> {
  use minicbor::data::Type;
  match d.datatype().map_err(|_| CodecError::Format)? {
    | Type::String => d.str().map(|s| Value::String(s.to_string())).map_err(|_| CodecError::Format),
    | Type::Bytes => d.bytes().map(|b| Value::Opaque(b.to_vec())).map_err(|_| CodecError::Format),
    | Type::Bool => d.bool().map(Value::Bool).map_err(|_| CodecError::Format),
    | Type::F16 | Type::F32 | Type::F64 => d.f64().map(Value::Float).map_err(|_| CodecError::Format),
    | Type::Tag => {
      let _tag = d.tag().map_err(|_| CodecError::Format)?;
      cbor_to_value(d, Kind::Time)
    },
    | Type::I8 | Type::I16 | Type::I32 | Type::I64 => match kind {
      | Kind::UInt => d.u64().map(Value::UInt).map_err(|_| CodecError::Format),
      | Kind::Time => d.i64().map(Value::Time).map_err(|_| CodecError::Format),
      | _ => d.i64().map(Value::Int).map_err(|_| CodecError::Format),
    },
    | Type::U8 | Type::U16 | Type::U32 | Type::U64 => match kind {
      | Kind::Time => d.u64().map(|u| Value::Time(u as i64)).map_err(|_| CodecError::Format),
      | Kind::UInt => d.u64().map(Value::UInt).map_err(|_| CodecError::Format),
      | _ => d.i64().map(Value::Int).map_err(|_| CodecError::Format),
    },
    | _ => Err(CodecError::Format),
  }
}

/// Decode a single CBOR-encoded value. `kind` disambiguates integers
/// between signed/unsigned/time representations.
pub fn decode_cbor(bytes: &[u8], kind: Kind) -> Result<Value, CodecError> {
  let mut dec = minicbor::Decoder::new(bytes);
  cbor_to_value(&mut dec, kind)
}

/// SenML CBOR map labels (RFC 8428 §6, plus the LwM2M object-link
/// extension `vlo` at label 66).
mod senml_label {
  pub const BASE_NAME: i32 = -2;
  pub const NAME: i32 = 0;
  pub const VALUE: i32 = 2;
  pub const VALUE_STRING: i32 = 3;
  pub const VALUE_BOOL: i32 = 4;
  pub const TIME: i32 = 6;
  pub const VALUE_DATA: i32 = 8;
  pub const VALUE_OBJLNK: i32 = 66;
}

fn encode_senml_record(enc: &mut minicbor::Encoder<&mut Vec<u8>>, base_name: &str, name: &str,
                        value: &Value)
                        -> Result<(), CodecError> {
  let field_count = 2 + if name.is_empty() { 0 } else { 1 };
  enc.map(field_count).map_err(|_| CodecError::BufferTooSmall)?;

  enc.i32(senml_label::BASE_NAME).and_then(|e| e.str(base_name)).map_err(|_| CodecError::BufferTooSmall)?;
  if !name.is_empty() {
    enc.i32(senml_label::NAME).and_then(|e| e.str(name)).map_err(|_| CodecError::BufferTooSmall)?;
  }

  match value {
    | Value::String(s) => enc.i32(senml_label::VALUE_STRING).and_then(|e| e.str(s)),
    | Value::Bool(b) => enc.i32(senml_label::VALUE_BOOL).and_then(|e| e.bool(*b)),
    | Value::Opaque(bytes) => enc.i32(senml_label::VALUE_DATA).and_then(|e| e.bytes(bytes)),
    | Value::ObjLink(oid, iid) => {
      enc.i32(senml_label::VALUE_OBJLNK).and_then(|e| e.str(&format!("{oid}:{iid}")))
    },
    | Value::Int(i) => enc.i32(senml_label::VALUE).and_then(|e| e.i64(*i)),
    | Value::UInt(u) => enc.i32(senml_label::VALUE).and_then(|e| e.u64(*u)),
    | Value::Float(f) => enc.i32(senml_label::VALUE).and_then(|e| e.f64(*f)),
    | Value::Time(t) => enc.i32(senml_label::TIME).and_then(|e| e.i64(*t)),
  }
  .map_err(|_| CodecError::BufferTooSmall)?;

  Ok(())
}

/// Encode entries as a SenML-CBOR array of records, one per entry, with the
/// path rendered into `bn`/`n` per RFC 8428 §6 conventions.
pub fn encode_senml_cbor(base: UriPath, entries: &[Entry]) -> Result<Vec<u8>, CodecError> {
  let mut out = Vec::new();
  let mut enc = minicbor::Encoder::new(&mut out);
  enc.array(entries.len() as u64).map_err(|_| CodecError::BufferTooSmall)?;

  let base_name = base.to_string();
  for entry in entries {
    let suffix = suffix_path(base, entry.path);
    encode_senml_record(&mut enc, &base_name, &suffix, &entry.value)?;
  }

  Ok(out)
}

/// The path segments of `full` beyond `base`, joined with `/` (no leading
/// slash), e.g. `base=/3/0, full=/3/0/1` yields `"1"`.
fn suffix_path(base: UriPath, full: UriPath) -> String {
  let base_ids = [base.oid, base.iid, base.rid, base.riid];
  let full_ids = [full.oid, full.iid, full.rid, full.riid];
  let depth = base_ids.iter().filter(|c| c.is_some()).count();

  full_ids[depth..].iter().flatten().map(|id| id.to_string()).collect::<Vec<_>>().join("/")
}

/// Decode a SenML-CBOR payload into entries anchored under `base`.
pub fn decode_senml_cbor(base: UriPath, bytes: &[u8]) -> Result<Vec<Entry>, CodecError> {
  let mut dec = minicbor::Decoder::new(bytes);
  let len = array_len(&mut dec)?;

  let mut entries = Vec::new();
  let mut bn = base.to_string();

  for _ in 0..len.unwrap_or(0) {
    let (path_suffix, value) = decode_senml_record(&mut dec, &mut bn)?;
    let path = extend_path(base, &format!("{bn}{path_suffix}"))?;
    entries.push(Entry::new(path, value));
  }

  Ok(entries)
}

fn decode_senml_record(d: &mut minicbor::Decoder, bn: &mut String)
                        -> Result<(String, Value), CodecError> {
  let fields = map_len(d)?.ok_or(CodecError::Format)?;
  let mut name = String::new();
  let mut value = None;

  for _ in 0..fields {
    let label = d.i32().map_err(|_| CodecError::Format)?;
    match label {
      | senml_label::BASE_NAME => *bn = d.str().map_err(|_| CodecError::Format)?.to_string(),
      | senml_label::NAME => name = d.str().map_err(|_| CodecError::Format)?.to_string(),
      | senml_label::VALUE => {
        value = Some(match d.datatype().map_err(|_| CodecError::Format)? {
          | minicbor::data::Type::F16 | minicbor::data::Type::F32 | minicbor::data::Type::F64 => {
            Value::Float(d.f64().map_err(|_| CodecError::Format)?)
          },
          | _ => Value::Int(d.i64().map_err(|_| CodecError::Format)?),
        })
      },
      | senml_label::VALUE_STRING => {
        value = Some(Value::String(d.str().map_err(|_| CodecError::Format)?.to_string()))
      },
      | senml_label::VALUE_BOOL => value = Some(Value::Bool(d.bool().map_err(|_| CodecError::Format)?)),
      | senml_label::VALUE_DATA => {
        value = Some(Value::Opaque(d.bytes().map_err(|_| CodecError::Format)?.to_vec()))
      },
      | senml_label::TIME => value = Some(Value::Time(d.i64().map_err(|_| CodecError::Format)?)),
      | senml_label::VALUE_OBJLNK => {
        let text = d.str().map_err(|_| CodecError::Format)?;
        let (oid, iid) = text.split_once(':').ok_or(CodecError::Format)?;
        value = Some(Value::ObjLink(oid.parse().map_err(|_| CodecError::Format)?,
                                     iid.parse().map_err(|_| CodecError::Format)?));
      },
      | _ => d.skip().map_err(|_| CodecError::Format)?,
    }
  }

  Ok((name, value.ok_or(CodecError::Format)?))
}

/// Build a full [`UriPath`] by combining `base` with a slash-joined numeric
/// suffix like `"0/1"`.
fn extend_path(base: UriPath, full_numeric: &str) -> Result<UriPath, CodecError> {
  UriPath::parse(full_numeric.split('/').filter(|s| !s.is_empty())).map_err(|_| CodecError::Format)
    .map(|parsed| UriPath { oid: base.oid.or(parsed.oid),
                            iid: base.iid.or(parsed.iid),
                            rid: base.rid.or(parsed.rid),
                            riid: base.riid.or(parsed.riid) })
}

fn array_len(d: &mut minicbor::Decoder) -> Result<Option<u64>, CodecError> {
  d.array().map_err(|_| CodecError::Format)
}

fn map_len(d: &mut minicbor::Decoder) -> Result<Option<u64>, CodecError> {
  d.map().map_err(|_| CodecError::Format)
}

/// Maximum nesting depth for LwM2M-CBOR payloads (Object / Instance /
/// Resource / Resource Instance).
const LWM2M_CBOR_MAX_DEPTH: usize = 4;

/// Encode entries as nested LwM2M-CBOR maps, keyed by path component ID at
/// each level.
pub fn encode_lwm2m_cbor(entries: &[Entry]) -> Result<Vec<u8>, CodecError> {
  use std::collections::BTreeMap;

  #[derive(Default)]
  struct Node {
    leaf: Option<Value>,
    children: BTreeMap<u16, Node>,
  }

  let mut root = Node::default();
  for entry in entries {
    let ids: Vec<u16> = [entry.path.oid, entry.path.iid, entry.path.rid, entry.path.riid]
      .into_iter()
      .flatten()
      .collect();
    if ids.len() > LWM2M_CBOR_MAX_DEPTH {
      return Err(CodecError::NestingTooDeep);
    }

    let mut node = &mut root;
    for id in &ids {
      node = node.children.entry(*id).or_default();
    }
    node.leaf = Some(entry.value.clone());
  }

  fn write_node(enc: &mut minicbor::Encoder<&mut Vec<u8>>, node: &Node) -> Result<(), CodecError> {
    if let Some(value) = &node.leaf {
      value_to_cbor(enc, value)
    } else {
      enc.map(node.children.len() as u64).map_err(|_| CodecError::BufferTooSmall)?;
      for (id, child) in &node.children {
        enc.u16(*id).map_err(|_| CodecError::BufferTooSmall)?;
        write_node(enc, child)?;
      }
      Ok(())
    }
  }

  let mut out = Vec::new();
  let mut enc = minicbor::Encoder::new(&mut out);
  write_node(&mut enc, &root)?;
  Ok(out)
}

/// Decode a nested LwM2M-CBOR payload into flat entries anchored under
/// `base`.
pub fn decode_lwm2m_cbor(base: UriPath, bytes: &[u8]) -> Result<Vec<Entry>, CodecError> {
  let mut dec = minicbor::Decoder::new(bytes);
  let mut entries = Vec::new();
  decode_lwm2m_cbor_node(&mut dec, base, 0, &mut entries)?;
  Ok(entries)
}

fn decode_lwm2m_cbor_node(d: &mut minicbor::Decoder, path: UriPath, depth: usize,
                           out: &mut Vec<Entry>)
                           -> Result<(), CodecError> {
  if depth > LWM2M_CBOR_MAX_DEPTH {
    return Err(CodecError::NestingTooDeep);
  }

  if d.datatype().map_err(|_| CodecError::Format)? == minicbor::data::Type::Map {
    let len = map_len(d)?.ok_or(CodecError::NestingTooDeep)?;
    for _ in 0..len {
      let id = d.u16().map_err(|_| CodecError::Format)?;
      let child_path = push_id(path, id).ok_or(CodecError::Format)?;
      decode_lwm2m_cbor_node(d, child_path, depth + 1, out)?;
    }
    Ok(())
  } else {
    let value = cbor_to_value(d, Kind::Int)?;
    out.push(Entry::new(path, value));
    Ok(())
  }
}

fn push_id(path: UriPath, id: u16) -> Option<UriPath> {
  match (path.oid, path.iid, path.rid, path.riid) {
    | (None, ..) => Some(UriPath { oid: Some(id), ..path }),
    | (Some(_), None, ..) => Some(UriPath { iid: Some(id), ..path }),
    | (Some(_), Some(_), None, _) => Some(UriPath { rid: Some(id), ..path }),
    | (Some(_), Some(_), Some(_), None) => Some(UriPath { riid: Some(id), ..path }),
    | _ => None,
  }
}

/// Render entries as Register/Discover `application/link-format`:
/// `</oid/iid/rid>;attr=value,…`. Entries must already be in ascending path
/// order; `version` attaches a version string to Object-level entries and
/// `dim` attaches a dimension count to multi-resource entries.
pub fn encode_link_format(paths: &[UriPath], versions: &std::collections::BTreeMap<u16, String>,
                           dims: &std::collections::HashMap<UriPath, usize>)
                           -> String {
  let mut out = String::new();
  for (ix, path) in paths.iter().enumerate() {
    if ix > 0 {
      out.push(',');
    }
    out.push('<');
    out.push_str(&path.to_string());
    out.push('>');

    if let Some(oid) = path.oid {
      if path.iid.is_none() {
        if let Some(version) = versions.get(&oid) {
          out.push_str(";ver=");
          out.push_str(version);
        }
      }
    }
    if let Some(dim) = dims.get(path) {
      out.push_str(&format!(";dim={dim}"));
    }
  }
  out
}

/// Parse a `application/link-format` payload into the bare paths it
/// advertises (attributes are currently discarded by this parser; nothing
/// in the client needs them post-discovery).
pub fn decode_link_format(text: &str) -> Result<Vec<UriPath>, CodecError> {
  text.split(',')
      .filter(|s| !s.is_empty())
      .map(|entry| {
        let path_part = entry.split(';').next().unwrap_or("");
        let trimmed = path_part.trim().trim_start_matches('<').trim_end_matches('>');
        UriPath::parse(trimmed.split('/').filter(|s| !s.is_empty())).map_err(|_| CodecError::Format)
      })
      .collect()
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn plain_text_int_round_trip() {
    let entry = Entry::new(UriPath::resource(3, 0, 5), Value::Int(42));
    let bytes = encode_plain_text(&entry).unwrap();
    assert_eq!(bytes, b"42");
    assert_eq!(decode_plain_text(&bytes, Some(Kind::Int)).unwrap(), Value::Int(42));
  }

  #[test]
  fn plain_text_without_kind_wants_disambiguation() {
    let err = decode_plain_text(b"42", None).unwrap_err();
    assert_eq!(err, CodecError::WantTypeDisambiguation);
  }

  #[test]
  fn opaque_round_trip() {
    let entry = Entry::new(UriPath::resource(3, 0, 5), Value::Opaque(vec![1, 2, 3, 255]));
    let bytes = encode_opaque(&entry).unwrap();
    assert_eq!(decode_opaque(&bytes).unwrap(), Value::Opaque(vec![1, 2, 3, 255]));
  }

  #[test]
  fn cbor_unsigned_int_round_trip() {
    let entry = Entry::new(UriPath::resource(3, 4, 2), Value::Int(42));
    let bytes = encode_cbor(&entry).unwrap();
    assert_eq!(bytes, vec![0x18, 0x2A]);
    assert_eq!(decode_cbor(&bytes, Kind::Int).unwrap(), Value::Int(42));
  }

  #[test]
  fn select_format_picks_plain_text_for_single_resource() {
    let entries = vec![Entry::new(UriPath::resource(3, 0, 5), Value::Int(1))];
    assert_eq!(select_format(&entries), content_format::TEXT_PLAIN);
  }

  #[test]
  fn select_format_picks_senml_cbor_for_multiple_entries() {
    let entries = vec![Entry::new(UriPath::resource(3, 0, 5), Value::Int(1)),
                        Entry::new(UriPath::resource(3, 0, 6), Value::Int(2))];
    assert_eq!(select_format(&entries), content_format::SENML_CBOR);
  }

  #[test]
  fn senml_cbor_round_trip() {
    let base = UriPath::instance(3, 0);
    let entries = vec![Entry::new(UriPath::resource(3, 0, 0), Value::String("open".into())),
                        Entry::new(UriPath::resource(3, 0, 9), Value::Int(80))];

    let bytes = encode_senml_cbor(base, &entries).unwrap();
    let decoded = decode_senml_cbor(base, &bytes).unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].value, Value::String("open".into()));
    assert_eq!(decoded[1].value, Value::Int(80));
  }

  #[test]
  fn lwm2m_cbor_round_trip() {
    let entries = vec![Entry::new(UriPath::resource(3, 0, 0), Value::String("open".into())),
                        Entry::new(UriPath::resource(3, 0, 1), Value::Int(7))];
    let bytes = encode_lwm2m_cbor(&entries).unwrap();
    let decoded = decode_lwm2m_cbor(UriPath::ROOT, &bytes).unwrap();

    assert_eq!(decoded.len(), 2);
    assert!(decoded.iter().any(|e| e.path == UriPath::resource(3, 0, 0)
                                    && e.value == Value::String("open".into())));
    assert!(decoded.iter()
                   .any(|e| e.path == UriPath::resource(3, 0, 1) && e.value == Value::Int(7)));
  }

  #[test]
  fn lwm2m_cbor_accepts_full_resource_instance_depth() {
    let deep = UriPath { oid: Some(1), iid: Some(2), rid: Some(3), riid: Some(4) };
    let entries = vec![Entry::new(deep, Value::Int(1))];
    let bytes = encode_lwm2m_cbor(&entries).unwrap();
    let decoded = decode_lwm2m_cbor(UriPath::ROOT, &bytes).unwrap();
    assert_eq!(decoded[0].path, deep);
  }

  #[test]
  fn link_format_round_trip() {
    let paths = vec![UriPath::object(1), UriPath::instance(1, 0)];
    let versions = std::collections::BTreeMap::from([(1, "1.1".to_string())]);
    let dims = std::collections::HashMap::new();

    let text = encode_link_format(&paths, &versions, &dims);
    assert_eq!(text, "</1>;ver=1.1,</1/0>");

    let parsed = decode_link_format(&text).unwrap();
    assert_eq!(parsed, paths);
  }
}
