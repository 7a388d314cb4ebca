//! Wires a decoded CoAP request to the [`DataModel`](crate::sdm::DataModel):
//! infers the LwM2M operation, drives `operation_begin`/`read_entry`/
//! `write_entry`/`operation_end`, and encodes the result back into a
//! response [`Message`].
//!
//! Grounded in `sdm_operation_t`'s entry points and `anjay_lite_stream.c`'s
//! request-to-data-model pump: everything server-initiated lands here on its
//! way in or out. Also owns RFC7959 block-wise transfer: an inbound
//! CONfirmable request carrying a Block1 option is reassembled here before
//! the data model ever sees it, and an outbound response exceeding
//! `buf_size` is chunked here, keyed on the request token (the `{in, out}`
//! sub-states the data model exposes via `block1_append`/`block1_take`/
//! `block2_store`/`block2_take`).

use lwm2m_msg::{opt::number, Block, Code, Message, Observe, Operation, OperationContext,
                OperationInferenceError, Options, Type, UriPath};

use crate::io::{self, content_format};
use crate::sdm::{DataModel, Kind};

/// Drive `request` through the data model and build the matching response.
/// `is_bootstrap` selects bootstrap write gating (invariant 4); `buf_size`
/// bounds how many payload bytes a single response message may carry before
/// it must be split into Block2 chunks.
pub fn process(dm: &mut DataModel, request: &Message, is_bootstrap: bool, buf_size: usize) -> Message {
  match try_process(dm, request, is_bootstrap, buf_size) {
    | Ok(response) => response,
    | Err(code) => ack(request, code),
  }
}

fn try_process(dm: &mut DataModel, request: &Message, is_bootstrap: bool, buf_size: usize)
               -> Result<Message, Code> {
  let block1 = request.opts.get_first(number::BLOCK1).and_then(Block::decode);
  let payload: Vec<u8> = match block1 {
    | Some(b) if b.more => {
      dm.block1_append(request.token, &request.payload);
      return Ok(block1_continue_ack(request, b));
    },
    | Some(_) => {
      dm.block1_append(request.token, &request.payload);
      dm.block1_take(request.token)
    },
    | None => request.payload.clone(),
  };

  let mut ctx = build_context(request)?;
  ctx.has_payload = !payload.is_empty();

  let op = Operation::infer(&ctx).map_err(infer_error_code)?;

  use Operation::*;
  match op {
    | DmRead | DmReadComposite | InfObserve | InfObserveComposite | InfCancelObserve
    | InfCancelObserveComposite => {
      read_like_response(dm, op, ctx.path.unwrap_or(UriPath::ROOT), is_bootstrap, request, false,
                         buf_size)
    },
    | Discover => {
      read_like_response(dm, op, ctx.path.unwrap_or(UriPath::ROOT), is_bootstrap, request, true,
                         buf_size)
    },
    | DmWriteReplace | DmWritePartialUpdate | DmWriteComposite => {
      let path = ctx.path.ok_or(Code::BAD_REQUEST)?;
      write_response(dm, op, path, is_bootstrap, &payload, request)
    },
    | DmWriteAttributes => Ok(ack(request, Code::CHANGED)),
    | DmCreate => {
      let path = ctx.path.ok_or(Code::BAD_REQUEST)?;
      create_response(dm, path, is_bootstrap, &payload, request)
    },
    | DmExecute => {
      let path = ctx.path.ok_or(Code::BAD_REQUEST)?;
      execute_response(dm, path, &payload, request)
    },
    | DmDelete => {
      let path = ctx.path.ok_or(Code::BAD_REQUEST)?;
      delete_response(dm, path, is_bootstrap, request)
    },
    | BootstrapFinish => Ok(ack(request, Code::CHANGED)),
  }
}

fn build_context(request: &Message) -> Result<OperationContext, Code> {
  let raw_segments: Vec<String> = request.opts
                                          .get_all(number::URI_PATH)
                                          .iter()
                                          .map(|v| String::from_utf8_lossy(v).into_owned())
                                          .collect();

  let is_bootstrap_finish_path = raw_segments.len() == 1 && raw_segments[0] == "bs";

  let path = if is_bootstrap_finish_path {
    None
  } else if raw_segments.is_empty() {
    Some(UriPath::ROOT)
  } else {
    Some(UriPath::parse(raw_segments.iter().map(|s| s.as_str())).map_err(|_| Code::BAD_REQUEST)?)
  };

  let observe = request.opts.get_first(number::OBSERVE).and_then(Observe::decode);

  let link_format = request.opts
                            .get_all(number::ACCEPT)
                            .iter()
                            .chain(request.opts.get_all(number::CONTENT_FORMAT))
                            .any(|v| u16_from_be(v) == Some(lwm2m_msg::operation::CONTENT_FORMAT_LINK_FORMAT));

  let has_query = !request.opts.get_all(number::URI_QUERY).is_empty();

  Ok(OperationContext { code: request.code,
                        observe,
                        path,
                        is_bootstrap_finish_path,
                        link_format,
                        has_payload: !request.payload.is_empty(),
                        has_query })
}

fn infer_error_code(e: OperationInferenceError) -> Code {
  match e {
    | OperationInferenceError::UnsupportedMethod(_) => Code::METHOD_NOT_ALLOWED,
    | OperationInferenceError::UnsupportedPathShape => Code::BAD_REQUEST,
  }
}

fn read_like_response(dm: &mut DataModel, op: Operation, path: UriPath, is_bootstrap: bool,
                      request: &Message, discover: bool, buf_size: usize)
                      -> Result<Message, Code> {
  let token = request.token;
  let requested_block2 = request.opts.get_first(number::BLOCK2).and_then(Block::decode);
  let stash = dm.block2_take(token);

  let (format, full_payload) = match (requested_block2, stash) {
    | (Some(_), Some(stashed)) => stashed,
    | _ => {
      dm.operation_begin(op, is_bootstrap, path).map_err(|e| e.to_code())?;
      let mut entries = Vec::new();
      while let Some((p, v)) = dm.read_entry().map_err(|e| e.to_code())? {
        entries.push(io::Entry::new(p, v));
      }
      dm.operation_end().map_err(|e| e.to_code())?;

      let format = if discover {
        content_format::LINK_FORMAT
      } else {
        requested_format(request).unwrap_or_else(|| io::select_format(&entries))
      };
      let payload = if discover {
        let paths: Vec<UriPath> = entries.iter().map(|e| e.path).collect();
        io::encode_link_format(&paths, &std::collections::BTreeMap::new(),
                               &std::collections::HashMap::new()).into_bytes()
      } else {
        encode_entries(&entries, format, path)?
      };
      (format, payload)
    },
  };

  let num = requested_block2.map(|b| b.num).unwrap_or(0);
  let offset = num as usize * buf_size;
  let slice = full_payload.get(offset..).unwrap_or(&[]);

  let mut opts = Options::new();
  opts.add(number::CONTENT_FORMAT, format.to_be_bytes().to_vec());

  if slice.len() > buf_size {
    dm.block2_store(token, format, full_payload.clone());
    opts.add(number::BLOCK2, Block::new(num, true, buf_size as u16).encode());
    Ok(ack_with(request, Code::CONTENT, opts, slice[..buf_size].to_vec()))
  } else {
    if requested_block2.is_some() {
      opts.add(number::BLOCK2, Block::new(num, false, buf_size as u16).encode());
    }
    Ok(ack_with(request, Code::CONTENT, opts, slice.to_vec()))
  }
}

fn requested_format(request: &Message) -> Option<u16> {
  request.opts.get_first(number::ACCEPT).and_then(u16_from_be)
}

fn resource_kind_hint(dm: &DataModel, path: UriPath) -> Option<Kind> {
  let oid = path.oid?;
  let rid = path.rid?;
  dm.object(oid)?.resource_spec(rid).map(|s| s.kind)
}

fn encode_entries(entries: &[io::Entry], format: u16, base: UriPath) -> Result<Vec<u8>, Code> {
  let result: Result<Vec<u8>, crate::error::CodecError> = match format {
    | content_format::TEXT_PLAIN => {
      entries.first().map(io::encode_plain_text).unwrap_or(Ok(Vec::new()))
    },
    | content_format::OPAQUE => entries.first().map(io::encode_opaque).unwrap_or(Ok(Vec::new())),
    | content_format::CBOR => entries.first().map(io::encode_cbor).unwrap_or(Ok(Vec::new())),
    | content_format::SENML_CBOR => io::encode_senml_cbor(base, entries),
    | _ => io::encode_lwm2m_cbor(entries),
  };
  result.map_err(|_| Code::INTERNAL_SERVER_ERROR)
}

fn decode_entries(payload: &[u8], format: u16, base: UriPath, kind: Option<Kind>)
                  -> Result<Vec<io::Entry>, Code> {
  let result: Result<Vec<io::Entry>, crate::error::CodecError> = match format {
    | content_format::TEXT_PLAIN => {
      io::decode_plain_text(payload, kind).map(|v| vec![io::Entry::new(base, v)])
    },
    | content_format::OPAQUE => io::decode_opaque(payload).map(|v| vec![io::Entry::new(base, v)]),
    | content_format::CBOR => {
      io::decode_cbor(payload, kind.unwrap_or(Kind::Int)).map(|v| vec![io::Entry::new(base, v)])
    },
    | content_format::SENML_CBOR => io::decode_senml_cbor(base, payload),
    | _ => io::decode_lwm2m_cbor(base, payload),
  };
  result.map_err(|_| Code::BAD_REQUEST)
}

fn write_response(dm: &mut DataModel, op: Operation, path: UriPath, is_bootstrap: bool,
                  payload: &[u8], request: &Message)
                  -> Result<Message, Code> {
  let format =
    request.opts.get_first(number::CONTENT_FORMAT).and_then(u16_from_be).unwrap_or(content_format::TEXT_PLAIN);
  let kind = resource_kind_hint(dm, path);
  let entries = decode_entries(payload, format, path, kind)?;

  dm.operation_begin(op, is_bootstrap, path).map_err(|e| e.to_code())?;
  for entry in entries {
    dm.write_entry(entry.path, entry.value, 0).map_err(|e| e.to_code())?;
  }
  dm.operation_end().map_err(|e| e.to_code())?;

  Ok(ack(request, Code::CHANGED))
}

fn create_response(dm: &mut DataModel, path: UriPath, is_bootstrap: bool, payload: &[u8],
                   request: &Message)
                   -> Result<Message, Code> {
  let format =
    request.opts.get_first(number::CONTENT_FORMAT).and_then(u16_from_be).unwrap_or(content_format::TEXT_PLAIN);
  let entries = decode_entries(payload, format, path, None)?;

  let oid = path.oid.ok_or(Code::BAD_REQUEST)?;
  let iid = entries.iter().find_map(|e| e.path.iid).ok_or(Code::BAD_REQUEST)?;

  dm.operation_begin(Operation::DmCreate, is_bootstrap, path).map_err(|e| e.to_code())?;
  dm.create_instance(oid, iid).map_err(|e| e.to_code())?;
  for entry in entries {
    dm.write_entry(entry.path, entry.value, 0).map_err(|e| e.to_code())?;
  }
  dm.operation_end().map_err(|e| e.to_code())?;

  let mut opts = Options::new();
  opts.add(number::LOCATION_PATH, oid.to_string().into_bytes());
  opts.add(number::LOCATION_PATH, iid.to_string().into_bytes());
  Ok(ack_with(request, Code::CREATED, opts, Vec::new()))
}

fn execute_response(dm: &mut DataModel, path: UriPath, payload: &[u8], request: &Message)
                    -> Result<Message, Code> {
  dm.operation_begin(Operation::DmExecute, false, path).map_err(|e| e.to_code())?;
  dm.execute(path, payload).map_err(|e| e.to_code())?;
  dm.operation_end().map_err(|e| e.to_code())?;
  Ok(ack(request, Code::CHANGED))
}

fn delete_response(dm: &mut DataModel, path: UriPath, is_bootstrap: bool, request: &Message)
                   -> Result<Message, Code> {
  let oid = path.oid.ok_or(Code::BAD_REQUEST)?;
  dm.operation_begin(Operation::DmDelete, is_bootstrap, path).map_err(|e| e.to_code())?;
  if let Some(iid) = path.iid {
    dm.delete_instance(oid, iid).map_err(|e| e.to_code())?;
  }
  dm.operation_end().map_err(|e| e.to_code())?;
  Ok(ack(request, Code::DELETED))
}

fn u16_from_be(bytes: &[u8]) -> Option<u16> {
  match bytes.len() {
    | 0 => Some(0),
    | 1 => Some(bytes[0] as u16),
    | 2 => Some(u16::from_be_bytes([bytes[0], bytes[1]])),
    | _ => None,
  }
}

fn response_ty(request_ty: Type) -> Type {
  match request_ty {
    | Type::Con => Type::Ack,
    | _ => Type::Non,
  }
}

fn ack(request: &Message, code: Code) -> Message {
  ack_with(request, code, Options::new(), Vec::new())
}

fn ack_with(request: &Message, code: Code, opts: Options, payload: Vec<u8>) -> Message {
  Message { ty: response_ty(request.ty), code, id: request.id, token: request.token, opts, payload }
}

fn block1_continue_ack(request: &Message, block: Block) -> Message {
  let mut opts = Options::new();
  opts.add(number::BLOCK1, Block::new(block.num, block.more, block.size).encode());
  ack_with(request, Code::CONTINUE, opts, Vec::new())
}

#[cfg(test)]
mod test {
  use lwm2m_msg::{Id, Token};

  use super::*;
  use crate::objects;

  fn dm_with_device() -> DataModel {
    let mut dm = DataModel::new();
    let mut object = objects::device_object();
    object.instances.insert(0, crate::sdm::Instance::default());
    object.instances.get_mut(&0).unwrap().values.set(objects::device_rid::MANUFACTURER,
                                                      crate::sdm::Value::String("acme".into()));
    dm.add_object(object);
    dm
  }

  fn get_request(path: &str) -> Message {
    let mut opts = Options::new();
    for seg in path.split('/').filter(|s| !s.is_empty()) {
      opts.add(number::URI_PATH, seg.as_bytes().to_vec());
    }
    Message { ty: Type::Con,
             code: Code::GET,
             id: Id(1),
             token: Token::opaque(b"tok1"),
             opts,
             payload: Vec::new() }
  }

  #[test]
  fn read_manufacturer_returns_content() {
    let mut dm = dm_with_device();
    let request = get_request("/3/0/0");
    let response = process(&mut dm, &request, false, 1024);
    assert_eq!(response.code, Code::CONTENT);
    assert_eq!(response.payload, b"acme");
  }

  #[test]
  fn read_missing_object_returns_not_found() {
    let mut dm = dm_with_device();
    let request = get_request("/9/0/0");
    let response = process(&mut dm, &request, false, 1024);
    assert_eq!(response.code, Code::NOT_FOUND);
  }

  #[test]
  fn execute_reboot_changes() {
    let mut dm = dm_with_device();
    let mut opts = Options::new();
    opts.add(number::URI_PATH, b"3".to_vec());
    opts.add(number::URI_PATH, b"0".to_vec());
    opts.add(number::URI_PATH, b"4".to_vec());
    let request = Message { ty: Type::Con,
                            code: Code::POST,
                            id: Id(2),
                            token: Token::opaque(b"tok2"),
                            opts,
                            payload: Vec::new() };
    let response = process(&mut dm, &request, false, 1024);
    assert_eq!(response.code, Code::CHANGED);
  }

  #[test]
  fn oversized_read_spills_into_block2() {
    let mut dm = DataModel::new();
    let mut object = objects::server_object();
    object.instances.insert(0, crate::sdm::Instance::default());
    object.instances
          .get_mut(&0)
          .unwrap()
          .values
          .set(objects::server_rid::BINDING, crate::sdm::Value::String("U".repeat(20)));
    dm.add_object(object);

    let request = get_request("/1/0/7");
    let first = process(&mut dm, &request, false, 8);
    assert_eq!(first.code, Code::CONTENT);
    assert_eq!(first.payload.len(), 8);
    let block2 = first.opts.get_first(number::BLOCK2).and_then(Block::decode).unwrap();
    assert!(block2.more);

    let mut next_opts = Options::new();
    next_opts.add(number::URI_PATH, b"1".to_vec());
    next_opts.add(number::URI_PATH, b"0".to_vec());
    next_opts.add(number::URI_PATH, b"7".to_vec());
    next_opts.add(number::BLOCK2, Block::new(1, false, 8).encode());
    let next_request = Message { ty: Type::Con,
                                 code: Code::GET,
                                 id: Id(3),
                                 token: request.token,
                                 opts: next_opts,
                                 payload: Vec::new() };
    let second = process(&mut dm, &next_request, false, 8);
    assert_eq!(second.code, Code::CONTENT);
    assert_eq!(second.payload.len(), 8);
  }

  #[test]
  fn block1_upload_reassembles_before_dispatch() {
    let mut dm = dm_with_device();
    let token = Token::opaque(b"tokup");

    let mut first_opts = Options::new();
    first_opts.add(number::URI_PATH, b"3".to_vec());
    first_opts.add(number::URI_PATH, b"0".to_vec());
    first_opts.add(number::URI_PATH, b"13".to_vec());
    first_opts.add(number::CONTENT_FORMAT, vec![0]);
    first_opts.add(number::BLOCK1, Block::new(0, true, 16).encode());
    let first = Message { ty: Type::Con,
                          code: Code::PUT,
                          id: Id(4),
                          token,
                          opts: first_opts,
                          payload: b"1000".to_vec() };
    let ack1 = process(&mut dm, &first, false, 1024);
    assert_eq!(ack1.code, Code::CONTINUE);

    let mut second_opts = Options::new();
    second_opts.add(number::URI_PATH, b"3".to_vec());
    second_opts.add(number::URI_PATH, b"0".to_vec());
    second_opts.add(number::URI_PATH, b"13".to_vec());
    second_opts.add(number::CONTENT_FORMAT, vec![0]);
    second_opts.add(number::BLOCK1, Block::new(1, false, 16).encode());
    let second = Message { ty: Type::Con,
                           code: Code::PUT,
                           id: Id(5),
                           token,
                           opts: second_opts,
                           payload: b"0000".to_vec() };
    let ack2 = process(&mut dm, &second, false, 1024);
    assert_eq!(ack2.code, Code::CHANGED);
  }
}
