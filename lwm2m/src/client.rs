//! The LwM2M client state machine: INIT → OFFLINE → OPEN_IN_PROGRESS →
//! ONLINE → REGISTER, plus ERROR and CLOSE_IN_PROGRESS, driven by repeated
//! non-blocking `poll` calls that send and retry requests and process
//! incoming responses by token.
//!
//! Grounded in the server lifecycle loop of `anjay_lite_servers.c`: its
//! `ANJAY_SERVERS_INIT`/`OFFLINE`/`OPEN_IN_PROGRESS`/`ONLINE`/`REGISTER`/
//! `ERROR`/`CLOSE_IN_PROGRESS` states and its `anjay_lite_servers_set_state`
//! transition table are carried over as [`State`]; `RetryTimer`/`Config`
//! drive the CoAP-level retransmission this module no longer duplicates.
//!
//! This module also owns the two pieces of bookkeeping the data model has
//! no business knowing about: splitting an oversized outbound request
//! across Block1 (RFC7959), and gating Observe notifications on the
//! pmin/pmax Write-Attributes a Server set for a path.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use lwm2m_msg::{Attribute, Block, Code, CodeKind, Id, Message, MsgIdGenerator, Observe, Token,
                TokenGenerator, Type, UriPath};

use crate::config::Config;
use crate::dispatch;
use crate::error::ClientError;
use crate::net::{Addrd, Socket};
use crate::retry::{RetryTimer, YouShould};
use crate::sdm::DataModel;
use crate::time::Stamped;

/// The client's lifecycle state with respect to one LwM2M Server.
///
/// Mirrors `anjay_servers_state_t`: `INIT` is the state before a server has
/// ever been contacted; `OFFLINE` means intentionally not connected (e.g.
/// disabled binding); `OPEN_IN_PROGRESS` covers bootstrap or registration in
/// flight; `ONLINE` means registered and current; `REGISTER` means an Update
/// is in flight; `ERROR` and `CLOSE_IN_PROGRESS` are terminal/transitional.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
  /// Never yet contacted.
  Init,
  /// Deliberately not connected.
  Offline,
  /// A Register (or Bootstrap-Request) exchange is in flight.
  OpenInProgress,
  /// Registered; no exchange currently in flight.
  Online,
  /// An Update exchange is in flight.
  Register,
  /// The server rejected the client or retries were exhausted.
  Error,
  /// A Deregister exchange is in flight.
  CloseInProgress,
}

/// Remaining chunks of an outbound request body too large for one CoAP
/// message, split per RFC7959 Block1. `opts_template` holds every option
/// the request needs besides Block1 itself (Uri-Path/Query/Content-Format),
/// reused unchanged on every chunk.
#[derive(Debug, Clone)]
struct Block1Upload {
  opts_template: lwm2m_msg::Options,
  remaining: Vec<u8>,
  next_num: u32,
  size: u16,
}

/// One in-flight CONfirmable exchange awaiting an ACK/response, matched by
/// token.
struct PendingExchange {
  token: Token,
  id: Id,
  retry: RetryTimer,
  kind: ExchangeKind,
  block1: Option<Block1Upload>,
}

/// What a pending exchange represents, so the state machine knows what to
/// do when it resolves or times out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ExchangeKind {
  Register,
  Update,
  Deregister,
}

fn request_code(kind: ExchangeKind) -> Code {
  match kind {
    | ExchangeKind::Register => Code::new(0, 2),
    | ExchangeKind::Update => Code::new(0, 3),
    | ExchangeKind::Deregister => Code::new(0, 4),
  }
}

/// Write-Attributes (pmin/pmax) a Server has set for one path, last applied
/// by a WRITE_ATTRIBUTES request. Other attribute kinds (gt/lt/st/epmin/…)
/// are parsed but not acted on here; notification gating only needs the
/// period bounds.
#[derive(Debug, Clone, Copy, Default)]
struct NotificationAttrs {
  pmin: Option<Duration>,
  pmax: Option<Duration>,
}

impl NotificationAttrs {
  fn parse(query: &[Vec<u8>]) -> Self {
    let mut attrs = Self::default();
    for attr in Attribute::parse_all(query.iter().map(|v| v.as_slice())) {
      match attr {
        | Attribute::MinPeriod(secs) if secs >= 0 => attrs.pmin = Some(Duration::from_secs(secs as u64)),
        | Attribute::MaxPeriod(secs) if secs >= 0 => attrs.pmax = Some(Duration::from_secs(secs as u64)),
        | _ => {},
      }
    }
    attrs
  }
}

/// One active observation: the path being observed (so pmin/pmax attribute
/// lookups have something to key on), the last Observe sequence number
/// seen, and when the last Notify arrived.
#[derive(Debug, Clone)]
struct Observation {
  token: Token,
  path: UriPath,
  last_seq: Option<Observe>,
  last_notify: Stamped<()>,
}

/// Outcome of feeding a response into [`Client::handle_response`].
#[derive(Debug)]
pub enum ResponseOutcome {
  /// The token didn't match any pending exchange.
  Unmatched,
  /// The exchange is complete; the client's state has been updated.
  Resolved,
  /// The peer asked for the next Block1 chunk (2.31 Continue); send this
  /// message next.
  NextBlock(Message),
}

/// Drives one LwM2M Server relationship: registration lifecycle,
/// retransmission and observe bookkeeping. Does not own the data model or
/// payload codecs — the caller supplies encoded request bodies and receives
/// back decoded response bodies to apply.
pub struct Client {
  state: State,
  server_addr: SocketAddr,
  config: Config,
  endpoint_name: String,

  ids: MsgIdGenerator,
  tokens: TokenGenerator,

  pending: BTreeMap<Token, PendingExchange>,
  observations: BTreeMap<Token, Observation>,
  attributes: HashMap<UriPath, NotificationAttrs>,

  registered_at: Option<Instant>,
  location_path: Option<UriPath>,
}

impl core::fmt::Debug for Client {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Client")
     .field("state", &self.state)
     .field("server_addr", &self.server_addr)
     .field("endpoint_name", &self.endpoint_name)
     .field("pending", &self.pending.len())
     .field("observations", &self.observations.len())
     .finish()
  }
}

impl Client {
  /// Construct a client in the `Init` state, not yet registered.
  pub fn new(server_addr: SocketAddr, config: Config, endpoint_name: String) -> Self {
    Self { state: State::Init,
           server_addr,
           config,
           endpoint_name,
           ids: MsgIdGenerator::new(0),
           tokens: TokenGenerator::new(config.msg.token_seed),
           pending: BTreeMap::new(),
           observations: BTreeMap::new(),
           attributes: HashMap::new(),
           registered_at: None,
           location_path: None }
  }

  /// Current lifecycle state.
  pub fn state(&self) -> State {
    self.state
  }

  /// The Location-Path the server assigned at Register time, reused as the
  /// Uri-Path for subsequent Update/Deregister requests.
  pub fn location_path(&self) -> Option<UriPath> {
    self.location_path
  }

  /// Begin a Register exchange. Transitions `Init`/`Offline`/`Error` into
  /// `OpenInProgress` and returns the message the caller should send first,
  /// splitting `link_format_payload` across Block1 chunks if it exceeds the
  /// configured block size.
  pub fn begin_register(&mut self, link_format_payload: Vec<u8>) -> Result<(Id, Token, Message), ClientError> {
    let id = self.ids.next();
    let token = self.tokens.next();

    let mut opts = lwm2m_msg::Options::new();
    opts.add(lwm2m_msg::opt::number::URI_PATH, b"rd".to_vec());
    opts.add(lwm2m_msg::opt::number::URI_QUERY,
             format!("ep={}", self.endpoint_name).into_bytes());
    opts.add(lwm2m_msg::opt::number::URI_QUERY,
             format!("lt={}", self.config.server.lifetime_sec).into_bytes());
    opts.add(lwm2m_msg::opt::number::URI_QUERY,
             format!("b={}", self.config.server.binding).into_bytes());
    opts.add(lwm2m_msg::opt::number::CONTENT_FORMAT,
             crate::io::content_format::LINK_FORMAT.to_be_bytes().to_vec());

    let block_size = self.config.msg.block_size as usize;
    let (message, block1) = if link_format_payload.len() > block_size {
      let mut remaining = link_format_payload;
      let first_chunk: Vec<u8> = remaining.drain(..block_size).collect();
      let mut first_opts = opts.clone();
      first_opts.add(lwm2m_msg::opt::number::BLOCK1, Block::new(0, true, block_size as u16).encode());
      let message =
        Message { ty: Type::Con, code: Code::new(0, 2), id, token, opts: first_opts, payload: first_chunk };
      let upload = Block1Upload { opts_template: opts, remaining, next_num: 1, size: block_size as u16 };
      (message, Some(upload))
    } else {
      let message =
        Message { ty: Type::Con, code: Code::new(0, 2), id, token, opts, payload: link_format_payload };
      (message, None)
    };

    let retry = RetryTimer::new(Instant::now(),
                                 self.config.msg.con.unacked_retry_strategy,
                                 self.config.msg.con.max_attempts);
    self.pending
        .insert(token, PendingExchange { token, id, retry, kind: ExchangeKind::Register, block1 });
    self.state = State::OpenInProgress;

    Ok((id, token, message))
  }

  /// Begin an Update exchange, reusing the stored Location-Path.
  pub fn begin_update(&mut self) -> Result<(Id, Token, Message), ClientError> {
    let location = self.location_path.ok_or(ClientError::RegistrationExpired)?;

    let id = self.ids.next();
    let token = self.tokens.next();

    let mut opts = lwm2m_msg::Options::new();
    for segment in [location.oid, location.iid].into_iter().flatten() {
      opts.add(lwm2m_msg::opt::number::URI_PATH, segment.to_string().into_bytes());
    }

    let message = Message { ty: Type::Con, code: Code::new(0, 3), id, token, opts, payload: Vec::new() };

    let retry = RetryTimer::new(Instant::now(),
                                 self.config.msg.con.unacked_retry_strategy,
                                 self.config.msg.con.max_attempts);
    self.pending
        .insert(token, PendingExchange { token, id, retry, kind: ExchangeKind::Update, block1: None });
    self.state = State::Register;

    Ok((id, token, message))
  }

  /// Begin a Deregister exchange.
  pub fn begin_deregister(&mut self) -> Result<(Id, Token, Message), ClientError> {
    let location = self.location_path.ok_or(ClientError::RegistrationExpired)?;

    let id = self.ids.next();
    let token = self.tokens.next();

    let mut opts = lwm2m_msg::Options::new();
    for segment in [location.oid, location.iid].into_iter().flatten() {
      opts.add(lwm2m_msg::opt::number::URI_PATH, segment.to_string().into_bytes());
    }

    let message = Message { ty: Type::Con, code: Code::new(0, 4), id, token, opts, payload: Vec::new() };

    let retry = RetryTimer::new(Instant::now(),
                                 self.config.msg.con.unacked_retry_strategy,
                                 self.config.msg.con.max_attempts);
    self.pending
        .insert(token, PendingExchange { token, id, retry, kind: ExchangeKind::Deregister, block1: None });
    self.state = State::CloseInProgress;

    Ok((id, token, message))
  }

  /// Feed an incoming message's token/code back into the state machine,
  /// resolving the matching pending exchange (if any). A `2.31 Continue`
  /// against an in-progress Block1 upload yields the next chunk to send
  /// rather than resolving the exchange.
  pub fn handle_response(&mut self, token: Token, code: Code) -> ResponseOutcome {
    if code == Code::CONTINUE {
      let Some(exchange) = self.pending.get_mut(&token) else { return ResponseOutcome::Unmatched; };
      let Some(upload) = exchange.block1.as_mut() else { return ResponseOutcome::Unmatched; };
      if upload.remaining.is_empty() {
        return ResponseOutcome::Unmatched;
      }

      let take = (upload.size as usize).min(upload.remaining.len());
      let chunk: Vec<u8> = upload.remaining.drain(..take).collect();
      let more = !upload.remaining.is_empty();
      let num = upload.next_num;
      let size = upload.size;
      let mut opts = upload.opts_template.clone();
      upload.next_num += 1;
      opts.add(lwm2m_msg::opt::number::BLOCK1, Block::new(num, more, size).encode());

      if !more {
        exchange.block1 = None;
      }
      let kind = exchange.kind;

      let id = self.ids.next();
      if let Some(exchange) = self.pending.get_mut(&token) {
        exchange.id = id;
        exchange.retry = RetryTimer::new(Instant::now(),
                                          self.config.msg.con.unacked_retry_strategy,
                                          self.config.msg.con.max_attempts);
      }

      return ResponseOutcome::NextBlock(Message { ty: Type::Con,
                                                   code: request_code(kind),
                                                   id,
                                                   token,
                                                   opts,
                                                   payload: chunk });
    }

    let Some(exchange) = self.pending.remove(&token) else {
      return ResponseOutcome::Unmatched;
    };

    if code.class == 2 {
      match exchange.kind {
        | ExchangeKind::Register => {
          self.state = State::Online;
          self.registered_at = Some(Instant::now());
        },
        | ExchangeKind::Update => {
          self.state = State::Online;
          self.registered_at = Some(Instant::now());
        },
        | ExchangeKind::Deregister => self.state = State::Offline,
      }
    } else {
      self.state = State::Error;
    }

    ResponseOutcome::Resolved
  }

  /// Record the Location-Path returned by a successful Register response.
  pub fn set_location_path(&mut self, path: UriPath) {
    self.location_path = Some(path);
  }

  /// Drive retransmission for all pending exchanges. Returns the messages
  /// that need to be re-sent now, and marks any exchange that exhausted its
  /// retry budget as failed (moving the client into `Error`).
  pub fn poll_retries(&mut self) -> Vec<(Token, Message)> {
    let now = Instant::now();
    let mut resends = Vec::new();
    let mut failed = Vec::new();

    for (token, exchange) in self.pending.iter_mut() {
      match exchange.retry.what_should_i_do(now) {
        | Ok(YouShould::Retry) => resends.push(*token),
        | Ok(YouShould::Cry) => failed.push(*token),
        | Err(_) => {},
      }
    }

    for token in failed {
      self.pending.remove(&token);
      self.state = State::Error;
    }

    resends.into_iter()
           .filter_map(|token| self.pending.get(&token).map(|e| (token, e.id)))
           .map(|(token, id)| {
             (token,
              Message { ty: Type::Con,
                        code: Code::new(0, 0),
                        id,
                        token,
                        opts: lwm2m_msg::Options::new(),
                        payload: Vec::new() })
           })
           .collect()
  }

  /// Begin observing `path`, recording the confirming token so future
  /// Notifications (matched by token, per RFC 7641) update
  /// [`Client::observe_needs_refresh`]/[`Client::observe_may_notify_now`]
  /// bookkeeping.
  pub fn begin_observe(&mut self, token: Token, path: UriPath) {
    self.observations
        .insert(token, Observation { token, path, last_seq: None, last_notify: Stamped::new(()) });
  }

  /// Cancel an observation. Silently does nothing if `token` has no
  /// matching observation.
  pub fn cancel_observe(&mut self, token: Token) {
    self.observations.remove(&token);
  }

  /// Update bookkeeping for a received Notification, rejecting a reordered
  /// one per RFC 7641 §3.4 serial-arithmetic comparison. Returns `true` if
  /// the notification should be applied.
  pub fn handle_notify(&mut self, token: Token, seq: Observe) -> bool {
    let Some(observation) = self.observations.get_mut(&token) else {
      return false;
    };

    let is_newer = match observation.last_seq {
      | Some(last) => seq.is_newer_than(&last),
      | None => true,
    };

    if is_newer {
      observation.last_seq = Some(seq);
      observation.last_notify = Stamped::new(());
    }

    is_newer
  }

  /// Whether enough time has passed since the last Notify for this
  /// observation to send another one right now, per the path's `pmin`
  /// attribute (defaults to "always allowed" when no `pmin` was set).
  pub fn observe_may_notify_now(&self, token: Token) -> bool {
    let Some(observation) = self.observations.get(&token) else {
      return false;
    };

    let Some(pmin) = self.attributes.get(&observation.path).and_then(|a| a.pmin) else {
      return true;
    };

    observation.last_notify.time().elapsed() >= pmin
  }

  /// Whether an observation has gone silent long enough to need a
  /// keep-alive Notify, per the path's `pmax` attribute: compares elapsed
  /// wall-clock time against `pmax`, falling back to half the registration
  /// lifetime when the Server never set one.
  pub fn observe_needs_refresh(&self, token: Token) -> bool {
    let Some(observation) = self.observations.get(&token) else {
      return false;
    };

    let pmax = self.attributes
                   .get(&observation.path)
                   .and_then(|a| a.pmax)
                   .unwrap_or_else(|| Duration::from_secs(self.config.server.lifetime_sec as u64) / 2);
    observation.last_notify.time().elapsed() >= pmax
  }

  /// Record Write-Attributes (pmin/pmax/…) a Server set for `path`.
  fn write_attributes(&mut self, path: UriPath, query: &[Vec<u8>]) {
    self.attributes.insert(path, NotificationAttrs::parse(query));
  }

  /// Handle one unsolicited inbound request (READ/WRITE/EXECUTE/DISCOVER/
  /// CREATE/DELETE/OBSERVE/WRITE_ATTRIBUTES) and build its response.
  /// Write-Attributes are intercepted here so pmin/pmax stay visible to
  /// [`Client::observe_may_notify_now`]/[`Client::observe_needs_refresh`];
  /// everything else is delegated to [`dispatch::process`].
  pub fn handle_inbound(&mut self, dm: &mut DataModel, request: &Message, is_bootstrap: bool, buf_size: usize)
                        -> Message {
    if request.code == Code::PUT && request.payload.is_empty() {
      let query = request.opts.get_all(lwm2m_msg::opt::number::URI_QUERY);
      if !query.is_empty() {
        if let Some(path) = parse_uri_path(request) {
          self.write_attributes(path, query);
        }
      }
    }
    dispatch::process(dm, request, is_bootstrap, buf_size)
  }

  /// Non-blocking: read one datagram and either advance a pending
  /// client-initiated exchange or dispatch an unsolicited request through
  /// [`Client::handle_inbound`], sending back its response. A `WouldBlock`
  /// poll is not an error.
  pub fn receive(&mut self, dm: &mut DataModel, socket: &impl Socket<Error = std::io::Error>, buf: &mut [u8],
                 is_bootstrap: bool)
                 -> Result<(), ClientError> {
    let addrd = match socket.recv(buf) {
      | Ok(addrd) => addrd,
      | Err(nb::Error::WouldBlock) => return Ok(()),
      | Err(nb::Error::Other(e)) => return Err(ClientError::Socket(e)),
    };
    let len = addrd.unwrap();
    let message = Message::from_bytes(&buf[..len])?;

    match message.code.kind() {
      | CodeKind::Response | CodeKind::Empty => {
        match self.handle_response(message.token, message.code) {
          | ResponseOutcome::NextBlock(next) => self.send(socket, &next),
          | ResponseOutcome::Resolved | ResponseOutcome::Unmatched => Ok(()),
        }
      },
      | CodeKind::Request => {
        let response = self.handle_inbound(dm, &message, is_bootstrap, buf.len());
        self.send(socket, &response)
      },
    }
  }

  /// Send one datagram through `socket`, logging a summary at debug level.
  pub fn send(&self, socket: &impl Socket<Error = std::io::Error>, message: &Message) -> Result<(), ClientError> {
    let bytes = message.to_bytes()?;
    log::debug!("sending {}", crate::logging::msg_summary(message));
    match socket.send(Addrd(&bytes, self.server_addr)) {
      | Ok(()) => Ok(()),
      | Err(nb::Error::WouldBlock) => Ok(()),
      | Err(nb::Error::Other(e)) => Err(ClientError::Socket(e)),
    }
  }
}

fn parse_uri_path(request: &Message) -> Option<UriPath> {
  let segments: Vec<String> = request.opts
                                      .get_all(lwm2m_msg::opt::number::URI_PATH)
                                      .iter()
                                      .map(|v| String::from_utf8_lossy(v).into_owned())
                                      .collect();
  if segments.is_empty() {
    return Some(UriPath::ROOT);
  }
  UriPath::parse(segments.iter().map(|s| s.as_str())).ok()
}

#[cfg(test)]
mod test {
  use std::net::{Ipv4Addr, SocketAddrV4};

  use super::*;
  use crate::config::Config;

  fn addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5683))
  }

  #[test]
  fn register_moves_to_open_in_progress() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let (_, token, _) = client.begin_register(Vec::new()).unwrap();

    assert_eq!(client.state(), State::OpenInProgress);
    assert!(client.pending.contains_key(&token));
  }

  #[test]
  fn successful_register_response_moves_online() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let (_, token, _) = client.begin_register(Vec::new()).unwrap();

    assert!(matches!(client.handle_response(token, Code::new(2, 1)), ResponseOutcome::Resolved));
    assert_eq!(client.state(), State::Online);
  }

  #[test]
  fn rejected_register_response_moves_error() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let (_, token, _) = client.begin_register(Vec::new()).unwrap();

    assert!(matches!(client.handle_response(token, Code::new(4, 0)), ResponseOutcome::Resolved));
    assert_eq!(client.state(), State::Error);
  }

  #[test]
  fn unknown_token_response_is_ignored() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    client.begin_register(Vec::new()).unwrap();

    assert!(matches!(client.handle_response(Token::new(&[99]), Code::new(2, 1)),
                      ResponseOutcome::Unmatched));
  }

  #[test]
  fn oversized_register_splits_into_block1_chunks() {
    let mut config = Config::default();
    config.msg.block_size = 8;
    let mut client = Client::new(addr(), config, "urn:dev:os:1".into());

    let (_, token, first) = client.begin_register(b"0123456789abcdef".to_vec()).unwrap();
    assert_eq!(first.payload, b"01234567");
    let first_block = first.opts.get_first(lwm2m_msg::opt::number::BLOCK1).and_then(Block::decode).unwrap();
    assert!(first_block.more);

    match client.handle_response(token, Code::CONTINUE) {
      | ResponseOutcome::NextBlock(next) => {
        assert_eq!(next.payload, b"89abcdef");
        let block = next.opts.get_first(lwm2m_msg::opt::number::BLOCK1).and_then(Block::decode).unwrap();
        assert!(!block.more);
        assert_eq!(block.num, 1);
      },
      | other => panic!("expected NextBlock, got {other:?}"),
    }

    assert!(matches!(client.handle_response(token, Code::CREATED), ResponseOutcome::Resolved));
    assert_eq!(client.state(), State::Online);
  }

  #[test]
  fn observe_cancel_on_unknown_token_is_a_silent_no_op() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    client.cancel_observe(Token::new(&[1]));
  }

  #[test]
  fn newer_notify_updates_sequence() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let token = Token::new(&[1]);
    client.begin_observe(token, UriPath::resource(3, 0, 9));

    assert!(client.handle_notify(token, Observe(1)));
    assert!(client.handle_notify(token, Observe(2)));
    assert!(!client.handle_notify(token, Observe(1)));
  }

  #[test]
  fn fresh_observation_does_not_need_refresh() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let token = Token::new(&[1]);
    client.begin_observe(token, UriPath::resource(3, 0, 9));

    assert!(!client.observe_needs_refresh(token));
  }

  #[test]
  fn pmax_attribute_overrides_default_refresh_window() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let path = UriPath::resource(3, 0, 9);
    let token = Token::new(&[1]);
    client.write_attributes(path, &[b"pmax=0".to_vec()]);
    client.begin_observe(token, path);

    assert!(client.observe_needs_refresh(token));
  }

  #[test]
  fn pmin_attribute_blocks_notify_until_elapsed() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let path = UriPath::resource(3, 0, 9);
    let token = Token::new(&[1]);
    client.write_attributes(path, &[b"pmin=3600".to_vec()]);
    client.begin_observe(token, path);

    assert!(!client.observe_may_notify_now(token));
  }

  #[test]
  fn no_pmin_attribute_always_allows_notify() {
    let mut client = Client::new(addr(), Config::default(), "urn:dev:os:1".into());
    let token = Token::new(&[1]);
    client.begin_observe(token, UriPath::resource(3, 0, 9));

    assert!(client.observe_may_notify_now(token));
  }
}
