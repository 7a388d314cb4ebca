use std::time::Duration;

use crate::retry::{Attempts, Strategy};

/// Bytes / Second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BytesPerSecond(pub u16);

/// Configuration options related to parsing & handling outbound CON requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Con {
  /// Retry strategy for CON requests that have not yet been ACKed.
  ///
  /// Defaults to an exponential retry strategy:
  /// ```
  /// use std::time::Duration;
  ///
  /// use lwm2m::config::Con;
  /// use lwm2m::retry::Strategy;
  ///
  /// assert_eq!(Con::default().unacked_retry_strategy,
  ///            Strategy::Exponential { init_min: Duration::from_millis(500),
  ///                                    init_max: Duration::from_millis(1_000) });
  /// ```
  pub unacked_retry_strategy: Strategy,
  /// Retry strategy for CON requests that have been ACKed.
  ///
  /// Usually this should be **lazier** than `unacked_retry_strategy`, since
  /// the gap between "received request" and "responded with ACK" is
  /// typically shorter than between "ACKed" and "sent actual response."
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use lwm2m::config::Con;
  /// use lwm2m::retry::Strategy;
  ///
  /// assert_eq!(Con::default().acked_retry_strategy,
  ///            Strategy::Exponential { init_min: Duration::from_millis(1_000),
  ///                                    init_max: Duration::from_millis(2_000) });
  /// ```
  pub acked_retry_strategy: Strategy,
  /// Number of times a CON request may be resent before erroring.
  ///
  /// ```
  /// use lwm2m::config::Con;
  /// use lwm2m::retry::Attempts;
  ///
  /// assert_eq!(Con::default().max_attempts, Attempts(4));
  /// ```
  pub max_attempts: Attempts,
}

/// Configuration options related to parsing & handling outbound NON requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Non {
  /// Strategy used when a NON request has been sent but no response has
  /// arrived yet.
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use lwm2m::config::Non;
  /// use lwm2m::retry::Strategy;
  ///
  /// assert_eq!(Non::default().retry_strategy,
  ///            Strategy::Exponential { init_min: Duration::from_millis(250),
  ///                                    init_max: Duration::from_millis(500) });
  /// ```
  pub retry_strategy: Strategy,
  /// Number of times a NON request may be resent before erroring.
  ///
  /// ```
  /// use lwm2m::config::Non;
  /// use lwm2m::retry::Attempts;
  ///
  /// assert_eq!(Non::default().max_attempts, Attempts(4));
  /// ```
  pub max_attempts: Attempts,
}

/// Configuration options related to parsing & handling messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msg {
  /// Seed used to generate message [`lwm2m_msg::Token`]s and message ids,
  /// customizable so an application can generate less guessable tokens.
  ///
  /// Defaults to `0`, though it is best practice to set this to something
  /// else (random integer, device serial, etc).
  ///
  /// ```
  /// use lwm2m::config::Msg;
  ///
  /// assert_eq!(Msg::default().token_seed, 0);
  /// ```
  pub token_seed: u16,

  /// Transmission rate that should not be exceeded while waiting for
  /// responses to NON requests or acked CON requests.
  ///
  /// ```
  /// use lwm2m::config::{BytesPerSecond, Msg};
  ///
  /// assert_eq!(Msg::default().probing_rate, BytesPerSecond(1000));
  /// ```
  pub probing_rate: BytesPerSecond,

  /// See [`Con`].
  pub con: Con,

  /// See [`Non`].
  pub non: Non,

  /// Maximum delay before responding to multicast requests. The actual
  /// delay is random between zero and this value.
  ///
  /// ```
  /// use std::time::Duration;
  ///
  /// use lwm2m::config::Msg;
  ///
  /// assert_eq!(Msg::default().multicast_response_leisure, Duration::from_millis(5000));
  /// ```
  pub multicast_response_leisure: Duration,

  /// Maximum size, in bytes, of a single block when a request or response
  /// payload must be split via CoAP Block1/Block2 (RFC 7959).
  ///
  /// ```
  /// use lwm2m::config::Msg;
  ///
  /// assert_eq!(Msg::default().block_size, 1024);
  /// ```
  pub block_size: u16,
}

impl Default for Con {
  fn default() -> Self {
    Con { unacked_retry_strategy: Strategy::Exponential { init_min: Duration::from_millis(500),
                                                          init_max: Duration::from_millis(1_000) },
          acked_retry_strategy: Strategy::Exponential { init_min: Duration::from_millis(1_000),
                                                        init_max: Duration::from_millis(2_000) },
          max_attempts: Attempts(4) }
  }
}

impl Default for Non {
  fn default() -> Self {
    Non { retry_strategy: Strategy::Exponential { init_min: Duration::from_millis(250),
                                                  init_max: Duration::from_millis(500) },
          max_attempts: Attempts(4) }
  }
}

impl Default for Msg {
  fn default() -> Self {
    Msg { token_seed: 0,
          probing_rate: BytesPerSecond(1000),
          con: Con::default(),
          non: Non::default(),
          multicast_response_leisure: Duration::from_millis(5000),
          block_size: 1024 }
  }
}

/// LwM2M Server Object attributes relevant to the registration lifecycle
/// (OID 1 resources 1, 6, 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerLifecycle {
  /// Resource 1: registration lifetime, seconds.
  pub lifetime_sec: u32,
  /// Resource 6: whether to use Queue Mode binding.
  pub notification_storing: bool,
  /// Resource 7: preferred transport binding (e.g. `"U"`, `"UQ"`).
  pub binding: &'static str,
}

impl Default for ServerLifecycle {
  fn default() -> Self {
    Self { lifetime_sec: 86400, notification_storing: true, binding: "U" }
  }
}

/// Runtime configuration for a [`crate::client::Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
  /// See [`Msg`].
  pub msg: Msg,
  /// Maximum number of requests that may be in flight at once.
  ///
  /// ```
  /// use lwm2m::config::Config;
  ///
  /// assert_eq!(Config::default().max_concurrent_requests, 1);
  /// ```
  pub max_concurrent_requests: u8,
  /// Default server registration lifecycle attributes, used until a Server
  /// Object instance overrides them.
  pub server: ServerLifecycle,
}

impl Default for Config {
  fn default() -> Self {
    Config { msg: Msg::default(), max_concurrent_requests: 1, server: ServerLifecycle::default() }
  }
}

impl Config {
  pub(crate) fn max_transmit_span(&self) -> Duration {
    let acked_con = self.msg.con.acked_retry_strategy.max_time(self.msg.con.max_attempts - Attempts(1));
    let unacked_con =
      self.msg.con.unacked_retry_strategy.max_time(self.msg.con.max_attempts - Attempts(1));
    let non = self.msg.non.retry_strategy.max_time(self.msg.non.max_attempts - Attempts(1));

    acked_con.max(unacked_con).max(non)
  }

  pub(crate) fn max_transmit_wait(&self) -> Duration {
    let acked_con = self.msg.con.acked_retry_strategy.max_time(self.msg.con.max_attempts);
    let unacked_con = self.msg.con.unacked_retry_strategy.max_time(self.msg.con.max_attempts);
    let non = self.msg.non.retry_strategy.max_time(self.msg.non.max_attempts);

    acked_con.max(unacked_con).max(non)
  }

  pub(crate) fn max_latency(&self) -> Duration {
    Duration::from_millis(100_000)
  }

  pub(crate) fn expected_processing_delay(&self) -> Duration {
    Duration::from_millis(200)
  }

  pub(crate) fn exchange_lifetime(&self) -> Duration {
    self.max_transmit_span() + (self.max_latency() * 2) + self.expected_processing_delay()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn exchange_lifetime_accounts_for_latency_and_processing() {
    let config = Config::default();
    let expected =
      config.max_transmit_span() + config.max_latency() * 2 + config.expected_processing_delay();
    assert_eq!(config.exchange_lifetime(), expected);
  }
}
