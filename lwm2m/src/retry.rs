use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};

/// A non-blocking timer that allows a fixed-delay or exponential-backoff
/// retry, living alongside whatever request it's retrying.
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use lwm2m::retry::{Attempts, RetryTimer, Strategy, YouShould};
///
/// let mut called = false;
/// let mut fails_once = || -> Result<(), ()> {
///   if !called {
///     called = true;
///     Err(())
///   } else {
///     Ok(())
///   }
/// };
///
/// let strategy = Strategy::Delay { min: Duration::from_millis(1),
///                                  max: Duration::from_millis(2) };
/// let mut retry = RetryTimer::new(Instant::now(), strategy, Attempts(2));
///
/// while fails_once().is_err() {
///   match retry.what_should_i_do(Instant::now()) {
///     | Ok(YouShould::Retry) => continue,
///     | Ok(YouShould::Cry) => panic!("no more attempts!"),
///     | Err(_) => continue,
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryTimer {
  start: Instant,
  init: Duration,
  strategy: Strategy,
  attempts: Attempts,
  max_attempts: Attempts,
}

/// A number of attempts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Attempts(pub u16);

impl core::ops::Sub for Attempts {
  type Output = Attempts;
  fn sub(self, rhs: Attempts) -> Attempts {
    Attempts(self.0.saturating_sub(rhs.0))
  }
}

/// Result of [`RetryTimer::what_should_i_do`]: whether a retry should be
/// attempted or attempts have been exhausted.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum YouShould {
  /// Attempts have been exhausted; the retried operation should be
  /// considered failed.
  Cry,
  /// A retry should be performed.
  Retry,
}

impl RetryTimer {
  /// Create a new retrier.
  pub fn new(start: Instant, strategy: Strategy, max_attempts: Attempts) -> Self {
    let init = if strategy.has_jitter() {
      let seed = start.elapsed().as_nanos() as u64;
      let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
      Duration::from_millis(rand.gen_range(strategy.range()))
    } else {
      Duration::from_millis(*strategy.range().start())
    };

    Self { start, strategy, init, max_attempts, attempts: Attempts(1) }
  }

  /// When the retried operation fails again, invoke this to learn whether
  /// enough time has passed to retry, or attempts are exhausted.
  ///
  /// Returns `nb::Error::WouldBlock` when not enough time has passed yet.
  pub fn what_should_i_do(&mut self, now: Instant) -> nb::Result<YouShould, core::convert::Infallible> {
    if self.attempts >= self.max_attempts {
      Ok(YouShould::Cry)
    } else if self.is_ready(now.saturating_duration_since(self.start), self.attempts.0) {
      self.attempts.0 += 1;
      Ok(YouShould::Retry)
    } else {
      Err(nb::Error::WouldBlock)
    }
  }

  /// Check if the strategy says an appropriate time has passed.
  pub fn is_ready(&self, time_passed: Duration, attempts: u16) -> bool {
    if attempts == 0 {
      return true;
    }

    match self.strategy {
      | Strategy::Delay { .. } => time_passed >= self.init * attempts as u32,
      | Strategy::Exponential { .. } => time_passed >= Strategy::total_delay_exp(self.init, attempts),
    }
  }
}

/// Strategy to employ when retrying.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
  /// Generate a random delay between `init_min` and `init_max`, doubling the
  /// delay after each failed attempt (clamped to avoid unbounded shifts).
  Exponential {
    /// Minimum (inclusive) delay for the second attempt.
    init_min: Duration,
    /// Maximum (inclusive) delay for the second attempt.
    init_max: Duration,
  },
  /// Generate a random delay between `min` and `max`, waiting a flat
  /// multiple of it between attempts.
  Delay {
    /// Minimum (inclusive) delay for attempts.
    min: Duration,
    /// Maximum (inclusive) delay for attempts.
    max: Duration,
  },
}

/// Backoff attempt counts above this are clamped, since `1u32 << 16` already
/// exceeds any realistic transmission span.
const MAX_BACKOFF_SHIFT: u32 = 16;

impl Strategy {
  /// Are min & max delays the same? If so, skip the random number generation.
  pub fn has_jitter(&self) -> bool {
    let range = self.range();
    range.start() != range.end()
  }

  /// The min & max delays, in milliseconds, as an inclusive range.
  pub fn range(&self) -> core::ops::RangeInclusive<u64> {
    match self {
      | &Self::Delay { min, max } => min.as_millis() as u64..=max.as_millis() as u64,
      | &Self::Exponential { init_min, init_max } => {
        init_min.as_millis() as u64..=init_max.as_millis() as u64
      },
    }
  }

  /// The total time this strategy will take if every attempt up to
  /// `max_attempts` fails.
  pub fn max_time(&self, max_attempts: Attempts) -> Duration {
    match self {
      | Self::Exponential { init_max, .. } => Self::total_delay_exp(*init_max, max_attempts.0),
      | Self::Delay { max, .. } => *max * max_attempts.0 as u32,
    }
  }

  /// Given the initial delay and number of attempts performed, yields the
  /// delay until the next retry should be attempted.
  ///
  /// Uses an integer left-shift rather than `pow` to double the delay each
  /// attempt, clamped so the shift amount never exceeds
  /// [`MAX_BACKOFF_SHIFT`].
  fn total_delay_exp(init: Duration, attempt: u16) -> Duration {
    let shift = (attempt.saturating_sub(1) as u32).min(MAX_BACKOFF_SHIFT);
    init * (1u32 << shift)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn delay_retrier() {
    let start = Instant::now();
    let mut retry = RetryTimer::new(start,
                                    Strategy::Delay { min: Duration::from_millis(1000),
                                                      max: Duration::from_millis(1000) },
                                    Attempts(3));

    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(999)).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(1000)).unwrap(),
               YouShould::Retry);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(1999)).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(2000)).unwrap(),
               YouShould::Retry);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(10_000)).unwrap(),
               YouShould::Cry);
  }

  #[test]
  fn exponential_retrier() {
    let start = Instant::now();
    let mut retry = RetryTimer::new(start,
                                    Strategy::Exponential { init_min: Duration::from_millis(1000),
                                                            init_max: Duration::from_millis(1000) },
                                    Attempts(4));

    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(999)).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(1000)).unwrap(),
               YouShould::Retry);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(1999)).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(2000)).unwrap(),
               YouShould::Retry);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(3999)).unwrap_err(),
               nb::Error::WouldBlock);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(4000)).unwrap(),
               YouShould::Retry);
    assert_eq!(retry.what_should_i_do(start + Duration::from_millis(10_000)).unwrap(),
               YouShould::Cry);
  }

  #[test]
  fn exp_calculation_uses_shift_not_pow() {
    let init = Duration::from_millis(100);
    assert_eq!(Strategy::total_delay_exp(init, 1), Duration::from_millis(100));
    assert_eq!(Strategy::total_delay_exp(init, 2), Duration::from_millis(200));
    assert_eq!(Strategy::total_delay_exp(init, 3), Duration::from_millis(400));
  }

  #[test]
  fn exp_calculation_clamps_shift() {
    let init = Duration::from_millis(1);
    // attempt far beyond MAX_BACKOFF_SHIFT should clamp rather than overflow.
    assert_eq!(Strategy::total_delay_exp(init, 1000),
               Duration::from_millis(1 << MAX_BACKOFF_SHIFT));
  }
}
