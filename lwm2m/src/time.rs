use std::time::{Duration, Instant};

/// A duration, in milliseconds.
pub type Millis = Duration;

/// Timeout configuration allowing for "never time out" as an option.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum Timeout {
  /// Timeout after some duration has elapsed.
  After(Duration),
  /// Never time out.
  Never,
}

/// Data associated with the instant it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped<T>(pub T, pub Instant);

impl<T> Stamped<T> {
  /// Stamp `t` with the current time.
  pub fn new(t: T) -> Self {
    Self(t, Instant::now())
  }

  /// Borrow the contents.
  pub fn as_ref(&self) -> Stamped<&T> {
    Stamped(&self.0, self.1)
  }

  /// Borrow the contents of this item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// The instant this value was stamped at.
  pub fn time(&self) -> Instant {
    self.1
  }

  /// Discard the timestamp and yield the contained value.
  pub fn discard_timestamp(self) -> T {
    self.0
  }

  /// Map the contained value, keeping the original timestamp.
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Stamped<R> {
    Stamped(f(self.0), self.1)
  }

  /// Given an optional current "latest" value and a new candidate, keep
  /// whichever was stamped more recently.
  pub fn find_latest(winner: Option<Stamped<T>>, cur: Stamped<T>) -> Option<Stamped<T>> {
    Some(winner.filter(|winner| winner.time() > cur.time()).unwrap_or(cur))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn find_latest_keeps_newer() {
    let now = Instant::now();
    let a = Stamped(1, now);
    let b = Stamped(2, now + Duration::from_millis(1));
    assert_eq!(Stamped::find_latest(Some(a), b), Some(b));
    assert_eq!(Stamped::find_latest(Some(b), a), Some(b));
  }
}
