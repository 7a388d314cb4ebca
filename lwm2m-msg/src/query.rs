use core::fmt;

/// A single notification/registration/bootstrap/discover attribute parsed
/// from a Uri-Query option value.
#[derive(Clone, PartialEq, Debug)]
pub enum Attribute {
  /// `pmin=` minimum notification period, seconds.
  MinPeriod(i64),
  /// `pmax=` maximum notification period, seconds.
  MaxPeriod(i64),
  /// `gt=` greater-than threshold.
  GreaterThan(f64),
  /// `lt=` less-than threshold.
  LessThan(f64),
  /// `st=` step threshold.
  Step(f64),
  /// `epmin=` minimum evaluation period, seconds.
  MinEvalPeriod(i64),
  /// `epmax=` maximum evaluation period, seconds.
  MaxEvalPeriod(i64),
  /// `edge=` edge-triggered notification mode.
  Edge(i64),
  /// `con=` confirmable notifications flag.
  Confirmable(i64),
  /// `hqmax=` historical queue max size.
  HistoricalQueueMax(i64),
  /// `depth=` discover recursion depth.
  Depth(i64),
  /// `lwm2m=` protocol version, e.g. `"1.1"`.
  Lwm2mVersion(String),
  /// `ep=` endpoint client name.
  Endpoint(String),
  /// `b=` preferred transport binding.
  Binding(String),
  /// `Q` queue mode flag (no value).
  QueueMode,
  /// `pct=` bootstrap PCK content format hint.
  Pct(i64),
}

/// Errors parsing a Uri-Query attribute.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AttributeParseError {
  /// The key did not match any known attribute name.
  UnknownKey,
  /// A numeric attribute's value did not parse as a number.
  NotNumeric,
}

impl fmt::Display for AttributeParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::UnknownKey => write!(f, "unrecognized attribute key"),
      | Self::NotNumeric => write!(f, "malformed numeric attribute value"),
    }
  }
}

impl std::error::Error for AttributeParseError {}

impl Attribute {
  /// Parse one `key=value` (or bare `key`) Uri-Query segment.
  pub fn parse(segment: &str) -> Result<Self, AttributeParseError> {
    if segment == "Q" {
      return Ok(Self::QueueMode);
    }

    let (key, value) =
      segment.split_once('=').ok_or(AttributeParseError::UnknownKey)?;

    let int = |v: &str| v.parse::<i64>().map_err(|_| AttributeParseError::NotNumeric);
    let float = |v: &str| v.parse::<f64>().map_err(|_| AttributeParseError::NotNumeric);

    match key {
      | "pmin" => Ok(Self::MinPeriod(int(value)?)),
      | "pmax" => Ok(Self::MaxPeriod(int(value)?)),
      | "gt" => Ok(Self::GreaterThan(float(value)?)),
      | "lt" => Ok(Self::LessThan(float(value)?)),
      | "st" => Ok(Self::Step(float(value)?)),
      | "epmin" => Ok(Self::MinEvalPeriod(int(value)?)),
      | "epmax" => Ok(Self::MaxEvalPeriod(int(value)?)),
      | "edge" => Ok(Self::Edge(int(value)?)),
      | "con" => Ok(Self::Confirmable(int(value)?)),
      | "hqmax" => Ok(Self::HistoricalQueueMax(int(value)?)),
      | "depth" => Ok(Self::Depth(int(value)?)),
      | "lwm2m" => Ok(Self::Lwm2mVersion(value.to_string())),
      | "ep" => Ok(Self::Endpoint(value.to_string())),
      | "b" => Ok(Self::Binding(value.to_string())),
      | "pct" => Ok(Self::Pct(int(value)?)),
      | _ => Err(AttributeParseError::UnknownKey),
    }
  }

  /// Parse every Uri-Query value on a request into an attribute bag,
  /// skipping query segments that name unrecognized keys rather than
  /// failing the whole parse, matching the CoAP proxy-forwarding
  /// convention of ignoring unrecognized elective query options.
  pub fn parse_all<'a>(segments: impl Iterator<Item = &'a [u8]>) -> Vec<Self> {
    segments.filter_map(|s| core::str::from_utf8(s).ok())
            .filter_map(|s| Self::parse(s).ok())
            .collect()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parses_numeric_attributes() {
    assert_eq!(Attribute::parse("pmin=10").unwrap(), Attribute::MinPeriod(10));
    assert_eq!(Attribute::parse("gt=12.5").unwrap(), Attribute::GreaterThan(12.5));
  }

  #[test]
  fn parses_string_attributes() {
    assert_eq!(Attribute::parse("ep=node-1").unwrap(), Attribute::Endpoint("node-1".into()));
    assert_eq!(Attribute::parse("lwm2m=1.1").unwrap(), Attribute::Lwm2mVersion("1.1".into()));
  }

  #[test]
  fn parses_bare_queue_flag() {
    assert_eq!(Attribute::parse("Q").unwrap(), Attribute::QueueMode);
  }

  #[test]
  fn rejects_malformed_numeric() {
    assert_eq!(Attribute::parse("pmin=abc").unwrap_err(), AttributeParseError::NotNumeric);
  }

  #[test]
  fn parse_all_skips_unknown_keys() {
    let segments: Vec<&[u8]> = vec![b"pmin=5", b"bogus=1", b"ep=dev"];
    let parsed = Attribute::parse_all(segments.into_iter());
    assert_eq!(parsed, vec![Attribute::MinPeriod(5), Attribute::Endpoint("dev".into())]);
  }
}
