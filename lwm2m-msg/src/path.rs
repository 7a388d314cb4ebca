use core::fmt;

/// A LwM2M resource path: up to four identifiers (Object, Instance, Resource,
/// Resource Instance), each optionally set. The "root" path has zero
/// components set.
///
/// Components are always prefix-contiguous in valid paths (you cannot have an
/// `rid` without an `iid`), but this type does not enforce that on
/// construction — [`UriPath::depth`] and [`UriPath::is_well_formed`] let
/// callers validate it where it matters (path validation against the data
/// model, not path parsing).
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct UriPath {
  /// Object ID
  pub oid: Option<u16>,
  /// Object Instance ID
  pub iid: Option<u16>,
  /// Resource ID
  pub rid: Option<u16>,
  /// Resource Instance ID
  pub riid: Option<u16>,
}

impl UriPath {
  /// The root path (zero components).
  pub const ROOT: Self = Self { oid: None, iid: None, rid: None, riid: None };

  /// Construct an Object-level path.
  pub fn object(oid: u16) -> Self {
    Self { oid: Some(oid), ..Self::ROOT }
  }

  /// Construct an Object Instance-level path.
  pub fn instance(oid: u16, iid: u16) -> Self {
    Self { oid: Some(oid), iid: Some(iid), ..Self::ROOT }
  }

  /// Construct a Resource-level path.
  pub fn resource(oid: u16, iid: u16, rid: u16) -> Self {
    Self { oid: Some(oid), iid: Some(iid), rid: Some(rid), ..Self::ROOT }
  }

  /// Construct a Resource Instance-level path.
  pub fn resource_instance(oid: u16, iid: u16, rid: u16, riid: u16) -> Self {
    Self { oid: Some(oid), iid: Some(iid), rid: Some(rid), riid: Some(riid) }
  }

  /// Number of components set (0 = root, 4 = resource instance).
  pub fn depth(&self) -> u8 {
    [self.oid, self.iid, self.rid, self.riid].iter()
                                              .filter(|c| c.is_some())
                                              .count() as u8
  }

  /// A path is well-formed if its set components are a contiguous prefix:
  /// `oid`, then `oid+iid`, then `oid+iid+rid`, then all four. A path with
  /// e.g. `rid` set but `iid` unset is not well-formed.
  pub fn is_well_formed(&self) -> bool {
    match (self.oid, self.iid, self.rid, self.riid) {
      | (None, None, None, None) => true,
      | (Some(_), None, None, None) => true,
      | (Some(_), Some(_), None, None) => true,
      | (Some(_), Some(_), Some(_), None) => true,
      | (Some(_), Some(_), Some(_), Some(_)) => true,
      | _ => false,
    }
  }

  /// Parse path components accumulated from Uri-Path option values.
  ///
  /// Returns `Err` if there are more than 4 segments or any segment fails to
  /// parse as a `u16`. The special bootstrap-finish path `/bs` is not
  /// numeric and must be recognized by the caller before reaching this
  /// parser.
  pub fn parse<'a>(segments: impl Iterator<Item = &'a str>) -> Result<Self, PathParseError> {
    let mut ids = [None; 4];
    let mut n = 0usize;

    for seg in segments {
      if n >= 4 {
        return Err(PathParseError::TooManyComponents);
      }
      let id: u16 = seg.parse().map_err(|_| PathParseError::NotNumeric)?;
      ids[n] = Some(id);
      n += 1;
    }

    Ok(Self { oid: ids[0], iid: ids[1], rid: ids[2], riid: ids[3] })
  }

  /// True if `self` is `other` or an ancestor of `other` in the tree (e.g.
  /// `/3` is a prefix of `/3/0/1`).
  pub fn is_prefix_of(&self, other: &Self) -> bool {
    fn covers(a: Option<u16>, b: Option<u16>) -> bool {
      match a {
        | None => true,
        | Some(a) => b == Some(a),
      }
    }
    covers(self.oid, other.oid) && covers(self.iid, other.iid) && covers(self.rid, other.rid)
    && covers(self.riid, other.riid)
  }
}

impl fmt::Display for UriPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "/")?;
    for (ix, id) in [self.oid, self.iid, self.rid, self.riid].into_iter()
                                                              .flatten()
                                                              .enumerate()
    {
      if ix > 0 {
        write!(f, "/")?;
      }
      write!(f, "{id}")?;
    }
    Ok(())
  }
}

/// Errors parsing a Uri-Path into a [`UriPath`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathParseError {
  /// More than 4 path segments were given.
  TooManyComponents,
  /// A segment did not parse as `u16`.
  NotNumeric,
}

impl fmt::Display for PathParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::TooManyComponents => write!(f, "more than 4 path components"),
      | Self::NotNumeric => write!(f, "path component was not numeric"),
    }
  }
}

impl std::error::Error for PathParseError {}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parses_numeric_segments() {
    let path = UriPath::parse(["3", "0", "5"].into_iter()).unwrap();
    assert_eq!(path, UriPath::resource(3, 0, 5));
  }

  #[test]
  fn rejects_non_numeric() {
    assert_eq!(UriPath::parse(["bs"].into_iter()).unwrap_err(), PathParseError::NotNumeric);
  }

  #[test]
  fn rejects_too_many_segments() {
    let err = UriPath::parse(["1", "2", "3", "4", "5"].into_iter()).unwrap_err();
    assert_eq!(err, PathParseError::TooManyComponents);
  }

  #[test]
  fn prefix() {
    let object = UriPath::object(3);
    let resource = UriPath::resource(3, 0, 5);
    assert!(object.is_prefix_of(&resource));
    assert!(!resource.is_prefix_of(&object));
  }

  #[test]
  fn well_formed() {
    assert!(UriPath::resource(3, 0, 5).is_well_formed());
    assert!(!UriPath { oid: Some(3), rid: Some(5), ..UriPath::ROOT }.is_well_formed());
  }
}
