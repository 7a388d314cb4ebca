use crate::code::Code;
use crate::opt::Observe;
use crate::path::UriPath;

/// `application/link-format`, used to distinguish a Discover GET from a plain
/// Read GET (Registry of Content-Formats, RFC6690).
pub const CONTENT_FORMAT_LINK_FORMAT: u16 = 40;

/// The LwM2M operation a decoded request represents, inferred from its
/// method, Observe option and target path shape.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Operation {
  /// GET, no Observe.
  DmRead,
  /// GET with `Accept: application/link-format`.
  Discover,
  /// GET, Observe = 0.
  InfObserve,
  /// GET, Observe = 1.
  InfCancelObserve,
  /// FETCH (0.05), no Observe.
  DmReadComposite,
  /// FETCH, Observe = 0.
  InfObserveComposite,
  /// FETCH, Observe = 1.
  InfCancelObserveComposite,
  /// PUT to a resource with a payload.
  DmWriteReplace,
  /// PUT to a resource with only query parameters (attribute write).
  DmWriteAttributes,
  /// POST to `/bs`.
  BootstrapFinish,
  /// POST to an object.
  DmCreate,
  /// POST to a resource with an empty or plain-text payload.
  DmExecute,
  /// POST to a resource with a structured payload.
  DmWritePartialUpdate,
  /// iPATCH (0.07).
  DmWriteComposite,
  /// DELETE.
  DmDelete,
}

/// Inputs needed to infer an [`Operation`] from a decoded request, mirroring
/// what a [`crate::Message`] plus its parsed [`UriPath`] expose.
#[derive(Copy, Clone, Debug)]
pub struct OperationContext {
  /// The request method code.
  pub code: Code,
  /// The Observe option's value, if present.
  pub observe: Option<Observe>,
  /// The request target, or `None` for the special `/bs` bootstrap-finish path.
  pub path: Option<UriPath>,
  /// Whether this is the `/bs` bootstrap-finish path.
  pub is_bootstrap_finish_path: bool,
  /// Whether Accept or Content-Format names `application/link-format`.
  pub link_format: bool,
  /// Whether the request carries a non-empty payload.
  pub has_payload: bool,
  /// Whether the request carries at least one Uri-Query option.
  pub has_query: bool,
}

/// Errors inferring an [`Operation`] from a request shape not covered by the
/// method/path/Observe combination table.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OperationInferenceError {
  /// The method code is not one LwM2M assigns an operation to.
  UnsupportedMethod(Code),
  /// PUT/POST targeted a path shape that has no defined operation (e.g. PUT
  /// to an object).
  UnsupportedPathShape,
}

impl Operation {
  /// Infer the operation per the method/Observe/path table.
  pub fn infer(ctx: &OperationContext) -> Result<Self, OperationInferenceError> {
    if ctx.is_bootstrap_finish_path {
      return if ctx.code == Code::POST {
        Ok(Self::BootstrapFinish)
      } else {
        Err(OperationInferenceError::UnsupportedMethod(ctx.code))
      };
    }

    let depth = ctx.path.map(|p| p.depth()).unwrap_or(0);

    match ctx.code {
      | Code::GET => match ctx.observe {
        | Some(Observe::REGISTER) => Ok(Self::InfObserve),
        | Some(Observe::DEREGISTER) => Ok(Self::InfCancelObserve),
        | _ if ctx.link_format => Ok(Self::Discover),
        | _ => Ok(Self::DmRead),
      },
      | Code::FETCH => match ctx.observe {
        | Some(Observe::REGISTER) => Ok(Self::InfObserveComposite),
        | Some(Observe::DEREGISTER) => Ok(Self::InfCancelObserveComposite),
        | _ => Ok(Self::DmReadComposite),
      },
      | Code::PUT => {
        if depth < 3 {
          return Err(OperationInferenceError::UnsupportedPathShape);
        }
        if ctx.has_payload {
          Ok(Self::DmWriteReplace)
        } else if ctx.has_query {
          Ok(Self::DmWriteAttributes)
        } else {
          Err(OperationInferenceError::UnsupportedPathShape)
        }
      },
      | Code::POST => match depth {
        | 1 => Ok(Self::DmCreate),
        | 3 => {
          if ctx.has_payload {
            Ok(Self::DmWritePartialUpdate)
          } else {
            Ok(Self::DmExecute)
          }
        },
        | _ => Err(OperationInferenceError::UnsupportedPathShape),
      },
      | Code::IPATCH => Ok(Self::DmWriteComposite),
      | Code::DELETE => Ok(Self::DmDelete),
      | other => Err(OperationInferenceError::UnsupportedMethod(other)),
    }
  }
}

impl core::fmt::Display for OperationInferenceError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      | Self::UnsupportedMethod(c) => write!(f, "method {c} has no defined LwM2M operation"),
      | Self::UnsupportedPathShape => write!(f, "path shape does not support this method"),
    }
  }
}

impl std::error::Error for OperationInferenceError {}

#[cfg(test)]
mod test {
  use super::*;

  fn ctx(code: Code) -> OperationContext {
    OperationContext { code,
                       observe: None,
                       path: Some(UriPath::resource(3, 0, 1)),
                       is_bootstrap_finish_path: false,
                       link_format: false,
                       has_payload: false,
                       has_query: false }
  }

  #[test]
  fn plain_get_is_read() {
    assert_eq!(Operation::infer(&ctx(Code::GET)).unwrap(), Operation::DmRead);
  }

  #[test]
  fn get_with_link_format_is_discover() {
    let mut c = ctx(Code::GET);
    c.link_format = true;
    assert_eq!(Operation::infer(&c).unwrap(), Operation::Discover);
  }

  #[test]
  fn get_observe_register_vs_deregister() {
    let mut c = ctx(Code::GET);
    c.observe = Some(Observe::REGISTER);
    assert_eq!(Operation::infer(&c).unwrap(), Operation::InfObserve);
    c.observe = Some(Observe::DEREGISTER);
    assert_eq!(Operation::infer(&c).unwrap(), Operation::InfCancelObserve);
  }

  #[test]
  fn put_with_payload_vs_query_only() {
    let mut c = ctx(Code::PUT);
    c.has_payload = true;
    assert_eq!(Operation::infer(&c).unwrap(), Operation::DmWriteReplace);

    let mut c = ctx(Code::PUT);
    c.has_query = true;
    assert_eq!(Operation::infer(&c).unwrap(), Operation::DmWriteAttributes);
  }

  #[test]
  fn post_to_object_is_create() {
    let mut c = ctx(Code::POST);
    c.path = Some(UriPath::object(3));
    assert_eq!(Operation::infer(&c).unwrap(), Operation::DmCreate);
  }

  #[test]
  fn post_to_resource_execute_or_write() {
    let c = ctx(Code::POST);
    assert_eq!(Operation::infer(&c).unwrap(), Operation::DmExecute);

    let mut c = ctx(Code::POST);
    c.has_payload = true;
    assert_eq!(Operation::infer(&c).unwrap(), Operation::DmWritePartialUpdate);
  }

  #[test]
  fn bootstrap_finish_requires_post() {
    let mut c = ctx(Code::POST);
    c.is_bootstrap_finish_path = true;
    assert_eq!(Operation::infer(&c).unwrap(), Operation::BootstrapFinish);

    let mut c = ctx(Code::GET);
    c.is_bootstrap_finish_path = true;
    assert!(Operation::infer(&c).is_err());
  }

  #[test]
  fn delete_and_ipatch() {
    assert_eq!(Operation::infer(&ctx(Code::DELETE)).unwrap(), Operation::DmDelete);
    assert_eq!(Operation::infer(&ctx(Code::IPATCH)).unwrap(), Operation::DmWriteComposite);
  }
}
