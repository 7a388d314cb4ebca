//! LwM2M Data Model: Objects, Object Instances, Resources and Resource
//! Instances, plus the transactional mutation protocol used by the client
//! state machine to apply Read/Write/Create/Delete/Execute operations.
//!
//! Grounded in `sdm_io.h`'s `sdm_obj_t`/`sdm_obj_inst_t`/`sdm_res_t`/
//! `sdm_res_handlers_t`/`sdm_obj_handlers_t` surface: each Object carries a
//! table of handlers (read/write/execute/instance create/delete) plus
//! `operation_begin`/`read_entry`/`write_entry`/`operation_end` transaction
//! hooks that a decoded CoAP request is driven through one entry at a time.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use lwm2m_msg::{Operation, Token, UriPath};

use crate::error::DmError;

/// A resource's value. Mirrors `fluf_data_type_t`'s tagged union (string,
/// integer, float, boolean, opaque bytes, object link, time, unsigned
/// integer).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  /// UTF-8 text.
  String(String),
  /// Signed 64-bit integer.
  Int(i64),
  /// Unsigned 64-bit integer (LwM2M 1.1+).
  UInt(u64),
  /// IEEE754 double.
  Float(f64),
  /// Boolean.
  Bool(bool),
  /// Raw bytes.
  Opaque(Vec<u8>),
  /// An Object Link: `(Object ID, Object Instance ID)`.
  ObjLink(u16, u16),
  /// A Unix timestamp, seconds since epoch.
  Time(i64),
}

impl Value {
  /// The [`Kind`] this value's variant corresponds to.
  pub fn kind(&self) -> Kind {
    match self {
      | Self::String(_) => Kind::String,
      | Self::Int(_) => Kind::Int,
      | Self::UInt(_) => Kind::UInt,
      | Self::Float(_) => Kind::Float,
      | Self::Bool(_) => Kind::Bool,
      | Self::Opaque(_) => Kind::Opaque,
      | Self::ObjLink(..) => Kind::ObjLink,
      | Self::Time(_) => Kind::Time,
    }
  }
}

/// The declared type of a resource, independent of any particular value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
  /// UTF-8 text.
  String,
  /// Signed integer.
  Int,
  /// Unsigned integer.
  UInt,
  /// Float.
  Float,
  /// Boolean.
  Bool,
  /// Raw bytes.
  Opaque,
  /// Object link.
  ObjLink,
  /// Timestamp.
  Time,
}

/// The operations an LwM2M Server may perform on a resource, per
/// `sdm_res_operation_t` (R, RM, W, WM, RW, RWM, E, BS_RW).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
  /// Read-only, single-instance.
  Read,
  /// Read-only, multi-instance.
  ReadMulti,
  /// Write-only, single-instance.
  Write,
  /// Write-only, multi-instance.
  WriteMulti,
  /// Read-write, single-instance.
  ReadWrite,
  /// Read-write, multi-instance.
  ReadWriteMulti,
  /// Executable.
  Execute,
  /// Read-write, but only mutable during the bootstrap window regardless of
  /// the declared access otherwise.
  BootstrapReadWrite,
}

impl Access {
  /// Whether a standard (non-bootstrap) Read is permitted.
  pub fn readable(&self) -> bool {
    matches!(self,
             Self::Read | Self::ReadMulti | Self::ReadWrite | Self::ReadWriteMulti)
  }

  /// Whether a standard (non-bootstrap) Write is permitted.
  pub fn writable(&self) -> bool {
    matches!(self,
             Self::Write | Self::WriteMulti | Self::ReadWrite | Self::ReadWriteMulti)
  }

  /// Whether a write targeting this resource is permitted during the
  /// bootstrap window: every kind except Execute, since BOOTSTRAP-mode
  /// writes may target resources (R, RM) that are read-only outside
  /// bootstrap, and `BootstrapReadWrite` resources are writable only then.
  pub fn bootstrap_writable(&self) -> bool {
    !matches!(self, Self::Execute)
  }

  /// Whether this resource is executable.
  pub fn executable(&self) -> bool {
    matches!(self, Self::Execute)
  }

  /// Whether multiple Resource Instances are permitted.
  pub fn multi_instance(&self) -> bool {
    matches!(self, Self::ReadMulti | Self::WriteMulti | Self::ReadWriteMulti)
  }
}

/// Static description of one Resource on an Object: its ID, value kind and
/// access mode. Grounded in `sdm_res_spec_t`.
#[derive(Clone, Debug)]
pub struct ResourceSpec {
  /// Resource ID.
  pub rid: u16,
  /// The value type this resource holds.
  pub kind: Kind,
  /// Read/write/execute access mode.
  pub access: Access,
}

/// In-memory value storage for one Object Instance: resource id to either a
/// single value or, for multi-instance resources, a map of resource
/// instance id to value.
#[derive(Clone, Debug, Default)]
pub struct InstanceValues {
  single: BTreeMap<u16, Value>,
  multi: BTreeMap<u16, BTreeMap<u16, Value>>,
}

impl InstanceValues {
  /// Read a single-instance resource's value.
  pub fn get(&self, rid: u16) -> Option<&Value> {
    self.single.get(&rid)
  }

  /// Read one Resource Instance's value from a multi-instance resource.
  pub fn get_instance(&self, rid: u16, riid: u16) -> Option<&Value> {
    self.multi.get(&rid).and_then(|m| m.get(&riid))
  }

  /// All resource instances of a multi-instance resource, in ascending
  /// Resource Instance ID order.
  pub fn get_all_instances(&self, rid: u16) -> impl Iterator<Item = (u16, &Value)> {
    self.multi.get(&rid).into_iter().flat_map(|m| m.iter().map(|(&riid, v)| (riid, v)))
  }

  /// Set a single-instance resource's value.
  pub fn set(&mut self, rid: u16, value: Value) {
    self.single.insert(rid, value);
  }

  /// Set one Resource Instance's value on a multi-instance resource.
  pub fn set_instance(&mut self, rid: u16, riid: u16, value: Value) {
    self.multi.entry(rid).or_default().insert(riid, value);
  }

  /// Remove one Resource Instance.
  pub fn remove_instance(&mut self, rid: u16, riid: u16) {
    if let Some(m) = self.multi.get_mut(&rid) {
      m.remove(&riid);
    }
  }
}

/// One Object Instance: its ID and the current resource values.
#[derive(Clone, Debug, Default)]
pub struct Instance {
  /// Object Instance ID.
  pub iid: u16,
  /// Current resource values.
  pub values: InstanceValues,
}

/// An Object: its ID, the Resources it defines, and its live Instances.
/// Objects with `multi_instance: false` never hold more than one Instance.
///
/// `supports_create`/`supports_reset` mirror whether `sdm_obj_handlers_t`
/// registered an `inst_create`/`inst_reset` handler; `execute` mirrors
/// `sdm_res_handlers_t::res_execute`. An Object with Execute resources but no
/// `execute` handler cannot actually be executed — see
/// [`DataModel::execute`].
pub struct Object {
  /// Object ID.
  pub oid: u16,
  /// Static resource table.
  pub resources: Vec<ResourceSpec>,
  /// Whether more than one Instance may exist.
  pub multi_instance: bool,
  /// Live instances, keyed by Instance ID.
  pub instances: BTreeMap<u16, Instance>,
  /// Whether CREATE (`inst_create`) is supported on this Object.
  pub supports_create: bool,
  /// Whether WRITE_REPLACE on a whole Instance (`inst_reset`) is supported.
  pub supports_reset: bool,
  execute: Option<Box<dyn FnMut(u16, u16, &[u8]) -> Result<(), DmError> + Send>>,
}

impl Object {
  /// Construct an empty object with the given resource table. Neither
  /// CREATE nor instance-level WRITE_REPLACE nor EXECUTE is supported until
  /// the matching `with_*` builder is applied.
  pub fn new(oid: u16, resources: Vec<ResourceSpec>, multi_instance: bool) -> Self {
    Self { oid,
           resources,
           multi_instance,
           instances: BTreeMap::new(),
           supports_create: false,
           supports_reset: false,
           execute: None }
  }

  /// Register an `inst_create` handler, allowing CREATE on this Object.
  pub fn with_create(mut self) -> Self {
    self.supports_create = true;
    self
  }

  /// Register an `inst_reset` handler, allowing WRITE_REPLACE to target a
  /// whole Instance (clearing it before the replacement values are written).
  pub fn with_reset(mut self) -> Self {
    self.supports_reset = true;
    self
  }

  /// Register a `res_execute` handler, called with `(iid, rid, args)` for
  /// any EXECUTE targeting this Object.
  pub fn with_execute(mut self,
                       handler: impl FnMut(u16, u16, &[u8]) -> Result<(), DmError> + Send + 'static)
                       -> Self {
    self.execute = Some(Box::new(handler));
    self
  }

  /// Find a resource's static spec by ID.
  pub fn resource_spec(&self, rid: u16) -> Option<&ResourceSpec> {
    self.resources.iter().find(|r| r.rid == rid)
  }
}

impl core::fmt::Debug for Object {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Object")
     .field("oid", &self.oid)
     .field("resources", &self.resources)
     .field("multi_instance", &self.multi_instance)
     .field("instances", &self.instances)
     .field("supports_create", &self.supports_create)
     .field("supports_reset", &self.supports_reset)
     .field("has_execute_handler", &self.execute.is_some())
     .finish()
  }
}

/// A staged mutation, recorded during an open transaction and applied only
/// on commit.
#[derive(Clone, Debug)]
enum Mutation {
  Write { oid: u16, iid: u16, rid: u16, riid: Option<u16>, value: Value, append: bool },
  ResetInstance { oid: u16, iid: u16 },
  DeleteInstance { oid: u16, iid: u16 },
  CreateInstance { oid: u16, iid: u16 },
  DeleteResourceInstance { oid: u16, iid: u16, rid: u16, riid: u16 },
}

/// The Data Model: a registry of Objects plus the transaction state used to
/// stage writes before committing or rolling them back atomically.
///
/// Grounded in `sdm_data_model_t` and the `operation_begin`/`read_entry`/
/// `write_entry`/`operation_end` lifecycle from `sdm_io.h`: a Server-driven
/// operation opens with `operation_begin` (which validates the target path
/// against the model and, for a read-shaped operation, precomputes the
/// iteration order `read_entry` will walk), proceeds through any number of
/// `read_entry`/`write_entry` calls, and closes with `operation_end`, which
/// validates and commits or rolls back atomically.
#[derive(Debug, Default)]
pub struct DataModel {
  objects: BTreeMap<u16, Object>,
  transaction: Option<Vec<Mutation>>,

  op: Option<Operation>,
  op_path: Option<UriPath>,
  is_bootstrap: bool,

  read_queue: Option<VecDeque<UriPath>>,
  reset_done: BTreeSet<(u16, u16)>,
  replaced_resources: BTreeSet<(u16, u16, u16)>,

  executed: Vec<UriPath>,

  // Block-wise transfer cursors (RFC7959): `in` reassembles a Block1 upload
  // keyed by the request token; `out` holds the full payload and format of a
  // response that spilled past one block, so a follow-up GET for the next
  // block number can be served without re-running the read pipeline.
  block1_in: BTreeMap<Token, Vec<u8>>,
  block2_out: BTreeMap<Token, (u16, Vec<u8>)>,
}

impl DataModel {
  /// An empty data model with no registered objects.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an Object, replacing any existing one with the same ID.
  pub fn add_object(&mut self, object: Object) {
    self.objects.insert(object.oid, object);
  }

  /// Borrow a registered object.
  pub fn object(&self, oid: u16) -> Option<&Object> {
    self.objects.get(&oid)
  }

  /// Mutably borrow a registered object.
  pub fn object_mut(&mut self, oid: u16) -> Option<&mut Object> {
    self.objects.get_mut(&oid)
  }

  /// Iterate all registered objects in ascending OID order.
  pub fn objects(&self) -> impl Iterator<Item = &Object> {
    self.objects.values()
  }

  fn resource_triple(&self, path: UriPath) -> Result<(u16, u16, u16), DmError> {
    let oid = path.oid.ok_or(DmError::NoSuchObject(0))?;
    let iid = path.iid.ok_or(DmError::NoSuchInstance(oid, 0))?;
    let rid = path.rid.ok_or(DmError::NoSuchResource(oid, 0))?;
    Ok((oid, iid, rid))
  }

  /// Depth-first, ascending-ID listing of every readable leaf at or under
  /// `path` (Objects by OID, Instances by IID, Resources by RID skipping
  /// non-readable ones, Resource Instances by RIID for multi-instance
  /// resources) — the order [`DataModel::read_entry`] walks.
  fn collect_paths_under(&self, path: UriPath) -> Vec<UriPath> {
    let mut out = Vec::new();
    match (path.oid, path.iid, path.rid, path.riid) {
      | (None, ..) => {
        for oid in self.objects.keys().copied().collect::<Vec<_>>() {
          out.extend(self.collect_paths_under(UriPath::object(oid)));
        }
      },
      | (Some(oid), None, ..) => {
        if let Some(object) = self.objects.get(&oid) {
          for iid in object.instances.keys().copied().collect::<Vec<_>>() {
            out.extend(self.collect_paths_under(UriPath::instance(oid, iid)));
          }
        }
      },
      | (Some(oid), Some(iid), None, _) => {
        if let Some(object) = self.objects.get(&oid) {
          if object.instances.contains_key(&iid) {
            let mut specs: Vec<&ResourceSpec> =
              object.resources.iter().filter(|r| r.access.readable()).collect();
            specs.sort_by_key(|r| r.rid);
            for spec in specs {
              out.extend(self.collect_paths_under(UriPath::resource(oid, iid, spec.rid)));
            }
          }
        }
      },
      | (Some(oid), Some(iid), Some(rid), None) => {
        if let Some(instance) = self.objects.get(&oid).and_then(|o| o.instances.get(&iid)) {
          let multi = self.objects
                          .get(&oid)
                          .and_then(|o| o.resource_spec(rid))
                          .map(|s| s.access.multi_instance())
                          .unwrap_or(false);
          if multi {
            let mut riids: Vec<u16> =
              instance.values.get_all_instances(rid).map(|(riid, _)| riid).collect();
            riids.sort_unstable();
            for riid in riids {
              out.push(UriPath::resource_instance(oid, iid, rid, riid));
            }
          } else {
            out.push(path);
          }
        }
      },
      | (Some(_), Some(_), Some(_), Some(_)) => out.push(path),
      | _ => {},
    }
    out
  }

  /// Begin a Server-driven operation. Validates `path` against the
  /// registered model and the Object's declared handler support, returning
  /// the error the caller should map to NOT_FOUND, METHOD_NOT_ALLOWED or
  /// INTERNAL per [`DmError::to_code`]. For a read-shaped operation, also
  /// precomputes the ascending iteration order `read_entry` will walk.
  pub fn operation_begin(&mut self, op: Operation, is_bootstrap: bool, path: UriPath)
                          -> Result<(), DmError> {
    if self.transaction.is_some() {
      return Err(DmError::TransactionAlreadyOpen);
    }

    use Operation::*;
    match op {
      | DmCreate => {
        let oid = path.oid.ok_or(DmError::NoSuchObject(0))?;
        let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
        if !object.supports_create {
          return Err(DmError::OperationNotAllowed);
        }
      },
      | DmDelete => {
        if let Some(oid) = path.oid {
          let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
          if let Some(iid) = path.iid {
            object.instances.get(&iid).ok_or(DmError::NoSuchInstance(oid, iid))?;
          }
        }
      },
      | DmExecute => {
        let (oid, iid, rid) = self.resource_triple(path)?;
        let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
        object.instances.get(&iid).ok_or(DmError::NoSuchInstance(oid, iid))?;
        let spec = object.resource_spec(rid).ok_or(DmError::NoSuchResource(oid, rid))?;
        if !spec.access.executable() {
          return Err(DmError::OperationNotAllowed);
        }
        if object.execute.is_none() {
          return Err(DmError::NoHandler);
        }
      },
      | DmWriteReplace | DmWritePartialUpdate | DmWriteComposite => {
        if let Some(oid) = path.oid {
          let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
          if let Some(iid) = path.iid {
            object.instances.get(&iid).ok_or(DmError::NoSuchInstance(oid, iid))?;
            if matches!(op, DmWriteReplace) && path.rid.is_none() && !object.supports_reset {
              return Err(DmError::NoHandler);
            }
          }
        }
      },
      | DmRead | Discover | DmReadComposite | InfObserve | InfObserveComposite
      | InfCancelObserve | InfCancelObserveComposite => {
        if let Some(oid) = path.oid {
          self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
        }
      },
      | DmWriteAttributes | BootstrapFinish => {},
    }

    if matches!(op,
                DmRead | Discover | DmReadComposite | InfObserve | InfObserveComposite
                | InfCancelObserve | InfCancelObserveComposite)
    {
      self.read_queue = Some(self.collect_paths_under(path).into());
    }

    self.op = Some(op);
    self.op_path = Some(path);
    self.is_bootstrap = is_bootstrap;
    self.transaction = Some(Vec::new());
    Ok(())
  }

  /// Read a resource value directly, bypassing the transaction log and the
  /// iteration cursor `read_entry` drives — used by the small number of
  /// internal paths that want a single value without opening an operation.
  fn value_at(&self, path: UriPath) -> Result<Value, DmError> {
    let oid = path.oid.ok_or(DmError::NoSuchObject(0))?;
    let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;

    let iid = path.iid.ok_or(DmError::NoSuchInstance(oid, 0))?;
    let instance = object.instances.get(&iid).ok_or(DmError::NoSuchInstance(oid, iid))?;

    let rid = path.rid.ok_or(DmError::NoSuchResource(oid, 0))?;
    let spec = object.resource_spec(rid).ok_or(DmError::NoSuchResource(oid, rid))?;
    if !spec.access.readable() {
      return Err(DmError::OperationNotAllowed);
    }

    let value = match path.riid {
      | Some(riid) => instance.values.get_instance(rid, riid),
      | None => instance.values.get(rid),
    };

    value.cloned().ok_or(DmError::NoSuchResource(oid, rid))
  }

  /// Yield the next entry in the iteration order `operation_begin`
  /// precomputed, or `Ok(None)` once exhausted. Each call advances the
  /// cursor by one entry.
  pub fn read_entry(&mut self) -> Result<Option<(UriPath, Value)>, DmError> {
    let queue = self.read_queue.as_mut().ok_or(DmError::NoActiveTransaction)?;
    let Some(path) = queue.pop_front() else {
      return Ok(None);
    };
    let value = self.value_at(path)?;
    Ok(Some((path, value)))
  }

  /// Stage a write within the current transaction. `offset` greater than
  /// zero appends to the resource's current `String`/`Opaque` value instead
  /// of overwriting it (chunked delivery); non-zero offsets on other kinds
  /// are ignored (treated as a full overwrite). Bootstrap gating: outside
  /// the bootstrap window, only `Access::writable` resources accept writes;
  /// during it, every kind but `Execute` does (invariant 4).
  pub fn write_entry(&mut self, path: UriPath, value: Value, offset: usize) -> Result<(), DmError> {
    let (oid, iid, rid) = self.resource_triple(path)?;

    let object = self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
    let spec = object.resource_spec(rid).ok_or(DmError::NoSuchResource(oid, rid))?;

    let writable = if self.is_bootstrap {
      spec.access.bootstrap_writable()
    } else {
      spec.access.writable()
    };
    if !writable {
      return Err(DmError::OperationNotAllowed);
    }
    if spec.kind != value.kind() {
      return Err(DmError::TypeMismatch);
    }

    let is_replace = matches!(self.op, Some(Operation::DmWriteReplace));
    let replaces_whole_instance =
      is_replace && self.op_path.map(|p| p.rid.is_none()).unwrap_or(false);
    let replaces_whole_resource =
      is_replace && self.op_path.map(|p| p.rid.is_some() && p.riid.is_none()).unwrap_or(false);

    let mut preamble = Vec::new();

    if replaces_whole_instance && self.reset_done.insert((oid, iid)) {
      preamble.push(Mutation::ResetInstance { oid, iid });
    }

    if replaces_whole_resource && spec.access.multi_instance()
       && self.replaced_resources.insert((oid, iid, rid))
    {
      for (riid, _) in object.instances.get(&iid).into_iter().flat_map(|i| i.values.get_all_instances(rid)) {
        preamble.push(Mutation::DeleteResourceInstance { oid, iid, rid, riid });
      }
    }

    let mutations = self.transaction.as_mut().ok_or(DmError::NoActiveTransaction)?;
    mutations.extend(preamble);
    mutations.push(Mutation::Write { oid, iid, rid, riid: path.riid, value, append: offset > 0 });
    Ok(())
  }

  /// Stage creation of a new Object Instance.
  pub fn create_instance(&mut self, oid: u16, iid: u16) -> Result<(), DmError> {
    self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
    let mutations = self.transaction.as_mut().ok_or(DmError::NoActiveTransaction)?;
    mutations.push(Mutation::CreateInstance { oid, iid });
    Ok(())
  }

  /// Stage deletion of an Object Instance.
  pub fn delete_instance(&mut self, oid: u16, iid: u16) -> Result<(), DmError> {
    self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
    let mutations = self.transaction.as_mut().ok_or(DmError::NoActiveTransaction)?;
    mutations.push(Mutation::DeleteInstance { oid, iid });
    Ok(())
  }

  /// Stage deletion of one Resource Instance (partial delete on a
  /// multi-instance resource).
  pub fn delete_resource_instance(&mut self, oid: u16, iid: u16, rid: u16, riid: u16)
                                  -> Result<(), DmError> {
    self.objects.get(&oid).ok_or(DmError::NoSuchObject(oid))?;
    let mutations = self.transaction.as_mut().ok_or(DmError::NoActiveTransaction)?;
    mutations.push(Mutation::DeleteResourceInstance { oid, iid, rid, riid });
    Ok(())
  }

  /// Execute a resource directly (outside the read/write transaction log):
  /// validates the resource is `Access::Execute` and the Object has a
  /// registered handler, invokes it, and records `path` as having executed
  /// (drainable via [`DataModel::drain_executed`]).
  pub fn execute(&mut self, path: UriPath, args: &[u8]) -> Result<(), DmError> {
    let (oid, iid, rid) = self.resource_triple(path)?;

    let object = self.objects.get_mut(&oid).ok_or(DmError::NoSuchObject(oid))?;
    object.instances.get(&iid).ok_or(DmError::NoSuchInstance(oid, iid))?;
    let spec = object.resource_spec(rid).ok_or(DmError::NoSuchResource(oid, rid))?.clone();
    if !spec.access.executable() {
      return Err(DmError::OperationNotAllowed);
    }

    let handler = object.execute.as_mut().ok_or(DmError::NoHandler)?;
    handler(iid, rid, args)?;
    self.executed.push(path);
    Ok(())
  }

  /// Drain the set of paths successfully executed since the last drain.
  pub fn drain_executed(&mut self) -> Vec<UriPath> {
    std::mem::take(&mut self.executed)
  }

  /// Validate the pending mutation set without committing it. The default
  /// validation checks every staged write targets a live (or about-to-be-
  /// created) instance; callers needing resource-specific cross-field
  /// validation should check before calling commit.
  pub fn operation_validate(&self) -> Result<(), DmError> {
    let mutations = self.transaction.as_ref().ok_or(DmError::NoActiveTransaction)?;

    let mut created: Vec<(u16, u16)> = vec![];
    for m in mutations {
      if let Mutation::CreateInstance { oid, iid } = m {
        created.push((*oid, *iid));
      }
    }

    for m in mutations {
      if let Mutation::Write { oid, iid, .. } = m {
        let exists = self.objects
                         .get(oid)
                         .map(|o| o.instances.contains_key(iid))
                         .unwrap_or(false);
        if !exists && !created.contains(&(*oid, *iid)) {
          return Err(DmError::ValidationFailed);
        }
      }
    }

    Ok(())
  }

  /// Commit all staged mutations, applying them in the order they were
  /// recorded.
  pub fn operation_commit(&mut self) -> Result<(), DmError> {
    self.operation_validate()?;
    let mutations = self.transaction.take().ok_or(DmError::NoActiveTransaction)?;

    for m in mutations {
      match m {
        | Mutation::CreateInstance { oid, iid } => {
          if let Some(object) = self.objects.get_mut(&oid) {
            object.instances.entry(iid).or_insert_with(|| Instance { iid, ..Default::default() });
          }
        },
        | Mutation::ResetInstance { oid, iid } => {
          if let Some(instance) = self.objects.get_mut(&oid).and_then(|o| o.instances.get_mut(&iid))
          {
            instance.values = InstanceValues::default();
          }
        },
        | Mutation::DeleteInstance { oid, iid } => {
          if let Some(object) = self.objects.get_mut(&oid) {
            object.instances.remove(&iid);
          }
        },
        | Mutation::DeleteResourceInstance { oid, iid, rid, riid } => {
          if let Some(instance) =
            self.objects.get_mut(&oid).and_then(|o| o.instances.get_mut(&iid))
          {
            instance.values.remove_instance(rid, riid);
          }
        },
        | Mutation::Write { oid, iid, rid, riid, value, append } => {
          if let Some(instance) =
            self.objects.get_mut(&oid).and_then(|o| o.instances.get_mut(&iid))
          {
            let value = if append {
              let existing = match riid {
                | Some(riid) => instance.values.get_instance(rid, riid).cloned(),
                | None => instance.values.get(rid).cloned(),
              };
              match (existing, value) {
                | (Some(Value::String(mut s)), Value::String(add)) => {
                  s.push_str(&add);
                  Value::String(s)
                },
                | (Some(Value::Opaque(mut b)), Value::Opaque(add)) => {
                  b.extend(add);
                  Value::Opaque(b)
                },
                | (_, v) => v,
              }
            } else {
              value
            };

            match riid {
              | Some(riid) => instance.values.set_instance(rid, riid, value),
              | None => instance.values.set(rid, value),
            }
          }
        },
      }
    }

    Ok(())
  }

  /// Discard all staged mutations without applying them.
  pub fn operation_rollback(&mut self) -> Result<(), DmError> {
    self.transaction.take().ok_or(DmError::NoActiveTransaction)?;
    Ok(())
  }

  /// Close the operation opened by `operation_begin`: validates and commits
  /// the staged mutations, rolling back instead if validation failed, then
  /// clears all per-operation bookkeeping (iteration cursor, bootstrap flag,
  /// instance-reset/resource-replace tracking) regardless of outcome.
  pub fn operation_end(&mut self) -> Result<(), DmError> {
    let result = self.operation_commit();
    if result.is_err() {
      let _ = self.operation_rollback();
    }

    self.op = None;
    self.op_path = None;
    self.is_bootstrap = false;
    self.read_queue = None;
    self.reset_done.clear();
    self.replaced_resources.clear();

    result
  }

  pub(crate) fn block1_append(&mut self, token: Token, chunk: &[u8]) {
    self.block1_in.entry(token).or_default().extend_from_slice(chunk);
  }

  pub(crate) fn block1_take(&mut self, token: Token) -> Vec<u8> {
    self.block1_in.remove(&token).unwrap_or_default()
  }

  pub(crate) fn block2_take(&mut self, token: Token) -> Option<(u16, Vec<u8>)> {
    self.block2_out.remove(&token)
  }

  pub(crate) fn block2_store(&mut self, token: Token, format: u16, payload: Vec<u8>) {
    self.block2_out.insert(token, (format, payload));
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn test_object() -> Object {
    let mut object = Object::new(3,
                                  vec![ResourceSpec { rid: 0,
                                                      kind: Kind::String,
                                                      access: Access::ReadWrite },
                                       ResourceSpec { rid: 1,
                                                      kind: Kind::Int,
                                                      access: Access::Read }],
                                  false).with_create()
                                        .with_reset();
    object.instances.insert(0,
                            Instance { iid: 0,
                                       values: {
                                         let mut v = InstanceValues::default();
                                         v.set(0, Value::String("hi".into()));
                                         v.set(1, Value::Int(42));
                                         v
                                       } });
    object
  }

  fn bs_object() -> Object {
    Object::new(0,
                vec![ResourceSpec { rid: 0, kind: Kind::String, access: Access::BootstrapReadWrite },
                     ResourceSpec { rid: 1, kind: Kind::Int, access: Access::Read }],
                true)
  }

  #[test]
  fn reads_existing_resource() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmRead, false, UriPath::resource(3, 0, 1)).unwrap();
    let (path, v) = dm.read_entry().unwrap().unwrap();
    assert_eq!(path, UriPath::resource(3, 0, 1));
    assert_eq!(v, Value::Int(42));
    assert_eq!(dm.read_entry().unwrap(), None);
  }

  #[test]
  fn read_entry_on_instance_iterates_ascending_rid() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmRead, false, UriPath::instance(3, 0)).unwrap();
    let first = dm.read_entry().unwrap().unwrap();
    let second = dm.read_entry().unwrap().unwrap();
    assert_eq!(first.0, UriPath::resource(3, 0, 0));
    assert_eq!(second.0, UriPath::resource(3, 0, 1));
    assert_eq!(dm.read_entry().unwrap(), None);
  }

  #[test]
  fn read_only_resource_rejects_write() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(3, 0, 1)).unwrap();
    let err = dm.write_entry(UriPath::resource(3, 0, 1), Value::Int(1), 0).unwrap_err();
    assert_eq!(err, DmError::OperationNotAllowed);
  }

  #[test]
  fn write_requires_open_transaction() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());
    let err =
      dm.write_entry(UriPath::resource(3, 0, 0), Value::String("x".into()), 0).unwrap_err();
    assert_eq!(err, DmError::NoActiveTransaction);
  }

  #[test]
  fn commit_applies_staged_write() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(3, 0, 0)).unwrap();
    dm.write_entry(UriPath::resource(3, 0, 0), Value::String("bye".into()), 0).unwrap();
    dm.operation_commit().unwrap();

    dm.operation_begin(Operation::DmRead, false, UriPath::resource(3, 0, 0)).unwrap();
    assert_eq!(dm.read_entry().unwrap().unwrap().1, Value::String("bye".into()));
  }

  #[test]
  fn rollback_discards_staged_write() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(3, 0, 0)).unwrap();
    dm.write_entry(UriPath::resource(3, 0, 0), Value::String("bye".into()), 0).unwrap();
    dm.operation_rollback().unwrap();

    dm.operation_begin(Operation::DmRead, false, UriPath::resource(3, 0, 0)).unwrap();
    assert_eq!(dm.read_entry().unwrap().unwrap().1, Value::String("hi".into()));
  }

  #[test]
  fn validate_rejects_write_to_nonexistent_instance() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmWriteComposite, false, UriPath::object(3)).unwrap();
    dm.write_entry(UriPath::resource(3, 1, 0), Value::String("x".into()), 0).unwrap();
    assert_eq!(dm.operation_validate().unwrap_err(), DmError::ValidationFailed);
  }

  #[test]
  fn create_then_write_in_same_transaction_validates() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmCreate, false, UriPath::object(3)).unwrap();
    dm.create_instance(3, 1).unwrap();
    dm.write_entry(UriPath::resource(3, 1, 0), Value::String("x".into()), 0).unwrap();
    dm.operation_commit().unwrap();

    dm.operation_begin(Operation::DmRead, false, UriPath::resource(3, 1, 0)).unwrap();
    assert_eq!(dm.read_entry().unwrap().unwrap().1, Value::String("x".into()));
  }

  #[test]
  fn type_mismatch_is_rejected() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(3, 0, 0)).unwrap();
    let err = dm.write_entry(UriPath::resource(3, 0, 0), Value::Int(1), 0).unwrap_err();
    assert_eq!(err, DmError::TypeMismatch);
  }

  #[test]
  fn create_on_object_without_create_support_is_rejected() {
    let mut dm = DataModel::new();
    dm.add_object(Object::new(9, vec![], false));

    let err = dm.operation_begin(Operation::DmCreate, false, UriPath::object(9)).unwrap_err();
    assert_eq!(err, DmError::OperationNotAllowed);
  }

  #[test]
  fn write_replace_on_instance_without_reset_support_is_internal() {
    let mut dm = DataModel::new();
    let mut object = Object::new(9,
                                  vec![ResourceSpec { rid: 0,
                                                      kind: Kind::Int,
                                                      access: Access::ReadWrite }],
                                  false);
    object.instances.insert(0, Instance::default());
    dm.add_object(object);

    let err =
      dm.operation_begin(Operation::DmWriteReplace, false, UriPath::instance(9, 0)).unwrap_err();
    assert_eq!(err, DmError::NoHandler);
  }

  #[test]
  fn bootstrap_write_allows_read_only_resource_and_gates_bs_rw() {
    let mut dm = DataModel::new();
    dm.add_object(bs_object());

    let mut object = Object::new(0, vec![], true);
    object.instances.insert(0, Instance::default());
    dm.objects.get_mut(&0).unwrap().instances.insert(0, Instance::default());
    let _ = object;

    dm.operation_begin(Operation::DmWriteReplace, true, UriPath::resource(0, 0, 1)).unwrap();
    dm.write_entry(UriPath::resource(0, 0, 1), Value::Int(7), 0)
      .expect("R resource is writable during bootstrap");
    dm.operation_commit().unwrap();

    dm.operation_begin(Operation::DmWriteReplace, true, UriPath::resource(0, 0, 0)).unwrap();
    dm.write_entry(UriPath::resource(0, 0, 0), Value::String("coap://x".into()), 0)
      .expect("BS_RW resource is writable during bootstrap");
  }

  #[test]
  fn bs_rw_resource_rejects_write_outside_bootstrap() {
    let mut dm = DataModel::new();
    let mut object = bs_object();
    object.instances.insert(0, Instance::default());
    dm.add_object(object);

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(0, 0, 0)).unwrap();
    let err =
      dm.write_entry(UriPath::resource(0, 0, 0), Value::String("coap://x".into()), 0).unwrap_err();
    assert_eq!(err, DmError::OperationNotAllowed);
  }

  #[test]
  fn write_replace_on_multi_instance_resource_recreates_riids_exactly() {
    let mut dm = DataModel::new();
    let mut object = Object::new(1,
                                  vec![ResourceSpec { rid: 4,
                                                      kind: Kind::Int,
                                                      access: Access::ReadWriteMulti }],
                                  true);
    let mut values = InstanceValues::default();
    values.set_instance(4, 1, Value::Int(100));
    values.set_instance(4, 3, Value::Int(300));
    object.instances.insert(1, Instance { iid: 1, values });
    dm.add_object(object);

    dm.operation_begin(Operation::DmWriteReplace, false, UriPath::resource(1, 1, 4)).unwrap();
    for (riid, v) in [(0, 10), (2, 20), (8, 80)] {
      dm.write_entry(UriPath::resource_instance(1, 1, 4, riid), Value::Int(v), 0).unwrap();
    }
    dm.operation_end().unwrap();

    dm.operation_begin(Operation::DmRead, false, UriPath::resource(1, 1, 4)).unwrap();
    let mut seen = vec![];
    while let Some((path, _)) = dm.read_entry().unwrap() {
      seen.push(path.riid.unwrap());
    }
    assert_eq!(seen, vec![0, 2, 8]);
  }

  #[test]
  fn execute_requires_registered_handler() {
    let mut dm = DataModel::new();
    let mut object = Object::new(3,
                                  vec![ResourceSpec { rid: 4,
                                                      kind: Kind::Int,
                                                      access: Access::Execute }],
                                  false);
    object.instances.insert(0, Instance::default());
    dm.add_object(object);

    let err = dm.operation_begin(Operation::DmExecute, false, UriPath::resource(3, 0, 4))
                .unwrap_err();
    assert_eq!(err, DmError::NoHandler);
  }

  #[test]
  fn execute_invokes_handler_and_records_path() {
    let mut dm = DataModel::new();
    let mut object = Object::new(3,
                                  vec![ResourceSpec { rid: 4,
                                                      kind: Kind::Int,
                                                      access: Access::Execute }],
                                  false).with_execute(|_iid, _rid, _args| Ok(()));
    object.instances.insert(0, Instance::default());
    dm.add_object(object);

    let path = UriPath::resource(3, 0, 4);
    dm.operation_begin(Operation::DmExecute, false, path).unwrap();
    dm.execute(path, b"").unwrap();
    dm.operation_end().unwrap();

    assert_eq!(dm.drain_executed(), vec![path]);
  }

  #[test]
  fn execute_on_non_executable_resource_is_rejected() {
    let mut dm = DataModel::new();
    dm.add_object(test_object());

    let err = dm.operation_begin(Operation::DmExecute, false, UriPath::resource(3, 0, 0))
                .unwrap_err();
    assert_eq!(err, DmError::OperationNotAllowed);
  }
}
