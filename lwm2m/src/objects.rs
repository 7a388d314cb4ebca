//! Standard LwM2M Objects: Security (OID 0), Server (OID 1) and Device
//! (OID 3), including their power-source, error-code, binding-selection
//! and reboot/factory-reset resources.
//!
//! Grounded in `sdm_io.h`'s `sdm_res_spec_t`/`sdm_res_handlers_t` surface and
//! the object usage in `anjay_lite_servers.c`: each resource table below is a
//! direct transcription of what those two sources describe as the minimum
//! Security/Server/Device object surface a registering client needs.

use crate::error::DmError;
use crate::sdm::{Access, Kind, Object, ResourceSpec};

/// LwM2M Security Object ID.
pub const SECURITY_OID: u16 = 0;
/// LwM2M Server Object ID.
pub const SERVER_OID: u16 = 1;
/// LwM2M Device Object ID.
pub const DEVICE_OID: u16 = 3;

/// Security Object resources (a subset: the ones the client itself reads at
/// startup to open a connection; the PSK/certificate material resources
/// are write-only and bootstrap-only, matching `SDM_RES_BS_RW`).
pub mod security_rid {
  /// LwM2M Server URI.
  pub const SERVER_URI: u16 = 0;
  /// Bootstrap-Server flag.
  pub const BOOTSTRAP_SERVER: u16 = 1;
  /// Security Mode (0=PSK, 2=NoSec, …).
  pub const SECURITY_MODE: u16 = 2;
  /// Public Key or Identity.
  pub const PUBLIC_KEY_OR_IDENTITY: u16 = 3;
  /// Server Public Key.
  pub const SERVER_PUBLIC_KEY: u16 = 4;
  /// Secret Key.
  pub const SECRET_KEY: u16 = 5;
  /// Short Server ID, linking to the matching Server Object instance.
  pub const SHORT_SERVER_ID: u16 = 10;
}

/// Build the Security Object's static resource table.
pub fn security_object() -> Object {
  Object::new(SECURITY_OID,
              vec![ResourceSpec { rid: security_rid::SERVER_URI,
                                  kind: Kind::String,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::BOOTSTRAP_SERVER,
                                  kind: Kind::Bool,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::SECURITY_MODE,
                                  kind: Kind::Int,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::PUBLIC_KEY_OR_IDENTITY,
                                  kind: Kind::Opaque,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::SERVER_PUBLIC_KEY,
                                  kind: Kind::Opaque,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::SECRET_KEY,
                                  kind: Kind::Opaque,
                                  access: Access::BootstrapReadWrite },
                   ResourceSpec { rid: security_rid::SHORT_SERVER_ID,
                                  kind: Kind::Int,
                                  access: Access::BootstrapReadWrite }],
              true).with_create()
                   .with_reset()
}

/// Server Object resources.
pub mod server_rid {
  /// Short Server ID.
  pub const SHORT_SERVER_ID: u16 = 0;
  /// Registration Lifetime, seconds.
  pub const LIFETIME: u16 = 1;
  /// Default Minimum Period for notifications.
  pub const DEFAULT_MIN_PERIOD: u16 = 2;
  /// Default Maximum Period for notifications.
  pub const DEFAULT_MAX_PERIOD: u16 = 3;
  /// Disable: execute to deregister and go offline temporarily.
  pub const DISABLE: u16 = 4;
  /// Disable Timeout, seconds.
  pub const DISABLE_TIMEOUT: u16 = 5;
  /// Notification Storing When Disabled or Offline.
  pub const NOTIFICATION_STORING: u16 = 6;
  /// Binding (e.g. `"U"`, `"UQ"`).
  pub const BINDING: u16 = 7;
  /// Registration Update Trigger.
  pub const REGISTRATION_UPDATE_TRIGGER: u16 = 8;
}

/// Build the Server Object's static resource table.
pub fn server_object() -> Object {
  Object::new(SERVER_OID,
              vec![ResourceSpec { rid: server_rid::SHORT_SERVER_ID,
                                  kind: Kind::Int,
                                  access: Access::Read },
                   ResourceSpec { rid: server_rid::LIFETIME,
                                  kind: Kind::Int,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::DEFAULT_MIN_PERIOD,
                                  kind: Kind::Int,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::DEFAULT_MAX_PERIOD,
                                  kind: Kind::Int,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::DISABLE,
                                  kind: Kind::Int,
                                  access: Access::Execute },
                   ResourceSpec { rid: server_rid::DISABLE_TIMEOUT,
                                  kind: Kind::Int,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::NOTIFICATION_STORING,
                                  kind: Kind::Bool,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::BINDING,
                                  kind: Kind::String,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: server_rid::REGISTRATION_UPDATE_TRIGGER,
                                  kind: Kind::Int,
                                  access: Access::Execute }],
              true).with_create()
                   .with_reset()
                   .with_execute(|_iid, rid, _args| match rid {
                     | server_rid::DISABLE | server_rid::REGISTRATION_UPDATE_TRIGGER => Ok(()),
                     | _ => Err(DmError::OperationNotAllowed),
                   })
}

/// Device Object resources, including the power-source and error-code
/// tables and the reboot/factory-reset executables.
pub mod device_rid {
  /// Manufacturer.
  pub const MANUFACTURER: u16 = 0;
  /// Model Number.
  pub const MODEL_NUMBER: u16 = 1;
  /// Serial Number.
  pub const SERIAL_NUMBER: u16 = 2;
  /// Firmware Version.
  pub const FIRMWARE_VERSION: u16 = 3;
  /// Reboot: execute to restart the device.
  pub const REBOOT: u16 = 4;
  /// Factory Reset: execute to restore factory defaults.
  pub const FACTORY_RESET: u16 = 5;
  /// Available Power Sources (multi-instance).
  pub const AVAILABLE_POWER_SOURCES: u16 = 6;
  /// Power Source Voltage (multi-instance, mirrors Available Power Sources).
  pub const POWER_SOURCE_VOLTAGE: u16 = 7;
  /// Power Source Current (multi-instance, mirrors Available Power Sources).
  pub const POWER_SOURCE_CURRENT: u16 = 8;
  /// Battery Level, percent.
  pub const BATTERY_LEVEL: u16 = 9;
  /// Error Code (multi-instance; 0 = no error).
  pub const ERROR_CODE: u16 = 11;
  /// Reset Error Code: execute to clear the Error Code resource instances.
  pub const RESET_ERROR_CODE: u16 = 12;
  /// Current Time, Unix epoch seconds.
  pub const CURRENT_TIME: u16 = 13;
  /// Supported Binding and Modes.
  pub const SUPPORTED_BINDING_AND_MODES: u16 = 16;
}

/// Build the Device Object's static resource table.
pub fn device_object() -> Object {
  Object::new(DEVICE_OID,
              vec![ResourceSpec { rid: device_rid::MANUFACTURER,
                                  kind: Kind::String,
                                  access: Access::Read },
                   ResourceSpec { rid: device_rid::MODEL_NUMBER,
                                  kind: Kind::String,
                                  access: Access::Read },
                   ResourceSpec { rid: device_rid::SERIAL_NUMBER,
                                  kind: Kind::String,
                                  access: Access::Read },
                   ResourceSpec { rid: device_rid::FIRMWARE_VERSION,
                                  kind: Kind::String,
                                  access: Access::Read },
                   ResourceSpec { rid: device_rid::REBOOT, kind: Kind::Int, access: Access::Execute },
                   ResourceSpec { rid: device_rid::FACTORY_RESET,
                                  kind: Kind::Int,
                                  access: Access::Execute },
                   ResourceSpec { rid: device_rid::AVAILABLE_POWER_SOURCES,
                                  kind: Kind::Int,
                                  access: Access::ReadMulti },
                   ResourceSpec { rid: device_rid::POWER_SOURCE_VOLTAGE,
                                  kind: Kind::Int,
                                  access: Access::ReadMulti },
                   ResourceSpec { rid: device_rid::POWER_SOURCE_CURRENT,
                                  kind: Kind::Int,
                                  access: Access::ReadMulti },
                   ResourceSpec { rid: device_rid::BATTERY_LEVEL,
                                  kind: Kind::Int,
                                  access: Access::Read },
                   ResourceSpec { rid: device_rid::ERROR_CODE,
                                  kind: Kind::Int,
                                  access: Access::ReadMulti },
                   ResourceSpec { rid: device_rid::RESET_ERROR_CODE,
                                  kind: Kind::Int,
                                  access: Access::Execute },
                   ResourceSpec { rid: device_rid::CURRENT_TIME,
                                  kind: Kind::Time,
                                  access: Access::ReadWrite },
                   ResourceSpec { rid: device_rid::SUPPORTED_BINDING_AND_MODES,
                                  kind: Kind::String,
                                  access: Access::Read }],
              false).with_execute(|_iid, rid, _args| match rid {
                       | device_rid::REBOOT | device_rid::FACTORY_RESET
                       | device_rid::RESET_ERROR_CODE => Ok(()),
                       | _ => Err(DmError::OperationNotAllowed),
                     })
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn security_object_resources_are_bootstrap_read_write() {
    let object = security_object();
    for rid in [security_rid::SERVER_URI, security_rid::SECURITY_MODE] {
      assert_eq!(object.resource_spec(rid).unwrap().access, Access::BootstrapReadWrite);
    }
  }

  #[test]
  fn server_object_lifetime_is_read_write() {
    let object = server_object();
    assert_eq!(object.resource_spec(server_rid::LIFETIME).unwrap().access, Access::ReadWrite);
  }

  #[test]
  fn device_object_reboot_is_executable() {
    let object = device_object();
    let spec = object.resource_spec(device_rid::REBOOT).unwrap();
    assert!(spec.access.executable());
  }

  #[test]
  fn device_object_power_sources_are_multi_instance() {
    let object = device_object();
    let spec = object.resource_spec(device_rid::AVAILABLE_POWER_SOURCES).unwrap();
    assert!(spec.access.multi_instance());
  }

  #[test]
  fn device_object_reboot_has_execute_handler() {
    use lwm2m_msg::UriPath;

    use crate::sdm::DataModel;

    let mut dm = DataModel::new();
    let mut object = device_object();
    object.instances.insert(0, crate::sdm::Instance::default());
    dm.add_object(object);

    let path = UriPath::resource(DEVICE_OID, 0, device_rid::REBOOT);
    dm.operation_begin(lwm2m_msg::Operation::DmExecute, false, path).unwrap();
    dm.execute(path, b"").unwrap();
    dm.operation_end().unwrap();
  }

  #[test]
  fn server_object_execute_rejects_unsupported_resource() {
    use lwm2m_msg::UriPath;

    use crate::sdm::DataModel;

    let mut dm = DataModel::new();
    let mut object = server_object();
    object.instances.insert(0, crate::sdm::Instance::default());
    dm.add_object(object);

    let path = UriPath::resource(SERVER_OID, 0, server_rid::LIFETIME);
    let err = dm.operation_begin(lwm2m_msg::Operation::DmExecute, false, path).unwrap_err();
    assert_eq!(err, DmError::OperationNotAllowed);
  }
}
