//! dmdfs: the driver-backed filesystem.
//!
//! Mounts either an in-memory tree ([`MemoryDriver`]) or a directory of the
//! host filesystem ([`HostDriver`]). Context configuration:
//!
//! | Key | Values | Default |
//! |-----|--------|---------|
//! | `driver` | `memory`, `host` | `host` if `root` is set, else `memory` |
//! | `root` | host directory | required for `host` |
//! | `capacity` | byte quota for `memory` | unlimited |
//! | `readonly` | boolean | `false` |
//!
//! Seeking past the end of a file is allowed; a later write zero-fills the
//! gap, up to [`MAX_GAP`] bytes on the memory driver.

mod host;
mod memory;
mod readonly;

pub use host::HostDriver;
pub use memory::{MAX_GAP, MemoryDriver};
pub use readonly::{ReadOnly, ReadOnlyLayer};

use std::sync::Arc;

use tracing::debug;

use crate::{
    Backend, Config, DMFSI_VERSION, Driver, FsError, LayerExt, Magic, ModuleDescriptor, Version,
};

/// Registration name.
pub const NAME: &str = "dmdfs";

/// Module release version.
pub const MODULE_VERSION: Version = Version::new(0, 1);

/// Module descriptor for [`Module::new`](crate::Module::new).
pub fn descriptor() -> ModuleDescriptor {
    ModuleDescriptor {
        name: NAME,
        module_version: MODULE_VERSION,
        interface_version: DMFSI_VERSION,
        backend: Arc::new(Dmdfs),
    }
}

/// The dmdfs backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dmdfs;

impl Dmdfs {
    fn wrap<D: Driver + 'static>(driver: D, readonly: bool) -> Box<dyn Driver> {
        if readonly {
            Box::new(driver.layer(ReadOnlyLayer))
        } else {
            Box::new(driver)
        }
    }
}

impl Backend for Dmdfs {
    fn magic(&self) -> Magic {
        Magic::DMDFS
    }

    fn mount(&self, config: &mut Config) -> Result<Box<dyn Driver>, FsError> {
        let kind = config.take("driver");
        let root = config.take("root");
        let capacity = config.take_u64("capacity")?;
        let readonly = config.take_bool("readonly")?.unwrap_or(false);

        match (kind.as_deref(), root) {
            (None | Some("memory"), None) => {
                let driver = match capacity {
                    Some(bytes) => MemoryDriver::with_capacity(bytes),
                    None => MemoryDriver::new(),
                };
                debug!(driver = "memory", ?capacity, readonly, "dmdfs mounted");
                Ok(Self::wrap(driver, readonly))
            }
            (None | Some("host"), Some(root)) => {
                if capacity.is_some() {
                    return Err(FsError::config("`capacity` only applies to the memory driver"));
                }
                let driver = HostDriver::new(&root)?;
                debug!(driver = "host", root = %driver.root().display(), readonly, "dmdfs mounted");
                Ok(Self::wrap(driver, readonly))
            }
            (Some("memory"), Some(_)) => Err(FsError::config(
                "`root` only applies to the host driver",
            )),
            (Some("host"), None) => Err(FsError::config("the host driver requires `root`")),
            (Some(other), _) => Err(FsError::config(format!(
                "unknown driver `{other}`, expected `memory` or `host`"
            ))),
        }
    }
}
