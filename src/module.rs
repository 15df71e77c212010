//! Module Lifecycle Binder.
//!
//! A [`Module`] brings one backend up and down as a unit:
//!
//! ```text
//! Unloaded ──preinit──▶ PreInitialized ──init──▶ Initialized ──deinit──▶ Unloaded
//!     └───────────────────────init─────────────────────▲
//! ```
//!
//! `init` registers the backend with a [`Registry`]; `deinit` force-closes
//! every context still open against it and removes the registration.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{Backend, Config, FsError, Interface, Registry, Version, VersionReq};

/// Static description of a loadable backend module.
#[derive(Clone)]
pub struct ModuleDescriptor {
    /// Default registration name.
    pub name: &'static str,
    /// Release version of the module itself.
    pub module_version: Version,
    /// DMFSI version the backend implements; used as the registration version.
    pub interface_version: Version,
    /// The backend registered on `init`.
    pub backend: Arc<dyn Backend>,
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("module_version", &self.module_version)
            .field("interface_version", &self.interface_version)
            .field("magic", &self.backend.magic())
            .finish()
    }
}

/// Where a [`Module`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    /// Not registered.
    Unloaded,
    /// `preinit` ran; nothing is registered yet.
    PreInitialized,
    /// Registered and resolvable.
    Initialized,
}

/// Outcome of [`Module::deinit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The module was already unloaded; nothing happened.
    AlreadyUnloaded,
    /// The module was unloaded.
    Unloaded {
        /// Live contexts that had to be force-closed.
        closed_contexts: usize,
    },
}

/// A backend module and its lifecycle state.
///
/// # Example
///
/// ```rust
/// use dmfsi::{Module, ModuleState, Registry, Teardown};
/// use dmfsi::backends::dmdfs;
///
/// let registry = Registry::new();
/// let mut module = Module::new(dmdfs::descriptor());
///
/// module.preinit();
/// module.init(&registry, "").unwrap();
/// assert_eq!(module.state(), ModuleState::Initialized);
///
/// let fs = module.interface(&registry).unwrap();
/// let _ctx = fs.init("").unwrap();
///
/// assert_eq!(
///     module.deinit(&registry).unwrap(),
///     Teardown::Unloaded { closed_contexts: 1 }
/// );
/// assert_eq!(module.deinit(&registry).unwrap(), Teardown::AlreadyUnloaded);
/// ```
#[derive(Debug)]
pub struct Module {
    descriptor: ModuleDescriptor,
    state: ModuleState,
    registered: Option<String>,
}

impl Module {
    /// A module in the `Unloaded` state.
    pub fn new(descriptor: ModuleDescriptor) -> Self {
        Self {
            descriptor,
            state: ModuleState::Unloaded,
            registered: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// The module's descriptor.
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Name the backend is registered under while `Initialized`.
    pub fn registered_name(&self) -> Option<&str> {
        self.registered.as_deref()
    }

    /// Optional first step. Creates no context and registers nothing, so it
    /// is harmless for a module that never gets initialized.
    pub fn preinit(&mut self) {
        if self.state == ModuleState::Unloaded {
            self.state = ModuleState::PreInitialized;
            debug!(module = self.descriptor.name, "preinitialized");
        }
    }

    /// Register the backend with `registry`.
    ///
    /// The module config accepts one optional key, `name`, overriding the
    /// registration name. All-or-nothing: on error nothing is registered
    /// and the state is unchanged.
    ///
    /// # Errors
    ///
    /// - [`FsError::Config`] for malformed config or unknown keys
    /// - [`FsError::DuplicateVersion`] if already initialized, or the
    ///   `(name, version)` pair is taken
    /// - [`FsError::VersionMismatch`] if the registry serves another
    ///   interface major
    pub fn init(&mut self, registry: &Registry, config: &str) -> Result<(), FsError> {
        let version = self.descriptor.interface_version;
        if let Some(name) = &self.registered {
            return Err(FsError::DuplicateVersion {
                name: name.clone(),
                version,
            });
        }

        let mut config = Config::parse(config)?;
        let name = config
            .take("name")
            .unwrap_or_else(|| self.descriptor.name.to_string());
        if name.is_empty() {
            return Err(FsError::config("`name` must not be empty"));
        }
        config.finish()?;

        registry.register(&name, version, Arc::clone(&self.descriptor.backend))?;
        debug!(
            module = self.descriptor.name,
            module_version = %self.descriptor.module_version,
            name = %name,
            %version,
            "module initialized"
        );
        self.registered = Some(name);
        self.state = ModuleState::Initialized;
        Ok(())
    }

    /// Unregister the backend and return to `Unloaded`.
    ///
    /// Contexts still open against the backend are force-closed, with a
    /// warning event, and counted in the result. Calling this on an
    /// unloaded module is a no-op returning [`Teardown::AlreadyUnloaded`].
    pub fn deinit(&mut self, registry: &Registry) -> Result<Teardown, FsError> {
        let previous = std::mem::replace(&mut self.state, ModuleState::Unloaded);
        let Some(name) = self.registered.take() else {
            return Ok(match previous {
                ModuleState::Unloaded => Teardown::AlreadyUnloaded,
                _ => Teardown::Unloaded { closed_contexts: 0 },
            });
        };

        let version = self.descriptor.interface_version;
        let closed_contexts = match registry.unregister(&name, version) {
            Ok(closed) => closed,
            Err(FsError::ImplementationNotFound { .. }) => {
                warn!(module = self.descriptor.name, name = %name, "registration already gone");
                0
            }
            Err(error) => {
                self.registered = Some(name);
                self.state = previous;
                return Err(error);
            }
        };
        debug!(module = self.descriptor.name, closed_contexts, "module unloaded");
        Ok(Teardown::Unloaded { closed_contexts })
    }

    /// Resolve this module's own registration.
    ///
    /// # Errors
    ///
    /// - [`FsError::ImplementationNotFound`] unless `Initialized`
    pub fn interface(&self, registry: &Registry) -> Result<Interface, FsError> {
        let name = self
            .registered
            .as_deref()
            .ok_or_else(|| FsError::ImplementationNotFound {
                name: self.descriptor.name.to_string(),
            })?;
        registry.resolve(name, VersionReq::Exact(self.descriptor.interface_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{dmdevfs, dmdfs};

    #[test]
    fn preinit_is_harmless() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.preinit();
        module.preinit();
        assert_eq!(module.state(), ModuleState::PreInitialized);
        assert!(registry.implementations().is_empty());
        assert_eq!(
            module.deinit(&registry).unwrap(),
            Teardown::Unloaded { closed_contexts: 0 }
        );
        assert_eq!(module.state(), ModuleState::Unloaded);
    }

    #[test]
    fn init_without_preinit() {
        let registry = Registry::new();
        let mut module = Module::new(dmdevfs::descriptor());
        module.init(&registry, "").unwrap();
        assert_eq!(module.state(), ModuleState::Initialized);
        assert_eq!(module.registered_name(), Some(dmdevfs::NAME));
        assert!(module.interface(&registry).is_ok());
    }

    #[test]
    fn bad_config_registers_nothing() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.preinit();
        for config in ["junk", "name=", "name=x;extra=1"] {
            assert!(matches!(
                module.init(&registry, config),
                Err(FsError::Config { .. })
            ));
        }
        assert_eq!(module.state(), ModuleState::PreInitialized);
        assert!(registry.implementations().is_empty());
    }

    #[test]
    fn name_override() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.init(&registry, "name=scratch").unwrap();
        assert_eq!(module.registered_name(), Some("scratch"));
        assert!(module.interface(&registry).is_ok());
        assert!(matches!(
            registry.resolve(dmdfs::NAME, VersionReq::Compatible(crate::DMFSI_VERSION)),
            Err(FsError::ImplementationNotFound { .. })
        ));
    }

    #[test]
    fn double_init_is_rejected() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.init(&registry, "").unwrap();
        assert!(matches!(
            module.init(&registry, ""),
            Err(FsError::DuplicateVersion { .. })
        ));
        assert_eq!(registry.implementations().len(), 1);
    }

    #[test]
    fn registration_conflict_leaves_state() {
        let registry = Registry::new();
        let mut first = Module::new(dmdfs::descriptor());
        let mut second = Module::new(dmdfs::descriptor());
        first.init(&registry, "").unwrap();
        second.preinit();
        assert!(matches!(
            second.init(&registry, ""),
            Err(FsError::DuplicateVersion { .. })
        ));
        assert_eq!(second.state(), ModuleState::PreInitialized);
        assert!(second.interface(&registry).is_err());
    }

    #[test]
    fn deinit_twice_is_a_no_op() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        assert_eq!(module.deinit(&registry).unwrap(), Teardown::AlreadyUnloaded);
        module.init(&registry, "").unwrap();
        assert_eq!(
            module.deinit(&registry).unwrap(),
            Teardown::Unloaded { closed_contexts: 0 }
        );
        assert_eq!(module.deinit(&registry).unwrap(), Teardown::AlreadyUnloaded);
        assert!(registry.implementations().is_empty());
    }

    #[test]
    fn deinit_force_closes_live_contexts() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.init(&registry, "").unwrap();
        let fs = module.interface(&registry).unwrap();
        let a = fs.init("").unwrap();
        let b = fs.init("").unwrap();
        fs.deinit(b).unwrap();

        assert_eq!(
            module.deinit(&registry).unwrap(),
            Teardown::Unloaded { closed_contexts: 1 }
        );
        assert!(!a.is_alive());
        assert!(!fs.context_is_valid(&a));
    }

    #[test]
    fn deinit_tolerates_external_unregister() {
        let registry = Registry::new();
        let mut module = Module::new(dmdfs::descriptor());
        module.init(&registry, "").unwrap();
        registry
            .unregister(dmdfs::NAME, module.descriptor().interface_version)
            .unwrap();
        assert_eq!(
            module.deinit(&registry).unwrap(),
            Teardown::Unloaded { closed_contexts: 0 }
        );
        assert_eq!(module.state(), ModuleState::Unloaded);
    }
}
