//! # dmfsi
//!
//! A pluggable virtual-filesystem driver layer: the **DMFSI** file and
//! directory contract, a versioned registry that binds hosts to whichever
//! backend is loaded, and the module lifecycle that brings backends up and
//! down.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use dmfsi::{Attributes, Module, OpenMode, Registry, Whence};
//! use dmfsi::backends::dmdfs;
//!
//! let registry = Registry::new();
//! let mut module = Module::new(dmdfs::descriptor());
//! module.init(&registry, "").unwrap();
//!
//! let fs = module.interface(&registry).unwrap();
//! let ctx = fs.init("driver=memory").unwrap();
//!
//! let mode = OpenMode::from_flags("w+").unwrap();
//! let f = fs.fopen(&ctx, "/hello.txt", mode, Attributes::NONE).unwrap();
//! fs.fwrite(&ctx, f, b"hello").unwrap();
//! fs.lseek(&ctx, f, 0, Whence::Start).unwrap();
//! let mut buf = [0u8; 5];
//! assert_eq!(fs.fread(&ctx, f, &mut buf).unwrap(), 5);
//! assert_eq!(&buf, b"hello");
//! fs.fclose(&ctx, f).unwrap();
//!
//! fs.deinit(ctx).unwrap();
//! module.deinit(&registry).unwrap();
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Registry`] | Process-scoped table of `(name, version)` registrations |
//! | [`Interface`] | DMFSI call surface of one resolved registration |
//! | [`Context`] | One mounted backend instance |
//! | [`Module`] | Preinit / init / deinit state machine for a backend |
//! | [`Backend`] | What a backend registers: magic plus a driver factory |
//! | [`Driver`] | Storage operations a backend mounts per context |
//! | [`FsError`] | Error type with context; [`Status`] for integer codes |
//!
//! ---
//!
//! ## Layers
//!
//! ```text
//! Module Lifecycle Binder   Module::{preinit, init, deinit}
//!          │ registers
//!          ▼
//! DIF Dispatcher            Registry::{register, resolve} → Interface
//!          │ gate: registration → context → handle
//!          ▼
//! Context Manager           Context (magic, alive) + Handle Table
//!          │ normalized path, absolute offset
//!          ▼
//! Driver                    DriverRead + DriverWrite + DriverDir
//! ```
//!
//! The contract (contexts, handles, cursors, end-of-stream flags and access
//! modes) lives in [`Interface`] and is shared by every backend. A backend
//! only supplies a [`Driver`], so two backends cannot drift apart in how
//! they treat a stale handle or a short read.
//!
//! ---
//!
//! ## Versioning
//!
//! Registrations carry a [`Version`] `(major, minor)` pair. A [`Registry`]
//! serves one interface major ([`DMFSI_VERSION`] by default) and refuses
//! other majors at registration and at resolve time. Among compatible
//! registrations the highest minor wins:
//!
//! ```rust
//! use std::sync::Arc;
//! use dmfsi::{Registry, Version, VersionReq};
//! use dmfsi::backends::dmdfs::Dmdfs;
//!
//! let registry = Registry::new();
//! registry.register("fs", Version::new(1, 0), Arc::new(Dmdfs)).unwrap();
//! registry.register("fs", Version::new(1, 1), Arc::new(Dmdfs)).unwrap();
//!
//! let bound = registry.resolve("fs", VersionReq::Compatible(Version::new(1, 0))).unwrap();
//! assert_eq!(bound.version(), Version::new(1, 1));
//! assert!(registry.resolve("fs", VersionReq::Compatible(Version::new(2, 0))).is_err());
//! ```
//!
//! ---
//!
//! ## Error Handling
//!
//! Every operation returns `Result<T, FsError>`. Hosts that speak integer
//! codes collapse errors with [`FsError::status`]:
//!
//! ```rust
//! use dmfsi::{FsError, Status};
//!
//! let err = FsError::InvalidContext { operation: "fread" };
//! assert_eq!(err.status(), Status::Invalid);
//! assert_eq!(err.status().code(), -2);
//! ```
//!
//! ---
//!
//! ## Diagnostics
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events (`debug` for
//! registration, binding and context lifecycle; `warn` when teardown has to
//! force-close handles or contexts). Install any subscriber to see them.
//! Errors are always returned, never only logged.
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`Registry`], [`Interface`] and [`Context`] are `Send + Sync`. Operations
//! on distinct handles may run concurrently; operations on one handle must
//! be serialized by the caller, and `deinit` must not race other calls on
//! the same context.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Version`], [`Stat`], [`DirEntry`], etc., and JSON backend configs |

// Private modules
mod config;
mod context;
mod dif;
mod error;
mod ext;
mod handles;
mod layer;
mod module;
mod paths;
mod traits;
mod types;

pub mod backends;

// Public re-exports - error types
pub use error::{FsError, Status};

// Public re-exports - core types
pub use types::{
    Attributes, ContextId, DMFSI_VERSION, DirEntry, DirHandle, FileHandle, FileKind, Magic,
    OpenMode, Stat, Target, Version, VersionReq, Whence,
};

// Public re-exports - driver traits
pub use traits::{Backend, Driver, DriverDir, DriverRead, DriverWrite};

// Public re-exports - contract layers
pub use context::{Context, ContextTeardown};
pub use dif::{Interface, Registry};
pub use handles::{DirRecord, FileRecord, HandleTable};
pub use module::{Module, ModuleDescriptor, ModuleState, Teardown};

// Public re-exports - infrastructure
pub use backends::dmdfs::ReadOnlyLayer;
pub use config::Config;
pub use ext::DriverExt;
pub use layer::{Layer, LayerExt};
pub use paths::normalize;
