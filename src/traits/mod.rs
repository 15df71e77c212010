//! # Driver Traits
//!
//! The capability interface every storage backend implements.
//!
//! ## Layers
//!
//! ```text
//! Components:  DriverRead + DriverWrite + DriverDir = Driver
//!                                                    ↓
//! Entry point: Backend::mount(config) → Box<dyn Driver>
//! ```
//!
//! | Trait | Methods | Role |
//! |-------|---------|------|
//! | [`DriverRead`] | `stat`, `read_at`, `clamp_position` | Reading and seek policy |
//! | [`DriverWrite`] | `create`, `write_at`, `set_len`, `flush`, `sync`, `remove`, `rename` | Mutation |
//! | [`DriverDir`] | `list`, `create_dir` | Directories |
//! | [`Backend`] | `magic`, `mount`, `unmount` | Registered function table |
//!
//! Drivers work on normalized paths and absolute offsets only. Contexts,
//! handles, cursors and end-of-stream flags belong to the dispatcher, which
//! implements the DMFSI call surface once for every backend.
//!
//! ## Blanket Implementation
//!
//! Implement the three component traits and you get [`Driver`] for free:
//!
//! ```rust
//! use dmfsi::{DirEntry, Driver, DriverDir, DriverRead, DriverWrite, FsError, Stat};
//! use std::path::Path;
//!
//! struct Empty;
//!
//! # impl DriverRead for Empty {
//! #     fn stat(&self, p: &Path) -> Result<Stat, FsError> {
//! #         if p == Path::new("/") { Ok(Stat::directory()) } else { Err(FsError::NotFound { path: p.into() }) }
//! #     }
//! #     fn read_at(&self, p: &Path, _: u64, _: &mut [u8]) -> Result<usize, FsError> { Err(FsError::NotFound { path: p.into() }) }
//! # }
//! # impl DriverWrite for Empty {
//! #     fn create(&self, _: &Path) -> Result<(), FsError> { Err(FsError::NotSupported { operation: "create" }) }
//! #     fn write_at(&self, p: &Path, _: u64, _: &[u8]) -> Result<usize, FsError> { Err(FsError::NotFound { path: p.into() }) }
//! #     fn set_len(&self, p: &Path, _: u64) -> Result<(), FsError> { Err(FsError::NotFound { path: p.into() }) }
//! #     fn remove(&self, p: &Path) -> Result<(), FsError> { Err(FsError::NotFound { path: p.into() }) }
//! #     fn rename(&self, p: &Path, _: &Path) -> Result<(), FsError> { Err(FsError::NotFound { path: p.into() }) }
//! # }
//! # impl DriverDir for Empty {
//! #     fn list(&self, _: &Path) -> Result<Vec<DirEntry>, FsError> { Ok(Vec::new()) }
//! #     fn create_dir(&self, _: &Path) -> Result<(), FsError> { Err(FsError::NotSupported { operation: "mkdir" }) }
//! # }
//! fn use_driver(_driver: &dyn Driver) {}
//! use_driver(&Empty);
//! ```

mod backend;
mod driver_dir;
mod driver_read;
mod driver_write;

pub use backend::Backend;
pub use driver_dir::DriverDir;
pub use driver_read::DriverRead;
pub use driver_write::DriverWrite;

/// Complete storage driver: read, write and directory operations.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type that implements all three component
/// traits. Never implement `Driver` directly.
pub trait Driver: DriverRead + DriverWrite + DriverDir {}

// Blanket implementation - any type implementing all three gets Driver for free
impl<T: DriverRead + DriverWrite + DriverDir> Driver for T {}
