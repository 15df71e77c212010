//! # Extension Traits
//!
//! Convenience queries derived from [`DriverRead::stat`](crate::DriverRead::stat).
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](DriverExt::exists) | Path exists |
//! | [`is_file`](DriverExt::is_file) | Path is a regular file |
//! | [`is_dir`](DriverExt::is_dir) | Path is a directory |
//! | [`file_size`](DriverExt::file_size) | Size in bytes |

use std::path::Path;

use crate::{Driver, FsError};

/// Extension methods for any driver.
///
/// All methods have default implementations, so drivers get them
/// automatically, including through `dyn Driver`.
pub trait DriverExt: Driver {
    /// Check if the path exists.
    ///
    /// Returns `Ok(false)` if it doesn't; `Err` only for real failures.
    fn exists(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a regular file.
    fn is_file(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(s) => Ok(s.is_file()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if the path points to a directory.
    fn is_dir(&self, path: &Path) -> Result<bool, FsError> {
        match self.stat(path) {
            Ok(s) => Ok(s.is_dir()),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Size of a file in bytes.
    ///
    /// # Errors
    ///
    /// Returns `FsError::NotFound` if the path doesn't exist.
    fn file_size(&self, path: &Path) -> Result<u64, FsError> {
        Ok(self.stat(path)?.size)
    }
}

// Blanket implementation - any driver gets DriverExt for free
impl<D: Driver + ?Sized> DriverExt for D {}
