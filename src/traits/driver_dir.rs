//! Directory operations a storage driver provides.

use std::path::Path;

use crate::{DirEntry, FsError};

/// Directory operations of a storage driver.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn DriverDir`.
pub trait DriverDir: Send + Sync {
    /// List a directory.
    ///
    /// The order is driver-defined but must be the same on every call while
    /// the directory is unchanged. The dispatcher snapshots this list on
    /// `opendir`, so iteration stays stable until `closedir`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotADirectory`] if the path is not a directory
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Create a directory (parent must exist).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::AlreadyExists`] if the path already exists
    fn create_dir(&self, path: &Path) -> Result<(), FsError>;
}
