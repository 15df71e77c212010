//! Write operations a storage driver provides.

use std::path::Path;

use crate::FsError;

/// Write operations of a storage driver.
///
/// All methods use `&self` (interior mutability). Drivers manage their own
/// synchronization.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn DriverWrite`.
pub trait DriverWrite: Send + Sync {
    /// Create an empty file. Succeeds without change if a file is already there.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    /// - [`FsError::NotSupported`] if the medium cannot create files
    fn create(&self, path: &Path) -> Result<(), FsError>;

    /// Write `data` at `offset`, returning how many bytes were stored.
    ///
    /// A short count is not an error: it reports a partial write (for
    /// example, a fixed-size device running out of room).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> Result<usize, FsError>;

    /// Resize a file, zero-filling on growth.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    fn set_len(&self, path: &Path, len: u64) -> Result<(), FsError>;

    /// Commit buffered state of one file.
    fn flush(&self, path: &Path) -> Result<(), FsError> {
        let _ = path;
        Ok(())
    }

    /// Commit all buffered state to the medium.
    fn sync(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Remove a file or an empty directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::DirectoryNotEmpty`] if the directory has entries
    fn remove(&self, path: &Path) -> Result<(), FsError>;

    /// Rename/move a file or directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the source or the target's parent is missing
    /// - [`FsError::AlreadyExists`] if the target is an existing directory
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;
}
