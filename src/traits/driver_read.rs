//! Read operations a storage driver provides.

use std::path::Path;

use crate::{FsError, Stat};

/// Read operations of a storage driver.
///
/// Paths are always normalized (see [`normalize`](crate::normalize)) before
/// they reach a driver. Drivers never see handles or cursors; the dispatcher
/// owns those and calls in with absolute offsets.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access. Drivers use interior mutability for their own state.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn DriverRead`.
pub trait DriverRead: Send + Sync {
    /// Metadata for a path.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    fn stat(&self, path: &Path) -> Result<Stat, FsError>;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read; 0 at or past the end of the file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path does not exist
    /// - [`FsError::NotAFile`] if the path is a directory
    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Apply this driver's out-of-range seek policy to `position`.
    ///
    /// The default allows positions past the end of the file; a later write
    /// there fills the gap with zeros. Fixed-size media clamp instead.
    fn clamp_position(&self, path: &Path, position: u64) -> Result<u64, FsError> {
        let _ = path;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_read_is_object_safe() {
        fn _check(_: &dyn DriverRead) {}
    }

    #[test]
    fn driver_read_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: DriverRead>() {
            _assert_send_sync::<T>();
        }
    }

    #[test]
    fn default_seek_policy_allows_past_end() {
        struct Empty;
        impl DriverRead for Empty {
            fn stat(&self, path: &Path) -> Result<Stat, FsError> {
                Err(FsError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            fn read_at(&self, _: &Path, _: u64, _: &mut [u8]) -> Result<usize, FsError> {
                Ok(0)
            }
        }
        assert_eq!(Empty.clamp_position(Path::new("/f"), 1 << 40).unwrap(), 1 << 40);
    }
}
