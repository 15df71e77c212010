//! Read-only driver layer.

use std::path::Path;

use crate::{
    Attributes, DirEntry, Driver, DriverDir, DriverRead, DriverWrite, FsError, Layer, Stat,
};

/// Applies [`ReadOnly`] to a driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyLayer;

impl<D: Driver> Layer<D> for ReadOnlyLayer {
    type Driver = ReadOnly<D>;

    fn layer(self, driver: D) -> ReadOnly<D> {
        ReadOnly { inner: driver }
    }
}

/// Refuses every mutation with [`FsError::PermissionDenied`] and reports
/// every entry as [`Attributes::READ_ONLY`].
#[derive(Debug)]
pub struct ReadOnly<D> {
    inner: D,
}

impl<D> ReadOnly<D> {
    /// The wrapped driver.
    pub fn into_inner(self) -> D {
        self.inner
    }
}

fn denied(path: &Path, operation: &'static str) -> FsError {
    FsError::PermissionDenied {
        path: path.to_path_buf(),
        operation,
    }
}

impl<D: DriverRead> DriverRead for ReadOnly<D> {
    fn stat(&self, path: &Path) -> Result<Stat, FsError> {
        let mut stat = self.inner.stat(path)?;
        stat.attributes = stat.attributes | Attributes::READ_ONLY;
        Ok(stat)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.inner.read_at(path, offset, buf)
    }

    fn clamp_position(&self, path: &Path, position: u64) -> Result<u64, FsError> {
        self.inner.clamp_position(path, position)
    }
}

impl<D: DriverWrite> DriverWrite for ReadOnly<D> {
    fn create(&self, path: &Path) -> Result<(), FsError> {
        Err(denied(path, "create"))
    }

    fn write_at(&self, path: &Path, _: u64, _: &[u8]) -> Result<usize, FsError> {
        Err(denied(path, "write"))
    }

    fn set_len(&self, path: &Path, _: u64) -> Result<(), FsError> {
        Err(denied(path, "set_len"))
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        Err(denied(path, "remove"))
    }

    fn rename(&self, from: &Path, _: &Path) -> Result<(), FsError> {
        Err(denied(from, "rename"))
    }
}

impl<D: DriverDir> DriverDir for ReadOnly<D> {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let mut entries = self.inner.list(path)?;
        for entry in &mut entries {
            entry.attributes = entry.attributes | Attributes::READ_ONLY;
        }
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        Err(denied(path, "create_dir"))
    }
}
