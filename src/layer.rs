//! # Driver Layers
//!
//! Wrap a driver to change its behavior without touching its storage code.
//!
//! ```text
//! Driver ──▶ Layer::layer() ──▶ Wrapped Driver
//! ```
//!
//! A layer is a small value holding the wrapper's settings. Applying it
//! consumes the inner driver and returns the wrapper, which is itself a
//! [`Driver`] and can be layered again.
//!
//! ```rust
//! use dmfsi::{Driver, LayerExt, ReadOnlyLayer};
//! use dmfsi::backends::dmdfs::MemoryDriver;
//!
//! let driver = MemoryDriver::new().layer(ReadOnlyLayer);
//! fn accepts(_: &dyn Driver) {}
//! accepts(&driver);
//! ```

use crate::Driver;

/// Builds a wrapper around a driver of type `D`.
pub trait Layer<D> {
    /// The wrapped driver.
    type Driver;

    /// Wrap `driver`.
    fn layer(self, driver: D) -> Self::Driver;
}

/// Fluent [`Layer`] application for every driver.
pub trait LayerExt: Driver + Sized {
    /// Wrap `self` with `layer`.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Driver {
        layer.layer(self)
    }
}

impl<D: Driver> LayerExt for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirEntry, DriverDir, DriverRead, DriverWrite, FsError, Stat};
    use std::path::Path;

    struct Base;

    impl DriverRead for Base {
        fn stat(&self, _: &Path) -> Result<Stat, FsError> {
            Ok(Stat::file(1))
        }
        fn read_at(&self, _: &Path, _: u64, _: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
    }

    impl DriverWrite for Base {
        fn create(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn write_at(&self, _: &Path, _: u64, d: &[u8]) -> Result<usize, FsError> {
            Ok(d.len())
        }
        fn set_len(&self, _: &Path, _: u64) -> Result<(), FsError> {
            Ok(())
        }
        fn remove(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
        fn rename(&self, _: &Path, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    impl DriverDir for Base {
        fn list(&self, _: &Path) -> Result<Vec<DirEntry>, FsError> {
            Ok(Vec::new())
        }
        fn create_dir(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    /// Doubles every reported size.
    struct Doubled<D>(D);

    impl<D: DriverRead> DriverRead for Doubled<D> {
        fn stat(&self, path: &Path) -> Result<Stat, FsError> {
            let mut stat = self.0.stat(path)?;
            stat.size *= 2;
            Ok(stat)
        }
        fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
            self.0.read_at(path, offset, buf)
        }
    }

    impl<D: DriverWrite> DriverWrite for Doubled<D> {
        fn create(&self, path: &Path) -> Result<(), FsError> {
            self.0.create(path)
        }
        fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> Result<usize, FsError> {
            self.0.write_at(path, offset, data)
        }
        fn set_len(&self, path: &Path, len: u64) -> Result<(), FsError> {
            self.0.set_len(path, len)
        }
        fn remove(&self, path: &Path) -> Result<(), FsError> {
            self.0.remove(path)
        }
        fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
            self.0.rename(from, to)
        }
    }

    impl<D: DriverDir> DriverDir for Doubled<D> {
        fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
            self.0.list(path)
        }
        fn create_dir(&self, path: &Path) -> Result<(), FsError> {
            self.0.create_dir(path)
        }
    }

    struct DoubleLayer;

    impl<D: Driver> Layer<D> for DoubleLayer {
        type Driver = Doubled<D>;

        fn layer(self, driver: D) -> Doubled<D> {
            Doubled(driver)
        }
    }

    #[test]
    fn layers_compose() {
        let driver = Base.layer(DoubleLayer).layer(DoubleLayer);
        assert_eq!(driver.stat(Path::new("/f")).unwrap().size, 4);
    }
}
