//! Device abstraction behind dmdevfs.

use parking_lot::RwLock;

use crate::{Attributes, FsError};

/// A fixed-size byte-addressable device.
///
/// Reads and writes past [`capacity`](Device::capacity) come back short;
/// they are never an error.
pub trait Device: Send + Sync {
    /// Entry name under `/`.
    fn name(&self) -> &str;

    /// Size in bytes. Never changes.
    fn capacity(&self) -> u64;

    /// Read at `offset`. Returns bytes read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Write at `offset`. Returns bytes stored.
    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, FsError>;

    /// Commit buffered writes.
    fn flush(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Attribute bits reported for the entry.
    fn attributes(&self) -> Attributes {
        Attributes::SYSTEM
    }
}

/// Device backed by a zeroed memory buffer.
#[derive(Debug)]
pub struct RamDevice {
    name: String,
    cells: RwLock<Vec<u8>>,
}

impl RamDevice {
    /// Allocate a device of `capacity` zero bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::AllocationFailure`] if the buffer cannot be obtained
    pub fn new(name: impl Into<String>, capacity: usize) -> Result<Self, FsError> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(capacity)
            .map_err(|_| FsError::AllocationFailure { what: "ram device" })?;
        cells.resize(capacity, 0);
        Ok(Self {
            name: name.into(),
            cells: RwLock::new(cells),
        })
    }
}

fn window(len: usize, offset: u64, want: usize) -> std::ops::Range<usize> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
    start..start + want.min(len - start)
}

impl Device for RamDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> u64 {
        self.cells.read().len() as u64
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let cells = self.cells.read();
        let range = window(cells.len(), offset, buf.len());
        let n = range.len();
        buf[..n].copy_from_slice(&cells[range]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        let mut cells = self.cells.write();
        let range = window(cells.len(), offset, data.len());
        let n = range.len();
        cells[range].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_start_zeroed() {
        let dev = RamDevice::new("ram0", 4).unwrap();
        let mut buf = [1u8; 4];
        assert_eq!(dev.read_at(0, &mut buf).unwrap(), 4);
        assert_eq!(buf, [0; 4]);
        assert_eq!(dev.capacity(), 4);
        assert_eq!(dev.attributes(), Attributes::SYSTEM);
    }

    #[test]
    fn access_is_bounded_by_capacity() {
        let dev = RamDevice::new("ram0", 4).unwrap();
        assert_eq!(dev.write_at(2, b"abcd").unwrap(), 2);
        assert_eq!(dev.write_at(4, b"x").unwrap(), 0);
        assert_eq!(dev.write_at(u64::MAX, b"x").unwrap(), 0);

        let mut buf = [0u8; 8];
        assert_eq!(dev.read_at(1, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"\0ab");
        assert_eq!(dev.read_at(9, &mut buf).unwrap(), 0);
    }

    #[test]
    fn zero_capacity_device() {
        let dev = RamDevice::new("null", 0).unwrap();
        assert_eq!(dev.write_at(0, b"x").unwrap(), 0);
        assert_eq!(dev.name(), "null");
    }
}
