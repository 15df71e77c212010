//! Per-context table of open file and directory handles.
//!
//! Identities are allocated from a counter that only moves forward, so a
//! closed handle's identity is never handed out again within the same
//! context. A stale handle therefore always misses the table instead of
//! landing on a resurrected record.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::{Attributes, DirEntry, FsError, OpenMode};

/// Live state of an open file stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Normalized path the stream is bound to.
    pub path: PathBuf,
    /// Access mode given at open.
    pub mode: OpenMode,
    /// Attributes given at open.
    pub attributes: Attributes,
    /// Byte cursor.
    pub position: u64,
    /// Set when a read came up short; cleared by seek and write.
    pub eof: bool,
    /// Written since the last flush.
    pub dirty: bool,
}

/// Live state of an open directory iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRecord {
    /// Normalized path of the directory.
    pub path: PathBuf,
    /// Snapshot taken at open; iteration order is fixed until close.
    pub entries: Vec<DirEntry>,
    /// Index of the next entry to return.
    pub position: usize,
}

impl DirRecord {
    /// Returns `true` once every entry has been handed out.
    #[inline]
    pub fn exhausted(&self) -> bool {
        self.position >= self.entries.len()
    }
}

/// Table of live records keyed by handle identity.
#[derive(Debug)]
pub struct HandleTable<R> {
    next: u64,
    records: HashMap<u64, R>,
}

impl<R> HandleTable<R> {
    /// Create a table with room for `capacity` records.
    ///
    /// # Errors
    ///
    /// - [`FsError::AllocationFailure`] if the memory cannot be reserved
    pub fn with_capacity(capacity: usize) -> Result<Self, FsError> {
        let mut records = HashMap::new();
        records
            .try_reserve(capacity)
            .map_err(|_| FsError::AllocationFailure {
                what: "handle table",
            })?;
        Ok(Self { next: 1, records })
    }

    /// Insert a record and return its fresh identity.
    ///
    /// # Errors
    ///
    /// - [`FsError::AllocationFailure`] if the table cannot grow or the
    ///   identity space is exhausted
    pub fn register(&mut self, record: R) -> Result<u64, FsError> {
        self.records
            .try_reserve(1)
            .map_err(|_| FsError::AllocationFailure {
                what: "handle table",
            })?;
        let id = self.next;
        self.next = id.checked_add(1).ok_or(FsError::AllocationFailure {
            what: "handle identity",
        })?;
        self.records.insert(id, record);
        Ok(id)
    }

    /// Resolve an identity to its live record.
    pub fn lookup(&self, id: u64) -> Option<&R> {
        self.records.get(&id)
    }

    /// Resolve an identity to its live record for update.
    pub fn lookup_mut(&mut self, id: u64) -> Option<&mut R> {
        self.records.get_mut(&id)
    }

    /// Remove a record. Later lookups of `id` miss.
    pub fn release(&mut self, id: u64) -> Option<R> {
        self.records.remove(&id)
    }

    /// Remove every record, oldest first.
    pub fn drain(&mut self) -> Vec<(u64, R)> {
        let mut all: Vec<_> = self.records.drain().collect();
        all.sort_unstable_by_key(|(id, _)| *id);
        all
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are live.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HandleTable<&'static str> {
        HandleTable::with_capacity(4).unwrap()
    }

    #[test]
    fn register_assigns_distinct_identities() {
        let mut t = table();
        let a = t.register("a").unwrap();
        let b = t.register("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(t.lookup(a), Some(&"a"));
        assert_eq!(t.lookup(b), Some(&"b"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn release_invalidates_identity() {
        let mut t = table();
        let a = t.register("a").unwrap();
        assert_eq!(t.release(a), Some("a"));
        assert_eq!(t.lookup(a), None);
        assert_eq!(t.release(a), None);
    }

    #[test]
    fn identities_are_not_reused() {
        let mut t = table();
        let a = t.register("a").unwrap();
        t.release(a);
        let b = t.register("b").unwrap();
        assert_ne!(a, b);
        assert_eq!(t.lookup(a), None);
    }

    #[test]
    fn lookup_mut_updates_record() {
        let mut t: HandleTable<u32> = HandleTable::with_capacity(1).unwrap();
        let id = t.register(1).unwrap();
        *t.lookup_mut(id).unwrap() += 1;
        assert_eq!(t.lookup(id), Some(&2));
    }

    #[test]
    fn drain_returns_oldest_first_and_empties() {
        let mut t = table();
        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|r| t.register(r).unwrap())
            .collect();
        let drained = t.drain();
        assert_eq!(
            drained.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            ids
        );
        assert!(t.is_empty());
    }

    #[test]
    fn exhausted_identity_space_is_reported() {
        let mut t = table();
        t.next = u64::MAX;
        let err = t.register("last").unwrap_err();
        assert!(matches!(err, FsError::AllocationFailure { .. }));
    }

    #[test]
    fn dir_record_exhaustion() {
        let rec = DirRecord {
            path: PathBuf::from("/"),
            entries: Vec::new(),
            position: 0,
        };
        assert!(rec.exhausted());
    }
}
