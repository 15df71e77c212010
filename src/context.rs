//! Context Manager: the opaque per-backend-instance state.
//!
//! A [`Context`] is a cheap, cloneable reference to one mounted backend
//! instance. It carries the magic of the backend that created it and the
//! registration it was created through, which lets the dispatcher reject
//! foreign contexts, and an alive flag (the presence of the driver), which
//! lets every clone observe destruction. Operations never run against a context that fails either
//! check.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::handles::{DirRecord, FileRecord, HandleTable};
use crate::{ContextId, DirHandle, Driver, FileHandle, FsError, Magic};

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

const INITIAL_HANDLES: usize = 8;

/// Opaque handle to one activated backend instance.
///
/// Created by [`Interface::init`](crate::Interface::init) and destroyed by
/// [`Interface::deinit`](crate::Interface::deinit). Clones share state:
/// once any of them is deinitialized, [`is_alive`](Context::is_alive) is
/// `false` for all of them and every operation is rejected with
/// [`FsError::InvalidContext`].
#[derive(Clone)]
pub struct Context {
    state: Arc<ContextState>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.state.id)
            .field("magic", &self.state.magic)
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Context {
    /// Process-unique identity.
    pub fn id(&self) -> ContextId {
        self.state.id
    }

    /// Sentinel of the backend that created this context.
    pub fn magic(&self) -> Magic {
        self.state.magic
    }

    /// `false` once the context has been deinitialized.
    pub fn is_alive(&self) -> bool {
        self.state.driver.read().is_some()
    }

    /// Number of open file handles.
    pub fn open_files(&self) -> usize {
        self.state.files.lock().len()
    }

    /// Number of open directory handles.
    pub fn open_dirs(&self) -> usize {
        self.state.dirs.lock().len()
    }

    pub(crate) fn state(&self) -> &Arc<ContextState> {
        &self.state
    }
}

/// What [`Interface::deinit`](crate::Interface::deinit) had to clean up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextTeardown {
    /// File handles that were still open and got force-closed.
    pub closed_files: usize,
    /// Directory handles that were still open and got force-closed.
    pub closed_dirs: usize,
}

impl ContextTeardown {
    /// Returns `true` if the caller left handles open.
    pub fn leaked(&self) -> bool {
        self.closed_files + self.closed_dirs > 0
    }
}

/// Handle tables, allocated before any backend setup runs so that an
/// allocation failure never leaves backend state behind.
pub(crate) struct Tables {
    files: HandleTable<FileRecord>,
    dirs: HandleTable<DirRecord>,
}

impl Tables {
    pub(crate) fn allocate() -> Result<Self, FsError> {
        Ok(Self {
            files: HandleTable::with_capacity(INITIAL_HANDLES)?,
            dirs: HandleTable::with_capacity(INITIAL_HANDLES)?,
        })
    }
}

/// Everything a destroyed context still owned.
pub(crate) struct Remains {
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) files: Vec<(u64, FileRecord)>,
    pub(crate) dirs: usize,
}

pub(crate) struct ContextState {
    id: ContextId,
    owner: u64,
    magic: Magic,
    driver: RwLock<Option<Arc<dyn Driver>>>,
    files: Mutex<HandleTable<FileRecord>>,
    dirs: Mutex<HandleTable<DirRecord>>,
}

impl ContextState {
    /// Build a live context. `owner` identifies the registration that
    /// mounted it.
    pub(crate) fn assemble(
        owner: u64,
        magic: Magic,
        driver: Box<dyn Driver>,
        tables: Tables,
    ) -> Context {
        let id = ContextId(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed));
        Context {
            state: Arc::new(Self {
                id,
                owner,
                magic,
                driver: RwLock::new(Some(Arc::from(driver))),
                files: Mutex::new(tables.files),
                dirs: Mutex::new(tables.dirs),
            }),
        }
    }

    pub(crate) fn id(&self) -> ContextId {
        self.id
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// The live driver, or `None` once destroyed.
    pub(crate) fn driver(&self) -> Option<Arc<dyn Driver>> {
        self.driver.read().clone()
    }

    /// Mark the context dead and hand back what it owned.
    ///
    /// Returns `None` if it was already destroyed.
    pub(crate) fn destroy(&self) -> Option<Remains> {
        let driver = self.driver.write().take()?;
        let files = self.files.lock().drain();
        let dirs = self.dirs.lock().drain().len();
        Some(Remains {
            driver,
            files,
            dirs,
        })
    }

    fn owns(&self, context: ContextId, id: u64, operation: &'static str) -> Result<(), FsError> {
        if context == self.id {
            Ok(())
        } else {
            Err(FsError::InvalidHandle {
                handle: id,
                operation,
            })
        }
    }

    pub(crate) fn open_file(&self, record: FileRecord) -> Result<FileHandle, FsError> {
        let id = self.files.lock().register(record)?;
        Ok(FileHandle {
            context: self.id,
            id,
        })
    }

    /// Snapshot of a file record.
    pub(crate) fn file(
        &self,
        handle: FileHandle,
        operation: &'static str,
    ) -> Result<FileRecord, FsError> {
        self.update_file(handle, operation, |record| record.clone())
    }

    pub(crate) fn update_file<T>(
        &self,
        handle: FileHandle,
        operation: &'static str,
        f: impl FnOnce(&mut FileRecord) -> T,
    ) -> Result<T, FsError> {
        self.owns(handle.context, handle.id, operation)?;
        let mut files = self.files.lock();
        let record = files
            .lookup_mut(handle.id)
            .ok_or(FsError::InvalidHandle {
                handle: handle.id,
                operation,
            })?;
        Ok(f(record))
    }

    pub(crate) fn close_file(
        &self,
        handle: FileHandle,
        operation: &'static str,
    ) -> Result<FileRecord, FsError> {
        self.owns(handle.context, handle.id, operation)?;
        self.files
            .lock()
            .release(handle.id)
            .ok_or(FsError::InvalidHandle {
                handle: handle.id,
                operation,
            })
    }

    pub(crate) fn open_dir(&self, record: DirRecord) -> Result<DirHandle, FsError> {
        let id = self.dirs.lock().register(record)?;
        Ok(DirHandle {
            context: self.id,
            id,
        })
    }

    pub(crate) fn update_dir<T>(
        &self,
        handle: DirHandle,
        operation: &'static str,
        f: impl FnOnce(&mut DirRecord) -> T,
    ) -> Result<T, FsError> {
        self.owns(handle.context, handle.id, operation)?;
        let mut dirs = self.dirs.lock();
        let record = dirs.lookup_mut(handle.id).ok_or(FsError::InvalidHandle {
            handle: handle.id,
            operation,
        })?;
        Ok(f(record))
    }

    pub(crate) fn close_dir(&self, handle: DirHandle, operation: &'static str) -> Result<(), FsError> {
        self.owns(handle.context, handle.id, operation)?;
        self.dirs
            .lock()
            .release(handle.id)
            .map(|_| ())
            .ok_or(FsError::InvalidHandle {
                handle: handle.id,
                operation,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DirEntry, DriverDir, DriverRead, DriverWrite, OpenMode, Attributes, Stat};
    use std::path::{Path, PathBuf};

    struct Nothing;

    impl DriverRead for Nothing {
        fn stat(&self, _: &Path) -> Result<Stat, FsError> {
            Ok(Stat::directory())
        }
        fn read_at(&self, _: &Path, _: u64, _: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
    }

    impl DriverWrite for Nothing {
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

    impl DriverDir for Nothing {
        fn list(&self, _: &Path) -> Result<Vec<DirEntry>, FsError> {
            Ok(Vec::new())
        }
        fn create_dir(&self, _: &Path) -> Result<(), FsError> {
            Ok(())
        }
    }

    fn context() -> Context {
        ContextState::assemble(1, Magic(7), Box::new(Nothing), Tables::allocate().unwrap())
    }

    fn record() -> FileRecord {
        FileRecord {
            path: PathBuf::from("/f"),
            mode: OpenMode::READ,
            attributes: Attributes::NONE,
            position: 0,
            eof: false,
            dirty: false,
        }
    }

    #[test]
    fn contexts_get_unique_ids() {
        assert_ne!(context().id(), context().id());
    }

    #[test]
    fn destroy_is_seen_by_clones() {
        let ctx = context();
        let clone = ctx.clone();
        assert!(clone.is_alive());
        assert!(ctx.state().destroy().is_some());
        assert!(!clone.is_alive());
        assert!(clone.state().destroy().is_none());
    }

    #[test]
    fn destroy_drains_handles() {
        let ctx = context();
        ctx.state().open_file(record()).unwrap();
        ctx.state()
            .open_dir(DirRecord {
                path: PathBuf::from("/"),
                entries: Vec::new(),
                position: 0,
            })
            .unwrap();
        let remains = ctx.state().destroy().unwrap();
        assert_eq!(remains.files.len(), 1);
        assert_eq!(remains.dirs, 1);
        assert_eq!(ctx.open_files(), 0);
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let a = context();
        let b = context();
        let h = a.state().open_file(record()).unwrap();
        let err = b.state().file(h, "fread").unwrap_err();
        assert!(matches!(err, FsError::InvalidHandle { .. }));
        assert!(a.state().file(h, "fread").is_ok());
    }

    #[test]
    fn closed_file_handle_is_invalid() {
        let ctx = context();
        let h = ctx.state().open_file(record()).unwrap();
        ctx.state().close_file(h, "fclose").unwrap();
        assert!(matches!(
            ctx.state().file(h, "tell"),
            Err(FsError::InvalidHandle { .. })
        ));
        assert!(matches!(
            ctx.state().close_file(h, "fclose"),
            Err(FsError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn teardown_leak_flag() {
        assert!(!ContextTeardown::default().leaked());
        assert!(
            ContextTeardown {
                closed_files: 1,
                closed_dirs: 0
            }
            .leaked()
        );
    }
}
