//! Driver Interface Framework: versioned registration and dispatch.
//!
//! A [`Registry`] holds every registered backend under a `(name, version)`
//! pair. Resolving a name against a [`VersionReq`] yields an [`Interface`],
//! the DMFSI call surface bound to one registration. Every call through an
//! [`Interface`] passes the same gate before any backend code runs:
//!
//! 1. the registration is still live ([`FsError::ImplementationNotFound`])
//! 2. the context was made through this registration and is alive ([`FsError::InvalidContext`])
//! 3. the handle belongs to the context and is open ([`FsError::InvalidHandle`])
//!
//! Cursors, end-of-stream flags and access modes are enforced here, once,
//! so a backend only has to provide a [`Driver`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::context::{ContextState, Tables};
use crate::handles::{DirRecord, FileRecord};
use crate::{
    Attributes, Backend, Config, Context, ContextTeardown, DMFSI_VERSION, DirEntry, DirHandle,
    Driver, DriverExt, FileHandle, FsError, Magic, OpenMode, Stat, Target, Version, VersionReq,
    Whence, normalize,
};

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// Process-scoped table of registered implementations.
///
/// Construct one at host startup and pass it by reference to whatever needs
/// to bind a backend. A registry is bound to one interface major version and
/// refuses registrations and requests for any other.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use dmfsi::{Registry, Version, VersionReq, DMFSI_VERSION};
/// use dmfsi::backends::dmdfs::Dmdfs;
///
/// let registry = Registry::new();
/// registry.register("dmdfs", Version::new(1, 0), Arc::new(Dmdfs)).unwrap();
///
/// let fs = registry.resolve("dmdfs", VersionReq::Compatible(DMFSI_VERSION)).unwrap();
/// let ctx = fs.init("").unwrap();
/// assert!(fs.context_is_valid(&ctx));
/// fs.deinit(ctx).unwrap();
/// ```
pub struct Registry {
    interface: Version,
    entries: RwLock<BTreeMap<String, BTreeMap<Version, Arc<Registration>>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("interface", &self.interface)
            .field("implementations", &self.implementations())
            .finish()
    }
}

impl Registry {
    /// Registry bound to [`DMFSI_VERSION`].
    pub fn new() -> Self {
        Self::with_interface(DMFSI_VERSION)
    }

    /// Registry bound to an explicit interface version.
    pub fn with_interface(interface: Version) -> Self {
        Self {
            interface,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Interface version this registry dispatches.
    pub fn interface(&self) -> Version {
        self.interface
    }

    /// Add an implementation.
    ///
    /// # Errors
    ///
    /// - [`FsError::VersionMismatch`] if `version` declares a different major
    ///   than the registry's interface
    /// - [`FsError::DuplicateVersion`] if `(name, version)` is taken
    pub fn register(
        &self,
        name: &str,
        version: Version,
        backend: Arc<dyn Backend>,
    ) -> Result<(), FsError> {
        if version.major != self.interface.major {
            return Err(FsError::VersionMismatch {
                name: name.to_string(),
                requested: VersionReq::Compatible(self.interface),
                available: version,
            });
        }

        let mut entries = self.entries.write();
        let versions = entries.entry(name.to_string()).or_default();
        if versions.contains_key(&version) {
            return Err(FsError::DuplicateVersion {
                name: name.to_string(),
                version,
            });
        }
        versions.insert(
            version,
            Arc::new(Registration {
                id: NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed),
                name: name.to_string(),
                version,
                backend,
                active: AtomicBool::new(true),
                contexts: Mutex::new(Vec::new()),
            }),
        );
        debug!(name, %version, "implementation registered");
        Ok(())
    }

    /// Remove an implementation, force-closing every context still open
    /// against it. Returns how many contexts were closed.
    ///
    /// Interfaces already resolved to the removed registration start
    /// failing with [`FsError::ImplementationNotFound`].
    ///
    /// # Errors
    ///
    /// - [`FsError::ImplementationNotFound`] if `(name, version)` is not
    ///   registered
    pub fn unregister(&self, name: &str, version: Version) -> Result<usize, FsError> {
        let registration = {
            let mut entries = self.entries.write();
            let versions = entries
                .get_mut(name)
                .ok_or_else(|| FsError::ImplementationNotFound {
                    name: name.to_string(),
                })?;
            let registration =
                versions
                    .remove(&version)
                    .ok_or_else(|| FsError::ImplementationNotFound {
                        name: name.to_string(),
                    })?;
            if versions.is_empty() {
                entries.remove(name);
            }
            registration
        };

        let closed = registration.retire();
        if closed > 0 {
            warn!(name, %version, closed, "unregistered with live contexts, force-closed");
        }
        debug!(name, %version, "implementation unregistered");
        Ok(closed)
    }

    /// Bind to the highest registered version of `name` satisfying `req`.
    ///
    /// # Errors
    ///
    /// - [`FsError::ImplementationNotFound`] if nothing is registered under
    ///   `name`
    /// - [`FsError::VersionMismatch`] if `req` targets another interface
    ///   major, or no registered version satisfies it
    pub fn resolve(&self, name: &str, req: VersionReq) -> Result<Interface, FsError> {
        let entries = self.entries.read();
        let versions = entries
            .get(name)
            .ok_or_else(|| FsError::ImplementationNotFound {
                name: name.to_string(),
            })?;
        let mismatch = || FsError::VersionMismatch {
            name: name.to_string(),
            requested: req,
            available: versions.keys().next_back().copied().unwrap_or(self.interface),
        };

        if req.major() != self.interface.major {
            return Err(mismatch());
        }
        let registration = versions
            .iter()
            .rev()
            .find(|(version, _)| req.matches(**version))
            .map(|(_, registration)| Arc::clone(registration))
            .ok_or_else(mismatch)?;

        debug!(name, %req, version = %registration.version, "implementation resolved");
        Ok(Interface { registration })
    }

    /// Every registered `(name, version)`, sorted.
    pub fn implementations(&self) -> Vec<(String, Version)> {
        self.entries
            .read()
            .iter()
            .flat_map(|(name, versions)| versions.keys().map(move |v| (name.clone(), *v)))
            .collect()
    }
}

/// One `(name, version, backend)` entry plus the contexts created through it.
struct Registration {
    id: u64,
    name: String,
    version: Version,
    backend: Arc<dyn Backend>,
    active: AtomicBool,
    contexts: Mutex<Vec<Weak<ContextState>>>,
}

impl Registration {
    fn track(&self, ctx: &Context) -> bool {
        let mut contexts = self.contexts.lock();
        if !self.active.load(Ordering::Acquire) {
            return false;
        }
        contexts.retain(|weak| weak.strong_count() > 0);
        contexts.push(Arc::downgrade(ctx.state()));
        true
    }

    fn untrack(&self, state: &ContextState) {
        let id = state.id();
        self.contexts
            .lock()
            .retain(|weak| weak.upgrade().is_some_and(|s| s.id() != id));
    }

    fn live(&self) -> Vec<Arc<ContextState>> {
        self.contexts
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|state| state.driver().is_some())
            .collect()
    }

    /// Deactivate and tear down every live context.
    fn retire(&self) -> usize {
        self.active.store(false, Ordering::Release);
        let live = std::mem::take(&mut *self.contexts.lock());
        live.iter()
            .filter_map(Weak::upgrade)
            .filter(|state| match self.teardown(state, "unregister") {
                Ok(_) => true,
                Err(FsError::InvalidContext { .. }) => false,
                Err(error) => {
                    warn!(name = %self.name, context = state.id().0, %error, "unmount failed");
                    true
                }
            })
            .count()
    }

    /// Destroy a context: flush dirty streams, drop handles, unmount.
    ///
    /// The context is dead afterwards even when unmounting fails.
    fn teardown(
        &self,
        state: &ContextState,
        operation: &'static str,
    ) -> Result<ContextTeardown, FsError> {
        let remains = state
            .destroy()
            .ok_or(FsError::InvalidContext { operation })?;
        self.untrack(state);

        for (id, record) in remains.files.iter().filter(|(_, r)| r.dirty) {
            if let Err(error) = remains.driver.flush(&record.path) {
                warn!(handle = id, path = %record.path.display(), %error, "flush on teardown failed");
            }
        }
        let report = ContextTeardown {
            closed_files: remains.files.len(),
            closed_dirs: remains.dirs,
        };
        if report.leaked() {
            warn!(
                name = %self.name,
                context = state.id().0,
                files = report.closed_files,
                dirs = report.closed_dirs,
                "context destroyed with open handles"
            );
        }

        self.backend.unmount(remains.driver.as_ref())?;
        debug!(name = %self.name, context = state.id().0, "context destroyed");
        Ok(report)
    }
}

/// The DMFSI call surface of one resolved implementation.
///
/// Cheap to clone. Obtained from [`Registry::resolve`].
#[derive(Clone)]
pub struct Interface {
    registration: Arc<Registration>,
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("name", &self.registration.name)
            .field("version", &self.registration.version)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Interface {
    /// Registered name.
    pub fn name(&self) -> &str {
        &self.registration.name
    }

    /// Registered version.
    pub fn version(&self) -> Version {
        self.registration.version
    }

    /// Magic stamped on this backend's contexts.
    pub fn magic(&self) -> Magic {
        self.registration.backend.magic()
    }

    /// `false` once the registration has been removed.
    pub fn is_active(&self) -> bool {
        self.registration.active.load(Ordering::Acquire)
    }

    /// Contexts created through this registration that are still alive.
    pub fn live_contexts(&self) -> usize {
        self.registration.live().len()
    }

    fn active(&self) -> Result<(), FsError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(FsError::ImplementationNotFound {
                name: self.registration.name.clone(),
            })
        }
    }

    fn gate(&self, ctx: &Context, operation: &'static str) -> Result<Arc<dyn Driver>, FsError> {
        self.active()?;
        if ctx.magic() != self.magic() || ctx.state().owner() != self.registration.id {
            return Err(FsError::InvalidContext { operation });
        }
        ctx.state()
            .driver()
            .ok_or(FsError::InvalidContext { operation })
    }

    fn stream(
        &self,
        ctx: &Context,
        handle: FileHandle,
        operation: &'static str,
    ) -> Result<(Arc<dyn Driver>, FileRecord), FsError> {
        let driver = self.gate(ctx, operation)?;
        let record = ctx.state().file(handle, operation)?;
        Ok((driver, record))
    }

    // ------------------------------------------------------------------
    // Context lifecycle
    // ------------------------------------------------------------------

    /// Create a context from a backend configuration string.
    ///
    /// Nothing is left behind on failure: handle tables are reserved before
    /// the backend mounts, and a mounted driver is unmounted again if the
    /// configuration holds keys the backend did not consume.
    ///
    /// # Errors
    ///
    /// - [`FsError::AllocationFailure`] if context memory cannot be reserved
    /// - [`FsError::Config`] for malformed or unknown configuration
    /// - whatever the backend's mount reports
    pub fn init(&self, config: &str) -> Result<Context, FsError> {
        self.active()?;
        let tables = Tables::allocate()?;
        let mut config = Config::parse(config)?;

        let backend = &self.registration.backend;
        let driver = backend.mount(&mut config)?;
        if let Err(error) = config.finish() {
            if let Err(unmount) = backend.unmount(driver.as_ref()) {
                warn!(name = %self.registration.name, error = %unmount, "rollback unmount failed");
            }
            return Err(error);
        }

        let ctx = ContextState::assemble(self.registration.id, backend.magic(), driver, tables);
        if !self.registration.track(&ctx) {
            // Unregistered while mounting.
            if let Err(unmount) = self.registration.teardown(ctx.state(), "init") {
                warn!(name = %self.registration.name, error = %unmount, "rollback unmount failed");
            }
            return Err(FsError::ImplementationNotFound {
                name: self.registration.name.clone(),
            });
        }
        debug!(
            name = %self.registration.name,
            version = %self.registration.version,
            context = ctx.id().0,
            "context created"
        );
        Ok(ctx)
    }

    /// Destroy a context.
    ///
    /// Open handles are force-closed (dirty ones flushed first) and reported
    /// in the returned [`ContextTeardown`] and a warning event. Other clones
    /// of `ctx` become invalid.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidContext`] if the context is foreign or already
    ///   destroyed
    /// - whatever the backend's unmount reports (the context is destroyed
    ///   regardless)
    pub fn deinit(&self, ctx: Context) -> Result<ContextTeardown, FsError> {
        self.gate(&ctx, "deinit")?;
        self.registration.teardown(ctx.state(), "deinit")
    }

    /// Pure validity predicate; never fails and never mutates.
    pub fn context_is_valid(&self, ctx: &Context) -> bool {
        self.gate(ctx, "context_is_valid").is_ok()
    }

    // ------------------------------------------------------------------
    // File streams
    // ------------------------------------------------------------------

    /// Open a file stream.
    ///
    /// The cursor starts at 0. `attributes` is recorded on the handle and
    /// can be read back with [`attributes`](Interface::attributes).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the path is missing and `mode` does not create
    /// - [`FsError::NotAFile`] if the path is a directory
    /// - [`FsError::AlreadyExists`] for an exclusive create of an existing file
    /// - [`FsError::PermissionDenied`] if `mode` neither reads nor writes, or
    ///   writes to a read-only file
    pub fn fopen(
        &self,
        ctx: &Context,
        path: impl AsRef<Path>,
        mode: OpenMode,
        attributes: Attributes,
    ) -> Result<FileHandle, FsError> {
        const OP: &str = "fopen";
        let driver = self.gate(ctx, OP)?;
        let path = normalize(path.as_ref());

        if !mode.read && !mode.write {
            return Err(FsError::PermissionDenied {
                path,
                operation: OP,
            });
        }
        match driver.stat(&path) {
            Ok(stat) if stat.is_dir() => return Err(FsError::NotAFile { path }),
            Ok(_) if mode.create && mode.exclusive => {
                return Err(FsError::AlreadyExists {
                    path,
                    operation: OP,
                });
            }
            Ok(stat) if mode.write && stat.attributes.contains(Attributes::READ_ONLY) => {
                return Err(FsError::PermissionDenied {
                    path,
                    operation: OP,
                });
            }
            Ok(_) => {
                if mode.write && mode.truncate {
                    driver.set_len(&path, 0)?;
                }
            }
            Err(FsError::NotFound { .. }) if mode.create => driver.create(&path)?,
            Err(error) => return Err(error),
        }

        let handle = ctx.state().open_file(FileRecord {
            path,
            mode,
            attributes,
            position: 0,
            eof: false,
            dirty: false,
        })?;
        Ok(handle)
    }

    /// Close a file stream, flushing it if it was written.
    ///
    /// The handle is released even if the flush fails.
    pub fn fclose(&self, ctx: &Context, handle: FileHandle) -> Result<(), FsError> {
        const OP: &str = "fclose";
        let driver = self.gate(ctx, OP)?;
        let record = ctx.state().close_file(handle, OP)?;
        if record.dirty {
            driver.flush(&record.path)?;
        }
        Ok(())
    }

    /// Read into `buf` from the cursor. Returns the number of bytes read,
    /// which is less than `buf.len()` only at end of stream.
    pub fn fread(&self, ctx: &Context, handle: FileHandle, buf: &mut [u8]) -> Result<usize, FsError> {
        self.read_op(ctx, handle, buf, "fread")
    }

    fn read_op(
        &self,
        ctx: &Context,
        handle: FileHandle,
        buf: &mut [u8],
        operation: &'static str,
    ) -> Result<usize, FsError> {
        let (driver, record) = self.stream(ctx, handle, operation)?;
        if !record.mode.read {
            return Err(FsError::PermissionDenied {
                path: record.path,
                operation,
            });
        }
        let n = driver.read_at(&record.path, record.position, buf)?;
        ctx.state().update_file(handle, operation, |r| {
            r.position = record.position.saturating_add(n as u64);
            r.eof = n < buf.len();
        })?;
        Ok(n)
    }

    /// Write `data` at the cursor (at end of file in append mode).
    ///
    /// Returns the number of bytes written; a short count is a partial
    /// write, not an error.
    pub fn fwrite(&self, ctx: &Context, handle: FileHandle, data: &[u8]) -> Result<usize, FsError> {
        self.write_op(ctx, handle, data, "fwrite")
    }

    fn write_op(
        &self,
        ctx: &Context,
        handle: FileHandle,
        data: &[u8],
        operation: &'static str,
    ) -> Result<usize, FsError> {
        let (driver, record) = self.stream(ctx, handle, operation)?;
        if !record.mode.write {
            return Err(FsError::PermissionDenied {
                path: record.path,
                operation,
            });
        }
        let offset = if record.mode.append {
            driver.stat(&record.path)?.size
        } else {
            record.position
        };
        let n = driver.write_at(&record.path, offset, data)?;
        ctx.state().update_file(handle, operation, |r| {
            r.position = offset.saturating_add(n as u64);
            r.eof = false;
            r.dirty |= n > 0;
        })?;
        Ok(n)
    }

    /// Move the cursor and return the new absolute position.
    ///
    /// Whether a position past the end is kept or clamped is up to the
    /// backend's driver. A successful seek clears the end-of-stream flag.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidSeek`] if the result would be negative
    pub fn lseek(
        &self,
        ctx: &Context,
        handle: FileHandle,
        offset: i64,
        whence: Whence,
    ) -> Result<u64, FsError> {
        const OP: &str = "lseek";
        let (driver, record) = self.stream(ctx, handle, OP)?;
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => record.position,
            Whence::End => driver.stat(&record.path)?.size,
        };
        let target = base
            .checked_add_signed(offset)
            .ok_or(FsError::InvalidSeek { offset, whence })?;
        let position = driver.clamp_position(&record.path, target)?;
        ctx.state().update_file(handle, OP, |r| {
            r.position = position;
            r.eof = false;
        })?;
        Ok(position)
    }

    /// Current cursor position.
    pub fn tell(&self, ctx: &Context, handle: FileHandle) -> Result<u64, FsError> {
        let (_, record) = self.stream(ctx, handle, "tell")?;
        Ok(record.position)
    }

    /// Attributes recorded when the stream was opened.
    pub fn attributes(&self, ctx: &Context, handle: FileHandle) -> Result<Attributes, FsError> {
        let (_, record) = self.stream(ctx, handle, "attributes")?;
        Ok(record.attributes)
    }

    /// End-of-stream flag. `true` for any invalid context or handle.
    pub fn eof(&self, ctx: &Context, handle: FileHandle) -> bool {
        self.stream(ctx, handle, "eof")
            .map_or(true, |(_, record)| record.eof)
    }

    /// Length in bytes of an open stream or of a path.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use dmfsi::{Registry, Version, VersionReq, OpenMode, Attributes};
    /// # use dmfsi::backends::dmdfs::Dmdfs;
    /// # let registry = Registry::new();
    /// # registry.register("dmdfs", Version::new(1, 0), Arc::new(Dmdfs)).unwrap();
    /// # let fs = registry.resolve("dmdfs", VersionReq::Exact(Version::new(1, 0))).unwrap();
    /// # let ctx = fs.init("").unwrap();
    /// let f = fs.fopen(&ctx, "/a", OpenMode::WRITE, Attributes::NONE).unwrap();
    /// fs.fwrite(&ctx, f, b"abc").unwrap();
    /// assert_eq!(fs.size(&ctx, f).unwrap(), 3);
    /// assert_eq!(fs.size(&ctx, "/a").unwrap(), 3);
    /// ```
    pub fn size<'a>(&self, ctx: &Context, target: impl Into<Target<'a>>) -> Result<u64, FsError> {
        const OP: &str = "size";
        let (driver, path) = match target.into() {
            Target::Handle(handle) => {
                let (driver, record) = self.stream(ctx, handle, OP)?;
                (driver, record.path)
            }
            Target::Path(path) => (self.gate(ctx, OP)?, normalize(path)),
        };
        Ok(driver.stat(&path)?.size)
    }

    /// Read one byte. `None` at end of stream.
    pub fn getc(&self, ctx: &Context, handle: FileHandle) -> Result<Option<u8>, FsError> {
        let mut byte = [0u8; 1];
        let n = self.read_op(ctx, handle, &mut byte, "getc")?;
        Ok((n == 1).then_some(byte[0]))
    }

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// - [`FsError::Backend`] if the byte could not be stored (device full)
    pub fn putc(&self, ctx: &Context, handle: FileHandle, byte: u8) -> Result<(), FsError> {
        match self.write_op(ctx, handle, &[byte], "putc")? {
            0 => Err(FsError::Backend("putc: no space left".to_string())),
            _ => Ok(()),
        }
    }

    /// Commit a stream's buffered writes.
    pub fn fflush(&self, ctx: &Context, handle: FileHandle) -> Result<(), FsError> {
        const OP: &str = "fflush";
        let (driver, record) = self.stream(ctx, handle, OP)?;
        driver.flush(&record.path)?;
        ctx.state().update_file(handle, OP, |r| r.dirty = false)
    }

    /// Commit a stream and the backing store under it.
    pub fn sync(&self, ctx: &Context, handle: FileHandle) -> Result<(), FsError> {
        const OP: &str = "sync";
        let (driver, record) = self.stream(ctx, handle, OP)?;
        driver.flush(&record.path)?;
        driver.sync()?;
        ctx.state().update_file(handle, OP, |r| r.dirty = false)
    }

    // ------------------------------------------------------------------
    // Directory iteration
    // ------------------------------------------------------------------

    /// Open a directory for iteration.
    ///
    /// The listing is captured here; `readdir` hands it out in the driver's
    /// order until `closedir`, unaffected by later changes.
    pub fn opendir(&self, ctx: &Context, path: impl AsRef<Path>) -> Result<DirHandle, FsError> {
        const OP: &str = "opendir";
        let driver = self.gate(ctx, OP)?;
        let path = normalize(path.as_ref());
        if !driver.stat(&path)?.is_dir() {
            return Err(FsError::NotADirectory { path });
        }
        let entries = driver.list(&path)?;
        ctx.state().open_dir(DirRecord {
            path,
            entries,
            position: 0,
        })
    }

    /// Next entry, or `None` once the listing is exhausted.
    ///
    /// Exhaustion maps to [`Status::NotFound`](crate::Status::NotFound) at
    /// the wire level but is not an error here.
    pub fn readdir(&self, ctx: &Context, handle: DirHandle) -> Result<Option<DirEntry>, FsError> {
        const OP: &str = "readdir";
        self.gate(ctx, OP)?;
        ctx.state().update_dir(handle, OP, |r| {
            if r.exhausted() {
                return None;
            }
            let entry = r.entries[r.position].clone();
            r.position += 1;
            Some(entry)
        })
    }

    /// Release a directory handle.
    pub fn closedir(&self, ctx: &Context, handle: DirHandle) -> Result<(), FsError> {
        const OP: &str = "closedir";
        self.gate(ctx, OP)?;
        ctx.state().close_dir(handle, OP)
    }

    // ------------------------------------------------------------------
    // Path operations
    // ------------------------------------------------------------------

    /// Create a directory. The parent must exist.
    pub fn mkdir(&self, ctx: &Context, path: impl AsRef<Path>) -> Result<(), FsError> {
        let driver = self.gate(ctx, "mkdir")?;
        driver.create_dir(&normalize(path.as_ref()))
    }

    /// Whether `path` names a directory.
    pub fn direxists(&self, ctx: &Context, path: impl AsRef<Path>) -> Result<bool, FsError> {
        let driver = self.gate(ctx, "direxists")?;
        driver.is_dir(&normalize(path.as_ref()))
    }

    /// Metadata for `path`, without opening it.
    pub fn stat(&self, ctx: &Context, path: impl AsRef<Path>) -> Result<Stat, FsError> {
        let driver = self.gate(ctx, "stat")?;
        driver.stat(&normalize(path.as_ref()))
    }

    /// Remove a file or an empty directory.
    pub fn unlink(&self, ctx: &Context, path: impl AsRef<Path>) -> Result<(), FsError> {
        let driver = self.gate(ctx, "unlink")?;
        driver.remove(&normalize(path.as_ref()))
    }

    /// Move `from` to `to`, replacing a file at `to`.
    pub fn rename(
        &self,
        ctx: &Context,
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
    ) -> Result<(), FsError> {
        let driver = self.gate(ctx, "rename")?;
        driver.rename(&normalize(from.as_ref()), &normalize(to.as_ref()))
    }
}
