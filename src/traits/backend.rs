//! The per-backend entry point registered with the dispatcher.

use crate::{Config, Driver, FsError, Magic};

/// A filesystem backend: the function table registered under a name and
/// version with the [`Registry`](crate::Registry).
///
/// A backend does not implement the file/directory contract itself. It
/// mounts a [`Driver`] per context, and the dispatcher implements the
/// contract (context gate, handle table, cursors) once on top of it.
///
/// # Example
///
/// ```rust
/// use dmfsi::{Backend, Config, Driver, FsError, Magic};
///
/// struct NullBackend;
///
/// impl Backend for NullBackend {
///     fn magic(&self) -> Magic {
///         Magic(0x4E55_4C4C)
///     }
///
///     fn mount(&self, _config: &mut Config) -> Result<Box<dyn Driver>, FsError> {
///         Err(FsError::NotSupported { operation: "mount" })
///     }
/// }
/// ```
pub trait Backend: Send + Sync {
    /// Sentinel stamped on every context this backend creates.
    fn magic(&self) -> Magic;

    /// Set up the backend-owned state for a new context.
    ///
    /// Consume the keys this backend understands from `config`; the
    /// dispatcher rejects whatever is left over.
    ///
    /// # Errors
    ///
    /// - [`FsError::Config`] for malformed or inconsistent settings
    /// - [`FsError::AllocationFailure`] if backing memory cannot be obtained
    fn mount(&self, config: &mut Config) -> Result<Box<dyn Driver>, FsError>;

    /// Release backend-owned state when its context is destroyed.
    ///
    /// The driver is dropped right after this returns. The default commits
    /// outstanding writes.
    fn unmount(&self, driver: &dyn Driver) -> Result<(), FsError> {
        driver.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_object_safe() {
        fn _check(_: &dyn Backend) {}
    }
}
