//! Error types and wire status codes for the DMFSI contract.

use std::path::PathBuf;

use crate::{Version, VersionReq, Whence};

/// Error type shared by the dispatcher, the context layer and every backend.
///
/// Every variant carries the context needed to diagnose it (path, operation,
/// handle or version). [`FsError::status`] collapses the taxonomy onto the
/// closed [`Status`] set for hosts that speak integer codes.
///
/// # Examples
///
/// ```rust
/// use dmfsi::{FsError, Status};
/// use std::path::PathBuf;
///
/// let err = FsError::NotFound { path: PathBuf::from("/missing") };
/// assert_eq!(err.to_string(), "not found: /missing");
/// assert_eq!(err.status(), Status::NotFound);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Gate errors
    /// Context is destroyed or was created by a different backend.
    #[error("{operation}: invalid context")]
    InvalidContext {
        /// The operation that was rejected.
        operation: &'static str,
    },

    /// Handle is closed, unknown, or owned by another context.
    #[error("{operation}: invalid handle: {handle}")]
    InvalidHandle {
        /// Raw identity of the rejected handle.
        handle: u64,
        /// The operation that was rejected.
        operation: &'static str,
    },

    // Path errors
    /// Path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Path already exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a file but found a directory.
    #[error("not a file: {path}")]
    NotAFile {
        /// The offending path.
        path: PathBuf,
    },

    /// Expected a directory but found something else.
    #[error("not a directory: {path}")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Directory is not empty.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty {
        /// The non-empty directory.
        path: PathBuf,
    },

    /// Access mode or mount options forbid the operation.
    #[error("{operation}: permission denied: {path}")]
    PermissionDenied {
        /// The path involved.
        path: PathBuf,
        /// The operation that was denied.
        operation: &'static str,
    },

    /// Seek would move the cursor before the start of the stream.
    #[error("invalid seek: offset {offset} from {whence:?}")]
    InvalidSeek {
        /// Requested offset.
        offset: i64,
        /// Seek origin.
        whence: Whence,
    },

    // Registration and lifecycle errors
    /// No implementation is registered under the requested name.
    #[error("implementation not found: {name}")]
    ImplementationNotFound {
        /// The requested implementation name.
        name: String,
    },

    /// Implementations exist but none satisfies the version requirement.
    #[error("version mismatch for {name}: requested {requested}, available {available}")]
    VersionMismatch {
        /// Implementation name.
        name: String,
        /// What the caller asked for.
        requested: VersionReq,
        /// Highest version on offer.
        available: Version,
    },

    /// The `(name, version)` pair is already registered.
    #[error("duplicate version: {name} {version}")]
    DuplicateVersion {
        /// Implementation name.
        name: String,
        /// Version already present.
        version: Version,
    },

    /// Memory could not be obtained.
    #[error("allocation failed: {what}")]
    AllocationFailure {
        /// What was being allocated.
        what: &'static str,
    },

    /// Backend or module configuration is malformed.
    #[error("config error: {reason}")]
    Config {
        /// Why the configuration was rejected.
        reason: String,
    },

    // Backend errors
    /// Operation is not supported by this backend.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Builds a [`FsError::Config`] from anything printable.
    pub fn config(reason: impl Into<String>) -> Self {
        FsError::Config {
            reason: reason.into(),
        }
    }

    /// Wire status for this error.
    pub fn status(&self) -> Status {
        match self {
            FsError::InvalidContext { .. } | FsError::InvalidHandle { .. } => Status::Invalid,
            FsError::NotFound { .. } | FsError::ImplementationNotFound { .. } => Status::NotFound,
            FsError::AllocationFailure { .. } => Status::Alloc,
            FsError::Config { .. } => Status::Config,
            FsError::VersionMismatch { .. } | FsError::DuplicateVersion { .. } => Status::Version,
            _ => Status::General,
        }
    }

    /// Attaches the operation and path to an error produced by a bare
    /// `io::Error` conversion.
    pub(crate) fn at(self, operation: &'static str, path: &std::path::Path) -> Self {
        match self {
            FsError::NotFound { .. } => FsError::NotFound {
                path: path.to_path_buf(),
            },
            FsError::AlreadyExists { .. } => FsError::AlreadyExists {
                path: path.to_path_buf(),
                operation,
            },
            FsError::PermissionDenied { .. } => FsError::PermissionDenied {
                path: path.to_path_buf(),
                operation,
            },
            FsError::NotAFile { .. } => FsError::NotAFile {
                path: path.to_path_buf(),
            },
            FsError::NotADirectory { .. } => FsError::NotADirectory {
                path: path.to_path_buf(),
            },
            FsError::DirectoryNotEmpty { .. } => FsError::DirectoryNotEmpty {
                path: path.to_path_buf(),
            },
            FsError::Io { source, .. } => FsError::Io {
                operation,
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound {
                path: PathBuf::new(),
            },
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied {
                path: PathBuf::new(),
                operation: "io",
            },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                path: PathBuf::new(),
                operation: "io",
            },
            std::io::ErrorKind::IsADirectory => FsError::NotAFile {
                path: PathBuf::new(),
            },
            std::io::ErrorKind::NotADirectory => FsError::NotADirectory {
                path: PathBuf::new(),
            },
            std::io::ErrorKind::DirectoryNotEmpty => FsError::DirectoryNotEmpty {
                path: PathBuf::new(),
            },
            _ => FsError::Io {
                operation: "io",
                path: PathBuf::new(),
                source: error,
            },
        }
    }
}

/// Closed set of status codes exposed at the module boundary.
///
/// The numeric values are stable and may be handed to C-style hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// Success.
    Ok = 0,
    /// Backend-specific failure.
    General = -1,
    /// Bad context or handle.
    Invalid = -2,
    /// Missing path, missing implementation or exhausted iteration.
    NotFound = -3,
    /// Allocation failure.
    Alloc = -4,
    /// Malformed configuration.
    Config = -5,
    /// Version conflict.
    Version = -6,
}

impl Status {
    /// Integer code of this status.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Parses an integer code.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::Ok),
            -1 => Some(Status::General),
            -2 => Some(Status::Invalid),
            -3 => Some(Status::NotFound),
            -4 => Some(Status::Alloc),
            -5 => Some(Status::Config),
            -6 => Some(Status::Version),
            _ => None,
        }
    }

    /// Status of an operation result.
    pub fn of<T>(result: &Result<T, FsError>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = FsError::NotFound {
            path: PathBuf::from("/missing"),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn invalid_context_display() {
        let err = FsError::InvalidContext { operation: "fopen" };
        assert_eq!(err.to_string(), "fopen: invalid context");
    }

    #[test]
    fn version_mismatch_display() {
        let err = FsError::VersionMismatch {
            name: "dmdfs".into(),
            requested: VersionReq::Compatible(Version::new(2, 0)),
            available: Version::new(1, 1),
        };
        assert_eq!(
            err.to_string(),
            "version mismatch for dmdfs: requested ^2.0, available 1.1"
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            FsError::InvalidHandle {
                handle: 3,
                operation: "fread"
            }
            .status(),
            Status::Invalid
        );
        assert_eq!(
            FsError::ImplementationNotFound { name: "x".into() }.status(),
            Status::NotFound
        );
        assert_eq!(FsError::config("bad").status(), Status::Config);
        assert_eq!(
            FsError::AllocationFailure { what: "context" }.status(),
            Status::Alloc
        );
        assert_eq!(FsError::Backend("boom".into()).status(), Status::General);
        assert_eq!(
            FsError::NotSupported { operation: "mkdir" }.status(),
            Status::General
        );
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            Status::Ok,
            Status::General,
            Status::Invalid,
            Status::NotFound,
            Status::Alloc,
            Status::Config,
            Status::Version,
        ] {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(42), None);
    }

    #[test]
    fn status_of_result() {
        let ok: Result<(), FsError> = Ok(());
        assert_eq!(Status::of(&ok), Status::Ok);
        let err: Result<(), FsError> = Err(FsError::InvalidContext { operation: "tell" });
        assert_eq!(Status::of(&err), Status::Invalid);
    }

    #[test]
    fn from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        assert!(matches!(FsError::from(io_err), FsError::NotFound { .. }));
    }

    #[test]
    fn from_io_other() {
        let io_err = std::io::Error::other("test");
        assert!(matches!(FsError::from(io_err), FsError::Io { .. }));
    }

    #[test]
    fn from_io_directory_kinds() {
        let io_err = std::io::Error::from(std::io::ErrorKind::DirectoryNotEmpty);
        let err = FsError::from(io_err).at("unlink", std::path::Path::new("/d"));
        assert_eq!(err.to_string(), "directory not empty: /d");
    }

    #[test]
    fn at_attaches_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err = FsError::from(io_err).at("stat", std::path::Path::new("/a"));
        assert_eq!(err.to_string(), "not found: /a");
    }
}
