//! Core value types of the DMFSI contract.

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

/// Interface version implemented by every backend in this crate.
pub const DMFSI_VERSION: Version = Version::new(1, 0);

/// A `(major, minor)` compatibility pair.
///
/// Ordering is lexicographic: major first, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    /// Incompatible changes bump this.
    pub major: u16,
    /// Backwards-compatible additions bump this.
    pub minor: u16,
}

impl Version {
    /// Create a version.
    #[inline]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Version constraint used when resolving an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionReq {
    /// Exactly this `(major, minor)`.
    Exact(Version),
    /// Same major, minor at least the given one. The highest match wins.
    Compatible(Version),
}

impl VersionReq {
    /// Whether `version` satisfies this requirement.
    pub fn matches(&self, version: Version) -> bool {
        match *self {
            VersionReq::Exact(v) => v == version,
            VersionReq::Compatible(v) => v.major == version.major && version.minor >= v.minor,
        }
    }

    /// The major version this requirement binds to.
    #[inline]
    pub fn major(&self) -> u16 {
        match *self {
            VersionReq::Exact(v) | VersionReq::Compatible(v) => v.major,
        }
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReq::Exact(v) => write!(f, "={v}"),
            VersionReq::Compatible(v) => write!(f, "^{v}"),
        }
    }
}

/// Per-backend context sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic(pub u32);

impl Magic {
    /// 'DMDF': driver-backed filesystem.
    pub const DMDFS: Magic = Magic(0x444D_4446);
    /// 'DMDV': device filesystem.
    pub const DMDEVFS: Magic = Magic(0x444D_4456);
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Process-unique identity of a context. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u64);

/// An open file stream, owned by the context that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle {
    /// Owning context.
    pub context: ContextId,
    /// Identity within the owning context.
    pub id: u64,
}

/// An open directory iteration cursor, owned by the context that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirHandle {
    /// Owning context.
    pub context: ContextId,
    /// Identity within the owning context.
    pub id: u64,
}

/// Access mode for [`fopen`](crate::Interface::fopen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenMode {
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
    /// Create the file if it does not exist.
    pub create: bool,
    /// Truncate to zero length on open.
    pub truncate: bool,
    /// Every write goes to the end of the file.
    pub append: bool,
    /// Fail if the file already exists (requires `create`).
    pub exclusive: bool,
}

impl OpenMode {
    /// `"r"`: read an existing file.
    pub const READ: Self = Self {
        read: true,
        write: false,
        create: false,
        truncate: false,
        append: false,
        exclusive: false,
    };

    /// `"w"`: write, create and truncate.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: true,
        append: false,
        exclusive: false,
    };

    /// `"r+"`: read and write an existing file.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        create: false,
        truncate: false,
        append: false,
        exclusive: false,
    };

    /// `"a"`: append, create if missing.
    pub const APPEND: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: false,
        append: true,
        exclusive: false,
    };

    /// Parse a C `fopen` mode string (`r`, `w`, `a`, optionally followed by
    /// `+`, `b` and `x` in any order).
    ///
    /// ```rust
    /// use dmfsi::OpenMode;
    ///
    /// assert_eq!(OpenMode::from_flags("rb"), Some(OpenMode::READ));
    /// assert!(OpenMode::from_flags("w+").unwrap().read);
    /// assert_eq!(OpenMode::from_flags("q"), None);
    /// ```
    pub fn from_flags(flags: &str) -> Option<Self> {
        let mut chars = flags.chars();
        let mut mode = match chars.next()? {
            'r' => Self::READ,
            'w' => Self::WRITE,
            'a' => Self::APPEND,
            _ => return None,
        };
        for c in chars {
            match c {
                '+' => {
                    mode.read = true;
                    mode.write = true;
                }
                'b' => {}
                'x' if mode.create => mode.exclusive = true,
                _ => return None,
            }
        }
        Some(mode)
    }
}

/// Attribute bits recorded on open files and reported by `stat`/`readdir`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes(pub u32);

impl Attributes {
    /// No attributes.
    pub const NONE: Self = Self(0);
    /// Writes are refused.
    pub const READ_ONLY: Self = Self(0x01);
    /// Hidden from normal listings.
    pub const HIDDEN: Self = Self(0x02);
    /// System entry (e.g. a device node).
    pub const SYSTEM: Self = Self(0x04);
    /// Entry is a directory.
    pub const DIRECTORY: Self = Self(0x10);
    /// Modified since last archived.
    pub const ARCHIVE: Self = Self(0x20);

    /// Whether all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Attributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Seek origin for [`lseek`](crate::Interface::lseek).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Whence {
    /// From the start of the stream.
    Start,
    /// From the current cursor.
    Current,
    /// From the end of the stream.
    End,
}

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileKind {
    /// Regular file or device node.
    File,
    /// Directory.
    Directory,
}

/// A directory entry returned from `readdir`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Name of the entry (filename only, not full path).
    pub name: String,
    /// Kind of the entry.
    pub kind: FileKind,
    /// Size in bytes, or [`DirEntry::UNKNOWN_SIZE`].
    pub size: i64,
    /// Attribute bits.
    pub attributes: Attributes,
    /// Last modification time, when the backend tracks it.
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    /// Sentinel size for entries whose length the backend cannot supply.
    pub const UNKNOWN_SIZE: i64 = -1;

    /// Build an entry from a [`Stat`] result.
    pub fn from_stat(name: impl Into<String>, stat: &Stat) -> Self {
        Self {
            name: name.into(),
            kind: stat.kind,
            size: i64::try_from(stat.size).unwrap_or(Self::UNKNOWN_SIZE),
            attributes: stat.attributes,
            modified: stat.modified,
        }
    }
}

/// Metadata returned by `stat`; computable without an open handle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stat {
    /// Kind of the entry.
    pub kind: FileKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Attribute bits.
    pub attributes: Attributes,
    /// Last modification time, when the backend tracks it.
    pub modified: Option<SystemTime>,
}

impl Stat {
    /// Stat for a regular file of `size` bytes.
    pub fn file(size: u64) -> Self {
        Self {
            kind: FileKind::File,
            size,
            attributes: Attributes::NONE,
            modified: None,
        }
    }

    /// Stat for a directory.
    pub fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            size: 0,
            attributes: Attributes::DIRECTORY,
            modified: None,
        }
    }

    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// What [`size`](crate::Interface::size) measures: an open stream or a path.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// An open file.
    Handle(FileHandle),
    /// A path, resolved without opening it.
    Path(&'a Path),
}

impl From<FileHandle> for Target<'_> {
    fn from(handle: FileHandle) -> Self {
        Target::Handle(handle)
    }
}

impl<'a> From<&'a Path> for Target<'a> {
    fn from(path: &'a Path) -> Self {
        Target::Path(path)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(path: &'a str) -> Self {
        Target::Path(Path::new(path))
    }
}
