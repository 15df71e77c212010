//! Host-directory driver.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::paths::relative;
use crate::{
    Attributes, DirEntry, DriverDir, DriverRead, DriverWrite, FileKind, FsError, Stat, normalize,
};

/// Serves a directory of the host filesystem through `std::fs`.
///
/// Virtual paths are normalized and joined under the root, so `..` cannot
/// climb above it. Symbolic links inside the root are followed.
#[derive(Debug, Clone)]
pub struct HostDriver {
    root: PathBuf,
}

impl HostDriver {
    /// Serve `root`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Config`] if `root` does not exist or is not a directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let given = root.as_ref();
        let root = given
            .canonicalize()
            .map_err(|e| FsError::config(format!("root `{}`: {e}", given.display())))?;
        if !root.is_dir() {
            return Err(FsError::config(format!(
                "root `{}` is not a directory",
                given.display()
            )));
        }
        Ok(Self { root })
    }

    /// Canonical host directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host(&self, path: &Path) -> PathBuf {
        self.root.join(relative(&normalize(path)))
    }
}

fn io<'a>(
    operation: &'static str,
    path: &'a Path,
) -> impl FnOnce(std::io::Error) -> FsError + 'a {
    move |e| FsError::from(e).at(operation, path)
}

fn stat_of(meta: &fs::Metadata) -> Stat {
    let mut attributes = if meta.is_dir() {
        Attributes::DIRECTORY
    } else {
        Attributes::NONE
    };
    if meta.permissions().readonly() {
        attributes = attributes | Attributes::READ_ONLY;
    }
    Stat {
        kind: if meta.is_dir() {
            FileKind::Directory
        } else {
            FileKind::File
        },
        size: if meta.is_dir() { 0 } else { meta.len() },
        attributes,
        modified: meta.modified().ok(),
    }
}

impl DriverRead for HostDriver {
    fn stat(&self, path: &Path) -> Result<Stat, FsError> {
        let meta = fs::metadata(self.host(path)).map_err(io("stat", path))?;
        Ok(stat_of(&meta))
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let host = self.host(path);
        if host.is_dir() {
            return Err(FsError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        let mut file = File::open(&host).map_err(io("read", path))?;
        file.seek(SeekFrom::Start(offset)).map_err(io("read", path))?;

        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(io("read", path)(e)),
            }
        }
        Ok(total)
    }
}

impl DriverWrite for HostDriver {
    fn create(&self, path: &Path) -> Result<(), FsError> {
        let host = self.host(path);
        if host.is_dir() {
            return Err(FsError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&host)
            .map_err(io("create", path))?;
        Ok(())
    }

    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(self.host(path))
            .map_err(io("write", path))?;
        file.seek(SeekFrom::Start(offset)).map_err(io("write", path))?;
        file.write_all(data).map_err(io("write", path))?;
        Ok(data.len())
    }

    fn set_len(&self, path: &Path, len: u64) -> Result<(), FsError> {
        OpenOptions::new()
            .write(true)
            .open(self.host(path))
            .and_then(|file| file.set_len(len))
            .map_err(io("set_len", path))
    }

    fn flush(&self, path: &Path) -> Result<(), FsError> {
        File::open(self.host(path))
            .and_then(|file| file.sync_data())
            .map_err(io("flush", path))
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        let host = self.host(path);
        if host == self.root {
            return Err(FsError::PermissionDenied {
                path: path.to_path_buf(),
                operation: "remove",
            });
        }
        let meta = fs::symlink_metadata(&host).map_err(io("remove", path))?;
        if meta.is_dir() {
            fs::remove_dir(&host).map_err(io("remove", path))
        } else {
            fs::remove_file(&host).map_err(io("remove", path))
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let (source, target) = (self.host(from), self.host(to));
        if source == self.root {
            return Err(FsError::PermissionDenied {
                path: from.to_path_buf(),
                operation: "rename",
            });
        }
        if target.is_dir() && source != target {
            return Err(FsError::AlreadyExists {
                path: to.to_path_buf(),
                operation: "rename",
            });
        }
        fs::rename(&source, &target).map_err(io("rename", from))
    }
}

impl DriverDir for HostDriver {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let host = self.host(path);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&host).map_err(io("list", path))? {
            let entry = entry.map_err(io("list", path))?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let entry = match entry.metadata() {
                Ok(meta) => DirEntry::from_stat(name, &stat_of(&meta)),
                Err(_) => DirEntry {
                    name,
                    kind: FileKind::File,
                    size: DirEntry::UNKNOWN_SIZE,
                    attributes: Attributes::NONE,
                    modified: None,
                },
            };
            entries.push(entry);
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir(self.host(path)).map_err(io("create_dir", path))
    }
}
