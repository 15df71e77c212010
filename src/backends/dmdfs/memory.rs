//! In-memory tree driver.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::paths::split_parent;
use crate::{
    Attributes, DirEntry, DriverDir, DriverRead, DriverWrite, FileKind, FsError, Stat, normalize,
};

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Dir { modified: SystemTime },
}

impl Node {
    fn stat(&self) -> Stat {
        match self {
            Node::File { data, modified } => Stat {
                kind: FileKind::File,
                size: data.len() as u64,
                attributes: Attributes::ARCHIVE,
                modified: Some(*modified),
            },
            Node::Dir { modified } => Stat {
                modified: Some(*modified),
                ..Stat::directory()
            },
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: BTreeMap<PathBuf, Node>,
    used: u64,
}

impl Tree {
    fn file_mut(&mut self, path: &Path) -> Result<&mut Vec<u8>, FsError> {
        match self.nodes.get_mut(path) {
            Some(Node::File { data, modified }) => {
                *modified = SystemTime::now();
                Ok(data)
            }
            Some(Node::Dir { .. }) => Err(FsError::NotAFile {
                path: path.to_path_buf(),
            }),
            None => Err(FsError::NotFound {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The parent of `path` must be an existing directory.
    fn check_parent(&self, path: &Path) -> Result<(), FsError> {
        let Some((parent, _)) = split_parent(path) else {
            return Ok(());
        };
        match self.nodes.get(parent) {
            Some(Node::Dir { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(FsError::NotADirectory {
                path: parent.to_path_buf(),
            }),
            None => Err(FsError::NotFound {
                path: parent.to_path_buf(),
            }),
        }
    }

    /// `path` and everything below it, in order.
    fn subtree(&self, path: &Path) -> Vec<PathBuf> {
        self.nodes
            .range::<Path, _>((Bound::Included(path), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(path))
            .cloned()
            .collect()
    }

    fn has_children(&self, path: &Path) -> bool {
        self.nodes
            .range::<Path, _>((Bound::Excluded(path), Bound::Unbounded))
            .next()
            .is_some_and(|(key, _)| key.starts_with(path))
    }
}

/// Volatile filesystem held in a sorted map keyed by normalized path.
///
/// The root directory always exists. An optional byte quota caps the total
/// size of all files; writes that would exceed it come back short. A write
/// or `set_len` may zero-fill at most [`MAX_GAP`] bytes past the current end
/// of a file.
#[derive(Debug)]
pub struct MemoryDriver {
    tree: RwLock<Tree>,
    capacity: Option<u64>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDriver {
    /// An empty tree with no quota.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node::Dir {
                modified: SystemTime::now(),
            },
        );
        Self {
            tree: RwLock::new(Tree { nodes, used: 0 }),
            capacity: None,
        }
    }

    /// An empty tree holding at most `bytes` of file data.
    pub fn with_capacity(bytes: u64) -> Self {
        Self {
            capacity: Some(bytes),
            ..Self::new()
        }
    }

    /// Total bytes of file data stored.
    pub fn used(&self) -> u64 {
        self.tree.read().used
    }

    fn room(&self, tree: &Tree) -> u64 {
        self.capacity
            .map_or(u64::MAX, |cap| cap.saturating_sub(tree.used))
    }
}

/// Largest run of zeros a single call may add past the end of a file.
pub const MAX_GAP: usize = 16 << 20;

fn check_gap(data: &[u8], from: usize) -> Result<(), FsError> {
    if from.saturating_sub(data.len()) > MAX_GAP {
        return Err(FsError::AllocationFailure {
            what: "zero-filled gap",
        });
    }
    Ok(())
}

fn grow(data: &mut Vec<u8>, len: usize) -> Result<(), FsError> {
    if len > data.len() {
        data.try_reserve(len - data.len())
            .map_err(|_| FsError::AllocationFailure { what: "file data" })?;
        data.resize(len, 0);
    }
    Ok(())
}

fn too_large(path: &Path) -> FsError {
    FsError::Backend(format!("{}: file too large", path.display()))
}

impl DriverRead for MemoryDriver {
    fn stat(&self, path: &Path) -> Result<Stat, FsError> {
        let path = normalize(path);
        self.tree
            .read()
            .nodes
            .get(&path)
            .map(Node::stat)
            .ok_or(FsError::NotFound { path })
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        let path = normalize(path);
        let tree = self.tree.read();
        match tree.nodes.get(&path) {
            Some(Node::File { data, .. }) => {
                let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
                let n = buf.len().min(data.len() - start);
                buf[..n].copy_from_slice(&data[start..start + n]);
                Ok(n)
            }
            Some(Node::Dir { .. }) => Err(FsError::NotAFile { path }),
            None => Err(FsError::NotFound { path }),
        }
    }
}

impl DriverWrite for MemoryDriver {
    fn create(&self, path: &Path) -> Result<(), FsError> {
        let path = normalize(path);
        let mut tree = self.tree.write();
        match tree.nodes.get(&path) {
            Some(Node::File { .. }) => return Ok(()),
            Some(Node::Dir { .. }) => return Err(FsError::NotAFile { path }),
            None => {}
        }
        tree.check_parent(&path)?;
        tree.nodes.insert(
            path,
            Node::File {
                data: Vec::new(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        let path = normalize(path);
        let mut tree = self.tree.write();
        let room = self.room(&tree);
        let file = tree.file_mut(&path)?;

        let old_len = file.len() as u64;
        let limit = old_len.saturating_add(room);
        let n = if offset >= limit {
            0
        } else {
            (data.len() as u64).min(limit - offset) as usize
        };
        if n == 0 {
            return Ok(0);
        }

        let start = usize::try_from(offset).map_err(|_| too_large(&path))?;
        check_gap(file, start)?;
        grow(file, start + n)?;
        file[start..start + n].copy_from_slice(&data[..n]);
        let new_len = file.len() as u64;
        tree.used += new_len - old_len;
        Ok(n)
    }

    fn set_len(&self, path: &Path, len: u64) -> Result<(), FsError> {
        let path = normalize(path);
        let mut tree = self.tree.write();
        let room = self.room(&tree);
        let file = tree.file_mut(&path)?;

        let old_len = file.len() as u64;
        if len > old_len.saturating_add(room) {
            return Err(FsError::Backend(format!(
                "{}: no space left for {len} bytes",
                path.display()
            )));
        }
        let target = usize::try_from(len).map_err(|_| too_large(&path))?;
        if len < old_len {
            file.truncate(target);
            file.shrink_to_fit();
        } else {
            check_gap(file, target)?;
            grow(file, target)?;
        }
        tree.used = tree.used - old_len + len;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), FsError> {
        let path = normalize(path);
        if path == Path::new("/") {
            return Err(FsError::PermissionDenied {
                path,
                operation: "remove",
            });
        }
        let mut tree = self.tree.write();
        match tree.nodes.get(&path) {
            None => return Err(FsError::NotFound { path }),
            Some(Node::Dir { .. }) if tree.has_children(&path) => {
                return Err(FsError::DirectoryNotEmpty { path });
            }
            Some(_) => {}
        }
        if let Some(Node::File { data, .. }) = tree.nodes.remove(&path) {
            tree.used -= data.len() as u64;
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let (from, to) = (normalize(from), normalize(to));
        if from == Path::new("/") {
            return Err(FsError::PermissionDenied {
                path: from,
                operation: "rename",
            });
        }
        let mut tree = self.tree.write();
        let source_is_dir = match tree.nodes.get(&from) {
            None => return Err(FsError::NotFound { path: from }),
            Some(node) => matches!(node, Node::Dir { .. }),
        };
        if from == to {
            return Ok(());
        }
        if to.starts_with(&from) {
            return Err(FsError::Backend(format!(
                "cannot move {} into itself",
                from.display()
            )));
        }
        tree.check_parent(&to)?;
        let replaced = match tree.nodes.get(&to) {
            Some(Node::File { data, .. }) if !source_is_dir => data.len() as u64,
            Some(_) => {
                return Err(FsError::AlreadyExists {
                    path: to,
                    operation: "rename",
                });
            }
            None => 0,
        };
        tree.used -= replaced;

        for old in tree.subtree(&from) {
            if let Some(node) = tree.nodes.remove(&old) {
                let suffix = old.strip_prefix(&from).unwrap_or(Path::new(""));
                let new = if suffix.as_os_str().is_empty() {
                    to.clone()
                } else {
                    to.join(suffix)
                };
                tree.nodes.insert(new, node);
            }
        }
        Ok(())
    }
}

impl DriverDir for MemoryDriver {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let path = normalize(path);
        let tree = self.tree.read();
        match tree.nodes.get(&path) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => return Err(FsError::NotADirectory { path }),
            None => return Err(FsError::NotFound { path }),
        }
        let entries = tree
            .nodes
            .range::<Path, _>((Bound::Excluded(path.as_path()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&path))
            .filter(|(key, _)| key.parent() == Some(path.as_path()))
            .filter_map(|(key, node)| {
                let name = key.file_name()?.to_str()?;
                Some(DirEntry::from_stat(name, &node.stat()))
            })
            .collect();
        Ok(entries)
    }

    fn create_dir(&self, path: &Path) -> Result<(), FsError> {
        let path = normalize(path);
        let mut tree = self.tree.write();
        if tree.nodes.contains_key(&path) {
            return Err(FsError::AlreadyExists {
                path,
                operation: "create_dir",
            });
        }
        tree.check_parent(&path)?;
        tree.nodes.insert(
            path,
            Node::Dir {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }
}
