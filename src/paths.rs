//! Lexical path normalization shared by drivers.
//!
//! Drivers receive paths exactly as the host passed them. Before touching
//! storage they reduce them to a canonical absolute form: a leading `/`,
//! no `.` components, `..` resolved lexically (clamped at the root), and
//! no trailing slash.

use std::path::{Component, Path, PathBuf};

/// Normalize `path` to the canonical absolute form.
///
/// ```rust
/// use dmfsi::normalize;
/// use std::path::Path;
///
/// assert_eq!(normalize(Path::new("a/./b/../c/")), Path::new("/a/c"));
/// assert_eq!(normalize(Path::new("/../..")), Path::new("/"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(name) => out.push(name),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Split a normalized path into its parent and final name.
///
/// Returns `None` for the root.
pub fn split_parent(path: &Path) -> Option<(&Path, &str)> {
    let name = path.file_name()?.to_str()?;
    Some((path.parent()?, name))
}

/// Path relative to the root, suitable for joining under a host directory.
pub fn relative(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_forms() {
        assert_eq!(normalize(Path::new("")), Path::new("/"));
        assert_eq!(normalize(Path::new("/")), Path::new("/"));
        assert_eq!(normalize(Path::new(".")), Path::new("/"));
    }

    #[test]
    fn relative_becomes_absolute() {
        assert_eq!(normalize(Path::new("dir/file")), Path::new("/dir/file"));
    }

    #[test]
    fn dot_components_are_removed() {
        assert_eq!(normalize(Path::new("/a/./b/.")), Path::new("/a/b"));
    }

    #[test]
    fn parent_is_resolved_and_clamped() {
        assert_eq!(normalize(Path::new("/a/b/../c")), Path::new("/a/c"));
        assert_eq!(normalize(Path::new("/a/../../..")), Path::new("/"));
        assert_eq!(normalize(Path::new("../etc/passwd")), Path::new("/etc/passwd"));
    }

    #[test]
    fn trailing_and_double_slashes() {
        assert_eq!(normalize(Path::new("/a//b/")), Path::new("/a/b"));
    }

    #[test]
    fn split_parent_works() {
        assert_eq!(
            split_parent(Path::new("/a/b")),
            Some((Path::new("/a"), "b"))
        );
        assert_eq!(split_parent(Path::new("/a")), Some((Path::new("/"), "a")));
        assert_eq!(split_parent(Path::new("/")), None);
    }

    #[test]
    fn relative_strips_root() {
        assert_eq!(relative(Path::new("/a/b")), Path::new("a/b"));
        assert_eq!(relative(Path::new("/")), Path::new(""));
    }
}
