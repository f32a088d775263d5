//! Project scope: which files belong to the analyzed project.
//!
//! Containment is decided lexically on normalized absolute paths, one path
//! segment at a time. Nothing is read from disk, so paths of files that no
//! longer exist (or never did, as in synthetic trees) are classified the same
//! way as real ones.

use std::path::{Component, Path, PathBuf};

/// The root of the analyzed project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    root: PathBuf,
}

impl ProjectScope {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
        }
    }

    /// Normalized absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True iff `path` lies under the project root.
    ///
    /// Segment-aware: with root `/p/proj`, `/p/proj/x.c` is inside but
    /// `/p/proj2/x.c` is not, even though the strings share a prefix.
    pub fn is_in_project(&self, path: impl AsRef<Path>) -> bool {
        normalize(path.as_ref()).starts_with(&self.root)
    }

    /// Path relative to the project root, if it lies inside it.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }
}

/// Make `path` absolute against the current directory and fold `.`/`..` lexically.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
