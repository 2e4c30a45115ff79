use crate::path::PathBuf;

/// What a destination path in an input mapping points at.
/// An Input carries no content, only enough identity for a spawn strategy
/// to materialize it (copy, hardlink, or request over the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Input {
    /// A regular file artifact, located by its path relative to the
    /// execution root.
    File {
        exec_path: PathBuf,
    },
    /// One expanded member of a tree artifact. `tree_path` is the member's
    /// path relative to the root of the tree artifact it came from,
    /// `exec_path` its full exec-root-relative location.
    TreeFile {
        exec_path: PathBuf,
        tree_path: PathBuf,
    },
    /// A regular file named by a resolved fileset symlink target. Fileset
    /// targets may legitimately point outside the execution root, so this
    /// carries an absolute host path.
    ResolvedFile {
        path: std::path::PathBuf,
    },
    /// The empty marker: a declared entry with no backing artifact. The
    /// consumer creates an empty file or placeholder at the destination,
    /// never omits it.
    Empty,
}

impl Input {
    pub fn is_empty_marker(&self) -> bool {
        matches!(self, Input::Empty)
    }
}
