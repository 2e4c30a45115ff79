use std::fmt::{self, Display};

use crate::path::{Path, PathBuf};

/// The three shapes an artifact can take. The set is closed; every
/// dispatch on it is an exhaustive `match` so a new kind can not be added
/// without revisiting each expansion site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// A single regular file.
    File,
    /// A directory-valued artifact whose member files are only known
    /// after the producing action ran; expanded lazily through an
    /// [ArtifactExpander](crate::expand::ArtifactExpander).
    Tree,
    /// An artifact whose content is a set of symlink declarations rather
    /// than literal files.
    Fileset,
}

/// A declared build input or output, identified by its exec-root-relative
/// path and its [ArtifactKind].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    exec_path: PathBuf,
    kind: ArtifactKind,
}

impl Artifact {
    pub fn file(exec_path: PathBuf) -> Self {
        Self {
            exec_path,
            kind: ArtifactKind::File,
        }
    }

    pub fn tree(exec_path: PathBuf) -> Self {
        Self {
            exec_path,
            kind: ArtifactKind::Tree,
        }
    }

    pub fn fileset(exec_path: PathBuf) -> Self {
        Self {
            exec_path,
            kind: ArtifactKind::Fileset,
        }
    }

    pub fn exec_path(&self) -> &Path {
        &self.exec_path
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ArtifactKind::File => "file",
            ArtifactKind::Tree => "tree",
            ArtifactKind::Fileset => "fileset",
        };
        write!(f, "{} artifact {}", kind, self.exec_path)
    }
}
