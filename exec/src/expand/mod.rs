//! The capability interfaces the mapping engine consumes.
//!
//! Both are passed explicitly per call rather than resolved through any
//! ambient registry, which keeps the engine trivially testable with the
//! in-memory implementations below.
use crate::artifact::Artifact;
use crate::fileset::FilesetSymlink;
use crate::input::Input;
use crate::path::PathBuf;
use crate::Error;

mod memory;
pub use memory::{MemoryArtifactExpander, MemoryMetadataProvider};

/// Supplies the lazily-discovered contents of tree and fileset artifacts.
/// Implementations are pure lookups into already-recorded expansions; the
/// engine never triggers discovery itself.
pub trait ArtifactExpander: Send + Sync {
    /// The member files of a tree artifact, as paths relative to the tree
    /// root. Fails with [Error::MissingExpansion] if `tree` was never
    /// registered for expansion.
    fn tree_members(&self, tree: &Artifact) -> Result<Vec<PathBuf>, Error>;

    /// The ordered symlink declarations of a fileset artifact. Fails with
    /// [Error::MissingExpansion] if `fileset` was never registered.
    fn fileset_links(&self, fileset: &Artifact) -> Result<Vec<FilesetSymlink>, Error>;
}

impl<A> ArtifactExpander for A
where
    A: AsRef<dyn ArtifactExpander> + Send + Sync,
{
    fn tree_members(&self, tree: &Artifact) -> Result<Vec<PathBuf>, Error> {
        self.as_ref().tree_members(tree)
    }

    fn fileset_links(&self, fileset: &Artifact) -> Result<Vec<FilesetSymlink>, Error> {
        self.as_ref().fileset_links(fileset)
    }
}

/// What kind of filesystem object an input currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
    /// No metadata recorded for the input.
    Absent,
}

impl FileType {
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }
}

/// Answers type metadata queries for inputs. Only consulted in strict
/// mode. The lookup may block on I/O; the engine treats it as a plain
/// synchronous call and propagates its errors unchanged.
pub trait MetadataProvider: Send + Sync {
    fn file_type(&self, input: &Input) -> std::io::Result<FileType>;
}

impl<M> MetadataProvider for M
where
    M: AsRef<dyn MetadataProvider> + Send + Sync,
{
    fn file_type(&self, input: &Input) -> std::io::Result<FileType> {
        self.as_ref().file_type(input)
    }
}
