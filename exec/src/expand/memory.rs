use std::collections::HashMap;

use tracing::instrument;

use super::{ArtifactExpander, FileType, MetadataProvider};
use crate::artifact::Artifact;
use crate::fileset::FilesetSymlink;
use crate::input::Input;
use crate::path::PathBuf;
use crate::Error;

/// In-memory expansion registry, keyed by artifact exec path. The
/// surrounding machinery records tree and fileset contents here as the
/// producing actions finish; mapping calls then read them back.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactExpander {
    trees: HashMap<PathBuf, Vec<PathBuf>>,
    filesets: HashMap<PathBuf, Vec<FilesetSymlink>>,
}

impl MemoryArtifactExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the member files of `tree`, as tree-root-relative paths.
    pub fn insert_tree(&mut self, tree: &Artifact, members: Vec<PathBuf>) {
        self.trees.insert(tree.exec_path().to_owned(), members);
    }

    /// Records the symlink declarations of `fileset`.
    pub fn insert_fileset(&mut self, fileset: &Artifact, links: Vec<FilesetSymlink>) {
        self.filesets.insert(fileset.exec_path().to_owned(), links);
    }
}

impl ArtifactExpander for MemoryArtifactExpander {
    #[instrument(skip(self), fields(artifact = %tree))]
    fn tree_members(&self, tree: &Artifact) -> Result<Vec<PathBuf>, Error> {
        self.trees
            .get(tree.exec_path())
            .cloned()
            .ok_or_else(|| Error::MissingExpansion(tree.clone()))
    }

    #[instrument(skip(self), fields(artifact = %fileset))]
    fn fileset_links(&self, fileset: &Artifact) -> Result<Vec<FilesetSymlink>, Error> {
        self.filesets
            .get(fileset.exec_path())
            .cloned()
            .ok_or_else(|| Error::MissingExpansion(fileset.clone()))
    }
}

/// In-memory metadata, backed by recorded file types. Anything never
/// recorded answers [FileType::Absent], like a metadata cache with no
/// entry for the input.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataProvider {
    types: HashMap<PathBuf, FileType>,
}

impl MemoryMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, exec_path: PathBuf, file_type: FileType) {
        self.types.insert(exec_path, file_type);
    }
}

impl MetadataProvider for MemoryMetadataProvider {
    fn file_type(&self, input: &Input) -> std::io::Result<FileType> {
        Ok(match input {
            Input::File { exec_path } | Input::TreeFile { exec_path, .. } => self
                .types
                .get(exec_path)
                .copied()
                .unwrap_or(FileType::Absent),
            Input::ResolvedFile { .. } | Input::Empty => FileType::Absent,
        })
    }
}
