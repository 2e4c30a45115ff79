use crate::artifact::Artifact;
use crate::fileset::FilesetSymlink;
use crate::runfiles::RunfilesTree;

/// The action-level view of one subprocess request, reduced to what the
/// mapping engine needs. A Spawn is plain data assembled by the caller;
/// the engine never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spawn {
    /// The action's direct input artifacts. Tree artifacts among these
    /// are expanded to file level; filesets never arrive through this
    /// list (they come in via `runfiles` or `fileset_mappings`).
    pub inputs: Vec<Artifact>,
    /// The runfiles the spawned binary expects at run time.
    pub runfiles: RunfilesTree,
    /// Filesets declared directly on the action, each with its symlink
    /// declarations, mounted at the fileset artifact's own exec path.
    /// Processed in order, after direct inputs and runfiles.
    pub fileset_mappings: Vec<(Artifact, Vec<FilesetSymlink>)>,
}

impl Spawn {
    pub fn new() -> Self {
        Self::default()
    }
}
