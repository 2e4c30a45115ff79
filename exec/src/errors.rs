use bstr::BString;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::path::PathBuf;

/// Errors surfaced while building an input mapping.
///
/// Most variants point at a declaration the action owner can fix;
/// [Error::is_internal] singles out the ones that indicate a bug in the
/// surrounding build machinery instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The destination is absolute or otherwise not a well-formed
    /// sandbox-relative path. Destinations must always stay below the
    /// sandbox root, so this indicates a broken rule declaration.
    #[error("invalid input mapping destination \"{0}\": not a sandbox-relative path")]
    InvalidPath(BString),

    /// Strict mode found a plain input whose metadata is not a regular
    /// file. Directories in inputs break incremental correctness: their
    /// contents are not tracked as dependencies, so changes inside them
    /// would not invalidate the action.
    #[error("not a file: {0}")]
    ForbiddenInput(PathBuf),

    /// A fileset declared a relative symlink pointing outside the fileset
    /// root, and the configured policy is
    /// [RelativeSymlinkPolicy::Error](crate::RelativeSymlinkPolicy::Error).
    #[error("fileset symlink \"{name}\" -> \"{target}\" resolves outside the fileset root")]
    ForbiddenRelativeSymlink { name: BString, target: BString },

    /// A tree or fileset artifact was named in the spawn but never
    /// registered with the [ArtifactExpander](crate::expand::ArtifactExpander).
    /// The dependency graph upstream is inconsistent.
    #[error("no expansion registered for {0}")]
    MissingExpansion(Artifact),

    /// Metadata lookup failure, propagated unchanged. The engine does not
    /// retry; callers own retry and backoff.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that are invariant violations of the surrounding
    /// system rather than something the action owner can fix. These are
    /// reported as engine bugs, not as invalid action inputs.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::MissingExpansion(_))
    }
}
