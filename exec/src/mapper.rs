//! Turning a spawn's declared inputs into one flat destination table.
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, error, instrument};

use crate::artifact::{Artifact, ArtifactKind};
use crate::expand::{ArtifactExpander, FileType, MetadataProvider};
use crate::fileset::{FilesetManifest, FilesetSymlink, RelativeSymlinkPolicy};
use crate::input::Input;
use crate::path::{Path, PathBuf};
use crate::runfiles::RunfilesTree;
use crate::spawn::Spawn;
use crate::Error;

/// The produced form of an input mapping: destination path below the
/// sandbox root to exactly one [Input], sorted by path. Sorting makes the
/// output stable for cache keys and reproducible sandbox listings.
pub type InputMapping = BTreeMap<PathBuf, Input>;

/// Flattens a [Spawn]'s direct inputs, runfiles and fileset mappings into
/// an [InputMapping]. The mapper performs no I/O of its own; it only
/// rearranges declared files into the layout the subprocess will see,
/// consulting the injected collaborators for tree/fileset contents and
/// (in strict mode) type metadata.
///
/// A mapper is immutable after construction and can serve many concurrent
/// mapping calls; each call builds its own table.
#[derive(Debug, Clone)]
pub struct InputMapper {
    exec_root: std::path::PathBuf,
    strict: bool,
    relative_symlink_policy: RelativeSymlinkPolicy,
}

impl InputMapper {
    /// Creates a mapper with the default relative symlink policy,
    /// [RelativeSymlinkPolicy::Error].
    ///
    /// With `strict` set, plain runfile entries whose metadata says they
    /// are not regular files are rejected. Directories smuggled in as
    /// plain inputs defeat change tracking (their contents are not
    /// dependencies, so edits inside them never invalidate the action),
    /// which is why every spawn strategy that can afford strict mode
    /// should run with it.
    pub fn new(exec_root: impl Into<std::path::PathBuf>, strict: bool) -> Self {
        Self::with_symlink_policy(exec_root, strict, RelativeSymlinkPolicy::default())
    }

    pub fn with_symlink_policy(
        exec_root: impl Into<std::path::PathBuf>,
        strict: bool,
        relative_symlink_policy: RelativeSymlinkPolicy,
    ) -> Self {
        Self {
            exec_root: exec_root.into(),
            strict,
            relative_symlink_policy,
        }
    }

    /// Converts the inputs and runfiles of `spawn` into a sorted map from
    /// destination paths below `base_directory` to [Input]s. Tree
    /// artifacts never appear in the result, only their expanded members,
    /// and the result contains no absent values: declared entries without
    /// a backing artifact become [Input::Empty].
    ///
    /// Direct inputs are written first, then runfiles, then the
    /// standalone fileset mappings; a later phase overwrites earlier
    /// entries at the same destination.
    #[instrument(skip_all, fields(base_directory = %base_directory, inputs = spawn.inputs.len()))]
    pub fn input_mapping(
        &self,
        spawn: &Spawn,
        expander: &dyn ArtifactExpander,
        metadata: &dyn MetadataProvider,
        base_directory: &Path,
    ) -> Result<InputMapping, Error> {
        let result = (|| -> Result<InputMapping, Error> {
            let mut map = InputMapping::new();
            self.add_inputs(&mut map, spawn, expander, base_directory)?;
            self.add_runfiles(&mut map, &spawn.runfiles, expander, metadata, base_directory)?;
            for (fileset, links) in &spawn.fileset_mappings {
                self.add_fileset_entries(&mut map, links, fileset.exec_path(), base_directory)?;
            }
            Ok(map)
        })();

        if let Err(e) = &result {
            if e.is_internal() {
                error!(error = %e, "input mapping hit an internal invariant violation");
            }
        }

        result
    }

    /// Expands only `runfiles` into a fresh mapping, without the direct
    /// inputs or fileset mappings of a full spawn.
    pub fn runfiles_mapping(
        &self,
        runfiles: &RunfilesTree,
        expander: &dyn ArtifactExpander,
        metadata: &dyn MetadataProvider,
        base_directory: &Path,
    ) -> Result<InputMapping, Error> {
        let mut map = InputMapping::new();
        self.add_runfiles(&mut map, runfiles, expander, metadata, base_directory)?;
        Ok(map)
    }

    /// Adds the spawn's direct inputs, expanding tree artifacts to file
    /// level. Destinations are the artifacts' own exec paths.
    fn add_inputs(
        &self,
        map: &mut InputMapping,
        spawn: &Spawn,
        expander: &dyn ArtifactExpander,
        base_directory: &Path,
    ) -> Result<(), Error> {
        for artifact in &spawn.inputs {
            match artifact.kind() {
                ArtifactKind::File => {
                    add_mapping(
                        map,
                        base_directory.join(artifact.exec_path()),
                        Input::File {
                            exec_path: artifact.exec_path().to_owned(),
                        },
                    );
                }
                ArtifactKind::Tree => {
                    add_tree_members(
                        map,
                        artifact,
                        expander,
                        base_directory.join(artifact.exec_path()),
                    )?;
                }
                ArtifactKind::Fileset => {
                    // Filesets only arrive via runfiles or the standalone
                    // fileset mappings.
                    debug!(artifact = %artifact, "fileset among direct inputs, left to its fileset mapping");
                }
            }
        }
        Ok(())
    }

    /// Adds runfiles entries to `map`, dispatching on the kind of the
    /// backing artifact. Entries without one materialize as
    /// [Input::Empty].
    fn add_runfiles(
        &self,
        map: &mut InputMapping,
        runfiles: &RunfilesTree,
        expander: &dyn ArtifactExpander,
        metadata: &dyn MetadataProvider,
        base_directory: &Path,
    ) -> Result<(), Error> {
        for (root, paths) in runfiles.mappings() {
            for (path, artifact) in paths {
                let location = root.join(path);
                match artifact {
                    None => add_mapping(map, base_directory.join(&location), Input::Empty),
                    Some(artifact) => match artifact.kind() {
                        ArtifactKind::Tree => {
                            add_tree_members(
                                map,
                                artifact,
                                expander,
                                base_directory.join(&location),
                            )?;
                        }
                        ArtifactKind::Fileset => {
                            let links = expander.fileset_links(artifact)?;
                            self.add_fileset_entries(map, &links, &location, base_directory)?;
                        }
                        ArtifactKind::File => {
                            let input = Input::File {
                                exec_path: artifact.exec_path().to_owned(),
                            };
                            if self.strict {
                                fail_if_not_file(metadata, &input, artifact.exec_path())?;
                            }
                            add_mapping(map, base_directory.join(&location), input);
                        }
                    },
                }
            }
        }
        Ok(())
    }

    /// Resolves one fileset and writes its entries below
    /// `base_directory / location`. Resolution failure discards the whole
    /// fileset, and with it the mapping call.
    fn add_fileset_entries(
        &self,
        map: &mut InputMapping,
        links: &[FilesetSymlink],
        location: &Path,
        base_directory: &Path,
    ) -> Result<(), Error> {
        let manifest =
            FilesetManifest::construct(links, &self.exec_root, self.relative_symlink_policy)?;

        let mount = base_directory.join(location);
        for (name, target) in manifest.into_entries() {
            let input = match target {
                None => Input::Empty,
                Some(path) => Input::ResolvedFile { path },
            };
            add_mapping(map, mount.join(&name), input);
        }
        Ok(())
    }
}

/// Expands `tree` and writes one entry per member file below `mount`.
fn add_tree_members(
    map: &mut InputMapping,
    tree: &Artifact,
    expander: &dyn ArtifactExpander,
    mount: PathBuf,
) -> Result<(), Error> {
    for member in expander.tree_members(tree)? {
        let exec_path = tree.exec_path().join(&member);
        add_mapping(
            map,
            mount.join(&member),
            Input::TreeFile {
                exec_path,
                tree_path: member,
            },
        );
    }
    Ok(())
}

/// Rejects a plain input whose metadata says it is not a regular file.
/// Inputs without recorded metadata pass.
fn fail_if_not_file(
    metadata: &dyn MetadataProvider,
    input: &Input,
    exec_path: &Path,
) -> Result<(), Error> {
    match metadata.file_type(input)? {
        FileType::File | FileType::Absent => Ok(()),
        FileType::Directory | FileType::Symlink => Err(Error::ForbiddenInput(exec_path.to_owned())),
    }
}

/// Writes one entry into the table. Destinations are sandbox-relative by
/// construction of [PathBuf]; a later write at an occupied destination
/// replaces the earlier entry.
fn add_mapping(map: &mut InputMapping, dest: PathBuf, input: Input) {
    match map.entry(dest) {
        Entry::Vacant(entry) => {
            entry.insert(input);
        }
        Entry::Occupied(mut entry) => {
            debug!(dest = %entry.key(), "replacing earlier entry at destination");
            entry.insert(input);
        }
    }
}
