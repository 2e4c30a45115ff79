//! Flattening fileset symlink declarations into concrete entries.
//!
//! A fileset is a logically independent directory tree assembled from
//! possibly-foreign sources: its artifact carries symlink declarations,
//! not literal files. Targets are author-controlled strings, so relative
//! targets that would climb out of the fileset root are subject to a
//! configurable [RelativeSymlinkPolicy] instead of one hardcoded
//! behavior.
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use bstr::ByteSlice;
use bytes::Bytes;
use tracing::warn;

use crate::path::{Path, PathBuf};
use crate::Error;

/// How to treat a fileset symlink whose relative target resolves outside
/// the fileset root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelativeSymlinkPolicy {
    /// Reject the whole fileset with
    /// [Error::ForbiddenRelativeSymlink](crate::Error::ForbiddenRelativeSymlink).
    #[default]
    Error,
    /// Follow the link lexically and record it under its absolute
    /// location below the execution root.
    Resolve,
    /// Drop the offending entry and keep the rest of the fileset.
    Ignore,
}

/// One declared entry of a fileset: a relative destination name and an
/// optional target. Name and target arrive as raw bytes straight from
/// rule declarations; they are only validated during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesetSymlink {
    name: Bytes,
    target: Option<Bytes>,
    relative_to_exec_root: bool,
}

impl FilesetSymlink {
    /// A symlink declaration pointing at `target`. An empty target is
    /// normalized to an intentionally-empty entry.
    pub fn new(name: impl Into<Bytes>, target: impl Into<Bytes>) -> Self {
        let target: Bytes = target.into();
        Self {
            name: name.into(),
            target: (!target.is_empty()).then_some(target),
            relative_to_exec_root: false,
        }
    }

    /// A declaration with no target at all; materializes as an empty
    /// placeholder.
    pub fn empty(name: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            target: None,
            relative_to_exec_root: false,
        }
    }

    /// Marks the target as anchored at the execution root even though it
    /// does not start with a separator. Such targets are never treated as
    /// relative symlinks.
    pub fn relative_to_exec_root(mut self) -> Self {
        self.relative_to_exec_root = true;
        self
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn target(&self) -> Option<&[u8]> {
        self.target.as_deref()
    }

    /// Whether the target must be interpreted relative to the link's own
    /// directory rather than the execution root.
    fn is_relative_symlink(&self) -> bool {
        !self.relative_to_exec_root
            && matches!(self.target(), Some(target) if !target.starts_with(b"/"))
    }
}

/// The flattened form of one fileset: entry path (relative to the fileset
/// root) to resolved target location, or absent for intentionally-empty
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesetManifest {
    entries: BTreeMap<PathBuf, Option<std::path::PathBuf>>,
}

impl FilesetManifest {
    /// Resolves the declared `links` of one fileset. Later declarations
    /// of the same name replace earlier ones. Resolution of a single
    /// fileset is atomic: the first violation under
    /// [RelativeSymlinkPolicy::Error] discards the whole manifest.
    pub fn construct(
        links: &[FilesetSymlink],
        exec_root: &std::path::Path,
        policy: RelativeSymlinkPolicy,
    ) -> Result<Self, Error> {
        let mut entries = BTreeMap::new();

        for link in links {
            let name = PathBuf::try_from(link.name())?;

            let Some(target) = link.target() else {
                entries.insert(name, None);
                continue;
            };

            let resolved = if link.is_relative_symlink() {
                // The name is non-empty, so it always has a parent.
                let parent = name.parent().unwrap_or(Path::ROOT);
                if escapes_root(parent, target) {
                    match policy {
                        RelativeSymlinkPolicy::Error => {
                            return Err(Error::ForbiddenRelativeSymlink {
                                name: name.as_bytes().as_bstr().to_owned(),
                                target: target.as_bstr().to_owned(),
                            });
                        }
                        RelativeSymlinkPolicy::Ignore => {
                            warn!(
                                name = %name,
                                target = %target.as_bstr(),
                                "dropping fileset symlink with target outside the fileset root"
                            );
                            continue;
                        }
                        RelativeSymlinkPolicy::Resolve => {}
                    }
                }
                resolve_relative(exec_root, parent, target)
            } else {
                resolve_anchored(exec_root, target)
            };

            entries.insert(name, Some(resolved));
        }

        Ok(Self { entries })
    }

    pub fn into_entries(self) -> BTreeMap<PathBuf, Option<std::path::PathBuf>> {
        self.entries
    }

    pub fn entries(&self) -> &BTreeMap<PathBuf, Option<std::path::PathBuf>> {
        &self.entries
    }
}

/// Whether `target`, read from the directory `parent` inside the fileset
/// tree, ends up above the fileset root.
fn escapes_root(parent: &Path, target: &[u8]) -> bool {
    let mut depth = parent.components_bytes().count() as i64;
    for component in target.split(|b| *b == b'/') {
        match component {
            b"" | b"." => {}
            b".." => {
                depth -= 1;
                if depth < 0 {
                    return true;
                }
            }
            _ => depth += 1,
        }
    }
    false
}

/// Lexically resolves a relative-symlink `target` from the link's parent
/// directory, anchored at the execution root.
fn resolve_relative(exec_root: &std::path::Path, parent: &Path, target: &[u8]) -> std::path::PathBuf {
    let mut out = exec_root.to_path_buf();
    for component in parent.components_bytes() {
        out.push(OsStr::from_bytes(component));
    }
    push_lexical(&mut out, target);
    out
}

/// Resolves a non-relative target: absolute targets are taken as-is,
/// exec-root-anchored ones below the execution root.
fn resolve_anchored(exec_root: &std::path::Path, target: &[u8]) -> std::path::PathBuf {
    let mut out = if target.starts_with(b"/") {
        std::path::PathBuf::from("/")
    } else {
        exec_root.to_path_buf()
    };
    push_lexical(&mut out, target);
    out
}

/// Appends `path` component-wise, collapsing `.` and applying `..`
/// without consulting the filesystem.
fn push_lexical(out: &mut std::path::PathBuf, path: &[u8]) {
    for component in path.split(|b| *b == b'/') {
        match component {
            b"" | b"." => {}
            b".." => {
                out.pop();
            }
            name => out.push(OsStr::from_bytes(name)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{escapes_root, FilesetManifest, FilesetSymlink, RelativeSymlinkPolicy};
    use crate::path::PathBuf;
    use crate::Error;
    use rstest::rstest;

    const EXEC_ROOT: &str = "/build/execroot";

    fn construct(
        links: &[FilesetSymlink],
        policy: RelativeSymlinkPolicy,
    ) -> Result<FilesetManifest, Error> {
        FilesetManifest::construct(links, std::path::Path::new(EXEC_ROOT), policy)
    }

    fn entry_of(manifest: &FilesetManifest, name: &str) -> Option<std::path::PathBuf> {
        manifest
            .entries()
            .get(&name.parse::<PathBuf>().unwrap())
            .expect("entry must exist")
            .clone()
    }

    #[rstest]
    #[case::sibling("link", "data/file", false)]
    #[case::dot("link", "./file", false)]
    #[case::up_and_down("a/link", "../b/file", false)]
    #[case::deep_up_and_down("a/b/link", "../../c/../d", false)]
    #[case::up_from_root("link", "../file", true)]
    #[case::far_up("a/link", "../../file", true)]
    #[case::late_escape("a/link", "b/../../../file", true)]
    fn escape_detection(#[case] name: PathBuf, #[case] target: &str, #[case] escapes: bool) {
        let parent = name.parent().unwrap();
        assert_eq!(escapes, escapes_root(parent, target.as_bytes()));
    }

    #[rstest]
    fn empty_and_absent_targets() {
        let manifest = construct(
            &[
                FilesetSymlink::empty("a/absent"),
                FilesetSymlink::new("a/empty", ""),
            ],
            RelativeSymlinkPolicy::default(),
        )
        .expect("must resolve");

        assert_eq!(None, entry_of(&manifest, "a/absent"));
        assert_eq!(None, entry_of(&manifest, "a/empty"));
    }

    #[rstest]
    #[case::absolute("link", "/opt/data/blob", "/opt/data/blob")]
    #[case::absolute_normalized("link", "/opt//data/./blob", "/opt/data/blob")]
    #[case::in_root_sibling("a/link", "data/file", "/build/execroot/a/data/file")]
    #[case::in_root_up("a/link", "../b", "/build/execroot/b")]
    fn resolved_targets(#[case] name: &'static str, #[case] target: &'static str, #[case] exp: &str) {
        let manifest = construct(
            &[FilesetSymlink::new(name, target)],
            RelativeSymlinkPolicy::default(),
        )
        .expect("must resolve");

        assert_eq!(Some(std::path::PathBuf::from(exp)), entry_of(&manifest, name));
    }

    #[rstest]
    fn exec_root_anchored_target() {
        let manifest = construct(
            &[FilesetSymlink::new("link", "out/pkg/file").relative_to_exec_root()],
            // Anchored targets are never relative symlinks, so even the
            // strictest policy lets them through.
            RelativeSymlinkPolicy::Error,
        )
        .expect("must resolve");

        assert_eq!(
            Some(std::path::PathBuf::from("/build/execroot/out/pkg/file")),
            entry_of(&manifest, "link")
        );
    }

    #[rstest]
    fn escaping_link_errors_atomically() {
        let err = construct(
            &[
                FilesetSymlink::new("ok", "data/file"),
                FilesetSymlink::new("escape", "../../outside.txt"),
            ],
            RelativeSymlinkPolicy::Error,
        )
        .expect_err("must be rejected");

        assert!(matches!(err, Error::ForbiddenRelativeSymlink { .. }));
    }

    #[rstest]
    fn escaping_link_ignored_keeps_the_rest() {
        let manifest = construct(
            &[
                FilesetSymlink::new("ok", "data/file"),
                FilesetSymlink::new("escape", "../../outside.txt"),
            ],
            RelativeSymlinkPolicy::Ignore,
        )
        .expect("must resolve");

        assert_eq!(1, manifest.entries().len());
        assert_eq!(
            Some(std::path::PathBuf::from("/build/execroot/data/file")),
            entry_of(&manifest, "ok")
        );
    }

    #[rstest]
    fn escaping_link_resolved_to_absolute() {
        let manifest = construct(
            &[FilesetSymlink::new("escape", "../../outside.txt")],
            RelativeSymlinkPolicy::Resolve,
        )
        .expect("must resolve");

        // Two levels above /build/execroot.
        assert_eq!(
            Some(std::path::PathBuf::from("/outside.txt")),
            entry_of(&manifest, "escape")
        );
    }

    #[rstest]
    #[case::absolute_name("/abs/name")]
    #[case::dotdot_name("a/../b")]
    fn invalid_names_are_rejected(#[case] name: &'static str) {
        let err = construct(
            &[FilesetSymlink::new(name, "data/file")],
            RelativeSymlinkPolicy::default(),
        )
        .expect_err("must be rejected");

        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[rstest]
    fn later_declaration_wins() {
        let manifest = construct(
            &[
                FilesetSymlink::new("link", "first"),
                FilesetSymlink::new("link", "second"),
            ],
            RelativeSymlinkPolicy::default(),
        )
        .expect("must resolve");

        assert_eq!(
            Some(std::path::PathBuf::from("/build/execroot/second")),
            entry_of(&manifest, "link")
        );
    }
}
