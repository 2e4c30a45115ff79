use std::collections::BTreeMap;

use crate::artifact::Artifact;
use crate::path::PathBuf;

/// A declared tree of files a spawned binary expects to find at specific
/// relative paths at run time: root prefix, then relative path, then the
/// backing artifact. An absent artifact means "materialize an empty
/// placeholder here".
///
/// Roots and paths are relative by construction of [PathBuf]. Both levels
/// are ordered maps, so iteration order (and with it failure diagnostics)
/// is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunfilesTree {
    mappings: BTreeMap<PathBuf, BTreeMap<PathBuf, Option<Artifact>>>,
}

impl RunfilesTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `path` under `root` to be backed by `artifact`, or by
    /// nothing. A repeated declaration replaces the earlier one.
    pub fn insert(&mut self, root: PathBuf, path: PathBuf, artifact: Option<Artifact>) {
        self.mappings.entry(root).or_default().insert(path, artifact);
    }

    pub fn mappings(&self) -> &BTreeMap<PathBuf, BTreeMap<PathBuf, Option<Artifact>>> {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::RunfilesTree;
    use crate::fixtures::{rel, DATA_FILE};

    #[test]
    fn iteration_is_sorted() {
        let mut tree = RunfilesTree::new();
        assert!(tree.is_empty());

        tree.insert(rel("bin"), rel("z.txt"), Some(DATA_FILE.clone()));
        tree.insert(rel("bin"), rel("a.txt"), None);
        tree.insert(rel("aux"), rel("b.txt"), None);

        let roots: Vec<_> = tree.mappings().keys().cloned().collect();
        assert_eq!(vec![rel("aux"), rel("bin")], roots);

        let bin_paths: Vec<_> = tree.mappings()[&rel("bin")].keys().cloned().collect();
        assert_eq!(vec![rel("a.txt"), rel("z.txt")], bin_paths);
    }
}
