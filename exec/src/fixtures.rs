//! Shared fixtures for the crate's unit and scenario tests.
use lazy_static::lazy_static;

use crate::{Artifact, PathBuf};

pub const EXEC_ROOT: &str = "/build/execroot";

/// Parses a fixture path, panicking on typos in the fixture itself.
pub fn rel(s: &str) -> PathBuf {
    s.parse().expect("fixture path must be valid")
}

lazy_static! {
    pub static ref DATA_FILE: Artifact = Artifact::file(rel("tools/data.txt"));
    pub static ref GEN_TREE: Artifact = Artifact::tree(rel("out/gen"));
    pub static ref ASSET_FILESET: Artifact = Artifact::fileset(rel("site/assets"));
}
