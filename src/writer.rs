use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::BuildError;
use crate::theme::InputDescriptor;

/// ENOSPC on Unix
const DISK_FULL: i32 = 28;

/// The five outputs of one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub css: String,
    pub minified_css: String,
    pub variables_json: String,
    pub type_declaration: String,
    pub docs_json: String,
}

impl ArtifactSet {
    /// Contents in the same order as [`InputDescriptor::output_paths`]
    pub fn contents(&self) -> [&str; 5] {
        [
            &self.css,
            &self.minified_css,
            &self.variables_json,
            &self.type_declaration,
            &self.docs_json,
        ]
    }
}

/// Create `path` and its parents; an existing directory is left as is
pub fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(path).map_err(|e| BuildError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write a single file
pub fn write_file(path: &Path, contents: &str) -> Result<u64, BuildError> {
    fs::write(path, contents).map_err(|e| {
        if e.raw_os_error() == Some(DISK_FULL) {
            return BuildError::DiskFull {
                path: path.to_path_buf(),
            };
        }
        BuildError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    Ok(contents.len() as u64)
}

/// Write all five artifacts concurrently, returning the written paths in
/// write order.
///
/// Files already written are kept when another write fails.
pub fn write_artifacts(
    artifacts: &ArtifactSet,
    descriptor: &InputDescriptor,
) -> Result<Vec<PathBuf>, BuildError> {
    let paths = descriptor.output_paths();
    let contents = artifacts.contents();

    paths[..]
        .par_iter()
        .zip(contents[..].par_iter())
        .try_for_each(|(path, content)| write_file(path, content).map(|_| ()))?;

    Ok(paths.iter().map(|p| p.to_path_buf()).collect())
}
