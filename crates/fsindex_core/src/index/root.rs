//! State shared by both index variants.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::layout::{self, IndexKind, IndexRootName};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved paths of one index.
#[derive(Debug, Clone)]
pub(crate) struct IndexRoot {
    pub(crate) config: IndexConfig,
    pub(crate) name: IndexRootName,
    pub(crate) path: PathBuf,
    /// Absolute files directory; symlink targets are resolved from the
    /// link's own directory, so relative targets would dangle.
    files_dir: PathBuf,
}

impl IndexRoot {
    pub(crate) fn new(config: IndexConfig, kind: IndexKind) -> IndexResult<Self> {
        let name = config.root_name(kind)?;
        let path = layout::index_root(&config.data_dir, &name);
        let files_dir = std::path::absolute(&config.files_dir)
            .map_err(|e| IndexError::storage(&config.files_dir, e))?;
        Ok(Self {
            config,
            name,
            path,
            files_dir,
        })
    }

    /// Creates the root directory and its parents.
    pub(crate) fn init(&self) -> IndexResult<()> {
        fs::create_dir_all(&self.path).map_err(|e| IndexError::storage(&self.path, e))
    }

    /// Label used in errors and logs.
    pub(crate) fn label(&self) -> String {
        self.name.to_string()
    }

    /// Validates `primary_key` and returns its entity path, which must exist.
    pub(crate) fn entity(&self, primary_key: &str) -> IndexResult<PathBuf> {
        layout::validate_primary_key(primary_key)?;
        let target = layout::entity_path(&self.files_dir, primary_key);
        match target.try_exists() {
            Ok(true) => Ok(target),
            Ok(false) => Err(IndexError::not_found(
                self.label(),
                format!("entity file for {primary_key:?}"),
            )),
            Err(e) => Err(IndexError::storage(&target, e)),
        }
    }

    pub(crate) fn join(&self, value: &str) -> PathBuf {
        self.path.join(value)
    }

    pub(crate) fn root(&self) -> &Path {
        &self.path
    }
}
