//! Index configuration.

use crate::error::IndexResult;
use crate::layout::{self, IndexKind, IndexRootName};
use std::path::{Path, PathBuf};

/// Construction-time configuration for a single index.
///
/// All four parts are required; the only other choice is the variant,
/// which is picked by constructing a [`UniqueIndex`](crate::UniqueIndex) or
/// [`NonUniqueIndex`](crate::NonUniqueIndex).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Fully qualified entity type name.
    pub type_name: String,
    /// Indexed field.
    pub field: String,
    /// Directory holding the entity files the entries point at.
    pub files_dir: PathBuf,
    /// Data root; index roots live in `<data_dir>/index.disk`.
    pub data_dir: PathBuf,
}

impl IndexConfig {
    /// Creates a new index configuration.
    #[must_use]
    pub fn new(
        type_name: impl Into<String>,
        field: impl Into<String>,
        files_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            field: field.into(),
            files_dir: files_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Validates the type and field and returns the root name for `kind`.
    pub fn root_name(&self, kind: IndexKind) -> IndexResult<IndexRootName> {
        IndexRootName::new(kind, self.type_name.as_str(), self.field.as_str())
    }
}

/// Configuration for an [`Indexer`](crate::Indexer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Data root.
    pub data_dir: PathBuf,
    /// Entity files directory. Defaults to `<data_dir>/files`.
    pub files_dir: PathBuf,
}

impl IndexerConfig {
    /// Creates a configuration rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let files_dir = data_dir.join(layout::FILES_DIR);
        Self {
            data_dir,
            files_dir,
        }
    }

    /// Sets the entity files directory.
    #[must_use]
    pub fn files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.files_dir = dir.into();
        self
    }

    /// Builds the per-index configuration for one (type, field) pair.
    #[must_use]
    pub fn index_config(&self, type_name: &str, field: &str) -> IndexConfig {
        IndexConfig::new(type_name, field, &self.files_dir, &self.data_dir)
    }

    /// Returns `<data_dir>/index.disk`.
    #[must_use]
    pub fn index_dir(&self) -> PathBuf {
        layout::index_dir(Path::new(&self.data_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_files_dir() {
        let config = IndexerConfig::new("/srv/data");
        assert_eq!(config.files_dir, Path::new("/srv/data/files"));
        assert_eq!(config.index_dir(), Path::new("/srv/data/index.disk"));
    }

    #[test]
    fn builder_pattern() {
        let config = IndexerConfig::new("/srv/data").files_dir("/srv/data/pets");
        let index = config.index_config("pets.Pet", "Color");

        assert_eq!(index.files_dir, Path::new("/srv/data/pets"));
        assert_eq!(index.data_dir, Path::new("/srv/data"));
        assert_eq!(
            index.root_name(IndexKind::NonUnique).unwrap().to_string(),
            "non_unique.pets.Pet.Color"
        );
    }

    #[test]
    fn invalid_field_rejected() {
        let index = IndexConfig::new("pets.Pet", "", "/f", "/d");
        assert!(index.root_name(IndexKind::Unique).is_err());
    }
}
