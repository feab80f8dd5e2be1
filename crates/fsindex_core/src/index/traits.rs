//! The index trait.

use crate::config::IndexConfig;
use crate::error::IndexResult;
use crate::layout::{IndexKind, IndexRootName};
use std::path::{Path, PathBuf};

/// Operations every filesystem index provides.
///
/// Implementations keep no state besides their configuration: every call
/// reads or writes the index root directly, so an index can be shared
/// between threads and processes.
pub trait Index: Send + Sync {
    /// Returns the index variant.
    fn kind(&self) -> IndexKind;

    /// Returns the construction-time configuration.
    fn config(&self) -> &IndexConfig;

    /// Returns the parsed root directory name.
    fn name(&self) -> &IndexRootName;

    /// Returns the root directory of this index.
    fn root(&self) -> &Path;

    /// Creates the root directory if it does not exist yet.
    ///
    /// Idempotent; never touches existing entries.
    fn init(&self) -> IndexResult<()>;

    /// Adds an entry for `primary_key` under `value`.
    ///
    /// Returns the path of the entry.
    fn add(&self, primary_key: &str, value: &str) -> IndexResult<PathBuf>;

    /// Returns the primary keys stored under `value`, sorted.
    fn lookup(&self, value: &str) -> IndexResult<Vec<String>>;

    /// Moves the entry for `primary_key` from `old_value` to `new_value`.
    fn update(&self, primary_key: &str, old_value: &str, new_value: &str) -> IndexResult<()>;

    /// Removes the entry for `primary_key` under `value`.
    ///
    /// An empty `value` removes the key from whichever value holds it.
    fn remove(&self, primary_key: &str, value: &str) -> IndexResult<()>;

    /// Matches `pattern` against stored values and returns the entity paths
    /// of all matching entries in deterministic order.
    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>>;
}
