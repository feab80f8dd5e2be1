//! Consistency checks over index roots.
//!
//! The engine never creates an entry without its entity file, but entity
//! files can be deleted behind its back. Verification walks a root and
//! reports what such deletions (or crashes mid-update) left behind. It only
//! reads; repairing is up to the caller.

use crate::error::{IndexError, IndexResult};
use crate::index::{list_dir, read_entry};
use crate::layout::{self, IndexKind, IndexRootName};
use std::path::{Path, PathBuf};

/// Result of verifying one index root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// The verified index.
    pub name: IndexRootName,
    /// Number of distinct values.
    pub values: usize,
    /// Number of entries.
    pub entries: usize,
    /// Entries whose entity file no longer exists.
    pub dangling: Vec<PathBuf>,
    /// Non-unique value directories without entries.
    pub empty_values: Vec<PathBuf>,
}

impl VerifyReport {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.empty_values.is_empty()
    }
}

/// Finds all index roots under `<data_dir>/index.disk`, sorted by name.
///
/// Directories whose names don't parse as index roots are ignored.
pub fn discover_roots(data_dir: &Path) -> IndexResult<Vec<(IndexRootName, PathBuf)>> {
    let index_dir = layout::index_dir(data_dir);
    let names = list_dir(&index_dir)?.unwrap_or_default();
    Ok(names
        .into_iter()
        .filter_map(|name| {
            IndexRootName::parse(&name).map(|parsed| (parsed, index_dir.join(&name)))
        })
        .collect())
}

/// Verifies the index rooted at `root`.
pub fn verify_root(name: &IndexRootName, root: &Path) -> IndexResult<VerifyReport> {
    let mut report = VerifyReport {
        name: name.clone(),
        values: 0,
        entries: 0,
        dangling: Vec::new(),
        empty_values: Vec::new(),
    };

    let values = list_dir(root)?
        .ok_or_else(|| IndexError::not_found(name.to_string(), "index root"))?;

    for value in values {
        let path = root.join(&value);
        report.values += 1;
        match name.kind {
            IndexKind::Unique => check_entry(&path, &mut report)?,
            IndexKind::NonUnique => {
                let keys = list_dir(&path)?.unwrap_or_default();
                if keys.is_empty() {
                    report.empty_values.push(path);
                    continue;
                }
                for key in keys {
                    check_entry(&path.join(key), &mut report)?;
                }
            }
        }
    }
    Ok(report)
}

fn check_entry(link: &Path, report: &mut VerifyReport) -> IndexResult<()> {
    report.entries += 1;
    let target = read_entry(link).map_err(|e| IndexError::storage(link, e))?;
    match target.try_exists() {
        Ok(true) => {}
        Ok(false) => report.dangling.push(link.to_path_buf()),
        Err(e) => return Err(IndexError::storage(&target, e)),
    }
    Ok(())
}
