//! Non-unique index: one value, many primary keys.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::entry;
use crate::index::root::IndexRoot;
use crate::index::search;
use crate::index::traits::Index;
use crate::layout::{self, IndexKind, IndexRootName};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Attempts at creating an entry when its value directory is pruned by a
/// concurrent remove between `create_dir` and link creation.
const CREATE_ATTEMPTS: usize = 8;

/// Non-unique index stored as one directory per value.
///
/// ```text
/// <data>/index.disk/non_unique.<Type>.<Field>/<value>/<pk> -> <files>/<pk>
/// ```
///
/// A value directory exists exactly as long as it holds at least one entry.
#[derive(Debug, Clone)]
pub struct NonUniqueIndex {
    root: IndexRoot,
}

impl NonUniqueIndex {
    /// Creates a non-unique index. Does not touch the filesystem; call
    /// [`Index::init`] before use.
    pub fn new(config: IndexConfig) -> IndexResult<Self> {
        Ok(Self {
            root: IndexRoot::new(config, IndexKind::NonUnique)?,
        })
    }

    fn entry_path(&self, value: &str, primary_key: &str) -> PathBuf {
        self.root.join(value).join(primary_key)
    }

    /// Creates the entry, returning whether this call created it.
    fn create_entry(&self, primary_key: &str, value: &str, target: &Path) -> IndexResult<bool> {
        let dir = self.root.join(value);
        let link = dir.join(primary_key);

        for _ in 0..CREATE_ATTEMPTS {
            match fs::create_dir(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(IndexError::storage(&dir, e)),
            }
            match entry::create(&link, target) {
                Ok(()) => return Ok(true),
                // The entry name is the key itself, so an existing one is ours.
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(IndexError::storage(&link, e)),
            }
        }
        Err(IndexError::storage(
            &dir,
            io::Error::other("value directory kept disappearing during create"),
        ))
    }

    /// Removes one entry and prunes its value directory when it empties.
    fn remove_entry(&self, primary_key: &str, value: &str) -> IndexResult<()> {
        self.unlink_entry(primary_key, value)?;
        self.prune(value);
        Ok(())
    }

    fn unlink_entry(&self, primary_key: &str, value: &str) -> IndexResult<()> {
        let link = self.entry_path(value, primary_key);
        match entry::remove(&link) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(IndexError::not_found(
                self.root.label(),
                format!("{primary_key:?} under {value:?}"),
            )),
            Err(e) => Err(IndexError::storage(&link, e)),
        }
    }

    /// Removes the value directory if it is empty. The entry is already
    /// gone at this point, so a failure only leaves an empty container
    /// behind, which verification reports.
    fn prune(&self, value: &str) {
        let dir = self.root.join(value);
        match fs::remove_dir(&dir) {
            Ok(()) => debug!(index = %self.root.name, value, "empty value container removed"),
            // Still in use, or pruned by a concurrent remove.
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::DirectoryNotEmpty
                        | io::ErrorKind::AlreadyExists
                        | io::ErrorKind::NotFound
                ) => {}
            Err(e) => warn!(
                index = %self.root.name,
                value,
                path = %dir.display(),
                error = %e,
                "failed to prune value container"
            ),
        }
    }

    fn remove_by_key(&self, primary_key: &str) -> IndexResult<()> {
        let mut removed = 0;
        for value in entry::list(self.root.root())?.unwrap_or_default() {
            let link = self.entry_path(&value, primary_key);
            match fs::symlink_metadata(&link) {
                Ok(_) => {
                    self.remove_entry(primary_key, &value)?;
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(IndexError::storage(&link, e)),
            }
        }
        if removed == 0 {
            return Err(IndexError::not_found(
                self.root.label(),
                format!("primary key {primary_key:?}"),
            ));
        }
        debug!(index = %self.root.name, primary_key, removed, "entries removed by key");
        Ok(())
    }
}

impl Index for NonUniqueIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::NonUnique
    }

    fn config(&self) -> &IndexConfig {
        &self.root.config
    }

    fn name(&self) -> &IndexRootName {
        &self.root.name
    }

    fn root(&self) -> &Path {
        self.root.root()
    }

    fn init(&self) -> IndexResult<()> {
        self.root.init()
    }

    fn add(&self, primary_key: &str, value: &str) -> IndexResult<PathBuf> {
        layout::validate_value(value)?;
        let target = self.root.entity(primary_key)?;

        if self.create_entry(primary_key, value, &target)? {
            debug!(index = %self.root.name, value, primary_key, "entry added");
        }
        Ok(self.entry_path(value, primary_key))
    }

    fn lookup(&self, value: &str) -> IndexResult<Vec<String>> {
        layout::validate_value(value)?;
        trace!(index = %self.root.name, value, "non-unique lookup");
        match entry::list(&self.root.join(value))? {
            Some(keys) if !keys.is_empty() => Ok(keys),
            _ => Err(IndexError::not_found(self.root.label(), format!("{value:?}"))),
        }
    }

    /// Adds under `new_value` before removing from `old_value`, so an
    /// observer between the two steps sees the key under both values,
    /// never under neither.
    fn update(&self, primary_key: &str, old_value: &str, new_value: &str) -> IndexResult<()> {
        layout::validate_value(old_value)?;
        layout::validate_value(new_value)?;
        let target = self.root.entity(primary_key)?;

        let old_link = self.entry_path(old_value, primary_key);
        match fs::symlink_metadata(&old_link) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::not_found(
                    self.root.label(),
                    format!("{primary_key:?} under {old_value:?}"),
                ))
            }
            Err(e) => return Err(IndexError::storage(&old_link, e)),
        }
        if old_value == new_value {
            return Ok(());
        }

        let created = self.create_entry(primary_key, new_value, &target)?;
        if let Err(err) = self.unlink_entry(primary_key, old_value) {
            if err.is_not_found() {
                // Someone else already removed it; the move is complete.
                return Ok(());
            }
            // The old entry is still in place, so dropping the new one
            // cannot leave the key under neither value.
            if created {
                if let Err(rollback) = self.remove_entry(primary_key, new_value) {
                    warn!(
                        index = %self.root.name,
                        value = new_value,
                        primary_key,
                        error = %rollback,
                        "rollback of update failed"
                    );
                }
            }
            return Err(err);
        }
        self.prune(old_value);

        debug!(index = %self.root.name, primary_key, old_value, new_value, "entry moved");
        Ok(())
    }

    fn remove(&self, primary_key: &str, value: &str) -> IndexResult<()> {
        layout::validate_primary_key(primary_key)?;
        if value.is_empty() {
            return self.remove_by_key(primary_key);
        }
        layout::validate_value(value)?;

        self.remove_entry(primary_key, value)?;
        debug!(index = %self.root.name, value, primary_key, "entry removed");
        Ok(())
    }

    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>> {
        let mut targets = Vec::new();
        for value in search::matching_values(self.root.root(), pattern)? {
            let dir = self.root.join(&value);
            // Pruned since the listing.
            let Some(keys) = entry::list(&dir)? else {
                continue;
            };
            for key in keys {
                let link = dir.join(&key);
                match entry::read(&link) {
                    Ok(target) => targets.push(target),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(IndexError::storage(&link, e)),
                }
            }
        }

        if targets.is_empty() {
            return Err(IndexError::not_found(
                self.root.label(),
                format!("values matching {pattern:?}"),
            ));
        }
        Ok(targets)
    }
}
