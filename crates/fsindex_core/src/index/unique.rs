//! Unique index: one value, one primary key.

use crate::config::IndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::entry;
use crate::index::root::IndexRoot;
use crate::index::search;
use crate::index::traits::Index;
use crate::layout::{self, IndexKind, IndexRootName};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Attempts at exclusive creation when a competing entry vanishes between
/// the failed create and the owner check.
const CREATE_ATTEMPTS: usize = 3;

/// Unique index stored as one link per value.
///
/// ```text
/// <data>/index.disk/unique.<Type>.<Field>/<value> -> <files>/<pk>
/// ```
///
/// Uniqueness comes from exclusive link creation, so two processes adding
/// the same value race safely: exactly one wins, the other gets
/// [`IndexError::AlreadyExists`].
///
/// # Example
///
/// ```rust,ignore
/// let index = UniqueIndex::new(IndexConfig::new("accounts.User", "Mail", files, data))?;
/// index.init()?;
/// index.add("4c510ada", "jane@example.com")?;
/// assert_eq!(index.lookup("jane@example.com")?, vec!["4c510ada"]);
/// ```
#[derive(Debug, Clone)]
pub struct UniqueIndex {
    root: IndexRoot,
}

impl UniqueIndex {
    /// Creates a unique index. Does not touch the filesystem; call
    /// [`Index::init`] before use.
    pub fn new(config: IndexConfig) -> IndexResult<Self> {
        Ok(Self {
            root: IndexRoot::new(config, IndexKind::Unique)?,
        })
    }

    /// Creates the entry for `value` or confirms it already belongs to
    /// `primary_key`. Returns whether this call created it.
    fn create_exclusive(
        &self,
        primary_key: &str,
        value: &str,
        target: &Path,
    ) -> IndexResult<bool> {
        let link = self.root.join(value);
        for _ in 0..CREATE_ATTEMPTS {
            match entry::create(&link, target) {
                Ok(()) => return Ok(true),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    match entry::owner(&link)? {
                        Some(owner) if owner == primary_key => return Ok(false),
                        Some(owner) => {
                            return Err(IndexError::already_exists(self.root.label(), value, owner))
                        }
                        None => continue,
                    }
                }
                Err(e) => return Err(IndexError::storage(&link, e)),
            }
        }
        Err(IndexError::storage(
            &link,
            io::Error::other("entry kept changing during create"),
        ))
    }

    fn remove_by_key(&self, primary_key: &str) -> IndexResult<()> {
        let mut removed = 0;
        for value in entry::list(self.root.root())?.unwrap_or_default() {
            let link = self.root.join(&value);
            if entry::owner(&link)?.as_deref() == Some(primary_key) {
                entry::remove(&link).map_err(|e| IndexError::storage(&link, e))?;
                removed += 1;
            }
        }
        if removed == 0 {
            return Err(IndexError::not_found(
                self.root.label(),
                format!("primary key {primary_key:?}"),
            ));
        }
        debug!(index = %self.root.name, primary_key, removed, "unique entries removed by key");
        Ok(())
    }
}

impl Index for UniqueIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Unique
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

        if self.create_exclusive(primary_key, value, &target)? {
            debug!(index = %self.root.name, value, primary_key, "unique entry added");
        }
        Ok(self.root.join(value))
    }

    fn lookup(&self, value: &str) -> IndexResult<Vec<String>> {
        layout::validate_value(value)?;
        trace!(index = %self.root.name, value, "unique lookup");
        match entry::owner(&self.root.join(value))? {
            Some(primary_key) => Ok(vec![primary_key]),
            None => Err(IndexError::not_found(self.root.label(), format!("{value:?}"))),
        }
    }

    fn update(&self, primary_key: &str, old_value: &str, new_value: &str) -> IndexResult<()> {
        layout::validate_value(old_value)?;
        layout::validate_value(new_value)?;
        let target = self.root.entity(primary_key)?;

        let old_link = self.root.join(old_value);
        if entry::owner(&old_link)?.as_deref() != Some(primary_key) {
            return Err(IndexError::not_found(
                self.root.label(),
                format!("{old_value:?} for {primary_key:?}"),
            ));
        }
        if old_value == new_value {
            return Ok(());
        }

        // New entry first: a failure here leaves the old state untouched.
        let created = self.create_exclusive(primary_key, new_value, &target)?;

        match entry::remove(&old_link) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                if created {
                    let new_link = self.root.join(new_value);
                    if let Err(rollback) = entry::remove(&new_link) {
                        warn!(
                            index = %self.root.name,
                            value = new_value,
                            primary_key,
                            error = %rollback,
                            "rollback of unique update failed"
                        );
                    }
                }
                return Err(IndexError::storage(&old_link, e));
            }
        }

        debug!(index = %self.root.name, primary_key, old_value, new_value, "unique entry moved");
        Ok(())
    }

    fn remove(&self, primary_key: &str, value: &str) -> IndexResult<()> {
        layout::validate_primary_key(primary_key)?;
        if value.is_empty() {
            return self.remove_by_key(primary_key);
        }
        layout::validate_value(value)?;

        let link = self.root.join(value);
        match entry::owner(&link)? {
            None => Err(IndexError::not_found(self.root.label(), format!("{value:?}"))),
            Some(owner) if owner != primary_key => {
                debug!(
                    index = %self.root.name,
                    value,
                    primary_key,
                    owner = %owner,
                    "unique entry owned by another key, left in place"
                );
                Ok(())
            }
            Some(_) => match entry::remove(&link) {
                Ok(()) => {
                    debug!(index = %self.root.name, value, primary_key, "unique entry removed");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(IndexError::not_found(self.root.label(), format!("{value:?}")))
                }
                Err(e) => Err(IndexError::storage(&link, e)),
            },
        }
    }

    fn search(&self, pattern: &str) -> IndexResult<Vec<PathBuf>> {
        let mut targets = Vec::new();
        for value in search::matching_values(self.root.root(), pattern)? {
            let link = self.root.join(&value);
            match entry::read(&link) {
                Ok(target) => targets.push(target),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(IndexError::storage(&link, e)),
            }
        }

        if targets.is_empty() {
            return Err(IndexError::not_found(
                self.root.label(),
                format!("values matching {pattern:?}"),
            ));
        }
        targets.sort();
        Ok(targets)
    }
}
