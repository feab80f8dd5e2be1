//! Indexer - the registry of indexes per entity type.
//!
//! Callers declare which fields of an entity type are indexed and how, then
//! hand whole entities to the indexer after writing (or before deleting)
//! their files. The indexer fans each mutation out to every field's index.
//!
//! # Invariants
//!
//! - At most one index per (entity type, field)
//! - Registry-wide operations attempt every field and report all failures
//! - No rollback: a partially applied `index_add` is reported, not undone

use crate::config::IndexerConfig;
use crate::error::{FieldFailure, IndexError, IndexResult};
use crate::index::{Index, NonUniqueIndex, UniqueIndex};
use crate::layout::{self, IndexKind};
use crate::verify::{self, VerifyReport};
use parking_lot::RwLock;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// A record the indexer can index.
pub trait Entity {
    /// Stable, collision-free name of the entity type.
    ///
    /// Defaults to the Rust type path with `::` replaced by `.`. Override it
    /// if the type may move between modules, since the name is part of the
    /// on-disk layout.
    fn type_fqn() -> String
    where
        Self: Sized,
    {
        layout::type_fqn::<Self>()
    }

    /// Returns the primary key (the entity's file name).
    fn primary_key(&self) -> &str;

    /// Returns the current value of `field`, or `None` if the entity has no
    /// such field.
    fn field_value(&self, field: &str) -> Option<String>;
}

/// Outcome of adding one field of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAddResult {
    /// The indexed field.
    pub field: String,
    /// Path of the created (or already present) entry.
    pub entry: PathBuf,
}

/// Field name -> index, ordered so fan-out and error reports are stable.
type FieldIndexes = BTreeMap<String, Arc<dyn Index>>;

/// Registry of filesystem indexes, keyed by entity type and field.
///
/// # Example
///
/// ```rust,ignore
/// let indexer = Indexer::new(IndexerConfig::new(data_dir));
/// indexer.add_index::<User>("Mail", IndexKind::Unique)?;
/// indexer.add_index::<User>("Country", IndexKind::NonUnique)?;
///
/// store.write(&user)?;
/// indexer.index_add(&user)?;
///
/// let ids = indexer.find_by::<User>("Mail", "jane@example.com")?;
/// ```
pub struct Indexer {
    config: IndexerConfig,
    indexes: RwLock<HashMap<String, FieldIndexes>>,
}

impl Indexer {
    /// Creates an indexer with no indexes.
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Creates, initializes and registers an index on `field` of `E`.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the field is already indexed; `InvalidInput` if
    /// the type or field is not a valid name; `StorageFailure` if the root
    /// directory cannot be created.
    pub fn add_index<E: Entity>(&self, field: &str, kind: IndexKind) -> IndexResult<()> {
        let type_name = E::type_fqn();
        if let Some(existing) = self.registered(&type_name, field) {
            return Err(already_indexed(&type_name, field, existing.as_ref()));
        }

        let config = self.config.index_config(&type_name, field);
        let index: Arc<dyn Index> = match kind {
            IndexKind::Unique => Arc::new(UniqueIndex::new(config)?),
            IndexKind::NonUnique => Arc::new(NonUniqueIndex::new(config)?),
        };
        index.init()?;

        // Re-checked: another caller may have registered the field meanwhile.
        let mut indexes = self.indexes.write();
        match indexes
            .entry(type_name.clone())
            .or_default()
            .entry(field.to_owned())
        {
            Entry::Occupied(existing) => {
                Err(already_indexed(&type_name, field, existing.get().as_ref()))
            }
            Entry::Vacant(slot) => {
                debug!(index = %index.name(), "index registered");
                slot.insert(index);
                Ok(())
            }
        }
    }

    fn registered(&self, type_name: &str, field: &str) -> Option<Arc<dyn Index>> {
        self.indexes
            .read()
            .get(type_name)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// Unregisters the index on `field` of `E`.
    ///
    /// The index root and its entries stay on disk. Returns whether an
    /// index was registered.
    pub fn drop_index<E: Entity>(&self, field: &str) -> bool {
        let type_name = E::type_fqn();
        let mut indexes = self.indexes.write();
        let Some(fields) = indexes.get_mut(&type_name) else {
            return false;
        };
        let dropped = fields.remove(field).is_some();
        if fields.is_empty() {
            indexes.remove(&type_name);
        }
        dropped
    }

    /// Returns the indexed fields of `E`, sorted.
    #[must_use]
    pub fn fields<E: Entity>(&self) -> Vec<String> {
        self.indexes
            .read()
            .get(&E::type_fqn())
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the index on `field` of `E`.
    pub fn index<E: Entity>(&self, field: &str) -> IndexResult<Arc<dyn Index>> {
        self.index_for(&E::type_fqn(), field)
    }

    fn index_for(&self, type_name: &str, field: &str) -> IndexResult<Arc<dyn Index>> {
        self.registered(type_name, field)
            .ok_or_else(|| IndexError::not_found(type_name, format!("index on field {field:?}")))
    }

    /// Snapshot of the indexes of one type, so no lock is held during I/O.
    fn indexes_for(&self, type_name: &str) -> IndexResult<Vec<(String, Arc<dyn Index>)>> {
        self.indexes
            .read()
            .get(type_name)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, index)| (field.clone(), Arc::clone(index)))
                    .collect()
            })
            .ok_or_else(|| IndexError::not_found(type_name, "indexes for entity type"))
    }

    /// Adds `entity` to every index of its type.
    ///
    /// Every field is attempted. If any fails, the successful fields are
    /// *not* rolled back and the failures come back as
    /// [`IndexError::Partial`]; the caller decides whether to undo the
    /// entity write.
    pub fn index_add<E: Entity>(&self, entity: &E) -> IndexResult<Vec<IndexAddResult>> {
        let type_name = E::type_fqn();
        let primary_key = entity.primary_key();
        let mut added = Vec::new();
        let mut failures = Vec::new();

        for (field, index) in self.indexes_for(&type_name)? {
            let result = match entity.field_value(&field) {
                Some(value) => index.add(primary_key, &value),
                None => Err(missing_field(&type_name, &field)),
            };
            match result {
                Ok(entry) => added.push(IndexAddResult { field, entry }),
                Err(error) => failures.push(FieldFailure { field, error }),
            }
        }

        finish(&type_name, primary_key, "add", failures)?;
        Ok(added)
    }

    /// Moves `primary_key` from `old_value` to `new_value` in the index on
    /// `field`.
    pub fn index_update<E: Entity>(
        &self,
        primary_key: &str,
        field: &str,
        old_value: &str,
        new_value: &str,
    ) -> IndexResult<()> {
        self.index::<E>(field)?
            .update(primary_key, old_value, new_value)
    }

    /// Brings every index of `E` from the state of `from` to that of `to`.
    ///
    /// Only fields whose value changed are touched. A field that gains a
    /// value is added, one that loses it is removed.
    pub fn update<E: Entity>(&self, from: &E, to: &E) -> IndexResult<()> {
        let type_name = E::type_fqn();
        let primary_key = from.primary_key();
        if to.primary_key() != primary_key {
            return Err(IndexError::invalid_input(format!(
                "cannot update {primary_key:?} into a different entity {:?}",
                to.primary_key()
            )));
        }

        let mut failures = Vec::new();
        for (field, index) in self.indexes_for(&type_name)? {
            let result = match (from.field_value(&field), to.field_value(&field)) {
                (Some(old), Some(new)) if old == new => Ok(()),
                (Some(old), Some(new)) => index.update(primary_key, &old, &new),
                (None, Some(new)) => index.add(primary_key, &new).map(|_| ()),
                (Some(old), None) => index.remove(primary_key, &old),
                (None, None) => Ok(()),
            };
            if let Err(error) = result {
                failures.push(FieldFailure { field, error });
            }
        }

        finish(&type_name, primary_key, "update", failures)
    }

    /// Removes `entity` from every index of its type, best-effort.
    pub fn index_remove<E: Entity>(&self, entity: &E) -> IndexResult<()> {
        let type_name = E::type_fqn();
        let primary_key = entity.primary_key();
        let mut failures = Vec::new();

        for (field, index) in self.indexes_for(&type_name)? {
            let value = entity.field_value(&field).unwrap_or_default();
            if let Err(error) = index.remove(primary_key, &value) {
                failures.push(FieldFailure { field, error });
            }
        }

        finish(&type_name, primary_key, "remove", failures)
    }

    /// Returns the primary keys whose `field` equals `value`.
    pub fn find_by<E: Entity>(&self, field: &str, value: &str) -> IndexResult<Vec<String>> {
        self.index::<E>(field)?.lookup(value)
    }

    /// Returns the primary keys whose `field` matches the glob `pattern`,
    /// sorted and deduplicated.
    pub fn find_by_partial<E: Entity>(
        &self,
        field: &str,
        pattern: &str,
    ) -> IndexResult<Vec<String>> {
        let paths = self.index::<E>(field)?.search(pattern)?;
        let mut keys: Vec<String> = paths
            .iter()
            .filter_map(|path| layout::primary_key_of(path))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Verifies every registered index.
    pub fn verify(&self) -> IndexResult<Vec<VerifyReport>> {
        let all: Vec<Arc<dyn Index>> = self
            .indexes
            .read()
            .values()
            .flat_map(|fields| fields.values().cloned())
            .collect();

        let mut reports = all
            .iter()
            .map(|index| verify::verify_root(index.name(), index.root()))
            .collect::<IndexResult<Vec<_>>>()?;
        reports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(reports)
    }
}

fn already_indexed(type_name: &str, field: &str, existing: &dyn Index) -> IndexError {
    IndexError::already_exists(type_name, field, existing.name().to_string())
}

fn missing_field(type_name: &str, field: &str) -> IndexError {
    IndexError::invalid_input(format!("{type_name} has no value for indexed field {field:?}"))
}

fn finish(
    type_name: &str,
    primary_key: &str,
    op: &str,
    failures: Vec<FieldFailure>,
) -> IndexResult<()> {
    if failures.is_empty() {
        return Ok(());
    }
    for failure in &failures {
        warn!(
            type_name,
            primary_key,
            op,
            field = %failure.field,
            error = %failure.error,
            "index operation failed"
        );
    }
    Err(IndexError::Partial {
        type_name: type_name.to_owned(),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    #[derive(Clone)]
    struct User {
        id: String,
        name: String,
        mail: String,
        country: Option<String>,
    }

    impl User {
        fn new(id: &str, name: &str, mail: &str, country: Option<&str>) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                mail: mail.into(),
                country: country.map(Into::into),
            }
        }
    }

    impl Entity for User {
        fn type_fqn() -> String {
            "accounts.User".into()
        }

        fn primary_key(&self) -> &str {
            &self.id
        }

        fn field_value(&self, field: &str) -> Option<String> {
            match field {
                "Name" => Some(self.name.clone()),
                "Mail" => Some(self.mail.clone()),
                "Country" => self.country.clone(),
                _ => None,
            }
        }
    }

    fn setup() -> (TempDir, Indexer) {
        let temp = tempdir().unwrap();
        let indexer = Indexer::new(IndexerConfig::new(temp.path()));
        fs::create_dir_all(&indexer.config().files_dir).unwrap();
        indexer.add_index::<User>("Name", IndexKind::Unique).unwrap();
        indexer.add_index::<User>("Mail", IndexKind::Unique).unwrap();
        indexer
            .add_index::<User>("Country", IndexKind::NonUnique)
            .unwrap();
        (temp, indexer)
    }

    fn store(indexer: &Indexer, user: &User) {
        fs::write(indexer.config().files_dir.join(&user.id), b"{}").unwrap();
    }

    #[test]
    fn add_fans_out() {
        let (temp, indexer) = setup();
        let jane = User::new("u1", "jane", "jane@example.com", Some("de"));
        store(&indexer, &jane);

        let added = indexer.index_add(&jane).unwrap();
        let fields: Vec<_> = added.iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["Country", "Mail", "Name"]);
        assert!(temp
            .path()
            .join("index.disk/non_unique.accounts.User.Country/de/u1")
            .exists());

        assert_eq!(indexer.find_by::<User>("Mail", "jane@example.com").unwrap(), vec!["u1"]);
        assert_eq!(indexer.find_by::<User>("Country", "de").unwrap(), vec!["u1"]);
    }

    #[test]
    fn register_twice_rejected() {
        let (_temp, indexer) = setup();
        let err = indexer.add_index::<User>("Name", IndexKind::NonUnique).unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(indexer.index::<User>("Name").unwrap().kind(), IndexKind::Unique);
    }

    #[test]
    fn concurrent_registration_has_one_winner() {
        let (_temp, indexer) = setup();
        let results: Vec<IndexResult<()>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| indexer.add_index::<User>("Age", IndexKind::NonUnique)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(IndexError::is_already_exists));
        assert!(indexer.fields::<User>().contains(&"Age".to_owned()));
    }

    #[test]
    fn unknown_field_or_type() {
        struct Unregistered;
        impl Entity for Unregistered {
            fn primary_key(&self) -> &str {
                "x"
            }
            fn field_value(&self, _field: &str) -> Option<String> {
                None
            }
        }

        let (_temp, indexer) = setup();
        assert!(indexer.find_by::<User>("Age", "3").unwrap_err().is_not_found());
        assert!(indexer.index_add(&Unregistered).unwrap_err().is_not_found());
    }

    #[test]
    fn add_reports_every_failure_without_rollback() {
        let (_temp, indexer) = setup();
        let jane = User::new("u1", "jane", "shared@example.com", Some("de"));
        let john = User::new("u2", "john", "shared@example.com", None);
        store(&indexer, &jane);
        store(&indexer, &john);
        indexer.index_add(&jane).unwrap();

        let err = indexer.index_add(&john).unwrap_err();
        let failed: Vec<_> = err
            .failures()
            .iter()
            .map(|f| (f.field.as_str(), f.error.kind()))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("Country", ErrorKind::InvalidInput),
                ("Mail", ErrorKind::AlreadyExists),
            ]
        );
        // Name succeeded and stays.
        assert_eq!(indexer.find_by::<User>("Name", "john").unwrap(), vec!["u2"]);
    }

    #[test]
    fn index_update_routes_to_field() {
        let (_temp, indexer) = setup();
        let jane = User::new("u1", "jane", "jane@example.com", Some("de"));
        store(&indexer, &jane);
        indexer.index_add(&jane).unwrap();

        indexer
            .index_update::<User>("u1", "Country", "de", "fr")
            .unwrap();
        assert_eq!(indexer.find_by::<User>("Country", "fr").unwrap(), vec!["u1"]);
        assert!(indexer.find_by::<User>("Country", "de").unwrap_err().is_not_found());
    }

    #[test]
    fn update_diffs_fields() {
        let (_temp, indexer) = setup();
        let before = User::new("u1", "jane", "jane@example.com", Some("de"));
        store(&indexer, &before);
        indexer.index_add(&before).unwrap();

        let after = User::new("u1", "jane", "janet@example.com", None);
        indexer.update(&before, &after).unwrap();

        assert_eq!(indexer.find_by::<User>("Mail", "janet@example.com").unwrap(), vec!["u1"]);
        assert!(indexer.find_by::<User>("Mail", "jane@example.com").unwrap_err().is_not_found());
        assert!(indexer.find_by::<User>("Country", "de").unwrap_err().is_not_found());
        assert_eq!(indexer.find_by::<User>("Name", "jane").unwrap(), vec!["u1"]);

        let other = User::new("u2", "jane", "jane@example.com", None);
        assert!(indexer.update(&after, &other).unwrap_err().is_invalid_input());
    }

    #[test]
    fn remove_is_best_effort() {
        let (_temp, indexer) = setup();
        let jane = User::new("u1", "jane", "jane@example.com", Some("de"));
        store(&indexer, &jane);
        indexer.index_add(&jane).unwrap();
        indexer
            .index::<User>("Name")
            .unwrap()
            .remove("u1", "jane")
            .unwrap();

        let err = indexer.index_remove(&jane).unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].field, "Name");
        assert!(indexer.find_by::<User>("Mail", "jane@example.com").unwrap_err().is_not_found());
        assert!(indexer.find_by::<User>("Country", "de").unwrap_err().is_not_found());
    }

    #[test]
    fn find_by_partial_returns_keys() {
        let (_temp, indexer) = setup();
        for (id, name, mail) in [
            ("u1", "jane", "jane@example.com"),
            ("u2", "janet", "janet@example.org"),
            ("u3", "john", "john@example.com"),
        ] {
            let user = User::new(id, name, mail, Some("de"));
            store(&indexer, &user);
            indexer.index_add(&user).unwrap();
        }

        assert_eq!(
            indexer.find_by_partial::<User>("Name", "jan*").unwrap(),
            vec!["u1", "u2"]
        );
        assert_eq!(
            indexer.find_by_partial::<User>("Mail", "*@example.com").unwrap(),
            vec!["u1", "u3"]
        );
        assert_eq!(
            indexer.find_by_partial::<User>("Country", "d?").unwrap(),
            vec!["u1", "u2", "u3"]
        );
        assert!(indexer
            .find_by_partial::<User>("Name", "zed*")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn drop_index_keeps_files() {
        let (_temp, indexer) = setup();
        let root = indexer.index::<User>("Name").unwrap().root().to_path_buf();

        assert!(indexer.drop_index::<User>("Name"));
        assert!(!indexer.drop_index::<User>("Name"));
        assert!(root.is_dir());
        assert_eq!(indexer.fields::<User>(), vec!["Country", "Mail"]);
    }

    #[test]
    fn verify_all() {
        let (_temp, indexer) = setup();
        let jane = User::new("u1", "jane", "jane@example.com", Some("de"));
        store(&indexer, &jane);
        indexer.index_add(&jane).unwrap();
        fs::remove_file(indexer.config().files_dir.join("u1")).unwrap();

        let reports = indexer.verify().unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.dangling.len() == 1));
    }
}
