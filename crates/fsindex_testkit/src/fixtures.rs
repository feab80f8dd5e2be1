//! Test fixtures and data directory helpers.
//!
//! Provides sample entities and a temporary data directory that writes
//! them as JSON entity files, the way an entity store would before calling
//! into the indexes.

use fsindex_core::{
    Entity, Index, IndexConfig, Indexer, IndexerConfig, NonUniqueIndex, UniqueIndex,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A pet, indexed by `Kind`, `Color`, `Name` and `Email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Primary key.
    pub id: String,
    /// Species.
    pub kind: String,
    /// Fur color.
    pub color: String,
    /// Name.
    pub name: String,
    /// Owner's contact address.
    pub email: String,
}

impl Pet {
    /// Creates a pet.
    pub fn new(id: &str, kind: &str, color: &str, name: &str, email: &str) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            color: color.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Entity for Pet {
    fn type_fqn() -> String {
        "fsindex.testkit.Pet".into()
    }

    fn primary_key(&self) -> &str {
        &self.id
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "Id" => Some(self.id.clone()),
            "Kind" => Some(self.kind.clone()),
            "Color" => Some(self.color.clone()),
            "Name" => Some(self.name.clone()),
            "Email" => Some(self.email.clone()),
            _ => None,
        }
    }
}

/// A user account, indexed by `UserName`, `Mail` and `Country`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: String,
    /// Login name.
    pub user_name: String,
    /// Mail address.
    pub mail: String,
    /// Country code, if known.
    pub country: Option<String>,
}

impl User {
    /// Creates a user.
    pub fn new(id: &str, user_name: &str, mail: &str, country: Option<&str>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            mail: mail.into(),
            country: country.map(Into::into),
        }
    }
}

impl Entity for User {
    fn type_fqn() -> String {
        "fsindex.testkit.User".into()
    }

    fn primary_key(&self) -> &str {
        &self.id
    }

    fn field_value(&self, field: &str) -> Option<String> {
        match field {
            "Id" => Some(self.id.clone()),
            "UserName" => Some(self.user_name.clone()),
            "Mail" => Some(self.mail.clone()),
            "Country" => self.country.clone(),
            _ => None,
        }
    }
}

/// The reference pets.
///
/// Two green hogs share a color and an email prefix, so both non-unique
/// lookups and `Gr*` searches return more than one key.
pub fn pets() -> Vec<Pet> {
    vec![
        Pet::new("rebef-123", "Dog", "Brown", "Waldo", "waldo@dogs.example.com"),
        Pet::new("wefwe-456", "Cat", "White", "Snowy", "snowy@cats.example.com"),
        Pet::new("goefe-789", "Hog", "Green", "Dicky", "Grunty.Dicky@hogs.example.com"),
        Pet::new("xadaf-189", "Hog", "Green", "Ricky", "Grunty.Ricky@hogs.example.com"),
    ]
}

/// Sample user accounts.
pub fn users() -> Vec<User> {
    vec![
        User::new("4c510ada-c86b-4815-8820-42cdf82c3d51", "einstein", "einstein@example.org", Some("de")),
        User::new("f7fbf8c8-139b-4376-b307-cf0a8c2d0d9c", "marie", "marie@example.org", Some("pl")),
        User::new("932b4540-8d16-481e-8ef4-588e4b6b151c", "feynman", "feynman@example.org", Some("us")),
        User::new("058bff95-6708-4fe5-91e4-9ea3d377588b", "moss", "moss@example.org", None),
    ]
}

/// A temporary data directory with automatic cleanup.
pub struct TestDataDir {
    temp_dir: TempDir,
    files_dir: PathBuf,
}

impl TestDataDir {
    /// Creates a data directory with entity files under `<data>/files`.
    pub fn new() -> Self {
        Self::with_files_subdir(fsindex_core::layout::FILES_DIR)
    }

    /// Creates a data directory with entity files under `<data>/<name>`.
    pub fn with_files_subdir(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let files_dir = temp_dir.path().join(name);
        fs::create_dir_all(&files_dir).expect("Failed to create files directory");
        Self {
            temp_dir,
            files_dir,
        }
    }

    /// Returns the data root.
    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns the entity files directory.
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Writes `entity` as JSON to its entity file.
    pub fn write_entity<E: Entity + Serialize>(&self, entity: &E) -> PathBuf {
        let path = self.files_dir.join(entity.primary_key());
        let data = serde_json::to_vec_pretty(entity).expect("Failed to serialize entity");
        fs::write(&path, data).expect("Failed to write entity file");
        path
    }

    /// Writes every entity.
    pub fn write_all<'a, E, I>(&self, entities: I)
    where
        E: Entity + Serialize + 'a,
        I: IntoIterator<Item = &'a E>,
    {
        for entity in entities {
            self.write_entity(entity);
        }
    }

    /// Reads an entity file back.
    pub fn read_entity<E: for<'de> Deserialize<'de>>(&self, primary_key: &str) -> E {
        let data = fs::read(self.files_dir.join(primary_key)).expect("Failed to read entity file");
        serde_json::from_slice(&data).expect("Failed to parse entity file")
    }

    /// Deletes an entity file behind the indexes' back.
    pub fn delete_entity(&self, primary_key: &str) {
        fs::remove_file(self.files_dir.join(primary_key)).expect("Failed to delete entity file");
    }

    /// Builds the configuration for one index in this directory.
    pub fn index_config(&self, type_name: &str, field: &str) -> IndexConfig {
        IndexConfig::new(type_name, field, &self.files_dir, self.data_dir())
    }

    /// Builds an indexer over this directory.
    pub fn indexer(&self) -> Indexer {
        Indexer::new(IndexerConfig::new(self.data_dir()).files_dir(&self.files_dir))
    }

    /// Returns `<data>/index.disk/<root_name>/<rest>`.
    pub fn index_path(&self, root_name: &str, rest: &str) -> PathBuf {
        fsindex_core::layout::index_dir(self.data_dir())
            .join(root_name)
            .join(rest)
    }
}

impl Default for TestDataDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the reference pets into `<data>/pets` and indexes them by `field`
/// in a non-unique index.
pub fn non_unique_pet_index(field: &str) -> (TestDataDir, NonUniqueIndex) {
    let dir = TestDataDir::with_files_subdir("pets");
    let pets = pets();
    dir.write_all(&pets);

    let index = NonUniqueIndex::new(dir.index_config(&Pet::type_fqn(), field))
        .expect("Failed to create index");
    index.init().expect("Failed to init index");
    for pet in &pets {
        let value = pet.field_value(field).expect("Unknown pet field");
        index.add(pet.primary_key(), &value).expect("Failed to add pet");
    }
    (dir, index)
}

/// Writes the reference pets into `<data>/pets` and indexes them by `field`
/// in a unique index.
pub fn unique_pet_index(field: &str) -> (TestDataDir, UniqueIndex) {
    let dir = TestDataDir::with_files_subdir("pets");
    let pets = pets();
    dir.write_all(&pets);

    let index = UniqueIndex::new(dir.index_config(&Pet::type_fqn(), field))
        .expect("Failed to create index");
    index.init().expect("Failed to init index");
    for pet in &pets {
        let value = pet.field_value(field).expect("Unknown pet field");
        index.add(pet.primary_key(), &value).expect("Failed to add pet");
    }
    (dir, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_files_round_trip() {
        let dir = TestDataDir::new();
        let pet = &pets()[0];

        let path = dir.write_entity(pet);
        assert_eq!(path, dir.files_dir().join("rebef-123"));
        assert_eq!(&dir.read_entity::<Pet>("rebef-123"), pet);

        dir.delete_entity("rebef-123");
        assert!(!path.exists());
    }

    #[test]
    fn pet_index_fixture() {
        let (dir, index) = non_unique_pet_index("Kind");
        assert_eq!(index.lookup("Hog").unwrap(), vec!["goefe-789", "xadaf-189"]);
        assert!(dir
            .index_path("non_unique.fsindex.testkit.Pet.Kind", "Dog/rebef-123")
            .exists());
    }

    #[test]
    fn unique_fixture_names_are_distinct() {
        let (_dir, index) = unique_pet_index("Name");
        assert_eq!(index.lookup("Snowy").unwrap(), vec!["wefwe-456"]);
    }
}
