//! On-disk layout of the index engine.
//!
//! Everything lives under a data directory:
//!
//! ```text
//! <data>/
//! ├─ files/<pk>                                        # entity payloads (not ours)
//! └─ index.disk/
//!    ├─ unique.<TypeFQN>.<Field>/<value>               # -> files/<pk>
//!    └─ non_unique.<TypeFQN>.<Field>/<value>/<pk>      # -> files/<pk>
//! ```
//!
//! Values and primary keys become path segments verbatim, so anything that
//! is not a plain segment is rejected instead of escaped.

use crate::error::{IndexError, IndexResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory under the data root that holds all index roots.
pub const INDEX_DIR: &str = "index.disk";
/// Default directory under the data root that holds entity files.
pub const FILES_DIR: &str = "files";

const UNIQUE_PREFIX: &str = "unique";
const NON_UNIQUE_PREFIX: &str = "non_unique";

/// Index variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKind {
    /// One value maps to exactly one primary key.
    Unique,
    /// One value maps to a set of primary keys.
    NonUnique,
}

impl IndexKind {
    /// Prefix used for this kind's root directory name.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            IndexKind::Unique => UNIQUE_PREFIX,
            IndexKind::NonUnique => NON_UNIQUE_PREFIX,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Parsed name of an index root directory, e.g. `unique.pets.Pet.Name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexRootName {
    /// Index variant.
    pub kind: IndexKind,
    /// Fully qualified entity type name.
    pub type_name: String,
    /// Indexed field.
    pub field: String,
}

impl IndexRootName {
    /// Creates a root name, validating the type and field parts.
    pub fn new(
        kind: IndexKind,
        type_name: impl Into<String>,
        field: impl Into<String>,
    ) -> IndexResult<Self> {
        let type_name = type_name.into();
        let field = field.into();
        check_segment("type name", &type_name)?;
        check_segment("field", &field)?;
        if field.contains('.') {
            return Err(IndexError::invalid_input(format!(
                "field {field:?} must not contain '.'"
            )));
        }
        Ok(Self {
            kind,
            type_name,
            field,
        })
    }

    /// Parses a directory name back into its parts.
    ///
    /// Returns `None` for names that are not index roots.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        // `non_unique` must be tried first, `unique` is its suffix.
        let (kind, rest) = if let Some(rest) = name.strip_prefix("non_unique.") {
            (IndexKind::NonUnique, rest)
        } else if let Some(rest) = name.strip_prefix("unique.") {
            (IndexKind::Unique, rest)
        } else {
            return None;
        };
        let (type_name, field) = rest.rsplit_once('.')?;
        Self::new(kind, type_name, field).ok()
    }
}

impl fmt::Display for IndexRootName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.kind, self.type_name, self.field)
    }
}

/// Returns `<data>/index.disk`.
#[must_use]
pub fn index_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(INDEX_DIR)
}

/// Returns the root directory of one index.
#[must_use]
pub fn index_root(data_dir: &Path, name: &IndexRootName) -> PathBuf {
    index_dir(data_dir).join(name.to_string())
}

/// Returns the path of the entity file for `primary_key`.
#[must_use]
pub fn entity_path(files_dir: &Path, primary_key: &str) -> PathBuf {
    files_dir.join(primary_key)
}

/// Recovers the primary key from an entry target or non-unique entry path.
#[must_use]
pub fn primary_key_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

/// Converts a stable Rust type path into a type name usable in a root name.
///
/// `my_app::model::Pet` becomes `my_app.model.Pet`.
#[must_use]
pub fn type_fqn<T: ?Sized>() -> String {
    std::any::type_name::<T>().replace("::", ".")
}

/// Checks that `value` can be used as a value segment.
pub fn validate_value(value: &str) -> IndexResult<()> {
    check_segment("value", value)
}

/// Checks that `primary_key` can be used as a key segment.
pub fn validate_primary_key(primary_key: &str) -> IndexResult<()> {
    check_segment("primary key", primary_key)
}

fn check_segment(what: &str, segment: &str) -> IndexResult<()> {
    if segment.is_empty() {
        return Err(IndexError::invalid_input(format!("{what} must not be empty")));
    }
    if segment == "." || segment == ".." {
        return Err(IndexError::invalid_input(format!(
            "{what} {segment:?} is not a valid path segment"
        )));
    }
    if segment.contains(['/', '\\', '\0']) {
        return Err(IndexError::invalid_input(format!(
            "{what} {segment:?} contains a path separator or NUL"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_paths() {
        let data = Path::new("/srv/data");
        let unique = IndexRootName::new(IndexKind::Unique, "pets.Pet", "Name").unwrap();
        let non_unique = IndexRootName::new(IndexKind::NonUnique, "pets.Pet", "Color").unwrap();

        assert_eq!(
            index_root(data, &unique),
            Path::new("/srv/data/index.disk/unique.pets.Pet.Name")
        );
        assert_eq!(
            index_root(data, &non_unique),
            Path::new("/srv/data/index.disk/non_unique.pets.Pet.Color")
        );
    }

    #[test]
    fn parse_root_name() {
        let name = IndexRootName::parse("non_unique.accounts.model.User.Mail").unwrap();
        assert_eq!(name.kind, IndexKind::NonUnique);
        assert_eq!(name.type_name, "accounts.model.User");
        assert_eq!(name.field, "Mail");

        let name = IndexRootName::parse("unique.User.Id").unwrap();
        assert_eq!(name.kind, IndexKind::Unique);
        assert_eq!(name.to_string(), "unique.User.Id");

        assert!(IndexRootName::parse("unique.NoField").is_none());
        assert!(IndexRootName::parse("files").is_none());
        assert!(IndexRootName::parse("btree.User.Id").is_none());
    }

    #[test]
    fn field_with_dot_rejected() {
        let err = IndexRootName::new(IndexKind::Unique, "User", "a.b").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn segment_validation() {
        assert!(validate_value("Green").is_ok());
        assert!(validate_value("jane@example.com").is_ok());
        assert!(validate_value("with space").is_ok());

        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(validate_value(bad).unwrap_err().is_invalid_input(), "{bad:?}");
            assert!(validate_primary_key(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn primary_key_from_path() {
        let path = entity_path(Path::new("/srv/data/files"), "goefe-789");
        assert_eq!(primary_key_of(&path).as_deref(), Some("goefe-789"));
    }

    #[test]
    fn type_fqn_has_no_colons() {
        struct Pet;
        let name = type_fqn::<Pet>();
        assert!(!name.contains("::"));
        assert!(name.ends_with(".Pet"));
    }

    fn kind_strategy() -> impl Strategy<Value = IndexKind> {
        prop_oneof![Just(IndexKind::Unique), Just(IndexKind::NonUnique)]
    }

    proptest! {
        #[test]
        fn root_name_round_trip(
            kind in kind_strategy(),
            type_name in "[a-z_]{1,8}(\\.[A-Za-z_][A-Za-z0-9_]{0,8}){0,3}",
            field in "[A-Za-z_][A-Za-z0-9_]{0,12}",
        ) {
            let name = IndexRootName::new(kind, type_name.as_str(), field.as_str()).unwrap();
            let parsed = IndexRootName::parse(&name.to_string()).unwrap();
            prop_assert_eq!(parsed, name);
        }

        #[test]
        fn plain_segments_are_valid(segment in "[^/\\\\\\x00]{1,24}") {
            prop_assume!(segment != "." && segment != "..");
            prop_assert!(validate_value(&segment).is_ok());
            prop_assert!(validate_primary_key(&segment).is_ok());
        }
    }
}
