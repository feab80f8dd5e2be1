//! Error types for index operations.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// The four error kinds every index operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup, search, update or remove target is absent.
    NotFound,
    /// A unique value is owned by another primary key.
    AlreadyExists,
    /// Malformed primary key, value, field name or pattern.
    InvalidInput,
    /// The underlying filesystem failed.
    StorageFailure,
}

/// A failure of one field's index inside a registry-wide operation.
#[derive(Debug)]
pub struct FieldFailure {
    /// The indexed field.
    pub field: String,
    /// What went wrong for that field.
    pub error: IndexError,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// Errors that can occur in index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No entry exists for the requested value or key.
    #[error("{what} not found in {index}")]
    NotFound {
        /// Name of the index (its root directory name).
        index: String,
        /// Description of what was looked for.
        what: String,
    },

    /// The value is already taken by a different primary key.
    #[error("value {value:?} in {index} is already owned by {owner:?}")]
    AlreadyExists {
        /// Name of the index.
        index: String,
        /// The contested value.
        value: String,
        /// Primary key currently holding the value.
        owner: String,
    },

    /// The caller passed something that can't be stored.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// A filesystem call failed.
    #[error("storage failure at {}: {source}", path.display())]
    StorageFailure {
        /// Path the failing call operated on.
        path: PathBuf,
        /// The OS error.
        #[source]
        source: io::Error,
    },

    /// One or more fields failed during a registry-wide operation.
    #[error("{} index operation(s) failed for {type_name}: {}", failures.len(), join_failures(failures))]
    Partial {
        /// Entity type the operation ran for.
        type_name: String,
        /// Per-field failures, in field order.
        failures: Vec<FieldFailure>,
    },
}

fn join_failures(failures: &[FieldFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl IndexError {
    /// Creates a not found error.
    pub fn not_found(index: impl Into<String>, what: impl Into<String>) -> Self {
        Self::NotFound {
            index: index.into(),
            what: what.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(
        index: impl Into<String>,
        value: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::AlreadyExists {
            index: index.into(),
            value: value.into(),
            owner: owner.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Wraps an I/O error together with the path it happened on.
    pub fn storage(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::StorageFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the taxonomy kind of this error.
    ///
    /// A `Partial` error reports the kind of its first failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::StorageFailure { .. } => ErrorKind::StorageFailure,
            Self::Partial { failures, .. } => failures
                .first()
                .map_or(ErrorKind::StorageFailure, |f| f.error.kind()),
        }
    }

    /// Returns true for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns true for [`ErrorKind::AlreadyExists`].
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    /// Returns true for [`ErrorKind::InvalidInput`].
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }

    /// Per-field failures of a `Partial` error; empty for every other variant.
    #[must_use]
    pub fn failures(&self) -> &[FieldFailure] {
        match self {
            Self::Partial { failures, .. } => failures,
            _ => &[],
        }
    }
}

impl From<globset::Error> for IndexError {
    fn from(err: globset::Error) -> Self {
        Self::invalid_input(format!("bad glob pattern: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(IndexError::not_found("i", "x").kind(), ErrorKind::NotFound);
        assert!(IndexError::already_exists("i", "v", "pk").is_already_exists());
        assert!(IndexError::invalid_input("bad").is_invalid_input());
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            IndexError::storage("/tmp/x", io).kind(),
            ErrorKind::StorageFailure
        );
    }

    #[test]
    fn partial_reports_first_failure() {
        let err = IndexError::Partial {
            type_name: "pets.Pet".into(),
            failures: vec![
                FieldFailure {
                    field: "Name".into(),
                    error: IndexError::already_exists("unique.pets.Pet.Name", "Rex", "a"),
                },
                FieldFailure {
                    field: "Color".into(),
                    error: IndexError::not_found("non_unique.pets.Pet.Color", "Green"),
                },
            ],
        };

        assert!(err.is_already_exists());
        assert_eq!(err.failures().len(), 2);
        let msg = err.to_string();
        assert!(msg.starts_with("2 index operation(s) failed for pets.Pet"));
        assert!(msg.contains("Color: Green not found"));
    }

    #[test]
    fn glob_error_is_invalid_input() {
        let err: IndexError = globset::Glob::new("[").unwrap_err().into();
        assert!(err.is_invalid_input());
    }
}
