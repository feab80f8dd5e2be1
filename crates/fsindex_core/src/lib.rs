//! # fsindex core
//!
//! Secondary indexes stored directly in the filesystem.
//!
//! This crate provides:
//! - Path layout for index roots, values and entries
//! - Unique indexes (one value, one primary key)
//! - Non-unique indexes (one value, many primary keys)
//! - Glob search over indexed values
//! - An [`Indexer`] registry that maintains all indexes of an entity type
//! - Verification of index roots against the entity files
//!
//! There is no in-memory state and no manifest: listing a directory is
//! querying the index.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fsindex_core::{Index, IndexConfig, NonUniqueIndex};
//!
//! let index = NonUniqueIndex::new(IndexConfig::new("pets.Pet", "Color", files_dir, data_dir))?;
//! index.init()?;
//! index.add("goefe-789", "Green")?;
//! assert_eq!(index.lookup("Green")?, vec!["goefe-789"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod index;
mod indexer;
pub mod layout;
pub mod verify;

pub use config::{IndexConfig, IndexerConfig};
pub use error::{ErrorKind, FieldFailure, IndexError, IndexResult};
pub use index::{Index, NonUniqueIndex, UniqueIndex};
pub use indexer::{Entity, IndexAddResult, Indexer};
pub use layout::{IndexKind, IndexRootName};
pub use verify::VerifyReport;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
