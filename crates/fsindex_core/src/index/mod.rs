//! Filesystem index implementations.
//!
//! Both variants use directories and symbolic links as the index itself:
//! an entry exists exactly when the primary key is a member of the value.
//!
//! # Index Types
//!
//! - [`UniqueIndex`]: value -> one primary key, exclusive creation
//! - [`NonUniqueIndex`]: value -> set of primary keys, directory per value
//!
//! # Warning
//!
//! `update` removes and adds in two filesystem steps. A crash or a
//! concurrent reader between them can observe the key under both the old
//! and the new value.

mod entry;
mod non_unique;
mod root;
mod search;
mod traits;
mod unique;

pub(crate) use entry::{list as list_dir, read as read_entry};
pub use non_unique::NonUniqueIndex;
pub use traits::Index;
pub use unique::UniqueIndex;
