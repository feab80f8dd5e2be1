//! # fsindex Testkit
//!
//! Test utilities for fsindex.
//!
//! This crate provides:
//! - Sample entities and temporary data directories
//! - Property-based test generators using proptest
//! - Concurrent stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fsindex_testkit::prelude::*;
//!
//! #[test]
//! fn lookup_green_pets() {
//!     let (_dir, index) = non_unique_pet_index("Color");
//!     assert_eq!(index.lookup("Green").unwrap(), vec!["goefe-789", "xadaf-189"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use fsindex_core::{Entity, Index, IndexError, IndexKind};
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
