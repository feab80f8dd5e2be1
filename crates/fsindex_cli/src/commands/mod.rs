//! CLI command implementations.

pub mod inspect;
pub mod lookup;
pub mod search;
pub mod verify;

use fsindex_core::layout::{self, FILES_DIR};
use fsindex_core::{Index, IndexConfig, IndexKind, IndexRootName, NonUniqueIndex, UniqueIndex};
use std::path::Path;

/// Opens an existing index root by its directory name.
pub(crate) fn open_index(
    data_dir: &Path,
    files_dir: Option<&Path>,
    root: &str,
) -> Result<Box<dyn Index>, Box<dyn std::error::Error>> {
    let name = IndexRootName::parse(root)
        .ok_or_else(|| format!("Not an index root name: {root:?}"))?;
    if !layout::index_root(data_dir, &name).is_dir() {
        return Err(format!("No index {name} found at {:?}", data_dir).into());
    }

    let files_dir = files_dir.map_or_else(|| data_dir.join(FILES_DIR), Path::to_path_buf);
    let config = IndexConfig::new(name.type_name, name.field, files_dir, data_dir);
    let index: Box<dyn Index> = match name.kind {
        IndexKind::Unique => Box::new(UniqueIndex::new(config)?),
        IndexKind::NonUnique => Box::new(NonUniqueIndex::new(config)?),
    };
    Ok(index)
}
