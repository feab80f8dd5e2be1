//! Inspect command implementation.

use fsindex_core::verify::{discover_roots, verify_root};
use serde::Serialize;
use std::path::Path;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory path.
    pub path: String,
    /// Index roots, sorted by name.
    pub indexes: Vec<IndexStats>,
}

/// Statistics for a single index root.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    /// Root directory name.
    pub name: String,
    /// `unique` or `non_unique`.
    pub kind: String,
    /// Entity type.
    pub type_name: String,
    /// Indexed field.
    pub field: String,
    /// Number of distinct values.
    pub values: usize,
    /// Number of entries.
    pub entries: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !fsindex_core::layout::index_dir(path).is_dir() {
        return Err(format!("No indexes found at {:?}", path).into());
    }

    let mut indexes = Vec::new();
    for (name, root) in discover_roots(path)? {
        let report = verify_root(&name, &root)?;
        indexes.push(IndexStats {
            name: name.to_string(),
            kind: name.kind.to_string(),
            type_name: name.type_name,
            field: name.field,
            values: report.values,
            entries: report.entries,
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        indexes,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("fsindex Inspection");
    println!("==================");
    println!();
    println!("Path: {}", result.path);
    println!();

    if result.indexes.is_empty() {
        println!("No index roots.");
        return;
    }

    println!("Indexes:");
    for index in &result.indexes {
        println!(
            "  {:<10} {}.{}: {} values, {} entries",
            index.kind, index.type_name, index.field, index.values, index.entries
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsindex_core::{Index, IndexConfig, UniqueIndex};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn counts_values_and_entries() {
        let temp = tempdir().unwrap();
        let files = temp.path().join("files");
        fs::create_dir_all(&files).unwrap();
        for key in ["a", "b"] {
            fs::write(files.join(key), b"{}").unwrap();
        }
        let name =
            UniqueIndex::new(IndexConfig::new("pets.Pet", "Name", &files, temp.path())).unwrap();
        name.init().unwrap();
        name.add("a", "Rex").unwrap();
        name.add("b", "Tom").unwrap();

        let result = inspect(temp.path()).unwrap();
        assert_eq!(result.indexes.len(), 1);
        let stats = &result.indexes[0];
        assert_eq!(stats.name, "unique.pets.Pet.Name");
        assert_eq!(stats.kind, "unique");
        assert_eq!((stats.values, stats.entries), (2, 2));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["indexes"][0]["field"], "Name");
    }

    #[test]
    fn missing_index_dir() {
        let temp = tempdir().unwrap();
        assert!(inspect(temp.path()).is_err());
    }
}
