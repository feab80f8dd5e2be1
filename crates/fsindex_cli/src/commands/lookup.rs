//! Lookup command implementation.

use std::path::Path;
use tracing::debug;

/// Runs the lookup command, printing one primary key per line.
pub fn run(
    path: &Path,
    files_dir: Option<&Path>,
    root: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = super::open_index(path, files_dir, root)?;
    let keys = index.lookup(value)?;
    debug!(index = %index.name(), value, found = keys.len(), "lookup done");

    for key in keys {
        println!("{key}");
    }
    Ok(())
}
