//! Search command implementation.

use std::path::Path;
use tracing::debug;

/// Runs the search command, printing one entity file per line.
pub fn run(
    path: &Path,
    files_dir: Option<&Path>,
    root: &str,
    pattern: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = super::open_index(path, files_dir, root)?;
    let targets = index.search(pattern)?;
    debug!(index = %index.name(), pattern, found = targets.len(), "search done");

    for target in targets {
        println!("{}", target.display());
    }
    Ok(())
}
