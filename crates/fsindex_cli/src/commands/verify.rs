//! Verify command implementation.

use fsindex_core::verify::{discover_roots, verify_root};
use fsindex_core::VerifyReport;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Verification result for one index root.
#[derive(Debug, Serialize)]
pub struct VerifyResult {
    /// Root directory name.
    pub name: String,
    /// Number of entries checked.
    pub entries_checked: usize,
    /// Entries whose entity file is gone.
    pub dangling: Vec<String>,
    /// Value containers without entries.
    pub empty_values: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.dangling.is_empty() && self.empty_values.is_empty()
    }
}

impl From<VerifyReport> for VerifyResult {
    fn from(report: VerifyReport) -> Self {
        let display = |paths: Vec<PathBuf>| -> Vec<String> {
            paths
                .into_iter()
                .map(|p| p.display().to_string())
                .collect()
        };
        Self {
            name: report.name.to_string(),
            entries_checked: report.entries,
            dangling: display(report.dangling),
            empty_values: display(report.empty_values),
        }
    }
}

/// Runs the verify command. Fails when any index has problems.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let results = verify_all(path)?;
    let ok = results.iter().all(VerifyResult::is_ok);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => {
            println!("Verifying indexes at {:?}", path);
            println!();
            for result in &results {
                print_result(result);
            }
            println!();
            if ok {
                println!("✓ Index verification passed");
            } else {
                println!("✗ Index verification failed");
            }
        }
    }

    if ok {
        Ok(())
    } else {
        Err("Verification failed".into())
    }
}

fn verify_all(path: &Path) -> Result<Vec<VerifyResult>, Box<dyn std::error::Error>> {
    let mut results = Vec::new();
    for (name, root) in discover_roots(path)? {
        results.push(verify_root(&name, &root)?.into());
    }
    Ok(results)
}

fn print_result(result: &VerifyResult) {
    println!("{}:", result.name);
    println!("  Entries checked: {}", result.entries_checked);
    println!("  Dangling:        {}", result.dangling.len());
    println!("  Empty values:    {}", result.empty_values.len());

    for path in result.dangling.iter().take(10) {
        println!("    - dangling {path}");
    }
    for path in result.empty_values.iter().take(10) {
        println!("    - empty {path}");
    }
    let shown = result.dangling.len().min(10) + result.empty_values.len().min(10);
    let total = result.dangling.len() + result.empty_values.len();
    if total > shown {
        println!("    ... and {} more", total - shown);
    }
}
