//! Glob matching over the value names of an index root.

use crate::error::IndexResult;
use crate::index::entry;
use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

/// Compiles a single-segment shell glob (`*`, `?`, `[...]`, `{a,b}`).
pub(crate) fn compile(pattern: &str) -> IndexResult<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()?;
    Ok(glob.compile_matcher())
}

/// Returns the value names directly under `root` that match `pattern`, sorted.
///
/// This is a listing snapshot: entries created or removed while it runs
/// may or may not show up.
pub(crate) fn matching_values(root: &Path, pattern: &str) -> IndexResult<Vec<String>> {
    let matcher = compile(pattern)?;
    let names = entry::list(root)?.unwrap_or_default();
    Ok(names
        .into_iter()
        .filter(|name| matcher.is_match(name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn root_with(names: &[&str]) -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        for name in names {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        temp
    }

    #[test]
    fn star_and_question_mark() {
        let root = root_with(&["Green", "Grey", "White", "Gr"]);

        assert_eq!(
            matching_values(root.path(), "Gr*").unwrap(),
            vec!["Gr", "Green", "Grey"]
        );
        assert_eq!(matching_values(root.path(), "Gre?").unwrap(), vec!["Grey"]);
    }

    #[test]
    fn classes_and_alternation() {
        let root = root_with(&["cat", "bat", "rat"]);

        assert_eq!(
            matching_values(root.path(), "[bc]at").unwrap(),
            vec!["bat", "cat"]
        );
        assert_eq!(
            matching_values(root.path(), "{rat,cat}").unwrap(),
            vec!["cat", "rat"]
        );
    }

    #[test]
    fn literal_pattern() {
        let root = root_with(&["jane@example.com", "john@example.com"]);
        assert_eq!(
            matching_values(root.path(), "jane@example.com").unwrap(),
            vec!["jane@example.com"]
        );
        assert!(matching_values(root.path(), "nobody@example.com")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_root_matches_nothing() {
        let temp = tempdir().unwrap();
        assert!(matching_values(&temp.path().join("missing"), "*")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn bad_pattern() {
        let temp = tempdir().unwrap();
        let err = matching_values(temp.path(), "[unclosed").unwrap_err();
        assert!(err.is_invalid_input());
    }
}
