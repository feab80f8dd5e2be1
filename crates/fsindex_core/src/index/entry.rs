//! A single index entry on disk.
//!
//! On unix an entry is a symbolic link to the entity file. Elsewhere it is
//! a marker file holding the target path. Either way creation is exclusive:
//! it fails with [`io::ErrorKind::AlreadyExists`] instead of overwriting.

use crate::error::{IndexError, IndexResult};
use crate::layout;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Re-reads of a marker that is still being written.
#[cfg(not(unix))]
const MARKER_WAIT_ATTEMPTS: usize = 50;

/// Creates `link` pointing at `target`.
#[cfg(unix)]
pub(crate) fn create(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Creates `link` pointing at `target`.
#[cfg(not(unix))]
pub(crate) fn create(link: &Path, target: &Path) -> io::Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(link)?;
    file.write_all(target.to_string_lossy().as_bytes())
}

/// Reads the target of `link`.
#[cfg(unix)]
pub(crate) fn read(link: &Path) -> io::Result<PathBuf> {
    fs::read_link(link)
}

/// Reads the target of `link`.
///
/// A marker is empty between its exclusive creation and the write of its
/// target. An empty marker is re-read for a short while before it is
/// reported as is.
#[cfg(not(unix))]
pub(crate) fn read(link: &Path) -> io::Result<PathBuf> {
    for _ in 0..MARKER_WAIT_ATTEMPTS {
        let target = fs::read_to_string(link)?;
        if !target.is_empty() {
            return Ok(PathBuf::from(target));
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    fs::read_to_string(link).map(PathBuf::from)
}

/// Removes `link` without touching its target.
pub(crate) fn remove(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

/// Returns the primary key `link` points at, or `None` if there is no entry.
pub(crate) fn owner(link: &Path) -> IndexResult<Option<String>> {
    match read(link) {
        Ok(target) => Ok(layout::primary_key_of(&target)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IndexError::storage(link, e)),
    }
}

/// Lists the names in `dir`, sorted. Names that are not UTF-8 are skipped.
///
/// Returns `Ok(None)` if `dir` does not exist.
pub(crate) fn list(dir: &Path) -> IndexResult<Option<Vec<String>>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(IndexError::storage(dir, e)),
    };

    let mut names = Vec::new();
    for item in read_dir {
        let item = item.map_err(|e| IndexError::storage(dir, e))?;
        if let Ok(name) = item.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(Some(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_is_exclusive() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("Green");
        let a = temp.path().join("files").join("a");
        let b = temp.path().join("files").join("b");

        create(&link, &a).unwrap();
        let err = create(&link, &b).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(read(&link).unwrap(), a);
    }

    #[test]
    fn owner_of_missing_entry() {
        let temp = tempdir().unwrap();
        assert_eq!(owner(&temp.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn owner_is_target_file_name() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("Green");
        create(&link, &temp.path().join("files").join("goefe-789")).unwrap();

        assert_eq!(owner(&link).unwrap().as_deref(), Some("goefe-789"));
        remove(&link).unwrap();
        assert_eq!(owner(&link).unwrap(), None);
    }

    #[cfg(not(unix))]
    #[test]
    fn read_waits_for_marker_target() {
        let temp = tempdir().unwrap();
        let link = temp.path().join("Green");
        let target = temp.path().join("files").join("goefe-789");
        fs::File::create(&link).unwrap();

        let writer = {
            let (link, target) = (link.clone(), target.clone());
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(5));
                fs::write(&link, target.to_string_lossy().as_bytes()).unwrap();
            })
        };

        assert_eq!(read(&link).unwrap(), target);
        writer.join().unwrap();
    }

    #[test]
    fn list_sorted() {
        let temp = tempdir().unwrap();
        for name in ["b", "c", "a"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        assert_eq!(list(temp.path()).unwrap().unwrap(), vec!["a", "b", "c"]);
        assert!(list(&temp.path().join("missing")).unwrap().is_none());
    }
}
