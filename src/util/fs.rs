//! Filesystem helpers for store file discovery.
//!
//! Cronos databases are often copied off case-insensitive filesystems, so
//! `CroBank.dat` may show up as `CROBANK.DAT` or `crobank.dat`.
//! [`find_store_file`] matches names without regard to case.

use std::path::{Path, PathBuf};

use crate::CroError;

/// Find `Cro<name>.<ext>` in `dir`, ignoring case.
///
/// Returns `Ok(None)` when no file matches. An exact-case match wins over
/// other spellings; otherwise the first match in sorted order is used.
pub fn find_store_file(dir: &Path, name: &str, ext: &str) -> Result<Option<PathBuf>, CroError> {
    let wanted = format!("cro{}.{}", name, ext).to_ascii_lowercase();
    let exact = format!("Cro{}.{}", name, ext);

    let entries = std::fs::read_dir(dir)
        .map_err(|e| CroError::Io(format!("Cannot read directory {}: {}", dir.display(), e)))?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| CroError::Io(format!("Cannot read directory entry: {}", e)))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if file_name == exact {
            return Ok(Some(path));
        }
        if file_name.to_ascii_lowercase() == wanted {
            matches.push(path);
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_finds_exact_name() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("CroBank.dat")).unwrap();
        let found = find_store_file(dir.path(), "Bank", "dat").unwrap();
        assert_eq!(found, Some(dir.path().join("CroBank.dat")));
    }

    #[test]
    fn test_ignores_case() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("CROSTRU.TAD")).unwrap();
        let found = find_store_file(dir.path(), "Stru", "tad").unwrap();
        assert_eq!(found, Some(dir.path().join("CROSTRU.TAD")));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("CroBank.tad")).unwrap();
        assert_eq!(find_store_file(dir.path(), "Bank", "dat").unwrap(), None);
        assert_eq!(find_store_file(dir.path(), "Sys", "tad").unwrap(), None);
    }

    #[test]
    fn test_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("crobank.dat")).unwrap();
        assert_eq!(find_store_file(dir.path(), "Bank", "dat").unwrap(), None);
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(find_store_file(&missing, "Bank", "dat").is_err());
    }
}
