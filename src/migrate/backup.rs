// Backup manager
// Whole-file copy of the database to a timestamped path before any
// destructive migration step. Artifacts are additively named, never
// overwritten, and can be copied back over the live database for rollback.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::BACKUP_PREFIX;
use crate::error::{CardexError, Result};

/// Copy the database file into `backups_dir` as
/// `<prefix>_backup_<YYYYMMDD_HHMMSS>.db`.
pub fn create_backup(db_path: &Path, backups_dir: &Path) -> Result<PathBuf> {
    if !db_path.exists() {
        return Err(CardexError::Backup(format!(
            "Database file not found: {}",
            db_path.display()
        )));
    }

    fs::create_dir_all(backups_dir)
        .map_err(|e| CardexError::Backup(format!("Cannot create {}: {}", backups_dir.display(), e)))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut backup_path = backups_dir.join(format!("{}_backup_{}.db", BACKUP_PREFIX, timestamp));

    // Same-second reruns get a numeric suffix instead of clobbering.
    let mut attempt = 1;
    while backup_path.exists() {
        backup_path = backups_dir.join(format!(
            "{}_backup_{}_{}.db",
            BACKUP_PREFIX, timestamp, attempt
        ));
        attempt += 1;
    }

    fs::copy(db_path, &backup_path)
        .map_err(|e| CardexError::Backup(format!("Backup copy failed: {}", e)))?;

    log::info!("Created backup {}", backup_path.display());
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn backup_copies_file_and_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("cardex.db");
        fs::write(&db_path, b"database bytes").unwrap();
        let backups = tmp.path().join("backups");

        let first = create_backup(&db_path, &backups).unwrap();
        let second = create_backup(&db_path, &backups).unwrap();

        assert_ne!(first, second, "repeated backups must get distinct names");
        assert_eq!(fs::read(&first).unwrap(), b"database bytes");
        assert_eq!(fs::read(&second).unwrap(), b"database bytes");

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("cardex_legacy_backup_"));
        assert!(name.ends_with(".db"));
    }

    #[test]
    fn backup_fails_on_missing_source() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.db");
        let err = create_backup(&missing, &tmp.path().join("backups"));
        assert!(err.is_err());
    }
}
