// Configuration handling
// A small JSON config file records where the database, backups, and raw
// catalog cache live. Missing or corrupted config falls back to defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_FOLDER, BACKUPS_FOLDER, CONFIG_FILENAME, DB_FILENAME, RAW_DATA_FOLDER,
};
use crate::error::{CardexError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub backups_path: PathBuf,
    pub raw_data_path: PathBuf,
}

impl Config {
    /// Default layout under the OS data directory
    /// (~/.local/share/cardex on Linux, %LOCALAPPDATA%\cardex on Windows).
    pub fn default_layout() -> Result<Self> {
        let data_dir = data_dir()?;
        Ok(Self {
            db_path: data_dir.join(DB_FILENAME),
            backups_path: data_dir.join(BACKUPS_FOLDER),
            raw_data_path: data_dir.join(RAW_DATA_FOLDER),
        })
    }

    /// Derive a config from a user-chosen database location. A directory
    /// gets the default DB filename inside it; a file path is used as-is.
    pub fn with_db_path(path: &Path) -> Result<Self> {
        let db_path = if path.is_dir() || path.extension().is_none() {
            path.join(DB_FILENAME)
        } else {
            path.to_path_buf()
        };

        let base = db_path
            .parent()
            .ok_or_else(|| CardexError::Config(format!("Invalid db path: {}", path.display())))?
            .to_path_buf();

        Ok(Self {
            backups_path: base.join(BACKUPS_FOLDER),
            raw_data_path: base.join(RAW_DATA_FOLDER),
            db_path,
        })
    }

    /// Create the data directories this config points at.
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.backups_path)?;
        fs::create_dir_all(&self.raw_data_path)?;
        Ok(())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", APP_FOLDER)
        .ok_or_else(|| CardexError::Config("Cannot determine home directory".to_string()))
}

fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn config_file() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILENAME))
}

/// Load config from disk, falling back to defaults when the file is missing
/// or unreadable. A corrupted config must never block the CLI.
pub fn load_config() -> Result<Config> {
    let path = config_file()?;
    if path.exists() {
        match fs::read_to_string(&path)
            .map_err(CardexError::from)
            .and_then(|text| serde_json::from_str::<Config>(&text).map_err(CardexError::from))
        {
            Ok(config) => return Ok(config),
            Err(e) => {
                log::warn!("Ignoring corrupted config {}: {}", path.display(), e);
            }
        }
    }
    Config::default_layout()
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_file()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_db_path_accepts_directory() {
        let config = Config::with_db_path(Path::new("/tmp/cardex-data")).unwrap();
        assert_eq!(config.db_path, Path::new("/tmp/cardex-data").join(DB_FILENAME));
        assert_eq!(
            config.backups_path,
            Path::new("/tmp/cardex-data").join(BACKUPS_FOLDER)
        );
    }

    #[test]
    fn with_db_path_accepts_explicit_file() {
        let config = Config::with_db_path(Path::new("/tmp/collection.db")).unwrap();
        assert_eq!(config.db_path, Path::new("/tmp/collection.db"));
        assert_eq!(config.backups_path, Path::new("/tmp").join(BACKUPS_FOLDER));
    }
}
