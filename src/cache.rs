// Local raw-catalog cache
// Raw catalog payloads saved as JSON under <raw_data>/cards/. The English
// record is `<id>.json`, localized records are `<id>.<lang>.json`. This is
// the cheap tier of the enricher's tiered lookup.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CANONICAL_LANGUAGE;
use crate::error::Result;
use crate::models::CardIdentifier;

fn card_file(raw_data_path: &Path, id: &CardIdentifier, language: &str) -> PathBuf {
    let name = if language == CANONICAL_LANGUAGE {
        format!("{}.json", id)
    } else {
        format!("{}.{}.json", id, language)
    };
    raw_data_path.join("cards").join(name)
}

/// Load a cached payload for a card in the given language.
///
/// Returns None on a cache miss. An unreadable or corrupted cache file is
/// also treated as a miss (logged) so the remote tier gets a chance.
pub fn load_cached(raw_data_path: &Path, id: &CardIdentifier, language: &str) -> Option<Value> {
    let path = card_file(raw_data_path, id, language);
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Corrupted cache file {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Cannot read cache file {}: {}", path.display(), e);
            None
        }
    }
}

/// Save a raw payload so later lookups hit the cache instead of the network.
pub fn save_cached(
    raw_data_path: &Path,
    id: &CardIdentifier,
    language: &str,
    payload: &Value,
) -> Result<()> {
    let path = card_file(raw_data_path, id, language);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn roundtrip_and_miss() {
        let tmp = TempDir::new().unwrap();
        let id = CardIdentifier::new("me01", "001");

        assert!(load_cached(tmp.path(), &id, "en").is_none());

        let payload = json!({"name": "Bisasam"});
        save_cached(tmp.path(), &id, "de", &payload).unwrap();

        assert_eq!(load_cached(tmp.path(), &id, "de"), Some(payload));
        // English record lives under a different file name
        assert!(load_cached(tmp.path(), &id, "en").is_none());
    }

    #[test]
    fn corrupted_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let id = CardIdentifier::new("me01", "002");
        let dir = tmp.path().join("cards");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("me01-002.json"), "not json {").unwrap();

        assert!(load_cached(tmp.path(), &id, "en").is_none());
    }
}
