// Cardex constants
// Shared values for paths, catalog languages, and card variants.

/// Separator between set code and in-set number in a catalog ID ("me01-136").
pub const ID_SEPARATOR: char = '-';

/// The authoritative catalog locale. Canonical card data is always English.
pub const CANONICAL_LANGUAGE: &str = "en";

/// Languages the catalog serves localized card data for.
pub const VALID_LANGUAGES: [&str; 11] = [
    "de", "en", "fr", "es", "it", "pt", "ja", "ko", "zh-tw", "th", "id",
];

/// Physical print variants a card can exist in.
pub const VALID_VARIANTS: [&str; 4] = ["normal", "reverse", "holo", "firstEdition"];

/// Default language a physical card is assumed to be printed in.
pub const DEFAULT_LANGUAGE: &str = "de";

// Paths
pub const APP_FOLDER: &str = "cardex";
pub const DB_FILENAME: &str = "cardex.db";
pub const BACKUPS_FOLDER: &str = "backups";
pub const RAW_DATA_FOLDER: &str = "raw_data";
pub const CONFIG_FILENAME: &str = "config.json";

/// Prefix for pre-migration database backup files.
pub const BACKUP_PREFIX: &str = "cardex_legacy";

// Remote catalog
pub const CATALOG_BASE_URL: &str = "https://api.tcgdex.net/v2";
pub const CATALOG_TIMEOUT_SECS: u64 = 15;

/// How many failed identifiers the migration summary prints before eliding.
pub const REPORT_FAILURE_LIMIT: usize = 10;
