// Remote catalog client
// Thin wrapper around the TCGdex-style REST catalog. The migration engine
// only sees the CatalogSource trait, so tests can substitute a stub.

use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

use crate::constants::{CANONICAL_LANGUAGE, CATALOG_BASE_URL, CATALOG_TIMEOUT_SECS};
use crate::error::{CardexError, Result};
use crate::models::CardIdentifier;

/// Read access to the remote card catalog.
///
/// Both calls return the raw JSON payload; interpreting it is the job of
/// `CardFields::from_payload` so payload-shape drift stays in one place.
pub trait CatalogSource {
    /// Fetch the authoritative-locale (English) record for a card.
    fn fetch_canonical(&self, id: &CardIdentifier) -> Result<Value>;

    /// Fetch the record localized for `language`.
    fn fetch_localized(&self, id: &CardIdentifier, language: &str) -> Result<Value>;
}

/// HTTP catalog client. One reqwest client shared across languages; the
/// language is a path segment, not separate connection state.
pub struct HttpCatalog {
    client: Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new() -> Result<Self> {
        Self::with_base_url(CATALOG_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CATALOG_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch(&self, id: &CardIdentifier, language: &str) -> Result<Value> {
        let url = format!("{}/{}/cards/{}", self.base_url, language, id);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(CardexError::Catalog(format!(
                "Catalog returned {} for {} ({})",
                response.status(),
                id,
                language
            )));
        }

        Ok(response.json()?)
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch_canonical(&self, id: &CardIdentifier) -> Result<Value> {
        self.fetch(id, CANONICAL_LANGUAGE)
    }

    fn fetch_localized(&self, id: &CardIdentifier, language: &str) -> Result<Value> {
        self.fetch(id, language)
    }
}
