// Card enricher
// Resolves canonical card data and per-language display names through a
// tiered lookup: local raw-JSON cache first, then the remote catalog.
// A card either resolves fully or fails as a whole; individual language
// lookups degrade to the canonical name instead of failing the card.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::cache;
use crate::catalog::CatalogSource;
use crate::constants::CANONICAL_LANGUAGE;
use crate::models::{CardFields, CardIdentifier};

/// Where the canonical record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSource {
    Cache,
    Remote,
}

/// A fully resolved card: canonical fields plus a display name for every
/// requested language (possibly the canonical-name fallback).
#[derive(Debug, Clone)]
pub struct ResolvedCard {
    pub fields: CardFields,
    pub source: ResolvedSource,
    pub names: BTreeMap<String, String>,
}

/// Identifier-level enrichment failure. Collected into the migration
/// report, never thrown across identifiers.
#[derive(Debug, Clone)]
pub struct EnrichFailure {
    pub card_id: String,
    pub reason: String,
}

pub struct CardEnricher<'a> {
    catalog: &'a dyn CatalogSource,
    raw_data_path: &'a Path,
}

impl<'a> CardEnricher<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, raw_data_path: &'a Path) -> Self {
        Self {
            catalog,
            raw_data_path,
        }
    }

    /// Resolve canonical data and display names for `id`.
    ///
    /// The canonical (English) record is mandatory: cache miss plus remote
    /// failure fails the whole identifier. Localized names are best-effort.
    pub fn resolve(
        &self,
        id: &CardIdentifier,
        languages: &BTreeSet<String>,
    ) -> std::result::Result<ResolvedCard, EnrichFailure> {
        let (payload, source) = match cache::load_cached(self.raw_data_path, id, CANONICAL_LANGUAGE)
        {
            Some(payload) => (payload, ResolvedSource::Cache),
            None => match self.catalog.fetch_canonical(id) {
                Ok(payload) => (payload, ResolvedSource::Remote),
                Err(e) => {
                    return Err(EnrichFailure {
                        card_id: id.to_string(),
                        reason: e.to_string(),
                    })
                }
            },
        };

        let fields = CardFields::from_payload(&payload);

        let mut names = BTreeMap::new();
        for language in languages {
            let name = self.resolve_name(id, language, &fields.name);
            names.insert(language.clone(), name);
        }

        Ok(ResolvedCard {
            fields,
            source,
            names,
        })
    }

    /// Resolve a display name for one language, falling back to the
    /// canonical name when neither cache nor remote can supply it.
    fn resolve_name(&self, id: &CardIdentifier, language: &str, canonical_name: &str) -> String {
        if language == CANONICAL_LANGUAGE {
            return canonical_name.to_string();
        }

        if let Some(payload) = cache::load_cached(self.raw_data_path, id, language) {
            if let Some(name) = payload.get("name").and_then(|v| v.as_str()) {
                return name.to_string();
            }
        }

        match self.catalog.fetch_localized(id, language) {
            Ok(payload) => payload
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| canonical_name.to_string()),
            Err(e) => {
                log::warn!(
                    "No {} name for {} ({}); using canonical name",
                    language,
                    id,
                    e
                );
                canonical_name.to_string()
            }
        }
    }
}
