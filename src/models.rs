// Domain types shared between the catalog client, cache, and database layers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::constants::{ID_SEPARATOR, VALID_LANGUAGES, VALID_VARIANTS};
use crate::error::{CardexError, Result};

/// Composite key for a card: catalog set code plus in-set number.
///
/// Formatted as `<set_code>-<number>` (e.g. "me01-136"). Numbers may contain
/// further dashes, so parsing splits on the first separator only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardIdentifier {
    pub set_code: String,
    pub number: String,
}

impl CardIdentifier {
    pub fn new(set_code: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            set_code: set_code.into(),
            number: number.into(),
        }
    }

    /// Parse a full catalog ID like "me01-136".
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.split_once(ID_SEPARATOR) {
            Some((set_code, number)) if !set_code.is_empty() && !number.is_empty() => {
                Ok(Self::new(set_code, number))
            }
            _ => Err(CardexError::InvalidCardId(raw.to_string())),
        }
    }
}

impl fmt::Display for CardIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.set_code, ID_SEPARATOR, self.number)
    }
}

/// Validate an ISO language code against the catalog's supported set.
pub fn validate_language(language: &str) -> Result<()> {
    if VALID_LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(CardexError::InvalidLanguage(format!(
            "{} (valid: {})",
            language,
            VALID_LANGUAGES.join(", ")
        )))
    }
}

/// Validate a card variant name.
pub fn validate_variant(variant: &str) -> Result<()> {
    if VALID_VARIANTS.contains(&variant) {
        Ok(())
    } else {
        Err(CardexError::InvalidVariant(format!(
            "{} (valid: {})",
            variant,
            VALID_VARIANTS.join(", ")
        )))
    }
}

/// Which print variants the catalog lists as existing for a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardVariants {
    pub normal: bool,
    pub reverse: bool,
    pub holo: bool,
    pub first_edition: bool,
}

impl CardVariants {
    pub fn from_payload(value: &Value) -> Self {
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        Self {
            normal: flag("normal"),
            reverse: flag("reverse"),
            holo: flag("holo"),
            first_edition: flag("firstEdition"),
        }
    }

    pub fn is_available(&self, variant: &str) -> bool {
        match variant {
            "normal" => self.normal,
            "reverse" => self.reverse,
            "holo" => self.holo,
            "firstEdition" => self.first_edition,
            _ => false,
        }
    }

    pub fn available_list(&self) -> Vec<&'static str> {
        VALID_VARIANTS
            .iter()
            .copied()
            .filter(|v| self.is_available(v))
            .collect()
    }
}

/// Canonical (English) card data as delivered by the catalog.
///
/// This is the one place catalog payload shapes are interpreted. Every field
/// except `name` is optional; absent or malformed fields default to None
/// rather than failing the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFields {
    pub name: String,
    pub rarity: Option<String>,
    pub types: Vec<String>,
    pub hp: Option<i64>,
    pub stage: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub price_eur: Option<f64>,
    pub price_usd: Option<f64>,
    pub legal_standard: Option<bool>,
    pub legal_expanded: Option<bool>,
    pub variants: CardVariants,
}

impl CardFields {
    /// Best-effort extraction from a raw catalog payload.
    ///
    /// The catalog has shipped several payload shapes over time ("hp" as a
    /// number or numeric string, missing "legal" blocks, bare image asset
    /// URLs). All of that tolerance lives here so payload drift is a
    /// one-place change.
    pub fn from_payload(value: &Value) -> Self {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();

        let hp = match value.get("hp") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };

        let types = value
            .get("types")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let legal = value.get("legal");
        let legal_flag = |key: &str| legal.and_then(|l| l.get(key)).and_then(Value::as_bool);

        let image_url = value
            .get("image")
            .and_then(Value::as_str)
            .map(normalize_image_url);

        let variants = value
            .get("variants")
            .map(CardVariants::from_payload)
            .unwrap_or_default();

        Self {
            name,
            rarity: string_field(value, "rarity"),
            types,
            hp,
            stage: string_field(value, "stage"),
            category: string_field(value, "category"),
            image_url,
            price_eur: None,
            price_usd: None,
            legal_standard: legal_flag("standard"),
            legal_expanded: legal_flag("expanded"),
            variants,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// The catalog returns bare asset URLs without quality/format suffix.
fn normalize_image_url(url: &str) -> String {
    if url.ends_with(".png") || url.ends_with(".jpg") || url.ends_with(".webp") {
        url.to_string()
    } else {
        format!("{}/high.png", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifier_roundtrip() {
        let id = CardIdentifier::parse("me01-136").unwrap();
        assert_eq!(id.set_code, "me01");
        assert_eq!(id.number, "136");
        assert_eq!(id.to_string(), "me01-136");
    }

    #[test]
    fn identifier_splits_on_first_separator_only() {
        let id = CardIdentifier::parse("swsh12-TG-05").unwrap();
        assert_eq!(id.set_code, "swsh12");
        assert_eq!(id.number, "TG-05");
    }

    #[test]
    fn identifier_rejects_malformed_input() {
        assert!(CardIdentifier::parse("me01136").is_err());
        assert!(CardIdentifier::parse("-136").is_err());
        assert!(CardIdentifier::parse("me01-").is_err());
    }

    #[test]
    fn card_fields_from_full_payload() {
        let payload = json!({
            "id": "me01-136",
            "name": "Glurak",
            "rarity": "Rare",
            "types": ["Fire"],
            "hp": 170,
            "stage": "Stage2",
            "category": "Pokemon",
            "image": "https://assets.example.net/en/me/me01/136",
            "legal": {"standard": true, "expanded": true},
            "variants": {"normal": true, "holo": true}
        });

        let fields = CardFields::from_payload(&payload);
        assert_eq!(fields.name, "Glurak");
        assert_eq!(fields.hp, Some(170));
        assert_eq!(fields.types, vec!["Fire"]);
        assert_eq!(fields.legal_standard, Some(true));
        assert_eq!(
            fields.image_url.as_deref(),
            Some("https://assets.example.net/en/me/me01/136/high.png")
        );
        assert!(fields.variants.normal);
        assert!(!fields.variants.reverse);
        assert_eq!(fields.variants.available_list(), vec!["normal", "holo"]);
    }

    #[test]
    fn card_fields_tolerates_sparse_payload() {
        let fields = CardFields::from_payload(&json!({"name": "Trainer Card"}));
        assert_eq!(fields.name, "Trainer Card");
        assert!(fields.types.is_empty());
        assert_eq!(fields.hp, None);
        assert_eq!(fields.legal_standard, None);
    }

    #[test]
    fn card_fields_parses_hp_from_string() {
        let fields = CardFields::from_payload(&json!({"name": "X", "hp": "60"}));
        assert_eq!(fields.hp, Some(60));
    }

    #[test]
    fn missing_name_defaults_to_unknown() {
        let fields = CardFields::from_payload(&json!({}));
        assert_eq!(fields.name, "Unknown");
    }

    #[test]
    fn language_and_variant_validation() {
        assert!(validate_language("de").is_ok());
        assert!(validate_language("xx").is_err());
        assert!(validate_variant("reverse").is_ok());
        assert!(validate_variant("shiny").is_err());
    }
}
