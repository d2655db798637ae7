// Current-layout schema and typed query helpers
// Three normalized tables: canonical card data, localized names, ownership.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CardFields, CardIdentifier};

/// Current-layout DDL. Canonical card data is keyed by the full catalog ID;
/// names and ownership reference it.
pub const CREATE_SCHEMA: &str = r#"
-- Canonical (English) card data
CREATE TABLE IF NOT EXISTS cards (
    card_id TEXT PRIMARY KEY,
    set_code TEXT NOT NULL,
    number TEXT NOT NULL,
    name TEXT NOT NULL,
    rarity TEXT,
    types TEXT,
    hp INTEGER,
    stage TEXT,
    category TEXT,
    image_url TEXT,
    price_eur REAL,
    price_usd REAL,
    legal_standard INTEGER,
    legal_expanded INTEGER,
    last_synced_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Localized display names
CREATE TABLE IF NOT EXISTS card_names (
    card_id TEXT NOT NULL,
    language TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (card_id, language)
);

-- Ownership records (one row per card/variant/language)
CREATE TABLE IF NOT EXISTS owned_cards (
    card_id TEXT NOT NULL,
    variant TEXT NOT NULL,
    language TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity >= 1),
    added_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (card_id, variant, language)
);

CREATE INDEX IF NOT EXISTS idx_cards_set_code ON cards(set_code);
CREATE INDEX IF NOT EXISTS idx_owned_cards_card ON owned_cards(card_id);
CREATE INDEX IF NOT EXISTS idx_card_names_card ON card_names(card_id);
"#;

pub fn create_current_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_SCHEMA)?;
    Ok(())
}

// ----- Canonical cards -----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalCard {
    pub card_id: String,
    pub set_code: String,
    pub number: String,
    pub name: String,
    pub rarity: Option<String>,
    pub types: Option<String>,
    pub hp: Option<i64>,
    pub stage: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub price_eur: Option<f64>,
    pub price_usd: Option<f64>,
    pub legal_standard: Option<bool>,
    pub legal_expanded: Option<bool>,
    pub last_synced_at: String,
}

/// Insert or overwrite the canonical record for a card.
pub fn upsert_card(conn: &Connection, id: &CardIdentifier, fields: &CardFields) -> Result<()> {
    let types_json = if fields.types.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&fields.types)?)
    };

    conn.execute(
        "INSERT OR REPLACE INTO cards (
            card_id, set_code, number, name, rarity, types, hp, stage,
            category, image_url, price_eur, price_usd,
            legal_standard, legal_expanded, last_synced_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, datetime('now'))",
        params![
            id.to_string(),
            id.set_code,
            id.number,
            fields.name,
            fields.rarity,
            types_json,
            fields.hp,
            fields.stage,
            fields.category,
            fields.image_url,
            fields.price_eur,
            fields.price_usd,
            fields.legal_standard,
            fields.legal_expanded,
        ],
    )?;
    Ok(())
}

pub fn get_card(conn: &Connection, id: &CardIdentifier) -> Result<Option<CanonicalCard>> {
    let result = conn
        .query_row(
            "SELECT card_id, set_code, number, name, rarity, types, hp, stage,
                    category, image_url, price_eur, price_usd,
                    legal_standard, legal_expanded, last_synced_at
             FROM cards WHERE card_id = ?1",
            params![id.to_string()],
            |row| {
                Ok(CanonicalCard {
                    card_id: row.get(0)?,
                    set_code: row.get(1)?,
                    number: row.get(2)?,
                    name: row.get(3)?,
                    rarity: row.get(4)?,
                    types: row.get(5)?,
                    hp: row.get(6)?,
                    stage: row.get(7)?,
                    category: row.get(8)?,
                    image_url: row.get(9)?,
                    price_eur: row.get(10)?,
                    price_usd: row.get(11)?,
                    legal_standard: row.get(12)?,
                    legal_expanded: row.get(13)?,
                    last_synced_at: row.get(14)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

// ----- Localized names -----

pub fn upsert_card_name(
    conn: &Connection,
    id: &CardIdentifier,
    language: &str,
    name: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO card_names (card_id, language, name) VALUES (?1, ?2, ?3)",
        params![id.to_string(), language, name],
    )?;
    Ok(())
}

pub fn get_card_name(
    conn: &Connection,
    id: &CardIdentifier,
    language: &str,
) -> Result<Option<String>> {
    let result = conn
        .query_row(
            "SELECT name FROM card_names WHERE card_id = ?1 AND language = ?2",
            params![id.to_string(), language],
            |row| row.get(0),
        )
        .optional()?;
    Ok(result)
}

// ----- Ownership -----

/// A row from the joined collection view: ownership plus canonical data
/// plus the display name in the owned language (canonical name when no
/// localized name is stored).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedCardView {
    pub card_id: String,
    pub set_code: String,
    pub number: String,
    pub variant: String,
    pub language: String,
    pub quantity: i64,
    pub display_name: String,
    pub rarity: Option<String>,
}

/// Write an ownership row with an exact quantity (migration path).
pub fn upsert_owned_card(
    conn: &Connection,
    id: &CardIdentifier,
    variant: &str,
    language: &str,
    quantity: i64,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO owned_cards (card_id, variant, language, quantity)
         VALUES (?1, ?2, ?3, ?4)",
        params![id.to_string(), variant, language, quantity],
    )?;
    Ok(())
}

/// Add quantity to an ownership row, creating it if absent.
/// Returns the new quantity.
pub fn add_owned_quantity(
    conn: &Connection,
    id: &CardIdentifier,
    variant: &str,
    language: &str,
    quantity: i64,
) -> Result<i64> {
    let new_quantity = conn.query_row(
        "INSERT INTO owned_cards (card_id, variant, language, quantity)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(card_id, variant, language)
         DO UPDATE SET quantity = quantity + ?4, updated_at = datetime('now')
         RETURNING quantity",
        params![id.to_string(), variant, language, quantity],
        |row| row.get(0),
    )?;
    Ok(new_quantity)
}

/// Remove quantity from an ownership row. The row is deleted when the
/// quantity reaches zero; zero-quantity rows are never stored.
/// Returns the remaining quantity, or None if the row was deleted or absent.
pub fn remove_owned_quantity(
    conn: &Connection,
    id: &CardIdentifier,
    variant: &str,
    language: &str,
    quantity: i64,
) -> Result<Option<i64>> {
    let current: Option<i64> = conn
        .query_row(
            "SELECT quantity FROM owned_cards
             WHERE card_id = ?1 AND variant = ?2 AND language = ?3",
            params![id.to_string(), variant, language],
            |row| row.get(0),
        )
        .optional()?;

    let Some(current) = current else {
        return Ok(None);
    };

    let remaining = current - quantity;
    if remaining <= 0 {
        conn.execute(
            "DELETE FROM owned_cards WHERE card_id = ?1 AND variant = ?2 AND language = ?3",
            params![id.to_string(), variant, language],
        )?;
        Ok(None)
    } else {
        conn.execute(
            "UPDATE owned_cards SET quantity = ?4, updated_at = datetime('now')
             WHERE card_id = ?1 AND variant = ?2 AND language = ?3",
            params![id.to_string(), variant, language, remaining],
        )?;
        Ok(Some(remaining))
    }
}

/// List the collection, optionally filtered by set code and/or language.
pub fn list_owned_cards(
    conn: &Connection,
    set_code: Option<&str>,
    language: Option<&str>,
) -> Result<Vec<OwnedCardView>> {
    let mut sql = String::from(
        "SELECT o.card_id, c.set_code, c.number, o.variant, o.language, o.quantity,
                COALESCE(n.name, c.name), c.rarity
         FROM owned_cards o
         JOIN cards c ON o.card_id = c.card_id
         LEFT JOIN card_names n ON o.card_id = n.card_id AND o.language = n.language
         WHERE 1=1",
    );

    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    if let Some(set_code) = set_code {
        sql.push_str(&format!(" AND c.set_code = ?{}", args.len() + 1));
        args.push(Box::new(set_code.to_string()));
    }
    if let Some(language) = language {
        sql.push_str(&format!(" AND o.language = ?{}", args.len() + 1));
        args.push(Box::new(language.to_string()));
    }
    sql.push_str(" ORDER BY c.set_code, c.number, o.variant, o.language");

    let mut stmt = conn.prepare(&sql)?;
    let arg_refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|a| a.as_ref()).collect();
    let views = stmt
        .query_map(arg_refs.as_slice(), |row| {
            Ok(OwnedCardView {
                card_id: row.get(0)?,
                set_code: row.get(1)?,
                number: row.get(2)?,
                variant: row.get(3)?,
                language: row.get(4)?,
                quantity: row.get(5)?,
                display_name: row.get(6)?,
                rarity: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardFields;
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        create_current_schema(&conn).unwrap();
        conn
    }

    fn sample_fields(name: &str) -> CardFields {
        CardFields::from_payload(&json!({"name": name, "rarity": "Common", "types": ["Grass"]}))
    }

    #[test]
    fn card_upsert_overwrites_by_id() {
        let conn = test_conn();
        let id = CardIdentifier::new("me01", "001");

        upsert_card(&conn, &id, &sample_fields("First")).unwrap();
        upsert_card(&conn, &id, &sample_fields("Second")).unwrap();

        let card = get_card(&conn, &id).unwrap().unwrap();
        assert_eq!(card.name, "Second");
        assert_eq!(card.set_code, "me01");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn ownership_add_accumulates_and_remove_deletes_at_zero() {
        let conn = test_conn();
        let id = CardIdentifier::new("me01", "001");
        upsert_card(&conn, &id, &sample_fields("Bisasam")).unwrap();

        assert_eq!(add_owned_quantity(&conn, &id, "normal", "de", 2).unwrap(), 2);
        assert_eq!(add_owned_quantity(&conn, &id, "normal", "de", 1).unwrap(), 3);

        assert_eq!(
            remove_owned_quantity(&conn, &id, "normal", "de", 1).unwrap(),
            Some(2)
        );
        assert_eq!(remove_owned_quantity(&conn, &id, "normal", "de", 5).unwrap(), None);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM owned_cards", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0, "zero-quantity rows must be deleted, not stored");
    }

    #[test]
    fn list_falls_back_to_canonical_name() {
        let conn = test_conn();
        let id = CardIdentifier::new("me01", "001");
        upsert_card(&conn, &id, &sample_fields("Bulbasaur")).unwrap();
        upsert_card_name(&conn, &id, "de", "Bisasam").unwrap();
        add_owned_quantity(&conn, &id, "normal", "de", 1).unwrap();
        add_owned_quantity(&conn, &id, "holo", "fr", 1).unwrap();

        let all = list_owned_cards(&conn, None, None).unwrap();
        assert_eq!(all.len(), 2);

        let de = list_owned_cards(&conn, None, Some("de")).unwrap();
        assert_eq!(de.len(), 1);
        assert_eq!(de[0].display_name, "Bisasam");
        assert_eq!(
            get_card_name(&conn, &id, "de").unwrap().as_deref(),
            Some("Bisasam")
        );
        assert_eq!(get_card_name(&conn, &id, "ja").unwrap(), None);

        // No French name stored: canonical name is the display name
        let fr = list_owned_cards(&conn, None, Some("fr")).unwrap();
        assert_eq!(fr[0].display_name, "Bulbasaur");
    }
}
