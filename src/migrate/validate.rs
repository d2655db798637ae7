// Migration validator
// Read-only checks over the current-layout tables after a transform:
// existence, non-trivial row counts, and referential integrity.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub tables_exist: bool,
    pub cards_count: i64,
    pub card_names_count: i64,
    pub owned_cards_count: i64,
    pub orphaned_owned_cards: i64,
    pub orphaned_names: i64,
    pub is_valid: bool,
}

/// Validate the migrated layout. Never mutates state.
pub fn validate(conn: &Connection) -> Result<ValidationResult> {
    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type = 'table' AND name IN ('cards', 'card_names', 'owned_cards')",
        [],
        |row| row.get(0),
    )?;
    let tables_exist = table_count == 3;

    if !tables_exist {
        return Ok(ValidationResult {
            tables_exist,
            cards_count: 0,
            card_names_count: 0,
            owned_cards_count: 0,
            orphaned_owned_cards: 0,
            orphaned_names: 0,
            is_valid: false,
        });
    }

    let count = |sql: &str| -> Result<i64> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };

    let cards_count = count("SELECT COUNT(*) FROM cards")?;
    let card_names_count = count("SELECT COUNT(*) FROM card_names")?;
    let owned_cards_count = count("SELECT COUNT(*) FROM owned_cards")?;

    // Left-anti-joins: rows referencing a card the canonical table lacks.
    let orphaned_owned_cards = count(
        "SELECT COUNT(*) FROM owned_cards o
         LEFT JOIN cards c ON o.card_id = c.card_id
         WHERE c.card_id IS NULL",
    )?;
    let orphaned_names = count(
        "SELECT COUNT(*) FROM card_names n
         LEFT JOIN cards c ON n.card_id = c.card_id
         WHERE c.card_id IS NULL",
    )?;

    let is_valid = tables_exist
        && cards_count > 0
        && owned_cards_count > 0
        && orphaned_owned_cards == 0
        && orphaned_names == 0;

    Ok(ValidationResult {
        tables_exist,
        cards_count,
        card_names_count,
        owned_cards_count,
        orphaned_owned_cards,
        orphaned_names,
        is_valid,
    })
}
