// Schema inspection
// Classifies the on-disk layout without taking a write lock. The generation
// is derived on every run, never persisted.

use rusqlite::Connection;
use std::collections::HashSet;

use crate::error::Result;

/// Structural version of the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGeneration {
    /// No tables at all.
    Empty,
    /// Combined ownership + card-info table (pre-normalization layout).
    Legacy,
    /// Normalized cards / card_names / owned_cards layout.
    Current,
    /// Partial or foreign layout; manual intervention required.
    Unknown,
}

/// Classify the database layout. Read-only and safe to call repeatedly.
pub fn classify(conn: &Connection) -> Result<SchemaGeneration> {
    let tables = table_names(conn)?;

    if tables.is_empty() {
        return Ok(SchemaGeneration::Empty);
    }

    // Current layout: both satellite tables present and the canonical card
    // table carries the price columns the legacy combined table never had.
    if tables.contains("card_names") && tables.contains("owned_cards") && tables.contains("cards") {
        let columns = table_columns(conn, "cards")?;
        if columns.contains("price_eur") && columns.contains("legal_standard") {
            return Ok(SchemaGeneration::Current);
        }
    }

    // Legacy layout: a single combined table with a quantity column and no
    // separate ownership table.
    if tables.contains("cards") && !tables.contains("owned_cards") {
        let columns = table_columns(conn, "cards")?;
        if columns.contains("quantity") {
            return Ok(SchemaGeneration::Legacy);
        }
    }

    Ok(SchemaGeneration::Unknown)
}

fn table_names(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    // PRAGMA arguments cannot be bound; `table` is always an internal name.
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(columns)
}
