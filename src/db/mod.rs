// Database module

pub mod schema;

use rusqlite::Connection;
use std::path::Path;

use crate::error::{CardexError, Result};
use crate::migrate::inspect::{self, SchemaGeneration};

/// Open a database connection with the standard pragmas, without touching
/// the schema. The migration engine uses this to inspect whatever layout
/// is on disk.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    // Enable foreign keys (must be done per connection)
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Enable WAL mode for better concurrency
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    Ok(conn)
}

/// Open the collection database for day-to-day operations.
///
/// A fresh database gets the current layout created; a legacy or partial
/// layout is refused rather than half-initialized on top of, since creating
/// the new tables next to a legacy combined table would leave the store in
/// a state the inspector can no longer classify.
pub fn open_collection_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = open_db(db_path)?;

    match inspect::classify(&conn)? {
        SchemaGeneration::Empty => {
            schema::create_current_schema(&conn)?;
            Ok(conn)
        }
        SchemaGeneration::Current => Ok(conn),
        SchemaGeneration::Legacy => Err(CardexError::Migration(
            "Database uses the legacy layout. Run 'cardex migrate' first.".to_string(),
        )),
        SchemaGeneration::Unknown => Err(CardexError::Migration(
            "Database layout is not recognized (manual intervention required)".to_string(),
        )),
    }
}
