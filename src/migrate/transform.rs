// Layout transformer
// Moves data from the legacy combined table into the normalized layout.
// Legacy tables are renamed aside (never dropped) so the pre-migration data
// survives in place; the rename is undone if creating the new tables fails.

use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

use crate::db::schema;
use crate::error::{CardexError, Result};
use crate::migrate::enrich::{CardEnricher, ResolvedSource};
use crate::migrate::MigrationReport;
use crate::models::CardIdentifier;

/// One decoded row of the legacy combined table. Decoded exactly once at
/// this boundary; nothing downstream sees raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyOwnershipRecord {
    pub id: CardIdentifier,
    pub variant: String,
    pub language: String,
    pub quantity: i64,
}

/// Legacy tables that get renamed aside. The combined ownership table must
/// exist; the cache tables are optional v1 leftovers.
const LEGACY_TABLES: [&str; 3] = ["cards", "card_cache", "set_cache"];

fn backup_name(table: &str) -> String {
    format!("{}_legacy_backup", table)
}

/// Read and decode every legacy ownership row. Rows whose card ID cannot
/// be parsed are reported as failed identifiers rather than aborting.
fn read_legacy_records(
    conn: &Connection,
    report: &mut MigrationReport,
) -> Result<Vec<LegacyOwnershipRecord>> {
    let mut stmt =
        conn.prepare("SELECT card_id, variant, language, quantity FROM cards ORDER BY card_id")?;
    let raw_rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(raw_rows.len());
    for (raw_id, variant, language, quantity) in raw_rows {
        match CardIdentifier::parse(&raw_id) {
            Ok(id) => records.push(LegacyOwnershipRecord {
                id,
                variant,
                language,
                quantity,
            }),
            Err(e) => report.record_failure(&raw_id, &e.to_string()),
        }
    }
    Ok(records)
}

/// Group legacy rows per identifier, summing quantities for duplicate
/// (variant, language) pairs so no quantity is gained or lost. Tuples whose
/// summed quantity is not positive are dropped here: zero-quantity
/// ownership is never stored in the new layout, and the owned_cards CHECK
/// constraint would reject it as a structural failure mid-write.
fn group_by_identifier(
    records: Vec<LegacyOwnershipRecord>,
) -> BTreeMap<CardIdentifier, BTreeMap<(String, String), i64>> {
    let mut grouped: BTreeMap<CardIdentifier, BTreeMap<(String, String), i64>> = BTreeMap::new();
    for record in records {
        *grouped
            .entry(record.id)
            .or_default()
            .entry((record.variant, record.language))
            .or_insert(0) += record.quantity;
    }
    for ownership in grouped.values_mut() {
        ownership.retain(|(variant, language), quantity| {
            if *quantity <= 0 {
                log::info!(
                    "Dropping zero-quantity legacy row ({} / {}, quantity {})",
                    variant,
                    language,
                    quantity
                );
            }
            *quantity > 0
        });
    }
    grouped.retain(|_, ownership| !ownership.is_empty());
    grouped
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Rename the legacy tables to their `*_legacy_backup` names. This is the
/// last reversible step before new tables are created.
pub(crate) fn rename_legacy_aside(conn: &Connection) -> Result<()> {
    for table in LEGACY_TABLES {
        if table_exists(conn, table)? {
            let target = backup_name(table);
            if table_exists(conn, &target)? {
                return Err(CardexError::Migration(format!(
                    "Backup table {} already exists; a previous migration did not finish cleanly",
                    target
                )));
            }
            conn.execute_batch(&format!("ALTER TABLE {} RENAME TO {}", table, target))?;
            log::info!("Renamed {} to {}", table, target);
        }
    }
    Ok(())
}

/// Undo `rename_legacy_aside` after a failed table creation.
pub(crate) fn rename_legacy_back(conn: &Connection) -> Result<()> {
    for table in LEGACY_TABLES {
        let source = backup_name(table);
        if table_exists(conn, &source)? && !table_exists(conn, table)? {
            conn.execute_batch(&format!("ALTER TABLE {} RENAME TO {}", source, table))?;
            log::info!("Restored {} from {}", table, source);
        }
    }
    Ok(())
}

/// Run the legacy-to-current transformation.
///
/// Identifier-level enrichment failures are recorded in the report and do
/// not stop the run. Structural failures (rename, create, row write once
/// the new schema exists) propagate as errors; a failed table creation
/// renames the legacy tables back before returning.
pub fn transform(
    conn: &Connection,
    enricher: &CardEnricher,
    dry_run: bool,
    verbose: bool,
    report: &mut MigrationReport,
) -> Result<()> {
    let records = read_legacy_records(conn, report)?;
    log::info!("Found {} legacy ownership records", records.len());
    if verbose {
        println!("Found {} legacy ownership records", records.len());
    }

    let grouped = group_by_identifier(records);

    if !dry_run {
        rename_legacy_aside(conn)?;

        if let Err(e) = schema::create_current_schema(conn) {
            // Creation failed before any data was written: put the legacy
            // tables back so the store stays classifiable.
            if let Err(restore_err) = rename_legacy_back(conn) {
                log::error!("Rename-back after failed creation also failed: {}", restore_err);
            }
            return Err(CardexError::Migration(format!(
                "Creating current-layout tables failed: {}",
                e
            )));
        }
    }

    let total = grouped.len();
    for (index, (id, ownership)) in grouped.iter().enumerate() {
        if verbose {
            println!("  [{}/{}] {}", index + 1, total, id);
        }

        let languages: BTreeSet<String> =
            ownership.keys().map(|(_, language)| language.clone()).collect();

        let resolved = match enricher.resolve(id, &languages) {
            Ok(resolved) => resolved,
            Err(failure) => {
                log::warn!("Enrichment failed for {}: {}", failure.card_id, failure.reason);
                report.record_failure(&failure.card_id, &failure.reason);
                continue;
            }
        };

        match resolved.source {
            ResolvedSource::Cache => report.cards_from_cache += 1,
            ResolvedSource::Remote => report.cards_from_remote += 1,
        }

        // After the new schema exists, a failed row write is structural
        // and aborts the whole run.
        if !dry_run {
            schema::upsert_card(conn, id, &resolved.fields)?;
        }
        report.cards_migrated += 1;

        for (language, name) in &resolved.names {
            if !dry_run {
                schema::upsert_card_name(conn, id, language, name)?;
            }
            report.names_migrated += 1;
        }

        for ((variant, language), quantity) in ownership {
            if !dry_run {
                schema::upsert_owned_card(conn, id, variant, language, *quantity)?;
            }
            report.ownership_migrated += 1;
        }
    }

    Ok(())
}
