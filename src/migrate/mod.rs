// Migration engine
// Orchestrates inspect -> backup -> transform -> validate with a dry-run
// mode. The store is only mutated after a verified backup; legacy tables
// are renamed aside, never dropped.

pub mod backup;
pub mod enrich;
pub mod inspect;
pub mod transform;
pub mod validate;


use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::CatalogSource;
use crate::config::Config;
use crate::db;
use crate::error::{CardexError, Result};
use crate::migrate::enrich::CardEnricher;
use crate::migrate::inspect::SchemaGeneration;
use crate::migrate::validate::ValidationResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    pub dry_run: bool,
    pub verbose: bool,
}

/// Terminal state of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Nothing to do (empty store, or already migrated).
    Skipped(String),
    /// Fatal condition; no writes were left behind.
    Aborted(String),
    /// Transform (and, for non-dry runs, validation) completed.
    Done,
}

#[derive(Debug, Clone)]
pub struct FailedCard {
    pub card_id: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub dry_run: bool,
    pub cards_migrated: u64,
    pub names_migrated: u64,
    pub ownership_migrated: u64,
    pub cards_from_cache: u64,
    pub cards_from_remote: u64,
    pub failures: Vec<FailedCard>,
    pub backup_path: Option<PathBuf>,
    pub validation: Option<ValidationResult>,
}

impl MigrationReport {
    fn new(dry_run: bool) -> Self {
        Self {
            outcome: MigrationOutcome::Done,
            dry_run,
            cards_migrated: 0,
            names_migrated: 0,
            ownership_migrated: 0,
            cards_from_cache: 0,
            cards_from_remote: 0,
            failures: Vec::new(),
            backup_path: None,
            validation: None,
        }
    }

    pub fn record_failure(&mut self, card_id: &str, reason: &str) {
        self.failures.push(FailedCard {
            card_id: card_id.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn cards_failed(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Lock file guarding against a second concurrent migration of the same
/// store. Created exclusively; removed on drop.
struct MigrationLock {
    path: PathBuf,
}

impl MigrationLock {
    fn acquire(db_path: &Path) -> Result<Self> {
        let path = db_path.with_extension("migrate.lock");
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(CardexError::Migration(format!(
                    "Another migration appears to be running (lock file {} exists). \
                     Remove it if no other cardex process is active.",
                    path.display()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Could not remove lock file {}: {}", self.path.display(), e);
        }
    }
}

/// Run the migration state machine against the configured store.
///
/// Returns Ok with a report for every terminal state (Skipped, Aborted,
/// Done); Err only when the store itself cannot be opened or the lock
/// cannot be taken. Structural transform failures are folded into an
/// Aborted outcome.
pub fn run(
    config: &Config,
    catalog: &dyn CatalogSource,
    options: MigrationOptions,
) -> Result<MigrationReport> {
    let mut report = MigrationReport::new(options.dry_run);

    if !config.db_path.exists() {
        report.outcome = MigrationOutcome::Skipped("Database does not exist yet".to_string());
        return Ok(report);
    }

    let _lock = MigrationLock::acquire(&config.db_path)?;
    let conn = db::open_db(&config.db_path)?;

    match inspect::classify(&conn)? {
        SchemaGeneration::Empty => {
            report.outcome = MigrationOutcome::Skipped("Database is empty (nothing to migrate)".to_string());
            return Ok(report);
        }
        SchemaGeneration::Current => {
            report.outcome =
                MigrationOutcome::Skipped("Database already uses the current layout".to_string());
            return Ok(report);
        }
        SchemaGeneration::Unknown => {
            report.outcome = MigrationOutcome::Aborted(
                "Unknown database layout (manual intervention required)".to_string(),
            );
            return Ok(report);
        }
        SchemaGeneration::Legacy => {}
    }

    // Backup before any destructive step. Dry runs never mutate, so they
    // skip the backup as well.
    if !options.dry_run {
        match backup::create_backup(&config.db_path, &config.backups_path) {
            Ok(path) => report.backup_path = Some(path),
            Err(e) => {
                report.outcome = MigrationOutcome::Aborted(format!("Backup failed: {}", e));
                return Ok(report);
            }
        }
    }

    let enricher = CardEnricher::new(catalog, &config.raw_data_path);
    if let Err(e) = transform::transform(
        &conn,
        &enricher,
        options.dry_run,
        options.verbose,
        &mut report,
    ) {
        report.outcome = MigrationOutcome::Aborted(e.to_string());
        return Ok(report);
    }

    // Dry runs wrote nothing, so there is nothing real to validate.
    if !options.dry_run {
        report.validation = Some(validate::validate(&conn)?);
    }

    report.outcome = MigrationOutcome::Done;
    Ok(report)
}
