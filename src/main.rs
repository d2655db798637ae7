// Cardex CLI binary

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cardex::cache;
use cardex::catalog::{CatalogSource, HttpCatalog};
use cardex::config::{self, Config};
use cardex::constants::{
    CANONICAL_LANGUAGE, DEFAULT_LANGUAGE, REPORT_FAILURE_LIMIT, VALID_VARIANTS,
};
use cardex::db::{open_collection_db, schema};
use cardex::migrate::{self, MigrationOptions, MigrationOutcome, MigrationReport};
use cardex::models::{validate_language, validate_variant, CardFields, CardIdentifier};

#[derive(Parser)]
#[command(name = "cardex")]
#[command(about = "Cardex - track a physical trading-card collection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and data directories
    Init,

    /// Add copies of a card variant to the collection
    Add {
        /// Full catalog card ID (e.g. "me01-136")
        card_id: String,
        /// Print variant
        #[arg(short, long, default_value = "normal")]
        variant: String,
        /// Language the physical card is printed in
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// How many copies to add
        #[arg(short, long, default_value = "1")]
        quantity: i64,
        /// Add even if the catalog does not list the variant
        #[arg(long)]
        force: bool,
    },

    /// Remove copies of a card variant from the collection
    Remove {
        /// Full catalog card ID (e.g. "me01-136")
        card_id: String,
        /// Print variant
        #[arg(short, long, default_value = "normal")]
        variant: String,
        /// Language the physical card is printed in
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
        /// How many copies to remove
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },

    /// List the collection
    List {
        /// Filter by set code
        #[arg(short, long)]
        set: Option<String>,
        /// Filter by language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show card details, variant availability, and owned copies
    Show {
        /// Full catalog card ID (e.g. "me01-136")
        card_id: String,
        /// Language for the display name
        #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
        language: String,
    },

    /// Migrate a legacy database to the current layout
    Migrate {
        /// Compute and report without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Show per-card progress
        #[arg(long)]
        verbose: bool,
    },

    /// Show or change configuration
    Config {
        /// Set a new database location (directory or .db file)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cmd_init(),
        Commands::Add {
            card_id,
            variant,
            language,
            quantity,
            force,
        } => cmd_add(&card_id, &variant, &language, quantity, force),
        Commands::Remove {
            card_id,
            variant,
            language,
            quantity,
        } => cmd_remove(&card_id, &variant, &language, quantity),
        Commands::List { set, language } => cmd_list(set.as_deref(), language.as_deref()),
        Commands::Show { card_id, language } => cmd_show(&card_id, &language),
        Commands::Migrate { dry_run, verbose } => cmd_migrate(dry_run, verbose),
        Commands::Config { db_path } => cmd_config(db_path),
    }
}

/// Resolve canonical data for a card, cache-first, writing remote payloads
/// into the raw-data cache so later lookups stay local.
fn fetch_card_fields(
    config: &Config,
    catalog: &dyn CatalogSource,
    id: &CardIdentifier,
) -> Result<CardFields> {
    let payload = match cache::load_cached(&config.raw_data_path, id, CANONICAL_LANGUAGE) {
        Some(payload) => payload,
        None => {
            let payload = catalog.fetch_canonical(id)?;
            cache::save_cached(&config.raw_data_path, id, CANONICAL_LANGUAGE, &payload)?;
            payload
        }
    };
    Ok(CardFields::from_payload(&payload))
}

fn fetch_localized_name(
    config: &Config,
    catalog: &dyn CatalogSource,
    id: &CardIdentifier,
    language: &str,
    canonical_name: &str,
) -> String {
    if language == CANONICAL_LANGUAGE {
        return canonical_name.to_string();
    }

    if let Some(payload) = cache::load_cached(&config.raw_data_path, id, language) {
        if let Some(name) = payload.get("name").and_then(|v| v.as_str()) {
            return name.to_string();
        }
    }

    match catalog.fetch_localized(id, language) {
        Ok(payload) => {
            let name = payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or(canonical_name)
                .to_string();
            if let Err(e) = cache::save_cached(&config.raw_data_path, id, language, &payload) {
                log::warn!("Could not cache {} payload for {}: {}", language, id, e);
            }
            name
        }
        Err(e) => {
            eprintln!("Warning: no {} name for {} ({}), using English name", language, id, e);
            canonical_name.to_string()
        }
    }
}

fn cmd_init() -> Result<()> {
    let config = config::load_config()?;
    config.ensure_dirs()?;
    let conn = open_collection_db(&config.db_path)?;
    drop(conn);
    config::save_config(&config)?;

    println!("Collection database ready at {}", config.db_path.display());
    println!("Backups:   {}", config.backups_path.display());
    println!("Raw cache: {}", config.raw_data_path.display());
    Ok(())
}

fn cmd_add(card_id: &str, variant: &str, language: &str, quantity: i64, force: bool) -> Result<()> {
    let id = CardIdentifier::parse(card_id)?;
    validate_variant(variant)?;
    validate_language(language)?;
    if quantity < 1 {
        anyhow::bail!("Quantity must be at least 1");
    }

    let config = config::load_config()?;
    config.ensure_dirs()?;
    let conn = open_collection_db(&config.db_path)?;

    let catalog = HttpCatalog::new()?;
    let fields = fetch_card_fields(&config, &catalog, &id)?;

    if !force && !fields.variants.is_available(variant) {
        let available = fields.variants.available_list().join(", ");
        anyhow::bail!(
            "Variant '{}' not listed for {} ({}).\nAvailable variants: {}\nUse --force to add it anyway.",
            variant,
            fields.name,
            id,
            available
        );
    }
    if force && !fields.variants.is_available(variant) {
        eprintln!(
            "Warning: adding variant '{}' not listed in the catalog for {}",
            variant, fields.name
        );
    }

    let display_name = fetch_localized_name(&config, &catalog, &id, language, &fields.name);

    schema::upsert_card(&conn, &id, &fields)?;
    schema::upsert_card_name(&conn, &id, language, &display_name)?;
    let total = schema::add_owned_quantity(&conn, &id, variant, language, quantity)?;

    println!(
        "Added {}x {} ({}) [{} / {}] - now owning {}",
        quantity, display_name, id, variant, language, total
    );
    Ok(())
}

fn cmd_remove(card_id: &str, variant: &str, language: &str, quantity: i64) -> Result<()> {
    let id = CardIdentifier::parse(card_id)?;
    validate_variant(variant)?;
    validate_language(language)?;

    let config = config::load_config()?;
    let conn = open_collection_db(&config.db_path)?;

    match schema::remove_owned_quantity(&conn, &id, variant, language, quantity)? {
        Some(remaining) => println!(
            "Removed {}x {} [{} / {}] - {} remaining",
            quantity, id, variant, language, remaining
        ),
        None => println!("Removed {} [{} / {}] from the collection", id, variant, language),
    }
    Ok(())
}

fn cmd_list(set: Option<&str>, language: Option<&str>) -> Result<()> {
    if let Some(language) = language {
        validate_language(language)?;
    }

    let config = config::load_config()?;
    let conn = open_collection_db(&config.db_path)?;

    let cards = schema::list_owned_cards(&conn, set, language)?;
    if cards.is_empty() {
        println!("No cards found. Use 'cardex add <card-id>' to start a collection.");
        return Ok(());
    }

    println!(
        "{:>10}  {:>12}  {:>4}  {:>4}  {}",
        "ID", "Variant", "Lang", "Qty", "Name"
    );
    println!("{}", "-".repeat(60));
    let mut total = 0;
    for card in &cards {
        println!(
            "{:>10}  {:>12}  {:>4}  {:>4}  {}",
            card.card_id, card.variant, card.language, card.quantity, card.display_name
        );
        total += card.quantity;
    }
    println!();
    println!("{} rows, {} cards total", cards.len(), total);
    Ok(())
}

fn cmd_show(card_id: &str, language: &str) -> Result<()> {
    let id = CardIdentifier::parse(card_id)?;
    validate_language(language)?;

    let config = config::load_config()?;
    config.ensure_dirs()?;
    let conn = open_collection_db(&config.db_path)?;

    let catalog = HttpCatalog::new()?;
    let fields = fetch_card_fields(&config, &catalog, &id)?;
    let display_name = fetch_localized_name(&config, &catalog, &id, language, &fields.name);

    println!("Card:   {} ({})", display_name, id);
    if let Some(rarity) = &fields.rarity {
        println!("Rarity: {}", rarity);
    }
    if !fields.types.is_empty() {
        println!("Types:  {}", fields.types.join(", "));
    }
    if let Some(hp) = fields.hp {
        println!("HP:     {}", hp);
    }
    if let Some(stage) = &fields.stage {
        println!("Stage:  {}", stage);
    }

    println!();
    println!("Variants:");
    for variant in VALID_VARIANTS {
        let mark = if fields.variants.is_available(variant) {
            "available"
        } else {
            "-"
        };
        println!("  {:<14} {}", variant, mark);
    }

    let owned: Vec<_> = schema::list_owned_cards(&conn, Some(&id.set_code), None)?
        .into_iter()
        .filter(|row| row.card_id == id.to_string())
        .collect();

    println!();
    if owned.is_empty() {
        println!("Not in the collection.");
    } else {
        println!("In the collection:");
        for row in &owned {
            println!("  {}x {} / {}", row.quantity, row.variant, row.language);
        }
    }

    if let Some(url) = &fields.image_url {
        println!();
        println!("Image: {}", url);
    }
    Ok(())
}

fn cmd_migrate(dry_run: bool, verbose: bool) -> Result<()> {
    let config = config::load_config()?;

    println!("Checking database layout: {}", config.db_path.display());
    if dry_run {
        println!("Mode: DRY RUN (no changes will be made)");
    }

    let catalog = HttpCatalog::new()?;
    let options = MigrationOptions { dry_run, verbose };
    let report = migrate::run(&config, &catalog, options)?;

    print_report(&report);

    match report.outcome {
        MigrationOutcome::Skipped(_) | MigrationOutcome::Done => Ok(()),
        MigrationOutcome::Aborted(_) => std::process::exit(1),
    }
}

fn print_report(report: &MigrationReport) {
    match &report.outcome {
        MigrationOutcome::Skipped(reason) => {
            println!("Skipped: {}", reason);
            return;
        }
        MigrationOutcome::Aborted(reason) => {
            println!("Aborted: {}", reason);
            return;
        }
        MigrationOutcome::Done => {}
    }

    println!();
    println!("Migration summary{}:", if report.dry_run { " (dry run)" } else { "" });
    println!("  Cards migrated:      {}", report.cards_migrated);
    println!("  Names migrated:      {}", report.names_migrated);
    println!("  Ownership migrated:  {}", report.ownership_migrated);
    println!("  Resolved from cache: {}", report.cards_from_cache);
    println!("  Fetched from remote: {}", report.cards_from_remote);
    println!("  Failed cards:        {}", report.cards_failed());

    if !report.failures.is_empty() {
        println!();
        println!("Failed cards:");
        for failure in report.failures.iter().take(REPORT_FAILURE_LIMIT) {
            println!("  {}: {}", failure.card_id, failure.reason);
        }
        let elided = report.failures.len().saturating_sub(REPORT_FAILURE_LIMIT);
        if elided > 0 {
            println!("  ... and {} more", elided);
        }
    }

    if let Some(validation) = &report.validation {
        println!();
        println!("Validation:");
        println!("  Tables exist:   {}", validation.tables_exist);
        println!("  Cards:          {}", validation.cards_count);
        println!("  Card names:     {}", validation.card_names_count);
        println!("  Owned cards:    {}", validation.owned_cards_count);
        if validation.orphaned_owned_cards > 0 {
            println!("  Orphaned ownership rows: {}", validation.orphaned_owned_cards);
        }
        if validation.orphaned_names > 0 {
            println!("  Orphaned name rows:      {}", validation.orphaned_names);
        }
        println!("  Valid:          {}", validation.is_valid);
    }

    if let Some(backup) = &report.backup_path {
        println!();
        println!("Backup saved to {}", backup.display());
        println!("Legacy tables were renamed to *_legacy_backup and can be dropped");
        println!("once the migrated collection has been checked with 'cardex list'.");
    }
}

fn cmd_config(db_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = db_path {
        let config = Config::with_db_path(&path)?;
        config.ensure_dirs()?;
        config::save_config(&config)?;
        println!("Database location set to {}", config.db_path.display());
        return Ok(());
    }

    let config = config::load_config()?;
    println!("Database:  {}", config.db_path.display());
    println!("Backups:   {}", config.backups_path.display());
    println!("Raw cache: {}", config.raw_data_path.display());
    Ok(())
}
