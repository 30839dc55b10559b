// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Docket: Local Document Tracker
//!
//! Command-line front end over the controller.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use docket::config::AppConfig;
use docket::controller::Controller;
use docket::db::FileRecord;
use docket::validation::{self, decompose, is_expired, suggest_description, truncate_display};
use docket::{DocketError, Result};

/// Docket CLI - Local Document Tracker
#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Track documents, their expiration dates and backups", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for listings
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a configuration, database and storage folder
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Register a document and store a copy of it
    Add {
        /// File to register
        path: PathBuf,

        /// Description (default: derived from the file name)
        #[arg(short, long)]
        description: Option<String>,

        /// Expiration date, YYYY/MM/DD
        #[arg(short, long)]
        expiration: Option<String>,

        /// Free-text label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all documents
    List,

    /// Search documents by description
    Search {
        /// Text contained in the description
        query: String,
    },

    /// Edit a document
    Edit {
        /// Record id
        id: i64,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New expiration date, YYYY/MM/DD (empty to clear)
        #[arg(short, long)]
        expiration: Option<String>,

        /// New label (empty to clear)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Delete a document and its stored copy
    Delete {
        /// Record id
        id: i64,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Open a stored document with the default application
    Open {
        /// Record id
        id: i64,
    },

    /// Back up the storage folder
    Backup {
        /// Destination directory
        dir: PathBuf,
    },

    /// Export all records to JSON
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Delete every record and stored file
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show store and storage status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    debug!("Docket v1.0.0");

    run(cli)?;
    Ok(())
}

/// Dispatch a parsed command line
fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Init { dir, force }) => run_init(dir, force),
        Some(Commands::Add { path, description, expiration, label }) => {
            let controller = Controller::open(config)?;
            run_add(&controller, &path, description, expiration, label)
        }
        Some(Commands::List) | None => {
            let controller = Controller::open(config)?;
            print_records(&controller.list()?, &cli.format)
        }
        Some(Commands::Search { query }) => {
            let controller = Controller::open(config)?;
            print_records(&controller.search(&query)?, &cli.format)
        }
        Some(Commands::Edit { id, description, expiration, label }) => {
            let controller = Controller::open(config)?;
            run_edit(&controller, id, description, expiration, label)
        }
        Some(Commands::Delete { id, force }) => {
            let controller = Controller::open(config)?;
            run_delete(&controller, id, force)
        }
        Some(Commands::Open { id }) => {
            let controller = Controller::open(config)?;
            let file = controller.open_file(id)?;
            println!("Opening {}", file.stored_name());
            Ok(())
        }
        Some(Commands::Backup { dir }) => {
            let controller = Controller::open(config)?;
            let target = controller.backup(&dir)?;
            println!("Backup created at {}", target.display());
            Ok(())
        }
        Some(Commands::Export { output }) => {
            let controller = Controller::open(config)?;
            let count = controller.export(&output)?;
            println!("Exported {} records to {:?}", count, output);
            Ok(())
        }
        Some(Commands::Reset { force }) => {
            if !force {
                eprintln!("Use --force to confirm deleting every record and stored file");
                return Ok(());
            }
            let controller = Controller::open(config)?;
            controller.reset()?;
            println!("Database and storage reset");
            Ok(())
        }
        Some(Commands::Status) => run_status(config),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
    }
}

/// Register a document, deriving missing fields from the file name
fn run_add(
    controller: &Controller,
    path: &Path,
    description: Option<String>,
    expiration: Option<String>,
    label: Option<String>,
) -> Result<()> {
    let (stem, extension) = decompose(path);
    let description = description.unwrap_or_else(|| suggest_description(&stem));

    let candidate = FileRecord::new(description, extension)
        .with_expiration(expiration.unwrap_or_default())
        .with_label(label.unwrap_or_default());

    let stored = controller.create(&candidate, path)?;
    println!("Added {} (id {})", stored.stored_name(), stored.id.unwrap_or_default());
    Ok(())
}

/// Apply the given overrides to a stored document
fn run_edit(
    controller: &Controller,
    id: i64,
    description: Option<String>,
    expiration: Option<String>,
    label: Option<String>,
) -> Result<()> {
    let mut candidate = controller.get(id)?;
    if let Some(description) = description {
        candidate = candidate.with_description(description);
    }
    if let Some(expiration) = expiration {
        candidate = candidate.with_expiration(expiration);
    }
    if let Some(label) = label {
        candidate = candidate.with_label(label);
    }

    let stored = controller.update(&candidate)?;
    println!("Updated {} (id {})", stored.stored_name(), id);
    Ok(())
}

fn run_delete(controller: &Controller, id: i64, force: bool) -> Result<()> {
    let file = controller.get(id)?;
    let name = truncate_display(&file.stored_name(), controller.config().display.truncate);

    if !force {
        eprintln!("Are you sure to delete {}? Use --force to confirm", name);
        return Ok(());
    }

    controller.delete(id)?;
    println!("Deleted {}", name);
    Ok(())
}

/// Print records in the requested format
fn print_records(files: &[FileRecord], format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(files)?);
        }
        "jsonl" => {
            for file in files {
                let line = serde_json::json!({
                    "id": file.id,
                    "description": file.description,
                    "modification": file.modification,
                    "expiration": file.expiration,
                    "extension": file.extension,
                    "label": file.label,
                    "expired": is_expired(file),
                });
                println!("{}", serde_json::to_string(&line)?);
            }
        }
        _ => {
            if files.is_empty() {
                println!("No documents found");
                return Ok(());
            }
            println!(
                "{:>4}  {:<28} {:<20} {:<10} {:<6} {}",
                "ID", "DESCRIPTION", "MODIFIED", "EXPIRES", "EXT", "LABEL"
            );
            println!("{:-<80}", "");
            for file in files {
                let marker = if is_expired(file) { " [EXPIRED]" } else { "" };
                println!(
                    "{:>4}  {:<28} {:<20} {:<10} {:<6} {}{}",
                    file.id.unwrap_or_default(),
                    file.description,
                    file.modification,
                    file.expiration,
                    file.extension,
                    file.label,
                    marker
                );
            }
            println!("\n{} documents", files.len());
        }
    }
    Ok(())
}

/// Initialize a new Docket directory
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(DocketError::Config(
            "config.json already exists. Use --force to overwrite".to_string()
        ));
    }

    std::fs::create_dir_all(&target)?;
    let config = AppConfig::rooted_at(&target);
    config.save(&config_path)?;
    Controller::open(config.clone())?;

    info!("Docket initialized in {:?}", target);
    println!("Docket initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - {}", config_path.display());
    println!("  - {}", config.database.path.display());
    println!("  - {}", config.storage.path.display());

    Ok(())
}

/// Run status check
fn run_status(config: AppConfig) -> Result<()> {
    let controller = Controller::open(config)?;
    let files = controller.list()?;
    let expired = files.iter().filter(|f| is_expired(f)).count();

    println!("Docket v1.0.0 Status");
    println!("====================");
    println!("Database: {}", controller.database().path().display());
    println!("  Records: {}", controller.database().count()?);
    println!("  Expired: {}", expired);
    println!("Storage: {}", controller.storage().root().display());
    println!(
        "  Files: {}",
        if controller.storage().is_empty()? { "none" } else { "present" }
    );

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            let default_config = AppConfig::default();
            default_config.save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            let sample = validation::timestamp(&config.display.timestamp_format);
            println!("Configuration at {:?} is valid", config_path);
            println!("  Database: {}", config.database.path.display());
            println!("  Storage: {}", config.storage.path.display());
            println!("  Timestamp sample: {}", sample);
        }
    }

    Ok(())
}
