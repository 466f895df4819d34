//! Folio CLI
//!
//! Operator commands for the page store: schema, seeds, site resolution,
//! request dry-runs and snapshot publication.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(about = "Folio - multi-site page management", long_about = None)]
struct Cli {
    /// Deployment configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides `database.path` from the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Logging profile: dev, prod or test
    #[arg(long, global = true, default_value = "dev")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Seed import operations
    Seed(commands::seed::SeedArgs),
    /// Site resolution
    Site(commands::site::SiteArgs),
    /// Serve one request without an HTTP server and print the outcome
    Request(commands::request::RequestArgs),
    /// Snapshot publication and retention
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Publication job messages
    Job(commands::job::JobArgs),
}

fn main() {
    let cli = Cli::parse();

    let profile = match Profile::parse(&cli.log) {
        Some(profile) => profile,
        None => {
            eprintln!("Error: unknown logging profile '{}'", cli.log);
            std::process::exit(2);
        }
    };
    init(profile);

    let result = commands::Runtime::load(cli.config.as_deref(), cli.db).and_then(|runtime| {
        match cli.command {
            Commands::Migrate => commands::migrate(&runtime),
            Commands::Seed(args) => commands::seed::execute(&runtime, args),
            Commands::Site(args) => commands::site::execute(&runtime, args),
            Commands::Request(args) => commands::request::execute(&runtime, args),
            Commands::Snapshot(args) => commands::snapshot::execute(&runtime, args),
            Commands::Job(args) => commands::job::execute(&runtime, args),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
