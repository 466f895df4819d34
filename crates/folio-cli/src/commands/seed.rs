//! Seed import command
//!
//! Usage: folio seed import <PATH>

use std::path::PathBuf;

use clap::{Args, Subcommand};

use super::{CliResult, Runtime};

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[command(subcommand)]
    pub command: SeedCommand,
}

#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Import a seed file, or every YAML file of a directory
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to seed YAML file or directory
    pub path: PathBuf,
}

pub fn execute(runtime: &Runtime, args: SeedArgs) -> CliResult {
    match args.command {
        SeedCommand::Import(import_args) => execute_import(runtime, import_args),
    }
}

fn execute_import(runtime: &Runtime, args: ImportArgs) -> CliResult {
    let mut conn = runtime.open()?;

    let seed_files = if args.path.is_dir() {
        // Sorted for a deterministic import order
        let mut files: Vec<PathBuf> = std::fs::read_dir(&args.path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        files
    } else {
        vec![args.path]
    };

    for seed_file in seed_files {
        println!("Importing {}...", seed_file.display());
        let report = folio_store::seed::import_seed(&seed_file, &mut conn)?;
        println!(
            "✓ Imported {} site(s), {} page(s), {} block(s)",
            report.sites, report.pages, report.blocks
        );
    }

    Ok(())
}
