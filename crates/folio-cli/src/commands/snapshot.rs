//! Snapshot commands

use chrono::Utc;
use clap::{Args, Subcommand};
use folio_engine::publication::{BulkMode, PublicationService};
use folio_store::snapshot::query;

use super::{CliResult, Runtime};

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Publish a page or a whole site
    Create(CreateArgs),
    /// Reactivate existing snapshots, in the order given
    Enable(EnableArgs),
    /// Delete closed snapshots beyond the retention count
    Cleanup(CleanupArgs),
    /// List a page's snapshots, newest first
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, conflicts_with = "site")]
    pub page: Option<String>,

    #[arg(long, conflicts_with = "page")]
    pub site: Option<String>,

    /// Publish site pages one transaction at a time, skipping failures
    #[arg(long, requires = "site")]
    pub best_effort: bool,
}

#[derive(Debug, Args)]
pub struct EnableArgs {
    #[arg(required = true)]
    pub snapshot_ids: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    #[arg(long, conflicts_with = "site")]
    pub page: Option<String>,

    #[arg(long, conflicts_with = "page")]
    pub site: Option<String>,

    /// Closed snapshots to keep per page; defaults to `keep_snapshots`
    #[arg(long)]
    pub keep: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub page: String,
}

pub fn execute(runtime: &Runtime, args: SnapshotArgs) -> CliResult {
    match args.command {
        SnapshotCommand::Create(create_args) => execute_create(runtime, create_args),
        SnapshotCommand::Enable(enable_args) => execute_enable(runtime, enable_args),
        SnapshotCommand::Cleanup(cleanup_args) => execute_cleanup(runtime, cleanup_args),
        SnapshotCommand::List(list_args) => execute_list(runtime, list_args),
    }
}

fn execute_create(runtime: &Runtime, args: CreateArgs) -> CliResult {
    let mut conn = runtime.open()?;
    let service = PublicationService::new();
    let now = Utc::now();

    match (args.page, args.site) {
        (Some(page_id), None) => {
            let snapshot = service.create_by_page(&mut conn, &page_id, now)?;
            println!("Snapshot published:");
            println!("  snapshot_id: {}", snapshot.id);
            println!("  page_id: {}", snapshot.page_id);
        }
        (None, Some(site_id)) => {
            let mode = if args.best_effort {
                BulkMode::BestEffort
            } else {
                BulkMode::Atomic
            };
            let report = service.create_by_site(&mut conn, &site_id, now, mode)?;
            println!("Site published:");
            println!("  snapshots: {}", report.published.len());
            for (page_id, err) in &report.failures {
                println!("  failed {}: {}", page_id, err);
            }
        }
        _ => return Err("Must specify either --page or --site".into()),
    }
    Ok(())
}

fn execute_enable(runtime: &Runtime, args: EnableArgs) -> CliResult {
    let mut conn = runtime.open()?;
    PublicationService::new().enable_snapshots(&mut conn, &args.snapshot_ids, Utc::now())?;
    println!("✓ Enabled {} snapshot(s)", args.snapshot_ids.len());
    Ok(())
}

fn execute_cleanup(runtime: &Runtime, args: CleanupArgs) -> CliResult {
    let mut conn = runtime.open()?;
    let service = PublicationService::new();
    let keep = args.keep.unwrap_or(runtime.config.keep_snapshots);

    let deleted = match (args.page, args.site) {
        (Some(page_id), None) => service.cleanup_by_page(&mut conn, &page_id, keep)?,
        (None, Some(site_id)) => service.cleanup_by_site(&mut conn, &site_id, keep)?,
        _ => return Err("Must specify either --page or --site".into()),
    };
    println!("✓ Deleted {} snapshot(s)", deleted);
    Ok(())
}

fn execute_list(runtime: &Runtime, args: ListArgs) -> CliResult {
    let conn = runtime.open()?;
    for snapshot in query::snapshots_for_page(&conn, &args.page)? {
        let start = snapshot
            .publication_date_start
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        let end = match (snapshot.publication_date_start, snapshot.publication_date_end) {
            (Some(_), None) => "open".to_string(),
            (_, Some(end)) => end.to_rfc3339(),
            (None, None) => "-".to_string(),
        };
        println!("{}\t{}\t{}\t{}", snapshot.id, snapshot.enabled, start, end);
    }
    Ok(())
}
