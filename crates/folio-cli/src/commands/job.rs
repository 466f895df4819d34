//! Publication job command
//!
//! Executes a queue message body in-process, the way a queue consumer would.

use chrono::Utc;
use clap::{Args, Subcommand};
use folio_engine::jobs::{
    Dispatch, JobOutcome, PublicationBackend, PublicationMessage, RuntimeBackend,
};
use folio_engine::publication::PublicationService;

use super::{CliResult, Runtime};

#[derive(Debug, Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Execute one JSON message
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Message body, e.g. {"type":"create_snapshot","pageId":"p1"}
    pub message: String,
}

pub fn execute(runtime: &Runtime, args: JobArgs) -> CliResult {
    match args.command {
        JobCommand::Run(run_args) => execute_run(runtime, run_args),
    }
}

fn execute_run(runtime: &Runtime, args: RunArgs) -> CliResult {
    let message = PublicationMessage::from_json(&args.message)?;
    let queue = message.queue_name();

    let mut conn = runtime.open()?;
    let service = PublicationService::new();
    let mut backend = RuntimeBackend::new(&service, &mut conn);

    tracing::info!(component = module_path!(), queue = queue, "running job");
    match backend.dispatch(message, Utc::now())? {
        Dispatch::Executed(JobOutcome::Published { snapshot_ids }) => {
            println!("{}: published {}", queue, snapshot_ids.join(","));
        }
        Dispatch::Executed(JobOutcome::Cleaned { deleted }) => {
            println!("{}: deleted {} snapshot(s)", queue, deleted);
        }
        Dispatch::Executed(JobOutcome::Skipped { reason }) => {
            println!("{}: skipped ({})", queue, reason);
        }
        Dispatch::Queued => println!("{}: queued", queue),
    }
    Ok(())
}
