//! Request dry-run command

use chrono::Utc;
use clap::Args;
use folio_core::site::SiteRequest;
use folio_engine::request::{handle_request, PageResponse};
use folio_store::SqliteRepo;

use super::{CliResult, Runtime};

#[derive(Debug, Args)]
pub struct RequestArgs {
    #[arg(long)]
    pub host: String,

    #[arg(long, default_value = "/")]
    pub path: String,

    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Read draft content instead of published snapshots
    #[arg(long)]
    pub editor: bool,
}

pub fn execute(runtime: &Runtime, args: RequestArgs) -> CliResult {
    let conn = runtime.open()?;
    let repo = SqliteRepo::new(&conn);
    let request = SiteRequest::new(args.host, args.path).with_method(args.method);

    match handle_request(&repo, &runtime.config, request, args.editor, Utc::now())? {
        PageResponse::Render(page) => {
            println!("Render {}:", page.status);
            println!("  site_id: {}", page.site.id);
            println!("  page_id: {}", page.page.id);
            println!("  blocks: {}", page.blocks.len());
            if let Some(title) = &page.seo.title {
                println!("  title: {}", title);
            }
            for (class, ids) in &page.cache_keys {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                println!("  cache_keys.{}: {}", class, ids.join(","));
            }
        }
        PageResponse::Redirect { location, status } => {
            println!("Redirect {} -> {}", status, location);
        }
        PageResponse::NotFound => println!("Not found"),
    }
    Ok(())
}
