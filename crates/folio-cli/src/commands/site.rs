//! Site commands

use chrono::Utc;
use clap::{Args, Subcommand};
use folio_core::ops::tree::{navigation, root, NavNode};
use folio_core::site::{Resolution, SiteRequest, SiteResolver};
use folio_store::SqliteRepo;

use super::{CliResult, Runtime};

#[derive(Debug, Args)]
pub struct SiteArgs {
    #[command(subcommand)]
    pub command: SiteCommand,
}

#[derive(Debug, Subcommand)]
pub enum SiteCommand {
    /// List configured sites
    List,
    /// Show which site would serve a request
    Resolve(ResolveArgs),
    /// Print a site's navigation tree
    Tree {
        #[arg(long)]
        site: String,
    },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[arg(long)]
    pub host: String,

    #[arg(long, default_value = "/")]
    pub path: String,

    #[arg(long, default_value = "https")]
    pub scheme: String,

    /// Raw Accept-Language header
    #[arg(long)]
    pub accept_language: Option<String>,

    /// Site id remembered by the visitor's session
    #[arg(long)]
    pub pinned: Option<String>,
}

pub fn execute(runtime: &Runtime, args: SiteArgs) -> CliResult {
    match args.command {
        SiteCommand::List => execute_list(runtime),
        SiteCommand::Resolve(resolve_args) => execute_resolve(runtime, resolve_args),
        SiteCommand::Tree { site } => execute_tree(runtime, &site),
    }
}

fn execute_list(runtime: &Runtime) -> CliResult {
    let conn = runtime.open()?;
    for site in SqliteRepo::new(&conn).list_sites()? {
        println!(
            "{}\t{}\t{}{}",
            site.id,
            site.name,
            site.host,
            site.normalized_relative_path()
        );
    }
    Ok(())
}

fn execute_resolve(runtime: &Runtime, args: ResolveArgs) -> CliResult {
    let conn = runtime.open()?;
    let repo = SqliteRepo::new(&conn);

    let mut request = SiteRequest::new(args.host, args.path).with_scheme(args.scheme);
    if let Some(header) = &args.accept_language {
        request = request.with_accept_language(header);
    }
    if let Some(pinned) = args.pinned {
        request = request.with_pinned_site(pinned);
    }

    let resolver = SiteResolver::new(runtime.config.site_selection);
    match resolver.resolve(&repo, &mut request, Utc::now())? {
        Resolution::Site(site) => {
            println!("Site resolved:");
            println!("  site_id: {}", site.id);
            println!("  path_info: {}", request.path_info);
            println!("  base_url: {}", request.base_url);
            if let Some(locale) = &request.locale {
                println!("  locale: {}", locale);
            }
        }
        Resolution::Redirect(redirect) => {
            println!("Redirect {} -> {}", redirect.status.code(), redirect.location);
        }
        Resolution::Unresolved => println!("No site for this request"),
    }
    Ok(())
}

fn execute_tree(runtime: &Runtime, site_id: &str) -> CliResult {
    let conn = runtime.open()?;
    let pages = SqliteRepo::new(&conn).list_pages(site_id)?;
    let Some(home) = root(&pages) else {
        return Err(format!("Site {} has no root page", site_id).into());
    };

    println!("{}\t{}", home.name, home.url);
    print_nodes(&navigation(&pages, &home.id), 1);
    Ok(())
}

fn print_nodes(nodes: &[NavNode], depth: usize) {
    for node in nodes {
        println!("{}{}\t{}", "  ".repeat(depth), node.name, node.url);
        print_nodes(&node.children, depth + 1);
    }
}
