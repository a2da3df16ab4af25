use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use gitjump::cli::CliArgs;
use gitjump::config::{Config, get_default_config_path};
use gitjump::finder::{ACTIVATION_PREFIX, ProjectFinder, ProjectOpener, fuzzy_match};
use gitjump::index::Indexer;
use gitjump::state::AppContext;

/// "Opening" a project from a CLI means printing its path on stdout, so
/// shells can do things like `cd "$(gitjump foo)"`.
struct StdoutOpener;

impl ProjectOpener for StdoutOpener {
    fn open(&self, path: &Path) {
        println!("{}", path.display());
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for search results
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = Config::from_cli_and_file(&args, args.config.clone())?;

    if args.save {
        config.validate_base_path()?;
        let path = match &args.config {
            Some(p) => p.clone(),
            None => get_default_config_path()?,
        };
        config.save(&path)?;
        info!(path = %path.display(), "configuration saved");
    }

    if config.base_path.is_none() {
        eprintln!("gitjump: no base path configured; set one with --base-path <DIR> --save");
        return Ok(());
    }

    let ctx = Arc::new(AppContext::new(config));
    let indexer = Indexer::new(ctx.clone());
    indexer.run_scan();

    match &args.query {
        Some(query) => {
            let finder = ProjectFinder::new(ctx, Box::new(StdoutOpener));
            // The prefix routes queries in a shared search bar; a direct
            // CLI invocation is always for us, so supply it when absent.
            let query = if finder.matches_activation(query) {
                query.clone()
            } else {
                format!("{ACTIVATION_PREFIX}{query}")
            };
            for path in finder.search(&query, fuzzy_match) {
                finder.select(&path);
            }
        }
        None => {
            for path in ctx.projects().snapshot() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
