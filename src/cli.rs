use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "gitjump")]
#[command(about = "Index Git repositories below a base path and jump to them with fuzzy search")]
pub struct CliArgs {
    /// Query to filter indexed projects with; omit to list every project
    pub query: Option<String>,

    /// Base directory to scan for repositories (overrides config)
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Maximum depth below the base path to descend into (overrides config)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Persist the effective configuration back to the config file
    #[arg(long)]
    pub save: bool,
}
