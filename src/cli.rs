use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Kanban board, dashboard and timeline over an in-memory project dataset.
/// Data comes from the built-in demo seed or a JSON file passed via --seed,
/// and is discarded on exit.
#[derive(Parser)]
#[command(name = "tb", version, about = "Terminal project board")]
pub struct Cli {
    /// JSON seed file to load instead of the built-in demo data.
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    /// Config file (default: ~/.taskboard/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `board`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
