use clap::Parser;

use taskboard::cli::Cli;
use taskboard::cmd::{dispatch, Commands};
use taskboard::config::Config;
use taskboard::error::AppResult;
use taskboard::logging::{init_logging, LogTarget};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }

    let command = cli.command.unwrap_or(Commands::Board { project: None });

    // The board owns the terminal, so it only logs to a file.
    let target = match (&command, &config.log_file) {
        (Commands::Board { .. }, Some(path)) => LogTarget::File(path.as_path()),
        (Commands::Board { .. }, None) => LogTarget::Off,
        _ => LogTarget::Stderr,
    };
    init_logging(cli.verbose, target)?;

    dispatch(command, &config)
}
