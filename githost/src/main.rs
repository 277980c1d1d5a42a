//! githost - restricted command dispatcher for git-over-ssh sessions.
//!
//! sshd invokes this once per accepted session (via ForceCommand or a
//! restricted shell) with the client's requested command in `-c`. The
//! dispatcher tokenizes it, validates the repository path against the
//! sandbox, and execs the matching git program. It is not a shell:
//! exactly one action from a fixed table runs, or nothing does.

#![forbid(unsafe_code)]

mod dispatch;

use clap::Parser;
use githost_common::{AUTHORIZED_BY_ENV, Config, LogConfig, init_logging};
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "githost")]
#[command(author, version, about = "Restricted git-over-ssh command dispatcher")]
struct Cli {
    /// Command string requested by the ssh client
    #[arg(short = 'c', value_name = "COMMAND")]
    command: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info");
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    init_logging(&log_config);

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let authorized_by = std::env::var(AUTHORIZED_BY_ENV).ok();

    match dispatch::run(&config, &cli.command, authorized_by.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_status())
        }
    }
}
