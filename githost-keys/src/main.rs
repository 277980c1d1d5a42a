//! githost-keys - sshd AuthorizedKeysCommand helper.
//!
//! sshd invokes this once per connection attempt, before any
//! authentication, asking "may this key log in, and as whom?". The scan
//! walks the configured group's members and answers with a restricted
//! authorized-key line whose `environment=` option pins the authorizing
//! member's name, so the later session command can scope write access.

#![forbid(unsafe_code)]

use clap::Parser;
use githost_common::{Config, KeyType, LogConfig, init_logging, keyscan};
use std::process::ExitCode;
use tracing::{error, info};

/// No member's key list matched, or the group does not exist.
const EXIT_NO_MATCH: u8 = 1;

/// The group or user database lookup itself failed.
const EXIT_LOOKUP_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "githost-keys")]
#[command(author, version, about = "Authorize an ssh key against a group's members")]
struct Cli {
    /// Group whose members are login candidates
    #[arg(short = 'G', value_name = "GROUP")]
    group: String,

    /// Key type presented by the client
    #[arg(short = 't', value_name = "KEYTYPE", value_enum)]
    key_type: KeyType,

    /// Key material presented by the client
    #[arg(value_name = "KEY")]
    key: String,

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
            return ExitCode::from(EXIT_LOOKUP_ERROR);
        }
    };

    match keyscan::authorize(
        &cli.group,
        &config.authorized_keys_file,
        cli.key_type.as_str(),
        &cli.key,
    ) {
        Ok(Some(user)) => {
            info!(user = %user, group = %cli.group, "authorized presented key");
            println!(
                "{}",
                keyscan::authorized_key_line(&user, cli.key_type.as_str(), &cli.key)
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            info!(
                group = %cli.group,
                "no member of the group is associated with the presented key"
            );
            ExitCode::from(EXIT_NO_MATCH)
        }
        Err(err) if err.is_fault() => {
            error!("{err}");
            ExitCode::from(EXIT_LOOKUP_ERROR)
        }
        Err(err) => {
            info!("{err}");
            ExitCode::from(EXIT_NO_MATCH)
        }
    }
}
