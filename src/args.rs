use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Republishes a cryptocurrency price into a Telegram chat.
///
/// Everything except the env file location is read from the environment.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub(crate) struct Cli {
    /// Path to environment file (default: ./.env). Can also use APP_ENV_FILE.
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        default_value = ".env",
        env = "APP_ENV_FILE",
        global = true
    )]
    pub(crate) env_file: PathBuf,

    #[command(subcommand)]
    pub(crate) cmd: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Update the price on schedule and answer commands until interrupted (default)
    Run,

    /// Fetch and publish the price once, then exit
    Once,
}
