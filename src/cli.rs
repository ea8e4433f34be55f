//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use tag_compare::output::OutputConfig;

/// Tag Compare - Browse the file changes between any two tags of a repository
#[derive(Parser, Debug)]
#[command(name = "tag-compare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the static comparison site for every pair of tags
    Generate(commands::generate::GenerateArgs),

    /// List the repository's tags in version order
    Tags(commands::tags::TagsArgs),

    /// Show the files changed between two tags
    Compare(commands::compare::CompareArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // RUST_LOG still wins over --log-level
        let _ = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .try_init();

        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Generate(args) => commands::generate::execute(args, &output),
            Commands::Tags(args) => commands::tags::execute(args, &output),
            Commands::Compare(args) => commands::compare::execute(args, &output),
        }
    }
}
