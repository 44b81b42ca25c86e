//! CLI module for the council server
//!
//! Provides command-line interface parsing and handling for the council-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod config;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Ares Council - parallel multi-model research server
///
/// Sends each question to several LLM providers at once, lets each one
/// search the web independently, and streams a merged answer.
#[derive(Parser, Debug)]
#[command(
    name = "council-server",
    version,
    about = "Ares Council - parallel multi-model research server",
    long_about = "Sends each question to several LLM providers at once, lets every provider\n\
                  search the web and summarise on its own, then streams one merged answer.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new project.",
    after_help = "EXAMPLES:\n    \
                  council-server init                # Scaffold council.toml and .env.example\n    \
                  council-server config --validate   # Check the configuration\n    \
                  council-server                     # Start the server (requires council.toml)\n    \
                  council-server --config my.toml    # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "council.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Formatter used for server logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project with configuration files
    ///
    /// Creates council.toml and .env.example with a two-provider setup.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
