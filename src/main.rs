//! # coursebot CLI
//!
//! ## Usage
//!
//! ```bash
//! coursebot --config ./config/coursebot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `coursebot build` | Build the course index from CSV exports |
//! | `coursebot ask "<message>"` | Answer one message |
//! | `coursebot course <CODE>` | Show one course with prerequisites and unlocks |
//! | `coursebot search "<text>"` | Search course titles |
//! | `coursebot stats` | Index statistics |
//! | `coursebot serve` | Start the JSON HTTP API |
//!
//! When the config file does not exist, built-in defaults are used.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use coursebot::config::{self, Config};
use coursebot::{ask, get, ingest, logging, search, server, stats};

/// coursebot — a course-planning chat assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/coursebot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "coursebot",
    about = "coursebot — a course-planning chat assistant",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/coursebot.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the course index from CSV exports.
    ///
    /// Scans `[catalog].root` (or the given files), merges rows that share a
    /// course code and writes the index document to `[index].path`.
    Build {
        /// Read these CSV files instead of scanning the catalog root.
        #[arg(long = "input")]
        inputs: Vec<PathBuf>,

        /// Show counts without writing the index.
        #[arg(long)]
        dry_run: bool,
    },

    /// Answer one message as the chat assistant would.
    Ask {
        /// The message text.
        message: String,

        /// Print the rich HTML rendering when the answer has one.
        #[arg(long)]
        html: bool,

        /// Print the classified intent, rule and entity before the answer.
        #[arg(long)]
        explain: bool,
    },

    /// Show one course with its prerequisites and what it unlocks.
    Course {
        /// Course code, e.g. `COMP 248` or `comp248`.
        code: String,
    },

    /// Search course titles.
    Search {
        /// Free-text title query.
        query: String,

        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Show index statistics.
    Stats,

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json);

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    match cli.command {
        Commands::Build { inputs, dry_run } => {
            ingest::run_build(&cfg, &inputs, dry_run)?;
        }
        Commands::Ask {
            message,
            html,
            explain,
        } => {
            ask::run_ask(&cfg, &message, html, explain).await?;
        }
        Commands::Course { code } => {
            get::run_course(&cfg, &code)?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit)?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
