//! luahost CLI - run Lua scripts inside a host session

#![warn(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;
mod config;

use commands::{eval, run};

#[derive(Parser)]
#[command(name = "luahost")]
#[command(about = "Run Lua scripts inside a luahost session", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, env = "LUAHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file
    Run {
        /// Path to the script
        file: PathBuf,
    },

    /// Evaluate a chunk of code and print its results as JSON
    Eval {
        /// Source code to evaluate
        code: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    // Load configuration
    let config = config::load_config(cli.config)?;

    match cli.command {
        Commands::Run { file } => run::run_file(&file, &config)?,
        Commands::Eval { code } => eval::eval_code(&code, &config)?,
    }

    Ok(())
}
