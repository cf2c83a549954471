//! CLI entry point for the fillsplit controller.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};

use fillsplit_controller::config::Config;
use fillsplit_controller::error::Error;
use fillsplit_controller::runner::{self, RunOptions};
use fillsplit_controller::sink::MemorySink;

#[derive(Parser)]
#[command(name = "controller")]
#[command(about = "Fill allocation controller: splits + fills → positions")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the feeders and run allocation cycles
    Run {
        /// Stop after this many cycles (default: run forever)
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Allocate a single fill from JSON files and print the positions
    Once {
        /// Path to split.json
        split: PathBuf,

        /// Path to fill.json
        fill: PathBuf,

        /// Path to previous.json (omit for a first trade)
        #[arg(long)]
        previous: Option<PathBuf>,
    },

    /// Validate the config file
    Check,
}

fn load_config(path: &Path) -> Config {
    match Config::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { cycles } => {
            let config = load_config(&cli.config);
            let mut sink = MemorySink::new();
            let stop = Arc::new(AtomicBool::new(false));
            runner::run(&config, &RunOptions { cycles }, &mut sink, stop).map(|_| ())
        }
        Command::Once {
            split,
            fill,
            previous,
        } => runner::allocate_from_files(&split, &fill, previous.as_deref()).and_then(|position| {
            println!("{}", serde_json::to_string_pretty(&position)?);
            Ok(())
        }),
        Command::Check => {
            let config = load_config(&cli.config);
            println!(
                "Config OK: cycle every {:?}, up to {} accounts, {} tickers",
                config.schedule.cycle_interval(),
                config.split.max_accounts,
                config.fill.tickers.len()
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        match &e {
            Error::Allocation(err) => {
                eprintln!("{}: {}", err.kind(), err.reason());
                process::exit(2);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
