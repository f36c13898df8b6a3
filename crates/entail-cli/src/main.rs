//! `entail` — compare state predicates for equivalence and strength

mod batch;
mod config;
mod diversify;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entail_core::{Comparator, LogSink};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "entail")]
#[command(about = "Decides whether two state predicates are equivalent or one is stronger")]
#[command(version)]
struct Cli {
    /// JSON file of per-component trace booleans
    /// ({"tokenizer":…,"parser":…,"simplifier":…,"solver":…})
    #[arg(long, global = true)]
    trace_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two predicate strings and print the verdict
    Compare {
        predicate1: String,
        predicate2: String,
    },

    /// Compare every row of a CSV with `predicate` and
    /// `diversified_predicate` columns; a failing row never aborts the run
    Batch {
        /// Input CSV path
        input: PathBuf,
    },

    /// Append a `diversified_predicate` column of structurally mutated
    /// variants for differential testing
    Diversify {
        /// Input CSV path with a `predicate` column
        input: PathBuf,

        /// Output CSV path
        output: PathBuf,

        /// Seed for reproducible strategy selection
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Trace output goes through tracing at debug level; when a trace
    // config is supplied the default filter must not swallow it
    let default_filter = if cli.trace_config.is_some() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let comparator = match &cli.trace_config {
        Some(path) => {
            let trace = config::load_trace_config(path)?;
            Comparator::with_sink(Box::new(LogSink::new(trace)))
        }
        None => Comparator::new(),
    };

    match cli.command {
        Commands::Compare { predicate1, predicate2 } => {
            let verdict = comparator
                .compare(&predicate1, &predicate2)
                .context("comparison failed")?;
            println!("{verdict}");
        }
        Commands::Batch { input } => {
            let summary = batch::run(&comparator, &input)?;
            println!("{summary}");
        }
        Commands::Diversify { input, output, seed } => {
            let rows = diversify::run(&input, &output, seed)?;
            println!("diversified {rows} rows into {}", output.display());
        }
    }

    Ok(())
}
