//! Mend CLI - self-healing loop for version-controlled repositories
//!
//! Usage:
//!   mend init              Write default config into .mend/
//!   mend run               Run one self-healing iteration
//!   mend run --dry-run     Parse and report without touching the tree

use anyhow::Result;
use clap::{Parser, Subcommand};
use mend_core::{ChangeResult, MendConfig};
use mend_orchestrator::{run_once, RunOptions};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mend")]
#[command(author, version, about = "Self-healing loop for version-controlled repositories")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Mend in a repository
    Init {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Run one self-healing iteration
    Run {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Parse and report only; no commits, pushes, or log appends
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(path),
        Commands::Run {
            path,
            dry_run,
            json,
        } => cmd_run(path, dry_run, json).await,
    }
}

fn cmd_init(path: PathBuf) -> Result<()> {
    MendConfig::write_default(&path)?;
    info!("Wrote default config to {}", path.join(".mend/config.toml").display());
    Ok(())
}

async fn cmd_run(path: PathBuf, dry_run: bool, json: bool) -> Result<()> {
    let options = RunOptions {
        repo_root: path,
        dry_run,
    };
    let report = run_once(&options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Run {}", report.run_id);
    if !report.summary.is_empty() {
        println!("Summary: {}", report.summary);
    }
    println!(
        "Directives: {} parsed, {} blocks skipped",
        report.directives_parsed, report.blocks_skipped
    );

    for result in &report.apply.results {
        match result {
            ChangeResult::Applied { directive } => println!("  ok    {}", directive),
            ChangeResult::Failed { directive, reason } => {
                println!("  FAIL  {} ({})", directive, reason)
            }
        }
    }

    if !report.apply.proposed_commands.is_empty() {
        println!("\nProposed commands (review before running, never executed automatically):");
        for commands in &report.apply.proposed_commands {
            for line in commands.lines() {
                println!("  $ {}", line);
            }
        }
    }

    Ok(())
}
