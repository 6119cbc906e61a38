//! Workdash - worker dashboard CLI
//!
//! Aggregates schedules and tasks from the configured sources and prints
//! them as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use workdash_infra::config;
use workdash_lib::utils::logging::init_tracing;
use workdash_lib::{get_dashboard, get_schedule, get_tasks, list_plugins, resolve_range, AppContext};

#[derive(Parser)]
#[command(name = "workdash")]
#[command(about = "Worker schedule and task aggregation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (JSON or TOML); defaults to environment then standard locations
    #[arg(long, short = 'c', global = true, env = "WORKDASH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Schedule items for a worker
    Schedule(RangeArgs),
    /// Open tasks for a worker
    Tasks {
        #[arg(long)]
        worker: String,
    },
    /// Schedule and tasks together
    All(RangeArgs),
    /// Registered plugins with health
    Plugins,
}

#[derive(Args)]
struct RangeArgs {
    #[arg(long)]
    worker: String,

    /// Range start (RFC 3339 or YYYY-MM-DD); defaults to today
    #[arg(long)]
    start: Option<String>,

    /// Range end; defaults to a week after the start
    #[arg(long)]
    end: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();

    let config = match cli.config {
        Some(path) => config::load_from_file(Some(path)),
        None => config::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config.logging)?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let ctx = AppContext::new_with_config(config).context("failed to initialize workdash")?;

    match cli.command {
        Command::Schedule(args) => {
            let range = resolve_range(args.start.as_deref(), args.end.as_deref(), Utc::now())?;
            print_json(&get_schedule(&ctx, &args.worker, &range).await?)
        }
        Command::Tasks { worker } => print_json(&get_tasks(&ctx, &worker).await?),
        Command::All(args) => {
            let range = resolve_range(args.start.as_deref(), args.end.as_deref(), Utc::now())?;
            print_json(&get_dashboard(&ctx, &args.worker, &range).await?)
        }
        Command::Plugins => print_json(&list_plugins(&ctx).await?),
    }
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}
