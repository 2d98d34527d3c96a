use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use ironlog::{
    FileCache, PlanDir, SqliteSessionStore, WorkoutTracker,
    db::open,
    types::{Config, OutputFmt, Settings, config_path},
};
use commands::Tracker;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn init_logging() {
    let filter = EnvFilter::try_from_env("IRONLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings() -> Result<Settings> {
    let cfg = Config::load(&config_path()?)?;
    Settings::from_config(&cfg)
}

async fn open_tracker(settings: &Settings) -> Result<Tracker> {
    if let Some(parent) = Path::new(&settings.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = open(&settings.db_path).await?;
    let store = Arc::new(SqliteSessionStore::new(pool));
    let tracker = WorkoutTracker::resume(&settings.user_id, store, FileCache::new(&settings.cache_dir))
        .with_recent_limit(settings.recent_limit);
    Ok(tracker)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let fmt = OutputFmt::from_flag(cli.json);

    match cli.cmd {
        Commands::Workout(cmd) => {
            let settings = load_settings()?;
            let plans = PlanDir::new(&settings.plans_dir);
            let mut tracker = open_tracker(&settings).await?;
            commands::workout::handle(cmd, &mut tracker, &plans, fmt).await?
        }
        Commands::Plan(cmd) => {
            let settings = load_settings()?;
            commands::plan::handle(cmd, &PlanDir::new(&settings.plans_dir), fmt).await?
        }
        Commands::History => {
            let settings = load_settings()?;
            let tracker = open_tracker(&settings).await?;
            commands::history::handle(&tracker, fmt).await?
        }
        Commands::Config(cmd) => commands::config::handle(cmd).await?,
    }

    Ok(())
}
