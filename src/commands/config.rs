use anyhow::Result;
use colored::Colorize;
use ironlog::types::{Config, Settings, config_path};

use crate::cli::ConfigCmd;

pub async fn handle(cmd: ConfigCmd) -> Result<()> {
    let config_path = config_path()?;
    let mut cfg = Config::load(&config_path)?;

    match cmd {
        ConfigCmd::List => {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }

        ConfigCmd::Get { key } => match cfg.map.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !Settings::KEYS.contains(&key.as_str()) {
                println!(
                    "{} `{}` is not a known key ({})",
                    "warning:".yellow().bold(),
                    key,
                    Settings::KEYS.join(", ")
                );
            }

            cfg.map.insert(key.clone(), val.clone());
            // Reject values the CLI could not start with.
            if let Err(e) = Settings::from_config(&cfg) {
                println!("{} {:#}", "error:".red().bold(), e);
                return Ok(());
            }
            cfg.save(&config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(&config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
