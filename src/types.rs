use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tracker::RECENT_LIMIT;

/// Flat `key = "value"` config file.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let map = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(Self { map })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string(&self.map)?;
        fs::write(path, content).with_context(|| format!("Failed to save config to {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Pretty }
    }
}

/// Prints `value` as JSON, or runs `pretty` for the colored rendition.
pub fn emit<T: Serialize + ?Sized>(fmt: OutputFmt, value: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("failed to encode JSON output: {}", e),
        },
        OutputFmt::Pretty => pretty(),
    }
}

pub fn config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("ironlog").join("config"))
        .context("Could not determine config directory")
}

/// Everything the CLI needs, resolved from config keys with defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub user_id: String,
    pub db_path: String,
    pub cache_dir: PathBuf,
    pub plans_dir: PathBuf,
    pub recent_limit: u32,
}

impl Settings {
    pub const KEYS: [&'static str; 5] = ["user_id", "db_path", "cache_dir", "plans_dir", "recent_limit"];

    pub fn from_config(cfg: &Config) -> Result<Self> {
        // Without a home directory, keep everything next to the working dir.
        let fallback = || PathBuf::from(".ironlog");
        let data_dir = dirs::data_dir().map(|d| d.join("ironlog")).unwrap_or_else(fallback);
        let config_dir = dirs::config_dir().map(|d| d.join("ironlog")).unwrap_or_else(fallback);

        let get = |key: &str| cfg.map.get(key).map(String::as_str);

        for key in ["user_id", "db_path", "cache_dir", "plans_dir"] {
            if get(key).is_some_and(|v| v.trim().is_empty()) {
                bail!("`{}` must not be empty", key);
            }
        }

        let recent_limit = match get("recent_limit") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("`recent_limit` must be a positive number, got `{}`", raw))?,
            None => RECENT_LIMIT,
        };

        Ok(Self {
            user_id: get("user_id").unwrap_or("local").to_string(),
            db_path: get("db_path")
                .map(str::to_string)
                .unwrap_or_else(|| data_dir.join("ironlog.db").display().to_string()),
            cache_dir: get("cache_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("cache")),
            plans_dir: get("plans_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| config_dir.join("plans")),
            recent_limit,
        })
    }
}
