// src/config.rs
use crate::constants::{
    DEFAULT_CONTENT_MAX_CHARS, DEFAULT_CONTENT_MAX_DEPTH, DEFAULT_REQUEST_TIMEOUT,
    NOTION_API_PAGE_SIZE, RETRY_MAX_ATTEMPTS,
};
use crate::error::AppError;
use crate::sync::SyncOptions;
use crate::types::{ApiKey, LogicalDbName, NotionId, ValidationError};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable consulted for the log level when neither the flag
/// nor the config file sets one.
pub const LOG_LEVEL_ENV: &str = "NOTION_SYNC_LOG_LEVEL";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory for app.log and error.log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mirror every configured database into the local store
    Sync(SyncArgs),

    /// Record and relation counts per logical database
    Stats {
        /// Print as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List sync runs, newest first
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show the events of one sync run
    Events {
        run_id: i64,
        /// Only events of this step (start, database_synced, finish, fatal)
        #[arg(long)]
        step: Option<String>,
        #[arg(long, default_value_t = 200)]
        limit: usize,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Do not fetch record body text
    #[arg(long, default_value_t = false)]
    pub skip_content: bool,

    /// Characters of body text kept per record
    #[arg(long, default_value_t = DEFAULT_CONTENT_MAX_CHARS)]
    pub content_max_chars: usize,

    /// Block nesting depth read for body text
    #[arg(long, default_value_t = DEFAULT_CONTENT_MAX_DEPTH)]
    pub content_max_depth: usize,

    /// Records per query page (1-100)
    #[arg(long, default_value_t = NOTION_API_PAGE_SIZE)]
    pub page_size: u32,

    /// Replace every database instead of syncing incrementally
    #[arg(long, default_value_t = false)]
    pub full: bool,
}

impl SyncArgs {
    pub fn options(&self) -> Result<SyncOptions, AppError> {
        if !(1..=NOTION_API_PAGE_SIZE).contains(&self.page_size) {
            return Err(ValidationError::OutOfBounds {
                value: self.page_size,
                min: 1,
                max: NOTION_API_PAGE_SIZE,
            }
            .into());
        }
        Ok(SyncOptions {
            include_content: !self.skip_content,
            content_max_chars: self.content_max_chars,
            content_max_depth: self.content_max_depth,
            page_size: self.page_size,
            incremental: !self.full,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    notion: NotionSection,
    #[serde(default)]
    store: StoreSection,
    #[serde(default)]
    logging: LoggingSection,
    #[serde(default)]
    databases: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NotionSection {
    token_env: String,
    request_timeout_secs: u64,
    retry_max: u32,
}

impl Default for NotionSection {
    fn default() -> Self {
        Self {
            token_env: "NOTION_TOKEN".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            retry_max: RETRY_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StoreSection {
    path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/notion_sync.db"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingSection {
    dir: Option<PathBuf>,
    level: Option<String>,
}

/// Resolved application configuration: paths absolute against the config
/// file's directory, ids normalized, names validated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token_env: String,
    pub request_timeout: Duration,
    pub retry_max: u32,
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: Option<String>,
    /// Sync order is the order of the `[databases]` table.
    pub databases: IndexMap<LogicalDbName, NotionId>,
}

impl AppConfig {
    /// Reads and validates the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::MissingConfiguration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_toml(&text, base_dir).map_err(|err| match err {
            AppError::ConfigParse { source, .. } => AppError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses config text; relative paths resolve against `base_dir`.
    pub fn from_toml(text: &str, base_dir: &Path) -> Result<Self, AppError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| AppError::ConfigParse {
            path: PathBuf::new(),
            source,
        })?;

        if file.databases.is_empty() {
            return Err(AppError::MissingConfiguration(
                "[databases] must map at least one logical name to a database id".to_string(),
            ));
        }
        let mut databases = IndexMap::with_capacity(file.databases.len());
        for (name, id) in file.databases {
            let logical_db = LogicalDbName::new(name)?;
            let database_id = NotionId::parse(&id).map_err(|e| {
                AppError::InvalidConfiguration(format!("databases.{}: {}", logical_db, e))
            })?;
            databases.insert(logical_db, database_id);
        }

        let notion = file.notion;
        if notion.token_env.trim().is_empty() {
            return Err(ValidationError::EmptyField("notion.token_env").into());
        }
        if notion.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfiguration(
                "notion.request_timeout_secs must be positive".to_string(),
            ));
        }
        if notion.retry_max == 0 {
            return Err(ValidationError::OutOfBounds {
                value: 0,
                min: 1,
                max: u32::MAX,
            }
            .into());
        }

        Ok(Self {
            token_env: notion.token_env.trim().to_string(),
            request_timeout: Duration::from_secs(notion.request_timeout_secs),
            retry_max: notion.retry_max,
            store_path: resolve(base_dir, &file.store.path),
            log_dir: resolve(
                base_dir,
                file.logging
                    .dir
                    .as_deref()
                    .unwrap_or_else(|| Path::new("./data/logs")),
            ),
            log_level: file.logging.level,
            databases,
        })
    }

    /// The integration token, read from the configured environment variable.
    pub fn api_key(&self) -> Result<ApiKey, AppError> {
        let raw = std::env::var(&self.token_env).map_err(|_| {
            AppError::MissingConfiguration(format!(
                "{} environment variable not set",
                self.token_env
            ))
        })?;
        Ok(ApiKey::new(raw)?)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// First level set among the flag, the config file and the environment;
/// `info` when none is.
pub fn resolve_log_level(
    flag: Option<&str>,
    config: Option<&str>,
) -> Result<LevelFilter, AppError> {
    let env = std::env::var(LOG_LEVEL_ENV).ok();
    let chosen = flag
        .or(config)
        .or(env.as_deref())
        .map(str::trim)
        .filter(|level| !level.is_empty());
    match chosen {
        None => Ok(LevelFilter::Info),
        Some(level) => LevelFilter::from_str(level)
            .map_err(|_| AppError::InvalidConfiguration(format!("unknown log level '{}'", level))),
    }
}
