//! Service configuration, read from the process environment.
//!
//! A `.env` file in the working directory is loaded first when present; real
//! environment variables win over it.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::{invalid, ConfigError};
use crate::types::{FieldNames, TableRef};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the daemon, the CLI and the sync pipeline need to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub app_id: String,
    pub app_secret: String,
    pub base_url: String,
    /// Table read by search and ranking.
    pub search_table: TableRef,
    /// Table whose invitation codes are counted.
    pub source_table: TableRef,
    /// Table whose count column is rewritten.
    pub target_table: TableRef,
    pub fields: FieldNames,
    /// Local wall-clock time of the daily sync; `None` disables the scheduler.
    pub sync_at: Option<NaiveTime>,
    pub write_interval: Duration,
    pub write_timeout: Duration,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the process environment (and `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing { var: key });

        let defaults = FieldNames::default();
        let fields = FieldNames {
            phone: get("INVITE_FIELD_PHONE").unwrap_or(defaults.phone),
            invite_code: get("INVITE_FIELD_CODE").unwrap_or(defaults.invite_code),
            invite_count: get("INVITE_FIELD_COUNT").unwrap_or(defaults.invite_count),
            name: get("INVITE_FIELD_NAME").unwrap_or(defaults.name),
        };

        let scheduler_off = get("INVITE_SYNC_SCHEDULE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "off" | "false" | "0"))
            .unwrap_or(false);
        let sync_at = if scheduler_off {
            None
        } else {
            Some(match get("INVITE_SYNC_AT") {
                Some(raw) => parse_time_of_day("INVITE_SYNC_AT", &raw)?,
                None => NaiveTime::MIN,
            })
        };

        Ok(Self {
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            app_id: require("FEISHU_APP_ID")?,
            app_secret: require("FEISHU_APP_SECRET")?,
            base_url: get("FEISHU_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            search_table: TableRef::new(
                require("FEISHU_APP_TOKEN")?,
                require("FEISHU_TABLE_ID")?,
            ),
            source_table: TableRef::new(
                require("FEISHU_SOURCE_APP_TOKEN")?,
                require("FEISHU_SOURCE_TABLE_ID")?,
            ),
            target_table: TableRef::new(
                require("FEISHU_TARGET_APP_TOKEN")?,
                require("FEISHU_TARGET_TABLE_ID")?,
            ),
            fields,
            sync_at,
            write_interval: Duration::from_millis(parse_or(
                "INVITE_WRITE_INTERVAL_MS",
                get("INVITE_WRITE_INTERVAL_MS"),
                DEFAULT_WRITE_INTERVAL.as_millis() as u64,
            )?),
            write_timeout: Duration::from_secs(parse_or(
                "INVITE_WRITE_TIMEOUT_SECS",
                get("INVITE_WRITE_TIMEOUT_SECS"),
                DEFAULT_WRITE_TIMEOUT.as_secs(),
            )?),
            static_dir: get("INVITE_STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| invalid(var, &raw, e)),
        None => Ok(default),
    }
}

fn parse_time_of_day(var: &'static str, raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| invalid(var, raw, e))
}
