use crate::models::parse_date;
use crate::stats::Lookback;
use chrono::NaiveDate;
use std::{env, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/habits.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub lookback: Lookback,
    /// Pins "today" for every request when set.
    pub fixed_today: Option<NaiveDate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            lookback: Lookback::Unbounded,
            fixed_today: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Config::default();

        if let Some(value) = lookup("PORT") {
            match value.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => warn!("ignoring invalid PORT '{value}'"),
            }
        }

        if let Some(path) = lookup("APP_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }

        if let Some(value) = lookup("HABIT_STREAK_LOOKBACK_DAYS") {
            match value.parse::<u32>() {
                Ok(days) => config.lookback = Lookback::from_days(days),
                Err(_) => warn!("ignoring invalid HABIT_STREAK_LOOKBACK_DAYS '{value}'"),
            }
        }

        if let Some(value) = lookup("APP_FIXED_DATE") {
            let date =
                parse_date(&value).map_err(|err| format!("APP_FIXED_DATE '{value}': {err}"))?;
            config.fixed_today = Some(date);
        }

        Ok(config)
    }
}
