use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Cat5Error;

const DEFAULT_STARTS_PER_GAMEDAY: u32 = 10;
const DEFAULT_ITERATIONS: usize = 2000;
const DEFAULT_MIN_WEIGHT: f64 = 20.0;
const DEFAULT_MAX_WEIGHT: f64 = 80.0;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_TABLE: &str = "Cat5Table";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Mock,
    Prod,
}

impl StoreMode {
    pub fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(v) if v == "prod" => StoreMode::Prod,
            _ => StoreMode::Mock,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StoreMode::Mock => "MOCK",
            StoreMode::Prod => "PROD",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub starts_per_gameday: u32,
    pub iterations: usize,
    pub seed: Option<u64>,
    pub min_weight: f64,
    pub max_weight: f64,
    pub parallelism: usize,
    pub periods_path: Option<PathBuf>,
    pub snapshot_dir: PathBuf,
    pub table: String,
    pub mock_db_dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub read_mode: StoreMode,
    pub write_mode: StoreMode,
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starts_per_gameday: DEFAULT_STARTS_PER_GAMEDAY,
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            min_weight: DEFAULT_MIN_WEIGHT,
            max_weight: DEFAULT_MAX_WEIGHT,
            parallelism: 4,
            periods_path: None,
            snapshot_dir: PathBuf::from("snapshots"),
            table: DEFAULT_TABLE.to_string(),
            mock_db_dir: PathBuf::from(".mock-db"),
            sqlite_path: PathBuf::from("cat5.sqlite"),
            read_mode: StoreMode::Mock,
            write_mode: StoreMode::Mock,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl Settings {
    /// Reads `.env.local` / `.env` (if present) and then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let d = Settings::default();
        let min_weight = parse_env::<f64>("CAT5_MIN_WEIGHT")
            .unwrap_or(d.min_weight)
            .max(0.0);
        let max_weight = parse_env::<f64>("CAT5_MAX_WEIGHT")
            .unwrap_or(d.max_weight)
            .max(min_weight);
        Self {
            starts_per_gameday: parse_env("CAT5_STARTS_PER_GAMEDAY")
                .unwrap_or(d.starts_per_gameday)
                .max(1),
            iterations: parse_env("CAT5_ITERATIONS").unwrap_or(d.iterations).max(1),
            seed: parse_env("CAT5_SEED"),
            min_weight,
            max_weight,
            parallelism: parse_env::<usize>("CAT5_PARALLELISM")
                .unwrap_or(d.parallelism)
                .clamp(2, 32),
            periods_path: env_string("CAT5_PERIODS_PATH").map(PathBuf::from),
            snapshot_dir: env_string("CAT5_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.snapshot_dir),
            table: env_string("CAT5_TABLE").unwrap_or(d.table),
            mock_db_dir: env_string("CAT5_MOCK_DB_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.mock_db_dir),
            sqlite_path: env_string("CAT5_SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.sqlite_path),
            read_mode: StoreMode::from_env_value(env::var("DB_READ").ok().as_deref()),
            write_mode: StoreMode::from_env_value(env::var("DB_WRITE").ok().as_deref()),
            cache_ttl_secs: parse_env("CAT5_CACHE_TTL_SECS").unwrap_or(d.cache_ttl_secs),
        }
    }

    pub fn period_calendar(&self) -> Result<PeriodCalendar> {
        match &self.periods_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("read period calendar {}", path.display()))?;
                PeriodCalendar::from_json(&raw)
                    .with_context(|| format!("parse period calendar {}", path.display()))
            }
            None => PeriodCalendar::builtin(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse::<T>().ok())
}

/// Start date of every matchup period, per season year. Period `p` runs from
/// its own start date up to (not including) the start of period `p + 1`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PeriodCalendar {
    years: BTreeMap<i32, BTreeMap<u32, NaiveDate>>,
}

impl PeriodCalendar {
    pub fn builtin() -> Result<Self> {
        let raw = include_str!("../assets/matchup_periods.json");
        Self::from_json(raw).context("parse built-in period calendar")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn bounds(&self, year: i32, period: u32) -> Result<(NaiveDate, NaiveDate), Cat5Error> {
        let missing = || Cat5Error::MissingPeriod { year, period };
        let periods = self.years.get(&year).ok_or_else(missing)?;
        let start = periods.get(&period).ok_or_else(missing)?;
        let end = periods.get(&(period + 1)).ok_or_else(missing)?;
        Ok((*start, *end))
    }
}
