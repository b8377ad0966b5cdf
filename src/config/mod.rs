
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread::available_parallelism;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

const DEFAULT_WORKER_COUNT: usize = 4;
const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RESULTS: usize = 10;

pub const WORKERS_KEY: &str = "RECOMMENDER_WORKERS";
pub const DEADLINE_KEY: &str = "RECOMMENDER_DEADLINE_MS";
pub const MAX_RESULTS_KEY: &str = "RECOMMENDER_MAX_RESULTS";
pub const EVALUATION_DATE_KEY: &str = "RECOMMENDER_EVALUATION_DATE";
pub const CRITERIA_PATH_KEY: &str = "RECOMMENDER_CRITERIA_PATH";
pub const ATTESTATIONS_KEY: &str = "RECOMMENDER_ATTESTATIONS";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber {
        key: &'static str,
        value: String
    },
    #[error("{key} must be a YYYY-MM-DD date, got '{value}'")]
    InvalidDate {
        key: &'static str,
        value: String
    }
}

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on cards evaluated concurrently.
    pub worker_count: usize,
    /// Whole-pipeline deadline. `None` waits indefinitely (cancellation still applies).
    pub deadline: Option<Duration>,
    pub max_results: usize,
    /// Date whose quarter gates rotating categories. `None` means today, at request time.
    pub evaluation_date: Option<NaiveDate>,
    pub criteria_path: Option<PathBuf>,
    pub attestations: Vec<String>
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: available_parallelism().map(NonZeroUsize::get).unwrap_or(DEFAULT_WORKER_COUNT),
            deadline: Some(DEFAULT_DEADLINE),
            max_results: DEFAULT_MAX_RESULTS,
            evaluation_date: None,
            criteria_path: None,
            attestations: Vec::new()
        }
    }
}

impl EngineConfig {
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    /// Reads overrides from the process environment, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
        let mut config = Self::default();

        if let Some(value) = read(WORKERS_KEY) {
            config = config.with_worker_count(parse_positive(WORKERS_KEY, &value)?);
        }

        if let Some(value) = read(DEADLINE_KEY) {
            //NOTE: A deadline of zero turns the deadline off rather than failing every request
            config = config.with_deadline(match value.parse::<u64>() {
                Ok(0) => None,
                Ok(milliseconds) => Some(Duration::from_millis(milliseconds)),
                Err(_) => return Err(ConfigError::InvalidNumber { key: DEADLINE_KEY, value })
            });
        }

        if let Some(value) = read(MAX_RESULTS_KEY) {
            config = config.with_max_results(parse_positive(MAX_RESULTS_KEY, &value)?);
        }

        if let Some(value) = read(EVALUATION_DATE_KEY) {
            let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidDate { key: EVALUATION_DATE_KEY, value: value.clone() })?;
            config = config.with_evaluation_date(date);
        }

        config.criteria_path = read(CRITERIA_PATH_KEY).map(PathBuf::from);

        if let Some(value) = read(ATTESTATIONS_KEY) {
            config.attestations = value.split(',')
                .map(str::trim)
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>()
        .ok()
        .filter(|parsed| *parsed > 0)
        .ok_or_else(|| ConfigError::InvalidNumber { key, value: value.to_string() })
}
