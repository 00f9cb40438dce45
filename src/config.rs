use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    analysis::InvalidGoal,
    model::subject::SubjectSet,
    storage::csv_file::CSV_LOG_FILE_NAME,
    timer::ShortSessionPolicy,
    utils::time::{DEFAULT_OFFSET_HOURS, StudyZone},
    validation::DEFAULT_MAX_MANUAL_MINUTES,
};

pub const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_SUBJECTS: [&str; 5] = [
    "憲法 (Constitution)",
    "民法 (Civil Law)",
    "行政法 (Admin Law)",
    "商法・会社法 (Commercial Law)",
    "一般知識 (General Knowledge)",
];
pub const DEFAULT_GOAL_HOURS: i64 = 800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    InvalidGoal(#[from] InvalidGoal),
}

/// Contents of `config.json`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackerConfig {
    pub subjects: Vec<String>,
    pub goal_hours: i64,
    pub min_minutes: u32,
    pub max_manual_minutes: u32,
    pub utc_offset_hours: i32,
    pub short_session_policy: ShortSessionPolicy,
    /// Log file, relative to the application directory. `.jsonl` files hold JSON lines, anything
    /// else is CSV.
    pub log_file: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            subjects: DEFAULT_SUBJECTS.iter().map(|v| v.to_string()).collect(),
            goal_hours: DEFAULT_GOAL_HOURS,
            min_minutes: 1,
            max_manual_minutes: DEFAULT_MAX_MANUAL_MINUTES,
            utc_offset_hours: DEFAULT_OFFSET_HOURS,
            short_session_policy: ShortSessionPolicy::default(),
            log_file: PathBuf::from(CSV_LOG_FILE_NAME),
        }
    }
}

/// Validated configuration the tracker runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub subjects: SubjectSet,
    pub goal_minutes: i64,
    pub min_minutes: u32,
    pub max_manual_minutes: u32,
    pub zone: StudyZone,
    pub short_session_policy: ShortSessionPolicy,
}

impl TrackerConfig {
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let subjects = SubjectSet::new_opt(self.subjects.iter().map(String::as_str))
            .ok_or_else(|| {
                ConfigError::InvalidConfig("subjects have to be non-empty and unique".into())
            })?;

        let goal_minutes = self.goal_hours.saturating_mul(60);
        if goal_minutes <= 0 {
            return Err(InvalidGoal(goal_minutes).into());
        }

        if self.min_minutes == 0 || self.min_minutes > self.max_manual_minutes {
            return Err(ConfigError::InvalidConfig(format!(
                "minimum minutes {} has to be at least 1 and at most {}",
                self.min_minutes, self.max_manual_minutes
            )));
        }

        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig("log file can't be empty".into()));
        }

        let zone = StudyZone::from_hours(self.utc_offset_hours).ok_or_else(|| {
            ConfigError::InvalidConfig(format!(
                "unsupported UTC offset {} hours",
                self.utc_offset_hours
            ))
        })?;

        Ok(Settings {
            subjects,
            goal_minutes,
            min_minutes: self.min_minutes,
            max_manual_minutes: self.max_manual_minutes,
            zone,
            short_session_policy: self.short_session_policy,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        TrackerConfig::default()
            .settings()
            .expect("Default config should always be valid")
    }
}

/// Writes the default config unless one already exists.
pub fn ensure_default_config(config_dir: &Path) -> Result<(), ConfigError> {
    let path = config_dir.join(CONFIG_FILE);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&TrackerConfig::default())?;
        fs::write(&path, format!("{formatted}\n"))?;
        info!("Created default config in {path:?}");
    }
    Ok(())
}

pub fn load_config(config_dir: &Path) -> Result<TrackerConfig, ConfigError> {
    let raw = fs::read_to_string(config_dir.join(CONFIG_FILE))?;
    Ok(serde_json::from_str(&raw)?)
}
