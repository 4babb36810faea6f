use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::reminders::DEFAULT_LOOKAHEAD_MINUTES;

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Transactional mail API endpoint. Unset means dry-run.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            from: "Study Blocks <reminders@localhost>".into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Address for the HTTP control API. Unset means no HTTP surface.
    pub bind: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub check_interval_ms: u64,
    pub lookahead_minutes: i64,
    pub dashboard_url: Option<String>,
    pub debug: bool,
    pub mail: MailConfig,
    pub control: ControlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("studyblock.sqlite3"),
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            lookahead_minutes: DEFAULT_LOOKAHEAD_MINUTES,
            dashboard_url: None,
            debug: false,
            mail: MailConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| anyhow!("invalid value '{raw}' for {key}: {err}"))
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Config {
    /// Defaults, then the optional JSON file, then `STUDYBLOCK_*` environment
    /// variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config in {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("STUDYBLOCK_DATABASE_PATH").and_then(non_empty) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("STUDYBLOCK_CHECK_INTERVAL_MS") {
            self.check_interval_ms = parse_var("STUDYBLOCK_CHECK_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("STUDYBLOCK_LOOKAHEAD_MINUTES") {
            self.lookahead_minutes = parse_var("STUDYBLOCK_LOOKAHEAD_MINUTES", &value)?;
        }
        if let Some(value) = lookup("STUDYBLOCK_DASHBOARD_URL") {
            self.dashboard_url = non_empty(value);
        }
        if let Some(value) = lookup("STUDYBLOCK_DEBUG") {
            self.debug = value == "1" || value.eq_ignore_ascii_case("true");
        }

        if let Some(value) = lookup("STUDYBLOCK_MAIL_API_URL") {
            self.mail.api_url = non_empty(value);
        }
        if let Some(value) = lookup("STUDYBLOCK_MAIL_API_KEY") {
            self.mail.api_key = non_empty(value);
        }
        if let Some(value) = lookup("STUDYBLOCK_MAIL_FROM").and_then(non_empty) {
            self.mail.from = value;
        }
        if let Some(value) = lookup("STUDYBLOCK_MAIL_TIMEOUT_SECS") {
            self.mail.timeout_secs = parse_var("STUDYBLOCK_MAIL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = lookup("STUDYBLOCK_CONTROL_BIND") {
            self.control.bind = non_empty(value);
        }
        if let Some(value) = lookup("STUDYBLOCK_CONTROL_SECRET") {
            self.control.secret = non_empty(value);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval_ms == 0 {
            bail!("check_interval_ms must be greater than zero");
        }
        if self.lookahead_minutes <= 0 {
            bail!("lookahead_minutes must be positive");
        }
        if self.mail.timeout_secs == 0 {
            bail!("mail.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
