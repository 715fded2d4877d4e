//! Watch configuration loaded from a RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use watcher_core::RuleSet;
use watcher_engine::{FetchSettings, NotificationEndpoint, NotifySettings, PollSettings};
use watcher_logging::watch_warn;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid target url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    pub target_url: String,
    pub recipient: String,
    pub interval_hours: u64,
    #[serde(default)]
    pub fetch_on_start: bool,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub selector: String,
    pub target_path: String,
    pub positive_value: String,
    pub negative_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub sender: String,
    #[serde(default)]
    pub credential: String,
    pub relay_host: String,
    #[serde(default = "default_relay_port")]
    pub relay_port: u16,
}

fn default_relay_port() -> u16 {
    587
}

/// Timeouts and size bounds; every field falls back to the engine defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_page_bytes: u64,
    pub send_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            max_page_bytes: fetch.max_bytes,
            send_timeout_secs: NotifySettings::default().send_timeout.as_secs(),
        }
    }
}

impl WatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: WatchConfig =
            ron::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        url::Url::parse(&config.target_url).map_err(|err| ConfigError::InvalidUrl {
            url: config.target_url.clone(),
            message: err.to_string(),
        })?;
        config.warn_on_gaps();
        Ok(config)
    }

    /// Rules that can never fire are accepted, but worth a line in the log.
    fn warn_on_gaps(&self) {
        if self.rules.is_empty() {
            watch_warn!("No rules configured; pages will be fetched but never classified");
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.selector.trim().is_empty() {
                watch_warn!("Rule {} has an empty selector and will never match", index);
            }
            if rule.positive_value.is_empty() {
                watch_warn!("Rule {} has an empty positive value and will never alert", index);
            }
        }
    }

    pub fn rule_set(&self) -> RuleSet {
        let mut rules = RuleSet::new(&self.target_url, &self.recipient, self.interval_hours);
        for rule in &self.rules {
            rules.add_rule(
                &rule.selector,
                &rule.target_path,
                &rule.positive_value,
                &rule.negative_value,
            );
        }
        rules
    }

    pub fn endpoint(&self) -> NotificationEndpoint {
        NotificationEndpoint {
            sender: self.smtp.sender.clone(),
            credential: self.smtp.credential.clone(),
            relay_host: self.smtp.relay_host.clone(),
            relay_port: self.smtp.relay_port,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            fetch_on_start: self.fetch_on_start,
            ..PollSettings::from_hours(self.interval_hours)
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.limits.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.limits.request_timeout_secs),
            max_bytes: self.limits.max_page_bytes,
            ..FetchSettings::default()
        }
    }

    pub fn notify_settings(&self) -> NotifySettings {
        NotifySettings {
            send_timeout: Duration::from_secs(self.limits.send_timeout_secs),
        }
    }
}
