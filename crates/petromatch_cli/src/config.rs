use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use petromatch_core::{DashboardSettings, MatchStart, PollPolicy};
use petromatch_engine::{ClientSettings, StaticToken};
use serde::{Deserialize, Serialize};

use engine_logging::engine_info;

pub const API_URL_VAR: &str = "PETROMATCH_API_URL";
pub const TOKEN_VAR: &str = "PETROMATCH_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_backoff_ceiling_ms")]
    pub backoff_ceiling_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default)]
    pub match_start: MatchStart,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_backoff_ceiling_ms() -> u64 {
    30_000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_settle_delay_ms() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            auth_token: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            backoff_ceiling_ms: default_backoff_ceiling_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            settle_delay_ms: default_settle_delay_ms(),
            match_start: MatchStart::default(),
            log_file: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Reads a RON config file; without a path every field takes its default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_ron(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        engine_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    /// Applies `PETROMATCH_API_URL` and `PETROMATCH_TOKEN`; blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank =
            |name: &str| lookup(name).filter(|value: &String| !value.trim().is_empty());
        if let Some(url) = non_blank(API_URL_VAR) {
            self.api_url = url;
        }
        if let Some(token) = non_blank(TOKEN_VAR) {
            self.auth_token = Some(token);
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            poll: PollPolicy {
                interval: Duration::from_millis(self.poll_interval_ms),
                backoff_ceiling: Duration::from_millis(self.backoff_ceiling_ms),
                max_consecutive_failures: self.max_consecutive_failures,
            },
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            match_start: self.match_start,
        }
    }

    pub fn credentials(&self) -> StaticToken {
        match &self.auth_token {
            Some(token) => StaticToken::new(token.clone()),
            None => StaticToken::anonymous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_ron("(api_url: \"https://api.petromatch.io\")").unwrap();
        assert_eq!(config.api_url, "https://api.petromatch.io");
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.match_start, MatchStart::OnSubmit);
        assert_eq!(config.dashboard_settings(), DashboardSettings::default());
    }

    #[test]
    fn file_values_reach_the_engine_settings() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("petromatch.ron");
        fs::write(
            &path,
            r#"(
                poll_interval_ms: 500,
                backoff_ceiling_ms: 4000,
                max_consecutive_failures: 3,
                settle_delay_ms: 750,
                request_timeout_ms: 5000,
                match_start: OnCompletion,
                log_file: Some("petromatch.log"),
            )"#,
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        let dashboard = config.dashboard_settings();
        assert_eq!(dashboard.poll.interval, Duration::from_millis(500));
        assert_eq!(dashboard.poll.backoff_ceiling, Duration::from_secs(4));
        assert_eq!(dashboard.poll.max_consecutive_failures, 3);
        assert_eq!(dashboard.settle_delay, Duration::from_millis(750));
        assert_eq!(dashboard.match_start, MatchStart::OnCompletion);
        assert_eq!(
            config.client_settings().request_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(config.log_file, Some(PathBuf::from("petromatch.log")));
    }

    #[test]
    fn unreadable_or_malformed_files_are_errors() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(Config::load(Some(temp.path().join("absent.ron").as_path())).is_err());

        let path = temp.path().join("broken.ron");
        fs::write(&path, "(poll_interval_ms: \"soon\")").unwrap();
        assert!(Config::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = HashMap::from([
            (API_URL_VAR, "https://staging.petromatch.io"),
            (TOKEN_VAR, "jwt-abc"),
        ]);
        let mut config = Config {
            auth_token: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(|name| env.get(name).map(|value| value.to_string()));

        assert_eq!(config.api_url, "https://staging.petromatch.io");
        assert_eq!(config.auth_token.as_deref(), Some("jwt-abc"));
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }
}
