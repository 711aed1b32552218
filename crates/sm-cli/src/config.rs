//! Configuration loading and validation.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use sm_core::ActivityWindow;
use sm_github::GITHUB_API_URL;
use sm_mail::{DEFAULT_SMTP_PORT, SmtpSettings};

/// Environment variables read without a prefix.
const RAW_ENV_KEYS: [&str; 7] = [
    "GITHUB_USERNAME",
    "GITHUB_TOKEN",
    "SMTP_SERVER",
    "SMTP_PORT",
    "SENDER_EMAIL",
    "SENDER_PASSWORD",
    "RECIPIENT_EMAIL",
];

const DEFAULT_TIMEZONE: &str = "Australia/Sydney";
const DEFAULT_WINDOW_START: &str = "00:01";
const DEFAULT_WINDOW_END: &str = "18:30";

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required settings are absent or blank.
    #[error("missing required settings: {}", .keys.join(", "))]
    Missing { keys: Vec<&'static str> },
    /// A setting is present but unusable.
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw settings as layered by figment. Use [`Config::settings`] to validate.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub github_username: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub smtp_server: Option<String>,
    #[serde(deserialize_with = "port_or_default")]
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub recipient_email: Option<String>,
    pub timezone: String,
    pub window_start: String,
    pub window_end: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_username", &self.github_username)
            .field("github_token", &redacted(self.github_token.as_ref()))
            .field("github_api_url", &self.github_api_url)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &redacted(self.sender_password.as_ref()))
            .field("recipient_email", &self.recipient_email)
            .field("timezone", &self.timezone)
            .field("window_start", &self.window_start)
            .field("window_end", &self.window_end)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_username: None,
            github_token: None,
            github_api_url: GITHUB_API_URL.to_string(),
            smtp_server: None,
            smtp_port: DEFAULT_SMTP_PORT,
            sender_email: None,
            sender_password: None,
            recipient_email: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            window_start: DEFAULT_WINDOW_START.to_string(),
            window_end: DEFAULT_WINDOW_END.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(config_path).extract()
    }

    /// Builds the provider stack: defaults, config files, then environment.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Plain variable names (GITHUB_TOKEN, SMTP_SERVER, ...), then STREAK_*
        figment
            .merge(Env::raw().only(&RAW_ENV_KEYS))
            .merge(Env::prefixed("STREAK_"))
    }

    /// Parses and checks the window settings only.
    pub fn window(&self) -> Result<ActivityWindow, ConfigError> {
        let timezone: Tz = self
            .timezone
            .trim()
            .parse()
            .map_err(|err| ConfigError::Invalid {
                key: "timezone",
                reason: format!("{err}"),
            })?;
        let start = parse_time_of_day("window_start", &self.window_start)?;
        let end = parse_time_of_day("window_end", &self.window_end)?;
        ActivityWindow::new(start, end, timezone).map_err(|err| ConfigError::Invalid {
            key: "window",
            reason: err.to_string(),
        })
    }

    /// Checks that every required setting is present and usable.
    ///
    /// All missing keys are reported together.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |key: &'static str, value: Option<&String>| -> String {
            match value {
                Some(value) if !value.trim().is_empty() => value.clone(),
                _ => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let username = require("GITHUB_USERNAME", self.github_username.as_ref());
        let token = require("GITHUB_TOKEN", self.github_token.as_ref());
        let host = require("SMTP_SERVER", self.smtp_server.as_ref());
        let sender = require("SENDER_EMAIL", self.sender_email.as_ref());
        let password = require("SENDER_PASSWORD", self.sender_password.as_ref());
        let recipient = require("RECIPIENT_EMAIL", self.recipient_email.as_ref());

        if !missing.is_empty() {
            return Err(ConfigError::Missing { keys: missing });
        }

        Ok(Settings {
            github: GithubSettings {
                username: username.trim().to_string(),
                token,
                api_url: self.github_api_url.clone(),
            },
            smtp: SmtpSettings {
                host: host.trim().to_string(),
                port: self.smtp_port,
                sender: sender.trim().to_string(),
                password,
                recipient: recipient.trim().to_string(),
            },
            window: self.window()?,
        })
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub github: GithubSettings,
    pub smtp: SmtpSettings,
    pub window: ActivityWindow,
}

#[derive(Clone)]
pub struct GithubSettings {
    pub username: String,
    pub token: String,
    pub api_url: String,
}

impl fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSettings")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn redacted(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[REDACTED]")
}

/// A port given as a number or a string; blank means the default port.
fn port_or_default<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match RawPort::deserialize(deserializer)? {
        RawPort::Number(port) => Ok(port),
        RawPort::Text(text) if text.trim().is_empty() => Ok(DEFAULT_SMTP_PORT),
        RawPort::Text(text) => text.trim().parse().map_err(|err| {
            serde::de::Error::custom(format!("invalid SMTP port {text:?}: {err}"))
        }),
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
fn parse_time_of_day(key: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|err| ConfigError::Invalid {
            key,
            reason: format!("{value:?} is not a time of day ({err})"),
        })
}

/// Returns the platform-specific config directory for streak.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("streak"))
}
