//! Typed configuration records.
//!
//! Records are materialized once from the raw parsed document (see
//! [`super::adapter`]) and immutable afterwards. String normalization
//! happens in the `normalized()` factory step at materialization time,
//! never by mutating a constructed record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::cookies::{resolve_cookies, CookieSource};
use super::error::{ConfigError, ConfigResult};

/// Network and browser tuning for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequesterConfig {
    pub user_agent: String,
    pub request_interval: f64,
    pub retry_times: u32,
    pub retry_interval: f64,
    pub timeout: f64,
    pub headless: bool,
    pub user_data_folder: String,
    pub profile_name: String,
    pub auto_close: bool,
    pub disable_images: bool,
    pub mute_audio: bool,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            user_agent: String::new(),
            request_interval: 5.0,
            retry_times: 3,
            retry_interval: 5.0,
            timeout: 30.0,
            headless: true,
            user_data_folder: String::new(),
            profile_name: String::new(),
            auto_close: true,
            disable_images: true,
            mute_audio: true,
        }
    }
}

impl RequesterConfig {
    /// Known field names, used by the adapter to filter unknown keys.
    pub const FIELDS: &'static [&'static str] = &[
        "user_agent",
        "request_interval",
        "retry_times",
        "retry_interval",
        "timeout",
        "headless",
        "user_data_folder",
        "profile_name",
        "auto_close",
        "disable_images",
        "mute_audio",
    ];

    /// Trim whitespace from all string fields.
    pub fn normalized(mut self) -> Self {
        self.user_agent = self.user_agent.trim().to_string();
        self.user_data_folder = self.user_data_folder.trim().to_string();
        self.profile_name = self.profile_name.trim().to_string();
        self
    }
}

/// Execution-mode settings: sequential vs. bounded parallel fan-out,
/// result persistence and reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskerConfig {
    pub parallel: bool,
    pub max_workers: usize,
    pub save_results: bool,
    pub results_path: String,
    pub generate_report: bool,
}

impl Default for TaskerConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_workers: 5,
            save_results: false,
            results_path: "results/".to_string(),
            generate_report: false,
        }
    }
}

impl TaskerConfig {
    pub const FIELDS: &'static [&'static str] = &[
        "parallel",
        "max_workers",
        "save_results",
        "results_path",
        "generate_report",
    ];

    pub fn normalized(mut self) -> Self {
        self.results_path = self.results_path.trim().to_string();
        self
    }
}

/// Logging verbosity. Any value outside the enumerated set is a hard
/// materialization error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// The corresponding `tracing` filter directive level.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
        }
    }
}

impl DebugConfig {
    pub const FIELDS: &'static [&'static str] = &["log_level"];
}

/// One site's settings: two fixed fields plus arbitrary extension keys
/// preserved verbatim and accessible by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub signin_url: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            signin_url: None,
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Attribute-style lookup: fixed fields first, then the extension map.
    /// A name matching neither fails with [`ConfigError::UnknownAttribute`].
    pub fn attr(&self, name: &str) -> ConfigResult<Value> {
        match name {
            "enabled" => Ok(Value::Bool(self.enabled)),
            "signin_url" => Ok(self
                .signin_url
                .as_ref()
                .map(|u| Value::String(u.clone()))
                .unwrap_or(Value::Null)),
            _ => self
                .extra
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownAttribute(name.to_string())),
        }
    }

    pub fn signin_url(&self) -> Option<&str> {
        self.signin_url.as_deref()
    }

    /// Whether tasks for this site drive a browser page (extension key,
    /// absent means false).
    pub fn wants_browser(&self) -> bool {
        self.extra
            .get("use_browser")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Names of the preserved extension keys.
    pub fn extension_keys(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }
}

/// One user's credentials for one site. `cookies` is derived exactly once
/// at construction from `raw_cookies`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub raw_cookies: CookieSource,
    pub cookies: BTreeMap<String, String>,
}

impl Account {
    pub fn new(username: &str, password: &str, raw_cookies: CookieSource) -> Self {
        let cookies = resolve_cookies(&raw_cookies);
        Self {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
            raw_cookies,
            cookies,
        }
    }
}
