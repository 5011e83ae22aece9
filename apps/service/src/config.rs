use std::time::Duration;
use std::{env, fmt, fs, io, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::monitoring::checker::{CheckMethod, DEFAULT_REQUEST_TIMEOUT};

/// Poll interval used when none is configured
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// Largest accepted down alert threshold
pub const MAX_ALERT_THRESHOLD: usize = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no websites to monitor")]
    NoTargets,
    #[error("invalid down_alert_threshold configuration: {0:?}")]
    InvalidThreshold(String),
    #[error("invalid interval_seconds configuration: {0:?}")]
    InvalidInterval(String),
    #[error("no alert emails configured")]
    NoRecipients,
    #[error("invalid request_timeout_seconds: {0} (expected 1..=300)")]
    InvalidRequestTimeout(u64),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed { path: path::PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("no config directory available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorSettings,
    pub storage: StorageSettings,
    pub mailgun: MailgunSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Raw monitoring settings, validated by the engine at construction.
///
/// Lists are comma-delimited and numbers are kept as text so the same
/// values can come from a file or from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub websites: String,
    pub interval_seconds: Option<String>,
    pub down_alert_threshold: String,
    pub alert_emails: String,
    pub request_timeout_seconds: u64,
    pub check_method: CheckMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailgunSettings {
    pub domain: String,
    pub api_key: String,
    pub sender: String,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `compact` or `json`
    pub format: String,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            websites: String::new(),
            interval_seconds: None,
            down_alert_threshold: "3".into(),
            alert_emails: String::new(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            check_method: CheckMethod::Get,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { db_path: "uptime-monitor.db".into() }
    }
}

impl Default for MailgunSettings {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: String::new(),
            sender: String::new(),
            api_base: crate::mail::MAILGUN_API_BASE_EU.into(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { enabled: true, bind: "0.0.0.0".into(), port: 8080 }
    }
}

impl MailgunSettings {
    pub fn is_configured(&self) -> bool {
        !self.domain.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Validated engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub targets: Vec<String>,
    pub interval: Duration,
    pub alert_threshold: usize,
    pub recipients: Vec<String>,
    pub request_timeout: Duration,
    pub check_method: CheckMethod,
}

impl TryFrom<MonitorSettings> for EngineConfig {
    type Error = ConfigError;

    fn try_from(settings: MonitorSettings) -> Result<Self, Self::Error> {
        let targets = split_list(&settings.websites);
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        for target in &targets {
            if let Err(e) = url::Url::parse(target) {
                warn!(website = %target, "Target is not a valid URL, checks will fail: {}", e);
            }
        }

        let interval = match settings.interval_seconds.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_INTERVAL,
            Some(raw) => match raw.parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => return Err(ConfigError::InvalidInterval(raw.to_string())),
            },
        };

        let raw_threshold = settings.down_alert_threshold.trim();
        let alert_threshold = match raw_threshold.parse::<usize>() {
            Ok(threshold) if (1..=MAX_ALERT_THRESHOLD).contains(&threshold) => threshold,
            _ => return Err(ConfigError::InvalidThreshold(raw_threshold.to_string())),
        };

        let recipients = split_list(&settings.alert_emails);
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }

        if !(1..=MAX_REQUEST_TIMEOUT_SECONDS).contains(&settings.request_timeout_seconds) {
            return Err(ConfigError::InvalidRequestTimeout(settings.request_timeout_seconds));
        }

        Ok(Self {
            targets,
            interval,
            alert_threshold,
            recipients,
            request_timeout: Duration::from_secs(settings.request_timeout_seconds),
            check_method: settings.check_method,
        })
    }
}

/// Split a comma-delimited list, dropping blank and repeated entries
fn split_list(raw: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if entries.iter().any(|seen| seen == entry) {
            warn!("Ignoring duplicate entry {:?}", entry);
            continue;
        }
        entries.push(entry.to_string());
    }
    entries
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/uptime/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("uptime/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        let api_key = if self.mailgun.api_key.is_empty() { "<unset>" } else { "********" };

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Websites", &self.monitor.websites)?;
        write_1(f, "Interval Seconds", &self.monitor.interval_seconds.as_deref().unwrap_or("60"))?;
        write_1(f, "Down Alert Threshold", &self.monitor.down_alert_threshold)?;
        write_1(f, "Alert Emails", &self.monitor.alert_emails)?;
        write_1(f, "Request Timeout Seconds", &self.monitor.request_timeout_seconds)?;
        write_1(f, "Check Method", &format!("{:?}", self.monitor.check_method))?;
        write_title_1(f, "Storage")?;
        write_1(f, "Database Path", &self.storage.db_path)?;
        write_title_1(f, "Mailgun")?;
        write_1(f, "Domain", &self.mailgun.domain)?;
        write_1(f, "API Key", &api_key)?;
        write_1(f, "Sender", &self.mailgun.sender)?;
        write_1(f, "API Base", &self.mailgun.api_base)?;
        write_title_1(f, "Server")?;
        write_1(f, "Enabled", &self.server.enabled)?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uptime/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```no_run
    /// use uptime_service::config::Config;
    ///
    /// let cfg = Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), uptime_service::config::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    /// Overlay values from the process environment
    ///
    /// Returns warnings for ignored values; this runs before logging is set up.
    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    /// Overlay values looked up by variable name; unset names keep the file value
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(v) = lookup("WEBSITES") {
            self.monitor.websites = v;
        }
        if let Some(v) = lookup("INTERVAL_SECONDS") {
            self.monitor.interval_seconds = Some(v);
        }
        if let Some(v) = lookup("DOWN_ALERT_THRESHOLD") {
            self.monitor.down_alert_threshold = v;
        }
        if let Some(v) = lookup("ALERT_EMAILS") {
            self.monitor.alert_emails = v;
        }
        if let Some(v) = lookup("DB_PATH").filter(|v| !v.is_empty()) {
            self.storage.db_path = v;
        }
        if let Some(v) = lookup("MAILGUN_DOMAIN") {
            self.mailgun.domain = v;
        }
        if let Some(v) = lookup("MAILGUN_API_KEY") {
            self.mailgun.api_key = v;
        }
        if let Some(v) = lookup("MAILGUN_SENDER") {
            self.mailgun.sender = v;
        }
        if let Some(v) = lookup("BIND") {
            self.server.bind = v;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warnings.push(format!("Ignoring invalid PORT value {:?}", port)),
            }
        }

        warnings
    }
}
