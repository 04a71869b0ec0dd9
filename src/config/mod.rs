//! Configuration system (layered: defaults < TOML file < env).

pub mod locale;

pub use locale::Locale;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::WidgetError;
use crate::store::DEFAULT_CONTEXT_WINDOW;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<WidgetConfig> = OnceLock::new();

pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:8787/api/chat";
pub const DEFAULT_STORAGE_PREFIX: &str = "embedchat_conversation_";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Runtime configuration for a widget instance.
///
/// ```
/// use std::time::Duration;
/// use embedchat::config::{Locale, WidgetConfig};
///
/// let config = WidgetConfig::builder()
///     .chat_url("https://example.test/chat")
///     .request_timeout(Duration::from_secs(10))
///     .locale(Locale::Es)
///     .build();
/// assert_eq!(config.context_window, 10);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct WidgetConfig {
    /// Chat endpoint receiving `{agent_id, message, conversation_id, conversation_history}`.
    #[builder(into, default = DEFAULT_CHAT_URL.to_string())]
    pub chat_url: String,
    /// Persistence endpoint for auto-save. `None` keeps snapshots local only.
    #[builder(into)]
    pub save_url: Option<String>,
    /// Bearer key for hosted-function gateways.
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
    #[builder(default = DEFAULT_CONTEXT_WINDOW)]
    pub context_window: usize,
    #[builder(default = DEFAULT_AUTOSAVE_INTERVAL)]
    pub autosave_interval: Duration,
    #[builder(default = DEFAULT_RETRY_BACKOFF)]
    pub retry_backoff: Duration,
    #[builder(default)]
    pub locale: Locale,
    /// Directory for file-backed snapshots. `None` uses `~/.embedchat/sessions`.
    pub storage_dir: Option<PathBuf>,
    #[builder(into, default = DEFAULT_STORAGE_PREFIX.to_string())]
    pub storage_prefix: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// On-disk shape of the TOML config. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    chat_url: Option<String>,
    save_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    context_window: Option<usize>,
    autosave_secs: Option<u64>,
    retry_secs: Option<u64>,
    locale: Option<Locale>,
    storage_dir: Option<PathBuf>,
    storage_prefix: Option<String>,
}

impl WidgetConfig {
    /// Defaults, then the optional TOML file, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, WidgetError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file layered over the defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, WidgetError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WidgetError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, WidgetError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| WidgetError::Configuration(e.to_string()))?;
        let mut config = Self::default();
        if let Some(v) = file.chat_url {
            config.chat_url = v;
        }
        if file.save_url.is_some() {
            config.save_url = file.save_url;
        }
        if file.api_key.is_some() {
            config.api_key = file.api_key;
        }
        if let Some(v) = file.timeout_secs {
            config.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.context_window {
            config.context_window = v;
        }
        if let Some(v) = file.autosave_secs {
            config.autosave_interval = Duration::from_secs(v);
        }
        if let Some(v) = file.retry_secs {
            config.retry_backoff = Duration::from_secs(v);
        }
        if let Some(v) = file.locale {
            config.locale = v;
        }
        if file.storage_dir.is_some() {
            config.storage_dir = file.storage_dir;
        }
        if let Some(v) = file.storage_prefix {
            config.storage_prefix = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables (`EMBEDCHAT_*`), honoring a `.env` file.
    pub fn from_env() -> Result<Self, WidgetError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Get (or create) the global default config.
    ///
    /// Falls back to built-in defaults if the environment is invalid.
    pub fn global() -> &'static WidgetConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring invalid environment configuration");
                Self::default()
            })
        })
    }

    fn apply_env(&mut self) -> Result<(), WidgetError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        if let Ok(v) = std::env::var("EMBEDCHAT_CHAT_URL") {
            self.chat_url = v;
        }
        if let Ok(v) = std::env::var("EMBEDCHAT_SAVE_URL") {
            self.save_url = Some(v);
        }
        if let Ok(v) = std::env::var("EMBEDCHAT_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = env_number("EMBEDCHAT_TIMEOUT_SECS")? {
            self.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = env_number("EMBEDCHAT_CONTEXT_WINDOW")? {
            self.context_window = v as usize;
        }
        if let Some(v) = env_number("EMBEDCHAT_AUTOSAVE_SECS")? {
            self.autosave_interval = Duration::from_secs(v);
        }
        if let Some(v) = env_number("EMBEDCHAT_RETRY_SECS")? {
            self.retry_backoff = Duration::from_secs(v);
        }
        if let Ok(v) = std::env::var("EMBEDCHAT_LOCALE") {
            self.locale = v.parse().map_err(|_| {
                WidgetError::Configuration(format!("unsupported locale: {v}"))
            })?;
        }
        if let Ok(v) = std::env::var("EMBEDCHAT_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(v));
        }
        self.validate()
    }

    /// Reject values that would break the session invariants.
    pub fn validate(&self) -> Result<(), WidgetError> {
        if self.chat_url.trim().is_empty() {
            return Err(WidgetError::Configuration("chat_url cannot be empty".into()));
        }
        if self.context_window == 0 {
            return Err(WidgetError::Configuration(
                "context_window must be at least 1".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(WidgetError::Configuration(
                "request_timeout must be positive".into(),
            ));
        }
        if self.autosave_interval.is_zero() {
            return Err(WidgetError::Configuration(
                "autosave_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Directory for file-backed snapshots.
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(default_storage_dir)
    }
}

fn env_number(var: &str) -> Result<Option<u64>, WidgetError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| WidgetError::Configuration(format!("{var} must be a number, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

fn default_storage_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".embedchat").join("sessions"))
        .unwrap_or_else(|| PathBuf::from(".embedchat/sessions"))
}
