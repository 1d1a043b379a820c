//! Shell configuration loading
//!
//! Settings come from `~/.config/scm-cli/config.toml` (or `SCM_CLI_CONFIG`).
//! API credentials come from the environment, which the binary seeds from a
//! `.env` file before calling [`ScmCredentials::from_env`].

use crate::errors::{Result, ScmError};
use crate::history_db::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

const APP_DIR: &str = "scm-cli";

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".config").join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_history_db_path() -> String {
    app_dir().join("history.db").to_string_lossy().into_owned()
}

fn default_log_dir() -> String {
    app_dir().join("logs").to_string_lossy().into_owned()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_known_folders() -> Vec<String> {
    vec!["Shared".to_string()]
}

fn default_color() -> bool {
    true
}

/// Local shell settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShellSettings {
    /// Path to the history SQLite database
    #[serde(default = "default_history_db_path")]
    pub history_db_path: String,

    /// Default entries per `history` page
    #[serde(default = "default_page_size")]
    pub history_page_size: u32,

    /// Directory for the rolling log file
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Folder names offered by completion before any are visited
    #[serde(default = "default_known_folders")]
    pub known_folders: Vec<String>,

    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            history_db_path: default_history_db_path(),
            history_page_size: default_page_size(),
            log_dir: default_log_dir(),
            known_folders: default_known_folders(),
            color: default_color(),
        }
    }
}

impl ShellSettings {
    /// Environment variable that overrides the settings path
    pub const ENV_CONFIG_PATH: &'static str = "SCM_CLI_CONFIG";

    pub const DEFAULT_CONFIG_FILENAME: &'static str = "config.toml";

    /// Load settings.
    ///
    /// Resolution order:
    /// 1. `SCM_CLI_CONFIG` environment variable
    /// 2. `~/.config/scm-cli/config.toml`
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ScmError::config_with_source(
                format!("failed to read settings at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let settings: ShellSettings = toml::from_str(contents)
            .map_err(|e| ScmError::config_with_source("failed to parse settings", e))?;

        settings.validate()?;
        Ok(settings)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }
        app_dir().join(Self::DEFAULT_CONFIG_FILENAME)
    }

    fn validate(&self) -> Result<()> {
        if self.history_page_size == 0 {
            return Err(ScmError::config("history_page_size must be at least 1"));
        }
        if self.history_page_size > 1000 {
            tracing::warn!(
                page_size = self.history_page_size,
                "very large history page size"
            );
        }
        Ok(())
    }

    pub fn resolved_history_db_path(&self) -> PathBuf {
        expand_home(&self.history_db_path)
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        expand_home(&self.log_dir)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

// ─────────────────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "https://api.strata.paloaltonetworks.com";
pub const DEFAULT_TOKEN_URL: &str = "https://auth.apps.paloaltonetworks.com/oauth2/access_token";

/// OAuth2 client credentials and endpoints for the management API.
#[derive(Clone, PartialEq, Eq)]
pub struct ScmCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tsg_id: String,
    pub base_url: String,
    pub token_url: String,
    pub verify_ssl: bool,
}

impl fmt::Debug for ScmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScmCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tsg_id", &self.tsg_id)
            .field("base_url", &self.base_url)
            .field("token_url", &self.token_url)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl ScmCredentials {
    pub const ENV_CLIENT_ID: &'static str = "SCM_CLIENT_ID";
    pub const ENV_CLIENT_SECRET: &'static str = "SCM_CLIENT_SECRET";
    pub const ENV_TSG_ID: &'static str = "SCM_TSG_ID";
    pub const ENV_BASE_URL: &'static str = "SCM_BASE_URL";
    pub const ENV_TOKEN_URL: &'static str = "SCM_TOKEN_URL";
    pub const ENV_VERIFY_SSL: &'static str = "SCM_VERIFY_SSL";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; all three required values must be present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&str> = [Self::ENV_CLIENT_ID, Self::ENV_CLIENT_SECRET, Self::ENV_TSG_ID]
            .into_iter()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ScmError::config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let verify_ssl = match get(Self::ENV_VERIFY_SSL) {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ScmError::config(format!(
                    "{} must be true or false, got '{raw}'",
                    Self::ENV_VERIFY_SSL
                ))
            })?,
        };

        Ok(Self {
            client_id: get(Self::ENV_CLIENT_ID).unwrap_or_default(),
            client_secret: get(Self::ENV_CLIENT_SECRET).unwrap_or_default(),
            tsg_id: get(Self::ENV_TSG_ID).unwrap_or_default(),
            base_url: get(Self::ENV_BASE_URL)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            token_url: get(Self::ENV_TOKEN_URL).unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            verify_ssl,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
