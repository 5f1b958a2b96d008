use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_VISIBLE_NOTIFICATIONS: usize = 3;
pub const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 6;

/// Overrides `[backend] base_url`.
pub const BACKEND_URL_ENV: &str = "WAYPOINT_BACKEND_URL";

#[derive(Debug, Default, Deserialize)]
pub struct WaypointConfig {
    pub app: Option<AppConfig>,
    pub backend: Option<BackendConfig>,
    pub notifications: Option<NotificationsConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for markers and borders.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Path opened at startup. The navigation guard redirects if it is not
    /// reachable yet.
    pub start_path: Option<String>,
}

/// Remote workflow service.
///
/// ```toml
/// [backend]
/// base_url = "${WAYPOINT_API}"
/// timeout_secs = 30
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationsConfig {
    /// Notifications shown at once. Default: 3.
    pub max_visible: Option<usize>,
    /// Seconds a notification stays on screen. Default: 6.
    pub ttl_secs: Option<u64>,
}

/// Backend settings after defaults, env overrides, and `${VAR}` expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl BackendSettings {
    #[must_use]
    pub fn resolve(config: Option<&WaypointConfig>) -> Self {
        let section = config.and_then(|cfg| cfg.backend.as_ref());
        let base_url = env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| section.and_then(|b| b.base_url.as_deref()).map(expand_env_vars))
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let timeout_secs = section
            .and_then(|b| b.timeout_secs)
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationSettings {
    pub max_visible: usize,
    pub ttl: Duration,
}

impl NotificationSettings {
    #[must_use]
    pub fn resolve(config: Option<&WaypointConfig>) -> Self {
        let section = config.and_then(|cfg| cfg.notifications.as_ref());
        Self {
            max_visible: section
                .and_then(|n| n.max_visible)
                .unwrap_or(DEFAULT_MAX_VISIBLE_NOTIFICATIONS),
            ttl: Duration::from_secs(
                section
                    .and_then(|n| n.ttl_secs)
                    .unwrap_or(DEFAULT_NOTIFICATION_TTL_SECS),
            ),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self::resolve(None)
    }
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl WaypointConfig {
    /// Load `~/.waypoint/config.toml`. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".waypoint").join("config.toml"))
}
