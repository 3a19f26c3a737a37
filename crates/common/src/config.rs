//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{KaroError, KaroResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where template definitions are looked up.
    pub templates_dir: PathBuf,

    /// Preview playback defaults.
    pub preview: PreviewDefaults,

    /// Remote render service settings.
    pub render_service: RenderServiceConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Preview and resolution defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewDefaults {
    /// Whether preview playback loops at the end of the composition.
    pub loop_playback: bool,

    /// Shortest animation duration honored (seconds).
    pub min_animation_secs: f64,

    /// Longest animation duration honored (seconds).
    pub max_animation_secs: f64,

    /// Upper bound for a caller-chosen duration outside the presets (seconds).
    pub max_duration_secs: f64,
}

/// Render service (external collaborator) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderServiceConfig {
    /// Base URL of the render API, e.g. `http://localhost:8000/api/v1`.
    pub base_url: String,

    /// Interval between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Optional bearer token sent with each request.
    pub api_token: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "karo=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            templates_dir: dirs_default_templates(),
            preview: PreviewDefaults::default(),
            render_service: RenderServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PreviewDefaults {
    fn default() -> Self {
        Self {
            loop_playback: true,
            min_animation_secs: 0.05,
            max_animation_secs: 2.0,
            max_duration_secs: 180.0,
        }
    }
}

impl Default for RenderServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            poll_interval_ms: 1500,
            request_timeout_secs: 30,
            api_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl RenderServiceConfig {
    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Load and validate config from `path`.
    pub fn load_from(path: &Path) -> KaroResult<Self> {
        if !path.exists() {
            return Err(KaroError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> KaroResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> KaroResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the preview and render client cannot work with.
    pub fn validate(&self) -> KaroResult<()> {
        let preview = &self.preview;
        if !(preview.min_animation_secs.is_finite() && preview.min_animation_secs > 0.0) {
            return Err(KaroError::config("preview.min_animation_secs must be > 0"));
        }
        if !(preview.max_animation_secs.is_finite()
            && preview.max_animation_secs >= preview.min_animation_secs)
        {
            return Err(KaroError::config(
                "preview.max_animation_secs must be >= preview.min_animation_secs",
            ));
        }
        if !(preview.max_duration_secs.is_finite() && preview.max_duration_secs > 0.0) {
            return Err(KaroError::config("preview.max_duration_secs must be > 0"));
        }
        if self.render_service.base_url.trim().is_empty() {
            return Err(KaroError::config("render_service.base_url must not be empty"));
        }
        if self.render_service.poll_interval_ms == 0 {
            return Err(KaroError::config("render_service.poll_interval_ms must be > 0"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("karo").join("config.json")
}

/// Default templates directory.
fn dirs_default_templates() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("karo").join("templates")
}
