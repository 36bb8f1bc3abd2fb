use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::api::Source;

const APP_SENTINEL: &str = "vcomments";

/// Read-only view of the settings the comment loader depends on.
pub trait SettingsSource {
    fn backend_preference(&self) -> Source;
    fn backend_fallback_enabled(&self) -> bool;

    fn snapshot(&self) -> ThreadSettings {
        ThreadSettings {
            preference: self.backend_preference(),
            fallback_enabled: self.backend_fallback_enabled(),
        }
    }
}

/// Settings captured when a comment thread is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadSettings {
    pub preference: Source,
    pub fallback_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    pub backend_preference: Source,

    pub backend_fallback: bool,

    /// Base URL of the proxy API instance.
    pub remote_instance: String,

    pub request_timeout_secs: u64,

    /// Local extractor program followed by any leading arguments.
    pub extractor: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            backend_preference: Source::Local,
            backend_fallback: true,
            remote_instance: "https://yewtu.be".to_string(),
            request_timeout_secs: 10,
            extractor: vec!["yt-comments".to_string()],
        }
    }
}

impl SettingsSource for Settings {
    fn backend_preference(&self) -> Source {
        self.backend_preference
    }

    fn backend_fallback_enabled(&self) -> bool {
        self.backend_fallback
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize settings")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        if self.extractor.first().is_none_or(|p| p.trim().is_empty()) {
            bail!("extractor must name a program");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("vcomments")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("vcomments.log")
}
