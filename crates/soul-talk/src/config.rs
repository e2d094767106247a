//! Application configuration.
//!
//! Defaults come from environment variables and may be overlaid by a TOML
//! file passed with `--config`. Missing API keys are not an error here: the
//! classifier falls back and the verifier reports itself unavailable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use talk_core::SessionConfig;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "scribe_v1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Gemini classifier endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub url: String,
}

/// ElevenLabs speech-to-text endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevenLabsSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub url: String,
}

/// Top-level host configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub gemini: GeminiSettings,
    pub elevenlabs: ElevenLabsSettings,
    pub session: SessionConfig,
    pub http_timeout: Duration,
    /// Where matched chats are saved as history (None = not saved).
    pub history_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Partial config as written in a TOML file; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    http_timeout_secs: Option<u64>,
    history_dir: Option<PathBuf>,
    #[serde(default)]
    session: FileSession,
    #[serde(default)]
    gemini: FileEndpoint,
    #[serde(default)]
    elevenlabs: FileEndpoint,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSession {
    active_duration_secs: Option<u32>,
    pre_match_reveal_interval: Option<u32>,
    post_match_reveal_interval: Option<u32>,
    reminder_fraction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileEndpoint {
    api_key: Option<String>,
    model: Option<String>,
    url: Option<String>,
}

impl AppConfig {
    /// Build from an environment lookup. `std::env::var` in production,
    /// a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut session = SessionConfig::default();
        if let Some(secs) = non_empty("SOUL_TALK_SESSION_SECS").and_then(|v| v.parse().ok()) {
            session.active_duration_secs = secs;
        }
        let http_timeout_secs = non_empty("SOUL_TALK_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            gemini: GeminiSettings {
                api_key: non_empty("GEMINI_API_KEY"),
                model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                url: non_empty("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.into()),
            },
            elevenlabs: ElevenLabsSettings {
                api_key: non_empty("ELEVENLABS_API_KEY"),
                model: non_empty("ELEVENLABS_MODEL")
                    .unwrap_or_else(|| DEFAULT_ELEVENLABS_MODEL.into()),
                url: non_empty("ELEVENLABS_URL").unwrap_or_else(|| DEFAULT_ELEVENLABS_URL.into()),
            },
            session,
            http_timeout: Duration::from_secs(http_timeout_secs),
            history_dir: non_empty("SOUL_TALK_HISTORY_DIR").map(PathBuf::from),
        }
    }

    /// Environment defaults, then the TOML file at `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            config
                .apply_toml_str(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
        }
        config
            .session
            .validate()
            .context("Invalid session settings")?;
        Ok(config)
    }

    /// Overlay values from a TOML document onto this config.
    pub fn apply_toml_str(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(raw).context("Failed to parse TOML")?;

        if let Some(secs) = file.http_timeout_secs {
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = file.history_dir {
            self.history_dir = Some(dir);
        }

        let s = file.session;
        if let Some(v) = s.active_duration_secs {
            self.session.active_duration_secs = v;
        }
        if let Some(v) = s.pre_match_reveal_interval {
            self.session.pre_match_reveal_interval = v;
        }
        if let Some(v) = s.post_match_reveal_interval {
            self.session.post_match_reveal_interval = v;
        }
        if let Some(v) = s.reminder_fraction {
            self.session.reminder_fraction = v;
        }

        overlay(
            &mut self.gemini.api_key,
            &mut self.gemini.model,
            &mut self.gemini.url,
            file.gemini,
        );
        overlay(
            &mut self.elevenlabs.api_key,
            &mut self.elevenlabs.model,
            &mut self.elevenlabs.url,
            file.elevenlabs,
        );
        Ok(())
    }
}

fn overlay(api_key: &mut Option<String>, model: &mut String, url: &mut String, file: FileEndpoint) {
    if let Some(v) = file.api_key {
        *api_key = Some(v);
    }
    if let Some(v) = file.model {
        *model = v;
    }
    if let Some(v) = file.url {
        *url = v;
    }
}
