use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::config::io::ConfigError;
use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, MAX_TEMPERATURE, MIN_TEMPERATURE,
};

/// Keys accepted by `bankchat set` / `bankchat unset`.
pub const CONFIG_KEYS: [&str; 4] = ["model", "base-url", "temperature", "markdown"];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Gemini model identifier
    pub model: Option<String>,
    /// API root, without the `/models/...` suffix
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,
    /// Sampling temperature, clamped into the low-randomness range
    pub temperature: Option<f32>,
    /// Render the markdown subset in the chat area
    pub markdown: Option<bool>,
}

impl Config {
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_temperature(&self) -> f32 {
        let Some(requested) = self.temperature else {
            return DEFAULT_TEMPERATURE;
        };
        if !requested.is_finite() {
            warn!(%requested, "ignoring non-finite temperature");
            return DEFAULT_TEMPERATURE;
        }
        let clamped = clamp_temperature(requested);
        if clamped != requested {
            warn!(requested, clamped, "temperature outside allowed range");
        }
        clamped
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match key {
            "model" => {
                if value.is_empty() {
                    return Err(invalid("model must not be empty"));
                }
                self.model = Some(value.to_string());
            }
            "base-url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("expected an http:// or https:// URL"));
                }
                self.base_url = Some(value.to_string());
            }
            "temperature" => {
                let parsed: f32 = value.parse().map_err(|_| invalid("expected a number"))?;
                if !parsed.is_finite() {
                    return Err(invalid("expected a finite number"));
                }
                self.temperature = Some(clamp_temperature(parsed));
            }
            "markdown" => {
                let enabled = parse_toggle(value).ok_or_else(|| invalid("expected on or off"))?;
                self.markdown = Some(enabled);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "model" => self.model = None,
            "base-url" => self.base_url = None,
            "temperature" => self.temperature = None,
            "markdown" => self.markdown = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

pub fn clamp_temperature(value: f32) -> f32 {
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

fn parse_toggle(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
