use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::constants::{bounds, config, validation};
use crate::types::{AttachmentOptions, MarginPercent};

/// Settings persisted to `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Exact title of the window to attach to
    pub target_title: String,

    /// trace | debug | info | warn | error
    pub log_level: String,

    pub has_title_bar_on_mac: bool,

    /// Host manages click-through itself
    pub self_handle_clickable: bool,

    pub moveresize_throttle_ms: u64,

    pub margin_percent: MarginPercent,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_title: "Untitled".to_string(),
            log_level: config::DEFAULT_LOG_LEVEL.to_string(),
            has_title_bar_on_mac: false,
            self_handle_clickable: false,
            moveresize_throttle_ms: bounds::MOVERESIZE_THROTTLE_MS,
            margin_percent: MarginPercent::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load `path`, or generate and save defaults if it does not exist.
    ///
    /// A file that fails to parse is an error and is left untouched.
    /// Environment overrides and clamping are applied in both cases.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = match fs::read_to_string(path) {
            Ok(contents) => toml::from_str::<Settings>(&contents)
                .inspect_err(|e| {
                    error!(path = %path.display(), error = %e, "Failed to parse config file");
                    error!(path = %path.display(), "The file has been preserved, fix the syntax and restart");
                })
                .context(format!("Failed to parse config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file found, generating default");
                let defaults = Settings::default();
                if let Err(e) = defaults.save_to(path) {
                    error!(error = ?e, "Failed to save config");
                } else {
                    info!(path = %path.display(), "Generated config file for user to edit (env vars still override)");
                }
                defaults
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read config file {}", path.display()));
            }
        };

        settings.apply_env_overrides();
        settings.validate_and_clamp();
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, contents)
            .context(format!("Failed to write config file to {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the process environment in production)
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(title) = lookup("OVERLAY_TARGET_TITLE") {
            self.target_title = title;
        }
        if let Some(flag) = parse_var::<bool>(&lookup, "OVERLAY_SELF_HANDLE_CLICKABLE") {
            self.self_handle_clickable = flag;
        }
        if let Some(top) = parse_var(&lookup, "OVERLAY_MARGIN_TOP") {
            self.margin_percent.top = top;
        }
        if let Some(bottom) = parse_var(&lookup, "OVERLAY_MARGIN_BOTTOM") {
            self.margin_percent.bottom = bottom;
        }
        if let Some(left) = parse_var(&lookup, "OVERLAY_MARGIN_LEFT") {
            self.margin_percent.left = left;
        }
        if let Some(right) = parse_var(&lookup, "OVERLAY_MARGIN_RIGHT") {
            self.margin_percent.right = right;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Clamp values into safe ranges, warning about each correction
    fn validate_and_clamp(&mut self) {
        let clamped = self.margin_percent.clamped();
        if clamped != self.margin_percent {
            warn!(
                margins = ?self.margin_percent,
                max = validation::MAX_MARGIN_PERCENT,
                "margin_percent out of range, clamping"
            );
            self.margin_percent = clamped;
        }

        if self.moveresize_throttle_ms < validation::MIN_THROTTLE_MS {
            warn!(moveresize_throttle_ms = self.moveresize_throttle_ms, min = validation::MIN_THROTTLE_MS, "moveresize_throttle_ms below minimum, clamping");
            self.moveresize_throttle_ms = validation::MIN_THROTTLE_MS;
        } else if self.moveresize_throttle_ms > validation::MAX_THROTTLE_MS {
            warn!(moveresize_throttle_ms = self.moveresize_throttle_ms, max = validation::MAX_THROTTLE_MS, "moveresize_throttle_ms exceeds maximum, clamping");
            self.moveresize_throttle_ms = validation::MAX_THROTTLE_MS;
        }

        if self.target_title.is_empty() {
            warn!("target_title is empty, no window will ever match");
        }
    }

    pub fn attachment_options(&self) -> AttachmentOptions {
        AttachmentOptions {
            has_title_bar_on_mac: self.has_title_bar_on_mac,
            margin_percent: self.margin_percent,
            self_handle_clickable: self.self_handle_clickable,
        }
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.moveresize_throttle_ms)
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T>
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    let raw = lookup(var)?;
    raw.trim()
        .parse::<T>()
        .inspect_err(|e| error!(var = %var, error = ?e, "failed to parse env var"))
        .ok()
}
