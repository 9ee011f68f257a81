//! Layered configuration.
//!
//! Built-in defaults, then `~/.livepad/config.json` (or `--config`), then
//! environment overrides. CLI flags are applied last by the commands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::orchestrator::{SessionConfig, PROTOCOL_INSTRUCTIONS};
use crate::vfs::OperationPolicy;

/// Directory under the home directory holding the config file.
pub const CONFIG_DIR: &str = ".livepad";
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the API key. The key is never read from the
/// config file.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub debounce_ms: u64,
    pub model: String,
    pub max_tokens: u32,
    pub api_url: String,
    pub command_timeout_secs: u64,
    pub apply_suggested_code: bool,
    pub policy: OperationPolicy,
    /// Replaces the built-in protocol instructions.
    pub system_prompt_path: Option<PathBuf>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            model: "claude-3-sonnet-20240229".to_string(),
            max_tokens: 4096,
            api_url: "https://api.anthropic.com/".to_string(),
            command_timeout_secs: 60,
            apply_suggested_code: false,
            policy: OperationPolicy::default(),
            system_prompt_path: None,
            api_key: None,
        }
    }
}

/// `~/.livepad/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(CONFIG_DIR)
        .join(CONFIG_FILE))
}

impl Config {
    /// Load defaults, the config file and the process environment.
    ///
    /// A missing default config file is fine; a missing explicit one is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = default_config_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!("No config file at {:?}, using defaults", path);
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("LIVEPAD_DEBOUNCE_MS") {
            self.debounce_ms = parse_number("LIVEPAD_DEBOUNCE_MS", &value)?;
        }
        if let Some(value) = get("LIVEPAD_MODEL") {
            self.model = value;
        }
        if let Some(value) = get("LIVEPAD_MAX_TOKENS") {
            self.max_tokens = parse_number("LIVEPAD_MAX_TOKENS", &value)?;
        }
        if let Some(value) = get("LIVEPAD_API_URL") {
            self.api_url = value;
        }
        if let Some(value) = get("LIVEPAD_COMMAND_TIMEOUT_SECS") {
            self.command_timeout_secs = parse_number("LIVEPAD_COMMAND_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get(API_KEY_ENV) {
            self.api_key = Some(value);
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// The API key, or an error telling the user where to set it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .with_context(|| format!("No API key configured. Set {} to use the assistant.", API_KEY_ENV))
    }

    /// Protocol instructions: the configured prompt file, or the built-in one.
    pub fn instructions(&self) -> Result<String> {
        match &self.system_prompt_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read system prompt: {:?}", path)),
            None => Ok(PROTOCOL_INSTRUCTIONS.to_string()),
        }
    }

    /// Session settings for the project at `root`.
    pub fn session_config(&self, project_name: &str, root: &Path) -> Result<SessionConfig> {
        let mut session = SessionConfig::new(project_name, root);
        session.debounce = self.debounce();
        session.policy = self.policy.clone();
        session.apply_suggested_code = self.apply_suggested_code;
        session.instructions = self.instructions()?;
        Ok(session)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", key, value))
}
