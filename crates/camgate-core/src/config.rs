//! Configuration resolution for camgate.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/camgate/settings.json)
//! 3. Project config (.camgate/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::capability::Capability;
use crate::error::{Error, Result};

/// Complete camgate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Capability gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Capability the native session requires.
    pub capability: Capability,
    /// Camera device node checked by the system host.
    pub camera_device: PathBuf,
    /// Deny instead of prompting when consent is needed.
    pub non_interactive: bool,
    /// Where granted consent is remembered between runs (not remembered when unset).
    pub consent_file: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            capability: Capability::camera(),
            camera_device: PathBuf::from("/dev/video0"),
            non_interactive: false,
            consent_file: consent_store_path(),
        }
    }
}

/// Native session launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Native session executable.
    pub binary: PathBuf,
    /// Extra arguments passed to the session.
    pub args: Vec<String>,
    /// Working directory for the session (inherits ours when unset).
    pub working_directory: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("camgate-session"),
            args: Vec::new(),
            working_directory: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    load_layers(global_config_path().as_deref(), project_dir, |key| {
        std::env::var(key).ok()
    })
}

/// Resolve configuration from explicit layers.
///
/// `env` looks up environment overrides by variable name.
pub fn load_layers(
    global_path: Option<&Path>,
    project_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let project_path = project_dir.map(|dir| dir.join(".camgate").join("settings.json"));
    let mut merged = Value::Object(Map::new());

    for path in [global_path, project_path.as_deref()].into_iter().flatten() {
        if path.exists() {
            merge_json(&mut merged, load_config_file(path)?);
        }
    }

    let mut config: Config = serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;
    apply_env_overrides(&mut config, env)?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|h| PathBuf::from(h).join(".camgate").join("settings.json"))
    }
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join("Library/Application Support/camgate/settings.json"))
    }
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .map(|p| p.join("camgate").join("settings.json"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Get the consent file path, next to the global config file.
pub fn consent_store_path() -> Option<PathBuf> {
    global_config_path().map(|p| p.with_file_name("consent.json"))
}

fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(value)
}

/// Later layers win key by key; nested objects are merged, everything else replaced.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_json(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = env("CAMGATE_CAPABILITY") {
        config.gate.capability = val.parse()?;
    }
    if let Some(val) = env("CAMGATE_CAMERA_DEVICE") {
        config.gate.camera_device = PathBuf::from(val);
    }
    if let Some(val) = env("CAMGATE_NON_INTERACTIVE") {
        config.gate.non_interactive = parse_flag(&val);
    }
    if let Some(val) = env("CAMGATE_CONSENT_FILE") {
        config.gate.consent_file = Some(PathBuf::from(val));
    }
    if let Some(val) = env("CAMGATE_SESSION_BIN") {
        config.session.binary = PathBuf::from(val);
    }
    if let Some(val) = env("CAMGATE_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = env("CAMGATE_LOG_JSON") {
        config.logging.json = parse_flag(&val);
    }
    Ok(())
}

fn parse_flag(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
