use crate::error::Result;
use crate::io;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Settings for liveness derivation and the optional HTTP probe of the
/// external production engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A heartbeat older than this is treated as STOPPED.
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// Optional probe endpoint on the production engine. Probing is an
    /// optional dependency: a timeout degrades to "unknown", never a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_heartbeat_timeout_ms() -> u64 {
    60_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            probe_url: None,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Duration bounds for the detached manual-run task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_run_min_secs")]
    pub min_secs: u64,
    #[serde(default = "default_run_max_secs")]
    pub max_secs: u64,
    #[serde(default = "default_batch_size")]
    pub default_batch_size: u32,
}

fn default_run_min_secs() -> u64 {
    5
}

fn default_run_max_secs() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    5
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_secs: default_run_min_secs(),
            max_secs: default_run_max_secs(),
            default_batch_size: default_batch_size(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            engine: EngineConfig::default(),
            run: RunConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(crate::error::PressError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&path, data.as_bytes())
    }

    /// Sanity-check the configuration, returning structured warnings rather
    /// than failing the load.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.project.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "project name is empty".to_string(),
            });
        }
        if self.engine.heartbeat_timeout_ms < 1_000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "heartbeat_timeout_ms={} is below 1s; healthy workers will flap to STOPPED",
                    self.engine.heartbeat_timeout_ms
                ),
            });
        }
        if self.run.min_secs > self.run.max_secs {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "run.min_secs={} exceeds run.max_secs={}",
                    self.run.min_secs, self.run.max_secs
                ),
            });
        }
        if self.run.default_batch_size == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "run.default_batch_size must be at least 1".to_string(),
            });
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = Config::new("shop");
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "shop");
        assert_eq!(loaded.engine.heartbeat_timeout_ms, 60_000);
        assert_eq!(loaded.engine.probe_timeout_ms, 2_000);
        assert_eq!(loaded.run.default_batch_size, 5);
    }

    #[test]
    fn load_without_init_fails() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = serde_yaml::from_str("project: shop\n").unwrap();
        assert_eq!(config.engine.heartbeat_timeout_ms, 60_000);
        assert_eq!(config.run.min_secs, 5);
    }

    #[test]
    fn validate_flags_inverted_run_bounds() {
        let mut config = Config::new("shop");
        config.run.min_secs = 60;
        config.run.max_secs = 10;
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.level == WarnLevel::Error));
    }

    #[test]
    fn validate_clean_config_has_no_warnings() {
        let config = Config::new("shop");
        assert!(config.validate().is_empty());
    }
}
