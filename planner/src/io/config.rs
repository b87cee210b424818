//! Planner configuration (`planner.toml`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Planner configuration (TOML).
///
/// Every table is optional; missing fields fall back to the defaults below so a
/// deployment can run with no config file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    pub llm: LlmConfig,
    pub store: StoreConfig,
}

/// Settings for the OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    /// Sampling temperature, `0.0..=2.0`.
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the `sqlite` backend.
    pub path: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            timeout_secs: 30,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: PathBuf::from("planner.db"),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.llm.base_url.trim().is_empty() {
            return Err(anyhow!("llm.base_url must not be empty"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!(
                "llm.temperature must be within 0.0..=2.0 (got {})",
                self.llm.temperature
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(anyhow!("llm.timeout_secs must be > 0"));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(anyhow!("llm.api_key_env must not be empty"));
        }
        if self.store.backend == StoreBackend::Sqlite && self.store.path.as_os_str().is_empty() {
            return Err(anyhow!("store.path must be set for the sqlite backend"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PlannerConfig::default()`.
pub fn load_config(path: &Path) -> Result<PlannerConfig> {
    if !path.exists() {
        let cfg = PlannerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PlannerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PlannerConfig::default());
    }

    #[test]
    fn loads_store_table() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("planner.toml");
        fs::write(
            &path,
            "[llm]\nmodel = \"llama-3.1-8b-instant\"\n\n[store]\nbackend = \"memory\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.llm.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.path, StoreConfig::default().path);
    }

    #[test]
    fn unknown_store_backend_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("planner.toml");
        fs::write(&path, "[store]\nbackend = \"mongo\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn sqlite_backend_needs_a_path() {
        let mut cfg = PlannerConfig::default();
        cfg.store.path = PathBuf::new();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("store.path"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("planner.toml");
        fs::write(&path, "[llm]\ntemperature = 0.2\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.llm.temperature, 0.2);
        assert_eq!(cfg.llm.model, LlmConfig::default().model);
        assert_eq!(cfg.store, StoreConfig::default());
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let mut cfg = PlannerConfig::default();
        cfg.llm.temperature = 3.5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("llm.temperature"));
    }

    #[test]
    fn rejects_zero_timeout_and_empty_model() {
        let mut cfg = PlannerConfig::default();
        cfg.llm.timeout_secs = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = PlannerConfig::default();
        cfg.llm.model = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_api_key_reads_as_missing() {
        let cfg = LlmConfig {
            api_key_env: "PLANNER_TEST_SURELY_UNSET_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(cfg.api_key(), None);
    }
}
