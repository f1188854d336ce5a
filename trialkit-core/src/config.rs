//! Configuration for trialkit.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> explicit file -> environment.

use crate::error::TrialkitError;
use crate::jobfile::Resources;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialkitConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// Where experiment artifacts live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding `log_<name>.pkl` files and checkpoints.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Defaults for generated batch scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_sbatch_dir")]
    pub sbatch_dir: PathBuf,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    #[serde(default = "default_nodes")]
    pub nodes: i64,
    #[serde(default = "default_ppn")]
    pub ppn: i64,
    #[serde(default)]
    pub gpus: i64,
    #[serde(default = "default_mem_gb")]
    pub mem_gb: i64,
    #[serde(default = "default_hours")]
    pub hours: i64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        let res = Resources::default();
        Self {
            sbatch_dir: default_sbatch_dir(),
            scratch_dir: default_scratch_dir(),
            nodes: res.nodes,
            ppn: res.ppn,
            gpus: res.gpus,
            mem_gb: res.mem_gb,
            hours: res.hours,
        }
    }
}

impl JobsConfig {
    pub fn resources(&self) -> Resources {
        Resources {
            nodes: self.nodes,
            ppn: self.ppn,
            gpus: self.gpus,
            mem_gb: self.mem_gb,
            hours: self.hours,
        }
    }
}

fn default_sbatch_dir() -> PathBuf {
    PathBuf::from("sbatch")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_nodes() -> i64 {
    Resources::default().nodes
}

fn default_ppn() -> i64 {
    Resources::default().ppn
}

fn default_mem_gb() -> i64 {
    Resources::default().mem_gb
}

fn default_hours() -> i64 {
    Resources::default().hours
}

/// Path of the per-user config file, if a home directory can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "trialkit", "trialkit")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`TRIALKIT_JOBS__SBATCH_DIR`, ...)
/// 2. `explicit` config file
/// 3. Workspace config (`<workspace>/.trialkit/config.toml`)
/// 4. User config (`~/.config/trialkit/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<TrialkitConfig, TrialkitError> {
    let mut figment = Figment::from(Serialized::defaults(TrialkitConfig::default()));

    if let Some(user_config) = user_config_path().filter(|p| p.exists()) {
        figment = figment.merge(Toml::file(user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".trialkit").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(TrialkitError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TRIALKIT_").split("__"));

    Ok(figment.extract()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TrialkitConfig::default();
        assert_eq!(config.store.data_dir, PathBuf::from("data"));
        assert_eq!(config.jobs.resources(), Resources::default());
        assert_eq!(config.jobs.sbatch_dir, PathBuf::from("sbatch"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: TrialkitConfig = toml_from_str("[jobs]\ngpus = 2\n");
        assert_eq!(parsed.jobs.gpus, 2);
        assert_eq!(parsed.jobs.mem_gb, 16);
        assert_eq!(parsed.store, StoreConfig::default());
    }

    #[test]
    fn test_workspace_config_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join(".trialkit");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[store]\ndata_dir = \"runs/data\"\n[jobs]\nhours = 48\n",
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.store.data_dir, PathBuf::from("runs/data"));
        assert_eq!(config.jobs.hours, 48);
        assert_eq!(config.jobs.nodes, 1);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(None, Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(TrialkitError::Config(_))));
    }

    fn toml_from_str(s: &str) -> TrialkitConfig {
        Figment::from(Serialized::defaults(TrialkitConfig::default()))
            .merge(Toml::string(s))
            .extract()
            .unwrap()
    }
}
