//! Layered configuration loading for Encore.
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): paths, bind address, telemetry.
//!   Fixed for the life of the process.
//!
//! - **Bootstrap** (`AnalysisConfig`, `ServicesConfig`): which analyzer to
//!   start with and where the external collaborators live.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/encore/config.toml` (system)
//! 2. `~/.config/encore/config.toml` (user)
//! 3. `./encore.toml` (local override, or the `--config` path)
//! 4. Environment variables (`ENCORE_*`, plus `OPENAI_API_KEY` and
//!    `TOPMEDIA_API_KEY`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! upload_dir = "~/.local/share/encore/uploads"
//!
//! [bind]
//! http_port = 5000
//! host = "0.0.0.0"
//!
//! [telemetry]
//! otlp_endpoint = "127.0.0.1:4317"
//! log_level = "info"
//!
//! [analysis]
//! analyzer = "mock"
//! seed = 42
//! max_upload_mb = 200
//!
//! [services]
//! llm_base_url = "https://api.openai.com/v1"
//! llm_model = "gpt-3.5-turbo"
//! topmedia_base_url = "https://api.topmediai.com"
//! ```

pub mod bootstrap;
pub mod infra;
pub mod loader;

pub use bootstrap::{AnalysisConfig, AnalyzerKind, ServicesConfig};
pub use infra::{BindConfig, InfraConfig, PathsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete Encore configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoreConfig {
    #[serde(flatten)]
    pub infra: InfraConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub services: ServicesConfig,
}

impl EncoreConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` standing in for `./encore.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables contributed.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let mut config = loader::table_to_config(merged, Path::new("<merged config>"))?;
        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Render the effective config as TOML. API keys are never written.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# Encore Configuration\n\n");

        output.push_str("[paths]\n");
        output.push_str(&format!(
            "upload_dir = {:?}\n",
            self.infra.paths.upload_dir.display().to_string()
        ));

        output.push_str("\n[bind]\n");
        output.push_str(&format!("http_port = {}\n", self.infra.bind.http_port));
        output.push_str(&format!("host = {:?}\n", self.infra.bind.host));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "otlp_endpoint = {:?}\n",
            self.infra.telemetry.otlp_endpoint
        ));
        output.push_str(&format!("log_level = {:?}\n", self.infra.telemetry.log_level));

        output.push_str("\n[analysis]\n");
        output.push_str(&format!("analyzer = \"{}\"\n", self.analysis.analyzer));
        if let Some(seed) = self.analysis.seed {
            output.push_str(&format!("seed = {seed}\n"));
        }
        output.push_str(&format!("skill_level = {:?}\n", self.analysis.skill_level));
        output.push_str(&format!("max_upload_mb = {}\n", self.analysis.max_upload_mb));

        output.push_str("\n[services]\n");
        output.push_str(&format!("llm_base_url = {:?}\n", self.services.llm_base_url));
        output.push_str(&format!("llm_model = {:?}\n", self.services.llm_model));
        output.push_str(&format!(
            "topmedia_base_url = {:?}\n",
            self.services.topmedia_base_url
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EncoreConfig::default();
        assert_eq!(config.infra.bind.http_port, 5000);
        assert_eq!(config.analysis.analyzer, AnalyzerKind::Mock);
        assert!(!config.infra.telemetry.otlp_enabled());
    }

    #[test]
    fn test_to_toml_reparses_to_same_config() {
        let mut config = EncoreConfig::default();
        config.analysis.seed = Some(1234);
        config.infra.bind.host = "127.0.0.1".to_string();

        let rendered = config.to_toml();
        assert!(rendered.contains("[analysis]"));
        assert!(rendered.contains("seed = 1234"));

        let table: toml::Table = rendered.parse().unwrap();
        let reparsed = loader::table_to_config(table, Path::new("rendered")).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_to_toml_never_writes_keys() {
        let mut config = EncoreConfig::default();
        config.services.openai_api_key = Some("sk-secret".to_string());
        assert!(!config.to_toml().contains("sk-secret"));
    }

    #[test]
    fn test_cli_path_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[bind]\nhttp_port = 5999\n\n[analysis]\nanalyzer = \"heuristic\""
        )
        .unwrap();

        let (config, sources) = EncoreConfig::load_with_sources_from(Some(file.path())).unwrap();
        assert!(sources.files.contains(&file.path().to_path_buf()));
        assert_eq!(config.analysis.analyzer, AnalyzerKind::Heuristic);
    }

    #[test]
    fn test_unreadable_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bind\nhttp_port = ").unwrap();

        let err = EncoreConfig::load_from(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
