//! Config file discovery, loading, and environment variable overlay.

use crate::{AnalyzerKind, ConfigError, EncoreConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/encore/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("encore/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("encore.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read one config file as a raw table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

/// Parse a TOML document and check it against the config schema, so a bad
/// value is reported against the file it came from.
fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    table_to_config(table.clone(), path)?;
    Ok(table)
}

pub(crate) fn table_to_config(table: toml::Table, path: &Path) -> Result<EncoreConfig, ConfigError> {
    let mut config: EncoreConfig =
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
    config.infra.paths.upload_dir = expand_path(&config.infra.paths.upload_dir.to_string_lossy());
    Ok(config)
}

/// Merge `overlay` into `base` key by key. Nested tables merge recursively;
/// any other value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut EncoreConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from any key lookup. `apply_env_overrides` passes the
/// process environment; tests pass a map.
pub fn apply_overrides_from(
    config: &mut EncoreConfig,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let mut take = |key: &str| {
        let value = lookup(key);
        if value.is_some() {
            sources.env_overrides.push(key.to_string());
        }
        value
    };

    if let Some(v) = take("ENCORE_UPLOAD_DIR") {
        config.infra.paths.upload_dir = expand_path(&v);
    }

    if let Some(port) = take("ENCORE_HTTP_PORT").and_then(|v| v.parse().ok()) {
        config.infra.bind.http_port = port;
    }
    if let Some(v) = take("ENCORE_HOST") {
        config.infra.bind.host = v;
    }

    if let Some(v) = take("ENCORE_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    // Also support standard OTEL env var
    if let Some(v) = take("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = v;
    }
    if let Some(v) = take("ENCORE_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
    }
    if let Some(v) = take("RUST_LOG") {
        config.infra.telemetry.log_level = v;
    }

    if let Some(kind) = take("ENCORE_ANALYZER").and_then(|v| v.parse::<AnalyzerKind>().ok()) {
        config.analysis.analyzer = kind;
    }
    if let Some(seed) = take("ENCORE_SEED").and_then(|v| v.parse().ok()) {
        config.analysis.seed = Some(seed);
    }

    if let Some(v) = take("ENCORE_LLM_BASE_URL") {
        config.services.llm_base_url = v;
    }
    if let Some(v) = take("ENCORE_LLM_MODEL") {
        config.services.llm_model = v;
    }
    if let Some(v) = take("ENCORE_TOPMEDIA_BASE_URL") {
        config.services.topmedia_base_url = v;
    }
    if let Some(v) = take("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
        config.services.openai_api_key = Some(v);
    }
    if let Some(v) = take("TOPMEDIA_API_KEY").filter(|v| !v.is_empty()) {
        config.services.topmedia_api_key = Some(v);
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
