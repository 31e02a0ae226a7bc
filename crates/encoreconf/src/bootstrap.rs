//! Analysis and collaborator settings that seed the running service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which scoring backend the service starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// Seeded random scores.
    #[default]
    Mock,
    /// Deterministic byte statistics.
    Heuristic,
    /// Scripted scores for the configured skill level.
    Fixed,
}

impl AnalyzerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Heuristic => "heuristic",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyzerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "heuristic" => Ok(Self::Heuristic),
            "fixed" => Ok(Self::Fixed),
            other => Err(format!(
                "unknown analyzer {other:?} (expected mock, heuristic or fixed)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub analyzer: AnalyzerKind,

    /// Seed for the mock analyzer. Unset draws from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Skill level for the fixed analyzer.
    /// Default: intermediate
    #[serde(default = "AnalysisConfig::default_skill_level")]
    pub skill_level: String,

    /// Largest accepted upload, in megabytes.
    /// Default: 200
    #[serde(default = "AnalysisConfig::default_max_upload_mb")]
    pub max_upload_mb: u64,
}

impl AnalysisConfig {
    fn default_skill_level() -> String {
        "intermediate".to_string()
    }

    fn default_max_upload_mb() -> u64 {
        200
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerKind::default(),
            seed: None,
            skill_level: Self::default_skill_level(),
            max_upload_mb: Self::default_max_upload_mb(),
        }
    }
}

/// External collaborators. API keys come from the environment only and are
/// never read from or written to config files.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// OpenAI-compatible API root (without `/chat/completions`).
    /// Default: https://api.openai.com/v1
    #[serde(default = "ServicesConfig::default_llm_base_url")]
    pub llm_base_url: String,

    /// Default: gpt-3.5-turbo
    #[serde(default = "ServicesConfig::default_llm_model")]
    pub llm_model: String,

    /// TopMediaAI API root.
    /// Default: https://api.topmediai.com
    #[serde(default = "ServicesConfig::default_topmedia_base_url")]
    pub topmedia_base_url: String,

    #[serde(skip)]
    pub openai_api_key: Option<String>,

    #[serde(skip)]
    pub topmedia_api_key: Option<String>,
}

impl ServicesConfig {
    fn default_llm_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_llm_model() -> String {
        "gpt-3.5-turbo".to_string()
    }

    fn default_topmedia_base_url() -> String {
        "https://api.topmediai.com".to_string()
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            llm_base_url: Self::default_llm_base_url(),
            llm_model: Self::default_llm_model(),
            topmedia_base_url: Self::default_topmedia_base_url(),
            openai_api_key: None,
            topmedia_api_key: None,
        }
    }
}

// Keys stay out of debug output.
impl fmt::Debug for ServicesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicesConfig")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("topmedia_base_url", &self.topmedia_base_url)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field(
                "topmedia_api_key",
                &self.topmedia_api_key.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzer_kind_parses_case_insensitively() {
        assert_eq!("Heuristic".parse::<AnalyzerKind>(), Ok(AnalyzerKind::Heuristic));
        assert!("neural".parse::<AnalyzerKind>().is_err());
    }

    #[test]
    fn debug_output_hides_keys() {
        let services = ServicesConfig {
            openai_api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let debug = format!("{services:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn upload_limit_in_bytes() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.max_upload_bytes(), 200 * 1024 * 1024);
    }
}
