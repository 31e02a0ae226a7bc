//! Encore: grades recorded music performances over HTTP.
//!
//! The grading rules live in `encore-grade` and the scoring backends in
//! `encore-analysis`. This crate wires them to configuration, external
//! collaborators and the axum router.

pub mod services;
pub mod sessions;
pub mod store;
pub mod telemetry;
pub mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use encore_analysis::{
    Analyzer, FixedAnalyzer, HeuristicAnalyzer, MockAnalyzer, PerformanceEngine, SkillLevel,
};
use encoreconf::{AnalysisConfig, AnalyzerKind, EncoreConfig, ServicesConfig};
use tracing::info;

use services::{
    MockSongGenerator, OpenAiSummary, PracticeSongGenerator, StaticSummary, SummaryGenerator,
    TopMediaClient,
};
use web::AppState;

/// The analyzer named by the config.
pub fn analyzer_from_config(analysis: &AnalysisConfig) -> Result<Arc<dyn Analyzer>> {
    let analyzer: Arc<dyn Analyzer> = match analysis.analyzer {
        AnalyzerKind::Mock => match analysis.seed {
            Some(seed) => Arc::new(MockAnalyzer::seeded(seed)),
            None => Arc::new(MockAnalyzer::new()),
        },
        AnalyzerKind::Heuristic => Arc::new(HeuristicAnalyzer),
        AnalyzerKind::Fixed => {
            let level: SkillLevel = analysis
                .skill_level
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid analysis.skill_level")?;
            Arc::new(FixedAnalyzer::for_skill(level))
        }
    };
    Ok(analyzer)
}

/// Language model summaries when a key is configured, the template otherwise.
pub fn summaries_from_config(services: &ServicesConfig) -> Result<Arc<dyn SummaryGenerator>> {
    match services.openai_api_key.as_deref() {
        Some(key) => {
            let summary = OpenAiSummary::new(&services.llm_base_url, &services.llm_model, key)
                .context("Failed to configure summary client")?;
            Ok(Arc::new(summary))
        }
        None => Ok(Arc::new(StaticSummary)),
    }
}

/// TopMediaAI when a key is configured, the mock generator otherwise.
pub fn songs_from_config(services: &ServicesConfig) -> Result<Arc<dyn PracticeSongGenerator>> {
    match services.topmedia_api_key.as_deref() {
        Some(key) => {
            let client = TopMediaClient::new(&services.topmedia_base_url, key)
                .context("Failed to configure TopMediaAI client")?;
            Ok(Arc::new(client))
        }
        None => Ok(Arc::new(MockSongGenerator)),
    }
}

/// Build the shared handler state from a loaded config.
pub fn app_state(config: &EncoreConfig) -> Result<AppState> {
    let engine = PerformanceEngine::with_analyzer(analyzer_from_config(&config.analysis)?);
    let summaries = summaries_from_config(&config.services)?;
    let songs = songs_from_config(&config.services)?;

    info!(
        analyzer = engine.analyzer_name(),
        summaries = summaries.name(),
        songs = songs.name(),
        "Collaborators configured"
    );

    Ok(AppState::new(engine, summaries, songs)
        .with_max_upload_bytes(config.analysis.max_upload_bytes()))
}
