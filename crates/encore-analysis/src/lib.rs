pub mod analyzer;
pub mod coaching;
pub mod error;
pub mod phrasing;
pub mod plan;
pub mod skill;
pub mod upload;

pub use analyzer::{
    Analyzer, FixedAnalyzer, HeuristicAnalyzer, MockAnalyzer, AUDIO_ASPECTS, VISUAL_ASPECTS,
};
pub use coaching::{education_tips, static_summary};
pub use error::{AnalysisError, Result};
pub use phrasing::remarks_for;
pub use plan::{PlanItem, PracticePlan, Priority, WeakPoint};
pub use skill::SkillLevel;
pub use upload::Upload;

use std::sync::Arc;

use encore_grade::{CategoryFeedback, PerformanceReport};
use tracing::info;

/// Turns an upload into a graded report.
///
/// The analyzer supplies raw aspect scores; aggregation, grading and tips are
/// the same for every backend. The returned report has no performance summary
/// yet; that text comes from an external generator.
pub struct PerformanceEngine {
    analyzer: Arc<dyn Analyzer>,
}

impl PerformanceEngine {
    /// Create with the deterministic heuristic analyzer.
    pub fn new() -> Self {
        Self {
            analyzer: Arc::new(HeuristicAnalyzer),
        }
    }

    /// Create with a custom analyzer (mock, fixed, or a future model backend).
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        Self { analyzer }
    }

    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer.name()
    }

    pub fn evaluate(&self, upload: &Upload) -> Result<PerformanceReport> {
        let visual = CategoryFeedback::new(self.analyzer.analyze_visual(upload)?)?;
        let audio = CategoryFeedback::new(self.analyzer.analyze_audio(upload)?)?;
        let tips = education_tips(&visual, &audio);
        let report = PerformanceReport::from_categories(visual, audio, tips, None)?;

        info!(
            analyzer = self.analyzer.name(),
            file = %upload.file_name,
            bytes = upload.len(),
            overall = %report.overall_grade(),
            "performance evaluated"
        );
        Ok(report)
    }
}

impl Default for PerformanceEngine {
    fn default() -> Self {
        Self::new()
    }
}
