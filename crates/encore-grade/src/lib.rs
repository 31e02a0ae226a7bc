//! Score aggregation and style rating for Encore performance reports.
//!
//! Everything in this crate is pure and synchronous. Upstream analyzers hand
//! over per-aspect scores; this crate turns them into category scores, letter
//! grades and the overall grade (including the `ULTRA` sentinel), and keeps
//! those derived values consistent when a user corrects a score.
//!
//! ```
//! use encore_grade::{classify, combine, GradeLabel, OverallGrade};
//!
//! assert_eq!(classify(8.7).label(), GradeLabel::S);
//! assert_eq!(combine(9.6, 9.7).unwrap(), OverallGrade::Ultra);
//! ```

pub mod aggregate;
pub mod chart;
pub mod combine;
pub mod error;
pub mod rating;
pub mod report;

pub use aggregate::aggregate;
pub use chart::RadarSeries;
pub use error::GradeError;
pub use combine::{combine, OverallGrade, ULTRA_COLOR, ULTRA_LABEL};
pub use rating::{classify, try_classify, GradeLabel, StyleRating};
pub use report::{
    Category, CategoryFeedback, EducationTips, GradeSummary, PerformanceReport, ScoreAspect,
    ScoreEdit, RESERVED_ASPECT_NAME,
};

pub type Result<T> = std::result::Result<T, GradeError>;
