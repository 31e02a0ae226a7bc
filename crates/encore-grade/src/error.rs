use crate::report::Category;
use thiserror::Error;

/// Errors raised by the rating engine.
///
/// Every variant is a caller contract violation. Nothing here is retried or
/// replaced with a default score.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("category has no aspects to aggregate")]
    EmptyCategory,

    #[error("{context} is not a finite score: {value}")]
    InvalidScore { context: String, value: f64 },

    #[error("aspect name \"score\" is reserved for the category score")]
    ReservedAspectName,

    #[error("aspect {0:?} appears more than once")]
    DuplicateAspect(String),

    #[error("no aspect {aspect:?} in {category}")]
    UnknownAspect { category: Category, aspect: String },

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("unknown grade label {0:?}")]
    UnknownLabel(String),
}

/// Reject NaN and infinities before they reach a displayed grade.
pub(crate) fn ensure_finite(context: &str, value: f64) -> Result<f64, GradeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GradeError::InvalidScore {
            context: context.to_string(),
            value,
        })
    }
}
