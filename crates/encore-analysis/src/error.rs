use encore_grade::GradeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("grading failed: {0}")]
    Grade(#[from] GradeError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
