use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use encore_analysis::AnalysisError;
use encore_grade::GradeError;

use crate::services::ServiceError;
use crate::store::StoreError;

pub const ANALYSIS_FAILED: &str = "Analysis failed. Please try again.";

/// Errors surfaced to HTTP clients as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    AnalysisFailed,
    Service(ServiceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AnalysisFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Service(ServiceError::NoCredits | ServiceError::CreditsExhausted) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Service(ServiceError::MissingApiKey(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Service(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::AnalysisFailed => ANALYSIS_FAILED.to_string(),
            Self::Service(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = ?self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.message() }))).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::EmptyUpload => Self::BadRequest("Uploaded video is empty".to_string()),
            AnalysisError::Grade(e) => {
                tracing::error!(error = %e, "Engine produced an ungradeable report");
                Self::AnalysisFailed
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(format!("Report {id} not found")),
            StoreError::Grade(e) => Self::from(e),
        }
    }
}

impl From<GradeError> for ApiError {
    fn from(err: GradeError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err)
    }
}
