//! HTTP API for Encore.
//!
//! Uploads are graded by the shared engine, stored, and then served back by
//! report id. Session-scoped progress is keyed by the `x-session-id` header.

mod error;
mod state;

pub use error::{ApiError, ANALYSIS_FAILED};
pub use state::{AppState, SESSION_HEADER};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use encore_analysis::{PracticePlan, Upload};
use encore_grade::{PerformanceReport, RadarSeries, ScoreEdit};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::services::SongRequest;
use crate::telemetry;

const UPLOAD_FIELD: &str = "video";

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(serve_root))
        .route("/health", get(health))
        .route("/api/analyze-performance", post(analyze_performance))
        .route("/api/reports/{id}", get(get_report))
        .route("/api/reports/{id}/scores", post(edit_scores))
        .route("/api/reports/{id}/radar", get(report_radar))
        .route("/api/reports/{id}/practice-plan", get(practice_plan))
        .route("/api/generate-practice-song", post(generate_practice_song))
        .route("/api/progress/practice", post(log_practice))
        .route("/api/progress", get(progress))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Request span, continuing the caller's trace when a traceparent is sent.
fn request_span(req: &Request<Body>) -> tracing::Span {
    let span = tracing::info_span!(
        "http.request",
        http.method = %req.method(),
        http.target = %req.uri().path(),
    );
    let traceparent = req
        .headers()
        .get("traceparent")
        .and_then(|v| v.to_str().ok());
    if let Some(parent) = telemetry::parse_traceparent(traceparent) {
        span.set_parent(parent);
    }
    span
}

async fn serve_root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Encore",
        "version": env!("CARGO_PKG_VERSION"),
        "links": {
            "health": "/health",
            "analyze": "/api/analyze-performance",
            "reports": "/api/reports/{id}",
            "practice_song": "/api/generate-practice-song",
            "progress": "/api/progress",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_secs": state.started.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "analyzer": state.engine.analyzer_name(),
        "summaries": state.summaries.name(),
        "songs": state.songs.name(),
        "reports": state.reports.len(),
        "sessions": state.sessions.len(),
    }))
}

#[derive(Serialize)]
struct ReportResponse<'a> {
    report_id: Uuid,
    #[serde(flatten)]
    report: &'a PerformanceReport,
}

fn report_response(id: Uuid, report: &PerformanceReport) -> Response {
    Json(ReportResponse {
        report_id: id,
        report,
    })
    .into_response()
}

fn parse_report_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Report {raw} not found")))
}

async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let upload = Upload::new(file_name, bytes);
        return Ok(Some(match content_type {
            Some(ct) => upload.with_content_type(ct),
            None => upload,
        }));
    }
    Ok(None)
}

async fn analyze_performance(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let session_id = state.session_for(&headers);
    let upload = read_upload(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No video file provided".to_string()))?;

    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.evaluate(&upload))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Analysis task panicked");
            ApiError::AnalysisFailed
        })??;

    let summary = match state.summaries.summarize(&report).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, generator = state.summaries.name(), "Summary unavailable");
            None
        }
    };
    let report = report.with_performance_summary(summary);

    let (report_id, report) = state.reports.insert(report);
    state
        .sessions
        .record_report(&session_id, report_id, report.overall_score());

    info!(%report_id, session_id = %session_id, overall = %report.overall_grade(), "Performance analyzed");
    Ok(([(SESSION_HEADER, session_id)], report_response(report_id, &report)).into_response())
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_report_id(&id)?;
    let report = state
        .reports
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Report {id} not found")))?;
    Ok(report_response(id, &report))
}

#[derive(Deserialize)]
struct EditScoresRequest {
    edits: Vec<ScoreEdit>,
}

async fn edit_scores(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EditScoresRequest>,
) -> Result<Response, ApiError> {
    let id = parse_report_id(&id)?;
    let report = state.reports.apply_edits(&id, &body.edits)?;
    Ok(report_response(id, &report))
}

async fn report_radar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<RadarSeries>>, ApiError> {
    let id = parse_report_id(&id)?;
    let report = state
        .reports
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Report {id} not found")))?;
    Ok(Json(RadarSeries::for_report(&report)))
}

async fn practice_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PracticePlan>, ApiError> {
    let id = parse_report_id(&id)?;
    let report = state
        .reports
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Report {id} not found")))?;
    Ok(Json(PracticePlan::from_report(&report)))
}

async fn generate_practice_song(
    State(state): State<AppState>,
    Json(request): Json<SongRequest>,
) -> Result<Response, ApiError> {
    let song = state.songs.generate(&request).await?;
    Ok(Json(song).into_response())
}

#[derive(Deserialize)]
struct PracticeLog {
    minutes: u32,
    #[serde(default)]
    score: Option<f64>,
}

async fn log_practice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PracticeLog>,
) -> Result<Response, ApiError> {
    if body.minutes == 0 {
        return Err(ApiError::BadRequest("minutes must be positive".to_string()));
    }
    if let Some(score) = body.score {
        if !(0.0..=10.0).contains(&score) {
            return Err(ApiError::BadRequest(format!(
                "score must be between 0 and 10, got {score}"
            )));
        }
    }

    let session_id = state.session_for(&headers);
    state
        .sessions
        .log_practice(&session_id, body.minutes, body.score);
    let progress = state
        .sessions
        .progress(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Session {session_id} not found")))?;

    Ok(([(SESSION_HEADER, session_id)], Json(progress)).into_response())
}

async fn progress(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    let session_id = state.session_for(&headers);
    let progress = state
        .sessions
        .progress(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Session {session_id} not found")))?;
    Ok(([(SESSION_HEADER, session_id)], Json(progress)).into_response())
}
