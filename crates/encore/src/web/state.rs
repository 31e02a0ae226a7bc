use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderMap;
use encore_analysis::PerformanceEngine;

use crate::services::{PracticeSongGenerator, SummaryGenerator};
use crate::sessions::SessionStore;
use crate::store::ReportStore;

/// Header carrying the caller's session id, in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Shared state for web handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PerformanceEngine>,
    pub reports: ReportStore,
    pub sessions: SessionStore,
    pub summaries: Arc<dyn SummaryGenerator>,
    pub songs: Arc<dyn PracticeSongGenerator>,
    pub started: Instant,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        engine: PerformanceEngine,
        summaries: Arc<dyn SummaryGenerator>,
        songs: Arc<dyn PracticeSongGenerator>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            reports: ReportStore::new(),
            sessions: SessionStore::new(),
            summaries,
            songs,
            started: Instant::now(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Resolve the session named in the request headers, creating one when
    /// the header is absent or unreadable.
    pub fn session_for(&self, headers: &HeaderMap) -> String {
        let hint = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());
        self.sessions.get_or_create(hint)
    }
}
