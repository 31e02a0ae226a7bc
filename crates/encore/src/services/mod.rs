//! External collaborators: summary text and practice songs.
//!
//! Both sit behind traits so the server can run offline with the template
//! summary and the mock song generator.

mod error;
pub mod songs;
pub mod summary;

pub use error::ServiceError;
pub use songs::{MockSongGenerator, PracticeSong, PracticeSongGenerator, SongRequest, TopMediaClient};
pub use summary::{OpenAiSummary, StaticSummary, SummaryGenerator};

/// Attach the current trace context to an outgoing request.
pub(crate) fn with_trace_context(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match crate::telemetry::current_traceparent() {
        Some(traceparent) => builder.header("traceparent", traceparent),
        None => builder,
    }
}
