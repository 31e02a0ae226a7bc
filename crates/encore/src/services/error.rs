use thiserror::Error;

/// Failures talking to an external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("API credits exhausted")]
    CreditsExhausted,

    #[error("no API credits remaining")]
    NoCredits,

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Build from a non-success response, consuming its body.
    pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read error body>".to_string());
        Self::Api { status, body }
    }
}
