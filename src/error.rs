use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the mirror worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Transport level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The worker answered with a non-success status code.
    #[error("Worker returned HTTP {0}")]
    Status(StatusCode),

    /// The worker answered but refused the job.
    #[error("Worker rejected the request")]
    Rejected,

    /// The worker accepted the job without telling us its run id.
    #[error("Worker response is missing run_id")]
    MissingRunId,

    /// The response body was not the JSON we expected.
    #[error("Malformed worker response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid worker URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
