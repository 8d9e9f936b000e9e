use thiserror::Error;

#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Narrative API returned an error: {0}")]
    ApiError(String),

    #[error("Narrative response could not be understood: {0}")]
    InvalidResponse(String),

    #[error("No narrative generator is configured")]
    NotConfigured,
}
