use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the runtime are converted to this enum for consistent
/// handling. Uses `thiserror` for automatic conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP/transport errors when talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend responded with a non-success status
    #[error("API request failed with status {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Backend responded 200 but without the expected payload
    #[error("API response missing data: {0}")]
    MissingData(String),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Build an `Api` error from a response status and body
    pub fn api(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        let mut message = body.into();
        // Bodies can be arbitrarily large error pages; keep logs readable
        if message.len() > 500 {
            message.truncate(500);
        }
        AppError::Api { status, message }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
