use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, GenError>;
