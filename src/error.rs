use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Champion not found: {0}")]
    ChampionNotFound(String),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON parsing error: {0}")]
    Json(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown platform region: {0:?}")]
    UnknownRegion(String),

    #[error("Invalid job payload: {0}")]
    InvalidJob(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl AppError {
    /// HTTP status carried by the error, if it came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::RateLimitExceeded { .. } => Some(429),
            _ => None,
        }
    }
}
