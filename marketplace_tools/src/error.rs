use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request failed before a response was received: {0}")]
    Transport(String),
    #[error("Upstream returned HTTP {status}. {message}")]
    Upstream { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    Json(String),
    #[error("Malformed order payload: {0}")]
    MalformedOrder(String),
}

impl MarketApiError {
    /// Transient failures are retried; everything else is surfaced to the
    /// caller immediately. A 2xx response with an application-level error body
    /// never reaches this classification at all - it is returned as data.
    pub fn is_transient(&self) -> bool {
        match self {
            MarketApiError::Transport(_) => true,
            MarketApiError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
