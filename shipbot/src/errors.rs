use marketplace_tools::MarketApiError;
use sb_common::UnsupportedPlatform;
use thiserror::Error;

use crate::{sink::SinkError, store::StoreError};

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid bot configuration. {0}")]
    ConfigurationError(String),
    #[error("Marketplace API error. {0}")]
    MarketApi(#[from] MarketApiError),
    #[error("Chat sink error. {0}")]
    Sink(#[from] SinkError),
    #[error("Dedup store error. {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),
    #[error("Malformed callback payload: {0}")]
    MalformedCallback(String),
    #[error("Order detail is missing required field '{0}'")]
    MissingOrderField(&'static str),
}
