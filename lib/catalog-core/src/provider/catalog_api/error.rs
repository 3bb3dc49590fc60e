use thiserror::Error;

use crate::provider::http_client::{self, StatusCode};

/// Cloneable so that one in-flight response can be shared by every request
/// attached to it.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CatalogApiError {
    #[error("Request cancelled")]
    Cancelled,
    #[error("Catalog API responded with status {0}")]
    Status(StatusCode),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}

impl CatalogApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<http_client::Error> for CatalogApiError {
    fn from(error: http_client::Error) -> Self {
        match error {
            http_client::Error::Cancelled => Self::Cancelled,
            http_client::Error::StatusCodeIsError(status) => Self::Status(status),
            http_client::Error::JsonError(error) => Self::InvalidResponse(error.to_string()),
            http_client::Error::HttpError(message) | http_client::Error::Other(message) => {
                Self::Transport(message)
            }
        }
    }
}
