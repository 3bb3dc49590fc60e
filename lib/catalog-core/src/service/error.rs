use thiserror::Error;

use crate::config::ConfigValidationError;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
    #[error("No loading session is active")]
    NoSession,
    #[error("Page {0} has not failed")]
    PageNotFailed(u32),
}
