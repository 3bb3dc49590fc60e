use thiserror::Error;

pub mod core_config;

#[cfg(test)]
mod test;

#[derive(Debug, Error)]
pub enum ConfigParsingError {
    #[error("Config parsing error: `{0}`")]
    GeneralParsingError(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("At least one positive page size must be configured")]
    EmptyPageSizes,
    #[error("Lookahead must be at least one page")]
    ZeroLookahead,
    #[error("Unsupported API URL scheme `{0}`")]
    UnsupportedScheme(String),
}
