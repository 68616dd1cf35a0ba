use thiserror::Error;

/// Engine errors - combines the lower-layer error types
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    CoreError(#[from] chime_core::error::CoreError),

    #[error(transparent)]
    ConversionError(#[from] chime_ical::tz::ConversionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
