use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaterfallError {
    #[error("Invalid structure: {}", reasons.join("; "))]
    InvalidStructure { reasons: Vec<String> },

    #[error("Too many tranches: a structure holds at most {max}")]
    TooManyTranches { max: usize },

    #[error("Too few tranches: a structure needs at least {min}")]
    TooFewTranches { min: usize },

    #[error("Tranche not found: {0}")]
    TrancheNotFound(String),

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data provider error: {0}")]
    ProviderError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for WaterfallError {
    fn from(e: serde_json::Error) -> Self {
        WaterfallError::SerializationError(e.to_string())
    }
}
