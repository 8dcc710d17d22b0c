use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReturnLayersError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Unknown asset class: {0}")]
    UnknownAsset(String),

    #[error("Duplicate asset class: {0}")]
    DuplicateAsset(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ReturnLayersError {
    fn from(e: serde_json::Error) -> Self {
        ReturnLayersError::SerializationError(e.to_string())
    }
}

impl ReturnLayersError {
    /// True when the error is confined to a single asset row.
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            ReturnLayersError::InvalidInput { .. } | ReturnLayersError::Overflow { .. }
        )
    }
}
