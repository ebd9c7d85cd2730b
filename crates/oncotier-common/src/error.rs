use thiserror::Error;

/// Input-contract violations. These are the only failures that surface to
/// callers of the tiering engine; degraded data is absorbed into confidence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TieringError {
    #[error("Variant is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Variant field `{field}` is outside [0, 1]: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Invalid variant input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TieringError>;
