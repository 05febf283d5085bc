use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unauthorized: no user or organization identity")]
    Unauthorized,

    #[error("missing required fields: {0}")]
    MissingFields(String),

    #[error("unknown risk level: {0}")]
    InvalidRiskLevel(String),

    #[error("unknown relationship scope: {0}")]
    InvalidScope(String),
}
