//! Error types for Fiscus

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Malformed oracle response: {0}")]
    OracleMalformed(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Taxonomy error: {0}")]
    Taxonomy(String),
}

impl Error {
    /// True for failure modes that come from the oracle boundary and must
    /// degrade to a deterministic fallback rather than surface to callers.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(
            self,
            Error::OracleUnavailable(_) | Error::OracleMalformed(_) | Error::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
