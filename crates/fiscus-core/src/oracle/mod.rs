//! Narrative oracle abstraction
//!
//! The oracle is the only unreliable dependency of the analytics core: an
//! external text-in/text-out capability (typically an LLM behind an HTTP
//! API). This module keeps it behind a narrow interface so its failure modes
//! never leak past the fallback policies in the classifier and the insight
//! generator.
//!
//! # Architecture
//!
//! - `NarrativeOracle` trait: the two operations the core consumes
//! - `OracleClient` enum: concrete wrapper providing Clone + compile-time
//!   dispatch
//! - Backend implementations: `HttpOracle`, `MockOracle`
//!
//! # Configuration
//!
//! Environment variables:
//! - `ORACLE_BACKEND`: Backend to use (http, mock). Default: http
//! - `ORACLE_HOST`: Oracle server URL (required for http backend)
//! - `ORACLE_MODEL`: Model name (default: llama3.2)
//! - `ORACLE_TIMEOUT_SECS`: Per-call timeout bound (default: 5)

mod http;
mod mock;
pub mod parsing;

pub use http::HttpOracle;
pub use mock::MockOracle;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Default per-call timeout when `ORACLE_TIMEOUT_SECS` is unset
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait defining the narrative oracle interface
///
/// Both calls are bounded by the backend's configured timeout and are
/// cancellable by dropping the returned future. Every failure mode maps to
/// `Error::OracleUnavailable` or `Error::OracleMalformed`; callers degrade
/// to their deterministic fallbacks.
#[async_trait]
pub trait NarrativeOracle: Send + Sync {
    /// Pick a category name for a transaction from a candidate list.
    /// Returns free text that the classifier matches against candidates.
    async fn classify(&self, candidates: &[String], transaction_summary: &str) -> Result<String>;

    /// Produce narrative insights for a structured spending summary.
    /// Returns raw text expected to contain a JSON array.
    async fn synthesize_insights(&self, structured_summary: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete oracle client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum OracleClient {
    /// HTTP backend (Ollama-style generate API)
    Http(HttpOracle),
    /// Mock backend for testing
    Mock(MockOracle),
}

impl OracleClient {
    /// Create an oracle client from environment variables
    ///
    /// Returns None when the required variables are not set; the analytics
    /// engine then runs with deterministic fallbacks only.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("ORACLE_BACKEND").unwrap_or_else(|_| "http".to_string());

        match backend.to_lowercase().as_str() {
            "http" | "ollama" => HttpOracle::from_env().map(OracleClient::Http),
            "mock" => Some(OracleClient::Mock(MockOracle::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown ORACLE_BACKEND, falling back to http");
                HttpOracle::from_env().map(OracleClient::Http)
            }
        }
    }

    /// Create an HTTP backend directly
    pub fn http(host: &str, model: &str) -> Self {
        OracleClient::Http(HttpOracle::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        OracleClient::Mock(MockOracle::new())
    }
}

#[async_trait]
impl NarrativeOracle for OracleClient {
    async fn classify(&self, candidates: &[String], transaction_summary: &str) -> Result<String> {
        match self {
            OracleClient::Http(b) => b.classify(candidates, transaction_summary).await,
            OracleClient::Mock(b) => b.classify(candidates, transaction_summary).await,
        }
    }

    async fn synthesize_insights(&self, structured_summary: &str) -> Result<String> {
        match self {
            OracleClient::Http(b) => b.synthesize_insights(structured_summary).await,
            OracleClient::Mock(b) => b.synthesize_insights(structured_summary).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            OracleClient::Http(b) => b.health_check().await,
            OracleClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            OracleClient::Http(b) => b.model(),
            OracleClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            OracleClient::Http(b) => b.host(),
            OracleClient::Mock(b) => b.host(),
        }
    }
}
