//! Mock oracle backend for testing
//!
//! Returns configurable canned responses for both oracle operations and
//! counts invocations so tests can assert the oracle was (not) called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::NarrativeOracle;

/// Mock narrative oracle
///
/// By default classification echoes the candidate whose name appears in the
/// transaction summary (first candidate otherwise), and insight synthesis
/// returns a small valid JSON array.
#[derive(Clone, Default)]
pub struct MockOracle {
    /// Whether health_check should return true
    pub healthy: bool,
    classification: Option<String>,
    insights_json: Option<String>,
    fail_classify: bool,
    fail_insights: bool,
    classify_calls: Arc<AtomicUsize>,
    insight_calls: Arc<AtomicUsize>,
}

impl MockOracle {
    /// Create a new mock oracle (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create an unhealthy mock oracle
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::default()
        }
    }

    /// Always reply with this exact text to classification requests
    pub fn with_classification(mut self, name: impl Into<String>) -> Self {
        self.classification = Some(name.into());
        self
    }

    /// Always reply with this raw text to insight synthesis requests
    pub fn with_insights_json(mut self, raw: impl Into<String>) -> Self {
        self.insights_json = Some(raw.into());
        self
    }

    /// Fail every classification call with OracleUnavailable
    pub fn failing_classification(mut self) -> Self {
        self.fail_classify = true;
        self
    }

    /// Fail every insight synthesis call with OracleUnavailable
    pub fn failing_insights(mut self) -> Self {
        self.fail_insights = true;
        self
    }

    /// Number of classify calls observed
    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    /// Number of synthesize_insights calls observed
    pub fn insight_calls(&self) -> usize {
        self.insight_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NarrativeOracle for MockOracle {
    async fn classify(&self, candidates: &[String], transaction_summary: &str) -> Result<String> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_classify {
            return Err(Error::OracleUnavailable("mock failure".into()));
        }
        if let Some(ref fixed) = self.classification {
            return Ok(fixed.clone());
        }

        // Echo the candidate mentioned in the summary, else the first one
        let summary_lower = transaction_summary.to_lowercase();
        let matched = candidates
            .iter()
            .find(|name| summary_lower.contains(&name.to_lowercase()));

        Ok(matched
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_default())
    }

    async fn synthesize_insights(&self, _structured_summary: &str) -> Result<String> {
        self.insight_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_insights {
            return Err(Error::OracleUnavailable("mock failure".into()));
        }
        if let Some(ref fixed) = self.insights_json {
            return Ok(fixed.clone());
        }

        Ok(r#"[{"title": "Watch your top category", "description": "Your largest expense category dominates this period.", "type": "spending_pattern", "severity": "medium"}]"#.to_string())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
