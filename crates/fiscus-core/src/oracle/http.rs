//! HTTP oracle backend
//!
//! Speaks an Ollama-style generate API: `POST /api/generate` with
//! `{model, prompt, stream: false}`, `GET /api/tags` for health checks.
//! Every call is wrapped in an explicit timeout; an elapsed timer takes the
//! same degradation path as a transport error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{NarrativeOracle, DEFAULT_TIMEOUT};

/// HTTP-backed narrative oracle
#[derive(Clone)]
pub struct HttpOracle {
    http_client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl HttpOracle {
    /// Create a new HTTP oracle with the default timeout
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout bound
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("ORACLE_HOST").ok()?;
        let model = std::env::var("ORACLE_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        let timeout = std::env::var("ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Some(Self::new(&host, &model).with_timeout(timeout))
    }

    /// Send a prompt and return the raw model reply, bounded by the timeout
    async fn generate(&self, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };

        let send = async {
            let response = self
                .http_client
                .post(format!("{}/api/generate", self.base_url))
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(Error::OracleUnavailable(format!(
                    "{} returned {}",
                    self.base_url,
                    response.status()
                )));
            }

            let body: GenerateResponse = response.json().await?;
            Ok(body.response)
        };

        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(Error::OracleUnavailable(format!(
                "oracle call timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

/// Request to the generate API
#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Response from the generate API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

fn classify_prompt(candidates: &[String], transaction_summary: &str) -> String {
    format!(
        "You are categorizing a personal finance transaction.\n\
         Pick the single best category from this list: {}\n\
         Transaction: {}\n\
         Reply with the category name only, nothing else.",
        candidates.join(", "),
        transaction_summary
    )
}

fn insights_prompt(structured_summary: &str) -> String {
    format!(
        "You are a personal finance assistant. Based on this spending summary, \
         produce up to 5 short, actionable insights.\n\
         Summary: {}\n\
         Reply with a JSON array only. Each element: {{\"title\": string, \
         \"description\": string, \"type\": one of [\"budget_alert\", \
         \"spending_pattern\", \"saving_opportunity\", \"anomaly\", \
         \"financial_tip\", \"goal_progress\"], \"severity\": one of [\"low\", \
         \"medium\", \"high\"], \"monetary_impact\": optional number}}.",
        structured_summary
    )
}

#[async_trait]
impl NarrativeOracle for HttpOracle {
    async fn classify(&self, candidates: &[String], transaction_summary: &str) -> Result<String> {
        let reply = self
            .generate(classify_prompt(candidates, transaction_summary))
            .await?;
        debug!("Oracle classification reply: {}", reply);
        Ok(super::parsing::clean_category_reply(&reply))
    }

    async fn synthesize_insights(&self, structured_summary: &str) -> Result<String> {
        let reply = self.generate(insights_prompt(structured_summary)).await?;
        debug!("Oracle insights reply: {}", reply);
        Ok(reply)
    }

    async fn health_check(&self) -> bool {
        let probe = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send();
        match tokio::time::timeout(self.timeout, probe).await {
            Ok(Ok(resp)) => resp.status().is_success(),
            _ => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
