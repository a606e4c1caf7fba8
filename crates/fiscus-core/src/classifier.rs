//! Category classifier
//!
//! Assigns a category to an uncategorized transaction. The oracle proposes a
//! name; matching against candidates is exact and case-insensitive, and every
//! oracle failure mode degrades to the deterministic type-specific default.

use tracing::{debug, warn};

use crate::error::Result;
use crate::ledger::Taxonomy;
use crate::models::{Category, Transaction};
use crate::oracle::{NarrativeOracle, OracleClient};

/// Classifies transactions into categories
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a transaction against the candidate set.
    ///
    /// Candidates should be the active categories matching the transaction's
    /// type (system + user-owned). Always returns a concrete category; the
    /// only error path is a failing taxonomy upsert. Classification failures
    /// (oracle down, timeout, no match) never surface.
    pub async fn classify(
        &self,
        tx: &Transaction,
        candidates: &[Category],
        oracle: Option<&OracleClient>,
        taxonomy: &dyn Taxonomy,
    ) -> Result<Category> {
        if let Some(oracle) = oracle {
            if !candidates.is_empty() {
                let names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();

                match oracle.classify(&names, &tx.summary()).await {
                    Ok(reply) => {
                        // Exact match only, case-insensitive; no fuzzy matching
                        let reply = reply.trim();
                        if let Some(category) = candidates
                            .iter()
                            .find(|c| c.name.eq_ignore_ascii_case(reply))
                        {
                            debug!(
                                transaction_id = tx.id,
                                category = %category.name,
                                "Oracle classification matched"
                            );
                            return Ok(category.clone());
                        }
                        debug!(
                            transaction_id = tx.id,
                            reply = %reply,
                            "Oracle reply matched no candidate, using default"
                        );
                    }
                    Err(e) => {
                        warn!(
                            transaction_id = tx.id,
                            error = %e,
                            "Oracle classification failed, using default"
                        );
                    }
                }
            }
        }

        // Deterministic fallback: the type-specific default category,
        // created at most once per (scope, type)
        taxonomy.ensure_default_category(tx.user_id, tx.tx_type)
    }
}
