//! Insight generation - narrative financial insights
//!
//! Turns a period of ledger activity into short, user-facing insights.
//! The pipeline is summarize-then-ask: transactions are condensed into a
//! structured [`SpendingSummary`], the oracle synthesizes insight drafts
//! from it, and the generator validates and coerces the drafts into
//! [`FinancialInsight`] values.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fiscus_core::insights::InsightGenerator;
//!
//! let generator = InsightGenerator::new();
//! let insights = generator.generate(user_id, &txs, &cats, period, &oracle).await;
//! ```

pub mod generator;
pub mod summary;
pub mod types;

pub use generator::InsightGenerator;
pub use summary::{CategorySpend, SpendingSummary, DEFAULT_TOP_CATEGORIES};
pub use types::{FinancialInsight, InsightDraft, InsightType, Severity};
