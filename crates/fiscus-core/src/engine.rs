//! Analytics engine - orchestrates classification, detection, and insights
//!
//! Wires the pure analyzers to the ledger, the taxonomy, and the oracle.
//! Enrichment is advisory: a down oracle or an unreadable history degrades
//! the result, it never fails transaction ingestion.

use chrono::{Duration, Months, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyDetector, AnomalyVerdict};
use crate::classifier::CategoryClassifier;
use crate::error::Result;
use crate::forecast::TrendForecaster;
use crate::insights::{FinancialInsight, InsightGenerator, InsightType, Severity};
use crate::ledger::{InsightSink, LedgerQuery, Taxonomy, TransactionFilter};
use crate::models::{Category, Transaction, TransactionType};
use crate::oracle::OracleClient;

/// Days of history summarized for insight generation
const INSIGHT_WINDOW_DAYS: i64 = 90;
/// Months of aggregates fed to the expense forecaster
const FORECAST_WINDOW_MONTHS: u32 = 12;
/// Validity of anomaly insights, in days
const ANOMALY_VALIDITY_DAYS: i64 = 14;

/// What enrichment concluded about a new transaction
#[derive(Debug, Clone)]
pub struct Enrichment {
    /// Category assigned by classification, None when the transaction
    /// already had one
    pub category: Option<Category>,
    pub anomaly: AnomalyVerdict,
}

/// Orchestrates the analytics pipeline over a ledger
pub struct AnalyticsEngine<'a> {
    ledger: &'a dyn LedgerQuery,
    taxonomy: &'a dyn Taxonomy,
    sink: &'a dyn InsightSink,
    /// Optional narrative oracle; everything degrades gracefully without it
    oracle: Option<&'a OracleClient>,
    classifier: CategoryClassifier,
    detector: AnomalyDetector,
    forecaster: TrendForecaster,
    generator: InsightGenerator,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(
        ledger: &'a dyn LedgerQuery,
        taxonomy: &'a dyn Taxonomy,
        sink: &'a dyn InsightSink,
        oracle: Option<&'a OracleClient>,
    ) -> Self {
        Self {
            ledger,
            taxonomy,
            sink,
            oracle,
            classifier: CategoryClassifier::new(),
            detector: AnomalyDetector::new(),
            forecaster: TrendForecaster::new(),
            generator: InsightGenerator::new(),
        }
    }

    pub fn with_detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_generator(mut self, generator: InsightGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Enrich a newly ingested transaction: assign a category when it has
    /// none, then check the amount against its category history. An
    /// anomalous amount is recorded as an insight on the spot.
    ///
    /// The only error path is the taxonomy fallback failing; oracle and
    /// history problems degrade with a warning.
    pub async fn enrich_new_transaction(&self, tx: &Transaction) -> Result<Enrichment> {
        let category = if tx.category_id.is_none() {
            let candidates = self.classification_candidates(tx)?;
            Some(
                self.classifier
                    .classify(tx, &candidates, self.oracle, self.taxonomy)
                    .await?,
            )
        } else {
            None
        };

        let category_id = tx.category_id.or(category.as_ref().map(|c| c.id));
        let anomaly = match category_id {
            Some(category_id) => self.check_anomaly(tx, category_id),
            None => AnomalyVerdict {
                anomalous: false,
                z_score: None,
            },
        };

        if anomaly.anomalous {
            self.record_anomaly(tx, &anomaly);
        }

        Ok(Enrichment { category, anomaly })
    }

    /// Forecast the user's expense total `months_ahead` months out, from up
    /// to a year of monthly aggregates.
    pub fn forecast_expenses(&self, user_id: i64, months_ahead: u32) -> Result<f64> {
        let today = Utc::now().date_naive();
        let since = today
            .checked_sub_months(Months::new(FORECAST_WINDOW_MONTHS))
            .unwrap_or(NaiveDate::MIN);

        let filter = TransactionFilter::new().date_range(since, today);
        let transactions = self.ledger.transactions(user_id, &filter)?;
        let aggregates = crate::aggregate::monthly_aggregates(&transactions);

        Ok(self.forecaster.forecast_from_aggregates(&aggregates, months_ahead))
    }

    /// Generate narrative insights over the trailing window. Without an
    /// oracle this is a no-op; with one, failures yield an empty list.
    pub async fn generate_insights(&self, user_id: i64) -> Result<Vec<FinancialInsight>> {
        let Some(oracle) = self.oracle else {
            debug!(user_id, "No oracle configured, skipping insight generation");
            return Ok(vec![]);
        };

        let today = Utc::now().date_naive();
        let since = today - Duration::days(INSIGHT_WINDOW_DAYS);

        let filter = TransactionFilter::new().date_range(since, today);
        let transactions = self.ledger.transactions(user_id, &filter)?;

        let mut categories = self
            .taxonomy
            .categories_for_type(user_id, TransactionType::Expense)?;
        categories.extend(
            self.taxonomy
                .categories_for_type(user_id, TransactionType::Income)?,
        );

        Ok(self
            .generator
            .generate(user_id, &transactions, &categories, (since, today), oracle)
            .await)
    }

    /// Generate insights and append them to the sink.
    ///
    /// Returns how many were persisted; individual append failures are
    /// logged and skipped.
    pub async fn run_and_persist_insights(&self, user_id: i64) -> Result<usize> {
        let insights = self.generate_insights(user_id).await?;
        let mut count = 0;

        for insight in &insights {
            match self.sink.append_insight(insight) {
                Ok(()) => count += 1,
                Err(e) => {
                    warn!(
                        user_id,
                        title = %insight.title,
                        error = %e,
                        "Failed to persist insight"
                    );
                }
            }
        }

        info!(user_id, persisted = count, "Insight generation complete");
        Ok(count)
    }

    /// Categories the classifier may choose from for this transaction
    fn classification_candidates(&self, tx: &Transaction) -> Result<Vec<Category>> {
        let mut candidates = self.taxonomy.categories_for_type(tx.user_id, tx.tx_type)?;
        candidates.retain(|c| c.accepts(tx.tx_type));
        Ok(candidates)
    }

    /// Check the transaction against its category history. Window and
    /// sample limits come from the detector config; an unreadable history
    /// degrades to "not anomalous".
    fn check_anomaly(&self, tx: &Transaction, category_id: i64) -> AnomalyVerdict {
        let config = self.detector.config();
        let since = tx
            .date
            .checked_sub_months(Months::new(config.window_months))
            .unwrap_or(NaiveDate::MIN);

        match self
            .ledger
            .category_history(tx.user_id, category_id, since, config.history_limit)
        {
            Ok(history) => self.detector.check(tx, &history),
            Err(e) => {
                warn!(
                    transaction_id = tx.id,
                    category_id,
                    error = %e,
                    "Could not load category history, skipping anomaly check"
                );
                AnomalyVerdict {
                    anomalous: false,
                    z_score: None,
                }
            }
        }
    }

    fn record_anomaly(&self, tx: &Transaction, verdict: &AnomalyVerdict) {
        let description = match verdict.z_score {
            Some(z) => format!(
                "{} of {:.2} {} is {:.1} standard deviations from your typical spend in this category.",
                tx.description, tx.amount, tx.currency, z
            ),
            None => format!(
                "{} of {:.2} {} breaks an otherwise constant amount in this category.",
                tx.description, tx.amount, tx.currency
            ),
        };

        let insight = FinancialInsight::new(
            tx.user_id,
            "Unusual transaction amount",
            description,
            InsightType::Anomaly,
            Severity::High,
            ANOMALY_VALIDITY_DAYS,
        )
        .with_monetary_impact(tx.amount);

        if let Err(e) = self.sink.append_insight(&insight) {
            warn!(
                transaction_id = tx.id,
                error = %e,
                "Failed to record anomaly insight"
            );
        }
    }
}
