//! Anomaly detector
//!
//! Flags transactions whose amount is a three-sigma outlier within their
//! category history. Pure and deterministic; the engine supplies the
//! history (same category, same owning user, bounded window).

use crate::models::Transaction;
use crate::stats;

/// Anomaly detection configuration
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Below this many historical samples, nothing is flagged
    pub min_samples: usize,
    /// z-score above which an amount is anomalous
    pub z_threshold: f64,
    /// Most recent same-category transactions considered
    pub history_limit: usize,
    /// Trailing window for history, in months
    pub window_months: u32,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            z_threshold: 3.0,
            history_limit: 20,
            window_months: 6,
        }
    }
}

/// Outcome of an anomaly check
///
/// `z_score` is None when there was not enough history or the history was
/// constant (sigma = 0); insufficient data is a sentinel outcome, not an
/// error and not an anomaly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyVerdict {
    pub anomalous: bool,
    pub z_score: Option<f64>,
}

impl AnomalyVerdict {
    fn normal() -> Self {
        Self {
            anomalous: false,
            z_score: None,
        }
    }
}

/// Detects statistically unusual transaction amounts
#[derive(Debug, Default, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Evaluate an amount against historical amounts from the same category
    pub fn evaluate(&self, amount: f64, history: &[f64]) -> AnomalyVerdict {
        if history.len() < self.config.min_samples {
            return AnomalyVerdict::normal();
        }

        let mu = stats::mean(history);
        let sigma = stats::std_dev(history);

        if sigma == 0.0 {
            // Constant history: any deviation at all is unusual
            return AnomalyVerdict {
                anomalous: amount != mu,
                z_score: None,
            };
        }

        let z = (amount - mu).abs() / sigma;
        AnomalyVerdict {
            anomalous: z > self.config.z_threshold,
            z_score: Some(z),
        }
    }

    /// Evaluate a transaction against its category history
    pub fn check(&self, tx: &Transaction, history: &[Transaction]) -> AnomalyVerdict {
        let amounts: Vec<f64> = history
            .iter()
            .take(self.config.history_limit)
            .map(|t| t.amount)
            .collect();
        self.evaluate(tx.amount, &amounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history_never_flags() {
        let detector = AnomalyDetector::new();
        // 4 points, below the minimum of 5, regardless of how extreme
        let verdict = detector.evaluate(1_000_000.0, &[10.0, 11.0, 9.0, 10.5]);
        assert!(!verdict.anomalous);
        assert!(verdict.z_score.is_none());
    }

    #[test]
    fn test_three_sigma_example() {
        let detector = AnomalyDetector::new();
        let history = [100.0, 110.0, 90.0, 105.0, 95.0]; // mu=100, sigma~7.07

        let outlier = detector.evaluate(150.0, &history);
        assert!(outlier.anomalous);
        assert!(outlier.z_score.unwrap() > 6.0);

        let ordinary = detector.evaluate(102.0, &history);
        assert!(!ordinary.anomalous);
        assert!(ordinary.z_score.unwrap() < 1.0);
    }

    #[test]
    fn test_boundary_is_strictly_greater_than_threshold() {
        let detector = AnomalyDetector::new();
        let history = [100.0, 110.0, 90.0, 105.0, 95.0];
        let sigma = crate::stats::std_dev(&history);

        // Exactly 3 sigma from the mean is not anomalous; the rule is z > 3
        let verdict = detector.evaluate(100.0 + 3.0 * sigma, &history);
        assert!(!verdict.anomalous);
    }

    #[test]
    fn test_constant_history() {
        let detector = AnomalyDetector::new();
        let history = [15.99; 6];

        let same = detector.evaluate(15.99, &history);
        assert!(!same.anomalous);
        assert!(same.z_score.is_none());

        let different = detector.evaluate(16.00, &history);
        assert!(different.anomalous);
        assert!(different.z_score.is_none());
    }

    #[test]
    fn test_history_limit_applies() {
        use crate::models::{Transaction, TransactionType};
        use chrono::NaiveDate;

        let make = |amount: f64| Transaction {
            id: 0,
            account_id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            description: "test".to_string(),
            amount,
            tx_type: TransactionType::Expense,
            category_id: Some(1),
            currency: "USD".to_string(),
            merchant: None,
            location: None,
            recurrence: None,
        };

        // 25 entries; the stale tail holds huge amounts that would mask the
        // outlier if the limit of 20 were ignored
        let mut history: Vec<_> = (0..20).map(|_| make(100.0)).collect();
        history.extend((0..5).map(|_| make(100_000.0)));

        let detector = AnomalyDetector::new();
        let verdict = detector.check(&make(500.0), &history);
        assert!(verdict.anomalous);
    }
}
