//! Core types for generated insights

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Types of insights that can be generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    /// A budget is exceeded or close to it
    BudgetAlert,
    /// A notable recurring pattern in spending
    SpendingPattern,
    /// A concrete way to reduce spending
    SavingOpportunity,
    /// Statistically unusual activity (absorbs the legacy
    /// "unusual_activity" type, which duplicated it)
    Anomaly,
    /// General advice; also the coercion default for unknown types
    FinancialTip,
    /// Progress toward a savings goal
    GoalProgress,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::BudgetAlert => "budget_alert",
            InsightType::SpendingPattern => "spending_pattern",
            InsightType::SavingOpportunity => "saving_opportunity",
            InsightType::Anomaly => "anomaly",
            InsightType::FinancialTip => "financial_tip",
            InsightType::GoalProgress => "goal_progress",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "budget_alert" => Ok(InsightType::BudgetAlert),
            "spending_pattern" => Ok(InsightType::SpendingPattern),
            "saving_opportunity" => Ok(InsightType::SavingOpportunity),
            // Legacy alias: the old system had both with no clear distinction
            "anomaly" | "unusual_activity" => Ok(InsightType::Anomaly),
            "financial_tip" => Ok(InsightType::FinancialTip),
            "goal_progress" => Ok(InsightType::GoalProgress),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// Severity level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational - no action needed
    Low,
    /// Worth attention
    Medium,
    /// Should be addressed soon
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A generated, user-facing financial insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialInsight {
    pub title: String,
    pub description: String,
    pub insight_type: InsightType,
    pub severity: Severity,
    /// Owning user
    pub user_id: i64,
    pub valid_from: DateTime<Utc>,
    /// Always >= valid_from
    pub valid_until: DateTime<Utc>,
    /// Estimated monetary impact, when the oracle provided one
    pub monetary_impact: Option<f64>,
    pub read: bool,
    pub dismissed: bool,
}

impl FinancialInsight {
    /// Create an insight valid for `validity_days` starting now
    pub fn new(
        user_id: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        insight_type: InsightType,
        severity: Severity,
        validity_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: description.into(),
            insight_type,
            severity,
            user_id,
            valid_from: now,
            valid_until: now + Duration::days(validity_days.max(0)),
            monetary_impact: None,
            read: false,
            dismissed: false,
        }
    }

    pub fn with_monetary_impact(mut self, impact: f64) -> Self {
        self.monetary_impact = Some(impact);
        self
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && at <= self.valid_until
    }
}

/// One element of the JSON array the oracle returns
///
/// `insight_type` and `severity` stay raw strings here; the generator
/// coerces unknown or missing values to their defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightDraft {
    pub title: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub insight_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub monetary_impact: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_type_serialization() {
        assert_eq!(InsightType::SavingOpportunity.as_str(), "saving_opportunity");
        assert_eq!(
            InsightType::from_str("budget_alert").unwrap(),
            InsightType::BudgetAlert
        );
    }

    #[test]
    fn test_legacy_unusual_activity_maps_to_anomaly() {
        assert_eq!(
            InsightType::from_str("unusual_activity").unwrap(),
            InsightType::Anomaly
        );
        assert_eq!(InsightType::from_str("anomaly").unwrap(), InsightType::Anomaly);
    }

    #[test]
    fn test_parsing_ignores_case() {
        // Oracles are loose with capitalization
        assert_eq!(Severity::from_str("High").unwrap(), Severity::High);
        assert_eq!(Severity::from_str("MEDIUM").unwrap(), Severity::Medium);
        assert_eq!(
            InsightType::from_str("Anomaly").unwrap(),
            InsightType::Anomaly
        );
        assert_eq!(
            InsightType::from_str("SPENDING_PATTERN").unwrap(),
            InsightType::SpendingPattern
        );
    }

    #[test]
    fn test_severity_priority() {
        assert!(Severity::High.priority() > Severity::Medium.priority());
        assert!(Severity::Medium.priority() > Severity::Low.priority());
    }

    #[test]
    fn test_validity_window() {
        let insight = FinancialInsight::new(
            1,
            "Title",
            "Description",
            InsightType::FinancialTip,
            Severity::Medium,
            14,
        );
        assert!(insight.valid_until >= insight.valid_from);
        assert!(insight.is_valid_at(Utc::now()));
        assert!(!insight.is_valid_at(Utc::now() + Duration::days(15)));
    }

    #[test]
    fn test_draft_tolerates_missing_fields() {
        let draft: InsightDraft = serde_json::from_str(
            r#"{"title": "Cut dining out", "description": "You spent a lot on dining."}"#,
        )
        .unwrap();
        assert!(draft.insight_type.is_none());
        assert!(draft.severity.is_none());
        assert!(draft.monetary_impact.is_none());
    }
}
