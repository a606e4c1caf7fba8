//! Domain models for Fiscus

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recurrence pattern for recurring transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for RecurrencePattern {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown recurrence pattern: {}", s)),
        }
    }
}

impl std::fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction
///
/// Amounts are always positive; the direction is carried by `tx_type`.
/// Immutable once classified except for category assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    /// Owning account (which belongs to `user_id`)
    pub account_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Always positive; `tx_type` carries the direction
    pub amount: f64,
    pub tx_type: TransactionType,
    pub category_id: Option<i64>,
    /// ISO 4217 code, e.g. "USD"
    pub currency: String,
    pub merchant: Option<String>,
    pub location: Option<String>,
    /// Present iff the transaction recurs
    pub recurrence: Option<RecurrencePattern>,
}

impl Transaction {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// One-line summary handed to the oracle for classification
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} {:.2} {} on {}",
            self.tx_type, self.amount, self.currency, self.date
        )];
        if !self.description.is_empty() {
            parts.push(format!("description: {}", self.description));
        }
        if let Some(ref merchant) = self.merchant {
            parts.push(format!("merchant: {}", merchant));
        }
        parts.join("; ")
    }
}

/// A spending/income category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// Parent category id (flat arena, no pointer cycles)
    pub parent_id: Option<i64>,
    /// System categories are shared; user categories belong to `owner_id`
    pub system: bool,
    /// None for system categories
    pub owner_id: Option<i64>,
    /// Which transaction type this category applies to
    pub affinity: TransactionType,
}

impl Category {
    /// The catch-all categories the classifier falls back to
    pub fn is_general_purpose(&self) -> bool {
        self.name == default_category_name(self.affinity)
    }

    /// Whether this category may be assigned to a transaction of `tx_type`
    pub fn accepts(&self, tx_type: TransactionType) -> bool {
        self.affinity == tx_type || self.is_general_purpose()
    }
}

/// Name of the deterministic fallback category for a transaction type.
///
/// Transfers fall back to the expense-side default; they carry expense
/// affinity for budgeting purposes.
pub fn default_category_name(tx_type: TransactionType) -> &'static str {
    match tx_type {
        TransactionType::Income => "Other Income",
        TransactionType::Expense | TransactionType::Transfer => "Other Expense",
    }
}

/// Flat collection of categories keyed by id with parent lookups by id.
///
/// Rejects inserts that would create a parent cycle.
#[derive(Debug, Default, Clone)]
pub struct CategoryArena {
    categories: HashMap<i64, Category>,
}

impl CategoryArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        let mut arena = Self::new();
        for category in categories {
            // Skip entries that would form a cycle rather than fail the batch
            let _ = arena.insert(category);
        }
        arena
    }

    /// Insert a category, rejecting unknown parents and parent cycles
    pub fn insert(&mut self, category: Category) -> std::result::Result<(), String> {
        if let Some(parent_id) = category.parent_id {
            if parent_id == category.id {
                return Err(format!("Category {} cannot be its own parent", category.id));
            }
            if !self.categories.contains_key(&parent_id) {
                return Err(format!(
                    "Parent category {} not found for {}",
                    parent_id, category.id
                ));
            }
            // Walk up from the parent; reaching the new id means a cycle
            let mut cursor = Some(parent_id);
            while let Some(id) = cursor {
                if id == category.id {
                    return Err(format!(
                        "Inserting category {} would create a parent cycle",
                        category.id
                    ));
                }
                cursor = self.categories.get(&id).and_then(|c| c.parent_id);
            }
        }
        self.categories.insert(category.id, category);
        Ok(())
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn parent_of(&self, id: i64) -> Option<&Category> {
        self.categories
            .get(&id)
            .and_then(|c| c.parent_id)
            .and_then(|pid| self.categories.get(&pid))
    }

    /// Root ancestor of a category (itself when it has no parent)
    pub fn root_of(&self, id: i64) -> Option<&Category> {
        let mut current = self.categories.get(&id)?;
        while let Some(parent_id) = current.parent_id {
            current = self.categories.get(&parent_id)?;
        }
        Some(current)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }
}

/// Derived monthly totals per transaction type (never persisted)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    pub income_total: f64,
    pub expense_total: f64,
    pub transfer_total: f64,
}

impl MonthlyAggregate {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            income_total: 0.0,
            expense_total: 0.0,
            transfer_total: 0.0,
        }
    }

    /// "YYYY-MM" display key
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn net(&self) -> f64 {
        self.income_total - self.expense_total
    }
}
