use std::collections::HashSet;

use super::BudgetCategory;
use crate::error::BudgetError;

/// Built-in weight tables a household can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPreset {
    /// Needs / Wants / Savings at 50 / 30 / 20.
    Classic,
    /// Needs / Person A / Person B / Savings at 50 / 10 / 10 / 30.
    Couple,
}

impl PlanPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Couple => "couple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "classic" | "50/30/20" => Some(Self::Classic),
            "couple" | "household" | "50/10/10/30" => Some(Self::Couple),
            _ => None,
        }
    }

    pub fn all() -> &'static [PlanPreset] {
        &[Self::Classic, Self::Couple]
    }

    pub fn plan(&self) -> BudgetPlan {
        let categories = match self {
            Self::Classic => vec![
                BudgetCategory::new("needs", "Needs", 50),
                BudgetCategory::new("wants", "Wants", 30),
                BudgetCategory::new("savings", "Savings", 20),
            ],
            Self::Couple => vec![
                BudgetCategory::new("needs", "Needs", 50),
                BudgetCategory::new("person_a_spend", "Person A Spend", 10),
                BudgetCategory::new("person_b_spend", "Person B Spend", 10),
                BudgetCategory::new("savings", "Savings", 30),
            ],
        };
        BudgetPlan { categories }
    }
}

impl std::fmt::Display for PlanPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ordered category weight table a budget is computed against.
///
/// Order is significant: snapshots and grouped expense lists follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetPlan {
    pub categories: Vec<BudgetCategory>,
}

impl BudgetPlan {
    pub fn new(categories: Vec<BudgetCategory>) -> Result<Self, BudgetError> {
        let plan = Self { categories };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.categories.is_empty() {
            return Err(BudgetError::InvalidPlan("plan has no categories".into()));
        }
        let mut seen = HashSet::new();
        for cat in &self.categories {
            if cat.key.trim().is_empty() {
                return Err(BudgetError::InvalidPlan("category key cannot be blank".into()));
            }
            if !seen.insert(cat.key.as_str()) {
                return Err(BudgetError::InvalidPlan(format!(
                    "duplicate category '{}'",
                    cat.key
                )));
            }
        }
        let total: u32 = self.categories.iter().map(|c| c.percentage).sum();
        if total != 100 {
            return Err(BudgetError::InvalidPlan(format!(
                "weights sum to {total}%, expected 100%"
            )));
        }
        Ok(())
    }

    pub fn find(&self, key: &str) -> Option<&BudgetCategory> {
        BudgetCategory::find_by_key(&self.categories, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Display label for a key, falling back to the key itself for
    /// expenses recorded under a category the plan no longer has.
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.find(key).map_or(key, |c| c.label.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.key.as_str()).collect()
    }

    /// Rename a category's label, leaving keys and weights alone.
    pub fn relabel(&mut self, key: &str, label: &str) -> Result<(), BudgetError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(BudgetError::InvalidPlan("label cannot be blank".into()));
        }
        let lower = key.trim().to_lowercase();
        let cat = self
            .categories
            .iter_mut()
            .find(|c| c.key == lower)
            .ok_or_else(|| BudgetError::UnknownCategory(key.to_string()))?;
        cat.label = label.to_string();
        Ok(())
    }
}

impl Default for BudgetPlan {
    fn default() -> Self {
        PlanPreset::Classic.plan()
    }
}
