/// One bucket of a fixed-ratio budget plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetCategory {
    /// Stable identifier stored on expenses, e.g. `needs`.
    pub key: String,
    pub label: String,
    /// Whole-number share of income; all categories of a plan sum to 100.
    pub percentage: u32,
}

impl BudgetCategory {
    pub fn new(key: &str, label: &str, percentage: u32) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            percentage,
        }
    }

    /// Find a category by key (case-insensitive) in a slice.
    pub fn find_by_key<'a>(categories: &'a [BudgetCategory], key: &str) -> Option<&'a BudgetCategory> {
        let lower = key.trim().to_lowercase();
        categories.iter().find(|c| c.key == lower)
    }
}

impl std::fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}%)", self.label, self.percentage)
    }
}
