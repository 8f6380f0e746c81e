use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monthly spending bucket. The id doubles as the month key ("YYYY-MM").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Derived: sum of all entry amounts in this group. The store recomputes
    /// this after every entry mutation; it is never set directly.
    pub total_expenses: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Decimal>,
    /// Category name -> budget ceiling for this month.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub budgets: HashMap<String, Decimal>,
}

impl Group {
    pub fn new(id: String, name: String, created_at: i64) -> Self {
        Self {
            id,
            name,
            created_at,
            total_expenses: Decimal::ZERO,
            salary: None,
            budgets: HashMap::new(),
        }
    }

    /// Month key for the current local date, e.g. "2024-01".
    pub fn current_month_key() -> String {
        chrono::Local::now().format("%Y-%m").to_string()
    }
}
