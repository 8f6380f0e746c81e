use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single expense record belonging to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: Decimal,
    /// Empty string means uncategorized.
    pub category: String,
    /// Effective date (ms since epoch), user-supplied and distinct from
    /// `created_at`.
    pub date: i64,
    pub created_at: i64,
}

impl Entry {
    pub fn is_uncategorized(&self) -> bool {
        self.category.trim().is_empty()
    }

    /// Category name for display and bucketing.
    pub fn category_label(&self) -> &str {
        if self.is_uncategorized() {
            "Uncategorized"
        } else {
            &self.category
        }
    }
}

/// Fields to merge onto a stored entry. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<i64>,
}
