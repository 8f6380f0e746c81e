use serde::{Deserialize, Serialize};

/// A reusable expense label. Entries reference categories by name only, so
/// deleting a category leaves any referencing entries with a dangling label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Derived from the name: lowercase, whitespace runs become hyphens.
    pub id: String,
    pub name: String,
    /// Seeded at first run rather than created by the user.
    pub is_default: bool,
    pub created_at: i64,
}

impl Category {
    pub fn new(name: String, is_default: bool, created_at: i64) -> Self {
        Self {
            id: Self::slug(&name),
            name,
            is_default,
            created_at,
        }
    }

    /// "Outside Food" -> "outside-food".
    pub fn slug(name: &str) -> String {
        name.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    }
}
