use serde::{Deserialize, Serialize};

use super::{Category, Entry, Group};

/// Full-store snapshot used by export and import.
///
/// On import, `groups` and `entries` are required; `categories` and
/// `exportedAt` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub groups: Vec<Group>,
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub exported_at: i64,
}
