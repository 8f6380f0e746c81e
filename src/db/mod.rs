mod schema;

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::{IdGenerator, UuidGenerator};
use crate::models::*;

/// Failures surfaced by the store.
///
/// Callers are expected to distinguish the first three; the rest carry the
/// underlying cause. The store never retries.
#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),
    #[error("{0} already exists: {1}")]
    Duplicate(&'static str, String),
    #[error("invalid import bundle: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
    #[error("corrupt record: {0}")]
    Encoding(#[from] serde_json::Error),
}

pub(crate) type Result<T> = std::result::Result<T, StoreError>;

/// Categories inserted the first time the store comes up empty.
const DEFAULT_CATEGORIES: &[&str] = &[
    "Outside Food",
    "Recharge & Bills",
    "Shopping",
    "Transport",
    "Entertainment",
    "Health",
    "Vegetables & Fruits",
    "Non-Veg Items",
    "Household Items",
    "Groceries",
    "Others",
];

pub(crate) struct Store {
    conn: Connection,
    ids: Box<dyn IdGenerator>,
}

impl Store {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn, Box::new(UuidGenerator))
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, Box::new(crate::id::SequentialIds::new()))
    }

    fn init(conn: Connection, ids: Box<dyn IdGenerator>) -> Result<Self> {
        let mut store = Self { conn, ids };
        store.migrate()?;
        store.seed_default_categories()?;
        Ok(store)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        debug!("seeding {} default categories", DEFAULT_CATEGORIES.len());
        for name in DEFAULT_CATEGORIES {
            // Duplicate ids during seeding are swallowed.
            match self.create_category(name, true) {
                Ok(_) | Err(StoreError::Duplicate(..)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ── Groups ────────────────────────────────────────────────

    /// Create a monthly group. The id defaults to the current month key and
    /// must be unique.
    pub(crate) fn create_group(&self, name: &str, id: Option<&str>) -> Result<Group> {
        let group = Group::new(
            id.map(str::to_string)
                .unwrap_or_else(Group::current_month_key),
            name.to_string(),
            now_ms(),
        );
        self.conn
            .execute(
                "INSERT INTO groups (id, name, created_at, total_expenses, salary, budgets)
                 VALUES (?1, ?2, ?3, ?4, NULL, NULL)",
                params![
                    group.id,
                    group.name,
                    group.created_at,
                    group.total_expenses.to_string(),
                ],
            )
            .map_err(|e| dup_key(e, "group", &group.id))?;
        Ok(group)
    }

    /// All groups, newest first.
    pub(crate) fn get_all_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at, total_expenses, salary, budgets
             FROM groups ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], group_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_group(&self, id: &str) -> Result<Option<Group>> {
        let result = self.conn.query_row(
            "SELECT id, name, created_at, total_expenses, salary, budgets
             FROM groups WHERE id = ?1",
            params![id],
            group_from_row,
        );
        match result {
            Ok(g) => Ok(Some(g)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Recompute `total_expenses` from the group's entries and store it.
    /// Every entry mutation runs this before returning.
    pub(crate) fn update_group_total(&self, group_id: &str) -> Result<Decimal> {
        recompute_total(&self.conn, group_id)
    }

    pub(crate) fn update_group_budget(
        &self,
        group_id: &str,
        salary: Option<Decimal>,
        budgets: &HashMap<String, Decimal>,
    ) -> Result<()> {
        let budgets_json = if budgets.is_empty() {
            None
        } else {
            Some(serde_json::to_string(budgets)?)
        };
        let updated = self.conn.execute(
            "UPDATE groups SET salary = ?1, budgets = ?2 WHERE id = ?3",
            params![salary.map(|s| s.to_string()), budgets_json, group_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound("group", group_id.to_string()));
        }
        Ok(())
    }

    /// Delete a group and every entry in it. Runs in one transaction so a
    /// crash mid-cascade cannot orphan entries. Missing groups are a no-op.
    pub(crate) fn delete_group(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries WHERE group_id = ?1", params![id])?;
        tx.execute("DELETE FROM groups WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // ── Entries ───────────────────────────────────────────────

    /// Record an expense. The effective date defaults to now. Fails with
    /// `NotFound` (and inserts nothing) if the group does not exist.
    pub(crate) fn create_entry(
        &mut self,
        group_id: &str,
        description: &str,
        amount: Decimal,
        category: &str,
        date: Option<i64>,
    ) -> Result<Entry> {
        let now = now_ms();
        let entry = Entry {
            id: self.ids.generate(),
            group_id: group_id.to_string(),
            description: description.to_string(),
            amount,
            category: category.to_string(),
            date: date.unwrap_or(now),
            created_at: now,
        };

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO entries (id, group_id, description, amount, category, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.group_id,
                entry.description,
                entry.amount.to_string(),
                entry.category,
                entry.date,
                entry.created_at,
            ],
        )?;
        // Rolls the insert back if the group does not exist.
        recompute_total(&tx, group_id)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Entries for one group, newest effective date first.
    pub(crate) fn get_entries_by_group(&self, group_id: &str) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, group_id, description, amount, category, date, created_at
             FROM entries WHERE group_id = ?1 ORDER BY date DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![group_id], entry_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_entry(&self, id: &str) -> Result<Option<Entry>> {
        let result = self.conn.query_row(
            "SELECT id, group_id, description, amount, category, date, created_at
             FROM entries WHERE id = ?1",
            params![id],
            entry_from_row,
        );
        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `patch` onto a stored entry and recompute the parent total.
    pub(crate) fn update_entry(&mut self, id: &str, patch: &EntryPatch) -> Result<Entry> {
        let tx = self.conn.transaction()?;
        let mut entry = match tx.query_row(
            "SELECT id, group_id, description, amount, category, date, created_at
             FROM entries WHERE id = ?1",
            params![id],
            entry_from_row,
        ) {
            Ok(e) => e,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(StoreError::NotFound("entry", id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(description) = &patch.description {
            entry.description = description.clone();
        }
        if let Some(amount) = patch.amount {
            entry.amount = amount;
        }
        if let Some(category) = &patch.category {
            entry.category = category.clone();
        }
        if let Some(date) = patch.date {
            entry.date = date;
        }

        tx.execute(
            "UPDATE entries SET description = ?1, amount = ?2, category = ?3, date = ?4
             WHERE id = ?5",
            params![
                entry.description,
                entry.amount.to_string(),
                entry.category,
                entry.date,
                entry.id,
            ],
        )?;
        recompute_total(&tx, &entry.group_id)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Remove an entry. A missing id resolves silently. `recompute` is turned
    /// off by the group cascade, where the parent is about to go away.
    pub(crate) fn delete_entry(&mut self, id: &str, recompute: bool) -> Result<()> {
        let tx = self.conn.transaction()?;
        let group_id: Option<String> = match tx.query_row(
            "SELECT group_id FROM entries WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(g) => Some(g),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };
        let Some(group_id) = group_id else {
            return Ok(());
        };

        tx.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        if recompute {
            recompute_total(&tx, &group_id)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    /// Create a category. The id is derived from the name, so two names that
    /// slug identically collide.
    pub(crate) fn create_category(&self, name: &str, is_default: bool) -> Result<Category> {
        let cat = Category::new(name.to_string(), is_default, now_ms());
        self.conn
            .execute(
                "INSERT INTO categories (id, name, is_default, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![cat.id, cat.name, cat.is_default, cat.created_at],
            )
            .map_err(|e| dup_key(e, "category", &cat.id))?;
        Ok(cat)
    }

    /// All categories, name ascending. Degrades to an empty list on failure;
    /// callers treat empty as a valid state.
    pub(crate) fn get_categories(&self) -> Vec<Category> {
        match self.query_categories() {
            Ok(cats) => cats,
            Err(e) => {
                warn!("category read failed, returning empty list: {e}");
                Vec::new()
            }
        }
    }

    fn query_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, is_default, created_at FROM categories ORDER BY name",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Rename in place. The id stays what the original name derived.
    pub(crate) fn update_category(&self, id: &str, name: &str) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| dup_key(e, "category", name))?;
        if updated == 0 {
            return Err(StoreError::NotFound("category", id.to_string()));
        }
        Ok(())
    }

    /// Remove a category. No cascade: entries keep their label. Missing ids
    /// resolve silently.
    pub(crate) fn delete_category(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Export / import ───────────────────────────────────────

    pub(crate) fn export_data(&self) -> Result<ExportBundle> {
        let groups = self.get_all_groups()?;
        let mut entries = Vec::new();
        for group in &groups {
            entries.extend(self.get_entries_by_group(&group.id)?);
        }
        Ok(ExportBundle {
            groups,
            entries,
            categories: self.query_categories()?,
            exported_at: now_ms(),
        })
    }

    /// Upsert every record in the bundle, all or nothing. Records already in
    /// the store but absent from the bundle are retained.
    pub(crate) fn import_data(&mut self, json: &str) -> Result<()> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidFormat(e.to_string()))?;
        if value.get("groups").is_none() || value.get("entries").is_none() {
            return Err(StoreError::InvalidFormat(
                "missing 'groups' or 'entries'".into(),
            ));
        }
        let bundle: ExportBundle =
            serde_json::from_value(value).map_err(|e| StoreError::InvalidFormat(e.to_string()))?;

        let tx = self.conn.transaction()?;
        for group in &bundle.groups {
            let budgets_json = if group.budgets.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&group.budgets)?)
            };
            tx.execute(
                "INSERT OR REPLACE INTO groups (id, name, created_at, total_expenses, salary, budgets)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    group.id,
                    group.name,
                    group.created_at,
                    group.total_expenses.to_string(),
                    group.salary.map(|s| s.to_string()),
                    budgets_json,
                ],
            )?;
        }
        for entry in &bundle.entries {
            tx.execute(
                "INSERT OR REPLACE INTO entries (id, group_id, description, amount, category, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id,
                    entry.group_id,
                    entry.description,
                    entry.amount.to_string(),
                    entry.category,
                    entry.date,
                    entry.created_at,
                ],
            )?;
        }
        for cat in &bundle.categories {
            tx.execute(
                "INSERT OR REPLACE INTO categories (id, name, is_default, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![cat.id, cat.name, cat.is_default, cat.created_at],
            )?;
        }
        tx.commit()?;
        debug!(
            "imported {} groups, {} entries, {} categories",
            bundle.groups.len(),
            bundle.entries.len(),
            bundle.categories.len(),
        );
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Map a unique-constraint violation to `Duplicate`, pass everything else
/// through.
fn dup_key(err: rusqlite::Error, what: &'static str, id: &str) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Duplicate(what, id.to_string())
        }
        other => StoreError::Db(other),
    }
}

/// Sum the group's entry amounts and store the result. Works on a plain
/// connection or inside a transaction.
fn recompute_total(conn: &Connection, group_id: &str) -> Result<Decimal> {
    let mut stmt = conn.prepare("SELECT amount FROM entries WHERE group_id = ?1")?;
    let rows = stmt.query_map(params![group_id], |row| row.get::<_, String>(0))?;
    let mut total = Decimal::ZERO;
    for amount in rows {
        total += Decimal::from_str(&amount?).unwrap_or_default();
    }
    let updated = conn.execute(
        "UPDATE groups SET total_expenses = ?1 WHERE id = ?2",
        params![total.to_string(), group_id],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound("group", group_id.to_string()));
    }
    Ok(total)
}

fn group_from_row(row: &rusqlite::Row) -> rusqlite::Result<Group> {
    let total: String = row.get(3)?;
    let salary: Option<String> = row.get(4)?;
    let budgets: Option<String> = row.get(5)?;
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        total_expenses: Decimal::from_str(&total).unwrap_or_default(),
        salary: salary.and_then(|s| Decimal::from_str(&s).ok()),
        budgets: budgets
            .and_then(|b| serde_json::from_str(&b).ok())
            .unwrap_or_default(),
    })
}

fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
    let amount: String = row.get(3)?;
    Ok(Entry {
        id: row.get(0)?,
        group_id: row.get(1)?,
        description: row.get(2)?,
        amount: Decimal::from_str(&amount).unwrap_or_default(),
        category: row.get(4)?,
        date: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        is_default: row.get(2)?,
        created_at: row.get(3)?,
    })
}
