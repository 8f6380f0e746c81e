//! Pure, stateless transforms from store collections to display-ready lists.
//! Everything here recomputes from the current snapshot on each call; there is
//! no caching or invalidation.

use std::collections::HashMap;

use chrono::{Local, NaiveDate, TimeZone};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{Category, Entry, Group};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntrySort {
    Date,
    Amount,
    Name,
    Category,
}

impl EntrySort {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(Self::Date),
            "amount" => Some(Self::Amount),
            "name" => Some(Self::Name),
            "category" => Some(Self::Category),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Name => "name",
            Self::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupSort {
    Name,
    Month,
}

impl GroupSort {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Month => "month",
        }
    }
}

/// Active sort key and direction for a list view.
///
/// Toggling the active key flips direction; selecting a new key resets to
/// descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SortState<K: PartialEq + Copy> {
    pub(crate) key: K,
    pub(crate) ascending: bool,
}

impl<K: PartialEq + Copy> SortState<K> {
    pub(crate) fn new(key: K) -> Self {
        Self {
            key,
            ascending: false,
        }
    }

    pub(crate) fn toggle(&mut self, key: K) {
        if self.key == key {
            self.ascending = !self.ascending;
        } else {
            self.key = key;
            self.ascending = false;
        }
    }
}

/// Case-insensitive description search plus sort. Equal keys fall back to id
/// order so the result is deterministic.
pub(crate) fn filter_entries(
    entries: &[Entry],
    search: &str,
    sort: EntrySort,
    ascending: bool,
) -> Vec<Entry> {
    let term = search.trim().to_lowercase();
    let mut result: Vec<Entry> = entries
        .iter()
        .filter(|e| term.is_empty() || e.description.to_lowercase().contains(&term))
        .cloned()
        .collect();

    result.sort_by(|a, b| {
        let ord = match sort {
            EntrySort::Name => a.description.cmp(&b.description),
            EntrySort::Amount => a.amount.cmp(&b.amount),
            EntrySort::Category => a.category.cmp(&b.category),
            EntrySort::Date => a.date.cmp(&b.date),
        };
        let ord = if ascending { ord } else { ord.reverse() };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    result
}

/// Group list search and sort. `Month` parses the group id as a "YYYY-MM" key
/// and falls back to name comparison when either side does not parse.
pub(crate) fn filter_groups(
    groups: &[Group],
    search: &str,
    sort: GroupSort,
    ascending: bool,
) -> Vec<Group> {
    let term = search.trim().to_lowercase();
    let mut result: Vec<Group> = groups
        .iter()
        .filter(|g| term.is_empty() || g.name.to_lowercase().contains(&term))
        .cloned()
        .collect();

    result.sort_by(|a, b| {
        let ord = match sort {
            GroupSort::Name => a.name.cmp(&b.name),
            GroupSort::Month => match (month_key(a), month_key(b)) {
                (Some(ma), Some(mb)) => ma.cmp(&mb),
                _ => a.name.cmp(&b.name),
            },
        };
        let ord = if ascending { ord } else { ord.reverse() };
        ord.then_with(|| a.id.cmp(&b.id))
    });
    result
}

fn month_key(group: &Group) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", group.id), "%Y-%m-%d").ok()
}

/// One bucket of the daily spending series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DailySpend {
    pub(crate) label: String,
    pub(crate) total: Decimal,
}

/// Bucket entries by local calendar day, chronologically ascending.
pub(crate) fn daily_spending(entries: &[Entry]) -> Vec<DailySpend> {
    let mut buckets: HashMap<NaiveDate, Decimal> = HashMap::new();
    for entry in entries {
        if let Some(day) = local_day(entry.date) {
            *buckets.entry(day).or_default() += entry.amount;
        }
    }

    let mut days: Vec<(NaiveDate, Decimal)> = buckets.into_iter().collect();
    days.sort_by_key(|(day, _)| *day);
    days.into_iter()
        .map(|(day, total)| DailySpend {
            label: day.format("%b %-d, %Y").to_string(),
            total,
        })
        .collect()
}

fn local_day(ms: i64) -> Option<NaiveDate> {
    Local.timestamp_millis_opt(ms).single().map(|dt| dt.date_naive())
}

/// One bucket of the per-category spending series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategorySpend {
    pub(crate) name: String,
    pub(crate) total: Decimal,
}

/// Bucket entries by category name (empty -> "Uncategorized"), biggest spend
/// first.
pub(crate) fn category_spending(entries: &[Entry]) -> Vec<CategorySpend> {
    let mut buckets: HashMap<&str, Decimal> = HashMap::new();
    for entry in entries {
        *buckets.entry(entry.category_label()).or_default() += entry.amount;
    }

    let mut result: Vec<CategorySpend> = buckets
        .into_iter()
        .map(|(name, total)| CategorySpend {
            name: name.to_string(),
            total,
        })
        .collect();
    result.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetLevel {
    Normal,
    Warning,
    Danger,
}

impl BudgetLevel {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "ok",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Budget-vs-spend line for one category.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryBudget {
    pub(crate) name: String,
    pub(crate) spent: Decimal,
    /// Zero when no ceiling is configured.
    pub(crate) budget: Decimal,
    /// spent / budget * 100; zero when the budget is zero.
    pub(crate) percent: f64,
    pub(crate) level: BudgetLevel,
}

/// Status for the union of defined categories and categories that appear in
/// spending, name ascending.
pub(crate) fn budget_status(
    group: &Group,
    entries: &[Entry],
    categories: &[Category],
) -> Vec<CategoryBudget> {
    let mut spending: HashMap<String, Decimal> = HashMap::new();
    for entry in entries {
        *spending
            .entry(entry.category_label().to_string())
            .or_default() += entry.amount;
    }

    let mut names: Vec<String> = categories
        .iter()
        .map(|c| c.name.clone())
        .chain(spending.keys().cloned())
        .collect();
    names.sort();
    names.dedup();

    names
        .into_iter()
        .map(|name| {
            let spent = spending.get(&name).copied().unwrap_or_default();
            let budget = group.budgets.get(&name).copied().unwrap_or_default();
            let percent = if budget > Decimal::ZERO {
                (spent / budget * Decimal::ONE_HUNDRED)
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            let level = if percent > 100.0 {
                BudgetLevel::Danger
            } else if percent > 75.0 {
                BudgetLevel::Warning
            } else {
                BudgetLevel::Normal
            };
            CategoryBudget {
                name,
                spent,
                budget,
                percent,
                level,
            }
        })
        .collect()
}

/// Salary left after the group's recorded spending.
pub(crate) fn remaining_salary(group: &Group) -> Decimal {
    group.salary.unwrap_or_default() - group.total_expenses
}
