#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;

// ── Group ─────────────────────────────────────────────────────

#[test]
fn test_group_new_defaults() {
    let group = Group::new("2024-01".into(), "January".into(), 1_700_000_000_000);
    assert_eq!(group.id, "2024-01");
    assert_eq!(group.name, "January");
    assert_eq!(group.total_expenses, rust_decimal::Decimal::ZERO);
    assert!(group.salary.is_none());
    assert!(group.budgets.is_empty());
}

#[test]
fn test_current_month_key_shape() {
    let key = Group::current_month_key();
    // "YYYY-MM"
    assert_eq!(key.len(), 7);
    assert_eq!(key.as_bytes()[4], b'-');
    assert!(key[..4].chars().all(|c| c.is_ascii_digit()));
    assert!(key[5..].chars().all(|c| c.is_ascii_digit()));
}

// ── Entry ─────────────────────────────────────────────────────

fn make_entry(category: &str) -> Entry {
    Entry {
        id: "e1".into(),
        group_id: "2024-01".into(),
        description: "Lunch".into(),
        amount: dec!(120.50),
        category: category.into(),
        date: 1_700_000_000_000,
        created_at: 1_700_000_000_000,
    }
}

#[test]
fn test_entry_category_label() {
    assert_eq!(make_entry("Shopping").category_label(), "Shopping");
    assert_eq!(make_entry("").category_label(), "Uncategorized");
    assert_eq!(make_entry("   ").category_label(), "Uncategorized");
}

#[test]
fn test_entry_is_uncategorized() {
    assert!(make_entry("").is_uncategorized());
    assert!(!make_entry("Health").is_uncategorized());
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_slug() {
    assert_eq!(Category::slug("Outside Food"), "outside-food");
    assert_eq!(Category::slug("Recharge & Bills"), "recharge-&-bills");
    assert_eq!(Category::slug("Shopping"), "shopping");
    assert_eq!(Category::slug("  Vegetables   &  Fruits "), "vegetables-&-fruits");
}

#[test]
fn test_category_new_derives_id() {
    let cat = Category::new("Non-Veg Items".into(), true, 0);
    assert_eq!(cat.id, "non-veg-items");
    assert_eq!(cat.name, "Non-Veg Items");
    assert!(cat.is_default);
}

// ── ExportBundle ──────────────────────────────────────────────

#[test]
fn test_bundle_serializes_camel_case() {
    let mut group = Group::new("2024-01".into(), "January".into(), 42);
    group.salary = Some(dec!(50000));
    group.budgets.insert("Shopping".into(), dec!(2000));
    let bundle = ExportBundle {
        groups: vec![group],
        entries: vec![make_entry("Shopping")],
        categories: vec![Category::new("Shopping".into(), true, 42)],
        exported_at: 99,
    };

    let json = serde_json::to_string(&bundle).unwrap();
    assert!(json.contains("\"exportedAt\":99"));
    assert!(json.contains("\"createdAt\":42"));
    assert!(json.contains("\"totalExpenses\""));
    assert!(json.contains("\"groupId\":\"2024-01\""));
    assert!(json.contains("\"isDefault\":true"));
}

#[test]
fn test_bundle_optional_fields_default_on_import() {
    let json = r#"{"groups":[],"entries":[]}"#;
    let bundle: ExportBundle = serde_json::from_str(json).unwrap();
    assert!(bundle.categories.is_empty());
    assert_eq!(bundle.exported_at, 0);
}

#[test]
fn test_bundle_requires_groups_and_entries() {
    assert!(serde_json::from_str::<ExportBundle>(r#"{"entries":[]}"#).is_err());
    assert!(serde_json::from_str::<ExportBundle>(r#"{"groups":[]}"#).is_err());
}

#[test]
fn test_group_without_salary_omits_field() {
    let group = Group::new("2024-02".into(), "February".into(), 0);
    let json = serde_json::to_string(&group).unwrap();
    assert!(!json.contains("salary"));
    assert!(!json.contains("budgets"));
}
