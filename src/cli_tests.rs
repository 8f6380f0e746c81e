#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;

// ── format_amount ─────────────────────────────────────────────

#[test]
fn test_format_plain() {
    assert_eq!(format_amount(dec!(0)), "₹0.00");
    assert_eq!(format_amount(dec!(5)), "₹5.00");
    assert_eq!(format_amount(dec!(42.5)), "₹42.50");
}

#[test]
fn test_format_thousands() {
    assert_eq!(format_amount(dec!(1234.56)), "₹1,234.56");
    assert_eq!(format_amount(dec!(1234567.89)), "₹1,234,567.89");
}

#[test]
fn test_format_negative() {
    assert_eq!(format_amount(dec!(-99.99)), "-₹99.99");
    assert_eq!(format_amount(dec!(-1000)), "-₹1,000.00");
}

#[test]
fn test_format_pads_to_two_places() {
    assert_eq!(format_amount(dec!(1.5)), "₹1.50");
    assert_eq!(format_amount(dec!(10000000.00)), "₹10,000,000.00");
}

// ── truncate ──────────────────────────────────────────────────

#[test]
fn test_truncate_short_string_unchanged() {
    assert_eq!(truncate("hello", 10), "hello");
    assert_eq!(truncate("hello", 5), "hello");
}

#[test]
fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello w…");
    assert_eq!(truncate("abc", 1), "…");
}

#[test]
fn test_truncate_zero_max() {
    assert_eq!(truncate("hello", 0), "");
}

#[test]
fn test_truncate_multibyte() {
    assert_eq!(truncate("दूध और सब्ज़ी", 100), "दूध और सब्ज़ी");
    let cut = truncate("दूध और सब्ज़ी", 4);
    assert_eq!(cut.chars().count(), 4);
    assert!(cut.ends_with('…'));
}

// ── parsing helpers ───────────────────────────────────────────

#[test]
fn test_parse_amount() {
    assert_eq!(parse_amount("80").unwrap(), dec!(80));
    assert_eq!(parse_amount(" 12.50 ").unwrap(), dec!(12.50));
    assert!(parse_amount("abc").is_err());
}

#[test]
fn test_parse_date_round_trips_through_format_day() {
    let ms = parse_date("2024-01-15").unwrap();
    assert_eq!(format_day(ms), "2024-01-15");
    assert!(parse_date("15/01/2024").is_err());
}

#[test]
fn test_flag_lookup() {
    let args: Vec<String> = ["--sort", "amount", "--asc"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(flag(&args, "--sort"), Some("amount"));
    assert_eq!(flag(&args, "--search"), None);
    assert!(has_flag(&args, "--asc"));
    assert!(!has_flag(&args, "--desc"));
}

#[test]
fn test_collect_sets() {
    let args: Vec<String> = ["--salary", "50000", "--set", "Shopping=2000", "--set", "Transport=0"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let sets = collect_sets(&args).unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0], ("Shopping".to_string(), dec!(2000)));
    assert_eq!(sets[1], ("Transport".to_string(), Decimal::ZERO));

    let bad: Vec<String> = ["--set", "Shopping"].iter().map(|s| s.to_string()).collect();
    assert!(collect_sets(&bad).is_err());
}

// ── Command dispatch ──────────────────────────────────────────

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_entries_listing_accepts_sort_flags() {
    let mut store = crate::db::Store::open_in_memory().unwrap();
    store.create_group("January", Some("2024-01")).unwrap();
    store
        .create_entry("2024-01", "Lunch", dec!(120), "", None)
        .unwrap();
    store
        .create_entry("2024-01", "Shoes", dec!(50), "Shopping", None)
        .unwrap();

    cmd_entries(&to_args(&["2024-01", "--sort", "amount", "--asc"]), &mut store).unwrap();
    cmd_entries(&to_args(&["2024-01", "--sort", "amount"]), &mut store).unwrap();
    cmd_entries(&to_args(&["2024-01"]), &mut store).unwrap();
}

#[test]
fn test_add_command_updates_group_total() {
    let mut store = crate::db::Store::open_in_memory().unwrap();
    store.create_group("January", Some("2024-01")).unwrap();

    cmd_add(&to_args(&["2024-01", "Lunch", "120"]), &mut store).unwrap();
    cmd_add(&to_args(&["2024-01", "Shoes", "50", "--category", "Shopping"]), &mut store).unwrap();

    let group = store.get_group("2024-01").unwrap().unwrap();
    assert_eq!(group.total_expenses, dec!(170));
}

#[test]
fn test_group_recalc_reports_total() {
    let mut store = crate::db::Store::open_in_memory().unwrap();
    store.create_group("January", Some("2024-01")).unwrap();
    store
        .create_entry("2024-01", "Lunch", dec!(120), "", None)
        .unwrap();

    cmd_group(&to_args(&["recalc", "2024-01"]), &mut store).unwrap();
    assert!(cmd_group(&to_args(&["recalc", "1999-12"]), &mut store).is_err());
}

#[test]
fn test_shellexpand() {
    std::env::set_var("HOME", "/home/tester");
    assert_eq!(shellexpand("~/backup.json"), "/home/tester/backup.json");
    assert_eq!(shellexpand("/tmp/x.json"), "/tmp/x.json");
}
