use anyhow::{Context, Result};
use chrono::TimeZone;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::db::Store;
use crate::models::EntryPatch;
use crate::scan::{self, ScannedCode};
use crate::views;

pub(crate) fn run(args: &[String], store: &mut Store) -> Result<()> {
    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "groups" => cmd_groups(&args[2..], store),
        "group" => cmd_group(&args[2..], store),
        "add" => cmd_add(&args[2..], store),
        "entries" => cmd_entries(&args[2..], store),
        "entry" => cmd_entry(&args[2..], store),
        "budget" => cmd_budget(&args[2..], store),
        "summary" => cmd_summary(&args[2..], store),
        "categories" => cmd_categories(store),
        "category" => cmd_category(&args[2..], store),
        "export" => cmd_export(&args[2..], store),
        "import" => cmd_import(&args[2..], store),
        "scan" => cmd_scan(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("spendlog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Spendlog — local-only personal expense tracker");
    println!();
    println!("Usage: spendlog <command>");
    println!();
    println!("Commands:");
    println!("  groups [--search <t>] [--sort name|month] [--asc]");
    println!("                                List monthly groups");
    println!("  group add <name> [--month <YYYY-MM>]");
    println!("                                Create a group (defaults to current month)");
    println!("  group rm <id>                 Delete a group and all its entries");
    println!("  group recalc <id>             Re-derive a group's stored total");
    println!("  add <group> <desc> <amount> [--category <c>] [--date <YYYY-MM-DD>]");
    println!("                                Record an expense");
    println!("  entries <group> [--search <t>] [--sort date|amount|name|category] [--asc]");
    println!("                                List a group's entries");
    println!("  entry show <id>               Show one entry");
    println!("  entry edit <id> [--desc <d>] [--amount <n>] [--category <c>] [--date <d>]");
    println!("  entry rm <id>                 Delete an entry");
    println!("  budget <group> [--salary <n>] [--set <Category=Amount>]...");
    println!("                                Show or update budgets for a group");
    println!("  summary <group>               Spending breakdown and budget status");
    println!("  categories                    List categories");
    println!("  category add <name>");
    println!("  category rename <id> <name>");
    println!("  category rm <id>");
    println!("  export [path]                 Write a JSON backup of the whole store");
    println!("  import <file.json>            Merge a JSON backup into the store");
    println!("  scan <decoded-text>           Interpret text decoded from a QR code");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
}

// ── Groups ────────────────────────────────────────────────────

fn cmd_groups(args: &[String], store: &mut Store) -> Result<()> {
    let search = flag(args, "--search").unwrap_or("");
    let sort = flag(args, "--sort")
        .map(|s| views::GroupSort::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown sort: {s}")))
        .transpose()?;
    let groups = store.get_all_groups()?;
    let groups = match sort {
        Some(sort) => views::filter_groups(&groups, search, sort, has_flag(args, "--asc")),
        // Default: newest month first.
        None => views::filter_groups(&groups, search, views::GroupSort::Month, false),
    };

    if groups.is_empty() {
        println!("No groups");
        return Ok(());
    }

    if let Some(sort) = sort {
        println!(
            "Groups — sort: {} {}",
            sort.as_str(),
            if has_flag(args, "--asc") {
                "ascending"
            } else {
                "descending"
            }
        );
    }
    println!("{:<10} {:<24} {:>14} {:>14}", "ID", "Name", "Total", "Salary");
    println!("{}", "─".repeat(66));
    for group in &groups {
        let salary = group
            .salary
            .map(format_amount)
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{:<10} {:<24} {:>14} {:>14}",
            group.id,
            truncate(&group.name, 24),
            format_amount(group.total_expenses),
            salary,
        );
    }
    Ok(())
}

fn cmd_group(args: &[String], store: &mut Store) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            let name = args
                .get(1)
                .filter(|a| !a.starts_with('-'))
                .context("Usage: spendlog group add <name> [--month <YYYY-MM>]")?;
            let group = store.create_group(name, flag(args, "--month"))?;
            println!("Created group {} ({})", group.id, group.name);
            Ok(())
        }
        Some("rm") => {
            let id = args.get(1).context("Usage: spendlog group rm <id>")?;
            store.delete_group(id)?;
            println!("Deleted group {id} and its entries");
            Ok(())
        }
        Some("recalc") => {
            let id = args.get(1).context("Usage: spendlog group recalc <id>")?;
            let total = store.update_group_total(id)?;
            println!("Recomputed total for {id}: {}", format_amount(total));
            Ok(())
        }
        _ => anyhow::bail!("Usage: spendlog group add|rm|recalc ..."),
    }
}

// ── Entries ───────────────────────────────────────────────────

fn cmd_add(args: &[String], store: &mut Store) -> Result<()> {
    if args.len() < 3 {
        anyhow::bail!(
            "Usage: spendlog add <group> <desc> <amount> [--category <c>] [--date <YYYY-MM-DD>]"
        );
    }
    let amount = parse_amount(&args[2])?;
    let date = flag(args, "--date").map(parse_date).transpose()?;
    let entry = store.create_entry(
        &args[0],
        &args[1],
        amount,
        flag(args, "--category").unwrap_or(""),
        date,
    )?;
    // create_entry already recomputed the total; just read it back.
    let group = store
        .get_group(&entry.group_id)?
        .with_context(|| format!("Group not found: {}", entry.group_id))?;
    println!(
        "Added {} for {} — group total now {}",
        entry.description,
        format_amount(entry.amount),
        format_amount(group.total_expenses),
    );
    Ok(())
}

fn cmd_entries(args: &[String], store: &mut Store) -> Result<()> {
    let group_id = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .context("Usage: spendlog entries <group> [--search <t>] [--sort <key>] [--asc]")?;
    let search = flag(args, "--search").unwrap_or("");
    let sort = match flag(args, "--sort") {
        Some(s) => views::EntrySort::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown sort: {s}"))?,
        None => views::EntrySort::Date,
    };

    // Descending by default; --asc flips the chosen key.
    let mut state = views::SortState::new(sort);
    if has_flag(args, "--asc") {
        state.toggle(sort);
    }
    let entries = store.get_entries_by_group(group_id)?;
    let entries = views::filter_entries(&entries, search, state.key, state.ascending);

    if entries.is_empty() {
        println!("No entries");
        return Ok(());
    }

    println!(
        "Entries in {group_id} — sort: {} {}",
        sort.as_str(),
        if state.ascending {
            "ascending"
        } else {
            "descending"
        }
    );
    println!(
        "{:<38} {:<13} {:<28} {:<18} {:>12}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    println!("{}", "─".repeat(112));
    for entry in &entries {
        println!(
            "{:<38} {:<13} {:<28} {:<18} {:>12}",
            entry.id,
            format_day(entry.date),
            truncate(&entry.description, 28),
            truncate(entry.category_label(), 18),
            format_amount(entry.amount),
        );
    }
    Ok(())
}

fn cmd_entry(args: &[String], store: &mut Store) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("show") => {
            let id = args.get(1).context("Usage: spendlog entry show <id>")?;
            let entry = store
                .get_entry(id)?
                .with_context(|| format!("Entry not found: {id}"))?;
            println!("{:<12} {}", "Group:", entry.group_id);
            println!("{:<12} {}", "Description:", entry.description);
            println!("{:<12} {}", "Amount:", format_amount(entry.amount));
            println!("{:<12} {}", "Category:", entry.category_label());
            println!("{:<12} {}", "Date:", format_day(entry.date));
            Ok(())
        }
        Some("edit") => {
            let id = args.get(1).context("Usage: spendlog entry edit <id> ...")?;
            let patch = EntryPatch {
                description: flag(args, "--desc").map(str::to_string),
                amount: flag(args, "--amount").map(parse_amount).transpose()?,
                category: flag(args, "--category").map(str::to_string),
                date: flag(args, "--date").map(parse_date).transpose()?,
            };
            let entry = store.update_entry(id, &patch)?;
            println!(
                "Updated {}: {} {}",
                entry.id,
                entry.description,
                format_amount(entry.amount)
            );
            Ok(())
        }
        Some("rm") => {
            let id = args.get(1).context("Usage: spendlog entry rm <id>")?;
            store.delete_entry(id, true)?;
            println!("Deleted entry {id}");
            Ok(())
        }
        _ => anyhow::bail!("Usage: spendlog entry show|edit|rm ..."),
    }
}

// ── Budgets & summary ─────────────────────────────────────────

fn cmd_budget(args: &[String], store: &mut Store) -> Result<()> {
    let group_id = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .context("Usage: spendlog budget <group> [--salary <n>] [--set <Category=Amount>]...")?;
    let group = store
        .get_group(group_id)?
        .with_context(|| format!("Group not found: {group_id}"))?;

    let salary = flag(args, "--salary").map(parse_amount).transpose()?;
    let sets = collect_sets(args)?;

    if salary.is_some() || !sets.is_empty() {
        let mut budgets = group.budgets.clone();
        for (name, amount) in sets {
            if amount > Decimal::ZERO {
                budgets.insert(name, amount);
            } else {
                budgets.remove(&name);
            }
        }
        store.update_group_budget(group_id, salary.or(group.salary), &budgets)?;
    }

    let group = store
        .get_group(group_id)?
        .with_context(|| format!("Group not found: {group_id}"))?;
    let entries = store.get_entries_by_group(group_id)?;
    let categories = store.get_categories();

    println!("Budget — {} ({})", group.name, group.id);
    if let Some(salary) = group.salary {
        println!(
            "  Salary: {}   Spent: {}   Remaining: {}",
            format_amount(salary),
            format_amount(group.total_expenses),
            format_amount(views::remaining_salary(&group)),
        );
    }
    println!();
    println!(
        "{:<22} {:>12} {:>12} {:>8}  Status",
        "Category", "Spent", "Budget", "%"
    );
    println!("{}", "─".repeat(66));
    for line in views::budget_status(&group, &entries, &categories) {
        println!(
            "{:<22} {:>12} {:>12} {:>7.0}%  {}",
            truncate(&line.name, 22),
            format_amount(line.spent),
            format_amount(line.budget),
            line.percent,
            line.level.as_str(),
        );
    }
    Ok(())
}

/// Parse repeated `--set Category=Amount` flags.
fn collect_sets(args: &[String]) -> Result<Vec<(String, Decimal)>> {
    let mut sets = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--set" {
            let pair = args
                .get(i + 1)
                .context("--set expects <Category=Amount>")?;
            let (name, amount) = pair
                .split_once('=')
                .with_context(|| format!("Bad --set value (expected Category=Amount): {pair}"))?;
            sets.push((name.to_string(), parse_amount(amount)?));
            i += 2;
        } else {
            i += 1;
        }
    }
    Ok(sets)
}

fn cmd_summary(args: &[String], store: &mut Store) -> Result<()> {
    let group_id = args.first().context("Usage: spendlog summary <group>")?;
    let group = store
        .get_group(group_id)?
        .with_context(|| format!("Group not found: {group_id}"))?;
    let entries = store.get_entries_by_group(group_id)?;

    println!("{} ({}) — {} entries", group.name, group.id, entries.len());
    println!("  Total spent: {}", format_amount(group.total_expenses));
    if let Some(salary) = group.salary {
        println!("  Salary:      {}", format_amount(salary));
        println!(
            "  Remaining:   {}",
            format_amount(views::remaining_salary(&group))
        );
    }

    let daily = views::daily_spending(&entries);
    if !daily.is_empty() {
        println!();
        println!("Daily spending:");
        for bucket in &daily {
            println!("  {:<14} {:>12}", bucket.label, format_amount(bucket.total));
        }
    }

    let by_category = views::category_spending(&entries);
    if !by_category.is_empty() {
        println!();
        println!("Spending by category:");
        for bucket in &by_category {
            println!(
                "  {:<22} {:>12}",
                truncate(&bucket.name, 22),
                format_amount(bucket.total)
            );
        }
    }
    Ok(())
}

// ── Categories ────────────────────────────────────────────────

fn cmd_categories(store: &mut Store) -> Result<()> {
    let cats = store.get_categories();
    if cats.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<24} {:<24} Default", "ID", "Name");
    println!("{}", "─".repeat(56));
    for cat in &cats {
        println!(
            "{:<24} {:<24} {}",
            cat.id,
            truncate(&cat.name, 24),
            if cat.is_default { "yes" } else { "" }
        );
    }
    Ok(())
}

fn cmd_category(args: &[String], store: &mut Store) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            let name = args.get(1).context("Usage: spendlog category add <name>")?;
            let cat = store.create_category(name, false)?;
            println!("Created category {} ({})", cat.name, cat.id);
            Ok(())
        }
        Some("rename") => {
            let id = args
                .get(1)
                .context("Usage: spendlog category rename <id> <name>")?;
            let name = args
                .get(2)
                .context("Usage: spendlog category rename <id> <name>")?;
            store.update_category(id, name)?;
            println!("Renamed {id} to {name}");
            Ok(())
        }
        Some("rm") => {
            let id = args.get(1).context("Usage: spendlog category rm <id>")?;
            store.delete_category(id)?;
            println!("Deleted category {id}");
            Ok(())
        }
        _ => anyhow::bail!("Usage: spendlog category add|rename|rm ..."),
    }
}

// ── Export / import / scan ────────────────────────────────────

fn cmd_export(args: &[String], store: &mut Store) -> Result<()> {
    let path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            let today = chrono::Local::now().format("%Y-%m-%d");
            format!("{home}/spendlog-backup-{today}.json")
        });

    let bundle = store.export_data()?;
    let json = serde_json::to_string_pretty(&bundle)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {path}"))?;
    println!(
        "Exported {} groups, {} entries, {} categories to {path}",
        bundle.groups.len(),
        bundle.entries.len(),
        bundle.categories.len(),
    );
    Ok(())
}

fn cmd_import(args: &[String], store: &mut Store) -> Result<()> {
    let path = args.first().context("Usage: spendlog import <file.json>")?;
    let json =
        std::fs::read_to_string(shellexpand(path)).with_context(|| format!("Failed to read {path}"))?;
    store.import_data(&json)?;
    println!("Import complete");
    Ok(())
}

fn cmd_scan(args: &[String]) -> Result<()> {
    let decoded = args.join(" ");
    match scan::classify(&decoded) {
        None => println!("Nothing decoded"),
        Some(ScannedCode::UpiLink(link)) => {
            println!("UPI payment link: {link}");
            println!("Open it with a UPI app to pay.");
        }
        Some(ScannedCode::Text(text)) => {
            println!("Scanned text:");
            println!("{text}");
        }
    }
    Ok(())
}

// ── Parsing & formatting helpers ──────────────────────────────

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim()).with_context(|| format!("Invalid amount: {s}"))
}

/// Parse "YYYY-MM-DD" to epoch ms. Noon local time keeps the entry on the
/// requested day regardless of timezone and DST shifts.
fn parse_date(s: &str) -> Result<i64> {
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {s}"))?;
    let noon = date
        .and_hms_opt(12, 0, 0)
        .with_context(|| format!("Invalid date: {s}"))?;
    let local = chrono::Local
        .from_local_datetime(&noon)
        .single()
        .with_context(|| format!("Ambiguous local time for {s}"))?;
    Ok(local.timestamp_millis())
}

fn format_day(ms: i64) -> String {
    chrono::Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Format a decimal amount with thousand separators and 2 decimal places.
/// e.g. `1234567.89` → `"₹1,234,567.89"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = format!("{abs:.2}");
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    if val < Decimal::ZERO {
        format!("-₹{with_commas}.{dec_part}")
    } else {
        format!("₹{with_commas}.{dec_part}")
    }
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
/// Safe for multi-byte UTF-8 characters.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
