use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::format::{format_amount, format_entry, format_percent, progress_bar, truncate};
use super::Session;
use crate::analytics::Period;
use crate::db::KvBackend;
use crate::models::{
    new_id, Budget, Category, EntryType, NewBudget, NewTransaction, Transaction,
};

const FLAGS_WITH_VALUES: &[&str] = &["--date", "--icon", "--color", "--spent"];

pub(crate) fn as_cli<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let Some(command) = args.first() else {
        return cli_summary(session);
    };
    let rest = &args[1..];
    match command.as_str() {
        "summary" | "s" => cli_summary(session),
        "list" | "ls" => cli_list(session),
        "add" => cli_add(rest, session),
        "delete" | "rm" => cli_delete(rest, session),
        "categories" | "cats" => cli_categories(rest, session),
        "add-category" => cli_add_category(rest, session),
        "budgets" | "b" => cli_budgets(session),
        "add-budget" => cli_add_budget(rest, session),
        "set-budget" => cli_set_budget(rest, session),
        "report" | "r" => cli_report(rest, session),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("budgetbook - personal budget tracker");
    println!();
    println!("Usage: budgetbook [command]");
    println!();
    println!("Commands:");
    println!("  summary                                   Balance and five most recent transactions (default)");
    println!("  list                                      All transactions, most recent first");
    println!("  add <income|expense> <amount> <category> <description...>");
    println!("    --date <YYYY-MM-DD>                     Transaction date (default: now)");
    println!("  delete <id>                               Delete a transaction");
    println!("  categories [income|expense]               List categories");
    println!("  add-category <income|expense> <name>      Add a category");
    println!("    --icon <name> --color <#RRGGBB>");
    println!("  budgets                                   Budgets with utilization");
    println!("  add-budget <name> <category> <limit>      Add a budget");
    println!("    --spent <amount>                        Amount already spent (default: 0)");
    println!("  set-budget <id> <name> <category> <limit> <spent>");
    println!("                                            Replace a budget");
    println!("  report [week|month|year|all]              Income vs expense and spending by category");
    println!("  --help, -h                                Show this help");
    println!("  --version, -V                             Show version");
    println!();
    println!("Environment: BUDGETBOOK_DB, BUDGETBOOK_LOG, BUDGETBOOK_STRICT");
}

// ── Argument helpers ──────────────────────────────────────────

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if FLAGS_WITH_VALUES.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s.trim_start_matches('$')).with_context(|| format!("Invalid amount: {s}"))
}

fn parse_entry_type(s: &str) -> Result<EntryType> {
    EntryType::parse(s).ok_or_else(|| {
        let names: Vec<&str> = EntryType::all().iter().map(|t| t.as_str()).collect();
        anyhow::anyhow!("Expected one of {}, got '{s}'", names.join(", "))
    })
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {s}"))?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn print_transaction(txn: &Transaction) {
    println!(
        "{:<14} {:<10} {:<28} {:<14} {:>14}",
        txn.id,
        txn.date.format("%Y-%m-%d"),
        truncate(&txn.description, 28),
        truncate(&txn.category, 14),
        format_entry(txn),
    );
}

// ── Home ──────────────────────────────────────────────────────

fn cli_summary<B: KvBackend>(session: &Session<'_, B>) -> Result<()> {
    let home = session.home()?;

    println!("Total Balance: {}", format_amount(home.totals.balance));
    println!("{}", "─".repeat(40));
    println!("  Income:    {}", format_amount(home.totals.income));
    println!("  Expenses:  {}", format_amount(home.totals.expense));
    println!();

    if home.recent.is_empty() {
        println!("No transactions yet. Add one with `budgetbook add`.");
        return Ok(());
    }
    println!("Recent Transactions ({} of {}):", home.recent.len(), home.count);
    for txn in &home.recent {
        print_transaction(txn);
    }
    Ok(())
}

fn cli_list<B: KvBackend>(session: &Session<'_, B>) -> Result<()> {
    let txns = session.history()?;
    if txns.is_empty() {
        println!("No transactions");
        return Ok(());
    }
    println!(
        "{:<14} {:<10} {:<28} {:<14} {:>14}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    println!("{}", "─".repeat(84));
    for txn in &txns {
        print_transaction(txn);
    }
    Ok(())
}

fn cli_delete<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let Some(&id) = positionals(args).first() else {
        anyhow::bail!("Usage: budgetbook delete <id>");
    };
    match session.remove::<Transaction>(id)? {
        0 => println!("No transaction with id {id}"),
        1 => println!("Deleted transaction {id}"),
        n => println!("Deleted {n} transactions with id {id}"),
    }
    Ok(())
}

// ── Add transaction ───────────────────────────────────────────

fn cli_add<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let pos = positionals(args);
    if pos.len() < 4 {
        anyhow::bail!(
            "Usage: budgetbook add <income|expense> <amount> <category> <description...> [--date YYYY-MM-DD]"
        );
    }
    let kind = parse_entry_type(pos[0])?;
    let amount = parse_amount(pos[1])?;
    let date = match flag_value(args, "--date") {
        Some(d) => parse_date(d)?,
        None => session.now(),
    };

    let categories: Vec<Category> = session.load()?;
    let choices = Category::of_type(&categories, kind);
    let category = choices
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(pos[2]))
        .map(|c| c.name.clone())
        .ok_or_else(|| {
            let names: Vec<&str> = choices.iter().map(|c| c.name.as_str()).collect();
            anyhow::anyhow!(
                "Unknown {kind} category '{}'. Choose one of: {}",
                pos[2],
                names.join(", ")
            )
        })?;

    let txn = NewTransaction {
        kind,
        amount,
        description: pos[3..].join(" "),
        category: Some(category),
        date,
    }
    .validate(new_id())?;

    let message = format!(
        "Added {} {} ({}) on {} [id {}]",
        kind,
        format_amount(txn.amount),
        txn.category,
        txn.date.format("%Y-%m-%d"),
        txn.id
    );
    session.add(txn)?;
    println!("{message}");
    Ok(())
}

// ── Categories ────────────────────────────────────────────────

fn cli_categories<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let categories: Vec<Category> = session.load()?;
    let shown: Vec<&Category> = match positionals(args).first() {
        Some(kind) => Category::of_type(&categories, parse_entry_type(kind)?),
        None => categories.iter().collect(),
    };

    println!("{:<4} {:<16} {:<8} {:<16} Color", "ID", "Name", "Type", "Icon");
    println!("{}", "─".repeat(56));
    for cat in shown {
        println!(
            "{:<4} {:<16} {:<8} {:<16} {}",
            cat.id, cat.name, cat.kind, cat.icon, cat.color
        );
    }
    Ok(())
}

fn cli_add_category<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let pos = positionals(args);
    if pos.len() < 2 {
        anyhow::bail!("Usage: budgetbook add-category <income|expense> <name> [--icon I] [--color C]");
    }
    let kind = parse_entry_type(pos[0])?;
    let name = pos[1..].join(" ");

    let existing: Vec<Category> = session.load()?;
    if Category::find_by_name(&existing, &name).is_some() {
        anyhow::bail!("Category '{name}' already exists");
    }

    let mut category = Category::new(new_id(), &name, kind)?;
    if let Some(icon) = flag_value(args, "--icon") {
        category.icon = icon.to_string();
    }
    if let Some(color) = flag_value(args, "--color") {
        category.color = color.to_string();
    }
    let message = format!("Added {kind} category {} [id {}]", category.name, category.id);
    session.add(category)?;
    println!("{message}");
    Ok(())
}

// ── Budgets ───────────────────────────────────────────────────

fn cli_budgets<B: KvBackend>(session: &Session<'_, B>) -> Result<()> {
    let rows = session.budgets()?;
    if rows.is_empty() {
        println!("No budgets. Add one with `budgetbook add-budget`.");
        return Ok(());
    }
    for row in &rows {
        let b = &row.budget;
        let used = match row.utilization.percentage {
            Some(p) => format!("{} used", format_percent(p)),
            None => "no limit set".to_string(),
        };
        let flag = if row.utilization.over_budget {
            "  OVER BUDGET"
        } else {
            ""
        };
        println!("{} ({}) [id {}]", b.name, b.category, b.id);
        println!(
            "  {} / {}  {} {used}{flag}",
            format_amount(b.spent),
            format_amount(b.limit),
            progress_bar(row.utilization.display_width(), 20),
        );
    }
    Ok(())
}

fn read_budget_fields(pos: &[&str], spent: Decimal) -> Result<NewBudget> {
    let [name, category, limit, ..] = pos else {
        anyhow::bail!("Expected <name> <category> <limit>");
    };
    Ok(NewBudget {
        name: name.to_string(),
        category: category.to_string(),
        limit: parse_amount(limit)?,
        spent,
    })
}

fn cli_add_budget<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let spent = match flag_value(args, "--spent") {
        Some(s) => parse_amount(s)?,
        None => Decimal::ZERO,
    };
    let budget = read_budget_fields(&positionals(args), spent)
        .context("Usage: budgetbook add-budget <name> <category> <limit> [--spent S]")?
        .validate(new_id())?;
    let message = format!(
        "Added budget {} for {} with limit {} [id {}]",
        budget.name,
        budget.category,
        format_amount(budget.limit),
        budget.id
    );
    session.add(budget)?;
    println!("{message}");
    Ok(())
}

fn cli_set_budget<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let pos = positionals(args);
    let [id, fields @ ..] = pos.as_slice() else {
        anyhow::bail!("Usage: budgetbook set-budget <id> <name> <category> <limit> <spent>");
    };
    let Some(spent) = fields.get(3) else {
        anyhow::bail!("Usage: budgetbook set-budget <id> <name> <category> <limit> <spent>");
    };
    let budget: Budget = read_budget_fields(fields, parse_amount(spent)?)?.validate(id.to_string())?;

    if session.replace(id, budget)? {
        println!("Updated budget {id}");
    } else {
        println!("No budget with id {id}");
    }
    Ok(())
}

// ── Reports ───────────────────────────────────────────────────

fn cli_report<B: KvBackend>(args: &[String], session: &Session<'_, B>) -> Result<()> {
    let period = match positionals(args).first() {
        Some(p) => Period::parse(p)
            .ok_or_else(|| anyhow::anyhow!("Unknown period '{p}' (week, month, year, all)"))?,
        None => Period::Month,
    };
    let report = session.report(period)?;

    println!("Report: {}", report.period.as_str());
    println!("{}", "─".repeat(40));
    println!("  Income:    {}", format_amount(report.totals.income));
    println!("  Expenses:  {}", format_amount(report.totals.expense));
    println!("  Net:       {}", format_amount(report.totals.balance));

    if report.rollup.is_empty() {
        println!();
        println!("No expenses in this period");
        return Ok(());
    }
    println!();
    println!("Spending by Category:");
    for (entry, (_, share)) in report.rollup.iter().zip(&report.shares) {
        println!(
            "  {:<16} {:>12}  {:>6}",
            entry.category,
            format_amount(entry.amount),
            format_percent(*share)
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
