//! Pure folds over in-memory collections. Nothing here touches storage.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{Budget, EntryType, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Sums saturate at `Decimal::MAX` instead of overflowing.
pub(crate) fn totals(txns: &[Transaction]) -> Totals {
    let (income, expense) = txns
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| match t.kind {
            EntryType::Income => (inc.saturating_add(t.amount), exp),
            EntryType::Expense => (inc, exp.saturating_add(t.amount)),
        });
    Totals {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
}

/// Expense totals per category name, in order of first appearance.
/// Categories without expenses are absent rather than zero.
pub(crate) fn category_rollup(txns: &[Transaction]) -> Vec<CategoryTotal> {
    let mut rollup: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for t in txns.iter().filter(|t| t.is_expense()) {
        match index.get(t.category.as_str()) {
            Some(&i) => {
                if let Some(entry) = rollup.get_mut(i) {
                    entry.amount = entry.amount.saturating_add(t.amount);
                }
            }
            None => {
                index.insert(&t.category, rollup.len());
                rollup.push(CategoryTotal {
                    category: t.category.clone(),
                    amount: t.amount,
                });
            }
        }
    }
    rollup
}

/// Each entry's share of the rollup total, in percent. Empty when there is nothing spent.
pub(crate) fn category_shares(rollup: &[CategoryTotal]) -> Vec<(String, Decimal)> {
    let total = rollup
        .iter()
        .fold(Decimal::ZERO, |acc, c| acc.saturating_add(c.amount));
    if total <= Decimal::ZERO {
        return Vec::new();
    }
    rollup
        .iter()
        .map(|c| {
            // Divide first: the ratio is at most 1, so scaling it cannot overflow.
            let share = c
                .amount
                .checked_div(total)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map_or(Decimal::ZERO, |pct| pct.round_dp(1));
            (c.category.clone(), share)
        })
        .collect()
}

/// Most recent first. Transactions on the same instant keep their stored order.
pub(crate) fn sort_by_recency(txns: &mut [Transaction]) {
    txns.sort_by(|a, b| b.date.cmp(&a.date));
}

pub(crate) fn recent(txns: &[Transaction], n: usize) -> Vec<Transaction> {
    let mut sorted = txns.to_vec();
    sort_by_recency(&mut sorted);
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Period {
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "week" | "w" => Some(Self::Week),
            "month" | "m" => Some(Self::Month),
            "year" | "y" => Some(Self::Year),
            "all" | "a" => Some(Self::All),
            _ => None,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    fn days(&self) -> Option<i64> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::Year => Some(365),
            Self::All => None,
        }
    }

    /// Transactions dated within the trailing window that ends at `now`.
    pub(crate) fn filter(&self, txns: &[Transaction], now: DateTime<Utc>) -> Vec<Transaction> {
        let Some(days) = self.days() else {
            return txns.to_vec();
        };
        let start = now - Duration::days(days);
        txns.iter()
            .filter(|t| t.date >= start && t.date <= now)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Utilization {
    /// `100 * spent / limit`, unclamped. `None` when the limit is not positive.
    pub percentage: Option<Decimal>,
    pub over_budget: bool,
}

impl Utilization {
    /// Progress bar fill in percent, capped at 100.
    pub(crate) fn display_width(&self) -> Decimal {
        match self.percentage {
            Some(p) => p.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
            None if self.over_budget => Decimal::ONE_HUNDRED,
            None => Decimal::ZERO,
        }
    }
}

pub(crate) fn utilization(spent: Decimal, limit: Decimal) -> Utilization {
    let percentage = if limit > Decimal::ZERO {
        spent
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(limit))
    } else {
        None
    };
    let over_budget = match percentage {
        Some(p) => p > Decimal::ONE_HUNDRED,
        None => spent > Decimal::ZERO,
    };
    Utilization {
        percentage,
        over_budget,
    }
}

pub(crate) fn budget_utilization(budget: &Budget) -> Utilization {
    utilization(budget.spent, budget.limit)
}
