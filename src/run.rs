//! Command front end. Each command mirrors one screen of the app: it reads
//! what it needs from the store, folds it, and prints.

mod cli;
mod format;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::analytics::{self, CategoryTotal, Period, Totals, Utilization};
use crate::db::KvBackend;
use crate::models::{Budget, Transaction};
use crate::store::{Collection, RecordStore};

pub(crate) use cli::as_cli;

/// Rows on the home summary.
pub(crate) const RECENT_COUNT: usize = 5;

/// Store access for one command invocation.
///
/// In strict mode storage faults surface as errors. Otherwise reads degrade to
/// their fallback and failed writes are dropped with a warning.
pub(crate) struct Session<'a, B> {
    store: &'a RecordStore<B>,
    strict: bool,
    now: DateTime<Utc>,
}

pub(crate) struct HomeView {
    pub totals: Totals,
    pub recent: Vec<Transaction>,
    pub count: usize,
}

pub(crate) struct ReportView {
    pub period: Period,
    pub totals: Totals,
    pub rollup: Vec<CategoryTotal>,
    pub shares: Vec<(String, rust_decimal::Decimal)>,
}

pub(crate) struct BudgetRow {
    pub budget: Budget,
    pub utilization: Utilization,
}

impl<'a, B: KvBackend> Session<'a, B> {
    pub(crate) fn new(store: &'a RecordStore<B>, strict: bool, now: DateTime<Utc>) -> Self {
        Self { store, strict, now }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub(crate) fn load<T: Collection>(&self) -> Result<Vec<T>> {
        if self.strict {
            Ok(self.store.try_read_all()?)
        } else {
            Ok(self.store.read_all())
        }
    }

    pub(crate) fn add<T: Collection>(&self, record: T) -> Result<()> {
        if self.strict {
            self.store.try_append(record)?;
        } else {
            self.store.append(record);
        }
        Ok(())
    }

    /// Whether a record with `id` was replaced.
    ///
    /// Lenient mode answers from a read taken before the write, so a dropped
    /// write is only visible in the log.
    pub(crate) fn replace<T: Collection>(&self, id: &str, record: T) -> Result<bool> {
        if self.strict {
            return Ok(self.store.try_replace_by_id(id, record)?);
        }
        let found = self.count_matching::<T>(id) > 0;
        self.store.replace_by_id(id, record);
        Ok(found)
    }

    /// How many records with `id` were removed. Same caveat as [`Session::replace`].
    pub(crate) fn remove<T: Collection>(&self, id: &str) -> Result<usize> {
        if self.strict {
            return Ok(self.store.try_remove_by_id::<T>(id)?);
        }
        let found = self.count_matching::<T>(id);
        self.store.remove_by_id::<T>(id);
        Ok(found)
    }

    fn count_matching<T: Collection>(&self, id: &str) -> usize {
        self.store
            .read_all::<T>()
            .iter()
            .filter(|r| r.id() == id)
            .count()
    }

    // ── Screens ───────────────────────────────────────────────

    pub(crate) fn home(&self) -> Result<HomeView> {
        let txns: Vec<Transaction> = self.load()?;
        Ok(HomeView {
            totals: analytics::totals(&txns),
            recent: analytics::recent(&txns, RECENT_COUNT),
            count: txns.len(),
        })
    }

    pub(crate) fn history(&self) -> Result<Vec<Transaction>> {
        let mut txns: Vec<Transaction> = self.load()?;
        analytics::sort_by_recency(&mut txns);
        Ok(txns)
    }

    pub(crate) fn report(&self, period: Period) -> Result<ReportView> {
        let txns = period.filter(&self.load::<Transaction>()?, self.now);
        let rollup = analytics::category_rollup(&txns);
        let shares = analytics::category_shares(&rollup);
        Ok(ReportView {
            period,
            totals: analytics::totals(&txns),
            rollup,
            shares,
        })
    }

    pub(crate) fn budgets(&self) -> Result<Vec<BudgetRow>> {
        Ok(self
            .load::<Budget>()?
            .into_iter()
            .map(|budget| BudgetRow {
                utilization: analytics::budget_utilization(&budget),
                budget,
            })
            .collect())
    }
}
