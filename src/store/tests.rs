#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use super::*;
use crate::db::SqliteBackend;
use crate::models::EntryType;

/// SQLite backend whose reads or writes can be made to fail like a broken disk.
struct FlakyBackend {
    inner: SqliteBackend,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyBackend {
    fn new() -> Self {
        Self {
            inner: SqliteBackend::open_in_memory().unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

fn io_error() -> BackendError {
    BackendError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
        Some("disk I/O error".into()),
    ))
}

impl KvBackend for FlakyBackend {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(io_error());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io_error());
        }
        self.inner.set(key, value)
    }
}

fn store() -> RecordStore<SqliteBackend> {
    RecordStore::new(SqliteBackend::open_in_memory().unwrap())
}

fn flaky_store() -> RecordStore<FlakyBackend> {
    RecordStore::new(FlakyBackend::new())
}

fn txn(id: &str, amount: Decimal, kind: EntryType, category: &str) -> Transaction {
    Transaction {
        id: id.into(),
        amount,
        description: format!("txn {id}"),
        category: category.into(),
        date: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        kind,
    }
}

fn budget(id: &str, limit: Decimal, spent: Decimal) -> Budget {
    Budget {
        id: id.into(),
        name: format!("budget {id}"),
        limit,
        spent,
        category: "Food".into(),
    }
}

fn ids<T: Collection>(records: &[T]) -> Vec<&str> {
    records.iter().map(|r| r.id()).collect()
}

// ── Default categories ────────────────────────────────────────

#[test]
fn test_categories_fall_back_to_seed_without_persisting() {
    let store = store();
    let cats: Vec<Category> = store.read_all();
    assert_eq!(
        ids(&cats),
        vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]
    );
    assert_eq!(store.backend().get("categories").unwrap(), None);
}

#[test]
fn test_seed_contents() {
    let cats = default_categories();
    let income: Vec<&str> = Category::of_type(&cats, EntryType::Income)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(income, vec!["Salary", "Freelance", "Investment"]);
    assert_eq!(Category::of_type(&cats, EntryType::Expense).len(), 7);
    assert_eq!(cats[3].icon, "restaurant");
    assert_eq!(cats[3].color, "#F44336");
    assert_eq!(cats[9].name, "Education");
}

#[test]
fn test_initialize_installs_seed_once() {
    let store = store();
    assert!(store.try_initialize().unwrap());
    assert!(store.backend().get("categories").unwrap().is_some());
    assert!(!store.try_initialize().unwrap());
    assert_eq!(store.read_all::<Category>().len(), 10);
}

#[test]
fn test_initialize_replaces_empty_collection() {
    let store = store();
    store.backend().set("categories", "[]").unwrap();
    // An explicitly empty collection is read back as empty, not as the seed.
    assert!(store.read_all::<Category>().is_empty());
    assert!(store.try_initialize().unwrap());
    assert_eq!(store.read_all::<Category>().len(), 10);
}

#[test]
fn test_initialize_keeps_existing_categories() {
    let store = store();
    let pets = Category::new("p".into(), "Pets", EntryType::Expense).unwrap();
    store
        .backend()
        .set("categories", &serde_json::to_string(&vec![pets]).unwrap())
        .unwrap();
    assert!(!store.try_initialize().unwrap());
    assert_eq!(ids(&store.read_all::<Category>()), vec!["p"]);
}

#[test]
fn test_initialize_skips_seed_on_read_fault() {
    let store = flaky_store();
    store.backend().fail_reads.store(true, Ordering::SeqCst);
    assert!(store.try_initialize().is_err());
    store.initialize();
    store.backend().fail_reads.store(false, Ordering::SeqCst);
    assert_eq!(store.backend().get("categories").unwrap(), None);
}

#[test]
fn test_append_category_to_absent_collection_keeps_seed() {
    let store = store();
    let pets = Category::new("11".into(), "Pets", EntryType::Expense).unwrap();
    store.append(pets);
    let cats: Vec<Category> = store.read_all();
    assert_eq!(cats.len(), 11);
    assert_eq!(cats[10].name, "Pets");
}

// ── Append / read ─────────────────────────────────────────────

#[test]
fn test_transactions_empty_when_absent() {
    let store = store();
    assert!(store.read_all::<Transaction>().is_empty());
    assert!(store.read_all::<Budget>().is_empty());
}

#[test]
fn test_append_adds_one_record_at_end() {
    let store = store();
    store.append(txn("a", dec!(10), EntryType::Income, "Salary"));
    store.append(txn("b", dec!(5), EntryType::Expense, "Food"));
    let before: Vec<Transaction> = store.read_all();

    let added = txn("c", dec!(2.25), EntryType::Expense, "Transport");
    store.append(added.clone());
    let after: Vec<Transaction> = store.read_all();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(after.last().unwrap(), &added);
}

#[test]
fn test_append_does_not_check_duplicates() {
    let store = store();
    store.append(txn("dup", dec!(1), EntryType::Income, "Salary"));
    store.append(txn("dup", dec!(2), EntryType::Income, "Salary"));
    assert_eq!(store.read_all::<Transaction>().len(), 2);
}

#[test]
fn test_roundtrip_preserves_every_field() {
    let store = store();
    let mut t = txn("rt", dec!(1234.5678), EntryType::Expense, "Health");
    t.date = Utc.timestamp_millis_opt(1_715_000_123_456).unwrap();
    let b = budget("b1", dec!(300.10), dec!(99.99));
    let c = Category::new("c1".into(), "Pets", EntryType::Expense).unwrap();

    store.append(t.clone());
    store.append(b.clone());
    store.append(c.clone());

    assert_eq!(store.read_all::<Transaction>(), vec![t]);
    assert_eq!(store.read_all::<Budget>(), vec![b]);
    assert_eq!(store.read_all::<Category>().last(), Some(&c));
}

#[test]
fn test_reads_blobs_written_by_other_clients() {
    let store = store();
    let raw = r#"[{"id":"1715000000000","amount":42,"description":"Groceries",
                   "category":"Food","date":"2024-05-06T12:00:00.000Z","type":"expense"}]"#;
    store.backend().set("transactions", raw).unwrap();
    let txns: Vec<Transaction> = store.read_all();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].amount, dec!(42));
    assert!(txns[0].is_expense());
}

// ── Replace ───────────────────────────────────────────────────

#[test]
fn test_replace_overwrites_in_place() {
    let store = store();
    store.append(budget("a", dec!(100), dec!(0)));
    store.append(budget("b", dec!(200), dec!(0)));
    store.append(budget("c", dec!(300), dec!(0)));

    let mut updated = budget("b", dec!(250), dec!(80));
    updated.name = "Renamed".into();
    assert!(store.try_replace_by_id("b", updated.clone()).unwrap());

    let budgets: Vec<Budget> = store.read_all();
    assert_eq!(ids(&budgets), vec!["a", "b", "c"]);
    assert_eq!(budgets[1], updated);
}

#[test]
fn test_replace_affects_first_match_only() {
    let store = store();
    store.append(budget("x", dec!(100), dec!(0)));
    store.append(budget("x", dec!(200), dec!(0)));

    store.replace_by_id("x", budget("x", dec!(999), dec!(1)));
    let budgets: Vec<Budget> = store.read_all();
    assert_eq!(budgets[0].limit, dec!(999));
    assert_eq!(budgets[1].limit, dec!(200));
}

#[test]
fn test_replace_unknown_id_leaves_blob_untouched() {
    let store = store();
    store.append(budget("a", dec!(100), dec!(10)));
    let before = store.backend().get("budgets").unwrap();

    assert!(!store
        .try_replace_by_id("missing", budget("missing", dec!(1), dec!(1)))
        .unwrap());
    assert_eq!(store.backend().get("budgets").unwrap(), before);
}

#[test]
fn test_replace_on_absent_collection_writes_nothing() {
    let store = store();
    store.replace_by_id("a", budget("a", dec!(1), dec!(0)));
    assert_eq!(store.backend().get("budgets").unwrap(), None);
}

// ── Remove ────────────────────────────────────────────────────

#[test]
fn test_remove_drops_all_matches_and_keeps_order() {
    let store = store();
    for id in ["a", "dup", "b", "dup", "c"] {
        store.append(txn(id, dec!(1), EntryType::Expense, "Food"));
    }
    assert_eq!(store.try_remove_by_id::<Transaction>("dup").unwrap(), 2);
    assert_eq!(ids(&store.read_all::<Transaction>()), vec!["a", "b", "c"]);
}

#[test]
fn test_remove_unknown_id_keeps_records() {
    let store = store();
    store.append(txn("a", dec!(1), EntryType::Expense, "Food"));
    store.remove_by_id::<Transaction>("zzz");
    assert_eq!(ids(&store.read_all::<Transaction>()), vec!["a"]);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn test_malformed_blob_degrades_to_fallback() {
    let store = store();
    store.backend().set("transactions", "{not json").unwrap();
    store.backend().set("categories", "[{\"id\":1}]").unwrap();

    assert!(store.read_all::<Transaction>().is_empty());
    assert_eq!(store.read_all::<Category>().len(), 10);
    assert!(matches!(
        store.try_read_all::<Transaction>(),
        Err(StorageFault::Malformed {
            key: "transactions",
            ..
        })
    ));
}

#[test]
fn test_mutation_never_overwrites_malformed_blob() {
    let store = store();
    store.backend().set("transactions", "{not json").unwrap();

    assert!(store
        .try_append(txn("a", dec!(1), EntryType::Income, "Salary"))
        .is_err());
    store.remove_by_id::<Transaction>("a");
    assert_eq!(
        store.backend().get("transactions").unwrap().as_deref(),
        Some("{not json")
    );
}

#[test]
fn test_read_fault_degrades_to_fallback() {
    let store = flaky_store();
    store.append(txn("a", dec!(1), EntryType::Income, "Salary"));
    store.backend().fail_reads.store(true, Ordering::SeqCst);

    assert!(store.read_all::<Transaction>().is_empty());
    assert_eq!(store.read_all::<Category>().len(), 10);
    assert!(matches!(
        store.try_read_all::<Transaction>(),
        Err(StorageFault::Backend { .. })
    ));
}

#[test]
fn test_write_fault_is_swallowed() {
    let store = flaky_store();
    store.append(txn("a", dec!(1), EntryType::Income, "Salary"));
    store.backend().fail_writes.store(true, Ordering::SeqCst);

    store.append(txn("b", dec!(2), EntryType::Income, "Salary"));
    store.remove_by_id::<Transaction>("a");
    assert!(store
        .try_append(txn("c", dec!(3), EntryType::Income, "Salary"))
        .is_err());

    store.backend().fail_writes.store(false, Ordering::SeqCst);
    assert_eq!(ids(&store.read_all::<Transaction>()), vec!["a"]);
}

// ── Concurrency ───────────────────────────────────────────────

#[test]
fn test_concurrent_appends_all_persist() {
    let store = Arc::new(store());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..25 {
                    let id = format!("{worker}-{n}");
                    store.append(txn(&id, dec!(1), EntryType::Expense, "Food"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let txns: Vec<Transaction> = store.read_all();
    assert_eq!(txns.len(), 200);
    for worker in 0..8 {
        for n in 0..25 {
            let id = format!("{worker}-{n}");
            assert!(txns.iter().any(|t| t.id == id), "lost update for {id}");
        }
    }
}

#[test]
fn test_concurrent_append_and_remove() {
    let store = Arc::new(store());
    for n in 0..50 {
        store.append(txn(&format!("old-{n}"), dec!(1), EntryType::Expense, "Food"));
    }

    let adder = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for n in 0..50 {
                store.append(txn(&format!("new-{n}"), dec!(1), EntryType::Income, "Salary"));
            }
        })
    };
    let remover = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for n in 0..50 {
                store.remove_by_id::<Transaction>(&format!("old-{n}"));
            }
        })
    };
    adder.join().unwrap();
    remover.join().unwrap();

    let txns: Vec<Transaction> = store.read_all();
    assert_eq!(txns.len(), 50);
    assert!(txns.iter().all(|t| t.id.starts_with("new-")));
}
