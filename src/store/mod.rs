//! Whole-collection record persistence.
//!
//! Each collection kind lives under one fixed key as a JSON array. Every
//! mutation reads the full array, changes it in memory and writes the full
//! array back. Mutations of one kind are serialised through that kind's lock,
//! so two concurrent appends never overwrite each other.
//!
//! Operations come in two forms. The `try_*` form reports a [`StorageFault`].
//! The plain form logs the fault and degrades: reads fall back to the kind's
//! default collection, writes are dropped.

mod seed;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::db::{BackendError, KvBackend};
use crate::models::{Budget, Category, Transaction};

use seed::default_categories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollectionKind {
    Transactions,
    Budgets,
    Categories,
}

impl CollectionKind {
    pub(crate) fn key(&self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Categories => "categories",
        }
    }
}

/// A record type persisted as one collection.
pub(crate) trait Collection: Serialize + DeserializeOwned + Clone {
    const KIND: CollectionKind;

    fn id(&self) -> &str;

    /// What a read yields when nothing is stored or the stored data is unusable.
    fn fallback() -> Vec<Self> {
        Vec::new()
    }
}

impl Collection for Transaction {
    const KIND: CollectionKind = CollectionKind::Transactions;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Collection for Budget {
    const KIND: CollectionKind = CollectionKind::Budgets;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Collection for Category {
    const KIND: CollectionKind = CollectionKind::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn fallback() -> Vec<Self> {
        default_categories()
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageFault {
    #[error("storage backend failed for '{key}': {source}")]
    Backend {
        key: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("stored '{key}' collection is malformed: {source}")]
    Malformed {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode '{key}' collection: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) struct RecordStore<B> {
    backend: B,
    transactions: Mutex<()>,
    budgets: Mutex<()>,
    categories: Mutex<()>,
}

impl<B: KvBackend> RecordStore<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            transactions: Mutex::new(()),
            budgets: Mutex::new(()),
            categories: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    // ── Startup ───────────────────────────────────────────────

    /// Persist the default categories if the stored collection is absent or empty.
    /// Returns whether the seed was written.
    pub(crate) fn try_initialize(&self) -> Result<bool, StorageFault> {
        let _guard = self.lock(CollectionKind::Categories);
        match self.load::<Category>()? {
            Some(existing) if !existing.is_empty() => Ok(false),
            _ => {
                self.save::<Category>(&default_categories())?;
                info!("installed default categories");
                Ok(true)
            }
        }
    }

    pub(crate) fn initialize(&self) {
        if let Err(fault) = self.try_initialize() {
            warn!(%fault, "could not install default categories");
        }
    }

    // ── Explicit-result operations ────────────────────────────

    pub(crate) fn try_read_all<T: Collection>(&self) -> Result<Vec<T>, StorageFault> {
        Ok(self.load()?.unwrap_or_else(T::fallback))
    }

    pub(crate) fn try_append<T: Collection>(&self, record: T) -> Result<(), StorageFault> {
        let _guard = self.lock(T::KIND);
        let mut records = self.load()?.unwrap_or_else(T::fallback);
        debug!(key = T::KIND.key(), id = record.id(), "appending record");
        records.push(record);
        self.save(&records)
    }

    /// Overwrite the first record with `id`. Nothing is written when no record matches.
    pub(crate) fn try_replace_by_id<T: Collection>(
        &self,
        id: &str,
        record: T,
    ) -> Result<bool, StorageFault> {
        let _guard = self.lock(T::KIND);
        let mut records = self.load()?.unwrap_or_else(T::fallback);
        let Some(slot) = records.iter_mut().find(|r| r.id() == id) else {
            debug!(key = T::KIND.key(), id, "no record to replace");
            return Ok(false);
        };
        *slot = record;
        self.save(&records)?;
        Ok(true)
    }

    /// Drop every record with `id`. Returns how many were removed.
    pub(crate) fn try_remove_by_id<T: Collection>(&self, id: &str) -> Result<usize, StorageFault> {
        let _guard = self.lock(T::KIND);
        let mut records: Vec<T> = self.load()?.unwrap_or_else(T::fallback);
        let before = records.len();
        records.retain(|r| r.id() != id);
        let removed = before - records.len();
        self.save(&records)?;
        Ok(removed)
    }

    // ── Fail-silent operations ────────────────────────────────

    pub(crate) fn read_all<T: Collection>(&self) -> Vec<T> {
        self.try_read_all().unwrap_or_else(|fault| {
            warn!(%fault, "read failed, using fallback");
            T::fallback()
        })
    }

    pub(crate) fn append<T: Collection>(&self, record: T) {
        if let Err(fault) = self.try_append(record) {
            warn!(%fault, "append dropped");
        }
    }

    pub(crate) fn replace_by_id<T: Collection>(&self, id: &str, record: T) {
        if let Err(fault) = self.try_replace_by_id(id, record) {
            warn!(%fault, id, "replace dropped");
        }
    }

    pub(crate) fn remove_by_id<T: Collection>(&self, id: &str) {
        if let Err(fault) = self.try_remove_by_id::<T>(id) {
            warn!(%fault, id, "remove dropped");
        }
    }

    // ── Internals ─────────────────────────────────────────────

    fn lock(&self, kind: CollectionKind) -> MutexGuard<'_, ()> {
        let lock = match kind {
            CollectionKind::Transactions => &self.transactions,
            CollectionKind::Budgets => &self.budgets,
            CollectionKind::Categories => &self.categories,
        };
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` when the key has never been written.
    fn load<T: Collection>(&self) -> Result<Option<Vec<T>>, StorageFault> {
        let key = T::KIND.key();
        let Some(raw) = self
            .backend
            .get(key)
            .map_err(|source| StorageFault::Backend { key, source })?
        else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageFault::Malformed { key, source })
    }

    fn save<T: Collection>(&self, records: &[T]) -> Result<(), StorageFault> {
        let key = T::KIND.key();
        let raw =
            serde_json::to_string(records).map_err(|source| StorageFault::Encode { key, source })?;
        self.backend
            .set(key, &raw)
            .map_err(|source| StorageFault::Backend { key, source })
    }
}

#[cfg(test)]
mod tests;
