//! In-memory record store.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use complaints_core::{RecordId, RecordStore, StoreError, SubmittedRecord};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// `HashMap`-backed [`RecordStore`].
///
/// Clones share the same data. [`set_unavailable`](Self::set_unavailable)
/// makes every call fail with [`StoreError::ConnectionFailed`], which is how
/// tests simulate a database outage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordId, SubmittedRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = SubmittedRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    /// Toggle simulated outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }

    /// Fetch a record synchronously, for assertions.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<SubmittedRecord> {
        self.records.read().unwrap().get(&RecordId::new(id)).cloned()
    }

    /// All stored records, in no particular order.
    #[must_use]
    pub fn records(&self) -> Vec<SubmittedRecord> {
        self.records.read().unwrap().values().cloned().collect()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::ConnectionFailed(
                "in-memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_by_id<'a>(
        &'a self,
        id: &'a RecordId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SubmittedRecord>, StoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.records.read().unwrap().get(id).cloned())
        })
    }

    fn insert<'a>(
        &'a self,
        record: &'a SubmittedRecord,
    ) -> Pin<Box<dyn Future<Output = Result<RecordId, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            self.check_available()?;
            let mut records = self.records.write().unwrap();
            if records.contains_key(&record.id) {
                return Err(StoreError::DatabaseError(format!(
                    "duplicate key value violates unique constraint: {}",
                    record.id
                )));
            }
            records.insert(record.id.clone(), record.clone());
            Ok(record.id.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_record;

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryRecordStore::new();
        let record = sample_record("abc");

        let id = store.insert(&record).await.unwrap();
        let loaded = store.get_by_id(&id).await.unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn missing_id_is_none() {
        let store = InMemoryRecordStore::new();
        let loaded = store.get_by_id(&RecordId::new("nope")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let store = InMemoryRecordStore::with_records([sample_record("dup")]);
        let result = store.insert(&sample_record("dup")).await;
        assert!(matches!(result, Err(StoreError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let store = InMemoryRecordStore::with_records([sample_record("1")]);
        store.set_unavailable(true);

        let result = store.get_by_id(&RecordId::new("1")).await;
        assert!(matches!(result, Err(StoreError::ConnectionFailed(_))));
    }
}
