//! Process-local history store.

use super::{strip_store_fields, HistoryRecord, HistoryStore, StoreError};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<(String, HistoryRecord)>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn persist(&self, mut record: HistoryRecord) -> Result<String, StoreError> {
        strip_store_fields(&mut record);
        let id = Uuid::new_v4().simple().to_string();
        self.records.write().await.push((id.clone(), record));
        Ok(id)
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
