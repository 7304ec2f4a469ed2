use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{RecordsRepository, RepositoryResult};
use crate::record::{Record, RecordId, StoredRecord};

/// Keeps records in process memory, in insertion order.
#[derive(Default)]
pub struct InMemoryRecordsRepository {
    storage: RwLock<Storage>,
}

#[derive(Default)]
struct Storage {
    records: Vec<StoredRecord>,
    index: HashMap<RecordId, usize>,
}

impl InMemoryRecordsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl RecordsRepository for InMemoryRecordsRepository {
    async fn get(&self, id: RecordId) -> RepositoryResult<Option<Record>> {
        let storage = self.storage.read().await;
        let record = storage
            .index
            .get(&id)
            .map(|&position| storage.records[position].record.clone());
        Ok(record)
    }

    async fn save(&self, record: Record) -> RepositoryResult<RecordId> {
        let mut storage = self.storage.write().await;
        let id = RecordId::generate();
        let position = storage.records.len();
        storage.records.push(StoredRecord::new(id, record));
        storage.index.insert(id, position);
        Ok(id)
    }

    async fn update(&self, id: RecordId, record: Record) -> RepositoryResult<Option<RecordId>> {
        let mut storage = self.storage.write().await;
        let position = match storage.index.get(&id) {
            Some(&position) => position,
            None => return Ok(None),
        };
        storage.records[position].record = record;
        Ok(Some(id))
    }

    async fn fetch_all(&self) -> RepositoryResult<Vec<StoredRecord>> {
        Ok(self.storage.read().await.records.clone())
    }
}
