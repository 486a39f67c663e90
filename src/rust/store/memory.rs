use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{NewPrediction, PredictionRecord, PredictionStore, RecordId, StoreError};
use crate::classifier::Relevance;

/// Process-local store, used for tests and for running without a database.
///
/// Identifiers are fresh ObjectIds so they look exactly like the ones MongoDB hands out.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl InMemoryStore {
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
impl PredictionStore for InMemoryStore {
    async fn insert(&self, record: NewPrediction) -> Result<RecordId, StoreError> {
        let id = ObjectId::new().to_hex();
        self.records
            .write()
            .await
            .push(PredictionRecord::from_new(id.clone(), record));
        Ok(id)
    }

    async fn find_by_label(&self, label: Relevance) -> Result<Vec<PredictionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.prediction == label)
            .cloned()
            .collect())
    }
}
