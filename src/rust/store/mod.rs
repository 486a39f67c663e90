//! Append-only storage for classification outcomes.
//!
//! Records are written once per successful prediction and never updated or deleted
//! through this crate. Reads return every record with a given label, unbounded and in
//! whatever order the backend yields them.

use async_trait::async_trait;

mod memory;
mod mongo;
mod record;

pub use memory::InMemoryStore;
pub use mongo::{MongoStore, DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_MONGO_URI};
pub use record::{NewPrediction, PredictionRecord, ANONYMOUS_USER};

use crate::classifier::Relevance;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Store returned an unexpected identifier: {0}")]
    UnexpectedId(String),
    #[error("Stored record is malformed: {0}")]
    MalformedRecord(String),
}

/// Store-assigned identifier, already rendered as a string.
pub type RecordId = String;

#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Appends a record and returns the identifier the store assigned to it.
    async fn insert(&self, record: NewPrediction) -> Result<RecordId, StoreError>;

    /// Returns every stored record carrying `label`.
    async fn find_by_label(&self, label: Relevance) -> Result<Vec<PredictionRecord>, StoreError>;
}
