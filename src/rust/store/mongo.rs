use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::info;
use mongodb::bson::{self, doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use super::{NewPrediction, PredictionRecord, PredictionStore, RecordId, StoreError};
use crate::classifier::Relevance;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/";
pub const DEFAULT_DATABASE: &str = "disaster_tweets";
pub const DEFAULT_COLLECTION: &str = "predictions";

/// Document layout of the `predictions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PredictionDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    tweet: String,
    prediction: Relevance,
    timestamp: bson::DateTime,
    user_id: String,
}

impl PredictionDocument {
    fn from_new(record: NewPrediction) -> Self {
        Self {
            id: None,
            tweet: record.tweet,
            prediction: record.prediction,
            timestamp: bson::DateTime::from_millis(record.timestamp.timestamp_millis()),
            user_id: record.user_id,
        }
    }

    fn into_record(self) -> Result<PredictionRecord, StoreError> {
        let id = self
            .id
            .ok_or_else(|| StoreError::MalformedRecord("document has no _id".into()))?;
        let millis = self.timestamp.timestamp_millis();
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            StoreError::MalformedRecord(format!("timestamp {} is out of range", millis))
        })?;

        Ok(PredictionRecord {
            id: id.to_hex(),
            tweet: self.tweet,
            prediction: self.prediction,
            timestamp,
            user_id: self.user_id,
        })
    }
}

/// Prediction store backed by a MongoDB collection.
///
/// The client keeps its own connection pool, so one instance is shared by all requests.
pub struct MongoStore {
    collection: Collection<PredictionDocument>,
}

impl MongoStore {
    /// Connects and pings the server. Any failure here means the store is unusable.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        client.database("admin").run_command(doc! { "ping": 1 }).await?;
        info!("Successfully connected to MongoDB (database: {}, collection: {})", database, collection);

        Ok(Self {
            collection: client.database(database).collection(collection),
        })
    }
}

#[async_trait]
impl PredictionStore for MongoStore {
    async fn insert(&self, record: NewPrediction) -> Result<RecordId, StoreError> {
        let result = self.collection.insert_one(PredictionDocument::from_new(record)).await?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id.to_hex()),
            other => Err(StoreError::UnexpectedId(other.to_string())),
        }
    }

    async fn find_by_label(&self, label: Relevance) -> Result<Vec<PredictionRecord>, StoreError> {
        let cursor = self
            .collection
            .find(doc! { "prediction": label.as_str() })
            .await?;
        let documents: Vec<PredictionDocument> = cursor.try_collect().await?;
        documents.into_iter().map(PredictionDocument::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prediction_serializes_without_id() {
        let record = NewPrediction::now("wildfire near the hills", Relevance::Relevant);
        let millis = record.timestamp.timestamp_millis();
        let document = bson::to_document(&PredictionDocument::from_new(record)).unwrap();

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("tweet").unwrap(), "wildfire near the hills");
        assert_eq!(document.get_str("prediction").unwrap(), "Relevant");
        assert_eq!(document.get_str("user_id").unwrap(), "anonymous");
        assert_eq!(document.get_datetime("timestamp").unwrap().timestamp_millis(), millis);
    }

    #[test]
    fn test_stored_document_becomes_record_with_hex_id() {
        let id = ObjectId::new();
        let stored = doc! {
            "_id": id,
            "tweet": "Having coffee this morning",
            "prediction": "Not Relevant",
            "timestamp": bson::DateTime::from_millis(1_700_000_000_000),
            "user_id": "anonymous",
        };
        let document: PredictionDocument = bson::from_document(stored).unwrap();
        let record = document.into_record().unwrap();

        assert_eq!(record.id, id.to_hex());
        assert_eq!(record.id.len(), 24);
        assert_eq!(record.prediction, Relevance::NotRelevant);
        assert_eq!(record.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_document_without_id_is_malformed() {
        let document = PredictionDocument::from_new(NewPrediction::now("x", Relevance::Relevant));
        assert!(matches!(
            document.into_record(),
            Err(StoreError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let stored = doc! {
            "_id": ObjectId::new(),
            "tweet": "x",
            "prediction": "Maybe",
            "timestamp": bson::DateTime::now(),
            "user_id": "anonymous",
        };
        assert!(bson::from_document::<PredictionDocument>(stored).is_err());
    }
}
