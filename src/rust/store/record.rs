use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Relevance;

/// Placeholder owner of every prediction until accounts exist.
pub const ANONYMOUS_USER: &str = "anonymous";

/// A prediction about to be written. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub tweet: String,
    pub prediction: Relevance,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl NewPrediction {
    /// Stamps a classification outcome with the current time and the anonymous user.
    pub fn now(tweet: impl Into<String>, prediction: Relevance) -> Self {
        Self {
            tweet: tweet.into(),
            prediction,
            timestamp: Utc::now(),
            user_id: ANONYMOUS_USER.to_string(),
        }
    }
}

/// A stored prediction as returned by the read endpoints.
///
/// Field names follow the stored document layout; `_id` is the hex form of the store's ObjectId.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub tweet: String,
    pub prediction: Relevance,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl PredictionRecord {
    pub fn from_new(id: impl Into<String>, record: NewPrediction) -> Self {
        Self {
            id: id.into(),
            tweet: record.tweet,
            prediction: record.prediction,
            timestamp: record.timestamp,
            user_id: record.user_id,
        }
    }
}
