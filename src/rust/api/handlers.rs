use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppContext};
use crate::classifier::Relevance;
use crate::store::{NewPrediction, PredictionRecord, PredictionStore};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictResponse {
    pub prediction: Relevance,
}

/// `POST /predict`: classify, persist in the background, answer with the label.
pub async fn predict(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
    let text = request.text.ok_or(ApiError::MissingField("text"))?;

    let classifier = Arc::clone(&ctx.classifier);
    let input = text.clone();
    let prediction = tokio::task::spawn_blocking(move || classifier.classify(&input))
        .await
        .map_err(|e| ApiError::internal(format!("classification task failed: {}", e)))??;
    log::debug!("Classified {:?} as {}", text, prediction);

    persist_in_background(Arc::clone(&ctx.store), NewPrediction::now(text, prediction));

    Ok(Json(PredictResponse { prediction }))
}

/// `GET /relevant_tweets`
pub async fn relevant_tweets(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    tweets_by_label(&ctx, Relevance::Relevant).await
}

/// `GET /non_relevant_tweets`
pub async fn non_relevant_tweets(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    tweets_by_label(&ctx, Relevance::NotRelevant).await
}

async fn tweets_by_label(
    ctx: &AppContext,
    label: Relevance,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let records = ctx.store.find_by_label(label).await?;
    Ok(Json(records))
}

/// Best-effort write: the insert runs detached and its failure is only logged,
/// never reported to the caller that triggered it.
pub fn persist_in_background(
    store: Arc<dyn PredictionStore>,
    record: NewPrediction,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match store.insert(record).await {
            Ok(id) => log::info!("Inserted document with ID: {}", id),
            Err(e) => log::error!("Error inserting prediction: {}", e),
        }
    })
}
