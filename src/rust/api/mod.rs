use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

mod error;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use handlers::{PredictRequest, PredictResponse, persist_in_background};

use crate::classifier::Classify;
use crate::store::PredictionStore;

/// Everything a request handler needs, built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppContext {
    pub classifier: Arc<dyn Classify>,

    pub store: Arc<dyn PredictionStore>,
}

impl AppContext {
    pub fn new(classifier: Arc<dyn Classify>, store: Arc<dyn PredictionStore>) -> Self {
        Self { classifier, store }
    }
}

pub fn router(ctx: Arc<AppContext>, cors_origins: &[String]) -> Router {
    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/relevant_tweets", get(handlers::relevant_tweets))
        .route("/non_relevant_tweets", get(handlers::non_relevant_tweets))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .with_state(ctx)
}
