//! Disaster tweet relevance service.
//!
//! Classifies short messages as `Relevant` or `Not Relevant` to a disaster with a
//! pretrained two-label sequence classifier (ONNX), stores every prediction, and serves
//! the stored predictions back by label over HTTP.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use disaster_tweets::{api, InMemoryStore, OnnxClassifier};
//!
//! let classifier = OnnxClassifier::builder()
//!     .with_model_files("models/bert_disaster_model.onnx", "models/tokenizer.json")?
//!     .build()?;
//!
//! let ctx = api::AppContext::new(Arc::new(classifier), Arc::new(InMemoryStore::new()));
//! let app = api::router(Arc::new(ctx), &["http://localhost:5173".to_string()]);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier and the stores are `Send + Sync` and are shared between requests
//! through `Arc`; neither is mutated after startup apart from store appends.

pub mod api;
pub mod classifier;
pub mod config;
pub mod model_manager;
mod runtime;
pub mod store;

pub use classifier::{Classify, ClassifierBuilder, ClassifierError, ClassifierInfo, OnnxClassifier, Relevance, TextEncoder};
pub use config::{Config, StoreBackend};
pub use model_manager::{ModelArtifact, ModelError, ModelManager};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use store::{InMemoryStore, MongoStore, NewPrediction, PredictionRecord, PredictionStore, StoreError};

pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
