use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use disaster_tweets::{
    api, Classify, Config, InMemoryStore, ModelManager, MongoStore, OnnxClassifier, PredictionStore,
    StoreBackend,
};
use log::{info, warn};

async fn ensure_model_downloaded(config: &Config) -> anyhow::Result<()> {
    let manager = ModelManager::new();
    let artifacts = [config.model_artifact(), config.tokenizer_artifact()];

    if config.fresh {
        info!("Fresh download requested - removing any existing model files...");
        for artifact in &artifacts {
            if artifact.url.is_none() {
                warn!("No download URL for {} file, keeping {:?}", artifact.file_type, artifact.path);
                continue;
            }
            manager.remove_download(artifact)?;
        }
    }

    for artifact in &artifacts {
        manager
            .ensure_available(artifact)
            .await
            .with_context(|| format!("{} file is not available", artifact.file_type))?;
    }

    Ok(())
}

fn load_classifier(config: &Config) -> anyhow::Result<OnnxClassifier> {
    let start_time = Instant::now();
    info!("Loading classifier...");

    let classifier = OnnxClassifier::builder()
        .with_runtime_config(config.runtime_config())
        .with_max_sequence_length(config.max_sequence_length)
        .with_model_files(&config.model_path, config.tokenizer_path())?
        .build()?;

    let info = classifier.info();
    info!(
        "Classifier ready in {:.2?} (model: {}, tokenizer: {}, max tokens: {}, labels: {:?})",
        start_time.elapsed(),
        info.model_path,
        info.tokenizer_path,
        info.max_sequence_length,
        info.labels.iter().map(|label| label.as_str()).collect::<Vec<_>>()
    );
    Ok(classifier)
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn PredictionStore>> {
    match config.store {
        StoreBackend::Mongo => {
            let store = MongoStore::connect(&config.mongo_uri, &config.database, &config.collection)
                .await
                .context("Could not connect to MongoDB")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store, predictions are lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    disaster_tweets::init_logger();

    info!("=== Starting disaster tweet classifier ===");
    info!("Store backend: {:?}, model: {:?}", config.store, config.model_path);

    // Any failure before the listener is bound aborts startup
    ensure_model_downloaded(&config).await?;
    let classifier: Arc<dyn Classify> = Arc::new(load_classifier(&config)?);
    let store = open_store(&config).await?;

    let ctx = Arc::new(api::AppContext::new(classifier, store));
    let app = api::router(Arc::clone(&ctx), &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drop(ctx);
    info!("=== Server stopped ===");
    Ok(())
}
