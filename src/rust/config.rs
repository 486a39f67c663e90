//! Command line and environment configuration.
//!
//! Every flag can also be set through the environment (a `.env` file in the working
//! directory is loaded first), so the service runs unchanged under a process manager.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::classifier::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::model_manager::ModelArtifact;
use crate::runtime::RuntimeConfig;
use crate::store::{DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_MONGO_URI};

pub const DEFAULT_MODEL_PATH: &str = "models/bert_disaster_model.onnx";
pub const TOKENIZER_FILE_NAME: &str = "tokenizer.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// MongoDB collection
    Mongo,
    /// Process-local, lost on exit
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI", default_value = DEFAULT_MONGO_URI)]
    pub mongo_uri: String,

    #[arg(long, env = "MONGO_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    #[arg(long, env = "MONGO_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Where predictions are persisted
    #[arg(long, env = "PREDICTION_STORE", value_enum, default_value_t = StoreBackend::Mongo)]
    pub store: StoreBackend,

    /// ONNX export of the two-label sequence classifier
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Tokenizer file; defaults to tokenizer.json next to the model
    #[arg(long, env = "TOKENIZER_PATH")]
    pub tokenizer_path: Option<PathBuf>,

    /// Download source used when the model file is missing
    #[arg(long, env = "MODEL_URL")]
    pub model_url: Option<String>,

    /// Download source used when the tokenizer file is missing
    #[arg(long, env = "TOKENIZER_URL")]
    pub tokenizer_url: Option<String>,

    #[arg(long, env = "MODEL_SHA256")]
    pub model_sha256: Option<String>,

    #[arg(long, env = "TOKENIZER_SHA256")]
    pub tokenizer_sha256: Option<String>,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    pub fresh: bool,

    #[arg(long, env = "MAX_SEQUENCE_LENGTH", default_value_t = DEFAULT_MAX_SEQUENCE_LENGTH)]
    pub max_sequence_length: usize,

    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 0)]
    pub intra_threads: usize,

    #[arg(long, env = "ORT_INTER_THREADS", default_value_t = 0)]
    pub inter_threads: usize,

    /// Origins allowed to call the API from a browser ("*" allows any)
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:5173", "http://localhost:3000"]
    )]
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads `.env` (if present), then parses flags and environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse().normalized()
    }

    /// Blank values count as unset.
    pub fn normalized(mut self) -> Self {
        if self.mongo_uri.trim().is_empty() {
            self.mongo_uri = DEFAULT_MONGO_URI.to_string();
        }
        self.cors_origins = self
            .cors_origins
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        self
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.tokenizer_path.clone().unwrap_or_else(|| {
            self.model_path
                .parent()
                .map(|dir| dir.join(TOKENIZER_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(TOKENIZER_FILE_NAME))
        })
    }

    pub fn model_artifact(&self) -> ModelArtifact {
        ModelArtifact::new("model", &self.model_path)
            .with_url(self.model_url.clone())
            .with_sha256(self.model_sha256.clone())
    }

    pub fn tokenizer_artifact(&self) -> ModelArtifact {
        ModelArtifact::new("tokenizer", self.tokenizer_path())
            .with_url(self.tokenizer_url.clone())
            .with_sha256(self.tokenizer_sha256.clone())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            ..RuntimeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // Only flags passed explicitly are asserted on, so exported variables or a
    // local .env cannot change the outcome.
    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["disaster_tweets_server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap().normalized()
    }

    #[test]
    fn test_explicit_flags() {
        let config = parse(&[
            "--bind", "0.0.0.0:8080",
            "--mongo-uri", "mongodb://db:27017/",
            "--store", "memory",
            "--model-path", "/opt/models/model.onnx",
            "--max-sequence-length", "64",
            "--cors-origin", "http://a.test,http://b.test",
        ]);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.mongo_uri, "mongodb://db:27017/");
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.max_sequence_length, 64);
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_tokenizer_defaults_to_model_directory() {
        let mut config = parse(&["--model-path", "/opt/models/model.onnx"]);
        config.tokenizer_path = None;
        assert_eq!(config.tokenizer_path(), PathBuf::from("/opt/models/tokenizer.json"));
    }

    #[test]
    fn test_blank_mongo_uri_falls_back_to_local_default() {
        let config = parse(&["--mongo-uri", "  "]);
        assert_eq!(config.mongo_uri, DEFAULT_MONGO_URI);
    }

    #[test]
    fn test_explicit_tokenizer_path_wins() {
        let config = parse(&["--model-path", "m/model.onnx", "--tokenizer-path", "t/tok.json"]);
        assert_eq!(config.tokenizer_path(), PathBuf::from("t/tok.json"));
    }

    #[test]
    fn test_artifacts_carry_sources() {
        let config = parse(&[
            "--model-url", "https://example.test/model.onnx",
            "--model-sha256", "ABCDEF",
        ]);
        let model = config.model_artifact();
        assert_eq!(model.url.as_deref(), Some("https://example.test/model.onnx"));
        assert_eq!(model.sha256.as_deref(), Some("abcdef"));
        assert_eq!(config.tokenizer_artifact().file_type, "tokenizer");
    }

    #[test]
    fn test_runtime_config_threads() {
        let config = parse(&["--intra-threads", "3", "--inter-threads", "0"]);
        let runtime = config.runtime_config();
        assert_eq!(runtime.intra_threads, 3);
        assert_eq!(runtime.inter_threads, 0);
    }

    #[test]
    fn test_declared_defaults_and_env_names() {
        let command = Config::command();
        let arg = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .unwrap_or_else(|| panic!("no argument {}", id))
        };
        let defaults = |id: &str| -> Vec<String> {
            arg(id)
                .get_default_values()
                .iter()
                .map(|value| value.to_string_lossy().into_owned())
                .collect()
        };

        assert_eq!(defaults("bind"), vec!["127.0.0.1:5000"]);
        assert_eq!(defaults("mongo_uri"), vec![DEFAULT_MONGO_URI]);
        assert_eq!(defaults("database"), vec![DEFAULT_DATABASE]);
        assert_eq!(defaults("collection"), vec![DEFAULT_COLLECTION]);
        assert_eq!(defaults("store"), vec!["mongo"]);
        assert_eq!(defaults("model_path"), vec![DEFAULT_MODEL_PATH]);
        assert_eq!(defaults("max_sequence_length"), vec!["128"]);
        assert_eq!(defaults("cors_origins"), vec!["http://localhost:5173", "http://localhost:3000"]);
        assert!(defaults("tokenizer_path").is_empty());

        assert_eq!(arg("mongo_uri").get_env().and_then(|env| env.to_str()), Some("MONGO_URI"));
        assert_eq!(arg("store").get_env().and_then(|env| env.to_str()), Some("PREDICTION_STORE"));
        assert_eq!(arg("cors_origins").get_env().and_then(|env| env.to_str()), Some("CORS_ORIGINS"));
    }
}
