use std::path::Path;
use std::sync::Arc;
use ort::session::Session;
use log::{info, error};

use super::classifier::{run_session, OnnxClassifier};
use super::encoding::{TextEncoder, DEFAULT_MAX_SEQUENCE_LENGTH};
use super::error::ClassifierError;
use super::label::Relevance;
use crate::runtime::{RuntimeConfig, create_session_builder};

const REQUIRED_INPUTS: [&str; 2] = ["input_ids", "attention_mask"];
const TOKEN_TYPE_INPUT: &str = "token_type_ids";
const WARM_UP_TEXT: &str = "Warm-up input to check the model output";

/// A builder for constructing an OnnxClassifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    encoder: Option<TextEncoder>,
    session: Option<Session>,
    max_sequence_length: usize,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            encoder: None,
            session: None,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before `with_model_files` to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the token budget applied when encoding text (128 by default).
    ///
    /// Must be called before `with_model_files` to take effect.
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    /// Loads the ONNX model and its tokenizer
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX export of the sequence classifier
    /// * `tokenizer_path` - Path to the matching `tokenizer.json`
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The model or tokenizer paths are empty
    ///   - The paths are already set
    ///   - The files don't exist
    ///   - The model or tokenizer failed to load
    ///   - The model structure is invalid
    pub fn with_model_files(
        mut self,
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if model_path.as_os_str().is_empty() || tokenizer_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        // Validate paths exist
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path.display())));
        }
        if !tokenizer_path.exists() {
            return Err(ClassifierError::BuildError(format!("Tokenizer file not found: {}", tokenizer_path.display())));
        }

        let encoder = TextEncoder::from_file(tokenizer_path, self.max_sequence_length)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                e
            })?;
        info!("Tokenizer loaded from {}", tokenizer_path.display());

        // Create session using the process-wide environment
        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.encoder = Some(encoder);
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final OnnxClassifier instance
    ///
    /// Runs one warm-up inference so that a model with the wrong number of labels is
    /// rejected here rather than on the first request.
    ///
    /// # Returns
    /// * `Result<OnnxClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - No model and tokenizer have been loaded
    ///   - The warm-up inference fails
    ///   - The model does not produce exactly two logits
    pub fn build(mut self) -> Result<OnnxClassifier, ClassifierError> {
        let (model_path, tokenizer_path) = match (self.model_path.take(), self.tokenizer_path.take()) {
            (Some(model), Some(tokenizer)) => (model, tokenizer),
            _ => return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string())),
        };
        let encoder = self.encoder.take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?;
        let session = self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;

        let feeds_token_type_ids = session.inputs.iter().any(|input| input.name == TOKEN_TYPE_INPUT);

        let encoded = encoder.encode(WARM_UP_TEXT)?;
        let logits = run_session(&session, &encoded, feeds_token_type_ids)?;
        if logits.len() != Relevance::ALL.len() {
            return Err(ClassifierError::BuildError(format!(
                "Model must produce {} logits, warm-up produced {}",
                Relevance::ALL.len(),
                logits.len()
            )));
        }
        info!("Warm-up inference succeeded ({} tokens)", encoded.len());

        Ok(OnnxClassifier {
            model_path,
            tokenizer_path,
            encoder: Arc::new(encoder),
            session: Arc::new(session),
            feeds_token_type_ids,
        })
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model doesn't have the required input tensors
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let input_names: Vec<&str> = session.inputs.iter().map(|input| input.name.as_str()).collect();
        for required in REQUIRED_INPUTS {
            if !input_names.contains(&required) {
                return Err(ClassifierError::ModelError(format!(
                    "Model is missing required input '{}' (found {:?})",
                    required, input_names
                )));
            }
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}
