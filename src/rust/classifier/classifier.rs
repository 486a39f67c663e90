use std::collections::HashMap;
use std::sync::Arc;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::encoding::{EncodedText, TextEncoder};
use super::error::ClassifierError;
use super::label::Relevance;
use super::utils::{argmax, softmax};

/// Anything that can turn a tweet into a relevance label.
///
/// The HTTP layer only depends on this trait, so the ONNX-backed classifier can be
/// swapped for a deterministic one in tests.
pub trait Classify: Send + Sync {
    fn classify(&self, text: &str) -> Result<Relevance, ClassifierError>;
}

/// A thread-safe relevance classifier running a two-label sequence-classification model
/// through ONNX Runtime.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String` fields are `Send + Sync`
/// - `TextEncoder` and `Session` are wrapped in `Arc` and only read after construction
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use disaster_tweets::{OnnxClassifier, Relevance};
///
/// let classifier = OnnxClassifier::builder()
///     .with_model_files("models/bert_disaster_model.onnx", "models/tokenizer.json")?
///     .build()?;
///
/// let (label, scores) = classifier.predict("Wildfire spreading fast near the hills")?;
/// println!("{} ({:.1}%)", label, scores[&label] * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OnnxClassifier {
    pub model_path: String,
    pub tokenizer_path: String,
    pub encoder: Arc<TextEncoder>,
    pub session: Arc<Session>,
    pub feeds_token_type_ids: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            max_sequence_length: self.encoder.max_sequence_length(),
            labels: Relevance::ALL.to_vec(),
        }
    }

    /// Counts the tokens the model would see for `text`.
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.encoder.count_tokens(text)
    }

    /// Runs the model and returns the raw logit vector.
    pub fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let encoded = self.encoder.encode(text)?;
        run_session(&self.session, &encoded, self.feeds_token_type_ids)
    }

    /// Predicts the label of the input text and returns per-label probabilities.
    ///
    /// # Returns
    /// A tuple containing:
    /// * The predicted label
    /// * A HashMap of labels to their softmax probability (0.0 to 1.0)
    pub fn predict(&self, text: &str) -> Result<(Relevance, HashMap<Relevance, f32>), ClassifierError> {
        let logits = self.logits(text)?;
        let label = label_from_logits(&logits)?;

        let scores = Relevance::ALL
            .iter()
            .copied()
            .zip(softmax(&logits))
            .collect();

        Ok((label, scores))
    }
}

impl Classify for OnnxClassifier {
    fn classify(&self, text: &str) -> Result<Relevance, ClassifierError> {
        let logits = self.logits(text)?;
        label_from_logits(&logits)
    }
}

/// Picks the label of the highest logit of a two-class output.
pub(crate) fn label_from_logits(logits: &[f32]) -> Result<Relevance, ClassifierError> {
    if logits.len() != Relevance::ALL.len() {
        return Err(ClassifierError::PredictionError(format!(
            "Expected {} logits, got {}",
            Relevance::ALL.len(),
            logits.len()
        )));
    }

    argmax(logits)
        .and_then(Relevance::from_class_index)
        .ok_or_else(|| ClassifierError::PredictionError("Model produced no usable logits".into()))
}

/// Feeds one encoded input through the session and flattens the `[1, num_labels]` output.
///
/// # Model Input Format
/// - input_ids: Token IDs [batch_size=1, sequence_length]
/// - attention_mask: 1 for real tokens, 0 for padding [batch_size=1, sequence_length]
/// - token_type_ids: segment IDs, only when the model declares the input
pub(crate) fn run_session(
    session: &Session,
    encoded: &EncodedText,
    feeds_token_type_ids: bool,
) -> Result<Vec<f32>, ClassifierError> {
    let seq_len = encoded.len();
    let to_tensor = |name: &str, values: &[i64]| {
        let array = Array2::from_shape_vec((1, seq_len), values.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} array: {}", name, e)))?;
        Tensor::from_array(array)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} tensor: {}", name, e)))
    };

    let mut input_tensors = HashMap::new();
    input_tensors.insert("input_ids", to_tensor("input_ids", &encoded.input_ids)?);
    input_tensors.insert("attention_mask", to_tensor("attention_mask", &encoded.attention_mask)?);
    if feeds_token_type_ids {
        input_tensors.insert("token_type_ids", to_tensor("token_type_ids", &encoded.token_type_ids)?);
    }

    let outputs = session.run(input_tensors)
        .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
    let output_tensor = outputs[0].try_extract_tensor::<f32>()
        .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

    if output_tensor.ndim() != 2 || output_tensor.shape()[0] != 1 {
        return Err(ClassifierError::ModelError(format!(
            "Unexpected logits shape {:?}, expected [1, num_labels]",
            output_tensor.shape()
        )));
    }

    Ok(output_tensor.iter().copied().collect())
}
