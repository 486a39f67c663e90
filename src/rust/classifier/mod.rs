mod error;
mod encoding;
mod label;
#[allow(clippy::module_inception)]
mod classifier;
pub mod builder;
mod utils;

pub use error::ClassifierError;
pub use encoding::{EncodedText, TextEncoder, DEFAULT_MAX_SEQUENCE_LENGTH};
pub use label::Relevance;
pub use classifier::{Classify, OnnxClassifier};
pub use builder::ClassifierBuilder;

/// Information about the loaded relevance model
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Token budget applied to every input
    pub max_sequence_length: usize,
    /// Labels in model output order
    pub labels: Vec<Relevance>,
}
