use std::path::Path;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use super::error::ClassifierError;

/// Default token budget for a single tweet.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 128;

/// Model-ready tensors for a single input, all of the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedText {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Turns raw text into the three input tensors a BERT-style sequence classifier expects.
///
/// The wrapped tokenizer is configured once at construction:
/// - truncation to `max_sequence_length` tokens (special tokens included)
/// - padding to the longest sequence in the batch
///
/// The encoder is read-only after construction and safe to share across threads.
#[derive(Debug)]
pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_sequence_length: usize,
}

impl TextEncoder {
    /// Loads a `tokenizer.json` file and applies truncation and padding.
    ///
    /// # Errors
    /// - `BuildError` if the file cannot be read or parsed
    /// - `BuildError` if the truncation settings are rejected
    pub fn from_file(path: impl AsRef<Path>, max_sequence_length: usize) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            ClassifierError::BuildError(format!("Failed to load tokenizer from {}: {}", path.display(), e))
        })?;
        Self::new(tokenizer, max_sequence_length)
    }

    pub fn new(mut tokenizer: Tokenizer, max_sequence_length: usize) -> Result<Self, ClassifierError> {
        if max_sequence_length == 0 {
            return Err(ClassifierError::BuildError("Max sequence length must be greater than zero".into()));
        }

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::BuildError(format!("Failed to configure truncation: {}", e)))?;
        tokenizer.with_padding(Some(PaddingParams::default()));

        Ok(Self {
            tokenizer,
            max_sequence_length,
        })
    }

    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length
    }

    /// Counts the tokens that would be fed to the model, after truncation.
    ///
    /// # Errors
    /// - `TokenizerError` if the text cannot be encoded
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
            .map(|encoding| encoding.get_ids().len())
    }

    /// Encodes text into model inputs.
    ///
    /// # Errors
    /// - `ValidationError` if the text is empty
    /// - `TokenizerError` if the text cannot be encoded or yields no tokens
    pub fn encode(&self, text: &str) -> Result<EncodedText, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        if encoding.get_ids().is_empty() {
            return Err(ClassifierError::TokenizerError("Tokenizer produced no tokens".into()));
        }

        let widen = |values: &[u32]| values.iter().map(|&v| i64::from(v)).collect::<Vec<_>>();

        Ok(EncodedText {
            input_ids: widen(encoding.get_ids()),
            attention_mask: widen(encoding.get_attention_mask()),
            token_type_ids: widen(encoding.get_type_ids()),
        })
    }
}
