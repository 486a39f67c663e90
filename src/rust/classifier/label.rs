use serde::{Deserialize, Serialize};
use std::fmt;

/// The two outcomes the relevance model can produce.
///
/// Serialized exactly as the stored documents and the HTTP API spell them:
/// `"Relevant"` and `"Not Relevant"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relevance {
    #[serde(rename = "Relevant")]
    Relevant,
    #[serde(rename = "Not Relevant")]
    NotRelevant,
}

impl Relevance {
    /// Labels in model output order (logit index 0, then 1).
    pub const ALL: [Relevance; 2] = [Relevance::NotRelevant, Relevance::Relevant];

    /// Maps a logit index of the two-class model onto a label.
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevant => "Relevant",
            Self::NotRelevant => "Not Relevant",
        }
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
