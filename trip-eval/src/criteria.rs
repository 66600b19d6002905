//! Text comparison criteria
//!
//! Controls how expected and actual span text is compared.

use serde::{Deserialize, Serialize};

/// Score at or above which two texts count as similar.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Configuration for response matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMatchConfig {
    /// Similarity algorithm to use
    #[serde(default)]
    pub algorithm: SimilarityAlgorithm,
    /// Whether to normalize whitespace before comparison
    #[serde(default = "default_true")]
    pub normalize: bool,
    #[serde(default = "default_true")]
    pub ignore_case: bool,
    #[serde(default)]
    pub ignore_punctuation: bool,
}

impl ResponseMatchConfig {
    /// Configuration used for free-text agent output: ROUGE-L over
    /// lowercased words with punctuation stripped.
    pub fn similarity() -> Self {
        Self { algorithm: SimilarityAlgorithm::RougeL, ignore_punctuation: true, ..Self::default() }
    }

    pub fn with_algorithm(mut self, algorithm: SimilarityAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

impl Default for ResponseMatchConfig {
    fn default() -> Self {
        Self {
            algorithm: SimilarityAlgorithm::default(),
            normalize: true,
            ignore_case: true,
            ignore_punctuation: false,
        }
    }
}

/// Similarity algorithms for text comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    Exact,
    /// Either text contains the other
    Contains,
    /// Levenshtein distance based
    Levenshtein,
    /// Jaccard similarity (word overlap)
    #[default]
    Jaccard,
    /// ROUGE-1 (unigram overlap)
    Rouge1,
    /// ROUGE-2 (bigram overlap)
    Rouge2,
    /// ROUGE-L (longest common subsequence)
    RougeL,
}

fn default_true() -> bool {
    true
}
