//! Embedding-based precision / recall / F1
//!
//! Scores a candidate text against a reference in the manner of BERTScore:
//! each token is embedded, every candidate token is greedily matched to its
//! most similar reference token (precision) and vice versa (recall).

use crate::error::{EvalError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Turns tokens into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed each token. Must return exactly one vector per token.
    async fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic offline embedder hashing character trigrams into buckets
///
/// Tokens that share spelling fragments land close together, which is
/// enough to tell a summary that mentions the booked route and hotel from
/// one that does not.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub const DEFAULT_DIMENSIONS: usize = 256;

    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    fn embed_token(&self, token: &str) -> Vec<f32> {
        let padded: Vec<char> = format!("#{token}#").chars().collect();
        let mut vector = vec![0.0f32; self.dimensions];
        for gram in padded.windows(3.min(padded.len())) {
            let bucket = fnv1a(gram) as usize % self.dimensions;
            vector[bucket] += 1.0;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing-trigram"
    }

    async fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(tokens.iter().map(|t| self.embed_token(t)).collect())
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for c in chars {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { f64::from(dot / (norm_a * norm_b)) }
}

/// Lowercased alphanumeric words
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Precision, recall and F1 of one candidate against one reference
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingScore {
    #[serde(alias = "Precision")]
    pub precision: f64,
    #[serde(alias = "Recall")]
    pub recall: f64,
    #[serde(alias = "F1")]
    pub f1: f64,
}

impl EmbeddingScore {
    fn from_precision_recall(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self { precision, recall, f1 }
    }

    /// Whether every component reaches the matching minimum in `minimum`
    pub fn meets(&self, minimum: &EmbeddingScore) -> bool {
        self.precision >= minimum.precision
            && self.recall >= minimum.recall
            && self.f1 >= minimum.f1
    }
}

/// Greedy max-cosine scorer over token embeddings
#[derive(Clone)]
pub struct EmbeddingScorer {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub async fn score(&self, candidate: &str, reference: &str) -> Result<EmbeddingScore> {
        let cand_tokens = tokenize(candidate);
        let ref_tokens = tokenize(reference);

        match (cand_tokens.is_empty(), ref_tokens.is_empty()) {
            (true, true) => return Ok(EmbeddingScore { precision: 1.0, recall: 1.0, f1: 1.0 }),
            (true, false) | (false, true) => return Ok(EmbeddingScore::default()),
            _ => {}
        }

        let cand = self.embed_checked(&cand_tokens).await?;
        let refs = self.embed_checked(&ref_tokens).await?;

        let precision = mean_best_match(&cand, &refs);
        let recall = mean_best_match(&refs, &cand);
        Ok(EmbeddingScore::from_precision_recall(precision, recall))
    }

    async fn embed_checked(&self, tokens: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed(tokens).await?;
        if vectors.len() != tokens.len() {
            return Err(EvalError::ScoringError(format!(
                "embedder '{}' returned {} vectors for {} tokens",
                self.embedder.name(),
                vectors.len(),
                tokens.len()
            )));
        }
        Ok(vectors)
    }
}

impl Default for EmbeddingScorer {
    fn default() -> Self {
        Self::new(Arc::new(HashingEmbedder::default()))
    }
}

fn mean_best_match(from: &[Vec<f32>], to: &[Vec<f32>]) -> f64 {
    let total: f64 = from
        .iter()
        .map(|a| to.iter().map(|b| cosine(a, b)).fold(0.0, f64::max))
        .sum();
    total / from.len() as f64
}
