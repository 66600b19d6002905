//! Text similarity scoring
//!
//! Every score lies in `0.0..=1.0`; two empty texts always score `1.0`.

#![allow(clippy::needless_range_loop)]

use crate::criteria::{ResponseMatchConfig, SimilarityAlgorithm};
use std::collections::HashSet;

/// Scorer for span text similarity
#[derive(Debug, Clone, Default)]
pub struct ResponseScorer {
    config: ResponseMatchConfig,
}

impl ResponseScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResponseMatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResponseMatchConfig {
        &self.config
    }

    /// Score how closely `actual` matches `expected`
    pub fn score(&self, expected: &str, actual: &str) -> f64 {
        let expected = self.normalize(expected);
        let actual = self.normalize(actual);

        match self.config.algorithm {
            SimilarityAlgorithm::Exact => bool_score(expected == actual),
            SimilarityAlgorithm::Contains => {
                bool_score(actual.contains(&expected) || expected.contains(&actual))
            }
            SimilarityAlgorithm::Levenshtein => levenshtein_similarity(&expected, &actual),
            SimilarityAlgorithm::Jaccard => jaccard_similarity(&expected, &actual),
            SimilarityAlgorithm::Rouge1 => rouge_n(&expected, &actual, 1),
            SimilarityAlgorithm::Rouge2 => rouge_n(&expected, &actual, 2),
            SimilarityAlgorithm::RougeL => rouge_l(&expected, &actual),
        }
    }

    fn normalize(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.ignore_case {
            result = result.to_lowercase();
        }

        if self.config.ignore_punctuation {
            result = result
                .chars()
                .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
                .collect();
        }

        if self.config.normalize {
            result = result.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        result
    }
}

fn bool_score(matched: bool) -> f64 {
    if matched { 1.0 } else { 0.0 }
}

fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(&a_chars, &b_chars) as f64 / max_len as f64
}

fn levenshtein_distance(a: &[char], b: &[char]) -> usize {
    let (m, n) = (a.len(), b.len());
    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];
    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a_words: HashSet<&str> = a.split_whitespace().collect();
    let b_words: HashSet<&str> = b.split_whitespace().collect();

    if a_words.is_empty() && b_words.is_empty() {
        return 1.0;
    }

    let intersection = a_words.intersection(&b_words).count();
    let union = a_words.union(&b_words).count();
    intersection as f64 / union as f64
}

/// Fraction of the reference's n-grams found in the candidate
fn rouge_n(reference: &str, candidate: &str, n: usize) -> f64 {
    let ref_ngrams = ngrams(reference, n);
    let cand_ngrams = ngrams(candidate, n);

    if ref_ngrams.is_empty() {
        return bool_score(cand_ngrams.is_empty());
    }

    let overlap = ref_ngrams.intersection(&cand_ngrams).count();
    overlap as f64 / ref_ngrams.len() as f64
}

fn ngrams(text: &str, n: usize) -> HashSet<Vec<&str>> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < n {
        return HashSet::new();
    }
    words.windows(n).map(|w| w.to_vec()).collect()
}

/// F1 of longest-common-subsequence precision and recall
fn rouge_l(reference: &str, candidate: &str) -> f64 {
    let ref_words: Vec<&str> = reference.split_whitespace().collect();
    let cand_words: Vec<&str> = candidate.split_whitespace().collect();

    if ref_words.is_empty() {
        return bool_score(cand_words.is_empty());
    }
    if cand_words.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&ref_words, &cand_words) as f64;
    let precision = lcs / cand_words.len() as f64;
    let recall = lcs / ref_words.len() as f64;

    if precision + recall == 0.0 { 0.0 } else { 2.0 * precision * recall / (precision + recall) }
}

fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    dp[m][n]
}
