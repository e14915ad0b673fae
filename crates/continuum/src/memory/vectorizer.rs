//! Payload vectorization
//!
//! Turns arbitrary payloads into fixed-length vectors with a seeded hashing
//! scheme. The hash must never change between runs: persisted embeddings are
//! compared against freshly computed query vectors after a restart.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::VectorizerConfig;
use crate::error::Result;

/// Trait for turning payloads into fixed-dimension vectors
pub trait Vectorizer: Send + Sync {
    /// Length of every vector produced by this vectorizer
    fn dimension(&self) -> usize;

    /// Embed a single payload
    fn embed(&self, payload: &Value) -> Result<Vec<f32>>;
}

/// Bag-of-tokens vectorizer that hashes whitespace tokens into buckets.
///
/// The output is L2-normalised; a payload without tokens maps to the
/// all-zero vector.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    config: VectorizerConfig,
}

impl HashingVectorizer {
    pub fn new(config: VectorizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    fn bucket(&self, token: &str) -> usize {
        (token_hash(token, self.config.hash_seed) % self.config.dimension as u64) as usize
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::new(VectorizerConfig::default())
    }
}

impl Vectorizer for HashingVectorizer {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn embed(&self, payload: &Value) -> Result<Vec<f32>> {
        let text = canonical_text(payload)?.to_lowercase();
        let mut embedding = vec![0.0f32; self.config.dimension];

        for token in text.split_whitespace().take(self.config.max_tokens) {
            embedding[self.bucket(token)] += 1.0;
        }

        normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Render a payload to the text that gets tokenized.
///
/// Strings are used verbatim; everything else is rendered as compact JSON,
/// whose object keys are sorted.
pub fn canonical_text(payload: &Value) -> Result<String> {
    match payload {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// First 8 bytes (little-endian) of SHA-256 over `seed || token`
fn token_hash(token: &str, seed: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix)
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_token_hash_is_stable() {
        assert_eq!(token_hash("token", 7), token_hash("token", 7));
        assert_ne!(token_hash("token", 7), token_hash("tokens", 7));
    }

    #[test]
    fn test_seed_changes_hash() {
        assert_ne!(token_hash("token", 0), token_hash("token", 42));
    }

    #[test]
    fn test_seed_changes_embedding() {
        let seeded = HashingVectorizer::new(VectorizerConfig {
            hash_seed: 42,
            ..Default::default()
        });
        let payload = json!("one two three four five six");
        assert_ne!(
            HashingVectorizer::default().embed(&payload).unwrap(),
            seeded.embed(&payload).unwrap()
        );
    }

    #[test]
    fn test_embedding_dimension_and_norm() {
        let vectorizer = HashingVectorizer::default();
        let embedding = vectorizer.embed(&json!("the quick brown fox")).unwrap();

        assert_eq!(embedding.len(), 128);
        assert!((norm(&embedding) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_payload_is_zero_vector() {
        let vectorizer = HashingVectorizer::default();
        let embedding = vectorizer.embed(&json!("   ")).unwrap();

        assert_eq!(embedding.len(), 128);
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_case_insensitive() {
        let vectorizer = HashingVectorizer::default();
        let lower = vectorizer.embed(&json!("hello world")).unwrap();
        let upper = vectorizer.embed(&json!("HELLO World")).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_only_first_tokens_count() {
        let config = VectorizerConfig {
            max_tokens: 2,
            ..Default::default()
        };
        let vectorizer = HashingVectorizer::new(config);

        let short = vectorizer.embed(&json!("alpha beta")).unwrap();
        let long = vectorizer.embed(&json!("alpha beta gamma delta")).unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_repeated_token_single_bucket() {
        let vectorizer = HashingVectorizer::default();
        let embedding = vectorizer.embed(&json!("echo echo echo")).unwrap();

        let non_zero: Vec<_> = embedding.iter().filter(|v| **v != 0.0).collect();
        assert_eq!(non_zero.len(), 1);
        assert!((non_zero[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(canonical_text(&json!("plain")).unwrap(), "plain");
        assert_eq!(canonical_text(&json!(42)).unwrap(), "42");
        assert_eq!(
            canonical_text(&json!({"b": 1, "a": "x"})).unwrap(),
            r#"{"a":"x","b":1}"#
        );
    }

    #[test]
    fn test_structured_payload_embeds() {
        let vectorizer = HashingVectorizer::default();
        let embedding = vectorizer.embed(&json!({"task": "deploy service"})).unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 1e-5);
    }
}
