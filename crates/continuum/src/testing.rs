//! Test utilities for continuum - shared fixtures and mocks
//!
//! Record builders with controlled embeddings and ages, plus a vectorizer
//! that always fails, for exercising the degraded write path.

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use std::path::Path;

use crate::config::Config;
use crate::error::{ContinuumError, Result};
use crate::memory::types::Record;
use crate::memory::vectorizer::Vectorizer;
use crate::storage::consolidation::ConsolidationConfig;

/// Record with an explicit embedding and surprise, created now
pub fn embedded_record(embedding: &[f32], surprise: f64) -> Record {
    Record::new(json!("fixture"), surprise, Some(embedding.to_vec()))
}

/// Record created `age` ago, with a small fixed embedding
pub fn record_with_age(surprise: f64, age: Duration) -> Record {
    let mut record = Record::new(json!("aged fixture"), surprise, Some(vec![0.0, 0.0, 1.0, 0.0]));
    let created_at = Utc::now() - age;
    record.metadata.created_at = created_at;
    record.metadata.last_accessed = created_at;
    record
}

/// Config whose snapshot lives in `dir`, with a fixed clustering seed
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.store.snapshot_path = dir.join("continuum_memory.json");
    config.consolidation.seed = Some(42);
    config
}

/// Like [`test_config`] with a small consolidation threshold and capacity
pub fn small_capacity_config(dir: &Path, threshold: usize, max_memories: usize) -> Config {
    let mut config = test_config(dir);
    config.consolidation = ConsolidationConfig::new(threshold, max_memories).with_seed(42);
    config
}

/// Vectorizer that rejects every payload
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingVectorizer {
    pub dimension: usize,
}

impl Vectorizer for FailingVectorizer {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, _payload: &Value) -> Result<Vec<f32>> {
        Err(ContinuumError::Embedding("vectorizer unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_age_sets_timestamps() {
        let record = record_with_age(0.3, Duration::days(10));
        let age = Utc::now() - record.metadata.created_at;
        assert!(age >= Duration::days(10));
        assert_eq!(record.metadata.created_at, record.metadata.last_accessed);
    }

    #[test]
    fn failing_vectorizer_always_errors() {
        let vectorizer = FailingVectorizer { dimension: 8 };
        assert_eq!(vectorizer.dimension(), 8);
        assert!(vectorizer.embed(&json!("anything")).is_err());
    }

    #[test]
    fn small_capacity_config_is_valid() {
        let dir = std::env::temp_dir();
        let config = small_capacity_config(&dir, 2, 4);
        assert!(config.validate().is_ok());
        assert_eq!(config.consolidation.seed, Some(42));
    }
}
