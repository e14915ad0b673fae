//! Similarity and scoring functions
//!
//! Two independent scores drive the store:
//! - relevance ranks records against a query during retrieval
//! - retention ranks records against each other during consolidation

use chrono::{DateTime, Utc};

use crate::memory::types::Record;

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Parameters of the retention score
///
/// Formula: surprise_weight * surprise + recency_weight * exp(-age_days / decay_days)
///          + frequency_weight * min(access_count / frequency_saturation, 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionConfig {
    /// Weight of the caller-supplied surprise (default: 0.4)
    pub surprise_weight: f64,
    /// Weight of the recency term (default: 0.3)
    pub recency_weight: f64,
    /// Weight of the access frequency term (default: 0.3)
    pub frequency_weight: f64,
    /// Exponential decay constant in days (default: 30)
    pub recency_decay_days: f64,
    /// Access count at which the frequency term saturates (default: 10)
    pub frequency_saturation: f64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            surprise_weight: 0.4,
            recency_weight: 0.3,
            frequency_weight: 0.3,
            recency_decay_days: 30.0,
            frequency_saturation: 10.0,
        }
    }
}

/// Cosine similarity in [-1, 1].
///
/// Returns 0 when either vector is empty, has zero norm, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Euclidean distance; infinite when the lengths differ
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }

    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Retrieval score: query similarity scaled by the record's surprise
pub fn relevance_score(query: &[f32], record: &Record) -> f64 {
    let similarity = record
        .embedding()
        .map(|embedding| cosine_similarity(query, embedding))
        .unwrap_or(0.0);
    let score = similarity * record.surprise_score;
    // 0 * inf and NaN surprises rank as unrelated
    if score.is_nan() { 0.0 } else { score }
}

/// Record age in fractional days; records from the future count as new
pub fn age_days(record: &Record, now: DateTime<Utc>) -> f64 {
    let age_ms = (now - record.metadata.created_at).num_milliseconds().max(0);
    age_ms as f64 / MILLIS_PER_DAY
}

/// Consolidation score: higher means kept longer
pub fn retention_score(record: &Record, now: DateTime<Utc>, config: &RetentionConfig) -> f64 {
    let recency = (-age_days(record, now) / config.recency_decay_days).exp();
    let frequency =
        (record.metadata.access_count as f64 / config.frequency_saturation).min(1.0);

    config.surprise_weight * record.surprise_score
        + config.recency_weight * recency
        + config.frequency_weight * frequency
}
