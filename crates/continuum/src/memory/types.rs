//! Record and cluster types for the Continuum store
//!
//! Defines the stored memory unit, its bookkeeping metadata, and the
//! cluster summaries produced by consolidation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single memory unit held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier for this record
    pub id: Uuid,
    /// Caller payload, opaque to the store
    pub payload: Value,
    /// Novelty of the payload at write time, supplied by the caller
    pub surprise_score: f64,
    /// Hashed embedding; `None` when vectorization failed
    pub embedding: Option<Vec<f32>>,
    /// Access and placement bookkeeping
    pub metadata: RecordMetadata,
    /// Whether consolidation folded this record into a cluster
    #[serde(default)]
    pub compressed: bool,
    /// Cluster summarising this record, set together with `compressed`
    #[serde(default)]
    pub parent_cluster_id: Option<Uuid>,
}

impl Record {
    /// Create a new record stamped with the current time
    pub fn new(payload: Value, surprise_score: f64, embedding: Option<Vec<f32>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            surprise_score,
            embedding,
            metadata: RecordMetadata::new(Utc::now()),
            compressed: false,
            parent_cluster_id: None,
        }
    }

    /// Apply caller-supplied metadata on top of the defaults
    pub fn with_overrides(mut self, overrides: MetadataOverrides) -> Self {
        if let Some(level) = overrides.level {
            self.metadata.level = level;
        }
        if overrides.context.is_some() {
            self.metadata.context = overrides.context;
        }
        self.metadata.extra.extend(overrides.extra);
        self
    }

    /// Mark this record as returned by a retrieval
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.metadata.access_count = self.metadata.access_count.saturating_add(1);
        self.metadata.last_accessed = now;
    }

    /// Tag this record as summarised by `cluster_id`
    pub fn mark_compressed(&mut self, cluster_id: Uuid) {
        self.compressed = true;
        self.parent_cluster_id = Some(cluster_id);
    }

    /// Embedding, if present and non-empty
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref().filter(|e| !e.is_empty())
    }
}

/// Bookkeeping attached to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// When the record was stored
    pub created_at: DateTime<Utc>,
    /// How many retrievals have returned this record
    #[serde(default)]
    pub access_count: u32,
    /// When the record was last returned by a retrieval
    pub last_accessed: DateTime<Utc>,
    /// Hierarchy level
    #[serde(default)]
    pub level: u32,
    /// Optional context tag used by retrieval filters
    #[serde(default)]
    pub context: Option<String>,
    /// Free-form caller fields
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl RecordMetadata {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            access_count: 0,
            last_accessed: now,
            level: 0,
            context: None,
            extra: Map::new(),
        }
    }
}

/// Metadata a caller may set when storing a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOverrides {
    pub level: Option<u32>,
    pub context: Option<String>,
    pub extra: Map<String, Value>,
}

impl MetadataOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Compressed summary of a group of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Unique identifier for this cluster
    pub id: Uuid,
    /// Mean embedding of the members at formation time
    pub centroid: Vec<f32>,
    /// Ids of the summarised records (never empty)
    pub members: Vec<Uuid>,
    /// Highest member surprise at formation time
    pub surprise_score: f64,
    /// Hierarchy level inherited from the members
    pub level: u32,
    /// When consolidation formed this cluster
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_new_defaults() {
        let record = Record::new(json!("hello"), 0.5, Some(vec![1.0, 0.0]));

        assert_eq!(record.metadata.access_count, 0);
        assert_eq!(record.metadata.level, 0);
        assert!(record.metadata.context.is_none());
        assert!(record.metadata.extra.is_empty());
        assert_eq!(record.metadata.created_at, record.metadata.last_accessed);
        assert!(!record.compressed);
        assert!(record.parent_cluster_id.is_none());
    }

    #[test]
    fn test_record_overrides() {
        let overrides = MetadataOverrides::new()
            .with_level(2)
            .with_context("planning")
            .with_extra("source", json!("agent"));

        let record = Record::new(json!({"k": 1}), 0.1, None).with_overrides(overrides);

        assert_eq!(record.metadata.level, 2);
        assert_eq!(record.metadata.context.as_deref(), Some("planning"));
        assert_eq!(record.metadata.extra["source"], json!("agent"));
    }

    #[test]
    fn test_empty_overrides_keep_defaults() {
        let record = Record::new(json!(1), 0.1, None).with_overrides(MetadataOverrides::new());
        assert_eq!(record.metadata.level, 0);
        assert!(record.metadata.context.is_none());
    }

    #[test]
    fn test_mark_accessed() {
        let mut record = Record::new(json!("x"), 0.1, None);
        let before = record.metadata.last_accessed;

        record.mark_accessed(Utc::now());

        assert_eq!(record.metadata.access_count, 1);
        assert!(record.metadata.last_accessed >= before);
    }

    #[test]
    fn test_mark_compressed() {
        let mut record = Record::new(json!("x"), 0.1, None);
        let cluster_id = Uuid::new_v4();

        record.mark_compressed(cluster_id);

        assert!(record.compressed);
        assert_eq!(record.parent_cluster_id, Some(cluster_id));
    }

    #[test]
    fn test_empty_embedding_is_absent() {
        let record = Record::new(json!("x"), 0.1, Some(Vec::new()));
        assert!(record.embedding().is_none());
    }

    #[test]
    fn test_record_serialization() {
        let record = Record::new(json!({"text": "hi", "n": [1, 2]}), 0.7, Some(vec![0.6, 0.8]))
            .with_overrides(MetadataOverrides::new().with_context("ctx"));

        let json = serde_json::to_string(&record).expect("Failed to serialize record");
        let deserialized: Record =
            serde_json::from_str(&json).expect("Failed to deserialize record");

        assert_eq!(record, deserialized);
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "6f1c1f8e-7e43-4b9a-9a43-2f1f7c6f3a10",
            "payload": "legacy",
            "surprise_score": 0.3,
            "embedding": null,
            "metadata": {
                "created_at": "2026-01-01T00:00:00Z",
                "last_accessed": "2026-01-01T00:00:00Z"
            }
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.metadata.access_count, 0);
        assert_eq!(record.metadata.level, 0);
        assert!(!record.compressed);
        assert!(record.embedding.is_none());
    }
}
