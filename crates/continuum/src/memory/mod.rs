//! Memory types and scoring
//!
//! Defines the stored record and cluster structures, the payload
//! vectorizer, and the similarity and retention scores.

pub mod scoring;
pub mod types;
pub mod vectorizer;

pub use scoring::{
    RetentionConfig, cosine_similarity, euclidean_distance, relevance_score, retention_score,
};
pub use types::{Cluster, MetadataOverrides, Record, RecordMetadata};
pub use vectorizer::{HashingVectorizer, Vectorizer};
