//! Filter types for retrieval
//!
//! Provides the predicates a retrieval can narrow its candidate set with.

use chrono::{DateTime, Duration, Utc};

use crate::memory::types::Record;

/// Filter criteria for retrieval.
///
/// `min_surprise` always applies and defaults to 0, so records with a
/// negative surprise are skipped unless the caller lowers it. The other
/// fields are optional and only apply when set. Filters combine with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFilter {
    /// Minimum surprise score (inclusive, default: 0)
    pub min_surprise: f64,
    /// Maximum age measured from creation time (inclusive)
    pub max_age: Option<Duration>,
    /// Exact hierarchy level
    pub level: Option<u32>,
    /// Exact context tag
    pub context: Option<String>,
    /// Skip records already folded into a cluster
    pub exclude_compressed: bool,
}

impl Default for MemoryFilter {
    fn default() -> Self {
        Self {
            min_surprise: 0.0,
            max_age: None,
            level: None,
            context: None,
            exclude_compressed: false,
        }
    }
}

impl MemoryFilter {
    /// Create a filter with only the default surprise floor
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_surprise(mut self, min_surprise: f64) -> Self {
        self.min_surprise = min_surprise;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn exclude_compressed(mut self) -> Self {
        self.exclude_compressed = true;
        self
    }

    /// Check whether a record passes every configured filter at time `now`
    pub fn matches(&self, record: &Record, now: DateTime<Utc>) -> bool {
        if record.surprise_score < self.min_surprise {
            return false;
        }

        if let Some(max_age) = self.max_age {
            if now - record.metadata.created_at > max_age {
                return false;
            }
        }

        if let Some(level) = self.level {
            if record.metadata.level != level {
                return false;
            }
        }

        if let Some(ref context) = self.context {
            if record.metadata.context.as_deref() != Some(context.as_str()) {
                return false;
            }
        }

        !(self.exclude_compressed && record.compressed)
    }

    /// Check if this filter adds nothing beyond the defaults
    pub fn is_empty(&self) -> bool {
        self.min_surprise == 0.0
            && self.max_age.is_none()
            && self.level.is_none()
            && self.context.is_none()
            && !self.exclude_compressed
    }
}
