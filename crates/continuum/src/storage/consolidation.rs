//! Consolidation for the Continuum store
//!
//! Shrinks the store once it grows past its threshold. Records are ranked by
//! retention score and split into three tiers at fixed fractions of the
//! capacity:
//! - keep: the top `keep_percent` of capacity, left untouched
//! - compress: up to `compress_until_percent`, clustered into summaries
//! - drop: everything ranked below, removed from the store

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ContinuumError, Result};
use crate::memory::scoring::{RetentionConfig, retention_score};
use crate::memory::types::{Cluster, Record};
use crate::storage::clustering::KMeans;

/// Configuration for consolidation thresholds and clustering
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Record count above which a write triggers consolidation (default: 8000)
    pub threshold: usize,
    /// Capacity the tier cut points are computed against (default: 10000)
    pub max_memories: usize,
    /// Percent of capacity kept as-is (default: 70)
    pub keep_percent: usize,
    /// Percent of capacity where the compress tier ends (default: 90)
    pub compress_until_percent: usize,
    /// Compress-tier records per cluster when choosing k (default: 10)
    pub records_per_cluster: usize,
    /// Maximum k-means rounds (default: 10)
    pub max_iterations: usize,
    /// Centroid movement below which k-means stops early (default: 0.01)
    pub convergence_tolerance: f64,
    /// Seed for cluster initialization; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            threshold: 8000,
            max_memories: 10000,
            keep_percent: 70,
            compress_until_percent: 90,
            records_per_cluster: 10,
            max_iterations: 10,
            convergence_tolerance: 0.01,
            seed: None,
        }
    }
}

impl ConsolidationConfig {
    /// Create a configuration with custom trigger and capacity
    pub fn new(threshold: usize, max_memories: usize) -> Self {
        Self {
            threshold,
            max_memories,
            ..Default::default()
        }
    }

    /// Fix the clustering seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the tier boundaries as percentages of capacity
    pub fn with_tiers(mut self, keep_percent: usize, compress_until_percent: usize) -> Self {
        self.keep_percent = keep_percent;
        self.compress_until_percent = compress_until_percent;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold >= self.max_memories {
            return Err(ContinuumError::Config(format!(
                "consolidation.threshold ({}) must be below consolidation.max_memories ({})",
                self.threshold, self.max_memories
            )));
        }
        if self.keep_percent > self.compress_until_percent || self.compress_until_percent > 100 {
            return Err(ContinuumError::Config(format!(
                "consolidation tiers must satisfy keep_percent ({}) <= compress_until_percent ({}) <= 100",
                self.keep_percent, self.compress_until_percent
            )));
        }
        if self.records_per_cluster == 0 {
            return Err(ContinuumError::Config(
                "consolidation.records_per_cluster must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// End of the keep tier, in ranks
    pub fn keep_end(&self) -> usize {
        self.max_memories * self.keep_percent / 100
    }

    /// End of the compress tier, in ranks
    pub fn compress_end(&self) -> usize {
        self.max_memories * self.compress_until_percent / 100
    }

    /// Number of clusters requested for a compress tier of `candidates`
    /// records, counting records that lack an embedding
    pub fn cluster_count(&self, candidates: usize) -> usize {
        (candidates / self.records_per_cluster).max(1)
    }
}

/// Result of a consolidation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationResult {
    /// Records in the keep tier
    pub kept_count: usize,
    /// Compress-tier records folded into a new cluster
    pub compressed_count: usize,
    /// Compress-tier records left alone for lack of an embedding
    pub skipped_without_embedding: usize,
    /// Records removed from the store
    pub dropped_count: usize,
    /// IDs of dropped records
    pub dropped_ids: Vec<Uuid>,
    /// IDs of clusters formed in this pass
    pub cluster_ids: Vec<Uuid>,
}

/// Ranks, prunes and compresses the record set
#[derive(Debug, Clone)]
pub struct Consolidator {
    config: ConsolidationConfig,
    retention: RetentionConfig,
    kmeans: KMeans,
    dimension: usize,
}

impl Consolidator {
    /// Create a consolidator for embeddings of `dimension`
    pub fn new(config: ConsolidationConfig, dimension: usize) -> Self {
        let kmeans = match config.seed {
            Some(seed) => KMeans::seeded(config.max_iterations, config.convergence_tolerance, seed),
            None => KMeans::from_entropy(config.max_iterations, config.convergence_tolerance),
        };
        Self {
            config,
            retention: RetentionConfig::default(),
            kmeans,
            dimension,
        }
    }

    /// Replace the clusterer, e.g. with a differently seeded one
    pub fn with_kmeans(mut self, kmeans: KMeans) -> Self {
        self.kmeans = kmeans;
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Whether a store holding `count` records should consolidate
    pub fn should_consolidate(&self, count: usize) -> bool {
        count > self.config.threshold
    }

    /// Run one consolidation pass over the store collections.
    ///
    /// Removes the drop tier from `records`, inserts new clusters into
    /// `clusters`, and tags the clustered compress-tier records.
    pub fn consolidate(
        &mut self,
        records: &mut BTreeMap<Uuid, Record>,
        clusters: &mut BTreeMap<Uuid, Cluster>,
        now: DateTime<Utc>,
    ) -> ConsolidationResult {
        tracing::info!(
            records = records.len(),
            clusters = clusters.len(),
            "Consolidating memory store"
        );

        let mut ranked: Vec<(Uuid, f64)> = records
            .values()
            .map(|r| (r.id, retention_score(r, now, &self.retention)))
            .collect();
        // Stable sort: equal scores keep id order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let keep_end = self.config.keep_end().min(ranked.len());
        let compress_end = self.config.compress_end().clamp(keep_end, ranked.len());

        let mut result = ConsolidationResult {
            kept_count: keep_end,
            ..Default::default()
        };

        for (id, _) in &ranked[compress_end..] {
            if records.remove(id).is_some() {
                result.dropped_ids.push(*id);
            }
        }
        result.dropped_count = result.dropped_ids.len();

        let compress_ids: Vec<Uuid> = ranked[keep_end..compress_end]
            .iter()
            .map(|(id, _)| *id)
            .collect();
        self.compress(&compress_ids, records, clusters, now, &mut result);

        tracing::info!(
            kept = result.kept_count,
            compressed = result.compressed_count,
            dropped = result.dropped_count,
            new_clusters = result.cluster_ids.len(),
            remaining = records.len(),
            "Consolidation complete"
        );
        result
    }

    fn compress(
        &mut self,
        ids: &[Uuid],
        records: &mut BTreeMap<Uuid, Record>,
        clusters: &mut BTreeMap<Uuid, Cluster>,
        now: DateTime<Utc>,
        result: &mut ConsolidationResult,
    ) {
        let points: Vec<(Uuid, Vec<f32>)> = ids
            .iter()
            .filter_map(|id| records.get(id))
            .filter_map(|r| {
                r.embedding()
                    .filter(|e| e.len() == self.dimension)
                    .map(|e| (r.id, e.to_vec()))
            })
            .collect();
        result.skipped_without_embedding = ids.len() - points.len();

        if points.is_empty() {
            if !ids.is_empty() {
                tracing::debug!(
                    candidates = ids.len(),
                    "No embeddable records in compress tier, skipping clustering"
                );
            }
            return;
        }

        // k-means clamps k to the number of embeddable points
        let k = self.config.cluster_count(ids.len());
        let borrowed: Vec<(Uuid, &[f32])> =
            points.iter().map(|(id, e)| (*id, e.as_slice())).collect();
        let groups = self.kmeans.cluster(&borrowed, k);

        for group in groups {
            let members: Vec<&Record> = group.members.iter().filter_map(|id| records.get(id)).collect();
            let Some(first) = members.first() else {
                continue;
            };

            let cluster = Cluster {
                id: Uuid::new_v4(),
                centroid: group.centroid,
                surprise_score: members
                    .iter()
                    .map(|m| m.surprise_score)
                    .fold(f64::NEG_INFINITY, f64::max),
                level: first.metadata.level,
                members: group.members,
                created_at: now,
            };

            for id in &cluster.members {
                if let Some(record) = records.get_mut(id) {
                    record.mark_compressed(cluster.id);
                }
            }

            result.compressed_count += cluster.members.len();
            result.cluster_ids.push(cluster.id);
            clusters.insert(cluster.id, cluster);
        }
    }
}
