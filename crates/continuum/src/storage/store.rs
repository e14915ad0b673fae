//! The memory store aggregate root
//!
//! Owns the record and cluster collections, embeds payloads on write, ranks
//! records on read, and persists the whole snapshot after every mutation.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::memory::scoring::{cosine_similarity, relevance_score};
use crate::memory::types::{Cluster, MetadataOverrides, Record};
use crate::memory::vectorizer::{HashingVectorizer, Vectorizer};
use crate::storage::consolidation::{ConsolidationResult, Consolidator};
use crate::storage::filter::MemoryFilter;
use crate::storage::snapshot::{Snapshot, SnapshotFile};

/// Summary counts for a store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub record_count: usize,
    pub compressed_count: usize,
    pub without_embedding_count: usize,
    pub cluster_count: usize,
    pub consolidation_threshold: usize,
    pub max_memories: usize,
}

impl StoreStats {
    pub fn uncompressed_count(&self) -> usize {
        self.record_count - self.compressed_count
    }

    /// Record count relative to capacity (0.0 to 1.0+)
    pub fn capacity_ratio(&self) -> f64 {
        if self.max_memories == 0 {
            return 0.0;
        }
        self.record_count as f64 / self.max_memories as f64
    }
}

/// Surprise-weighted record store with threshold-triggered consolidation.
///
/// Mutating operations take `&mut self` and run to completion, including
/// the snapshot write. Wrap the store in [`SharedMemoryStore`] to share it
/// between tasks.
pub struct MemoryStore {
    state: Snapshot,
    vectorizer: Box<dyn Vectorizer>,
    consolidator: Consolidator,
    snapshot_file: SnapshotFile,
}

impl MemoryStore {
    /// Build a store from configuration and load its snapshot
    pub async fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let vectorizer = HashingVectorizer::new(config.vectorizer);
        let consolidator =
            Consolidator::new(config.consolidation.clone(), config.vectorizer.dimension);
        let snapshot_file = SnapshotFile::new(&config.store.snapshot_path);

        Ok(Self::with_components(Box::new(vectorizer), consolidator, snapshot_file).await)
    }

    /// Build a store from explicit components and load its snapshot
    pub async fn with_components(
        vectorizer: Box<dyn Vectorizer>,
        consolidator: Consolidator,
        snapshot_file: SnapshotFile,
    ) -> Self {
        let state = snapshot_file.load().await;
        Self {
            state,
            vectorizer,
            consolidator,
            snapshot_file,
        }
    }

    /// Store a payload and return its id.
    ///
    /// A vectorizer failure stores the record without an embedding. When the
    /// record count passes the consolidation threshold, consolidation runs
    /// before returning. Only a failed snapshot write is an error, and then
    /// the record is not kept.
    pub async fn store(
        &mut self,
        payload: Value,
        surprise_score: f64,
        overrides: MetadataOverrides,
    ) -> Result<Uuid> {
        let embedding = match self.vectorizer.embed(&payload) {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Vectorization failed, storing record without embedding: {}", e);
                None
            }
        };

        let record = Record::new(payload, surprise_score, embedding).with_overrides(overrides);
        let id = record.id;
        self.state.memories.insert(id, record);
        tracing::debug!(%id, surprise_score, records = self.len(), "Stored record");

        let persisted = if self.consolidator.should_consolidate(self.len()) {
            self.consolidate().await.map(|_| ())
        } else {
            self.persist().await
        };

        // Memory never runs ahead of the last successful write
        if let Err(e) = persisted {
            self.state.memories.remove(&id);
            return Err(e);
        }

        Ok(id)
    }

    /// Retrieve up to `limit` records ranked by relevance to `query`.
    ///
    /// Every returned record has its access count and last-access time
    /// updated, and the snapshot is persisted. If the write fails the
    /// bookkeeping is reverted.
    pub async fn retrieve(
        &mut self,
        query: &Value,
        limit: usize,
        filter: &MemoryFilter,
    ) -> Result<Vec<Record>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let query_embedding = self.embed_query(query);

        let mut scored: Vec<(Uuid, f64)> = self
            .state
            .memories
            .values()
            .filter(|r| filter.matches(r, now))
            .map(|r| (r.id, relevance_score(&query_embedding, r)))
            .collect();

        if scored.is_empty() {
            tracing::debug!("No records passed retrieval filters");
            return Ok(Vec::new());
        }

        // Stable sort: equal scores keep id order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        let mut results = Vec::with_capacity(scored.len());
        let mut previous = Vec::with_capacity(scored.len());
        for (id, _) in &scored {
            if let Some(record) = self.state.memories.get_mut(id) {
                previous.push((*id, record.metadata.access_count, record.metadata.last_accessed));
                record.mark_accessed(now);
                results.push(record.clone());
            }
        }

        tracing::debug!(returned = results.len(), limit, "Retrieved records");
        if let Err(e) = self.persist().await {
            for (id, access_count, last_accessed) in previous {
                if let Some(record) = self.state.memories.get_mut(&id) {
                    record.metadata.access_count = access_count;
                    record.metadata.last_accessed = last_accessed;
                }
            }
            return Err(e);
        }
        Ok(results)
    }

    /// Rank cluster summaries by centroid similarity times aggregate surprise.
    ///
    /// Read-only: clusters carry no access bookkeeping.
    pub fn retrieve_clusters(&self, query: &Value, limit: usize) -> Vec<(Cluster, f64)> {
        let query_embedding = self.embed_query(query);

        let mut scored: Vec<(&Cluster, f64)> = self
            .state
            .clusters
            .values()
            .map(|c| {
                let score = cosine_similarity(&query_embedding, &c.centroid) * c.surprise_score;
                (c, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(limit)
            .map(|(c, score)| (c.clone(), score))
            .collect()
    }

    /// Rank, prune and compress the store, then persist it.
    ///
    /// If the snapshot write fails the in-memory state is restored to what
    /// it was before consolidation.
    pub async fn consolidate(&mut self) -> Result<ConsolidationResult> {
        let before = self.state.clone();
        let result = self.consolidator.consolidate(
            &mut self.state.memories,
            &mut self.state.clusters,
            Utc::now(),
        );
        if let Err(e) = self.persist().await {
            tracing::warn!("Consolidation not persisted, restoring previous state: {}", e);
            self.state = before;
            return Err(e);
        }
        Ok(result)
    }

    /// Write the current state out; call once more at shutdown
    pub async fn flush(&self) -> Result<()> {
        self.persist().await
    }

    pub fn get(&self, id: Uuid) -> Option<&Record> {
        self.state.memories.get(&id)
    }

    pub fn get_cluster(&self, id: Uuid) -> Option<&Cluster> {
        self.state.clusters.get(&id)
    }

    /// Records in id order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.state.memories.values()
    }

    /// Clusters in id order
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.state.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.state.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.memories.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.state.clusters.len()
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshot_file.path()
    }

    pub fn stats(&self) -> StoreStats {
        let config = self.consolidator.config();
        StoreStats {
            record_count: self.len(),
            compressed_count: self.records().filter(|r| r.compressed).count(),
            without_embedding_count: self.records().filter(|r| r.embedding().is_none()).count(),
            cluster_count: self.cluster_count(),
            consolidation_threshold: config.threshold,
            max_memories: config.max_memories,
        }
    }

    fn embed_query(&self, query: &Value) -> Vec<f32> {
        self.vectorizer.embed(query).unwrap_or_else(|e| {
            tracing::warn!("Failed to vectorize query, all similarities will be zero: {}", e);
            Vec::new()
        })
    }

    async fn persist(&self) -> Result<()> {
        self.snapshot_file.save(&self.state).await
    }
}

/// Cloneable handle that serialises every store operation behind one lock.
///
/// Retrieval takes the lock too, since it updates access bookkeeping.
#[derive(Clone)]
pub struct SharedMemoryStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedMemoryStore {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Build a shared store from configuration
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(MemoryStore::open(config).await?))
    }

    pub async fn store(
        &self,
        payload: Value,
        surprise_score: f64,
        overrides: MetadataOverrides,
    ) -> Result<Uuid> {
        self.inner
            .lock()
            .await
            .store(payload, surprise_score, overrides)
            .await
    }

    pub async fn retrieve(
        &self,
        query: &Value,
        limit: usize,
        filter: &MemoryFilter,
    ) -> Result<Vec<Record>> {
        self.inner.lock().await.retrieve(query, limit, filter).await
    }

    pub async fn consolidate(&self) -> Result<ConsolidationResult> {
        self.inner.lock().await.consolidate().await
    }

    pub async fn flush(&self) -> Result<()> {
        self.inner.lock().await.flush().await
    }

    pub async fn get(&self, id: Uuid) -> Option<Record> {
        self.inner.lock().await.get(id).cloned()
    }

    pub async fn stats(&self) -> StoreStats {
        self.inner.lock().await.stats()
    }

    /// Exclusive access for anything the handle does not wrap
    pub async fn lock(&self) -> MutexGuard<'_, MemoryStore> {
        self.inner.lock().await
    }
}
