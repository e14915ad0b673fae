pub mod clustering;
pub mod consolidation;
pub mod filter;
pub mod snapshot;
pub mod store;

pub use clustering::{ClusterAssignment, KMeans};
pub use consolidation::{ConsolidationConfig, ConsolidationResult, Consolidator};
pub use filter::MemoryFilter;
pub use snapshot::{Snapshot, SnapshotFile};
pub use store::{MemoryStore, SharedMemoryStore, StoreStats};
