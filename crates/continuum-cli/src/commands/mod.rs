pub mod config;
pub mod consolidate;
pub mod memory;
pub mod stats;

pub use config::ConfigCommand;
pub use consolidate::ConsolidateCommand;
pub use memory::MemoryCommand;
pub use stats::StatsCommand;
