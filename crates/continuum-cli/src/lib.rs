pub mod commands;
pub mod error;
pub mod output;

pub use commands::{ConfigCommand, ConsolidateCommand, MemoryCommand, StatsCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_timestamp, payload_preview, truncate_string};
