use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use continuum::storage::MemoryStore;

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, store: &MemoryStore, format: OutputFormat) -> CliResult<()> {
        let stats = store.stats();
        let snapshot_size = tokio::fs::metadata(store.snapshot_path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "snapshot_path": store.snapshot_path().display().to_string(),
                    "snapshot_size_bytes": snapshot_size,
                    "records": {
                        "total": stats.record_count,
                        "compressed": stats.compressed_count,
                        "uncompressed": stats.uncompressed_count(),
                        "without_embedding": stats.without_embedding_count,
                    },
                    "clusters": stats.cluster_count,
                    "consolidation_threshold": stats.consolidation_threshold,
                    "max_memories": stats.max_memories,
                    "capacity_ratio": stats.capacity_ratio(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Continuum Statistics");
                println!("====================\n");

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Metric", "Value"]);

                table.add_row(["Records", &stats.record_count.to_string()]);
                table.add_row(["Compressed", &stats.compressed_count.to_string()]);
                table.add_row(["Uncompressed", &stats.uncompressed_count().to_string()]);
                table.add_row([
                    "Without Embedding",
                    &stats.without_embedding_count.to_string(),
                ]);
                table.add_row(["Clusters", &stats.cluster_count.to_string()]);
                table.add_row([
                    "Consolidation Threshold",
                    &stats.consolidation_threshold.to_string(),
                ]);
                table.add_row(["Max Memories", &stats.max_memories.to_string()]);

                println!("{table}\n");

                println!(
                    "Capacity: {:.1}% used, snapshot {} ({})",
                    stats.capacity_ratio() * 100.0,
                    format_size(snapshot_size),
                    store.snapshot_path().display()
                );
            }
        }

        Ok(())
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
