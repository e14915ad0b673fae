use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use continuum::storage::MemoryStore;

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConsolidateCommand {
    #[clap(long, help = "Consolidate only when the store is past its threshold")]
    pub if_needed: bool,
}

impl ConsolidateCommand {
    pub async fn execute(&self, store: &mut MemoryStore, format: OutputFormat) -> CliResult<()> {
        let before = store.len();
        let threshold = store.stats().consolidation_threshold;

        if self.if_needed && before <= threshold {
            match format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "consolidated": false,
                        "record_count": before,
                        "threshold": threshold,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => {
                    println!("Store holds {before} records (threshold {threshold}); nothing to do.");
                }
            }
            return Ok(());
        }

        let result = store.consolidate().await?;
        let after = store.len();

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "consolidated": true,
                    "records_before": before,
                    "records_after": after,
                    "kept": result.kept_count,
                    "compressed": result.compressed_count,
                    "skipped_without_embedding": result.skipped_without_embedding,
                    "dropped": result.dropped_count,
                    "clusters_created": result.cluster_ids.len(),
                    "cluster_ids": result.cluster_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Consolidation Results");
                println!("=====================\n");

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Tier", "Records"]);

                table.add_row(["Kept", &result.kept_count.to_string()]);
                table.add_row(["Compressed", &result.compressed_count.to_string()]);
                table.add_row([
                    "Skipped (no embedding)",
                    &result.skipped_without_embedding.to_string(),
                ]);
                table.add_row(["Dropped", &result.dropped_count.to_string()]);

                println!("{table}\n");
                println!(
                    "Records: {} -> {} ({} clusters created)",
                    before,
                    after,
                    result.cluster_ids.len()
                );
            }
        }

        Ok(())
    }
}
