use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use continuum::config::Config;

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    #[clap(about = "Show the effective configuration")]
    Show,
}

impl ConfigCommand {
    pub fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        match self.command {
            ConfigSubcommand::Show => Self::show(config, format),
        }
    }

    fn show(config: &Config, format: OutputFormat) -> CliResult<()> {
        let c = &config.consolidation;
        let seed = c
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string());

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "store": {
                        "snapshot_path": config.store.snapshot_path.display().to_string(),
                    },
                    "vectorizer": {
                        "dimension": config.vectorizer.dimension,
                        "max_tokens": config.vectorizer.max_tokens,
                        "hash_seed": config.vectorizer.hash_seed,
                    },
                    "consolidation": {
                        "threshold": c.threshold,
                        "max_memories": c.max_memories,
                        "keep_percent": c.keep_percent,
                        "compress_until_percent": c.compress_until_percent,
                        "records_per_cluster": c.records_per_cluster,
                        "max_iterations": c.max_iterations,
                        "convergence_tolerance": c.convergence_tolerance,
                        "seed": c.seed,
                    },
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Setting", "Value"]);

                table.add_row([
                    "store.snapshot_path",
                    &config.store.snapshot_path.display().to_string(),
                ]);
                table.add_row(["vectorizer.dimension", &config.vectorizer.dimension.to_string()]);
                table.add_row(["vectorizer.max_tokens", &config.vectorizer.max_tokens.to_string()]);
                table.add_row(["vectorizer.hash_seed", &config.vectorizer.hash_seed.to_string()]);
                table.add_row(["consolidation.threshold", &c.threshold.to_string()]);
                table.add_row(["consolidation.max_memories", &c.max_memories.to_string()]);
                table.add_row(["consolidation.keep_percent", &c.keep_percent.to_string()]);
                table.add_row([
                    "consolidation.compress_until_percent",
                    &c.compress_until_percent.to_string(),
                ]);
                table.add_row([
                    "consolidation.records_per_cluster",
                    &c.records_per_cluster.to_string(),
                ]);
                table.add_row(["consolidation.max_iterations", &c.max_iterations.to_string()]);
                table.add_row([
                    "consolidation.convergence_tolerance",
                    &c.convergence_tolerance.to_string(),
                ]);
                table.add_row(["consolidation.seed", &seed]);

                println!("{table}");
            }
        }

        Ok(())
    }
}
