use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use continuum::memory::{MetadataOverrides, Record};
use continuum::storage::{MemoryFilter, MemoryStore};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, payload_preview, truncate_string};

#[derive(Parser)]
pub struct MemoryCommand {
    #[clap(subcommand)]
    pub command: MemorySubcommand,
}

#[derive(Subcommand)]
pub enum MemorySubcommand {
    #[clap(about = "Store a new record")]
    Store(StoreArgs),

    #[clap(about = "Retrieve records ranked by relevance to a query")]
    Retrieve(RetrieveArgs),

    #[clap(about = "Show record details")]
    Show(ShowArgs),

    #[clap(about = "List records")]
    List(ListArgs),

    #[clap(about = "Rank cluster summaries against a query")]
    Clusters(ClustersArgs),
}

#[derive(Parser)]
pub struct StoreArgs {
    #[clap(help = "Record payload text")]
    pub text: String,

    #[clap(long, default_value = "0.5", help = "Surprise score for the record")]
    pub surprise: f64,

    #[clap(long, help = "Hierarchy level (default: 0)")]
    pub level: Option<u32>,

    #[clap(long, help = "Context label")]
    pub context: Option<String>,

    #[clap(long, help = "Parse the payload text as JSON")]
    pub json_payload: bool,
}

#[derive(Parser)]
pub struct RetrieveArgs {
    #[clap(help = "Query text")]
    pub query: String,

    #[clap(
        long,
        short,
        default_value = "5",
        help = "Maximum number of records to return"
    )]
    pub limit: usize,

    #[clap(long, help = "Minimum surprise score")]
    pub min_surprise: Option<f64>,

    #[clap(long, help = "Maximum record age in hours")]
    pub max_age_hours: Option<i64>,

    #[clap(long, help = "Only records at this level")]
    pub level: Option<u32>,

    #[clap(long, help = "Only records with this context label")]
    pub context: Option<String>,

    #[clap(long, help = "Skip records already folded into a cluster")]
    pub exclude_compressed: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    #[clap(help = "Record ID (UUID format)")]
    pub id: String,
}

#[derive(Parser)]
pub struct ListArgs {
    #[clap(
        long,
        short,
        default_value = "20",
        help = "Maximum number of records to display"
    )]
    pub limit: usize,

    #[clap(long, help = "Show only compressed records")]
    pub compressed: bool,

    #[clap(
        long,
        help = "Show only uncompressed records",
        conflicts_with = "compressed"
    )]
    pub uncompressed: bool,
}

#[derive(Parser)]
pub struct ClustersArgs {
    #[clap(long, short, help = "Query text (default: empty query)")]
    pub query: Option<String>,

    #[clap(
        long,
        short,
        default_value = "10",
        help = "Maximum number of clusters to display"
    )]
    pub limit: usize,
}

impl MemoryCommand {
    pub async fn execute(&self, store: &mut MemoryStore, format: OutputFormat) -> CliResult<()> {
        match &self.command {
            MemorySubcommand::Store(args) => Self::store(store, args, format).await,
            MemorySubcommand::Retrieve(args) => Self::retrieve(store, args, format).await,
            MemorySubcommand::Show(args) => Self::show(store, args, format),
            MemorySubcommand::List(args) => Self::list(store, args, format),
            MemorySubcommand::Clusters(args) => Self::clusters(store, args, format),
        }
    }

    async fn store(store: &mut MemoryStore, args: &StoreArgs, format: OutputFormat) -> CliResult<()> {
        let payload: Value = if args.json_payload {
            serde_json::from_str(&args.text).map_err(|e| format!("Invalid JSON payload: {e}"))?
        } else {
            Value::String(args.text.clone())
        };

        let mut overrides = MetadataOverrides::new();
        if let Some(level) = args.level {
            overrides = overrides.with_level(level);
        }
        if let Some(ref context) = args.context {
            overrides = overrides.with_context(context.clone());
        }

        let id = store.store(payload, args.surprise, overrides).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": id.to_string(),
                    "stored": true,
                    "record_count": store.len(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Record stored successfully.");
                println!("ID: {id}");
            }
        }

        Ok(())
    }

    async fn retrieve(
        store: &mut MemoryStore,
        args: &RetrieveArgs,
        format: OutputFormat,
    ) -> CliResult<()> {
        let mut filter = MemoryFilter::new();
        if let Some(min_surprise) = args.min_surprise {
            filter = filter.with_min_surprise(min_surprise);
        }
        if let Some(hours) = args.max_age_hours {
            filter = filter.with_max_age(max_age_from_hours(hours)?);
        }
        if let Some(level) = args.level {
            filter = filter.with_level(level);
        }
        if let Some(ref context) = args.context {
            filter = filter.with_context(context.clone());
        }
        if args.exclude_compressed {
            filter = filter.exclude_compressed();
        }

        let query = Value::String(args.query.clone());
        let records = store.retrieve(&query, args.limit, &filter).await?;

        print_records(&records, format, "No matching records found.")
    }

    fn show(store: &MemoryStore, args: &ShowArgs, format: OutputFormat) -> CliResult<()> {
        let id = Uuid::parse_str(&args.id).map_err(|e| format!("Invalid UUID format: {e}"))?;

        let record = store
            .get(id)
            .ok_or_else(|| format!("Record not found: {}", args.id))?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(record)?);
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Property", "Value"]);

                let embedding_size = record.embedding().map_or(0, |e| e.len());
                let cluster = record
                    .parent_cluster_id
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());

                table.add_row(["ID", &record.id.to_string()]);
                table.add_row(["Payload", &payload_preview(&record.payload, 500)]);
                table.add_row(["Surprise", &format!("{:.4}", record.surprise_score)]);
                table.add_row(["Level", &record.metadata.level.to_string()]);
                table.add_row(["Context", record.metadata.context.as_deref().unwrap_or("-")]);
                table.add_row(["Created", &record.metadata.created_at.to_rfc3339()]);
                table.add_row(["Last Accessed", &record.metadata.last_accessed.to_rfc3339()]);
                table.add_row(["Access Count", &record.metadata.access_count.to_string()]);
                table.add_row(["Compressed", &record.compressed.to_string()]);
                table.add_row(["Cluster", &cluster]);
                table.add_row(["Embedding Size", &embedding_size.to_string()]);

                println!("{table}");
            }
        }

        Ok(())
    }

    fn list(store: &MemoryStore, args: &ListArgs, format: OutputFormat) -> CliResult<()> {
        let mut records: Vec<Record> = store
            .records()
            .filter(|r| {
                if args.compressed {
                    r.compressed
                } else if args.uncompressed {
                    !r.compressed
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        records.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        records.truncate(args.limit);

        print_records(&records, format, "No records found.")
    }

    fn clusters(store: &MemoryStore, args: &ClustersArgs, format: OutputFormat) -> CliResult<()> {
        let query = Value::String(args.query.clone().unwrap_or_default());
        let ranked = store.retrieve_clusters(&query, args.limit);

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = ranked
                    .iter()
                    .map(|(cluster, score)| {
                        serde_json::json!({
                            "id": cluster.id.to_string(),
                            "score": score,
                            "members": cluster.members.len(),
                            "surprise_score": cluster.surprise_score,
                            "level": cluster.level,
                            "created_at": cluster.created_at.to_rfc3339(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if ranked.is_empty() {
                    println!("No clusters found.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Score", "Members", "Surprise", "Level", "Created"]);

                for (cluster, score) in &ranked {
                    table.add_row([
                        truncate_string(&cluster.id.to_string(), 8),
                        format!("{score:.4}"),
                        cluster.members.len().to_string(),
                        format!("{:.2}", cluster.surprise_score),
                        cluster.level.to_string(),
                        format_timestamp(&cluster.created_at),
                    ]);
                }

                println!("{table}");
                println!("\nTotal: {} clusters", ranked.len());
            }
        }

        Ok(())
    }
}

fn max_age_from_hours(hours: i64) -> CliResult<chrono::Duration> {
    chrono::Duration::try_hours(hours)
        .ok_or_else(|| format!("Max age out of range: {hours} hours").into())
}

fn print_records(records: &[Record], format: OutputFormat, empty_message: &str) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let output: Vec<_> = records
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id.to_string(),
                        "payload": &r.payload,
                        "surprise_score": r.surprise_score,
                        "level": r.metadata.level,
                        "context": r.metadata.context,
                        "access_count": r.metadata.access_count,
                        "compressed": r.compressed,
                        "created_at": r.metadata.created_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("{empty_message}");
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(["ID", "Payload", "Surprise", "Level", "Accesses", "Compressed", "Created"]);

            for record in records {
                table.add_row([
                    truncate_string(&record.id.to_string(), 8),
                    payload_preview(&record.payload, 50),
                    format!("{:.2}", record.surprise_score),
                    record.metadata.level.to_string(),
                    record.metadata.access_count.to_string(),
                    if record.compressed { "yes" } else { "no" }.to_string(),
                    format_timestamp(&record.metadata.created_at),
                ]);
            }

            println!("{table}");
            println!("\nTotal: {} records", records.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_args_defaults() {
        let cmd = MemoryCommand::try_parse_from(["memory", "store", "hello"]).unwrap();
        match cmd.command {
            MemorySubcommand::Store(args) => {
                assert_eq!(args.text, "hello");
                assert_eq!(args.surprise, 0.5);
                assert!(args.level.is_none());
                assert!(!args.json_payload);
            }
            _ => panic!("expected store subcommand"),
        }
    }

    #[test]
    fn retrieve_args_parse_filters() {
        let cmd = MemoryCommand::try_parse_from([
            "memory",
            "retrieve",
            "query",
            "--limit",
            "3",
            "--min-surprise",
            "0.4",
            "--max-age-hours",
            "24",
            "--exclude-compressed",
        ])
        .unwrap();
        match cmd.command {
            MemorySubcommand::Retrieve(args) => {
                assert_eq!(args.limit, 3);
                assert_eq!(args.min_surprise, Some(0.4));
                assert_eq!(args.max_age_hours, Some(24));
                assert!(args.exclude_compressed);
            }
            _ => panic!("expected retrieve subcommand"),
        }
    }

    #[test]
    fn max_age_hours_out_of_range_is_an_error() {
        assert_eq!(max_age_from_hours(24).unwrap(), chrono::Duration::hours(24));
        let err = max_age_from_hours(i64::MAX).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn list_rejects_conflicting_compression_flags() {
        let result =
            MemoryCommand::try_parse_from(["memory", "list", "--compressed", "--uncompressed"]);
        assert!(result.is_err());
    }
}
