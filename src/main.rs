use clap::{Parser, Subcommand};
use shipment_analytics::config::Config;
use shipment_analytics::db::ShipmentStore;
use shipment_analytics::observability;
use shipment_analytics::pipeline::dedupe::dedupe;
use shipment_analytics::pipeline::ingest::{ensure_csv_filename, ingest_csv};
use shipment_analytics::pipeline::missing::{handle as handle_missing, MissingValueStrategy};
use shipment_analytics::logging;
use shipment_analytics::server::{start_server, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "shipment_analytics")]
#[command(about = "Shipment analytics and cargo consolidation engine")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Ingest a shipment CSV file, replacing the current data set
    Ingest {
        /// Path to the .csv file to load
        file: PathBuf,
    },
    /// Re-run deduplication over the current data set
    Dedupe,
    /// Apply a missing-value strategy (reject or fill_zero)
    MissingValues {
        #[arg(long)]
        strategy: String,
    },
    /// Show the store status
    Status,
    /// Delete the persisted data set
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let store = Arc::new(ShipmentStore::open(&config.database.path)?);

    match cli.command {
        Commands::Serve { port } => {
            observability::init_metrics();
            let port = port.unwrap_or(config.server.port);
            let state = AppState {
                store,
                config: Arc::new(config),
            };
            start_server(state, port).await?;
        }
        Commands::Ingest { file } => {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            ensure_csv_filename(&name)?;
            let data = std::fs::read(&file)?;
            info!("Ingesting {}", file.display());
            let report = ingest_csv(&store, &data)?;
            println!("\n📊 Ingest results for {}:", file.display());
            println!("   Total uploaded:     {}", report.total_uploaded);
            println!("   Duplicates removed: {}", report.duplicates_removed);
            println!("   Total shipments:    {}", report.total_shipments);
            println!("   Rejected rows:      {}", report.rejected_rows);
            if !report.violations.is_empty() {
                println!("\n⚠️  Rejected rows:");
                for violation in &report.violations {
                    println!("   - {violation}");
                }
            }
        }
        Commands::Dedupe => {
            let removed = dedupe(&store)?;
            println!("Removed {removed} duplicate shipments");
        }
        Commands::MissingValues { strategy } => {
            let strategy: MissingValueStrategy = strategy.parse()?;
            let rows = handle_missing(&store, strategy)?;
            match strategy {
                MissingValueStrategy::Reject => {
                    println!("{} incomplete rows:", rows.len());
                    for row in &rows {
                        println!("   {}", serde_json::to_string(row)?);
                    }
                }
                MissingValueStrategy::FillZero => {
                    println!("Filled null weight/volume with zero");
                }
            }
        }
        Commands::Status => {
            let status = store.status()?;
            println!("exists: {}", status.exists);
            println!("loaded: {}", status.loaded);
            println!("total_shipments: {}", status.total_shipments);
        }
        Commands::Reset => {
            if store.reset()? {
                println!("Shipment data set deleted");
            } else {
                println!("No shipment data set to delete");
            }
        }
    }

    Ok(())
}
