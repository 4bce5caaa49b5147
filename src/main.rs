use clap::Parser;
use contractpay::application::engine::FulfillmentEngine;
use contractpay::config::EngineConfig;
use contractpay::domain::ports::Stores;
use contractpay::infrastructure::fees::FlatRateFeeCalculator;
use contractpay::infrastructure::in_memory::in_memory_stores;
use contractpay::infrastructure::notify::TracingNotifier;
use contractpay::infrastructure::transfer::SimulatedTransferService;
use contractpay::interfaces::batch::BatchRunner;
use contractpay::interfaces::csv::command_reader::CommandReader;
use contractpay::interfaces::csv::payment_writer::PaymentWriter;
use contractpay::interfaces::seed::Seed;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed JSON with talents, contracts and milestones
    seed: PathBuf,

    /// Lifecycle commands CSV file
    commands: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Payout account the simulated transfer service declines (repeatable)
    #[arg(long = "decline", value_name = "ACCOUNT")]
    declined: Vec<String>,

    /// Seconds to wait for a transfer before marking its payment FAILED
    #[arg(long, env = "CONTRACTPAY_TRANSFER_TIMEOUT_SECS", default_value_t = 30)]
    transfer_timeout_secs: u64,

    /// Province used for fees when a talent has none on file
    #[arg(long, env = "CONTRACTPAY_DEFAULT_PROVINCE", default_value = "ON")]
    default_province: String,

    /// Platform fee as a fraction of the gross amount
    #[arg(long, env = "CONTRACTPAY_PLATFORM_FEE_RATE", default_value = "0.10")]
    platform_fee_rate: Decimal,

    /// Processing fee fraction, added on top of the platform fee
    #[arg(long, env = "CONTRACTPAY_PROCESSING_FEE_RATE", default_value = "0")]
    processing_fee_rate: Decimal,
}

fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = contractpay::infrastructure::rocksdb::RocksDBStore::open(path)
                .into_diagnostic()?;
            Ok(store.stores())
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let stores = open_stores(cli.db_path)?;
    let seed = Seed::from_reader(File::open(&cli.seed).into_diagnostic()?).into_diagnostic()?;
    let labels = seed.apply(&stores).await.into_diagnostic()?;

    let config = EngineConfig::default()
        .with_transfer_timeout(Duration::from_secs(cli.transfer_timeout_secs))
        .with_default_province(cli.default_province);
    let fees = FlatRateFeeCalculator::new(cli.platform_fee_rate)
        .with_processing_rate(cli.processing_fee_rate);
    let transfers = SimulatedTransferService::new().declining(cli.declined);
    let engine = FulfillmentEngine::new(
        stores,
        Arc::new(fees),
        Arc::new(transfers),
        Arc::new(TracingNotifier),
        config,
    );
    let mut runner = BatchRunner::new(engine, labels);

    // Process commands
    let file = File::open(&cli.commands).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (row, command) in reader.commands().enumerate() {
        match command {
            Ok(command) => {
                if let Err(e) = runner.apply(command).await {
                    eprintln!("Error processing command {}: {} ({})", row + 1, e, e.kind());
                }
            }
            Err(e) => {
                eprintln!("Error reading command {}: {}", row + 1, e);
            }
        }
    }

    let payments = runner
        .payments(seed.contract_labels())
        .await
        .into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = PaymentWriter::new(stdout.lock());
    writer
        .write_payments(&payments, runner.labels())
        .into_diagnostic()?;

    Ok(())
}
