use clap::Parser;
use forte_agi::application::dispatcher::{CallContext, PaymentDispatcher};
use forte_agi::config::Settings;
use forte_agi::domain::ports::{PaymentMethodStoreBox, ResponseStoreBox};
use forte_agi::error::PaymentError;
use forte_agi::infrastructure::agi_client::AgiClient;
use forte_agi::infrastructure::in_memory::{
    InMemoryAccountDirectory, InMemoryPaymentMethodStore, InMemoryResponseStore,
};
use forte_agi::interfaces::csv::operation_reader::OperationReader;
use forte_agi::interfaces::csv::outcome_writer::OutcomeWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Gateway settings (TOML with a [gateway] table)
    #[arg(long)]
    config: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Tenant the operations belong to
    #[arg(long, default_value_t = Uuid::nil())]
    tenant: Uuid,

    /// Reported to the gateway as the user entering the transactions
    #[arg(long)]
    user: Option<String>,
}

fn stores(db_path: Option<PathBuf>) -> Result<(ResponseStoreBox, PaymentMethodStoreBox)> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = db_path {
        let store = forte_agi::infrastructure::rocksdb::RocksDBStore::open(db_path)?;
        return Ok((Box::new(store.clone()), Box::new(store)));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    Ok((
        Box::new(InMemoryResponseStore::new()),
        Box::new(InMemoryPaymentMethodStore::new()),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    let gateway = AgiClient::from_config(&settings.gateway)?;
    let (responses, payment_methods) = stores(cli.db_path)?;

    let dispatcher = PaymentDispatcher::new(
        settings.gateway.credentials(),
        Box::new(gateway),
        responses,
        payment_methods,
        Box::new(InMemoryAccountDirectory::new()),
    );
    let context = CallContext {
        tenant_id: cli.tenant,
        user_name: cli.user,
    };

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    // Operations run one after another so a capture always sees the
    // authorization recorded by an earlier row.
    for op_result in reader.operations()? {
        let operation = match op_result {
            Ok(operation) => operation,
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
                continue;
            }
        };
        match operation.execute(&dispatcher, &context).await {
            Ok(outcome) => writer.write_outcome(&outcome)?,
            Err(PaymentError::PersistenceAfterGateway { outcome, source }) => {
                eprintln!(
                    "Error recording operation for payment {}: {}",
                    outcome.payment_id, source
                );
                writer.write_outcome(&outcome)?;
            }
            Err(e) => {
                eprintln!(
                    "Error processing {} for payment {}: {}",
                    operation.kind, operation.ids.payment_id, e
                );
            }
        }
    }

    writer.flush()?;
    Ok(())
}
