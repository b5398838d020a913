use ams_connector::application::account_lookup::AccountLookup;
use ams_connector::application::booking::BookingOrchestrator;
use ams_connector::application::worker::JobWorker;
use ams_connector::domain::account::Iban;
use ams_connector::domain::ports::{LedgerGatewayRef, MessageAdapterRef};
use ams_connector::infrastructure::in_memory::InMemoryLedger;
use ams_connector::infrastructure::json_adapter::JsonMessageAdapter;
use ams_connector::interfaces::jobs::reader::JobReader;
use ams_connector::interfaces::jobs::writer::OutcomeWriter;
use ams_connector::settings::Settings;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input jobs file, one JSON job per line
    input: PathBuf,

    /// Settings file (TOML)
    #[arg(long)]
    config: PathBuf,

    /// Maximum number of jobs booked concurrently
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config).into_diagnostic()?;
    settings.logging.init();

    let ledger = InMemoryLedger::new();
    for seed in &settings.accounts {
        ledger.open_account(&seed.tenant, seed.id, seed.balance).await;
    }
    for seed in &settings.iban_accounts {
        let iban = Iban::parse(&seed.iban).into_diagnostic()?;
        ledger.register_iban(&seed.tenant, &iban, seed.record()).await;
    }

    let gateway: LedgerGatewayRef = Arc::new(ledger);
    let adapter: MessageAdapterRef = Arc::new(JsonMessageAdapter::new());
    let resolver = settings.resolver();
    let mut tenants: Vec<&str> = resolver.tenants().collect();
    tenants.sort_unstable();
    info!(
        ?tenants,
        accounts = settings.accounts.len(),
        ibans = settings.iban_accounts.len(),
        "Loaded tenant configuration"
    );

    let resolver = Arc::new(resolver);
    let accounts = AccountLookup::new(Arc::clone(&resolver), Arc::clone(&gateway));
    let orchestrator = BookingOrchestrator::new(
        resolver,
        gateway,
        adapter,
        settings.ledger.clone(),
    );
    let worker = JobWorker::new(Arc::new(orchestrator), Arc::new(accounts));
    let permits = Arc::new(Semaphore::new(cli.workers.max(1)));
    info!(workers = cli.workers, "Connector started");

    // Jobs run concurrently; handles are kept in input order for the output.
    let file = File::open(&cli.input).into_diagnostic()?;
    let mut pending = Vec::new();
    for (line, job) in JobReader::new(file).jobs() {
        match job {
            Ok(job) => {
                let worker = worker.clone();
                let permits = Arc::clone(&permits);
                let handle = tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    let outcome = worker.handle(&job).await;
                    (job, outcome)
                });
                pending.push(handle);
            }
            Err(e) => {
                eprintln!("Error reading job on line {}: {}", line, e);
            }
        }
    }

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    for handle in pending {
        let (job, outcome) = handle.await.into_diagnostic()?;
        writer.write_outcome(&job, &outcome).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
