//! Vendor record patcher
//!
//! Scans every vendor of the selected entities and fills the target
//! attribute from the vendor service.

mod cli;
mod interrupt;

use anyhow::Context;
use cli::{CliArgs, LogFormat};
use patcher_core::{PatchConfig, PatchOrchestrator, StrategyRegistry};
use patcher_lookup::{Credentials, VendorServiceClient, DOTENV_FILE};
use patcher_store::{DynamoClientCache, DynamoRecordStore};
use patcher_types::EnvironmentConfig;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,aws_config=warn,hyper=warn";

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    init_tracing(cli::log_format(&matches));

    let outcome = match CliArgs::from_matches(&matches) {
        Ok(args) => run(args).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "patch run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = EnvironmentConfig::load(args.env, args.config.as_deref())
        .context("failed to get config")?;
    tracing::info!(
        env = %config.environment,
        region = %config.store.region,
        table = %config.store.table_name,
        tenants = args.tenants.len(),
        "loaded environment config"
    );

    let clients = DynamoClientCache::new();
    let store = DynamoRecordStore::from_cache(&clients, &config.store).await;
    let lookup = VendorServiceClient::new(&config.lookup, load_credentials())
        .context("failed to build vendor service client")?;

    let orchestrator = PatchOrchestrator::new(
        Arc::new(store),
        StrategyRegistry::with_defaults(Arc::new(lookup)),
        PatchConfig::new().with_concurrency(args.concurrency),
    );

    interrupt::spawn(orchestrator.cancel_token().clone());

    let report = orchestrator
        .run(&args.target, &args.tenants)
        .await
        .with_context(|| format!("failed to patch target {}", args.target))?;

    println!("{report}");

    Ok(if report.cancelled {
        ExitCode::from(interrupt::EXIT_INTERRUPTED)
    } else if report.has_tenant_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Credentials from the environment, with `.env` in the working directory as fallback
fn load_credentials() -> Credentials {
    match Credentials::from_env_file(Path::new(DOTENV_FILE)) {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring dotenv file");
            Credentials::from_env()
        }
    }
}
