use anyhow::{Context, anyhow};
use cardstatus_api::{config::ApiConfig, startup::Application};
use cardstatus_config::{load_config, load_dotenv, shared::PgConnectionConfig};
use cardstatus_telemetry::tracing::init_tracing;
use std::env;
use tracing::{error, info};

/// Entry point for the card status service.
///
/// Without arguments the service ingests the configured files and then serves lookups.
/// `ingest` runs the ingestion alone and exits.
fn main() -> anyhow::Result<()> {
    // `.env` may set `APP_ENVIRONMENT`, which selects the log format.
    let dotenv_path = load_dotenv()?;
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;
    if let Some(path) = dotenv_path {
        info!(path = %path.display(), "loaded environment file");
    }

    actix_web::rt::System::new().block_on(async_main())?;

    Ok(())
}

async fn async_main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let config =
        load_config::<ApiConfig>().context("loading configuration for card status service")?;
    log_pg_connection_config(&config.database);

    match args.as_slice() {
        [] => {
            info!(files = config.ingestion.files.len(), "starting card status service");
            let application = Application::build(config).await?;
            application.run_until_stopped().await?;
        }
        [command] if command == "ingest" => {
            let report = Application::ingest(config).await?;
            let totals = report.totals();
            info!(
                files = report.files.len(),
                rows = totals.rows(),
                failed = totals.failed,
                "ingestion finished"
            );
        }
        [command] => {
            error!(%command, "invalid command");
            return Err(anyhow!("invalid command: {command}"));
        }
        _ => {
            error!("invalid number of command line arguments");
            return Err(anyhow!("invalid number of command line arguments"));
        }
    }

    Ok(())
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    info!(
        dbname = ?config.database_name().ok().flatten(),
        tls_enabled = config.tls.enabled,
        max_connections = config.max_connections,
        "pg database options",
    );
}
