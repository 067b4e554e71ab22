use std::{io, net::TcpListener, sync::Arc};

use actix_web::{App, HttpServer, dev::Server, web};
use cardstatus::error::{IngestionError, StoreError};
use cardstatus::ingest::{BatchIngestor, IngestionReport};
use cardstatus::mapping::ColumnMapping;
use cardstatus::store::{CardStatusStore, PostgresStore};
use cardstatus_config::shared::{IngestionConfig, ValidationError};
use cardstatus_telemetry::metrics::init_metrics_handle;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;

use crate::config::ApiConfig;
use crate::routes::{
    card_status::get_card_status, health_check::health_check, metrics::metrics,
    openapi::openapi_document,
};

/// Errors that prevent the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("failed to prepare the card status table: {0}")]
    Store(#[from] StoreError),

    #[error("ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("failed to install the metrics recorder: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind the HTTP listener: {0}")]
    Io(#[from] io::Error),
}

/// Card status service wrapper.
///
/// Owns the running HTTP server. By the time a value exists the table has been created
/// and every source file ingested.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Prepares the store, runs ingestion and binds the HTTP server.
    ///
    /// The listener is only bound after ingestion finishes, so no request can observe a
    /// partially ingested table.
    pub async fn build(config: ApiConfig) -> Result<Self, StartupError> {
        let store = connect_store(&config)?;
        prepare_store(store.clone(), &config.ingestion).await?;

        let address = config.application.to_string();
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        info!(%address, port, "listening for requests");

        let server = run(listener, store)?;

        Ok(Self { port, server })
    }

    /// Creates the table and ingests the configured files without serving requests.
    pub async fn ingest(config: ApiConfig) -> Result<IngestionReport, StartupError> {
        let store = connect_store(&config)?;

        prepare_store(store, &config.ingestion).await
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Runs the server until it receives a shutdown signal.
    pub async fn run_until_stopped(self) -> Result<(), io::Error> {
        self.server.await
    }
}

fn connect_store(config: &ApiConfig) -> Result<Arc<dyn CardStatusStore>, StartupError> {
    config.validate()?;

    Ok(Arc::new(PostgresStore::connect_lazy(&config.database)?))
}

/// Ensures the table exists, then ingests every configured file in order.
pub async fn prepare_store(
    store: Arc<dyn CardStatusStore>,
    ingestion: &IngestionConfig,
) -> Result<IngestionReport, StartupError> {
    if let Err(err) = store.initialize().await {
        error!(error = %err, "failed to create the card status table");
        return Err(err.into());
    }

    let mapping = ColumnMapping::new(ingestion.columns.clone())?;
    let report = BatchIngestor::new(store, mapping)
        .ingest_files(&ingestion.files)
        .await?;

    Ok(report)
}

/// Creates the HTTP server serving lookups from `store`.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn CardStatusStore>,
) -> Result<Server, StartupError> {
    let prometheus_handle = web::ThinData(init_metrics_handle()?);
    let store: web::Data<dyn CardStatusStore> = store.into();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .service(get_card_status)
            .service(health_check)
            .service(metrics)
            .service(openapi_document)
            .app_data(store.clone())
            .app_data(prometheus_handle.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
