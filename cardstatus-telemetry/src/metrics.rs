use std::{sync::Mutex, time::Duration};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

/// Rows handled by the ingestor, labelled by `outcome`.
pub const INGESTED_ROWS_TOTAL: &str = "cardstatus_ingested_rows_total";

/// Lookups served by the query endpoint, labelled by `filter`.
pub const QUERIES_TOTAL: &str = "cardstatus_queries_total";

/// Interval between upkeep runs of the Prometheus recorder.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

// The recorder can only be installed once per process, but tests build the HTTP app many
// times. A `Mutex` is used because initialization is fallible.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Installs the Prometheus recorder and returns a handle for rendering `/metrics`.
///
/// Subsequent calls return clones of the first handle. Must be called from within a
/// Tokio runtime because it spawns the recorder upkeep task.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    describe_counter!(
        INGESTED_ROWS_TOTAL,
        "Rows read from source files, by reconciliation outcome."
    );
    describe_counter!(QUERIES_TOTAL, "Card status lookups, by filter kind.");

    let handle_clone = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(UPKEEP_INTERVAL).await;
            trace!("running metrics upkeep");
            handle_clone.run_upkeep();
        }
    });

    Ok(handle)
}

/// Counts one ingested row with the given outcome label.
pub fn record_ingested_row(outcome: &'static str) {
    counter!(INGESTED_ROWS_TOTAL, "outcome" => outcome).increment(1);
}

/// Counts one lookup with the given filter label.
pub fn record_query(filter: &'static str) {
    counter!(QUERIES_TOTAL, "filter" => filter).increment(1);
}
