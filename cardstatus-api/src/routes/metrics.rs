use actix_web::{Responder, get, web::ThinData};
use metrics_exporter_prometheus::PrometheusHandle;

/// Export metrics
///
/// Renders ingestion and lookup counters in the Prometheus text format.
#[utoipa::path(
    responses(
        (status = 200, description = "Metrics in Prometheus exposition format", body = String)
    ),
    tag = "Metrics"
)]
#[get("/metrics")]
pub async fn metrics(handle: ThinData<PrometheusHandle>) -> impl Responder {
    handle.render()
}
