use actix_web::{HttpResponse, Responder, get};

/// Check service health
///
/// Returns 200 once ingestion has finished and the server is accepting requests.
#[utoipa::path(
    responses(
        (status = 200, description = "Service is healthy", body = String)
    ),
    tag = "Health"
)]
#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("ok")
}
