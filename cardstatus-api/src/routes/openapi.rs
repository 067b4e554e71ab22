use actix_web::{Responder, get, web::Json};
use cardstatus::CardStatusRecord;
use utoipa::OpenApi;

use crate::routes::ErrorMessage;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::card_status::get_card_status,
        crate::routes::health_check::health_check,
        crate::routes::metrics::metrics,
        openapi_document,
    ),
    components(schemas(CardStatusRecord, ErrorMessage)),
    tags(
        (name = "Card status", description = "Lookups over ingested card statuses")
    )
)]
pub struct ApiDoc;

/// Describe the API
#[utoipa::path(
    responses(
        (status = 200, description = "OpenAPI document of this service")
    ),
    tag = "Docs"
)]
#[get("/api-docs/openapi.json")]
pub async fn openapi_document() -> impl Responder {
    Json(ApiDoc::openapi())
}
