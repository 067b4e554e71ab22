use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod card_status;
pub mod health_check;
pub mod metrics;
pub mod openapi;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorMessage {
    #[schema(example = "Phone number or card ID is required")]
    pub error: String,
}
