use actix_web::{
    HttpResponse, Responder, ResponseError, get,
    http::StatusCode,
    web::{Data, Json, Query},
};
use cardstatus::CardStatusRecord;
use cardstatus::error::StoreError;
use cardstatus::store::CardStatusStore;
use cardstatus_telemetry::metrics::record_query;
use serde::Deserialize;
use thiserror::Error;
use utoipa::IntoParams;

use crate::routes::ErrorMessage;

#[derive(Debug, Error)]
pub enum CardStatusError {
    #[error("Phone number or card ID is required")]
    MissingFilter,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CardStatusError {
    pub fn to_message(&self) -> String {
        match self {
            // Do not expose internal database details in error messages
            CardStatusError::Store(_) => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

impl ResponseError for CardStatusError {
    fn status_code(&self) -> StatusCode {
        match self {
            CardStatusError::MissingFilter => StatusCode::BAD_REQUEST,
            CardStatusError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorMessage {
            error: self.to_message(),
        })
    }
}

/// Query string of the lookup. One of the two filters must be present.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CardStatusQuery {
    /// Mobile number the cards were issued to. Wins over `card_id` when both are set.
    #[param(example = "585949014")]
    pub phone_number: Option<String>,
    /// Identifier of a single card.
    #[param(example = "ZYW8827")]
    pub card_id: Option<String>,
}

/// Filter picked from a [`CardStatusQuery`].
#[derive(Debug, PartialEq, Eq)]
pub enum CardStatusFilter<'a> {
    UserMobile(&'a str),
    CardId(&'a str),
}

impl CardStatusFilter<'_> {
    fn label(&self) -> &'static str {
        match self {
            CardStatusFilter::UserMobile(_) => "phone_number",
            CardStatusFilter::CardId(_) => "card_id",
        }
    }
}

impl CardStatusQuery {
    /// Returns the filter to apply. Empty parameters count as missing.
    pub fn filter(&self) -> Option<CardStatusFilter<'_>> {
        non_empty(&self.phone_number)
            .map(CardStatusFilter::UserMobile)
            .or_else(|| non_empty(&self.card_id).map(CardStatusFilter::CardId))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Look up card statuses
///
/// Returns every card issued to a phone number, or the card with the given identifier.
/// Exact matches only; results are ordered by card identifier.
#[utoipa::path(
    params(CardStatusQuery),
    responses(
        (status = 200, description = "Matching card statuses, possibly empty", body = Vec<CardStatusRecord>),
        (status = 400, description = "Neither phone number nor card ID was given", body = ErrorMessage),
        (status = 500, description = "Internal server error", body = ErrorMessage)
    ),
    tag = "Card status"
)]
#[get("/get_card_status")]
pub async fn get_card_status(
    store: Data<dyn CardStatusStore>,
    query: Query<CardStatusQuery>,
) -> Result<impl Responder, CardStatusError> {
    let filter = query.filter().ok_or(CardStatusError::MissingFilter)?;
    record_query(filter.label());

    let records = match filter {
        CardStatusFilter::UserMobile(user_mobile) => {
            store.find_by_user_mobile(user_mobile).await?
        }
        CardStatusFilter::CardId(card_id) => store.find_by_card_id(card_id).await?,
    };

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(phone_number: Option<&str>, card_id: Option<&str>) -> CardStatusQuery {
        CardStatusQuery {
            phone_number: phone_number.map(str::to_owned),
            card_id: card_id.map(str::to_owned),
        }
    }

    #[test]
    fn phone_number_wins_over_card_id() {
        assert_eq!(
            query(Some("555"), Some("C1")).filter(),
            Some(CardStatusFilter::UserMobile("555"))
        );
        assert_eq!(
            query(None, Some("C1")).filter(),
            Some(CardStatusFilter::CardId("C1"))
        );
    }

    #[test]
    fn empty_parameters_are_missing() {
        assert_eq!(query(None, None).filter(), None);
        assert_eq!(query(Some(""), Some("")).filter(), None);
        assert_eq!(
            query(Some(""), Some("C1")).filter(),
            Some(CardStatusFilter::CardId("C1"))
        );
    }

    #[test]
    fn store_failures_hide_details() {
        let err = CardStatusError::Store(StoreError::Database(sqlx::Error::PoolClosed));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_message(), "Internal server error");
        assert_eq!(
            CardStatusError::MissingFilter.to_message(),
            "Phone number or card ID is required"
        );
    }
}
