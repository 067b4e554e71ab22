//! Postgres access for the `card_status` table.

pub mod card_status;
pub mod schema;
#[cfg(feature = "test-utils")]
pub mod sqlx;
pub mod types;
