use async_trait::async_trait;
use cardstatus_postgres::types::{CardStatusRecord, UpsertOutcome};

use crate::error::StoreError;

/// Storage of card status records keyed by card identifier.
///
/// Implementations are shared between the ingestor and the HTTP handlers, so they must be
/// usable behind an `Arc<dyn CardStatusStore>`.
#[async_trait]
pub trait CardStatusStore: Send + Sync {
    /// Ensures the backing table exists. Idempotent.
    async fn initialize(&self) -> Result<(), StoreError>;

    async fn get_card_status(&self, card_id: &str)
    -> Result<Option<CardStatusRecord>, StoreError>;

    /// Inserts `record`, or overwrites the stored comment when the identifier exists and
    /// `record` carries a non-empty comment.
    async fn upsert_card_status(
        &self,
        record: &CardStatusRecord,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Overwrites the comment of an existing record. Returns `false` if there is none.
    async fn update_comment(&self, card_id: &str, comment: &str) -> Result<bool, StoreError>;

    async fn find_by_user_mobile(
        &self,
        user_mobile: &str,
    ) -> Result<Vec<CardStatusRecord>, StoreError>;

    async fn find_by_card_id(&self, card_id: &str) -> Result<Vec<CardStatusRecord>, StoreError>;
}
