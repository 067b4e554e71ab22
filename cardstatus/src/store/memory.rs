use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use cardstatus_postgres::types::{CardStatusRecord, UpsertOutcome};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::base::CardStatusStore;

/// In-memory [`CardStatusStore`] for tests and local experiments.
///
/// Records are kept ordered by card identifier, matching the order the Postgres store
/// returns. Everything is lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<BTreeMap<String, CardStatusRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored record ordered by card identifier.
    pub async fn records(&self) -> Vec<CardStatusRecord> {
        self.records.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl CardStatusStore for MemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get_card_status(
        &self,
        card_id: &str,
    ) -> Result<Option<CardStatusRecord>, StoreError> {
        Ok(self.records.lock().await.get(card_id).cloned())
    }

    async fn upsert_card_status(
        &self,
        record: &CardStatusRecord,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut records = self.records.lock().await;

        match records.entry(record.card_id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(UpsertOutcome::Inserted)
            }
            Entry::Occupied(mut entry) => match record.non_empty_comment() {
                Some(comment) => {
                    entry.get_mut().comment = Some(comment.to_owned());
                    Ok(UpsertOutcome::CommentUpdated)
                }
                None => Ok(UpsertOutcome::Unchanged),
            },
        }
    }

    async fn update_comment(&self, card_id: &str, comment: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;

        match records.get_mut(card_id) {
            Some(existing) => {
                existing.comment = Some(comment.to_owned());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_user_mobile(
        &self,
        user_mobile: &str,
    ) -> Result<Vec<CardStatusRecord>, StoreError> {
        let records = self.records.lock().await;

        Ok(records
            .values()
            .filter(|record| record.user_mobile.as_deref() == Some(user_mobile))
            .cloned()
            .collect())
    }

    async fn find_by_card_id(&self, card_id: &str) -> Result<Vec<CardStatusRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .get(card_id)
            .cloned()
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_inserts_then_patches_comment_only() {
        let store = MemoryStore::new();
        let first = CardStatusRecord::new("C1")
            .with_user_mobile("5551234567")
            .with_status("Pickup");

        assert_eq!(
            store.upsert_card_status(&first).await.unwrap(),
            UpsertOutcome::Inserted
        );

        let second = CardStatusRecord::new("C1")
            .with_status("Delivered")
            .with_comment("left at door");
        assert_eq!(
            store.upsert_card_status(&second).await.unwrap(),
            UpsertOutcome::CommentUpdated
        );

        let stored = store.get_card_status("C1").await.unwrap().unwrap();
        assert_eq!(stored.status.as_deref(), Some("Pickup"));
        assert_eq!(stored.user_mobile.as_deref(), Some("5551234567"));
        assert_eq!(stored.comment.as_deref(), Some("left at door"));
    }

    #[tokio::test]
    async fn upsert_without_comment_leaves_existing_row() {
        let store = MemoryStore::new();
        let original = CardStatusRecord::new("C1").with_comment("keep me");
        store.upsert_card_status(&original).await.unwrap();

        let outcome = store
            .upsert_card_status(&CardStatusRecord::new("C1").with_comment(""))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert_eq!(store.records().await, vec![original]);
    }

    #[tokio::test]
    async fn update_comment_reports_missing_rows() {
        let store = MemoryStore::new();

        assert!(!store.update_comment("nope", "x").await.unwrap());
    }

    #[tokio::test]
    async fn lookups_filter_and_order_by_card_id() {
        let store = MemoryStore::new();
        for record in [
            CardStatusRecord::new("B").with_user_mobile("555"),
            CardStatusRecord::new("A").with_user_mobile("555"),
            CardStatusRecord::new("C").with_user_mobile("777"),
        ] {
            store.upsert_card_status(&record).await.unwrap();
        }

        let by_mobile = store.find_by_user_mobile("555").await.unwrap();
        let ids: Vec<_> = by_mobile.iter().map(|r| r.card_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);

        assert_eq!(store.find_by_card_id("C").await.unwrap().len(), 1);
        assert!(store.find_by_card_id("D").await.unwrap().is_empty());
    }
}
