use std::fmt;
use std::sync::Arc;

use cardstatus_postgres::types::{CardStatusRecord, UpsertOutcome};
use tracing::warn;

use crate::error::RowError;
use crate::store::CardStatusStore;

/// What reconciling one row did to the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// First sighting of the card; a record was created.
    Inserted,
    /// The card existed and its comment was overwritten.
    CommentUpdated,
    /// The card existed and the row had no comment; nothing was written.
    Skipped,
}

impl Reconciliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reconciliation::Inserted => "inserted",
            Reconciliation::CommentUpdated => "comment_updated",
            Reconciliation::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides per row whether to insert a record, patch its comment, or do nothing.
///
/// Status and mobile number are only ever written when a card is first seen.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn CardStatusStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CardStatusStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, row: &CardStatusRecord) -> Result<Reconciliation, RowError> {
        if row.card_id.is_empty() {
            return Err(RowError::MissingCardId);
        }

        let existing = self.store.get_card_status(&row.card_id).await?;

        if existing.is_none() {
            // A writer that inserted the same card since the lookup turns this into the
            // comment rule below instead of a unique violation.
            let outcome = match self.store.upsert_card_status(row).await? {
                UpsertOutcome::Inserted => Reconciliation::Inserted,
                UpsertOutcome::CommentUpdated => Reconciliation::CommentUpdated,
                UpsertOutcome::Unchanged => Reconciliation::Skipped,
            };

            return Ok(outcome);
        }

        let Some(comment) = row.non_empty_comment() else {
            return Ok(Reconciliation::Skipped);
        };

        if self.store.update_comment(&row.card_id, comment).await? {
            Ok(Reconciliation::CommentUpdated)
        } else {
            warn!(card_id = %row.card_id, "card disappeared before its comment could be updated");
            Ok(Reconciliation::Skipped)
        }
    }
}
