use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A row of the `card_status` table.
///
/// `card_id` is the primary key. `comment` is the only column changed after the row is
/// first written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CardStatusRecord {
    #[schema(example = "ZYW8827")]
    pub card_id: String,
    #[schema(example = "585949014")]
    pub user_mobile: Option<String>,
    #[schema(example = "DELIVERED")]
    pub status: Option<String>,
    #[schema(example = "left at door")]
    pub comment: Option<String>,
}

impl CardStatusRecord {
    /// Creates a record with only the identifier set.
    pub fn new(card_id: impl Into<String>) -> Self {
        Self {
            card_id: card_id.into(),
            user_mobile: None,
            status: None,
            comment: None,
        }
    }

    pub fn with_user_mobile(mut self, user_mobile: impl Into<String>) -> Self {
        self.user_mobile = Some(user_mobile.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns the comment when it is present and non-empty.
    pub fn non_empty_comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|comment| !comment.is_empty())
    }
}

/// Result of writing a record with [`crate::card_status::upsert_card_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row with the identifier existed; the record was inserted.
    Inserted,
    /// A row existed and its comment was overwritten.
    CommentUpdated,
    /// A row existed and the record carried no comment; nothing was written.
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_missing_fields_as_null() {
        let record = CardStatusRecord::new("C1").with_status("Delivered");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "card_id": "C1",
                "user_mobile": null,
                "status": "Delivered",
                "comment": null,
            })
        );
    }

    #[test]
    fn empty_comment_is_not_a_comment() {
        assert_eq!(CardStatusRecord::new("C1").non_empty_comment(), None);
        assert_eq!(
            CardStatusRecord::new("C1").with_comment("").non_empty_comment(),
            None
        );
        assert_eq!(
            CardStatusRecord::new("C1")
                .with_comment("left at door")
                .non_empty_comment(),
            Some("left at door")
        );
    }
}
