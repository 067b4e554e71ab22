use std::path::PathBuf;

use serde::Deserialize;

use crate::shared::ValidationError;

/// Source files and column mapping used by the startup ingestion run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IngestionConfig {
    /// CSV files processed in the listed order. Relative paths resolve against the
    /// working directory.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Mapping from `card_status` columns to accepted CSV header names.
    #[serde(default)]
    pub columns: ColumnMappingConfig,
}

impl IngestionConfig {
    /// Validates the [`IngestionConfig`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.columns.validate()
    }
}

/// Accepted CSV header names for every `card_status` column.
///
/// A header matches a column when it equals one of the listed names. The first matching
/// header in a file wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ColumnMappingConfig {
    #[serde(default = "default_card_id_columns")]
    pub card_id: Vec<String>,
    #[serde(default = "default_user_mobile_columns")]
    pub user_mobile: Vec<String>,
    #[serde(default = "default_status_columns")]
    pub status: Vec<String>,
    #[serde(default = "default_comment_columns")]
    pub comment: Vec<String>,
}

impl Default for ColumnMappingConfig {
    fn default() -> Self {
        Self {
            card_id: default_card_id_columns(),
            user_mobile: default_user_mobile_columns(),
            status: default_status_columns(),
            comment: default_comment_columns(),
        }
    }
}

impl ColumnMappingConfig {
    /// Validates the [`ColumnMappingConfig`].
    ///
    /// The card identifier must be mappable; every other column may be left without
    /// aliases, in which case it is never populated by ingestion.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.card_id.is_empty() {
            return Err(ValidationError::EmptyColumnAliases { field: "card_id" });
        }

        for (field, aliases) in self.fields() {
            if aliases.iter().any(|alias| alias.trim().is_empty()) {
                return Err(ValidationError::BlankColumnAlias { field });
            }
        }

        Ok(())
    }

    /// Returns every column name paired with its accepted header names.
    pub fn fields(&self) -> [(&'static str, &[String]); 4] {
        [
            ("card_id", self.card_id.as_slice()),
            ("user_mobile", self.user_mobile.as_slice()),
            ("status", self.status.as_slice()),
            ("comment", self.comment.as_slice()),
        ]
    }
}

fn default_card_id_columns() -> Vec<String> {
    vec!["Card ID".to_string(), "card_id".to_string()]
}

fn default_user_mobile_columns() -> Vec<String> {
    vec![
        "User Mobile".to_string(),
        "User contact".to_string(),
        "user_mobile".to_string(),
    ]
}

fn default_status_columns() -> Vec<String> {
    vec!["Status".to_string(), "status".to_string()]
}

fn default_comment_columns() -> Vec<String> {
    vec!["Comment".to_string(), "comment".to_string()]
}
