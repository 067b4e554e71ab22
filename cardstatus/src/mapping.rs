use cardstatus_config::shared::{ColumnMappingConfig, ValidationError};
use cardstatus_postgres::types::CardStatusRecord;
use csv::StringRecord;
use thiserror::Error;

/// Byte order mark some spreadsheet exports prepend to the first header.
const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("no column for `{field}` (accepted headers: {})", .accepted.join(", "))]
    MissingColumn {
        field: &'static str,
        accepted: Vec<String>,
    },
}

/// Maps source CSV headers onto `card_status` columns.
///
/// Only the four fixed columns can ever be written; header names are matched against
/// configured aliases and never reach SQL.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    config: ColumnMappingConfig,
}

impl ColumnMapping {
    pub fn new(config: ColumnMappingConfig) -> Result<Self, ValidationError> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Resolves the mapping against a file's header row.
    ///
    /// Fails when no header matches the card identifier. Columns without a matching
    /// header are left unset for every row of the file.
    pub fn resolve(&self, headers: &StringRecord) -> Result<ResolvedMapping, MappingError> {
        let card_id = find_column(headers, &self.config.card_id).ok_or_else(|| {
            MappingError::MissingColumn {
                field: "card_id",
                accepted: self.config.card_id.clone(),
            }
        })?;
        let user_mobile = find_column(headers, &self.config.user_mobile);
        let status = find_column(headers, &self.config.status);
        let comment = find_column(headers, &self.config.comment);

        let mapped = [Some(card_id), user_mobile, status, comment];
        let unmapped = headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !mapped.contains(&Some(*index)))
            .map(|(_, header)| normalize_header(header).to_owned())
            .collect();

        Ok(ResolvedMapping {
            card_id,
            user_mobile,
            status,
            comment,
            unmapped,
        })
    }
}

/// Column indices of one file's header, produced by [`ColumnMapping::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    card_id: usize,
    user_mobile: Option<usize>,
    status: Option<usize>,
    comment: Option<usize>,
    unmapped: Vec<String>,
}

impl ResolvedMapping {
    /// Headers that do not map to any column and are ignored.
    pub fn unmapped(&self) -> &[String] {
        &self.unmapped
    }

    /// Projects a data row onto a record.
    ///
    /// Values are copied verbatim. A mapped column that is missing from a short row is
    /// treated like an unmapped one and stays unset.
    pub fn project(&self, row: &StringRecord) -> CardStatusRecord {
        let field = |index: Option<usize>| index.and_then(|i| row.get(i)).map(str::to_owned);

        CardStatusRecord {
            card_id: row.get(self.card_id).unwrap_or_default().to_owned(),
            user_mobile: field(self.user_mobile),
            status: field(self.status),
            comment: field(self.comment),
        }
    }
}

fn find_column(headers: &StringRecord, aliases: &[String]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = normalize_header(header);
        aliases.iter().any(|alias| alias.trim() == header)
    })
}

fn normalize_header(header: &str) -> &str {
    header.trim_start_matches(UTF8_BOM).trim()
}
