use std::path::PathBuf;

use thiserror::Error;

use crate::mapping::MappingError;

/// Failure of a storage operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Error while interacting with Postgres for card statuses: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failure to reconcile a single row.
///
/// Row errors are contained: the ingestor logs them and continues with the next row.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("the row has no card identifier")]
    MissingCardId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure that aborts an ingestion run.
///
/// Any of these stops the run at the offending file; later files are not read.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to open `{}`: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read the header of `{file}`: {source}")]
    Header {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("the header of `{file}` does not match the column mapping: {source}")]
    Mapping {
        file: String,
        #[source]
        source: MappingError,
    },

    #[error("failed to read `{file}`{}: {source}", .line.map(|line| format!(" at line {line}")).unwrap_or_default())]
    Read {
        file: String,
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },
}
