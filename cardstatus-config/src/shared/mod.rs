//! Configuration types shared between the service crates.

mod base;
mod connection;
mod ingestion;

pub use base::ValidationError;
pub use connection::{DefaultPgConnectionOptions, PgConnectionConfig, TlsConfig};
pub use ingestion::{ColumnMappingConfig, IngestionConfig};
