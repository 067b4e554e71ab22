//! Card status ingestion: reconciles CSV rows into the `card_status` table.
//!
//! The pieces compose leaf-first:
//!
//! - [`store::CardStatusStore`] abstracts the table, with a Postgres and an in-memory
//!   implementation.
//! - [`mapping::ColumnMapping`] turns a CSV header into a projection onto
//!   [`CardStatusRecord`].
//! - [`reconcile::Reconciler`] decides per row whether to insert, patch the comment or skip.
//! - [`ingest::BatchIngestor`] streams files through the reconciler in order.

pub mod error;
pub mod ingest;
pub mod mapping;
pub mod reconcile;
pub mod store;

pub use cardstatus_postgres::types::CardStatusRecord;
