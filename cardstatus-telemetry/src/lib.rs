//! Logging and metrics setup shared by the card status binaries and tests.

pub mod metrics;
pub mod tracing;
