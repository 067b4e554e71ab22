use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The database connection URL could not be parsed.
    #[error("Invalid database config: `url` is not a valid Postgres connection string: {0}")]
    InvalidDatabaseUrl(String),
    /// The connection pool must allow at least one connection.
    #[error("Invalid database config: `max_connections` cannot be zero")]
    MaxConnectionsZero,
    /// A schema field has no accepted source column names.
    #[error("Invalid column mapping: `{field}` must list at least one source column")]
    EmptyColumnAliases { field: &'static str },
    /// A source column alias is blank.
    #[error("Invalid column mapping: `{field}` contains a blank source column name")]
    BlankColumnAlias { field: &'static str },
}
