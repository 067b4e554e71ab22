use std::fmt;

use cardstatus_config::Config;
use cardstatus_config::shared::{IngestionConfig, PgConnectionConfig, ValidationError};
use serde::Deserialize;

/// Complete configuration for the card status service.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Connection to the database holding the `card_status` table.
    pub database: PgConnectionConfig,
    /// HTTP server settings.
    pub application: ApplicationSettings,
    /// Files and column mapping for the startup ingestion run.
    pub ingestion: IngestionConfig,
}

impl ApiConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.ingestion.validate()
    }
}

impl Config for ApiConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["ingestion.files"];

    const ENV_OVERRIDES: &'static [(&'static str, &'static str)] = &[
        ("DATABASE_URL", "database.url"),
        ("PORT", "application.port"),
    ];
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Host address the API listens on.
    pub host: String,
    /// Port number the API listens on.
    pub port: u16,
}

impl fmt::Display for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
