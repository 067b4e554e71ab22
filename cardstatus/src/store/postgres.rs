use async_trait::async_trait;
use cardstatus_config::shared::{PgConnectionConfig, ValidationError};
use cardstatus_postgres::card_status;
use cardstatus_postgres::schema::create_card_status_table;
use cardstatus_postgres::types::{CardStatusRecord, UpsertOutcome};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::StoreError;
use crate::store::base::CardStatusStore;

/// [`CardStatusStore`] backed by the `card_status` table in Postgres.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store with a lazily connecting pool.
    ///
    /// No connection is opened until the first statement runs, so connectivity problems
    /// surface from [`CardStatusStore::initialize`].
    pub fn connect_lazy(config: &PgConnectionConfig) -> Result<Self, ValidationError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(config.with_db()?);

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CardStatusStore for PostgresStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        create_card_status_table(&self.pool).await?;

        Ok(())
    }

    async fn get_card_status(
        &self,
        card_id: &str,
    ) -> Result<Option<CardStatusRecord>, StoreError> {
        Ok(card_status::read_card_status(&self.pool, card_id).await?)
    }

    async fn upsert_card_status(
        &self,
        record: &CardStatusRecord,
    ) -> Result<UpsertOutcome, StoreError> {
        Ok(card_status::upsert_card_status(&self.pool, record).await?)
    }

    async fn update_comment(&self, card_id: &str, comment: &str) -> Result<bool, StoreError> {
        Ok(card_status::update_comment(&self.pool, card_id, comment).await?)
    }

    async fn find_by_user_mobile(
        &self,
        user_mobile: &str,
    ) -> Result<Vec<CardStatusRecord>, StoreError> {
        Ok(card_status::read_card_statuses_by_user_mobile(&self.pool, user_mobile).await?)
    }

    async fn find_by_card_id(&self, card_id: &str) -> Result<Vec<CardStatusRecord>, StoreError> {
        Ok(card_status::read_card_statuses_by_card_id(&self.pool, card_id).await?)
    }
}
