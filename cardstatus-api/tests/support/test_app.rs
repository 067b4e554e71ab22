#![allow(dead_code)]

use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use async_trait::async_trait;
use cardstatus::CardStatusRecord;
use cardstatus::error::StoreError;
use cardstatus::store::CardStatusStore;
use cardstatus_api::startup::run;
use cardstatus_postgres::types::UpsertOutcome;

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub async fn get_card_status(&self, query: &[(&str, &str)]) -> reqwest::Response {
        self.api_client
            .get(format!("{}/get_card_status", &self.address))
            .query(query)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{path}", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Serves `store` on a random local port.
pub async fn spawn_test_app(store: Arc<dyn CardStatusStore>) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = run(listener, store).expect("failed to build server");
    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        api_client: reqwest::Client::new(),
        server_handle,
    }
}

/// Store whose every operation fails like an unreachable database.
pub struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl CardStatusStore for UnavailableStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        unavailable()
    }

    async fn get_card_status(
        &self,
        _card_id: &str,
    ) -> Result<Option<CardStatusRecord>, StoreError> {
        unavailable()
    }

    async fn upsert_card_status(
        &self,
        _record: &CardStatusRecord,
    ) -> Result<UpsertOutcome, StoreError> {
        unavailable()
    }

    async fn update_comment(&self, _card_id: &str, _comment: &str) -> Result<bool, StoreError> {
        unavailable()
    }

    async fn find_by_user_mobile(
        &self,
        _user_mobile: &str,
    ) -> Result<Vec<CardStatusRecord>, StoreError> {
        unavailable()
    }

    async fn find_by_card_id(&self, _card_id: &str) -> Result<Vec<CardStatusRecord>, StoreError> {
        unavailable()
    }
}
