use cardstatus::CardStatusRecord;
use cardstatus_api::config::{ApiConfig, ApplicationSettings};
use cardstatus_api::startup::{Application, StartupError};
use cardstatus_config::shared::{ColumnMappingConfig, IngestionConfig, PgConnectionConfig};
use cardstatus_postgres::sqlx::test_utils::{
    create_pg_database, drop_pg_database, get_test_db_config,
};
use cardstatus_telemetry::tracing::init_test_tracing;
use std::path::PathBuf;

fn api_config(database: PgConnectionConfig, files: Vec<PathBuf>) -> ApiConfig {
    ApiConfig {
        database,
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        ingestion: IngestionConfig {
            files,
            columns: ColumnMappingConfig::default(),
        },
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn application_ingests_before_serving() {
    init_test_tracing();
    let database = get_test_db_config();
    let pool = create_pg_database(&database).await;

    let dir = tempfile::tempdir().unwrap();
    let pickup = dir.path().join("pickup.csv");
    let delivered = dir.path().join("delivered.csv");
    std::fs::write(
        &pickup,
        "Card ID,User Mobile,Status\nC1,555,PICKUP\nC2,555,PICKUP\n",
    )
    .unwrap();
    std::fs::write(&delivered, "Card ID,Comment\nC2,DELIVERED\nC3,\n").unwrap();

    let application = Application::build(api_config(database.clone(), vec![pickup, delivered]))
        .await
        .unwrap();
    let address = format!("http://127.0.0.1:{}", application.port());
    let server = tokio::spawn(application.run_until_stopped());

    let records: Vec<CardStatusRecord> = reqwest::Client::new()
        .get(format!("{address}/get_card_status"))
        .query(&[("phone_number", "555")])
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![
            CardStatusRecord::new("C1")
                .with_user_mobile("555")
                .with_status("PICKUP"),
            CardStatusRecord::new("C2")
                .with_user_mobile("555")
                .with_status("PICKUP")
                .with_comment("DELIVERED"),
        ]
    );

    let count: i64 = sqlx::query_scalar("select count(*) from card_status")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3);

    server.abort();
    pool.close().await;
    drop_pg_database(&database).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn ingestion_failure_aborts_startup() {
    init_test_tracing();
    let database = get_test_db_config();
    let pool = create_pg_database(&database).await;

    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "Status\nPICKUP\n").unwrap();

    let result = Application::build(api_config(database.clone(), vec![bad])).await;

    assert!(matches!(result, Err(StartupError::Ingestion(_))));

    pool.close().await;
    drop_pg_database(&database).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn ingest_command_reports_counts() {
    init_test_tracing();
    let database = get_test_db_config();
    let pool = create_pg_database(&database).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("cards.csv");
    std::fs::write(&file, "Card ID,Comment\nC1,\nC1,first\nC1,\n").unwrap();

    let report = Application::ingest(api_config(database.clone(), vec![file]))
        .await
        .unwrap();

    let totals = report.totals();
    assert_eq!(
        (totals.inserted, totals.comment_updated, totals.skipped),
        (1, 1, 1)
    );

    pool.close().await;
    drop_pg_database(&database).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_database_url_aborts_startup() {
    init_test_tracing();
    let database = PgConnectionConfig::from_url("not a url");

    let result = Application::ingest(api_config(database, vec![])).await;

    assert!(matches!(result, Err(StartupError::Config(_))));
}
