use sqlx::PgExecutor;
use tracing::info;

/// Creates the `card_status` table unless it already exists.
///
/// Safe to run on every startup. Any error other than the table already existing is
/// returned to the caller.
pub async fn create_card_status_table<'c, E>(executor: E) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        r#"
        create table if not exists card_status (
            card_id varchar(255) primary key,
            user_mobile varchar(255),
            status varchar(255),
            comment text
        )
        "#,
    )
    .execute(executor)
    .await?;

    info!("card status table ready");

    Ok(())
}
