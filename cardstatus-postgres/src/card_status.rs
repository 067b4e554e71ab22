use sqlx::{PgExecutor, Row};

use crate::types::{CardStatusRecord, UpsertOutcome};

pub async fn read_card_status<'c, E>(
    executor: E,
    card_id: &str,
) -> Result<Option<CardStatusRecord>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CardStatusRecord>(
        r#"
        select card_id, user_mobile, status, comment
        from card_status
        where card_id = $1
        "#,
    )
    .bind(card_id)
    .fetch_optional(executor)
    .await
}

/// Inserts `record`, or patches the stored comment if the identifier already exists.
///
/// On conflict only a non-empty comment is written; every other column of the stored row
/// is left untouched. The statement is a single upsert so two writers racing on the same
/// identifier cannot fail with a unique violation.
pub async fn upsert_card_status<'c, E>(
    executor: E,
    record: &CardStatusRecord,
) -> Result<UpsertOutcome, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    // `xmax = 0` holds only for freshly inserted tuples.
    let row = sqlx::query(
        r#"
        insert into card_status (card_id, user_mobile, status, comment)
        values ($1, $2, $3, $4)
        on conflict (card_id) do update
        set comment = excluded.comment
        where excluded.comment is not null and excluded.comment <> ''
        returning (xmax = 0) as inserted
        "#,
    )
    .bind(&record.card_id)
    .bind(&record.user_mobile)
    .bind(&record.status)
    .bind(&record.comment)
    .fetch_optional(executor)
    .await?;

    let outcome = match row {
        Some(row) if row.try_get::<bool, _>("inserted")? => UpsertOutcome::Inserted,
        Some(_) => UpsertOutcome::CommentUpdated,
        None => UpsertOutcome::Unchanged,
    };

    Ok(outcome)
}

/// Overwrites the comment of an existing row.
///
/// Returns `false` when no row has the given identifier.
pub async fn update_comment<'c, E>(
    executor: E,
    card_id: &str,
    comment: &str,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    let result = sqlx::query(
        r#"
        update card_status
        set comment = $1
        where card_id = $2
        "#,
    )
    .bind(comment)
    .bind(card_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn read_card_statuses_by_user_mobile<'c, E>(
    executor: E,
    user_mobile: &str,
) -> Result<Vec<CardStatusRecord>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CardStatusRecord>(
        r#"
        select card_id, user_mobile, status, comment
        from card_status
        where user_mobile = $1
        order by card_id
        "#,
    )
    .bind(user_mobile)
    .fetch_all(executor)
    .await
}

pub async fn read_card_statuses_by_card_id<'c, E>(
    executor: E,
    card_id: &str,
) -> Result<Vec<CardStatusRecord>, sqlx::Error>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CardStatusRecord>(
        r#"
        select card_id, user_mobile, status, comment
        from card_status
        where card_id = $1
        order by card_id
        "#,
    )
    .bind(card_id)
    .fetch_all(executor)
    .await
}
