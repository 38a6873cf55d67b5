use sqlx::{Pool, Postgres};

use crate::{
    constants::SUBSCRIPTION_COUNT_PER_PAGE,
    error::ApiError,
    pagination::PageContext,
    schema::{SubscriptionRow, Uuid},
};

use super::users::get_user_by_id;

pub async fn is_subscribed(
    subscriber_id: Uuid,
    subscribing_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT subscribing_id FROM subscriptions WHERE subscriber_id = $1 AND subscribing_id = $2",
    )
    .bind(subscriber_id)
    .bind(subscribing_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Subscribes one user to another's recipe feed. Subscribing to oneself is
/// rejected up front (and again by the table's CHECK constraint); the
/// unique pair index arbitrates concurrent duplicate requests.
pub async fn subscribe(
    subscriber_id: Uuid,
    subscribing_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if subscriber_id == subscribing_id {
        return Err(ApiError::validation("Subscribing to yourself is not allowed"));
    }
    if get_user_by_id(pool, subscribing_id).await?.is_none() {
        return Err(ApiError::not_found("No user exists with specified id"));
    }

    let result = sqlx::query(
        "
        INSERT INTO subscriptions (subscriber_id, subscribing_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
    ",
    )
    .bind(subscriber_id)
    .bind(subscribing_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Already subscribed to this user"));
    }

    log::info!("User {subscriber_id} subscribed to user {subscribing_id}");
    Ok(())
}

pub async fn unsubscribe(
    subscriber_id: Uuid,
    subscribing_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result =
        sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND subscribing_id = $2")
            .bind(subscriber_id)
            .bind(subscribing_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Not subscribed to this user"));
    }

    Ok(())
}

/// Authors the user is subscribed to, as cards with their recipe counts.
pub async fn fetch_subscriptions(
    subscriber_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionRow>, ApiError> {
    let rows: Vec<SubscriptionRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.subscribing_id
        WHERE s.subscriber_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}
