use sqlx::{Pool, Postgres};

use crate::{
    constants::USER_COUNT_PER_PAGE,
    cryptography::hash_password,
    error::ApiError,
    pagination::PageContext,
    schema::{User, UserListRow, UserRole, UserRow, Uuid},
    validate::{validate_email, validate_person_name, validate_username},
};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: Uuid,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Creates a user. The password is hashed here; the stored row never sees
/// the plaintext. Duplicate usernames and emails surface as conflicts from
/// the unique indexes.
pub async fn register_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_person_name(first_name)?;
    validate_person_name(last_name)?;

    let password =
        hash_password(password).map_err(|e| ApiError::Database(format!("{e}")))?;

    let id: (Uuid,) = sqlx::query_as(
        "
        INSERT INTO users (username, email, first_name, last_name, password, uid)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id;
    ",
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .bind(UserRole::User)
    .fetch_one(pool)
    .await?;

    log::info!("Registered user `{username}`");
    Ok(id.0)
}

/// Read shape of a single user for a given viewer. `viewer_id = None`
/// (anonymous request) always yields `is_subscribed = false`.
pub async fn get_user_row(
    id: Uuid,
    viewer_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<UserRow, ApiError> {
    let row: Option<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            EXISTS (
                SELECT 1 FROM subscriptions s
                WHERE s.subscriber_id = $2 AND s.subscribing_id = u.id
            ) AS is_subscribed
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(id)
    .bind(viewer_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| ApiError::not_found("No user exists with specified id"))
}

pub async fn fetch_users(
    offset: i64,
    viewer_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserListRow>, ApiError> {
    let rows: Vec<UserListRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            EXISTS (
                SELECT 1 FROM subscriptions s
                WHERE s.subscriber_id = $1 AND s.subscribing_id = u.id
            ) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer_id)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        USER_COUNT_PER_PAGE,
        offset,
    ))
}
