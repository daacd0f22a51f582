/// User repository - handles all database operations for users
use crate::models::{Subscription, User};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user row.
///
/// The email is stored lowercased so the unique index is effectively
/// case-insensitive. Subscription and verification state take their
/// schema defaults (starter, unverified).
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    avatar_url: &str,
    verification_token: &str,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, avatar_url, verification_token, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        "#
    )
    .bind(id)
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(avatar_url)
    .bind(verification_token)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        FROM users
        WHERE email = $1
        "#
    )
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Find a user by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        FROM users
        WHERE id = $1
        "#
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Store or clear the active session token.
///
/// `Some` on login, `None` on logout. The stored value is what the
/// middleware compares presented tokens against, so overwriting it
/// invalidates every previously issued token. Returns `None` when the
/// user row no longer exists.
pub async fn set_session_token(
    pool: &PgPool,
    user_id: Uuid,
    token: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET token = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        "#
    )
    .bind(token)
    .bind(now)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Consume a verification token in one shot.
///
/// Flips the row to verified and clears the token in the same
/// statement, so a second request with the same token matches no row
/// and the caller reports not-found.
pub async fn confirm_verification(
    pool: &PgPool,
    verification_token: &str,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET verified = TRUE, verification_token = NULL, updated_at = $1
        WHERE verification_token = $2
        RETURNING id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        "#
    )
    .bind(now)
    .bind(verification_token)
    .fetch_optional(pool)
    .await
}

/// Update a user's subscription tier. Returns `None` when the user row
/// no longer exists.
pub async fn update_subscription(
    pool: &PgPool,
    user_id: Uuid,
    subscription: Subscription,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET subscription = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        "#
    )
    .bind(subscription)
    .bind(now)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Update a user's avatar URL after a successful upload. Returns `None`
/// when the user row no longer exists.
pub async fn update_avatar_url(
    pool: &PgPool,
    user_id: Uuid,
    avatar_url: &str,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET avatar_url = $1, updated_at = $2
        WHERE id = $3
        RETURNING id, email, password_hash, subscription, avatar_url, verified, verification_token, token, created_at, updated_at
        "#
    )
    .bind(avatar_url)
    .bind(now)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
