use chrono::{Duration, Utc};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::UserSession;
use crate::error::AppError;

/// Opaque login sessions live this long before the guard rejects them.
const SESSION_TTL_HOURS: i64 = 24;

#[instrument(skip(pool))]
pub async fn create_user_session(pool: &Pool<Sqlite>, user_id: i64) -> Result<String, AppError> {
    info!("Creating user session");

    let token = UserSession::generate_token();
    let expires_at = (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).naive_utc();

    sqlx::query("INSERT INTO user_sessions (user_id, token, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(&token)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(token)
}

#[instrument(skip_all)]
pub async fn get_session_by_token(
    pool: &Pool<Sqlite>,
    token: &str,
) -> Result<Option<UserSession>, AppError> {
    let row = sqlx::query_as::<_, crate::auth::DbUserSession>(
        "SELECT id, user_id, token, expires_at FROM user_sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserSession::from))
}

#[instrument(skip_all)]
pub async fn invalidate_session(pool: &Pool<Sqlite>, token: &str) -> Result<(), AppError> {
    info!("Invalidating user session");
    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn clean_expired_sessions(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    let res = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?")
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await?;

    let removed = res.rows_affected();
    if removed > 0 {
        info!(removed, "Cleaned expired sessions");
    }
    Ok(removed)
}
