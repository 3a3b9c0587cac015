use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{DbNotification, Notification, NotificationType, TargetRole};

const NOTIFICATION_COLUMNS: &str =
    "id, created_by, title, message, kind, target_role, is_active, created_at";

#[derive(Debug)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub target_role: TargetRole,
}

#[derive(Debug, Default)]
pub struct NotificationChanges {
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: Option<NotificationType>,
    pub target_role: Option<TargetRole>,
    pub is_active: Option<bool>,
}

fn role_target(role: Role) -> &'static str {
    match role {
        Role::Admin => TargetRole::Admin.as_str(),
        Role::Coach => TargetRole::Coach.as_str(),
        Role::Player => TargetRole::Player.as_str(),
    }
}

/// Active notifications visible to one user, newest first, each row joined
/// against that user's read receipt.
#[instrument(skip(pool))]
pub async fn list_notifications_for_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<Vec<Notification>, AppError> {
    info!("Listing notifications for user");

    let rows = sqlx::query_as::<_, DbNotification>(
        "SELECT n.id, n.created_by, n.title, n.message, n.kind, n.target_role,
                n.is_active, n.created_at, r.read_at
         FROM notifications n
         LEFT JOIN notification_reads r
             ON r.notification_id = n.id AND r.user_id = ?
         WHERE n.is_active = TRUE AND n.target_role IN ('all', ?)
         ORDER BY n.created_at DESC, n.id DESC",
    )
    .bind(user_id)
    .bind(role_target(role))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let mut n = Notification::from(row);
            n.is_read = Some(n.read_at.is_some());
            n
        })
        .collect())
}

/// Every notification regardless of target or active flag. Management view.
#[instrument(skip(pool))]
pub async fn get_all_notifications(pool: &Pool<Sqlite>) -> Result<Vec<Notification>, AppError> {
    let rows = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {}, NULL AS read_at FROM notifications ORDER BY created_at DESC, id DESC",
        NOTIFICATION_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Notification::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_notification(pool: &Pool<Sqlite>, id: i64) -> Result<Notification, AppError> {
    info!("Fetching notification by ID");
    let row = sqlx::query_as::<_, DbNotification>(&format!(
        "SELECT {}, NULL AS read_at FROM notifications WHERE id = ?",
        NOTIFICATION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(n) => Ok(Notification::from(n)),
        _ => Err(AppError::NotFound(format!(
            "Notification with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip_all, fields(created_by, title = %new_notification.title))]
pub async fn create_notification(
    pool: &Pool<Sqlite>,
    created_by: i64,
    new_notification: &NewNotification,
) -> Result<i64, AppError> {
    info!("Creating notification");

    let res = sqlx::query(
        "INSERT INTO notifications (created_by, title, message, kind, target_role, is_active)
         VALUES (?, ?, ?, ?, ?, TRUE)",
    )
    .bind(created_by)
    .bind(&new_notification.title)
    .bind(&new_notification.message)
    .bind(new_notification.kind.as_str())
    .bind(new_notification.target_role.as_str())
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool, changes))]
pub async fn update_notification(
    pool: &Pool<Sqlite>,
    notification_id: i64,
    changes: &NotificationChanges,
) -> Result<Notification, AppError> {
    info!("Updating notification");

    let current = get_notification(pool, notification_id).await?;

    let title = changes.title.clone().unwrap_or(current.title);
    let message = changes.message.clone().unwrap_or(current.message);
    let kind = changes.kind.unwrap_or(current.kind);
    let target_role = changes.target_role.unwrap_or(current.target_role);
    let is_active = changes.is_active.unwrap_or(current.is_active);

    sqlx::query(
        "UPDATE notifications
         SET title = ?, message = ?, kind = ?, target_role = ?, is_active = ?
         WHERE id = ?",
    )
    .bind(&title)
    .bind(&message)
    .bind(kind.as_str())
    .bind(target_role.as_str())
    .bind(is_active)
    .bind(notification_id)
    .execute(pool)
    .await?;

    get_notification(pool, notification_id).await
}

#[instrument(skip(pool))]
pub async fn delete_notification(pool: &Pool<Sqlite>, notification_id: i64) -> Result<(), AppError> {
    info!("Deleting notification with read receipts");

    get_notification(pool, notification_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM notification_reads WHERE notification_id = ?")
        .bind(notification_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(notification_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Records a read receipt. Re-reading keeps the original timestamp.
#[instrument(skip(pool))]
pub async fn mark_notification_read(
    pool: &Pool<Sqlite>,
    notification_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    get_notification(pool, notification_id).await?;

    sqlx::query(
        "INSERT INTO notification_reads (notification_id, user_id, read_at)
         VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT (notification_id, user_id) DO NOTHING",
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks every notification visible to the user as read in one transaction.
/// Already-read rows keep their original receipt.
#[instrument(skip(pool))]
pub async fn mark_all_notifications_read(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<(), AppError> {
    info!("Marking all notifications read");

    let mut tx = pool.begin().await?;

    let ids: Vec<(i64,)> = sqlx::query_as(
        "SELECT id FROM notifications WHERE is_active = TRUE AND target_role IN ('all', ?)",
    )
    .bind(role_target(role))
    .fetch_all(&mut *tx)
    .await?;

    for (notification_id,) in ids {
        sqlx::query(
            "INSERT INTO notification_reads (notification_id, user_id, read_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT (notification_id, user_id) DO NOTHING",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn count_unread_notifications(
    pool: &Pool<Sqlite>,
    user_id: i64,
    role: Role,
) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*)
         FROM notifications n
         LEFT JOIN notification_reads r
             ON r.notification_id = n.id AND r.user_id = ?
         WHERE n.is_active = TRUE AND n.target_role IN ('all', ?)
           AND r.read_at IS NULL",
    )
    .bind(user_id)
    .bind(role_target(role))
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
