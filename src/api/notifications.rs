use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{
    NewNotification, NotificationChanges, count_unread_notifications, create_notification,
    delete_notification, get_all_notifications, get_notification,
    list_notifications_for_user, mark_all_notifications_read, mark_notification_read,
    update_notification,
};
use crate::models::{Notification, NotificationType, TargetRole};
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

#[get("/notifications")]
pub async fn api_get_notifications(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Notification>>, Status> {
    user.require_permission(Permission::ViewNotifications)?;

    // Publishers see the whole board; players only what targets them.
    let notifications = match user.role {
        Role::Player => list_notifications_for_user(db, user.id, user.role).await?,
        _ => get_all_notifications(db).await?,
    };

    Ok(Json(notifications))
}

#[get("/notifications/<id>")]
pub async fn api_get_notification(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Notification>, Status> {
    user.require_permission(Permission::ViewNotifications)?;

    let notification = get_notification(db, id).await?;

    if user.role == Role::Player {
        let visible = notification.is_active
            && matches!(notification.target_role, TargetRole::All | TargetRole::Player);
        if !visible {
            return Err(Status::Forbidden);
        }
    }

    Ok(Json(notification))
}

#[derive(Deserialize, Validate, Clone)]
pub struct NotificationCreateRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    title: String,
    #[validate(length(min = 1, message = "Message must not be empty"))]
    message: String,
    #[serde(rename = "type")]
    kind: String,
    target_role: String,
}

#[post("/notifications", data = "<request>")]
pub async fn api_create_notification(
    request: Json<NotificationCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::PublishNotifications)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let kind = NotificationType::from_str(&validated.kind).ok_or_else(|| {
        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error(
                "type",
                "Unknown notification type",
            )),
        )
    })?;

    let target_role = TargetRole::from_str(&validated.target_role).ok_or_else(|| {
        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error(
                "target_role",
                "Unknown target role",
            )),
        )
    })?;

    let notification_id = create_notification(
        db,
        user.id,
        &NewNotification {
            title: validated.title,
            message: validated.message,
            kind,
            target_role,
        },
    )
    .await
    .validate_custom()?;

    let notification = get_notification(db, notification_id)
        .await
        .validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "Notification created", "notification": notification })),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct NotificationUpdateRequest {
    title: Option<String>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    target_role: Option<String>,
    is_active: Option<bool>,
}

#[put("/notifications/<id>", data = "<request>")]
pub async fn api_update_notification(
    id: i64,
    request: Json<NotificationUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::PublishNotifications)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let kind = match &validated.kind {
        Some(k) => Some(NotificationType::from_str(k).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "type",
                    "Unknown notification type",
                )),
            )
        })?),
        None => None,
    };

    let target_role = match &validated.target_role {
        Some(t) => Some(TargetRole::from_str(t).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "target_role",
                    "Unknown target role",
                )),
            )
        })?),
        None => None,
    };

    let notification = update_notification(
        db,
        id,
        &NotificationChanges {
            title: validated.title,
            message: validated.message,
            kind,
            target_role,
            is_active: validated.is_active,
        },
    )
    .await
    .validate_custom()?;

    Ok(Json(
        json!({ "message": "Notification updated", "notification": notification }),
    ))
}

#[delete("/notifications/<id>")]
pub async fn api_delete_notification(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::PublishNotifications)?;

    delete_notification(db, id).await?;

    Ok(Json(json!({ "message": "Notification deleted" })))
}

#[post("/notifications/<id>/read")]
pub async fn api_mark_notification_read(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ViewNotifications)?;

    mark_notification_read(db, id, user.id).await?;

    Ok(Json(json!({ "message": "Notification marked as read" })))
}

#[post("/notifications/read-all")]
pub async fn api_mark_all_notifications_read(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ViewNotifications)?;

    mark_all_notifications_read(db, user.id, user.role).await?;

    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

#[get("/notifications/unread/count")]
pub async fn api_unread_notification_count(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ViewNotifications)?;

    let count = count_unread_notifications(db, user.id, user.role).await?;

    Ok(Json(json!({ "unread": count })))
}
