use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{
    create_user, delete_user_cascade, get_coach_by_id, get_users_by_role, update_coach,
};
use crate::models::TEAMS;
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

use super::auth::UserData;

#[get("/coaches")]
pub async fn api_get_coaches(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<UserData>>, Status> {
    user.require_permission(Permission::ManageCoaches)?;

    let coaches = get_users_by_role(db, Role::Coach).await?;

    Ok(Json(coaches.into_iter().map(UserData::from).collect()))
}

#[get("/coaches/<id>")]
pub async fn api_get_coach(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<UserData>, Status> {
    user.require_permission(Permission::ManageCoaches)?;

    let coach = get_coach_by_id(db, id).await?;

    Ok(Json(UserData::from(coach)))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CoachCreateRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    name: String,
    #[validate(email(message = "Must be a valid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    team: Option<String>,
    phone: Option<String>,
    speciality: Option<String>,
}

#[post("/coaches", data = "<request>")]
pub async fn api_create_coach(
    request: Json<CoachCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageCoaches)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    if let Some(team) = &validated.team {
        if !TEAMS.contains(&team.as_str()) {
            return Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("team", "Unknown team")),
            ));
        }
    }

    let coach_id = create_user(
        db,
        &validated.name,
        &validated.email,
        &validated.password,
        Role::Coach,
        validated.team.as_deref(),
        validated.phone.as_deref(),
        validated.speciality.as_deref(),
    )
    .await
    .validate_custom()?;

    let coach = get_coach_by_id(db, coach_id).await.validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "Coach created", "coach": UserData::from(coach) })),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CoachUpdateRequest {
    name: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    email: Option<String>,
    phone: Option<String>,
    speciality: Option<String>,
    team: Option<String>,
}

#[put("/coaches/<id>", data = "<request>")]
pub async fn api_update_coach(
    id: i64,
    request: Json<CoachUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageCoaches)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    if let Some(team) = &validated.team {
        if !TEAMS.contains(&team.as_str()) {
            return Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("team", "Unknown team")),
            ));
        }
    }

    // 404 before touching anything if the id is not a coach
    get_coach_by_id(db, id).await.validate_custom()?;

    update_coach(
        db,
        id,
        validated.name.as_deref(),
        validated.email.as_deref(),
        validated.phone.as_deref(),
        validated.speciality.as_deref(),
        validated.team.as_deref(),
    )
    .await
    .validate_custom()?;

    let coach = get_coach_by_id(db, id).await.validate_custom()?;

    Ok(Json(
        json!({ "message": "Coach updated", "coach": UserData::from(coach) }),
    ))
}

#[delete("/coaches/<id>")]
pub async fn api_delete_coach(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ManageCoaches)?;

    let coach = get_coach_by_id(db, id).await?;

    delete_user_cascade(db, coach.id).await?;

    Ok(Json(json!({ "message": "Coach deleted" })))
}
