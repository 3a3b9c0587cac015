use rocket::FromForm;
use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{
    AttendanceEntry, NewTraining, TrainingChanges, TrainingFilter, create_training,
    delete_training, get_player_by_user_id, get_session_attendance, get_training, list_trainings,
    mark_attendance, update_training,
};
use crate::models::{Attendance, AttendanceStatus, SessionStatus, TrainingSession};
use crate::stats;
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

#[derive(Serialize, Deserialize)]
pub struct TrainingResponse {
    pub id: i64,
    pub coach_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub status: String,
    pub attendance_rate: f64,
    pub average_performance: Option<f64>,
}

impl TrainingResponse {
    fn new(training: TrainingSession, attendance: &[Attendance]) -> Self {
        Self {
            id: training.id,
            coach_id: training.coach_id,
            title: training.title,
            description: training.description,
            date: training.date.to_string(),
            start_time: training.start_time,
            end_time: training.end_time,
            location: training.location,
            status: training.status.as_str().to_string(),
            attendance_rate: stats::attendance_rate(attendance),
            average_performance: stats::average_performance(attendance),
        }
    }
}

/// Coaches may only mutate sessions they own; admins are unrestricted.
fn require_session_ownership(user: &User, training: &TrainingSession) -> Result<(), Status> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Coach if training.coach_id == user.id => Ok(()),
        _ => Err(Status::Forbidden),
    }
}

fn parse_date(
    value: &Option<String>,
    field: &str,
) -> Result<Option<chrono::NaiveDate>, Custom<Json<ValidationResponse>>> {
    match value {
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                Custom(
                    Status::UnprocessableEntity,
                    Json(ValidationResponse::with_error(field, "Expected YYYY-MM-DD")),
                )
            }),
        None => Ok(None),
    }
}

#[derive(FromForm)]
pub struct TrainingsQueryParams {
    status: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

#[get("/trainings?<params..>")]
pub async fn api_get_trainings(
    params: TrainingsQueryParams,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<TrainingResponse>>, Custom<Json<ValidationResponse>>> {
    // Players only see sessions they hold an attendance row for.
    let player_id = match user.role {
        Role::Player => match get_player_by_user_id(db, user.id).await.validate_custom()? {
            Some(player) => Some(player.id),
            None => return Ok(Json(Vec::new())),
        },
        _ => None,
    };

    let filter = TrainingFilter {
        status: params.status.as_deref().and_then(SessionStatus::from_str),
        from_date: parse_date(&params.from_date, "from_date")?,
        to_date: parse_date(&params.to_date, "to_date")?,
        player_id,
        coach_id: None,
    };

    let trainings = list_trainings(db, &filter).await.validate_custom()?;

    let mut responses = Vec::with_capacity(trainings.len());
    for training in trainings {
        let attendance = get_session_attendance(db, training.id)
            .await
            .validate_custom()?;
        responses.push(TrainingResponse::new(training, &attendance));
    }

    Ok(Json(responses))
}

#[get("/trainings/<id>")]
pub async fn api_get_training(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    let training = get_training(db, id).await?;
    let attendance = get_session_attendance(db, id).await?;

    if user.role == Role::Player {
        let own = get_player_by_user_id(db, user.id).await?;
        let participates = own
            .map(|p| attendance.iter().any(|a| a.player_id == p.id))
            .unwrap_or(false);
        if !participates {
            return Err(Status::Forbidden);
        }
    }

    let response = TrainingResponse::new(training, &attendance);

    Ok(Json(json!({
        "training": response,
        "attendance": attendance,
    })))
}

#[derive(Deserialize, Validate, Clone)]
pub struct TrainingCreateRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    title: String,
    description: Option<String>,
    date: String,
    #[validate(length(min = 1, message = "Start time is required"))]
    start_time: String,
    #[validate(length(min = 1, message = "End time is required"))]
    end_time: String,
    location: Option<String>,
}

#[post("/trainings", data = "<request>")]
pub async fn api_create_training(
    request: Json<TrainingCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageTrainings)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let date = parse_date(&Some(validated.date.clone()), "date")?.unwrap_or_default();

    let training_id = create_training(
        db,
        user.id,
        &NewTraining {
            title: validated.title,
            description: validated.description,
            date,
            start_time: validated.start_time,
            end_time: validated.end_time,
            location: validated.location,
        },
    )
    .await
    .validate_custom()?;

    let training = get_training(db, training_id).await.validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "Training session created", "training": training })),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct TrainingUpdateRequest {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    location: Option<String>,
    status: Option<String>,
}

#[put("/trainings/<id>", data = "<request>")]
pub async fn api_update_training(
    id: i64,
    request: Json<TrainingUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageTrainings)
        .validate_custom()?;

    let current = get_training(db, id).await.validate_custom()?;
    require_session_ownership(&user, &current).validate_custom()?;

    let validated = request.validate_custom()?;

    let status = match &validated.status {
        Some(s) => Some(SessionStatus::from_str(s).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("status", "Unknown status")),
            )
        })?),
        None => None,
    };

    let training = update_training(
        db,
        id,
        &TrainingChanges {
            title: validated.title,
            description: validated.description,
            date: parse_date(&validated.date, "date")?,
            start_time: validated.start_time,
            end_time: validated.end_time,
            location: validated.location,
            status,
        },
    )
    .await
    .validate_custom()?;

    Ok(Json(
        json!({ "message": "Training session updated", "training": training }),
    ))
}

#[delete("/trainings/<id>")]
pub async fn api_delete_training(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ManageTrainings)?;

    let training = get_training(db, id).await?;
    require_session_ownership(&user, &training)?;

    delete_training(db, id).await?;

    Ok(Json(json!({ "message": "Training session deleted" })))
}

#[derive(Deserialize, Validate)]
pub struct AttendanceEntryRequest {
    player_id: i64,
    status: String,
    #[validate(range(min = 1, max = 10, message = "Performance score must be between 1 and 10"))]
    performance_score: Option<i64>,
    remarks: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct AttendanceMarkRequest {
    #[validate(nested)]
    attendances: Vec<AttendanceEntryRequest>,
}

#[post("/trainings/<id>/attendance", data = "<request>")]
pub async fn api_mark_attendance(
    id: i64,
    request: Json<AttendanceMarkRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::MarkAttendance)
        .validate_custom()?;

    let training = get_training(db, id).await.validate_custom()?;
    require_session_ownership(&user, &training).validate_custom()?;

    let validated = request.validate_custom()?;

    let mut entries = Vec::with_capacity(validated.attendances.len());
    for entry in &validated.attendances {
        let status = AttendanceStatus::from_str(&entry.status).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "status",
                    "Unknown attendance status",
                )),
            )
        })?;

        entries.push(AttendanceEntry {
            player_id: entry.player_id,
            status,
            performance_score: entry.performance_score,
            remarks: entry.remarks.clone(),
        });
    }

    mark_attendance(db, id, &entries).await.validate_custom()?;

    let attendance = get_session_attendance(db, id).await.validate_custom()?;

    Ok(Json(
        json!({ "message": "Attendance recorded", "attendance": attendance }),
    ))
}
