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
    NewPlayer, PlayerChanges, PlayerFilter, create_player, delete_player, get_player,
    get_player_attendance, get_player_by_user_id, list_players, update_player,
};
use crate::models::{Player, PlayerStatus, TEAMS};
use crate::stats;
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

#[derive(Serialize, Deserialize)]
pub struct PlayerResponse {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub age: u32,
    pub date_of_birth: String,
    pub position: Option<String>,
    pub jersey_number: Option<i64>,
    pub team: String,
    pub status: String,
    pub attendance_rate: f64,
    pub average_performance: Option<f64>,
}

impl PlayerResponse {
    fn new(player: Player, attendance_rate: f64, average_performance: Option<f64>) -> Self {
        Self {
            id: player.id,
            user_id: player.user_id,
            full_name: player.full_name(),
            age: player.age(),
            first_name: player.first_name,
            last_name: player.last_name,
            date_of_birth: player.date_of_birth.to_string(),
            position: player.position,
            jersey_number: player.jersey_number,
            team: player.team,
            status: player.status.as_str().to_string(),
            attendance_rate,
            average_performance,
        }
    }
}

async fn player_with_stats(
    db: &Pool<Sqlite>,
    player: Player,
) -> Result<PlayerResponse, crate::error::AppError> {
    let attendance = get_player_attendance(db, player.id).await?;
    Ok(PlayerResponse::new(
        player,
        stats::attendance_rate(&attendance),
        stats::average_performance(&attendance),
    ))
}

#[derive(FromForm)]
pub struct PlayersQueryParams {
    status: Option<String>,
    position: Option<String>,
    search: Option<String>,
}

#[get("/players?<params..>")]
pub async fn api_get_players(
    params: PlayersQueryParams,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<PlayerResponse>>, Status> {
    user.require_permission(Permission::ViewPlayers)?;

    let filter = PlayerFilter {
        team: user.team_scope().map(str::to_string),
        status: params.status.as_deref().and_then(PlayerStatus::from_str),
        position: params.position,
        search: params.search,
    };

    let players = list_players(db, &filter).await?;

    let mut responses = Vec::with_capacity(players.len());
    for player in players {
        responses.push(player_with_stats(db, player).await?);
    }

    Ok(Json(responses))
}

#[get("/players/<id>")]
pub async fn api_get_player(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<PlayerResponse>, Status> {
    let player = get_player(db, id).await?;

    match user.role {
        // A player only ever sees their own profile.
        Role::Player => {
            let own = get_player_by_user_id(db, user.id).await?;
            if own.map(|p| p.id) != Some(player.id) {
                return Err(Status::Forbidden);
            }
        }
        _ => user.require_team_access(&player.team)?,
    }

    let response = player_with_stats(db, player).await?;
    Ok(Json(response))
}

#[derive(Deserialize, Validate, Clone)]
pub struct PlayerCreateRequest {
    #[validate(email(message = "Must be a valid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    #[validate(length(min = 1, message = "First name must not be empty"))]
    first_name: String,
    #[validate(length(min = 1, message = "Last name must not be empty"))]
    last_name: String,
    date_of_birth: String,
    position: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Jersey number must be between 1 and 99"))]
    jersey_number: Option<i64>,
    phone: Option<String>,
    team: String,
}

#[post("/players", data = "<request>")]
pub async fn api_create_player(
    request: Json<PlayerCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::CreatePlayers)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    if !TEAMS.contains(&validated.team.as_str()) {
        return Err(Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error("team", "Unknown team")),
        ));
    }

    // A coach can only grow their own roster.
    user.require_team_access(&validated.team).validate_custom()?;

    let date_of_birth = chrono::NaiveDate::parse_from_str(&validated.date_of_birth, "%Y-%m-%d")
        .map_err(|_| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "date_of_birth",
                    "Expected YYYY-MM-DD",
                )),
            )
        })?;

    let player_id = create_player(
        db,
        &NewPlayer {
            email: validated.email,
            password: validated.password,
            first_name: validated.first_name,
            last_name: validated.last_name,
            date_of_birth,
            position: validated.position,
            jersey_number: validated.jersey_number,
            phone: validated.phone,
            team: validated.team,
        },
    )
    .await
    .validate_custom()?;

    let player = get_player(db, player_id).await.validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "Player created", "player": player })),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct PlayerUpdateRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    date_of_birth: Option<String>,
    position: Option<String>,
    #[validate(range(min = 1, max = 99, message = "Jersey number must be between 1 and 99"))]
    jersey_number: Option<i64>,
    team: Option<String>,
    status: Option<String>,
    phone: Option<String>,
}

#[put("/players/<id>", data = "<request>")]
pub async fn api_update_player(
    id: i64,
    request: Json<PlayerUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::EditPlayers)
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

    let status = match &validated.status {
        Some(s) => Some(PlayerStatus::from_str(s).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("status", "Unknown status")),
            )
        })?),
        None => None,
    };

    let date_of_birth = match &validated.date_of_birth {
        Some(d) => Some(
            chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                Custom(
                    Status::UnprocessableEntity,
                    Json(ValidationResponse::with_error(
                        "date_of_birth",
                        "Expected YYYY-MM-DD",
                    )),
                )
            })?,
        ),
        None => None,
    };

    update_player(
        db,
        id,
        &PlayerChanges {
            first_name: validated.first_name,
            last_name: validated.last_name,
            date_of_birth,
            position: validated.position,
            jersey_number: validated.jersey_number,
            team: validated.team,
            status,
            phone: validated.phone,
        },
    )
    .await
    .validate_custom()?;

    let player = get_player(db, id).await.validate_custom()?;

    Ok(Json(json!({ "message": "Player updated", "player": player })))
}

#[delete("/players/<id>")]
pub async fn api_delete_player(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::DeletePlayers)?;

    delete_player(db, id).await?;

    Ok(Json(json!({ "message": "Player deleted" })))
}
