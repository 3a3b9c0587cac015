use rocket::FromForm;
use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, User};
use crate::db::{
    AppearanceEntry, MatchChanges, MatchFilter, NewMatch, create_match, delete_match,
    get_all_matches, get_match, get_match_appearances, list_matches, sum_goals,
    update_match, upsert_match_players,
};
use crate::models::{MatchResult, MatchType, SessionStatus};
use crate::stats;
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

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
pub struct MatchesQueryParams {
    status: Option<String>,
    result: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
}

#[get("/matches?<params..>")]
pub async fn api_get_matches(
    params: MatchesQueryParams,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    let filter = MatchFilter {
        status: params.status.as_deref().and_then(SessionStatus::from_str),
        result: params.result.as_deref().and_then(MatchResult::from_str),
        from_date: parse_date(&params.from_date, "from_date")?,
        to_date: parse_date(&params.to_date, "to_date")?,
    };

    let matches = list_matches(db, &filter).await.validate_custom()?;

    Ok(Json(json!({ "matches": matches })))
}

#[get("/matches/<id>")]
pub async fn api_get_match(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    let m = get_match(db, id).await?;
    let players = get_match_appearances(db, id).await?;

    Ok(Json(json!({ "match": m, "players": players })))
}

#[derive(Serialize, Deserialize)]
pub struct MatchSummaryResponse {
    pub total_matches: usize,
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub pending: usize,
    pub win_rate: f64,
    pub goals_for: i64,
    pub goals_against: i64,
}

#[get("/matches/stats/summary")]
pub async fn api_get_match_summary(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<MatchSummaryResponse>, Status> {
    let matches = get_all_matches(db).await?;
    let (goals_for, goals_against) = sum_goals(db).await?;

    let count_result = |result: MatchResult| matches.iter().filter(|m| m.result == result).count();

    Ok(Json(MatchSummaryResponse {
        total_matches: matches.len(),
        wins: count_result(MatchResult::Win),
        losses: count_result(MatchResult::Loss),
        draws: count_result(MatchResult::Draw),
        pending: count_result(MatchResult::Pending),
        win_rate: stats::win_rate(&matches),
        goals_for,
        goals_against,
    }))
}

#[derive(Deserialize, Validate, Clone)]
pub struct MatchCreateRequest {
    #[validate(length(min = 1, message = "Opponent team must not be empty"))]
    opponent_team: String,
    match_date: String,
    #[validate(length(min = 1, message = "Match time is required"))]
    match_time: String,
    #[validate(length(min = 1, message = "Location is required"))]
    location: String,
    match_type: String,
    notes: Option<String>,
}

#[post("/matches", data = "<request>")]
pub async fn api_create_match(
    request: Json<MatchCreateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageMatches)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let match_type = MatchType::from_str(&validated.match_type).ok_or_else(|| {
        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error(
                "match_type",
                "Unknown match type",
            )),
        )
    })?;

    let match_date = parse_date(&Some(validated.match_date.clone()), "match_date")?
        .unwrap_or_default();

    let match_id = create_match(
        db,
        &NewMatch {
            opponent_team: validated.opponent_team,
            match_date,
            match_time: validated.match_time,
            location: validated.location,
            match_type,
            notes: validated.notes,
        },
    )
    .await
    .validate_custom()?;

    let m = get_match(db, match_id).await.validate_custom()?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "Match created", "match": m })),
    ))
}

#[derive(Deserialize, Validate, Clone)]
pub struct MatchUpdateRequest {
    opponent_team: Option<String>,
    match_date: Option<String>,
    match_time: Option<String>,
    location: Option<String>,
    match_type: Option<String>,
    #[validate(range(min = 0, message = "Score must not be negative"))]
    our_score: Option<i64>,
    #[validate(range(min = 0, message = "Score must not be negative"))]
    opponent_score: Option<i64>,
    status: Option<String>,
    notes: Option<String>,
}

#[put("/matches/<id>", data = "<request>")]
pub async fn api_update_match(
    id: i64,
    request: Json<MatchUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageMatches)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let match_type = match &validated.match_type {
        Some(t) => Some(MatchType::from_str(t).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error(
                    "match_type",
                    "Unknown match type",
                )),
            )
        })?),
        None => None,
    };

    let status = match &validated.status {
        Some(s) => Some(SessionStatus::from_str(s).ok_or_else(|| {
            Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("status", "Unknown status")),
            )
        })?),
        None => None,
    };

    let m = update_match(
        db,
        id,
        &MatchChanges {
            opponent_team: validated.opponent_team,
            match_date: parse_date(&validated.match_date, "match_date")?,
            match_time: validated.match_time,
            location: validated.location,
            match_type,
            our_score: validated.our_score,
            opponent_score: validated.opponent_score,
            status,
            notes: validated.notes,
        },
    )
    .await
    .validate_custom()?;

    Ok(Json(json!({ "message": "Match updated", "match": m })))
}

#[delete("/matches/<id>")]
pub async fn api_delete_match(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    user.require_permission(Permission::ManageMatches)?;

    delete_match(db, id).await?;

    Ok(Json(json!({ "message": "Match deleted" })))
}

#[derive(Deserialize, Validate)]
pub struct MatchPlayerEntryRequest {
    player_id: i64,
    is_starter: Option<bool>,
    #[validate(range(min = 0, max = 150, message = "Minutes played must be between 0 and 150"))]
    minutes_played: Option<i64>,
    #[validate(range(min = 0, message = "Goals must not be negative"))]
    goals: Option<i64>,
    #[validate(range(min = 0, message = "Assists must not be negative"))]
    assists: Option<i64>,
    #[validate(range(min = 0, max = 2, message = "Yellow cards must be between 0 and 2"))]
    yellow_cards: Option<i64>,
    #[validate(range(min = 0, max = 1, message = "Red cards must be 0 or 1"))]
    red_cards: Option<i64>,
    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0 and 10"))]
    rating: Option<f64>,
}

#[derive(Deserialize, Validate)]
pub struct MatchPlayersRequest {
    #[validate(nested)]
    players: Vec<MatchPlayerEntryRequest>,
}

#[post("/matches/<id>/players", data = "<request>")]
pub async fn api_record_match_players(
    id: i64,
    request: Json<MatchPlayersRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::ManageMatches)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    get_match(db, id).await.validate_custom()?;

    let entries: Vec<AppearanceEntry> = validated
        .players
        .iter()
        .map(|entry| AppearanceEntry {
            player_id: entry.player_id,
            is_starter: entry.is_starter.unwrap_or(false),
            minutes_played: entry.minutes_played,
            goals: entry.goals.unwrap_or(0),
            assists: entry.assists.unwrap_or(0),
            yellow_cards: entry.yellow_cards.unwrap_or(0),
            red_cards: entry.red_cards.unwrap_or(0),
            rating: entry.rating,
        })
        .collect();

    upsert_match_players(db, id, &entries).await.validate_custom()?;

    let players = get_match_appearances(db, id).await.validate_custom()?;

    Ok(Json(
        json!({ "message": "Match players recorded", "players": players }),
    ))
}
