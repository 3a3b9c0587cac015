use chrono::Utc;
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::{Map, Value, json};
use sqlx::{Pool, Sqlite};

use crate::auth::{Role, User};
use crate::db::{
    PlayerFilter, TrainingFilter, get_all_attendance, get_all_matches, get_coach_for_team,
    get_player_attendance, get_player_by_user_id, get_recent_performances,
    get_team_attendance, get_upcoming_matches, get_upcoming_trainings_for_team,
    get_users_by_role, list_players, list_trainings,
};
use crate::models::{MatchResult, Player, PlayerStatus, TEAMS};
use crate::stats;

fn breakdown<T, F>(items: &[T], key_fn: F) -> Map<String, Value>
where
    F: Fn(&T) -> &'static str,
{
    stats::count_by(items, |item| key_fn(item))
        .into_iter()
        .map(|(key, count)| (key.to_string(), json!(count)))
        .collect()
}

#[get("/dashboard/admin/stats")]
pub async fn api_admin_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    if user.role != Role::Admin {
        return Err(Status::Forbidden);
    }

    let players = list_players(db, &PlayerFilter::default()).await?;
    let coaches = get_users_by_role(db, Role::Coach).await?;
    let trainings = list_trainings(db, &TrainingFilter::default()).await?;
    let matches = get_all_matches(db).await?;
    let attendance = get_all_attendance(db).await?;

    let mut teams = Vec::with_capacity(TEAMS.len());
    for team in TEAMS {
        let player_count = players.iter().filter(|p| p.team == team).count();
        let coach = get_coach_for_team(db, team).await?;
        teams.push(json!({
            "team": team,
            "players": player_count,
            "coach": coach.map(|c| c.name),
        }));
    }

    let count_result = |result: MatchResult| matches.iter().filter(|m| m.result == result).count();

    Ok(Json(json!({
        "players": {
            "total": players.len(),
            "by_status": breakdown(&players, |p: &Player| p.status.as_str()),
        },
        "coaches": { "total": coaches.len() },
        "trainings": {
            "total": trainings.len(),
            "by_status": breakdown(&trainings, |t| t.status.as_str()),
        },
        "matches": {
            "total": matches.len(),
            "wins": count_result(MatchResult::Win),
            "losses": count_result(MatchResult::Loss),
            "draws": count_result(MatchResult::Draw),
            "win_rate": stats::win_rate(&matches),
        },
        "attendance_rate": stats::attendance_rate(&attendance),
        "teams": teams,
    })))
}

#[get("/dashboard/coach/stats")]
pub async fn api_coach_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    if user.role != Role::Coach {
        return Err(Status::Forbidden);
    }

    let team = user.team.clone().ok_or(Status::UnprocessableEntity)?;

    let players = list_players(
        db,
        &PlayerFilter {
            team: Some(team.clone()),
            ..Default::default()
        },
    )
    .await?;

    let trainings = list_trainings(
        db,
        &TrainingFilter {
            coach_id: Some(user.id),
            ..Default::default()
        },
    )
    .await?;

    let attendance = get_team_attendance(db, &team, user.id).await?;

    // Top five active players by average training performance.
    let mut ranked: Vec<(String, i64, f64)> = Vec::new();
    for player in players.iter().filter(|p| p.status == PlayerStatus::Active) {
        let rows = get_player_attendance(db, player.id).await?;
        if let Some(avg) = stats::average_performance(&rows) {
            ranked.push((player.full_name(), player.id, avg));
        }
    }
    ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
    let top_players: Vec<Value> = ranked
        .into_iter()
        .take(5)
        .map(|(name, id, avg)| {
            json!({ "player_id": id, "name": name, "average_performance": avg })
        })
        .collect();

    Ok(Json(json!({
        "team": team,
        "players": {
            "total": players.len(),
            "by_status": breakdown(&players, |p: &Player| p.status.as_str()),
        },
        "trainings": {
            "total": trainings.len(),
            "by_status": breakdown(&trainings, |t| t.status.as_str()),
        },
        "attendance_rate": stats::attendance_rate(&attendance),
        "average_performance": stats::average_performance(&attendance),
        "top_players": top_players,
    })))
}

#[get("/dashboard/player/stats")]
pub async fn api_player_dashboard(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Status> {
    if user.role != Role::Player {
        return Err(Status::Forbidden);
    }

    let player = get_player_by_user_id(db, user.id)
        .await?
        .ok_or(Status::NotFound)?;

    // Chronological order, which trend analysis depends on.
    let attendance = get_player_attendance(db, player.id).await?;

    let attended = attendance
        .iter()
        .filter(|a| a.status.counts_as_attended())
        .count();

    let scores: Vec<f64> = attendance
        .iter()
        .filter_map(|a| a.performance_score)
        .map(|s| s as f64)
        .collect();

    let recent = get_recent_performances(db, player.id, 5).await?;
    let recent_performances: Vec<Value> = recent
        .into_iter()
        .map(|r| {
            json!({
                "date": r.date.map(|d| d.to_string()),
                "title": r.title,
                "performance_score": r.performance_score,
            })
        })
        .collect();

    let today = Utc::now().date_naive();
    let upcoming_trainings = get_upcoming_trainings_for_team(db, &player.team, today, 5).await?;
    let upcoming_matches = get_upcoming_matches(db, today, 5).await?;

    Ok(Json(json!({
        "player": {
            "id": player.id,
            "full_name": player.full_name(),
            "age": player.age(),
            "team": player.team,
            "position": player.position,
            "jersey_number": player.jersey_number,
            "status": player.status.as_str(),
        },
        "trainings_attended": attended,
        "total_trainings": attendance.len(),
        "attendance_rate": stats::attendance_rate(&attendance),
        "average_performance": stats::average_performance(&attendance),
        "performance_trend": stats::trend(&scores),
        "recent_performances": recent_performances,
        "upcoming_trainings": upcoming_trainings,
        "upcoming_matches": upcoming_matches,
    })))
}
