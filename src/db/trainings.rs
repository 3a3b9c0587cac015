use chrono::NaiveDate;
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    Attendance, AttendanceStatus, DbAttendance, DbTrainingSession, SessionStatus, TrainingSession,
};

const TRAINING_COLUMNS: &str =
    "id, coach_id, title, description, date, start_time, end_time, location, status";

#[derive(Debug, Default)]
pub struct TrainingFilter {
    pub status: Option<SessionStatus>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Restricts to sessions holding an attendance row for this player.
    pub player_id: Option<i64>,
    pub coach_id: Option<i64>,
}

#[derive(Debug)]
pub struct NewTraining {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
}

#[derive(Debug, Default)]
pub struct TrainingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub status: Option<SessionStatus>,
}

#[derive(Debug)]
pub struct AttendanceEntry {
    pub player_id: i64,
    pub status: AttendanceStatus,
    pub performance_score: Option<i64>,
    pub remarks: Option<String>,
}

#[instrument(skip(pool))]
pub async fn list_trainings(
    pool: &Pool<Sqlite>,
    filter: &TrainingFilter,
) -> Result<Vec<TrainingSession>, AppError> {
    info!("Listing training sessions");

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM training_sessions WHERE 1 = 1",
        TRAINING_COLUMNS
    ));

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from_date) = filter.from_date {
        query.push(" AND date >= ").push_bind(from_date);
    }
    if let Some(to_date) = filter.to_date {
        query.push(" AND date <= ").push_bind(to_date);
    }
    if let Some(player_id) = filter.player_id {
        query
            .push(" AND id IN (SELECT training_session_id FROM attendances WHERE player_id = ")
            .push_bind(player_id)
            .push(")");
    }
    if let Some(coach_id) = filter.coach_id {
        query.push(" AND coach_id = ").push_bind(coach_id);
    }

    query.push(" ORDER BY date DESC");

    let rows: Vec<DbTrainingSession> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(TrainingSession::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_training(pool: &Pool<Sqlite>, id: i64) -> Result<TrainingSession, AppError> {
    info!("Fetching training session by ID");
    let row = sqlx::query_as::<_, DbTrainingSession>(&format!(
        "SELECT {} FROM training_sessions WHERE id = ?",
        TRAINING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(training) => Ok(TrainingSession::from(training)),
        _ => Err(AppError::NotFound(format!(
            "Training session with id {} not found in database",
            id
        ))),
    }
}

/// Inserts the session and seeds one absent attendance row for every
/// currently-active player, all inside one transaction.
#[instrument(skip_all, fields(coach_id, title = %new_training.title))]
pub async fn create_training(
    pool: &Pool<Sqlite>,
    coach_id: i64,
    new_training: &NewTraining,
) -> Result<i64, AppError> {
    info!("Creating training session");

    let mut tx = pool.begin().await?;

    let res = sqlx::query(
        "INSERT INTO training_sessions
         (coach_id, title, description, date, start_time, end_time, location, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'scheduled')",
    )
    .bind(coach_id)
    .bind(&new_training.title)
    .bind(&new_training.description)
    .bind(new_training.date)
    .bind(&new_training.start_time)
    .bind(&new_training.end_time)
    .bind(&new_training.location)
    .execute(&mut *tx)
    .await?;
    let training_id = res.last_insert_rowid();

    let active_players: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM players WHERE status = 'active'")
            .fetch_all(&mut *tx)
            .await?;

    for (player_id,) in active_players {
        sqlx::query(
            "INSERT INTO attendances (training_session_id, player_id, status)
             VALUES (?, ?, 'absent')",
        )
        .bind(training_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(training_id)
}

#[instrument(skip(pool, changes))]
pub async fn update_training(
    pool: &Pool<Sqlite>,
    training_id: i64,
    changes: &TrainingChanges,
) -> Result<TrainingSession, AppError> {
    info!("Updating training session");

    let current = get_training(pool, training_id).await?;

    if let Some(next_status) = changes.status {
        if !current.status.can_transition_to(next_status) {
            return Err(AppError::Validation(format!(
                "Cannot move a {} session to {}",
                current.status.as_str(),
                next_status.as_str()
            )));
        }
    }

    let title = changes.title.clone().unwrap_or(current.title);
    let description = changes.description.clone().or(current.description);
    let date = changes.date.unwrap_or(current.date);
    let start_time = changes.start_time.clone().unwrap_or(current.start_time);
    let end_time = changes.end_time.clone().unwrap_or(current.end_time);
    let location = changes.location.clone().or(current.location);
    let status = changes.status.unwrap_or(current.status);

    sqlx::query(
        "UPDATE training_sessions
         SET title = ?, description = ?, date = ?, start_time = ?, end_time = ?,
             location = ?, status = ?
         WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(date)
    .bind(&start_time)
    .bind(&end_time)
    .bind(&location)
    .bind(status.as_str())
    .bind(training_id)
    .execute(pool)
    .await?;

    get_training(pool, training_id).await
}

#[instrument(skip(pool))]
pub async fn delete_training(pool: &Pool<Sqlite>, training_id: i64) -> Result<(), AppError> {
    info!("Deleting training session with attendance");

    get_training(pool, training_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attendances WHERE training_session_id = ?")
        .bind(training_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM training_sessions WHERE id = ?")
        .bind(training_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Bulk attendance marking. Each entry upserts on the
/// (training_session_id, player_id) key, so re-submitting updates in place.
#[instrument(skip(pool, entries))]
pub async fn mark_attendance(
    pool: &Pool<Sqlite>,
    training_id: i64,
    entries: &[AttendanceEntry],
) -> Result<(), AppError> {
    info!(count = entries.len(), "Marking attendance");

    let mut tx = pool.begin().await?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO attendances
             (training_session_id, player_id, status, performance_score, remarks)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (training_session_id, player_id) DO UPDATE SET
                 status = excluded.status,
                 performance_score = excluded.performance_score,
                 remarks = excluded.remarks",
        )
        .bind(training_id)
        .bind(entry.player_id)
        .bind(entry.status.as_str())
        .bind(entry.performance_score)
        .bind(&entry.remarks)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_session_attendance(
    pool: &Pool<Sqlite>,
    training_id: i64,
) -> Result<Vec<Attendance>, AppError> {
    let rows = sqlx::query_as::<_, DbAttendance>(
        "SELECT id, training_session_id, player_id, status, performance_score, remarks, created_at
         FROM attendances WHERE training_session_id = ? ORDER BY player_id",
    )
    .bind(training_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attendance::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_all_attendance(pool: &Pool<Sqlite>) -> Result<Vec<Attendance>, AppError> {
    let rows = sqlx::query_as::<_, DbAttendance>(
        "SELECT id, training_session_id, player_id, status, performance_score, remarks, created_at
         FROM attendances",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attendance::from).collect())
}

/// Attendance restricted to one team's players at one coach's sessions;
/// the row set behind the coach dashboard aggregates.
#[instrument(skip(pool))]
pub async fn get_team_attendance(
    pool: &Pool<Sqlite>,
    team: &str,
    coach_id: i64,
) -> Result<Vec<Attendance>, AppError> {
    let rows = sqlx::query_as::<_, DbAttendance>(
        "SELECT a.id, a.training_session_id, a.player_id, a.status,
                a.performance_score, a.remarks, a.created_at
         FROM attendances a
         JOIN players p ON p.id = a.player_id
         JOIN training_sessions t ON t.id = a.training_session_id
         WHERE p.team = ? AND t.coach_id = ?",
    )
    .bind(team)
    .bind(coach_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attendance::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_upcoming_trainings_for_team(
    pool: &Pool<Sqlite>,
    team: &str,
    today: NaiveDate,
    limit: i64,
) -> Result<Vec<TrainingSession>, AppError> {
    let rows = sqlx::query_as::<_, DbTrainingSession>(&format!(
        "SELECT {} FROM training_sessions
         WHERE status = 'scheduled' AND date >= ?
           AND coach_id IN (SELECT id FROM users WHERE role = 'coach' AND team = ?)
         ORDER BY date ASC LIMIT ?",
        TRAINING_COLUMNS
    ))
    .bind(today)
    .bind(team)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TrainingSession::from).collect())
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbRecentPerformance {
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub performance_score: Option<i64>,
}

/// A player's latest scored sessions, most recent first.
#[instrument(skip(pool))]
pub async fn get_recent_performances(
    pool: &Pool<Sqlite>,
    player_id: i64,
    limit: i64,
) -> Result<Vec<DbRecentPerformance>, AppError> {
    let rows = sqlx::query_as::<_, DbRecentPerformance>(
        "SELECT t.date, t.title, a.performance_score
         FROM attendances a
         JOIN training_sessions t ON t.id = a.training_session_id
         WHERE a.player_id = ? AND a.performance_score IS NOT NULL
         ORDER BY t.date DESC, a.id DESC
         LIMIT ?",
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
