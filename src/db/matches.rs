use chrono::NaiveDate;
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{
    DbMatch, DbMatchAppearance, Match, MatchAppearance, MatchResult, MatchType, SessionStatus,
};

const MATCH_COLUMNS: &str = "id, opponent_team, match_date, match_time, location, match_type, \
                             our_score, opponent_score, result, status, notes";

#[derive(Debug, Default)]
pub struct MatchFilter {
    pub status: Option<SessionStatus>,
    pub result: Option<MatchResult>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

#[derive(Debug)]
pub struct NewMatch {
    pub opponent_team: String,
    pub match_date: NaiveDate,
    pub match_time: String,
    pub location: String,
    pub match_type: MatchType,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct MatchChanges {
    pub opponent_team: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<String>,
    pub location: Option<String>,
    pub match_type: Option<MatchType>,
    pub our_score: Option<i64>,
    pub opponent_score: Option<i64>,
    pub status: Option<SessionStatus>,
    pub notes: Option<String>,
}

#[derive(Debug)]
pub struct AppearanceEntry {
    pub player_id: i64,
    pub is_starter: bool,
    pub minutes_played: Option<i64>,
    pub goals: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub rating: Option<f64>,
}

#[instrument(skip(pool))]
pub async fn list_matches(
    pool: &Pool<Sqlite>,
    filter: &MatchFilter,
) -> Result<Vec<Match>, AppError> {
    info!("Listing matches");

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM matches WHERE 1 = 1",
        MATCH_COLUMNS
    ));

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(result) = filter.result {
        query.push(" AND result = ").push_bind(result.as_str());
    }
    if let Some(from_date) = filter.from_date {
        query.push(" AND match_date >= ").push_bind(from_date);
    }
    if let Some(to_date) = filter.to_date {
        query.push(" AND match_date <= ").push_bind(to_date);
    }

    query.push(" ORDER BY match_date DESC");

    let rows: Vec<DbMatch> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(Match::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_match(pool: &Pool<Sqlite>, id: i64) -> Result<Match, AppError> {
    info!("Fetching match by ID");
    let row = sqlx::query_as::<_, DbMatch>(&format!(
        "SELECT {} FROM matches WHERE id = ?",
        MATCH_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(m) => Ok(Match::from(m)),
        _ => Err(AppError::NotFound(format!(
            "Match with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_all_matches(pool: &Pool<Sqlite>) -> Result<Vec<Match>, AppError> {
    let rows = sqlx::query_as::<_, DbMatch>(&format!("SELECT {} FROM matches", MATCH_COLUMNS))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Match::from).collect())
}

#[instrument(skip_all, fields(opponent = %new_match.opponent_team))]
pub async fn create_match(pool: &Pool<Sqlite>, new_match: &NewMatch) -> Result<i64, AppError> {
    info!("Creating match");

    let res = sqlx::query(
        "INSERT INTO matches
         (opponent_team, match_date, match_time, location, match_type, result, status, notes)
         VALUES (?, ?, ?, ?, ?, 'pending', 'scheduled', ?)",
    )
    .bind(&new_match.opponent_team)
    .bind(new_match.match_date)
    .bind(&new_match.match_time)
    .bind(&new_match.location)
    .bind(new_match.match_type.as_str())
    .bind(&new_match.notes)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Applies the changes, then recomputes `result` from the scores that were
/// actually persisted so it can never reflect a stale pair.
#[instrument(skip(pool, changes))]
pub async fn update_match(
    pool: &Pool<Sqlite>,
    match_id: i64,
    changes: &MatchChanges,
) -> Result<Match, AppError> {
    info!("Updating match");

    let current = get_match(pool, match_id).await?;

    let opponent_team = changes
        .opponent_team
        .clone()
        .unwrap_or(current.opponent_team);
    let match_date = changes.match_date.unwrap_or(current.match_date);
    let match_time = changes.match_time.clone().unwrap_or(current.match_time);
    let location = changes.location.clone().unwrap_or(current.location);
    let match_type = changes.match_type.unwrap_or(current.match_type);
    let our_score = changes.our_score.or(current.our_score);
    let opponent_score = changes.opponent_score.or(current.opponent_score);
    let status = changes.status.unwrap_or(current.status);
    let notes = changes.notes.clone().or(current.notes);

    sqlx::query(
        "UPDATE matches
         SET opponent_team = ?, match_date = ?, match_time = ?, location = ?,
             match_type = ?, our_score = ?, opponent_score = ?, status = ?, notes = ?
         WHERE id = ?",
    )
    .bind(&opponent_team)
    .bind(match_date)
    .bind(&match_time)
    .bind(&location)
    .bind(match_type.as_str())
    .bind(our_score)
    .bind(opponent_score)
    .bind(status.as_str())
    .bind(&notes)
    .bind(match_id)
    .execute(pool)
    .await?;

    recompute_match_result(pool, match_id).await
}

/// Re-reads the persisted scores and derives `result` from them.
#[instrument(skip(pool))]
pub async fn recompute_match_result(
    pool: &Pool<Sqlite>,
    match_id: i64,
) -> Result<Match, AppError> {
    let mut m = get_match(pool, match_id).await?;
    let result = m.compute_result();

    sqlx::query("UPDATE matches SET result = ? WHERE id = ?")
        .bind(result.as_str())
        .bind(match_id)
        .execute(pool)
        .await?;

    m.result = result;
    Ok(m)
}

#[instrument(skip(pool))]
pub async fn delete_match(pool: &Pool<Sqlite>, match_id: i64) -> Result<(), AppError> {
    info!("Deleting match with appearances");

    get_match(pool, match_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM match_players WHERE match_id = ?")
        .bind(match_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM matches WHERE id = ?")
        .bind(match_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Records per-player match stats. Upserts on (player_id, match_id), so a
/// player can appear in a match sheet once at most.
#[instrument(skip(pool, entries))]
pub async fn upsert_match_players(
    pool: &Pool<Sqlite>,
    match_id: i64,
    entries: &[AppearanceEntry],
) -> Result<(), AppError> {
    info!(count = entries.len(), "Recording match appearances");

    let mut tx = pool.begin().await?;

    for entry in entries {
        sqlx::query(
            "INSERT INTO match_players
             (match_id, player_id, is_starter, minutes_played, goals, assists,
              yellow_cards, red_cards, rating)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (player_id, match_id) DO UPDATE SET
                 is_starter = excluded.is_starter,
                 minutes_played = excluded.minutes_played,
                 goals = excluded.goals,
                 assists = excluded.assists,
                 yellow_cards = excluded.yellow_cards,
                 red_cards = excluded.red_cards,
                 rating = excluded.rating",
        )
        .bind(match_id)
        .bind(entry.player_id)
        .bind(entry.is_starter)
        .bind(entry.minutes_played)
        .bind(entry.goals)
        .bind(entry.assists)
        .bind(entry.yellow_cards)
        .bind(entry.red_cards)
        .bind(entry.rating)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_match_appearances(
    pool: &Pool<Sqlite>,
    match_id: i64,
) -> Result<Vec<MatchAppearance>, AppError> {
    let rows = sqlx::query_as::<_, DbMatchAppearance>(
        "SELECT mp.match_id, mp.player_id, p.first_name, p.last_name, mp.is_starter,
                mp.minutes_played, mp.goals, mp.assists, mp.yellow_cards, mp.red_cards, mp.rating
         FROM match_players mp
         JOIN players p ON p.id = mp.player_id
         WHERE mp.match_id = ?
         ORDER BY mp.is_starter DESC, p.last_name",
    )
    .bind(match_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MatchAppearance::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_upcoming_matches(
    pool: &Pool<Sqlite>,
    today: NaiveDate,
    limit: i64,
) -> Result<Vec<Match>, AppError> {
    let rows = sqlx::query_as::<_, DbMatch>(&format!(
        "SELECT {} FROM matches
         WHERE status = 'scheduled' AND match_date >= ?
         ORDER BY match_date ASC LIMIT ?",
        MATCH_COLUMNS
    ))
    .bind(today)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Match::from).collect())
}

#[instrument(skip(pool))]
pub async fn sum_goals(pool: &Pool<Sqlite>) -> Result<(i64, i64), AppError> {
    let row: (Option<i64>, Option<i64>) = sqlx::query_as(
        "SELECT SUM(our_score), SUM(opponent_score) FROM matches
         WHERE our_score IS NOT NULL AND opponent_score IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok((row.0.unwrap_or(0), row.1.unwrap_or(0)))
}
