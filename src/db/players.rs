use chrono::NaiveDate;
use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{Attendance, DbAttendance, DbPlayer, Player, PlayerStatus};

const PLAYER_COLUMNS: &str =
    "id, user_id, first_name, last_name, date_of_birth, position, jersey_number, team, status";

#[derive(Debug, Default)]
pub struct PlayerFilter {
    pub team: Option<String>,
    pub status: Option<PlayerStatus>,
    pub position: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct NewPlayer {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub position: Option<String>,
    pub jersey_number: Option<i64>,
    pub phone: Option<String>,
    pub team: String,
}

#[derive(Debug, Default)]
pub struct PlayerChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<String>,
    pub jersey_number: Option<i64>,
    pub team: Option<String>,
    pub status: Option<PlayerStatus>,
    pub phone: Option<String>,
}

#[instrument(skip(pool))]
pub async fn list_players(
    pool: &Pool<Sqlite>,
    filter: &PlayerFilter,
) -> Result<Vec<Player>, AppError> {
    info!("Listing players");

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM players WHERE 1 = 1",
        PLAYER_COLUMNS
    ));

    if let Some(team) = &filter.team {
        query.push(" AND team = ").push_bind(team);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(position) = &filter.position {
        query.push(" AND position = ").push_bind(position);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        query
            .push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query.push(" ORDER BY last_name, first_name");

    let rows: Vec<DbPlayer> = query.build_query_as().fetch_all(pool).await?;

    Ok(rows.into_iter().map(Player::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_player(pool: &Pool<Sqlite>, id: i64) -> Result<Player, AppError> {
    info!("Fetching player by ID");
    let row = sqlx::query_as::<_, DbPlayer>(&format!(
        "SELECT {} FROM players WHERE id = ?",
        PLAYER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(player) => Ok(Player::from(player)),
        _ => Err(AppError::NotFound(format!(
            "Player with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn get_player_by_user_id(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<Player>, AppError> {
    let row = sqlx::query_as::<_, DbPlayer>(&format!(
        "SELECT {} FROM players WHERE user_id = ?",
        PLAYER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Player::from))
}

#[instrument(skip(pool))]
pub async fn get_active_players(pool: &Pool<Sqlite>) -> Result<Vec<Player>, AppError> {
    let rows = sqlx::query_as::<_, DbPlayer>(&format!(
        "SELECT {} FROM players WHERE status = 'active'",
        PLAYER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Player::from).collect())
}

async fn check_jersey_number_free(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    jersey_number: i64,
    exclude_player: Option<i64>,
) -> Result<(), AppError> {
    let existing: Option<(i64,)> = match exclude_player {
        Some(player_id) => {
            sqlx::query_as("SELECT id FROM players WHERE jersey_number = ? AND id != ?")
                .bind(jersey_number)
                .bind(player_id)
                .fetch_optional(&mut **tx)
                .await?
        }
        None => sqlx::query_as("SELECT id FROM players WHERE jersey_number = ?")
            .bind(jersey_number)
            .fetch_optional(&mut **tx)
            .await?,
    };

    if existing.is_some() {
        return Err(AppError::conflict(
            "jersey_number",
            "Jersey number already taken",
        ));
    }
    Ok(())
}

/// Creates the owning user account and the player profile together; both
/// rows land or neither does.
#[instrument(skip_all, fields(email = %new_player.email, team = %new_player.team))]
pub async fn create_player(pool: &Pool<Sqlite>, new_player: &NewPlayer) -> Result<i64, AppError> {
    info!("Creating player");

    let mut tx = pool.begin().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&new_player.email)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(AppError::conflict("email", "Email already registered"));
    }

    if let Some(jersey_number) = new_player.jersey_number {
        check_jersey_number_free(&mut tx, jersey_number, None).await?;
    }

    let hashed_password = bcrypt::hash(&new_player.password, bcrypt::DEFAULT_COST)?;
    let name = format!("{} {}", new_player.first_name, new_player.last_name);

    let res = sqlx::query(
        "INSERT INTO users (name, email, password, role, phone, is_active)
         VALUES (?, ?, ?, ?, ?, TRUE)",
    )
    .bind(&name)
    .bind(&new_player.email)
    .bind(hashed_password)
    .bind(Role::Player.as_str())
    .bind(&new_player.phone)
    .execute(&mut *tx)
    .await?;
    let user_id = res.last_insert_rowid();

    let res = sqlx::query(
        "INSERT INTO players
         (user_id, first_name, last_name, date_of_birth, position, jersey_number, team, status)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'active')",
    )
    .bind(user_id)
    .bind(&new_player.first_name)
    .bind(&new_player.last_name)
    .bind(new_player.date_of_birth)
    .bind(&new_player.position)
    .bind(new_player.jersey_number)
    .bind(&new_player.team)
    .execute(&mut *tx)
    .await?;
    let player_id = res.last_insert_rowid();

    tx.commit().await?;

    Ok(player_id)
}

#[instrument(skip(pool, changes))]
pub async fn update_player(
    pool: &Pool<Sqlite>,
    player_id: i64,
    changes: &PlayerChanges,
) -> Result<(), AppError> {
    info!("Updating player");

    let current = get_player(pool, player_id).await?;

    let mut tx = pool.begin().await?;

    if let Some(jersey_number) = changes.jersey_number {
        check_jersey_number_free(&mut tx, jersey_number, Some(player_id)).await?;
    }

    let first_name = changes.first_name.clone().unwrap_or(current.first_name);
    let last_name = changes.last_name.clone().unwrap_or(current.last_name);
    let date_of_birth = changes.date_of_birth.unwrap_or(current.date_of_birth);
    let position = changes.position.clone().or(current.position);
    let jersey_number = changes.jersey_number.or(current.jersey_number);
    let team = changes.team.clone().unwrap_or(current.team);
    let status = changes.status.unwrap_or(current.status);

    sqlx::query(
        "UPDATE players
         SET first_name = ?, last_name = ?, date_of_birth = ?, position = ?,
             jersey_number = ?, team = ?, status = ?
         WHERE id = ?",
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(date_of_birth)
    .bind(&position)
    .bind(jersey_number)
    .bind(&team)
    .bind(status.as_str())
    .bind(player_id)
    .execute(&mut *tx)
    .await?;

    // Name and phone live on the owning user row
    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(format!("{} {}", first_name, last_name))
        .bind(current.user_id)
        .execute(&mut *tx)
        .await?;

    if let Some(phone) = &changes.phone {
        sqlx::query("UPDATE users SET phone = ? WHERE id = ?")
            .bind(phone)
            .bind(current.user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Removes the player, its attendance and match rows, and the owning user
/// account in one transaction.
#[instrument(skip(pool))]
pub async fn delete_player(pool: &Pool<Sqlite>, player_id: i64) -> Result<(), AppError> {
    info!("Deleting player with dependents");

    let player = get_player(pool, player_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attendances WHERE player_id = ?")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM match_players WHERE player_id = ?")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM players WHERE id = ?")
        .bind(player_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(player.user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(player.user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// A player's attendance rows in chronological session order, which is the
/// order trend analysis expects.
#[instrument(skip(pool))]
pub async fn get_player_attendance(
    pool: &Pool<Sqlite>,
    player_id: i64,
) -> Result<Vec<Attendance>, AppError> {
    let rows = sqlx::query_as::<_, DbAttendance>(
        "SELECT a.id, a.training_session_id, a.player_id, a.status,
                a.performance_score, a.remarks, a.created_at
         FROM attendances a
         JOIN training_sessions t ON t.id = a.training_session_id
         WHERE a.player_id = ?
         ORDER BY t.date ASC, a.id ASC",
    )
    .bind(player_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Attendance::from).collect())
}
