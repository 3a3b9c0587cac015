use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

const USER_COLUMNS: &str = "id, name, email, role, team, phone, speciality, avatar, is_active";

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool))]
pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, AppError> {
    info!("Fetching user by email");
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

/// Verifies credentials and returns the matching user, or `None` when either
/// the email is unknown or the password does not verify. The two cases are
/// indistinguishable to the caller on purpose.
#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row: Option<(i64, String)> =
        sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((id, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(get_user(pool, id).await?)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument(skip_all, fields(email, role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    team: Option<&str>,
    phone: Option<&str>,
    speciality: Option<&str>,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::conflict("email", "Email already registered"));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    let res = sqlx::query(
        "INSERT INTO users (name, email, password, role, team, phone, speciality, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, TRUE)",
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .bind(role.as_str())
    .bind(team)
    .bind(phone)
    .bind(speciality)
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

#[instrument(skip(pool))]
pub async fn update_user_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating user profile");

    if let Some(email) = email {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        if existing.is_some() {
            return Err(AppError::conflict("email", "Email already registered"));
        }

        sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(email)
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    if let Some(name) = name {
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    if let Some(phone) = phone {
        sqlx::query("UPDATE users SET phone = ? WHERE id = ?")
            .bind(phone)
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[instrument(skip_all, fields(user_id))]
pub async fn update_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new_password: &str,
) -> Result<(), AppError> {
    info!("Updating user password");
    let hashed_password = bcrypt::hash(new_password, bcrypt::DEFAULT_COST)?;

    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_users_by_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<User>, AppError> {
    info!(role = %role, "Getting users by role");
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE role = ? ORDER BY name",
        USER_COLUMNS
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_all_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, DbUser>(&format!("SELECT {} FROM users", USER_COLUMNS))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

#[instrument(skip(pool))]
pub async fn get_coach_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    let user = get_user(pool, id).await?;
    if user.role != Role::Coach {
        return Err(AppError::NotFound(format!(
            "Coach with id {} not found in database",
            id
        )));
    }
    Ok(user)
}

#[instrument(skip(pool))]
pub async fn get_coach_for_team(
    pool: &Pool<Sqlite>,
    team: &str,
) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE role = 'coach' AND team = ? LIMIT 1",
        USER_COLUMNS
    ))
    .bind(team)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

#[instrument(skip(pool))]
pub async fn update_coach(
    pool: &Pool<Sqlite>,
    coach_id: i64,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    speciality: Option<&str>,
    team: Option<&str>,
) -> Result<(), AppError> {
    info!("Updating coach");

    update_user_profile(pool, coach_id, name, email, phone).await?;

    if let Some(speciality) = speciality {
        sqlx::query("UPDATE users SET speciality = ? WHERE id = ?")
            .bind(speciality)
            .bind(coach_id)
            .execute(pool)
            .await?;
    }

    if let Some(team) = team {
        sqlx::query("UPDATE users SET team = ? WHERE id = ?")
            .bind(team)
            .bind(coach_id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Deletes a user and everything hanging off it in one transaction: the
/// player profile with its attendance and match rows, authored training
/// sessions with their seeded attendance, authored notifications with their
/// read receipts, and any live login sessions.
#[instrument(skip(pool))]
pub async fn delete_user_cascade(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user with dependents");

    let mut tx = pool.begin().await?;

    let player: Option<(i64,)> = sqlx::query_as("SELECT id FROM players WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

    if let Some((player_id,)) = player {
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
    }

    sqlx::query(
        "DELETE FROM attendances WHERE training_session_id IN
         (SELECT id FROM training_sessions WHERE coach_id = ?)",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM training_sessions WHERE coach_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM notification_reads WHERE notification_id IN
         (SELECT id FROM notifications WHERE created_by = ?)",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM notifications WHERE created_by = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM notification_reads WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
