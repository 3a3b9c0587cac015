#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod database;
mod db;
mod error;
mod models;
mod stats;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use api::{
    api_admin_dashboard, api_change_password, api_coach_dashboard, api_create_coach,
    api_create_match, api_create_notification, api_create_player, api_create_training,
    api_delete_coach, api_delete_match, api_delete_notification, api_delete_player,
    api_delete_training, api_get_coach, api_get_coaches, api_get_match, api_get_match_summary,
    api_get_matches, api_get_notification, api_get_notifications, api_get_player,
    api_get_players, api_get_training, api_get_trainings, api_login, api_logout,
    api_mark_all_notifications_read, api_mark_attendance, api_mark_notification_read, api_me,
    api_me_unauthorized, api_player_dashboard, api_record_match_players, api_register_user,
    api_unread_notification_count, api_update_coach, api_update_match, api_update_notification,
    api_update_player, api_update_profile, api_update_training, health,
};
use auth::{forbidden_api, unauthorized_api};
use database::apply_schema;
use db::clean_expired_sessions;
use error::AppError;
use rocket::{Build, Rocket, tokio};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::info;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    let _ = dotenvy::dotenv();

    init_tracing();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Applying database schema...");
    apply_schema(&pool)
        .await
        .expect("Failed to apply database schema");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting club tracker");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_update_profile,
                api_change_password,
                api_register_user,
                api_get_players,
                api_get_player,
                api_create_player,
                api_update_player,
                api_delete_player,
                api_get_coaches,
                api_get_coach,
                api_create_coach,
                api_update_coach,
                api_delete_coach,
                api_get_trainings,
                api_get_training,
                api_create_training,
                api_update_training,
                api_delete_training,
                api_mark_attendance,
                api_get_matches,
                api_get_match,
                api_get_match_summary,
                api_create_match,
                api_update_match,
                api_delete_match,
                api_record_match_players,
                api_get_notifications,
                api_get_notification,
                api_create_notification,
                api_update_notification,
                api_delete_notification,
                api_mark_notification_read,
                api_mark_all_notifications_read,
                api_unread_notification_count,
                api_admin_dashboard,
                api_coach_dashboard,
                api_player_dashboard,
                health,
            ],
        )
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .attach(TelemetryFairing)
}
