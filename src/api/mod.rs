pub mod auth;
pub mod coaches;
pub mod dashboard;
pub mod matches;
pub mod notifications;
pub mod players;
pub mod trainings;

pub use auth::*;
pub use coaches::*;
pub use dashboard::*;
pub use matches::*;
pub use notifications::*;
pub use players::*;
pub use trainings::*;

use rocket::serde::json::Json;
use serde_json::{Value, json};

#[get("/health")]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
