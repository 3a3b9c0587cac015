use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{Deserialize, Serialize, json::Json};
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Role, User};
use crate::db::{
    NewPlayer, authenticate_user, create_player, create_user, create_user_session,
    find_user_by_email, get_user, invalidate_session, update_user_password, update_user_profile,
};
use crate::models::TEAMS;
use crate::validation::{AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Must be a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub team: Option<String>,
    pub phone: Option<String>,
    pub speciality: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.as_str().to_string(),
            team: user.team,
            phone: user.phone,
            speciality: user.speciality,
            avatar: user.avatar,
            is_active: user.is_active,
        }
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use rocket::http::{Cookie, SameSite};

    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.email, &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) if user.is_active => {
            let token = create_user_session(db, user.id).await.validate_custom()?;

            let cookie = Cookie::build(("session_token", token))
                .same_site(SameSite::Lax)
                .http_only(true)
                .max_age(rocket::time::Duration::hours(24));
            cookies.add_private(cookie);

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
            }))
        }
        Some(_) => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Account is deactivated".to_string()),
        })),
        None => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid email or password".to_string()),
        })),
    }
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Status {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    cookies.remove_private(rocket::http::Cookie::build("session_token"));

    Status::Ok
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[derive(Deserialize, Validate, Clone)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    name: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    email: Option<String>,
    phone: Option<String>,
}

#[put("/profile", data = "<profile>")]
pub async fn api_update_profile(
    profile: Json<ProfileUpdateRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    let validated = profile.validate_custom()?;

    update_user_profile(
        db,
        user.id,
        validated.name.as_deref(),
        validated.email.as_deref(),
        validated.phone.as_deref(),
    )
    .await
    .validate_custom()?;

    let updated = get_user(db, user.id).await.validate_custom()?;

    Ok(Json(
        json!({ "message": "Profile updated", "user": UserData::from(updated) }),
    ))
}

#[derive(Deserialize, Validate)]
pub struct PasswordChangeRequest {
    current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    new_password: String,
}

#[put("/change-password", data = "<password>")]
pub async fn api_change_password(
    password: Json<PasswordChangeRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Value>, Custom<Json<ValidationResponse>>> {
    let validated = password.validate_custom()?;

    let is_valid = authenticate_user(db, &user.email, &validated.current_password)
        .await
        .validate_custom()?;

    match is_valid {
        Some(_) => {
            update_user_password(db, user.id, &validated.new_password)
                .await
                .validate_custom()?;

            Ok(Json(
                json!({ "message": "Password updated", "user": UserData::from(user) }),
            ))
        }
        _ => Err(Custom(
            Status::Unauthorized,
            Json(ValidationResponse::with_error(
                "current_password",
                "Current password is incorrect",
            )),
        )),
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct UserRegistrationRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    name: String,
    #[validate(email(message = "Must be a valid email address"))]
    email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    role: String,
    team: Option<String>,
    phone: Option<String>,
    speciality: Option<String>,
    // Player profile fields, required when role is "player"
    first_name: Option<String>,
    last_name: Option<String>,
    date_of_birth: Option<String>,
    position: Option<String>,
    jersey_number: Option<i64>,
}

#[post("/register", data = "<registration>")]
pub async fn api_register_user(
    registration: Json<UserRegistrationRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Value>>, Custom<Json<ValidationResponse>>> {
    user.require_permission(Permission::RegisterUsers)
        .validate_custom()?;

    let validated = registration.validate_custom()?;

    let role = Role::from_str(&validated.role).map_err(|_| {
        Custom(
            Status::UnprocessableEntity,
            Json(ValidationResponse::with_error("role", "Unknown role")),
        )
    })?;

    if let Some(team) = &validated.team {
        if !TEAMS.contains(&team.as_str()) {
            return Err(Custom(
                Status::UnprocessableEntity,
                Json(ValidationResponse::with_error("team", "Unknown team")),
            ));
        }
    }

    match role {
        // A player registration materializes the 1:1 player profile alongside
        // the account, in one transaction.
        Role::Player => {
            let (first_name, last_name, date_of_birth, team) = match (
                &validated.first_name,
                &validated.last_name,
                &validated.date_of_birth,
                &validated.team,
            ) {
                (Some(f), Some(l), Some(d), Some(t)) => (f, l, d, t),
                _ => {
                    return Err(Custom(
                        Status::UnprocessableEntity,
                        Json(ValidationResponse::with_error(
                            "role",
                            "Player registration requires first_name, last_name, date_of_birth and team",
                        )),
                    ));
                }
            };

            let date_of_birth = chrono::NaiveDate::parse_from_str(date_of_birth, "%Y-%m-%d")
                .map_err(|_| {
                    Custom(
                        Status::UnprocessableEntity,
                        Json(ValidationResponse::with_error(
                            "date_of_birth",
                            "Expected YYYY-MM-DD",
                        )),
                    )
                })?;

            create_player(
                db,
                &NewPlayer {
                    email: validated.email.clone(),
                    password: validated.password.clone(),
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    date_of_birth,
                    position: validated.position.clone(),
                    jersey_number: validated.jersey_number,
                    phone: validated.phone.clone(),
                    team: team.clone(),
                },
            )
            .await
            .validate_custom()?;
        }
        _ => {
            create_user(
                db,
                &validated.name,
                &validated.email,
                &validated.password,
                role,
                validated.team.as_deref(),
                validated.phone.as_deref(),
                validated.speciality.as_deref(),
            )
            .await
            .validate_custom()?;
        }
    }

    let created = find_user_by_email(db, &validated.email)
        .await
        .validate_custom()?
        .ok_or_else(|| {
            Custom(
                Status::InternalServerError,
                Json(ValidationResponse::with_error(
                    "server",
                    "Internal server error",
                )),
            )
        })?;

    Ok(Custom(
        Status::Created,
        Json(json!({ "message": "User registered", "user": UserData::from(created) })),
    ))
}
