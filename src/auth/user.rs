use rocket::http::Status;
use serde::Serialize;

use super::{Permission, Role};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub team: Option<String>,
    pub phone: Option<String>,
    pub speciality: Option<String>,
    pub avatar: Option<String>,
    pub is_active: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub team: Option<String>,
    pub phone: Option<String>,
    pub speciality: Option<String>,
    pub avatar: Option<String>,
    pub is_active: Option<bool>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            role: Role::from_str(&user.role.unwrap_or_default()).unwrap_or(Role::Player),
            team: user.team,
            phone: user.phone,
            speciality: user.speciality,
            avatar: user.avatar,
            is_active: user.is_active.unwrap_or_default(),
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }

    pub fn require_all_permissions(&self, permissions: &[Permission]) -> Result<(), Status> {
        if permissions.iter().all(|p| self.role.has_permission(*p)) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                permissions = ?permissions,
                "Permission denied (require all)"
            );
            Err(Status::Forbidden)
        }
    }

    /// Whether rows belonging to `team` are visible to this caller.
    /// Admins see every team; a coach only their own.
    pub fn can_access_team(&self, team: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Coach => self.team.as_deref() == Some(team),
            Role::Player => false,
        }
    }

    pub fn require_team_access(&self, team: &str) -> Result<(), Status> {
        if self.can_access_team(team) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = %self.role.as_str(),
                team = %team,
                "Team access denied"
            );
            Err(Status::Forbidden)
        }
    }

    /// The team filter a list query must apply for this caller, if any.
    pub fn team_scope(&self) -> Option<&str> {
        match self.role {
            Role::Coach => self.team.as_deref(),
            _ => None,
        }
    }
}
