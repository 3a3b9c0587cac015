use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,
    ViewOwnAttendance,
    ViewNotifications,

    ViewPlayers,
    CreatePlayers,
    ManageTrainings,
    MarkAttendance,
    ManageMatches,
    PublishNotifications,

    EditPlayers,
    DeletePlayers,
    ManageCoaches,
    RegisterUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Coach,
    Player,
}

static PLAYER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);
    permissions.insert(Permission::ViewOwnAttendance);
    permissions.insert(Permission::ViewNotifications);

    permissions
});

static COACH_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(PLAYER_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewPlayers);
    permissions.insert(Permission::CreatePlayers);
    permissions.insert(Permission::ManageTrainings);
    permissions.insert(Permission::MarkAttendance);
    permissions.insert(Permission::ManageMatches);
    permissions.insert(Permission::PublishNotifications);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(COACH_PERMISSIONS.iter().copied());

    permissions.insert(Permission::EditPlayers);
    permissions.insert(Permission::DeletePlayers);
    permissions.insert(Permission::ManageCoaches);
    permissions.insert(Permission::RegisterUsers);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Player => &PLAYER_PERMISSIONS,
            Role::Coach => &COACH_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coach => "coach",
            Role::Player => "player",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, anyhow::Error> {
        match s {
            "admin" => Ok(Role::Admin),
            "coach" => Ok(Role::Coach),
            "player" => Ok(Role::Player),
            _ => Err(anyhow::Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
