use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The club's fixed team roster. Coach assignment and player scoping both
/// validate against this list.
pub const TEAMS: [&str; 6] = [
    "U18 Masculin",
    "Seniors Féminin",
    "Seniors Masculin",
    "U18 Féminin",
    "U15 Masculin",
    "U15 Féminin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Active,
    Injured,
    Suspended,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::Injured => "injured",
            PlayerStatus::Suspended => "suspended",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PlayerStatus::Active),
            "injured" => Some(PlayerStatus::Injured),
            "suspended" => Some(PlayerStatus::Suspended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(SessionStatus::Scheduled),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// Scheduled sessions may complete or cancel; both outcomes are terminal.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        match self {
            SessionStatus::Scheduled => true,
            SessionStatus::Completed | SessionStatus::Cancelled => *self == next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            "excused" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }

    /// Late arrivals still count toward the attendance rate.
    pub fn counts_as_attended(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Friendly,
    League,
    Cup,
    Tournament,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Friendly => "friendly",
            MatchType::League => "league",
            MatchType::Cup => "cup",
            MatchType::Tournament => "tournament",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "friendly" => Some(MatchType::Friendly),
            "league" => Some(MatchType::League),
            "cup" => Some(MatchType::Cup),
            "tournament" => Some(MatchType::Tournament),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
    Pending,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Win => "win",
            MatchResult::Loss => "loss",
            MatchResult::Draw => "draw",
            MatchResult::Pending => "pending",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "win" => Some(MatchResult::Win),
            "loss" => Some(MatchResult::Loss),
            "draw" => Some(MatchResult::Draw),
            "pending" => Some(MatchResult::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Success,
    Urgent,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Info => "info",
            NotificationType::Warning => "warning",
            NotificationType::Success => "success",
            NotificationType::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "info" => Some(NotificationType::Info),
            "warning" => Some(NotificationType::Warning),
            "success" => Some(NotificationType::Success),
            "urgent" => Some(NotificationType::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetRole {
    All,
    Admin,
    Coach,
    Player,
}

impl TargetRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetRole::All => "all",
            TargetRole::Admin => "admin",
            TargetRole::Coach => "coach",
            TargetRole::Player => "player",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(TargetRole::All),
            "admin" => Some(TargetRole::Admin),
            "coach" => Some(TargetRole::Coach),
            "player" => Some(TargetRole::Player),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub position: Option<String>,
    pub jersey_number: Option<i64>,
    pub team: String,
    pub status: PlayerStatus,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age(&self) -> u32 {
        Utc::now()
            .date_naive()
            .years_since(self.date_of_birth)
            .unwrap_or(0)
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbPlayer {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<String>,
    pub jersey_number: Option<i64>,
    pub team: Option<String>,
    pub status: Option<String>,
}

impl From<DbPlayer> for Player {
    fn from(row: DbPlayer) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            first_name: row.first_name.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            date_of_birth: row.date_of_birth.unwrap_or_default(),
            position: row.position,
            jersey_number: row.jersey_number,
            team: row.team.unwrap_or_default(),
            status: row
                .status
                .as_deref()
                .and_then(PlayerStatus::from_str)
                .unwrap_or(PlayerStatus::Active),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSession {
    pub id: i64,
    pub coach_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub status: SessionStatus,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTrainingSession {
    pub id: Option<i64>,
    pub coach_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

impl From<DbTrainingSession> for TrainingSession {
    fn from(row: DbTrainingSession) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            coach_id: row.coach_id.unwrap_or_default(),
            title: row.title.unwrap_or_default(),
            description: row.description,
            date: row.date.unwrap_or_default(),
            start_time: row.start_time.unwrap_or_default(),
            end_time: row.end_time.unwrap_or_default(),
            location: row.location,
            status: row
                .status
                .as_deref()
                .and_then(SessionStatus::from_str)
                .unwrap_or(SessionStatus::Scheduled),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attendance {
    pub id: i64,
    pub training_session_id: i64,
    pub player_id: i64,
    pub status: AttendanceStatus,
    pub performance_score: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAttendance {
    pub id: Option<i64>,
    pub training_session_id: Option<i64>,
    pub player_id: Option<i64>,
    pub status: Option<String>,
    pub performance_score: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbAttendance> for Attendance {
    fn from(row: DbAttendance) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            training_session_id: row.training_session_id.unwrap_or_default(),
            player_id: row.player_id.unwrap_or_default(),
            status: row
                .status
                .as_deref()
                .and_then(AttendanceStatus::from_str)
                .unwrap_or(AttendanceStatus::Absent),
            performance_score: row.performance_score,
            remarks: row.remarks,
            created_at: row
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub id: i64,
    pub opponent_team: String,
    pub match_date: NaiveDate,
    pub match_time: String,
    pub location: String,
    pub match_type: MatchType,
    pub our_score: Option<i64>,
    pub opponent_score: Option<i64>,
    pub result: MatchResult,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

impl Match {
    /// Result derivation rule: pending until both scores are known.
    pub fn compute_result(&self) -> MatchResult {
        match (self.our_score, self.opponent_score) {
            (Some(ours), Some(theirs)) if ours > theirs => MatchResult::Win,
            (Some(ours), Some(theirs)) if ours < theirs => MatchResult::Loss,
            (Some(_), Some(_)) => MatchResult::Draw,
            _ => MatchResult::Pending,
        }
    }
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbMatch {
    pub id: Option<i64>,
    pub opponent_team: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub match_time: Option<String>,
    pub location: Option<String>,
    pub match_type: Option<String>,
    pub our_score: Option<i64>,
    pub opponent_score: Option<i64>,
    pub result: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl From<DbMatch> for Match {
    fn from(row: DbMatch) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            opponent_team: row.opponent_team.unwrap_or_default(),
            match_date: row.match_date.unwrap_or_default(),
            match_time: row.match_time.unwrap_or_default(),
            location: row.location.unwrap_or_default(),
            match_type: row
                .match_type
                .as_deref()
                .and_then(MatchType::from_str)
                .unwrap_or(MatchType::Friendly),
            our_score: row.our_score,
            opponent_score: row.opponent_score,
            result: row
                .result
                .as_deref()
                .and_then(MatchResult::from_str)
                .unwrap_or(MatchResult::Pending),
            status: row
                .status
                .as_deref()
                .and_then(SessionStatus::from_str)
                .unwrap_or(SessionStatus::Scheduled),
            notes: row.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchAppearance {
    pub match_id: i64,
    pub player_id: i64,
    pub player_name: String, // Denormalized for convenience
    pub is_starter: bool,
    pub minutes_played: Option<i64>,
    pub goals: i64,
    pub assists: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub rating: Option<f64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbMatchAppearance {
    pub match_id: Option<i64>,
    pub player_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_starter: Option<bool>,
    pub minutes_played: Option<i64>,
    pub goals: Option<i64>,
    pub assists: Option<i64>,
    pub yellow_cards: Option<i64>,
    pub red_cards: Option<i64>,
    pub rating: Option<f64>,
}

impl From<DbMatchAppearance> for MatchAppearance {
    fn from(row: DbMatchAppearance) -> Self {
        Self {
            match_id: row.match_id.unwrap_or_default(),
            player_id: row.player_id.unwrap_or_default(),
            player_name: format!(
                "{} {}",
                row.first_name.unwrap_or_default(),
                row.last_name.unwrap_or_default()
            ),
            is_starter: row.is_starter.unwrap_or_default(),
            minutes_played: row.minutes_played,
            goals: row.goals.unwrap_or_default(),
            assists: row.assists.unwrap_or_default(),
            yellow_cards: row.yellow_cards.unwrap_or_default(),
            red_cards: row.red_cards.unwrap_or_default(),
            rating: row.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub created_by: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub target_role: TargetRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Derived per caller from the read-join; never stored on the row.
    pub is_read: Option<bool>,
    pub read_at: Option<NaiveDateTime>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbNotification {
    pub id: Option<i64>,
    pub created_by: Option<i64>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: Option<String>,
    pub target_role: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub read_at: Option<NaiveDateTime>,
}

impl From<DbNotification> for Notification {
    fn from(row: DbNotification) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            created_by: row.created_by.unwrap_or_default(),
            title: row.title.unwrap_or_default(),
            message: row.message.unwrap_or_default(),
            kind: row
                .kind
                .as_deref()
                .and_then(NotificationType::from_str)
                .unwrap_or(NotificationType::Info),
            target_role: row
                .target_role
                .as_deref()
                .and_then(TargetRole::from_str)
                .unwrap_or(TargetRole::All),
            is_active: row.is_active.unwrap_or_default(),
            created_at: row
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            is_read: None,
            read_at: row.read_at,
        }
    }
}
