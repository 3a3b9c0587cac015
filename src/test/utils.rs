#[cfg(test)]
pub mod test_utils {
    use crate::auth::Role;
    use crate::database::apply_schema;
    use crate::db::{
        AttendanceEntry, MatchChanges, NewMatch, NewPlayer, NewTraining, create_match,
        create_player, create_training, create_user, mark_attendance, update_match,
    };
    use crate::error::AppError;
    use crate::models::{AttendanceStatus, MatchType, SessionStatus};
    use chrono::NaiveDate;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};
    use std::collections::HashMap;

    pub static STANDARD_PASSWORD: &str = "password123";

    pub struct TestUser {
        pub name: String,
        pub email: String,
        pub role: Role,
        pub team: Option<String>,
    }

    pub struct TestPlayer {
        pub first_name: String,
        pub last_name: String,
        pub email: String,
        pub team: String,
        pub date_of_birth: NaiveDate,
        pub jersey_number: Option<i64>,
    }

    pub struct TestTraining {
        pub title: String,
        pub coach_email: Option<String>,
        pub date: NaiveDate,
    }

    pub struct TestAttendance {
        pub training_title: String,
        pub player_email: String,
        pub status: AttendanceStatus,
        pub performance_score: Option<i64>,
    }

    pub struct TestMatch {
        pub opponent: String,
        pub date: NaiveDate,
        pub scores: Option<(i64, i64)>,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<TestUser>,
        players: Vec<TestPlayer>,
        trainings: Vec<TestTraining>,
        attendances: Vec<TestAttendance>,
        matches: Vec<TestMatch>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn admin(mut self, name: &str, email: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Admin,
                team: None,
            });
            self
        }

        pub fn coach(mut self, name: &str, email: &str, team: &str) -> Self {
            self.users.push(TestUser {
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Coach,
                team: Some(team.to_string()),
            });
            self
        }

        pub fn player(mut self, first_name: &str, last_name: &str, email: &str, team: &str) -> Self {
            let jersey_number = Some(self.players.len() as i64 + 1);
            self.players.push(TestPlayer {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
                team: team.to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(2005, 6, 15).unwrap(),
                jersey_number,
            });
            self
        }

        /// Training sessions seed an absent attendance row per active player,
        /// exactly as the production path does.
        pub fn training(mut self, title: &str, coach_email: Option<&str>, date: &str) -> Self {
            self.trainings.push(TestTraining {
                title: title.to_string(),
                coach_email: coach_email.map(String::from),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            });
            self
        }

        pub fn attendance(
            mut self,
            training_title: &str,
            player_email: &str,
            status: AttendanceStatus,
            performance_score: Option<i64>,
        ) -> Self {
            self.attendances.push(TestAttendance {
                training_title: training_title.to_string(),
                player_email: player_email.to_string(),
                status,
                performance_score,
            });
            self
        }

        pub fn friendly_match(mut self, opponent: &str, date: &str, scores: Option<(i64, i64)>) -> Self {
            self.matches.push(TestMatch {
                opponent: opponent.to_string(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                scores,
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            // A single connection, or each statement may land on a fresh
            // in-memory database.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await?;

            apply_schema(&pool).await?;

            let mut user_id_map: HashMap<String, i64> = HashMap::new();
            let mut player_id_map: HashMap<String, i64> = HashMap::new();
            let mut training_id_map: HashMap<String, i64> = HashMap::new();
            let mut match_id_map: HashMap<String, i64> = HashMap::new();

            for user in &self.users {
                let user_id = create_user(
                    &pool,
                    &user.name,
                    &user.email,
                    STANDARD_PASSWORD,
                    user.role,
                    user.team.as_deref(),
                    None,
                    None,
                )
                .await?;
                user_id_map.insert(user.email.clone(), user_id);
            }

            for player in &self.players {
                let player_id = create_player(
                    &pool,
                    &NewPlayer {
                        email: player.email.clone(),
                        password: STANDARD_PASSWORD.to_string(),
                        first_name: player.first_name.clone(),
                        last_name: player.last_name.clone(),
                        date_of_birth: player.date_of_birth,
                        position: None,
                        jersey_number: player.jersey_number,
                        phone: None,
                        team: player.team.clone(),
                    },
                )
                .await?;
                player_id_map.insert(player.email.clone(), player_id);
            }

            for training in &self.trainings {
                let coach_id = match &training.coach_email {
                    Some(email) => user_id_map.get(email).copied(),
                    None => self
                        .users
                        .iter()
                        .find(|u| u.role == Role::Coach)
                        .map(|u| user_id_map[&u.email]),
                }
                .unwrap_or(1);

                let training_id = create_training(
                    &pool,
                    coach_id,
                    &NewTraining {
                        title: training.title.clone(),
                        description: None,
                        date: training.date,
                        start_time: "18:00".to_string(),
                        end_time: "20:00".to_string(),
                        location: None,
                    },
                )
                .await?;
                training_id_map.insert(training.title.clone(), training_id);
            }

            for attendance in &self.attendances {
                let training_id = training_id_map[&attendance.training_title];
                let player_id = player_id_map[&attendance.player_email];

                mark_attendance(
                    &pool,
                    training_id,
                    &[AttendanceEntry {
                        player_id,
                        status: attendance.status,
                        performance_score: attendance.performance_score,
                        remarks: None,
                    }],
                )
                .await?;
            }

            for m in &self.matches {
                let match_id = create_match(
                    &pool,
                    &NewMatch {
                        opponent_team: m.opponent.clone(),
                        match_date: m.date,
                        match_time: "15:00".to_string(),
                        location: "Stade Municipal".to_string(),
                        match_type: MatchType::Friendly,
                        notes: None,
                    },
                )
                .await?;

                if let Some((ours, theirs)) = m.scores {
                    update_match(
                        &pool,
                        match_id,
                        &MatchChanges {
                            our_score: Some(ours),
                            opponent_score: Some(theirs),
                            status: Some(SessionStatus::Completed),
                            ..Default::default()
                        },
                    )
                    .await?;
                }

                match_id_map.insert(m.opponent.clone(), match_id);
            }

            Ok(TestDb {
                pool,
                user_id_map,
                player_id_map,
                training_id_map,
                match_id_map,
            })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
        pub player_id_map: HashMap<String, i64>,
        pub training_id_map: HashMap<String, i64>,
        pub match_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, email: &str) -> Option<i64> {
            self.user_id_map.get(email).copied()
        }

        pub fn player_id(&self, email: &str) -> Option<i64> {
            self.player_id_map.get(email).copied()
        }

        pub fn training_id(&self, title: &str) -> Option<i64> {
            self.training_id_map.get(title).copied()
        }

        pub fn match_id(&self, opponent: &str) -> Option<i64> {
            self.match_id_map.get(opponent).copied()
        }
    }

    /// An admin, a coach per one of two teams, and four active players on the
    /// coached team.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .admin("Admin User", "admin@club.test")
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .coach("Coach Dubois", "coach2@club.test", "U18 Féminin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .player("Hugo", "Moreau", "hugo@club.test", "Seniors Masculin")
            .player("Nathan", "Petit", "nathan@club.test", "Seniors Masculin")
            .player("Louis", "Durand", "louis@club.test", "Seniors Masculin")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, Pool<Sqlite>) {
        let pool = test_db.pool.clone();
        let rocket = crate::init_rocket(test_db.pool).await;

        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build test client");

        (client, pool)
    }

    /// Logs in through the real endpoint; the tracked client keeps the
    /// session cookie for subsequent requests.
    pub async fn login_test_user(client: &Client, email: &str, password: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                serde_json::json!({
                    "email": email,
                    "password": password,
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), rocket::http::Status::Ok);
    }
}
