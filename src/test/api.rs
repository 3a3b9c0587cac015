#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Cookie, Status};
    use serde_json::json;

    use crate::api::{LoginResponse, PlayerResponse};
    use crate::test::test_utils::{
        STANDARD_PASSWORD, TestDbBuilder, create_standard_test_db, login_test_user,
        setup_test_client,
    };

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": "coach@club.test",
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(login_response.success);
        assert_eq!(login_response.user.unwrap().email, "coach@club.test");

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": "coach@club.test",
                    "password": "wrong_password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(!login_response.success);
        assert!(login_response.error.is_some());
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let endpoints = vec![
            "/api/me",
            "/api/players",
            "/api/trainings",
            "/api/matches",
            "/api/notifications",
            "/api/dashboard/admin/stats",
        ];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );
        }
    }

    #[rocket::async_test]
    async fn test_forged_session_token_is_rejected() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();

        let response = client
            .get("/api/me")
            .private_cookie(forged_cookie)
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_coach_player_list_is_team_scoped() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .coach("Coach Dubois", "coach2@club.test", "U18 Féminin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .player("Emma", "Roux", "emma@club.test", "U18 Féminin")
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/players").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let players: Vec<PlayerResponse> = serde_json::from_str(&body).unwrap();

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].team, "Seniors Masculin");
    }

    #[rocket::async_test]
    async fn test_coach_cannot_fetch_other_teams_player_by_id() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Emma", "Roux", "emma@club.test", "U18 Féminin")
            .build()
            .await
            .unwrap();
        let other_team_player = test_db.player_id("emma@club.test").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client
            .get(format!("/api/players/{}", other_team_player))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_coach_cannot_create_player_for_other_team() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/players")
            .header(ContentType::JSON)
            .body(
                json!({
                    "email": "new@club.test",
                    "password": "password123",
                    "first_name": "Léa",
                    "last_name": "Girard",
                    "date_of_birth": "2008-02-20",
                    "team": "U18 Féminin"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_coach_cannot_mutate_other_coaches_training() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .coach("Coach Dubois", "coach2@club.test", "U18 Féminin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .training("Mise en place", Some("coach@club.test"), "2026-05-04")
            .build()
            .await
            .unwrap();
        let training_id = test_db.training_id("Mise en place").unwrap();
        let player_id = test_db.player_id("lucas@club.test").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach2@club.test", STANDARD_PASSWORD).await;

        let response = client
            .put(format!("/api/trainings/{}", training_id))
            .header(ContentType::JSON)
            .body(json!({ "title": "Hijacked" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body["status"], json!("error"));
        assert!(body["errors"]["permission"].is_array());

        let response = client
            .post(format!("/api/trainings/{}/attendance", training_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "attendances": [
                        { "player_id": player_id, "status": "present" }
                    ]
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client
            .delete(format!("/api/trainings/{}", training_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        // The owning coach is unaffected.
        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client
            .put(format!("/api/trainings/{}", training_id))
            .header(ContentType::JSON)
            .body(json!({ "title": "Mise en place révisée" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_player_update_requires_admin() {
        let test_db = create_standard_test_db().await;
        let player_id = test_db.player_id("lucas@club.test").unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client
            .put(format!("/api/players/{}", player_id))
            .header(ContentType::JSON)
            .body(json!({ "position": "Gardien" }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn test_admin_sees_every_player() {
        let test_db = TestDbBuilder::new()
            .admin("Admin User", "admin@club.test")
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .player("Emma", "Roux", "emma@club.test", "U18 Féminin")
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/players").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let players: Vec<PlayerResponse> = serde_json::from_str(&body).unwrap();

        assert_eq!(players.len(), 2);
    }

    #[rocket::async_test]
    async fn test_player_dashboard_reports_stats() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .training("Séance 1", None, "2026-01-05")
            .training("Séance 2", None, "2026-01-12")
            .attendance(
                "Séance 1",
                "lucas@club.test",
                crate::models::AttendanceStatus::Present,
                Some(6),
            )
            .attendance(
                "Séance 2",
                "lucas@club.test",
                crate::models::AttendanceStatus::Present,
                Some(8),
            )
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "lucas@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/dashboard/player/stats").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        assert_eq!(body["attendance_rate"], json!(100.0));
        assert_eq!(body["average_performance"], json!(7.0));
        assert_eq!(body["trainings_attended"], json!(2));
    }

    #[rocket::async_test]
    async fn test_match_summary_endpoint() {
        let test_db = TestDbBuilder::new()
            .admin("Admin User", "admin@club.test")
            .friendly_match("FC Nord", "2026-01-10", Some((3, 0)))
            .friendly_match("FC Sud", "2026-01-17", Some((1, 1)))
            .friendly_match("FC Est", "2026-01-24", None)
            .build()
            .await
            .unwrap();
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/matches/stats/summary").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();

        assert_eq!(body["total_matches"], json!(3));
        assert_eq!(body["wins"], json!(1));
        assert_eq!(body["draws"], json!(1));
        assert_eq!(body["pending"], json!(1));
        assert_eq!(body["win_rate"], json!(50.0));
        assert_eq!(body["goals_for"], json!(4));
        assert_eq!(body["goals_against"], json!(1));
    }

    #[rocket::async_test]
    async fn test_profile_and_registration_return_updated_entity() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "coach@club.test", STANDARD_PASSWORD).await;

        let response = client
            .put("/api/profile")
            .header(ContentType::JSON)
            .body(json!({ "name": "Coach Martin Jr" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body["message"].is_string());
        assert_eq!(body["user"]["name"], json!("Coach Martin Jr"));

        login_test_user(&client, "admin@club.test", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/register")
            .header(ContentType::JSON)
            .body(
                json!({
                    "name": "Coach Lefèvre",
                    "email": "lefevre@club.test",
                    "password": "password123",
                    "role": "coach",
                    "team": "U15 Masculin"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(body["message"].is_string());
        assert_eq!(body["user"]["email"], json!("lefevre@club.test"));
        assert_eq!(body["user"]["role"], json!("coach"));
    }

    #[rocket::async_test]
    async fn test_notification_read_flow() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_user(&client, "admin@club.test", STANDARD_PASSWORD).await;

        let response = client
            .post("/api/notifications")
            .header(ContentType::JSON)
            .body(
                json!({
                    "title": "Réunion",
                    "message": "Réunion du club vendredi",
                    "type": "info",
                    "target_role": "all"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        login_test_user(&client, "lucas@club.test", STANDARD_PASSWORD).await;

        let response = client.get("/api/notifications/unread/count").dispatch().await;
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body["unread"], json!(1));

        let response = client.post("/api/notifications/read-all").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/notifications/unread/count").dispatch().await;
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(body["unread"], json!(0));
    }

    #[rocket::async_test]
    async fn test_health_endpoint_is_public() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }
}
