#[cfg(test)]
mod tests {
    use crate::auth::Role;
    use crate::db::{
        AttendanceEntry, MatchChanges, NewNotification, TrainingChanges, create_notification,
        count_unread_notifications, delete_player, get_match, get_player,
        get_session_attendance, mark_all_notifications_read, mark_attendance, update_match,
        update_training,
    };
    use crate::error::AppError;
    use crate::models::{
        AttendanceStatus, MatchResult, NotificationType, SessionStatus, TargetRole,
    };
    use crate::test::test_utils::{TestDbBuilder, create_standard_test_db};

    #[rocket::async_test]
    async fn training_creation_seeds_absent_attendance_for_active_players() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .player("Hugo", "Moreau", "hugo@club.test", "Seniors Masculin")
            .player("Nathan", "Petit", "nathan@club.test", "Seniors Masculin")
            .player("Louis", "Durand", "louis@club.test", "Seniors Masculin")
            .training("Tactique", None, "2026-03-02")
            .build()
            .await
            .unwrap();

        let training_id = test_db.training_id("Tactique").unwrap();
        let attendance = get_session_attendance(&test_db.pool, training_id)
            .await
            .unwrap();

        assert_eq!(attendance.len(), 4);
        assert!(
            attendance
                .iter()
                .all(|a| a.status == AttendanceStatus::Absent)
        );
    }

    #[rocket::async_test]
    async fn marking_attendance_twice_updates_in_place() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .training("Physique", None, "2026-03-09")
            .build()
            .await
            .unwrap();

        let training_id = test_db.training_id("Physique").unwrap();
        let player_id = test_db.player_id("lucas@club.test").unwrap();

        mark_attendance(
            &test_db.pool,
            training_id,
            &[AttendanceEntry {
                player_id,
                status: AttendanceStatus::Late,
                performance_score: Some(5),
                remarks: None,
            }],
        )
        .await
        .unwrap();

        mark_attendance(
            &test_db.pool,
            training_id,
            &[AttendanceEntry {
                player_id,
                status: AttendanceStatus::Present,
                performance_score: Some(8),
                remarks: Some("Much better".to_string()),
            }],
        )
        .await
        .unwrap();

        let attendance = get_session_attendance(&test_db.pool, training_id)
            .await
            .unwrap();

        // Still the single seeded row, updated in place.
        assert_eq!(attendance.len(), 1);
        assert_eq!(attendance[0].status, AttendanceStatus::Present);
        assert_eq!(attendance[0].performance_score, Some(8));
    }

    #[rocket::async_test]
    async fn match_result_follows_persisted_scores() {
        let test_db = TestDbBuilder::new()
            .friendly_match("FC Rival", "2026-02-14", Some((2, 1)))
            .build()
            .await
            .unwrap();

        let match_id = test_db.match_id("FC Rival").unwrap();

        let m = get_match(&test_db.pool, match_id).await.unwrap();
        assert_eq!(m.result, MatchResult::Win);

        // Correcting the score sheet flips the derived result.
        let m = update_match(
            &test_db.pool,
            match_id,
            &MatchChanges {
                our_score: Some(1),
                opponent_score: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(m.result, MatchResult::Loss);
    }

    #[rocket::async_test]
    async fn completed_training_rejects_status_changes() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .training("Finitions", None, "2026-01-12")
            .build()
            .await
            .unwrap();

        let training_id = test_db.training_id("Finitions").unwrap();

        update_training(
            &test_db.pool,
            training_id,
            &TrainingChanges {
                status: Some(SessionStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let result = update_training(
            &test_db.pool,
            training_id,
            &TrainingChanges {
                status: Some(SessionStatus::Scheduled),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[rocket::async_test]
    async fn mark_all_read_is_idempotent() {
        let test_db = create_standard_test_db().await;
        let admin_id = test_db.user_id("admin@club.test").unwrap();
        let player_user_id = {
            let player_id = test_db.player_id("lucas@club.test").unwrap();
            get_player(&test_db.pool, player_id).await.unwrap().user_id
        };

        create_notification(
            &test_db.pool,
            admin_id,
            &NewNotification {
                title: "Entraînement annulé".to_string(),
                message: "Pas de séance jeudi".to_string(),
                kind: NotificationType::Warning,
                target_role: TargetRole::All,
            },
        )
        .await
        .unwrap();

        mark_all_notifications_read(&test_db.pool, player_user_id, Role::Player)
            .await
            .unwrap();
        mark_all_notifications_read(&test_db.pool, player_user_id, Role::Player)
            .await
            .unwrap();

        let unread = count_unread_notifications(&test_db.pool, player_user_id, Role::Player)
            .await
            .unwrap();
        assert_eq!(unread, 0);

        let (read_rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notification_reads WHERE user_id = ?")
                .bind(player_user_id)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();
        assert_eq!(read_rows, 1);
    }

    #[rocket::async_test]
    async fn deleting_a_player_removes_all_dependents() {
        let test_db = TestDbBuilder::new()
            .coach("Coach Martin", "coach@club.test", "Seniors Masculin")
            .player("Lucas", "Bernard", "lucas@club.test", "Seniors Masculin")
            .training("Pressing", None, "2026-04-06")
            .build()
            .await
            .unwrap();

        let player_id = test_db.player_id("lucas@club.test").unwrap();
        let user_id = get_player(&test_db.pool, player_id).await.unwrap().user_id;

        delete_player(&test_db.pool, player_id).await.unwrap();

        assert!(matches!(
            get_player(&test_db.pool, player_id).await,
            Err(AppError::NotFound(_))
        ));

        let (attendance_rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM attendances WHERE player_id = ?")
                .bind(player_id)
                .fetch_one(&test_db.pool)
                .await
                .unwrap();
        assert_eq!(attendance_rows, 0);

        let (user_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&test_db.pool)
            .await
            .unwrap();
        assert_eq!(user_rows, 0);
    }
}
