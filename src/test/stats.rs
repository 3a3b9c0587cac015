#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::{
        Attendance, AttendanceStatus, Match, MatchResult, MatchType, SessionStatus,
    };
    use crate::stats::{
        Trend, attendance_rate, average_performance, count_by, count_by_sorted_desc, trend,
        win_rate,
    };

    fn record(status: AttendanceStatus, performance_score: Option<i64>) -> Attendance {
        Attendance {
            id: 0,
            training_session_id: 0,
            player_id: 0,
            status,
            performance_score,
            remarks: None,
            created_at: Utc::now(),
        }
    }

    fn completed_match(result: MatchResult) -> Match {
        Match {
            id: 0,
            opponent_team: "FC Test".to_string(),
            match_date: Utc::now().date_naive(),
            match_time: "15:00".to_string(),
            location: "Stade".to_string(),
            match_type: MatchType::Friendly,
            our_score: None,
            opponent_score: None,
            result,
            status: SessionStatus::Completed,
            notes: None,
        }
    }

    #[test]
    fn attendance_rate_counts_present_and_late() {
        let records = vec![
            record(AttendanceStatus::Present, None),
            record(AttendanceStatus::Late, None),
            record(AttendanceStatus::Absent, None),
            record(AttendanceStatus::Excused, None),
        ];

        assert_eq!(attendance_rate(&records), 50.0);
    }

    #[test]
    fn attendance_rate_defaults_to_zero_on_empty() {
        assert_eq!(attendance_rate(&[]), 0.0);
    }

    #[test]
    fn attendance_rate_stays_within_bounds() {
        let all_present = vec![record(AttendanceStatus::Present, None); 7];
        assert_eq!(attendance_rate(&all_present), 100.0);

        let all_absent = vec![record(AttendanceStatus::Absent, None); 7];
        assert_eq!(attendance_rate(&all_absent), 0.0);
    }

    #[test]
    fn attendance_rate_rounds_to_two_decimals() {
        let records = vec![
            record(AttendanceStatus::Present, None),
            record(AttendanceStatus::Absent, None),
            record(AttendanceStatus::Absent, None),
        ];

        // 1/3 = 33.333...
        assert_eq!(attendance_rate(&records), 33.33);
    }

    #[test]
    fn average_performance_ignores_unscored_records() {
        let records = vec![
            record(AttendanceStatus::Present, Some(6)),
            record(AttendanceStatus::Present, None),
            record(AttendanceStatus::Late, Some(9)),
        ];

        assert_eq!(average_performance(&records), Some(7.5));
    }

    #[test]
    fn average_performance_is_none_without_scores() {
        assert_eq!(average_performance(&[]), None);

        let unscored = vec![record(AttendanceStatus::Present, None)];
        assert_eq!(average_performance(&unscored), None);
    }

    #[test]
    fn win_rate_over_completed_matches() {
        let matches = vec![
            completed_match(MatchResult::Win),
            completed_match(MatchResult::Loss),
            completed_match(MatchResult::Draw),
            completed_match(MatchResult::Win),
        ];

        assert_eq!(win_rate(&matches), 50.0);
    }

    #[test]
    fn win_rate_is_zero_without_completed_matches() {
        assert_eq!(win_rate(&[]), 0.0);

        let mut scheduled = completed_match(MatchResult::Pending);
        scheduled.status = SessionStatus::Scheduled;
        assert_eq!(win_rate(&[scheduled]), 0.0);
    }

    #[test]
    fn trend_detects_improvement() {
        assert_eq!(trend(&[5.0, 6.0, 7.0, 8.0, 9.0]), Trend::Improving);
    }

    #[test]
    fn trend_detects_decline() {
        assert_eq!(trend(&[9.0, 8.0, 7.0, 6.0, 5.0]), Trend::Declining);
    }

    #[test]
    fn trend_is_stable_for_flat_scores() {
        assert_eq!(trend(&[7.0, 7.0, 7.0, 7.0]), Trend::Stable);
    }

    #[test]
    fn trend_is_stable_for_short_input() {
        assert_eq!(trend(&[]), Trend::Stable);
        assert_eq!(trend(&[5.0]), Trend::Stable);
    }

    #[test]
    fn trend_requires_shift_above_one_point() {
        // Second half mean is exactly one point higher: not a trend.
        assert_eq!(trend(&[5.0, 5.0, 6.0, 6.0]), Trend::Stable);
        assert_eq!(trend(&[5.0, 5.0, 6.5, 6.5]), Trend::Improving);
    }

    #[test]
    fn count_by_preserves_first_occurrence_order() {
        let items = ["b", "a", "b", "c", "a", "b"];
        let groups = count_by(&items, |s| *s);

        assert_eq!(groups, vec![("b", 3), ("a", 2), ("c", 1)]);
    }

    #[test]
    fn count_by_sorted_desc_orders_by_count() {
        let items = ["a", "b", "b", "c", "b", "c"];
        let groups = count_by_sorted_desc(&items, |s| *s);

        assert_eq!(groups, vec![("b", 3), ("c", 2), ("a", 1)]);
    }
}
