//! Savings goal progress
//!
//! Progress is measured against the target; the pace check expects roughly
//! 10% of the target per remaining month, so a goal with three months left
//! should already be 70% funded.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Goal;

use super::stats::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: Goal,
    /// Percent of target reached, capped at 100
    pub progress: f64,
    /// Days until the deadline; negative once it has passed
    pub days_remaining: Option<i64>,
    /// Contribution per 30 days needed to reach the target in time
    pub monthly_needed: f64,
    pub is_on_track: bool,
}

/// Percent of target required per remaining month
const REQUIRED_PACE_PER_MONTH: f64 = 10.0;

/// Progress of one goal as of `today`
pub fn goal_progress(goal: &Goal, today: NaiveDate) -> GoalProgress {
    let progress = if goal.target_amount > 0.0 {
        (goal.current_amount / goal.target_amount * 100.0).min(100.0)
    } else {
        0.0
    };
    let remaining = (goal.target_amount - goal.current_amount).max(0.0);
    let days_remaining = goal.deadline.map(|d| (d - today).num_days());

    let monthly_needed = match days_remaining {
        Some(days) if days > 0 => (remaining / (days as f64 / 30.0)).round(),
        _ => 0.0,
    };

    let is_on_track = match days_remaining {
        None => true,
        _ if progress >= 100.0 => true,
        // Past the deadline and still short
        Some(days) if days <= 0 => false,
        Some(days) => {
            let months_left = days as f64 / 30.0;
            progress >= 100.0 - months_left * REQUIRED_PACE_PER_MONTH
        }
    };

    GoalProgress {
        goal: goal.clone(),
        progress: round_to(progress, 1),
        days_remaining,
        monthly_needed,
        is_on_track,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target: f64, current: f64, deadline: Option<NaiveDate>) -> Goal {
        Goal {
            id: 1,
            user_id: "u".into(),
            name: "Trip".into(),
            target_amount: target,
            current_amount: current,
            deadline,
            category: None,
            priority: 1,
            icon: "🎯".into(),
            color: "#3498DB".into(),
            created_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        date(2024, 1, 1)
    }

    #[test]
    fn test_behind_pace_close_to_deadline() {
        // 90 days left, 25% funded, 70% expected by now
        let p = goal_progress(&goal(1200.0, 300.0, Some(date(2024, 3, 31))), today());
        assert_eq!(p.days_remaining, Some(90));
        assert_eq!(p.progress, 25.0);
        assert_eq!(p.monthly_needed, 300.0);
        assert!(!p.is_on_track);
    }

    #[test]
    fn test_far_deadline_is_on_track() {
        let p = goal_progress(&goal(1200.0, 300.0, Some(date(2024, 10, 27))), today());
        assert_eq!(p.days_remaining, Some(300));
        assert_eq!(p.monthly_needed, 90.0);
        assert!(p.is_on_track);
    }

    #[test]
    fn test_no_deadline() {
        let p = goal_progress(&goal(500.0, 0.0, None), today());
        assert_eq!(p.days_remaining, None);
        assert_eq!(p.monthly_needed, 0.0);
        assert!(p.is_on_track);
    }

    #[test]
    fn test_progress_is_capped_and_nothing_more_is_needed() {
        let p = goal_progress(&goal(500.0, 650.0, Some(date(2024, 2, 1))), today());
        assert_eq!(p.progress, 100.0);
        assert_eq!(p.monthly_needed, 0.0);
        assert!(p.is_on_track);
    }

    #[test]
    fn test_missed_deadline_is_off_track() {
        let p = goal_progress(&goal(500.0, 100.0, Some(date(2023, 12, 1))), today());
        assert_eq!(p.days_remaining, Some(-31));
        assert_eq!(p.monthly_needed, 0.0);
        assert!(!p.is_on_track);

        let due_today = goal_progress(&goal(500.0, 100.0, Some(today())), today());
        assert_eq!(due_today.days_remaining, Some(0));
        assert!(!due_today.is_on_track);
    }

    #[test]
    fn test_progress_rounds_to_one_decimal() {
        let p = goal_progress(&goal(3.0, 1.0, None), today());
        assert_eq!(p.progress, 33.3);
    }

    #[test]
    fn test_serializes_goal_fields_inline() {
        let p = goal_progress(&goal(100.0, 50.0, None), today());
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["name"], "Trip");
        assert_eq!(json["targetAmount"], 100.0);
        assert_eq!(json["isOnTrack"], true);
        assert!(json["daysRemaining"].is_null());
    }
}
