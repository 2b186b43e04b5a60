//! Dynamic priority score.
//!
//! `score = base_priority × urgency_multiplier × deadline_factor × category_weight`
//!
//! `now` is always supplied by the caller so every score computed within one
//! run agrees, no matter how long the run takes.

use chrono::{DateTime, Utc};

use crate::task::Task;

/// Hours in one day / one week, the deadline-factor tier edges.
const DAY_HOURS: f64 = 24.0;
const WEEK_HOURS: f64 = 168.0;

/// Fractional hours from `now` until `deadline`. Negative once overdue.
pub fn hours_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (deadline - now).num_seconds() as f64 / 3600.0
}

/// Multiplier from deadline proximity. Tiers include their upper edge and are
/// checked overdue-first.
pub fn deadline_factor(task: &Task, now: DateTime<Utc>) -> f64 {
    let Some(deadline) = task.deadline else {
        return 1.0;
    };

    let hours_left = hours_until(deadline, now);
    if hours_left <= 0.0 {
        5.0
    } else if hours_left <= DAY_HOURS {
        3.0
    } else if hours_left <= WEEK_HOURS {
        2.0
    } else {
        1.0
    }
}

pub fn calculated_priority(task: &Task, now: DateTime<Utc>) -> f64 {
    f64::from(task.base_priority)
        * task.urgency_multiplier
        * deadline_factor(task, now)
        * task.category_weight()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskCategory;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_deadline_is_neutral() {
        let t = Task::new("t1", "read").with_priority(4).with_urgency(1.5);
        assert_eq!(deadline_factor(&t, now()), 1.0);
        assert_eq!(calculated_priority(&t, now()), 6.0);
    }

    #[test]
    fn overdue_task_scores_five_times() {
        let t = Task::new("t1", "late")
            .with_priority(3)
            .with_urgency(1.0)
            .with_deadline(now() - Duration::hours(2));
        assert_eq!(calculated_priority(&t, now()), 15.0);
    }

    #[test]
    fn tier_edges_are_inclusive() {
        let at = |d: Duration| Task::new("t", "x").with_deadline(now() + d);

        assert_eq!(deadline_factor(&at(Duration::zero()), now()), 5.0);
        assert_eq!(deadline_factor(&at(Duration::seconds(1)), now()), 3.0);
        assert_eq!(deadline_factor(&at(Duration::hours(24)), now()), 3.0);
        assert_eq!(deadline_factor(&at(Duration::hours(24) + Duration::minutes(1)), now()), 2.0);
        assert_eq!(deadline_factor(&at(Duration::hours(168)), now()), 2.0);
        assert_eq!(deadline_factor(&at(Duration::hours(169)), now()), 1.0);
    }

    #[test]
    fn category_weight_multiplies() {
        let t = Task::new("t1", "focus")
            .with_priority(2)
            .with_urgency(2.0)
            .with_category(TaskCategory::new("work").with_weight(1.25))
            .with_deadline(now() + Duration::hours(48));
        // 2 × 2.0 × 2.0 × 1.25
        assert_eq!(calculated_priority(&t, now()), 10.0);
    }

    #[test]
    fn same_now_gives_same_score() {
        let t = Task::new("t1", "x").with_deadline(now() + Duration::hours(30));
        assert_eq!(calculated_priority(&t, now()), calculated_priority(&t, now()));
    }
}
