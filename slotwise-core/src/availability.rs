//! Generate a week of placement capacity from working-hour preferences.
//!
//! Each work day yields a morning block, a lunch break, and an afternoon block.
//! The lunch break is emitted as an occupied, unsplittable `break` block so it
//! shows up in run windows without ever receiving a task.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::local_to_utc;
use crate::time_block::{BlockStatus, BlockType, TimeBlock};

/// Morning block length before lunch.
const MORNING_HOURS: i64 = 4;
const LUNCH_FLEXIBILITY: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub lunch_break_minutes: i64,
    /// Weekday numbers, 0 = Monday .. 6 = Sunday. Empty means every day.
    pub work_days: Vec<u32>,
    pub min_task_minutes: Option<i64>,
    pub max_task_minutes: Option<i64>,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            lunch_break_minutes: 60,
            work_days: Vec::new(),
            min_task_minutes: Some(15),
            max_task_minutes: Some(240),
        }
    }
}

impl WorkingHours {
    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.work_days.is_empty()
            || self
                .work_days
                .contains(&date.weekday().num_days_from_monday())
    }
}

/// Blocks for `horizon_days` days starting at `from` (local dates in `tz`).
///
/// Ids follow `{date}-morning`, `{date}-lunch`, `{date}-afternoon`.
pub fn generate_time_blocks(
    prefs: &WorkingHours,
    tz: Tz,
    from: NaiveDate,
    horizon_days: u32,
) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    if prefs.end <= prefs.start {
        return blocks;
    }

    for offset in 0..horizon_days {
        let Some(date) = from.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        if !prefs.is_work_day(date) {
            continue;
        }

        let work_start = date.and_time(prefs.start);
        let work_end = date.and_time(prefs.end);
        let lunch_start = (work_start + Duration::hours(MORNING_HOURS)).min(work_end);
        let Some(lunch_end) = Duration::try_minutes(prefs.lunch_break_minutes.max(0))
            .and_then(|lunch| lunch_start.checked_add_signed(lunch))
            .map(|end| end.min(work_end))
        else {
            debug!(%date, minutes = prefs.lunch_break_minutes, "lunch break out of range");
            continue;
        };

        let (Some(ws), Some(ls), Some(le), Some(we)) = (
            local_to_utc(work_start, tz),
            local_to_utc(lunch_start, tz),
            local_to_utc(lunch_end, tz),
            local_to_utc(work_end, tz),
        ) else {
            debug!(%date, %tz, "skipping day with unresolvable local times");
            continue;
        };

        if ls > ws {
            blocks.push(
                TimeBlock::new(format!("{date}-morning"), ws, ls)
                    .with_task_bounds(prefs.min_task_minutes, prefs.max_task_minutes),
            );
        }
        if le > ls {
            blocks.push(
                TimeBlock::new(format!("{date}-lunch"), ls, le)
                    .with_type(BlockType::Break)
                    .with_status(BlockStatus::Occupied)
                    .with_split(false)
                    .with_flexibility(LUNCH_FLEXIBILITY),
            );
        }
        if we > le {
            blocks.push(
                TimeBlock::new(format!("{date}-afternoon"), le, we)
                    .with_task_bounds(prefs.min_task_minutes, prefs.max_task_minutes),
            );
        }
    }

    blocks
}
