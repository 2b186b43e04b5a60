//! Advisory notes derived from a finished run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::run::RunReport;
use crate::task::Task;

/// More scheduled work than this on one local day is flagged.
pub const MAX_DAILY_MINUTES: i64 = 8 * 60;
/// Tasks with `base_priority` at or below this count as high priority.
pub const HIGH_PRIORITY_MAX: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    Overloaded {
        date: NaiveDate,
        scheduled_minutes: i64,
    },
    AddBreaks {
        first_task: String,
        second_task: String,
    },
    DeadlineAtRisk {
        task_id: String,
        task_name: String,
        scheduled_end: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },
    Unplaced {
        task_id: String,
        task_name: String,
        deadline: DateTime<Utc>,
    },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Overloaded {
                date,
                scheduled_minutes,
            } => write!(
                f,
                "{date}: {:.1}h scheduled; consider spreading tasks across more days",
                *scheduled_minutes as f64 / 60.0
            ),
            Recommendation::AddBreaks {
                first_task,
                second_task,
            } => write!(
                f,
                "add a break between high-priority tasks '{first_task}' and '{second_task}'"
            ),
            Recommendation::DeadlineAtRisk {
                task_name,
                scheduled_end,
                deadline,
                ..
            } => write!(
                f,
                "'{task_name}' ends {} but is due {}",
                scheduled_end.to_rfc3339(),
                deadline.to_rfc3339()
            ),
            Recommendation::Unplaced {
                task_name,
                deadline,
                ..
            } => write!(
                f,
                "'{task_name}' (due {}) could not be placed; free up time before the deadline",
                deadline.to_rfc3339()
            ),
        }
    }
}

/// Inspect a completed run. Failed runs carry no decisions and yield nothing
/// beyond unplaced-deadline warnings.
pub fn recommend(report: &RunReport, tasks: &[Task], tz: Tz) -> Vec<Recommendation> {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut out = Vec::new();

    let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for d in &report.decisions {
        let date = d.scheduled_start.with_timezone(&tz).date_naive();
        *daily.entry(date).or_default() += (d.scheduled_end - d.scheduled_start).num_minutes();
    }
    out.extend(
        daily
            .into_iter()
            .filter(|(_, minutes)| *minutes > MAX_DAILY_MINUTES)
            .map(|(date, scheduled_minutes)| Recommendation::Overloaded {
                date,
                scheduled_minutes,
            }),
    );

    let is_high = |id: &str| {
        by_id
            .get(id)
            .is_some_and(|t| t.base_priority <= HIGH_PRIORITY_MAX)
    };
    let mut timeline: Vec<_> = report.decisions.iter().collect();
    timeline.sort_by_key(|d| d.scheduled_start);
    for pair in timeline.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.scheduled_end == b.scheduled_start && is_high(&a.task_id) && is_high(&b.task_id) {
            out.push(Recommendation::AddBreaks {
                first_task: a.task_name.clone(),
                second_task: b.task_name.clone(),
            });
        }
    }

    for d in &report.decisions {
        let Some(task) = by_id.get(d.task_id.as_str()) else {
            continue;
        };
        if let Some(deadline) = task.deadline {
            // A grace window past the representable range never expires.
            let Some(grace) = Duration::try_minutes(task.deadline_flexibility_minutes)
                .and_then(|slack| deadline.checked_add_signed(slack))
            else {
                continue;
            };
            if d.scheduled_end > grace {
                out.push(Recommendation::DeadlineAtRisk {
                    task_id: task.id.clone(),
                    task_name: task.name.clone(),
                    scheduled_end: d.scheduled_end,
                    deadline,
                });
            }
        }
    }

    for id in &report.unscheduled {
        if let Some(task) = by_id.get(id.as_str()) {
            if let Some(deadline) = task.deadline {
                out.push(Recommendation::Unplaced {
                    task_id: task.id.clone(),
                    task_name: task.name.clone(),
                    deadline,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SchedulingEngine;
    use crate::time::FixedClock;
    use crate::time_block::TimeBlock;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, 0, 0).unwrap()
    }

    fn engine() -> SchedulingEngine<FixedClock> {
        SchedulingEngine::new(FixedClock(at(6)))
    }

    #[test]
    fn flags_overloaded_day() {
        let blocks = vec![TimeBlock::new("b1", at(8), at(18)), TimeBlock::new("b2", at(18), at(22))];
        let tasks = vec![
            Task::new("t1", "a").with_duration(300),
            Task::new("t2", "b").with_duration(240),
        ];
        let report = engine().run_edf(&tasks, &blocks).unwrap();
        let recs = recommend(&report, &tasks, chrono_tz::UTC);
        assert!(recs.contains(&Recommendation::Overloaded {
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            scheduled_minutes: 540,
        }));
    }

    #[test]
    fn flags_back_to_back_high_priority() {
        let blocks = vec![TimeBlock::new("b1", at(9), at(12))];
        let tasks = vec![
            Task::new("t1", "design review").with_priority(1).with_duration(60),
            Task::new("t2", "incident writeup").with_priority(2).with_duration(60),
        ];
        let report = engine().run_edf(&tasks, &blocks).unwrap();
        let recs = recommend(&report, &tasks, chrono_tz::UTC);
        assert_eq!(recs.len(), 1);
        assert!(matches!(recs[0], Recommendation::AddBreaks { .. }));
        assert!(recs[0].to_string().contains("add a break"));
    }

    #[test]
    fn flexibility_widens_deadline() {
        let blocks = vec![TimeBlock::new("b1", at(9), at(12))];
        let strict = Task::new("t1", "invoice").with_duration(90).with_deadline(at(10));
        let lenient = strict.clone().with_deadline_flexibility(30);

        let report = engine().run_edf(std::slice::from_ref(&strict), &blocks).unwrap();
        let recs = recommend(&report, std::slice::from_ref(&strict), chrono_tz::UTC);
        assert!(matches!(recs[0], Recommendation::DeadlineAtRisk { .. }));

        let report = engine().run_edf(std::slice::from_ref(&lenient), &blocks).unwrap();
        assert!(recommend(&report, std::slice::from_ref(&lenient), chrono_tz::UTC).is_empty());
    }

    #[test]
    fn huge_flexibility_never_flags_deadline() {
        let blocks = vec![TimeBlock::new("b1", at(9), at(12))];
        let tasks = vec![
            Task::new("t1", "quarterly review")
                .with_duration(90)
                .with_deadline(at(10))
                .with_deadline_flexibility(i64::MAX),
        ];
        assert!(crate::validation::validate_inputs(&tasks, &blocks).is_ok());

        let report = engine().run_edf(&tasks, &blocks).unwrap();
        assert_eq!(report.run.tasks_scheduled, 1);
        assert!(recommend(&report, &tasks, chrono_tz::UTC).is_empty());
    }

    #[test]
    fn warns_about_unplaced_deadline_tasks() {
        let blocks = vec![TimeBlock::new("b1", at(9), at(9) + Duration::minutes(30))];
        let tasks = vec![
            Task::new("t1", "tax filing").with_duration(60).with_deadline(at(20)),
            Task::new("t2", "someday").with_duration(60),
        ];
        let report = engine().run_hpf(&tasks, &blocks).unwrap();
        let recs = recommend(&report, &tasks, chrono_tz::UTC);
        assert_eq!(recs.len(), 1);
        assert!(matches!(&recs[0], Recommendation::Unplaced { task_id, .. } if task_id == "t1"));
    }
}
