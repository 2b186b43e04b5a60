//! Earliest-Deadline-First.
//!
//! Deadline tasks go first, earliest deadline first and higher priority first
//! among equal deadlines. Deadline-less tasks follow by descending priority.
//! Each task takes the first candidate block in start order.

use chrono::{DateTime, Utc};

use crate::allocator::BlockAllocator;
use crate::error::AllocatorError;
use crate::priority::hours_until;
use crate::run::{Algorithm, DecisionScores, ScheduleDecision};
use crate::scheduler::{ScoredTask, Scheduler};
use crate::task::Task;

#[derive(Debug, Clone, Copy, Default)]
pub struct EdfScheduler;

impl EdfScheduler {
    pub fn new() -> Self {
        Self
    }
}

/// `max(0, 100 − hours from block start to deadline)`; 0 without a deadline.
pub fn deadline_urgency(task: &Task, block_start: DateTime<Utc>) -> f64 {
    task.deadline
        .map_or(0.0, |d| (100.0 - hours_until(d, block_start)).max(0.0))
}

impl Scheduler for EdfScheduler {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Edf
    }

    fn order<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<ScoredTask<'a>> {
        let (mut with_deadline, mut without): (Vec<_>, Vec<_>) = tasks
            .iter()
            .map(|t| ScoredTask::new(t, now))
            .partition(|s| s.task.deadline.is_some());

        with_deadline.sort_by(|a, b| {
            a.task
                .deadline
                .cmp(&b.task.deadline)
                .then_with(|| b.priority.total_cmp(&a.priority))
        });
        without.sort_by(|a, b| b.priority.total_cmp(&a.priority));

        with_deadline.extend(without);
        with_deadline
    }

    fn place(
        &self,
        scored: ScoredTask<'_>,
        allocator: &mut BlockAllocator,
    ) -> Result<Option<ScheduleDecision>, AllocatorError> {
        let task = scored.task;
        let Some(block) = allocator.find_first_fit(task) else {
            return Ok(None);
        };
        let block_id = block.id.clone();
        let placement = allocator.commit(task, &block_id)?;

        let scores = DecisionScores {
            priority: scored.priority,
            deadline_urgency: deadline_urgency(task, placement.block_start),
            efficiency: task.estimated_duration_minutes as f64
                / placement.block_duration_minutes as f64,
        };
        let reason = match task.deadline {
            Some(d) => format!(
                "EDF: task deadline {}, fits in block starting {}",
                d.to_rfc3339(),
                placement.block_start.to_rfc3339()
            ),
            None => format!(
                "EDF: no deadline, priority {:.2}, fits in block starting {}",
                scored.priority,
                placement.block_start.to_rfc3339()
            ),
        };

        Ok(Some(ScheduleDecision::new(
            Algorithm::Edf,
            task,
            placement,
            scores,
            reason,
        )))
    }
}
