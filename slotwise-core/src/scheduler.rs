//! Ordering strategies share one driver: order the tasks, then ask the
//! strategy to place each one against the shared allocator.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::allocator::BlockAllocator;
use crate::error::AllocatorError;
use crate::priority::calculated_priority;
use crate::run::{Algorithm, RunOutcome, ScheduleDecision};
use crate::task::Task;

/// A task paired with its priority at the run's evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct ScoredTask<'a> {
    pub task: &'a Task,
    pub priority: f64,
}

impl<'a> ScoredTask<'a> {
    pub fn new(task: &'a Task, now: DateTime<Utc>) -> Self {
        Self {
            task,
            priority: calculated_priority(task, now),
        }
    }
}

pub trait Scheduler {
    fn algorithm(&self) -> Algorithm;

    /// Attempt order for `tasks`, scored at `now`.
    fn order<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<ScoredTask<'a>>;

    /// Find a block for `scored` and commit it. `Ok(None)` means no candidate.
    fn place(
        &self,
        scored: ScoredTask<'_>,
        allocator: &mut BlockAllocator,
    ) -> Result<Option<ScheduleDecision>, AllocatorError>;

    /// Place every task against `allocator`. Defaults to one pass in `order`.
    fn schedule(
        &self,
        tasks: &[Task],
        allocator: &mut BlockAllocator,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, AllocatorError> {
        drive(self, tasks, allocator, now)
    }
}

/// Walk every task in the scheduler's order. Infeasible tasks are tallied;
/// allocator faults abort the walk.
pub fn drive<S: Scheduler + ?Sized>(
    scheduler: &S,
    tasks: &[Task],
    allocator: &mut BlockAllocator,
    now: DateTime<Utc>,
) -> Result<RunOutcome, AllocatorError> {
    place_in_order(scheduler, scheduler.order(tasks, now), allocator)
}

/// Ask `scheduler` to place each task of an already-ordered list.
pub fn place_in_order<S: Scheduler + ?Sized>(
    scheduler: &S,
    order: Vec<ScoredTask<'_>>,
    allocator: &mut BlockAllocator,
) -> Result<RunOutcome, AllocatorError> {
    let mut outcome = RunOutcome::default();

    for scored in order {
        match scheduler.place(scored, allocator)? {
            Some(decision) => outcome.decisions.push(decision),
            None => {
                debug!(
                    algorithm = %scheduler.algorithm(),
                    task_id = %scored.task.id,
                    minutes = scored.task.estimated_duration_minutes,
                    "no candidate block"
                );
                outcome.unscheduled.push(scored.task.id.clone());
            }
        }
    }

    Ok(outcome)
}
