//! Highest-Priority-First with best-fit block selection.

use chrono::{DateTime, Utc};

use crate::allocator::BlockAllocator;
use crate::error::AllocatorError;
use crate::run::{Algorithm, DecisionScores, ScheduleDecision};
use crate::scheduler::{ScoredTask, Scheduler};
use crate::task::Task;

#[derive(Debug, Clone, Copy, Default)]
pub struct HpfScheduler;

impl HpfScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for HpfScheduler {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Hpf
    }

    /// Descending priority; equal scores keep input order.
    fn order<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<ScoredTask<'a>> {
        let mut order: Vec<ScoredTask<'a>> =
            tasks.iter().map(|t| ScoredTask::new(t, now)).collect();
        order.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        order
    }

    fn place(
        &self,
        scored: ScoredTask<'_>,
        allocator: &mut BlockAllocator,
    ) -> Result<Option<ScheduleDecision>, AllocatorError> {
        let task = scored.task;
        let Some((block, score)) = allocator.find_best_fit(task, scored.priority) else {
            return Ok(None);
        };
        let block_id = block.id.clone();
        let placement = allocator.commit(task, &block_id)?;

        let scores = DecisionScores {
            priority: scored.priority,
            deadline_urgency: 0.0,
            efficiency: score,
        };
        let reason = format!(
            "HPF: highest priority task ({:.2}) scheduled in best-scoring block (score {score:.3})",
            scored.priority
        );

        Ok(Some(ScheduleDecision::new(
            Algorithm::Hpf,
            task,
            placement,
            scores,
            reason,
        )))
    }
}
