//! Time-block allocator.
//!
//! Owns the per-run working list of available capacity. The caller's snapshot
//! is cloned on construction and never touched again, so two runs over the same
//! snapshot can proceed on different threads.
//!
//! A block is a candidate for a task when:
//! - it is at least as long as the task,
//! - the task respects the block's min/max task-duration bounds,
//! - its local start hour lies within the span of the task's preferred hours
//!   (coarse range check, when any are declared),
//! - its local start hour is not one of the task's avoided hours.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AllocatorError;
use crate::task::Task;
use crate::time::local_hour;
use crate::time_block::{BlockStatus, TimeBlock};

/// Best-fit score weights.
const PRIORITY_WEIGHT: f64 = 0.4;
const EFFICIENCY_WEIGHT: f64 = 0.3;
const TIMING_WEIGHT: f64 = 0.2;
const IMPORTANCE_WEIGHT: f64 = 0.1;

/// Timing alignment is not modelled yet; every candidate gets full marks.
const TIMING_SCORE: f64 = 1.0;

/// What a commit did to the block that received the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Task filled the block; it is now occupied and out of the working list.
    Consumed,
    /// Block start moved past the task; the remainder stays available.
    Split { remaining_minutes: i64 },
    /// Task under-filled a block it could not split; the slack is lost for this run.
    RemainderDropped { lost_minutes: i64 },
}

/// One committed placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub block_id: String,
    /// Block span as it stood in the working list right before the commit.
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub block_duration_minutes: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub outcome: CommitOutcome,
}

/// `duration_efficiency` term of the best-fit score.
pub fn duration_efficiency(task: &Task, block: &TimeBlock) -> f64 {
    let block_minutes = block.duration_minutes();
    if block_minutes <= 0 {
        return 0.0;
    }
    task.estimated_duration_minutes as f64 / block_minutes as f64
}

/// Best-fit score for placing `task` (already scored at `priority`) in `block`.
pub fn block_score(task: &Task, block: &TimeBlock, priority: f64) -> f64 {
    priority * PRIORITY_WEIGHT
        + duration_efficiency(task, block) * EFFICIENCY_WEIGHT
        + TIMING_SCORE * TIMING_WEIGHT
        + block.importance_weight * IMPORTANCE_WEIGHT
}

#[derive(Debug, Clone)]
pub struct BlockAllocator {
    blocks: Vec<TimeBlock>,
    tz: Tz,
}

impl BlockAllocator {
    /// Build a working list from the available blocks in `snapshot`,
    /// ascending by start. Hour-of-day checks are evaluated in `tz`.
    pub fn new(snapshot: &[TimeBlock], tz: Tz) -> Self {
        let mut blocks: Vec<TimeBlock> = snapshot
            .iter()
            .filter(|b| b.is_available())
            .cloned()
            .collect();
        blocks.sort_by_key(|b| b.start);
        Self { blocks, tz }
    }

    pub fn blocks(&self) -> &[TimeBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn is_candidate(&self, task: &Task, block: &TimeBlock) -> bool {
        let minutes = task.estimated_duration_minutes;

        if block.duration_minutes() < minutes {
            return false;
        }
        if block.min_task_duration_minutes.is_some_and(|min| minutes < min) {
            return false;
        }
        if block.max_task_duration_minutes.is_some_and(|max| minutes > max) {
            return false;
        }

        let hour = local_hour(block.start, self.tz);
        if let (Some(first), Some(last)) = (
            task.preferred_time_of_day.first(),
            task.preferred_time_of_day.last(),
        ) {
            if !(*first..=*last).contains(&hour) {
                return false;
            }
        }
        if task.avoid_time_of_day.contains(&hour) {
            return false;
        }

        true
    }

    /// First candidate in ascending start order.
    pub fn find_first_fit(&self, task: &Task) -> Option<&TimeBlock> {
        self.blocks.iter().find(|b| self.is_candidate(task, b))
    }

    /// Highest-scoring candidate and its score. Ties keep the earliest start.
    pub fn find_best_fit(&self, task: &Task, priority: f64) -> Option<(&TimeBlock, f64)> {
        let mut best: Option<(&TimeBlock, f64)> = None;
        for block in self.blocks.iter().filter(|b| self.is_candidate(task, b)) {
            let score = block_score(task, block, priority);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((block, score)),
            }
        }
        best
    }

    /// Place `task` at the start of block `block_id` and update the working list.
    pub fn commit(&mut self, task: &Task, block_id: &str) -> Result<Placement, AllocatorError> {
        let idx = self
            .blocks
            .iter()
            .position(|b| b.id == block_id)
            .ok_or_else(|| AllocatorError::UnknownBlock(block_id.to_string()))?;

        let minutes = task.estimated_duration_minutes;
        let block_minutes = self.blocks[idx].duration_minutes();
        if minutes > block_minutes {
            return Err(AllocatorError::DoesNotFit {
                task: task.id.clone(),
                block: block_id.to_string(),
                minutes,
            });
        }

        let block_start = self.blocks[idx].start;
        let block_end = self.blocks[idx].end;
        let start = block_start;
        let end = start + Duration::minutes(minutes);

        let outcome = if minutes >= block_minutes {
            self.take(idx);
            CommitOutcome::Consumed
        } else if task.can_be_split && self.blocks[idx].can_be_split {
            let block = &mut self.blocks[idx];
            block.start = end;
            if block.end <= block.start {
                self.take(idx);
                CommitOutcome::Consumed
            } else {
                CommitOutcome::Split {
                    remaining_minutes: block_minutes - minutes,
                }
            }
        } else {
            self.take(idx);
            CommitOutcome::RemainderDropped {
                lost_minutes: block_minutes - minutes,
            }
        };

        debug!(
            task_id = %task.id,
            block_id,
            %start,
            %end,
            ?outcome,
            "committed placement"
        );

        Ok(Placement {
            block_id: block_id.to_string(),
            block_start,
            block_end,
            block_duration_minutes: block_minutes,
            start,
            end,
            outcome,
        })
    }

    /// Mark occupied and drop from the working list.
    fn take(&mut self, idx: usize) {
        let mut block = self.blocks.remove(idx);
        block.status = BlockStatus::Occupied;
        debug!(block_id = %block.id, status = ?block.status, "block left working list");
    }
}
