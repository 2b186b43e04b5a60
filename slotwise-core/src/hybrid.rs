//! Hybrid EDF/HPF.
//!
//! Two passes over one allocator:
//! - EDF (first-fit) places the deadline tasks, earliest deadline first;
//! - HPF (best-fit) places every task the first pass left behind, including
//!   deadline tasks it could not fit, into whatever capacity remains.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::allocator::BlockAllocator;
use crate::edf::EdfScheduler;
use crate::error::AllocatorError;
use crate::hpf::HpfScheduler;
use crate::run::{Algorithm, RunOutcome, ScheduleDecision};
use crate::scheduler::{ScoredTask, Scheduler, place_in_order};
use crate::task::Task;

#[derive(Debug, Clone, Copy, Default)]
pub struct HybridScheduler;

impl HybridScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for HybridScheduler {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Hybrid
    }

    /// First-pass order: deadline tasks by EDF, then the rest by HPF.
    fn order<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<ScoredTask<'a>> {
        let mut order: Vec<ScoredTask<'a>> = EdfScheduler
            .order(tasks, now)
            .into_iter()
            .filter(|s| s.task.deadline.is_some())
            .collect();
        order.extend(
            HpfScheduler
                .order(tasks, now)
                .into_iter()
                .filter(|s| s.task.deadline.is_none()),
        );
        order
    }

    fn place(
        &self,
        scored: ScoredTask<'_>,
        allocator: &mut BlockAllocator,
    ) -> Result<Option<ScheduleDecision>, AllocatorError> {
        if scored.task.deadline.is_some() {
            EdfScheduler.place(scored, allocator)
        } else {
            HpfScheduler.place(scored, allocator)
        }
    }

    fn schedule(
        &self,
        tasks: &[Task],
        allocator: &mut BlockAllocator,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome, AllocatorError> {
        let deadline_first: Vec<ScoredTask<'_>> = EdfScheduler
            .order(tasks, now)
            .into_iter()
            .filter(|s| s.task.deadline.is_some())
            .collect();
        let first = place_in_order(&EdfScheduler, deadline_first, allocator)?;

        let placed: HashSet<&str> = first.decisions.iter().map(|d| d.task_id.as_str()).collect();
        let leftovers: Vec<ScoredTask<'_>> = HpfScheduler
            .order(tasks, now)
            .into_iter()
            .filter(|s| !placed.contains(s.task.id.as_str()))
            .collect();
        debug!(
            placed_by_deadline = first.decisions.len(),
            leftovers = leftovers.len(),
            "hybrid switching to priority pass"
        );
        let second = place_in_order(&HpfScheduler, leftovers, allocator)?;

        let mut decisions = first.decisions;
        decisions.extend(second.decisions);
        Ok(RunOutcome {
            decisions,
            unscheduled: second.unscheduled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_block::TimeBlock;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, 0, 0).unwrap()
    }

    fn ids(order: &[ScoredTask<'_>]) -> Vec<String> {
        order.iter().map(|s| s.task.id.clone()).collect()
    }

    fn utc_allocator(blocks: &[TimeBlock]) -> BlockAllocator {
        BlockAllocator::new(blocks, chrono_tz::UTC)
    }

    #[test]
    fn order_puts_deadline_tasks_ahead_of_priority() {
        let tasks = vec![
            Task::new("big", "x").with_priority(5),
            Task::new("due_late", "y").with_priority(1).with_deadline(now() + Duration::days(5)),
            Task::new("small", "z").with_priority(2),
            Task::new("due_soon", "w").with_priority(1).with_deadline(now() + Duration::hours(3)),
        ];
        let order = HybridScheduler.order(&tasks, now());
        assert_eq!(ids(&order), vec!["due_soon", "due_late", "big", "small"]);
    }

    #[test]
    fn deadline_tasks_get_first_pick_of_blocks() {
        let blocks = vec![
            TimeBlock::new("am", at(9), at(10)),
            TimeBlock::new("pm", at(14), at(15)),
        ];
        let tasks = vec![
            Task::new("vip", "x").with_duration(60).with_priority(5),
            Task::new("filing", "y")
                .with_duration(60)
                .with_priority(1)
                .with_deadline(now() + Duration::days(3)),
        ];
        let mut alloc = utc_allocator(&blocks);
        let outcome = HybridScheduler.schedule(&tasks, &mut alloc, now()).unwrap();

        let placed: Vec<(&str, &str)> = outcome
            .decisions
            .iter()
            .map(|d| (d.task_id.as_str(), d.block_id.as_str()))
            .collect();
        assert_eq!(placed, vec![("filing", "am"), ("vip", "pm")]);
        assert!(outcome.decisions[0].reason.starts_with("EDF:"));
        assert_eq!(outcome.decisions[0].confidence_level, 0.80);
        assert!(outcome.decisions[1].reason.starts_with("HPF:"));
        assert_eq!(outcome.decisions[1].confidence_level, 0.85);
    }

    #[test]
    fn leftovers_are_placed_by_priority() {
        let blocks = vec![
            TimeBlock::new("am", at(9), at(10)),
            TimeBlock::new("pm", at(14), at(15)),
        ];
        let tasks = vec![
            Task::new("low", "x").with_duration(60).with_priority(2),
            Task::new("high", "y").with_duration(60).with_priority(4),
            Task::new("due", "z").with_duration(60).with_deadline(now() + Duration::hours(30)),
        ];
        let mut alloc = utc_allocator(&blocks);
        let outcome = HybridScheduler.schedule(&tasks, &mut alloc, now()).unwrap();

        let order: Vec<&str> = outcome.decisions.iter().map(|d| d.task_id.as_str()).collect();
        assert_eq!(order, vec!["due", "high"]);
        assert_eq!(outcome.unscheduled, vec!["low".to_string()]);
    }

    #[test]
    fn unplaced_deadline_task_is_retried_once() {
        // The only block is shorter than the deadline task in both passes.
        let blocks = vec![TimeBlock::new("b1", at(9), at(10))];
        let tasks = vec![
            Task::new("due", "x")
                .with_duration(90)
                .with_deadline(now() + Duration::hours(5)),
            Task::new("quick", "y").with_duration(30),
        ];
        let mut alloc = utc_allocator(&blocks);
        let outcome = HybridScheduler.schedule(&tasks, &mut alloc, now()).unwrap();

        assert_eq!(outcome.decisions.len(), 1);
        assert_eq!(outcome.decisions[0].task_id, "quick");
        assert_eq!(outcome.unscheduled, vec!["due".to_string()]);
    }
}
