//! Scheduling engine: validation, run recording, and scheduler dispatch.
//!
//! Flow per run:
//! - reject malformed input before anything is recorded
//! - open a run and clone the available blocks into a fresh allocator
//! - let the chosen scheduler place every task
//! - finalize the run as completed, or as failed on an allocator fault

use chrono_tz::Tz;

use crate::allocator::BlockAllocator;
use crate::edf::EdfScheduler;
use crate::error::{EngineError, EngineResult};
use crate::hpf::HpfScheduler;
use crate::hybrid::HybridScheduler;
use crate::run::{Algorithm, RunRecorder, RunReport};
use crate::scheduler::Scheduler;
use crate::task::Task;
use crate::time::Clock;
use crate::time_block::TimeBlock;
use crate::validation::validate_inputs;

pub const ALGORITHM_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Zone used for hour-of-day placement constraints.
    pub timezone: Tz,
    pub algorithm_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::UTC,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        }
    }
}

/// Entry point for scheduling runs.
///
/// Holds no per-run state, so one engine can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct SchedulingEngine<C: Clock> {
    clock: C,
    config: EngineConfig,
}

impl<C: Clock> SchedulingEngine<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(clock: C, config: EngineConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one of the built-in algorithms.
    pub fn run(
        &self,
        algorithm: Algorithm,
        tasks: &[Task],
        blocks: &[TimeBlock],
    ) -> EngineResult<RunReport> {
        match algorithm {
            Algorithm::Edf => self.run_with(&EdfScheduler, tasks, blocks),
            Algorithm::Hpf => self.run_with(&HpfScheduler, tasks, blocks),
            Algorithm::Hybrid => self.run_with(&HybridScheduler, tasks, blocks),
        }
    }

    pub fn run_edf(&self, tasks: &[Task], blocks: &[TimeBlock]) -> EngineResult<RunReport> {
        self.run(Algorithm::Edf, tasks, blocks)
    }

    pub fn run_hpf(&self, tasks: &[Task], blocks: &[TimeBlock]) -> EngineResult<RunReport> {
        self.run(Algorithm::Hpf, tasks, blocks)
    }

    /// EDF over the deadline tasks, then HPF over everything left.
    pub fn run_hybrid(&self, tasks: &[Task], blocks: &[TimeBlock]) -> EngineResult<RunReport> {
        self.run(Algorithm::Hybrid, tasks, blocks)
    }

    /// Run an arbitrary scheduler.
    ///
    /// Returns `Err` only for invalid input. Faults during the run come back as
    /// an `Ok` report whose run is marked failed.
    pub fn run_with<S: Scheduler + ?Sized>(
        &self,
        scheduler: &S,
        tasks: &[Task],
        blocks: &[TimeBlock],
    ) -> EngineResult<RunReport> {
        validate_inputs(tasks, blocks).map_err(EngineError::InvalidInput)?;

        let now = self.clock.now();
        let recorder = RunRecorder::open(
            scheduler.algorithm(),
            &self.config.algorithm_version,
            tasks,
            blocks,
            now,
        );
        let mut allocator = BlockAllocator::new(blocks, self.config.timezone);

        let report = match scheduler.schedule(tasks, &mut allocator, now) {
            Ok(outcome) => recorder.complete(outcome, tasks, self.clock.now()),
            Err(fault) => recorder.fail(EngineError::from(fault).to_string()),
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AllocatorError, ValidationErrorKind};
    use crate::run::{RunStatus, ScheduleDecision};
    use crate::scheduler::ScoredTask;
    use crate::time::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn engine() -> SchedulingEngine<FixedClock> {
        SchedulingEngine::new(FixedClock(now()))
    }

    /// Places every task against a block id that does not exist.
    struct Faulty;

    impl Scheduler for Faulty {
        fn algorithm(&self) -> Algorithm {
            Algorithm::Hpf
        }

        fn order<'a>(&self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<ScoredTask<'a>> {
            tasks.iter().map(|t| ScoredTask::new(t, now)).collect()
        }

        fn place(
            &self,
            scored: ScoredTask<'_>,
            allocator: &mut BlockAllocator,
        ) -> Result<Option<ScheduleDecision>, AllocatorError> {
            allocator.commit(scored.task, "ghost")?;
            Ok(None)
        }
    }

    #[test]
    fn invalid_input_is_rejected_before_run() {
        let tasks = vec![Task::new("t1", "x").with_duration(0)];
        let err = engine().run_edf(&tasks, &[]).unwrap_err();
        match err {
            EngineError::InvalidInput(errs) => {
                assert_eq!(errs[0].kind, ValidationErrorKind::NonPositiveDuration)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn allocator_fault_fails_the_run() {
        let blocks = vec![TimeBlock::new("b1", now(), now() + Duration::hours(1))];
        let tasks = vec![Task::new("t1", "x").with_duration(30)];

        let report = engine().run_with(&Faulty, &tasks, &blocks).unwrap();
        assert_eq!(report.run.status, RunStatus::Failed);
        let msg = report.run.error_message.unwrap();
        assert!(msg.contains("ghost"), "{msg}");
        assert!(report.decisions.is_empty());
    }

    #[test]
    fn caller_blocks_are_not_mutated() {
        let blocks = vec![TimeBlock::new("b1", now(), now() + Duration::hours(2))];
        let before = blocks.clone();
        let tasks = vec![Task::new("t1", "x").with_duration(30)];

        let report = engine().run_hpf(&tasks, &blocks).unwrap();
        assert_eq!(report.run.tasks_scheduled, 1);
        assert_eq!(blocks, before);
    }

    #[test]
    fn timezone_config_drives_hour_constraints() {
        // 15:00 UTC = 09:00 America/Chicago.
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let blocks = vec![TimeBlock::new("b1", start, start + Duration::hours(1))];
        let tasks = vec![Task::new("t1", "standup").with_duration(15).with_preferred_hours([9])];

        let utc = engine().run_edf(&tasks, &blocks).unwrap();
        assert_eq!(utc.run.tasks_scheduled, 0);

        let config = EngineConfig {
            timezone: chrono_tz::America::Chicago,
            ..EngineConfig::default()
        };
        let local = SchedulingEngine::with_config(FixedClock(now()), config)
            .run_edf(&tasks, &blocks)
            .unwrap();
        assert_eq!(local.run.tasks_scheduled, 1);
    }

    #[test]
    fn hybrid_run_shares_one_allocator_across_passes() {
        let blocks = vec![
            TimeBlock::new("b1", now() + Duration::hours(1), now() + Duration::hours(2)),
            TimeBlock::new("b2", now() + Duration::hours(3), now() + Duration::hours(4)),
        ];
        let tasks = vec![
            Task::new("a", "x").with_duration(60).with_priority(5),
            Task::new("b", "x").with_duration(60).with_priority(4),
            Task::new("d", "x").with_duration(60).with_deadline(now() + Duration::days(2)),
        ];

        let report = engine().run_hybrid(&tasks, &blocks).unwrap();
        assert_eq!(report.run.algorithm, Algorithm::Hybrid);
        assert_eq!(report.run.status, RunStatus::Completed);
        assert_eq!(report.run.tasks_scheduled, 2);
        assert_eq!(report.decision_for("d").unwrap().block_id, "b1");
        assert_eq!(report.decision_for("a").unwrap().block_id, "b2");
        assert_eq!(report.unscheduled, vec!["b".to_string()]);
        assert!(report.run.deadline_compliance_rate.is_some());
        assert!(report.run.average_priority_score.is_some());
    }
}
