//! Scheduling run records: the decision trail and aggregate metrics.
//!
//! A [`RunRecorder`] is opened before the first task is considered and is
//! consumed by exactly one of [`RunRecorder::complete`] or [`RunRecorder::fail`],
//! so a finished [`SchedulingRun`] can never be left `running` or finalized twice.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::allocator::{CommitOutcome, Placement};
use crate::task::Task;
use crate::time_block::TimeBlock;

static RUN_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "EDF")]
    Edf,
    #[serde(rename = "HPF")]
    Hpf,
    /// EDF over deadline tasks, then HPF over everything still unplaced.
    #[serde(rename = "HYBRID")]
    Hybrid,
}

impl Algorithm {
    /// Fixed confidence attached to every decision the algorithm makes.
    /// Hybrid decisions carry the confidence of the phase that placed them.
    pub fn confidence(self) -> f64 {
        match self {
            Algorithm::Edf | Algorithm::Hybrid => 0.80,
            Algorithm::Hpf => 0.85,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Edf => "EDF",
            Algorithm::Hpf => "HPF",
            Algorithm::Hybrid => "HYBRID",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edf" => Ok(Algorithm::Edf),
            "hpf" => Ok(Algorithm::Hpf),
            "hybrid" => Ok(Algorithm::Hybrid),
            other => Err(format!(
                "unknown algorithm '{other}' (expected edf, hpf or hybrid)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// One committed placement, as recorded in the run's decision trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub task_id: String,
    pub task_name: String,
    pub block_id: String,
    /// Span of the working block that held the task, before the commit.
    pub block_start: DateTime<Utc>,
    pub block_end: DateTime<Utc>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub reason: String,
    pub priority_score: f64,
    /// Set by EDF placements; 0 for HPF placements and tasks without a deadline.
    pub deadline_urgency_score: f64,
    pub efficiency_score: f64,
    pub confidence_level: f64,
    /// Set on every successful placement. Says nothing about global optimality.
    pub is_optimal: bool,
    pub outcome: CommitOutcome,
}

/// Per-decision scores supplied by the scheduler that made the placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionScores {
    pub priority: f64,
    pub deadline_urgency: f64,
    pub efficiency: f64,
}

impl ScheduleDecision {
    pub fn new(
        algorithm: Algorithm,
        task: &Task,
        placement: Placement,
        scores: DecisionScores,
        reason: String,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            block_id: placement.block_id,
            block_start: placement.block_start,
            block_end: placement.block_end,
            scheduled_start: placement.start,
            scheduled_end: placement.end,
            reason,
            priority_score: scores.priority,
            deadline_urgency_score: scores.deadline_urgency,
            efficiency_score: scores.efficiency,
            confidence_level: algorithm.confidence(),
            is_optimal: true,
            outcome: placement.outcome,
        }
    }
}

/// One invocation of a scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingRun {
    pub id: String,
    pub algorithm: Algorithm,
    pub algorithm_version: String,
    pub started_at: DateTime<Utc>,
    /// Earliest block start / latest block end across the input. `None` without blocks.
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,

    pub tasks_considered: usize,
    pub time_blocks_available: usize,
    pub tasks_scheduled: usize,
    pub tasks_unscheduled: usize,

    pub execution_time_ms: u64,
    /// scheduled / considered × 100.
    pub schedule_efficiency_score: f64,

    /// EDF and hybrid.
    pub deadline_violations: Option<usize>,
    /// EDF and hybrid.
    pub deadline_compliance_rate: Option<f64>,
    /// HPF and hybrid.
    pub average_priority_score: Option<f64>,

    pub status: RunStatus,
    pub error_message: Option<String>,
}

/// What the caller gets back from a run, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run: SchedulingRun,
    pub decisions: Vec<ScheduleDecision>,
    /// Ids of tasks that found no candidate block, in attempt order.
    pub unscheduled: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.run.status == RunStatus::Completed
    }

    pub fn decision_for(&self, task_id: &str) -> Option<&ScheduleDecision> {
        self.decisions.iter().find(|d| d.task_id == task_id)
    }
}

/// Result of driving a scheduler over every task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOutcome {
    pub decisions: Vec<ScheduleDecision>,
    pub unscheduled: Vec<String>,
}

/// An open run. Consumed by `complete` or `fail`.
#[derive(Debug)]
pub struct RunRecorder {
    run: SchedulingRun,
    timer: Instant,
}

impl RunRecorder {
    pub fn open(
        algorithm: Algorithm,
        algorithm_version: &str,
        tasks: &[Task],
        blocks: &[TimeBlock],
        started_at: DateTime<Utc>,
    ) -> Self {
        let seq = RUN_SEQ.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!(
            "{}-{}-{seq:04}",
            algorithm.as_str().to_ascii_lowercase(),
            started_at.format("%Y%m%dT%H%M%SZ")
        );

        let run = SchedulingRun {
            id,
            algorithm,
            algorithm_version: algorithm_version.to_string(),
            started_at,
            window_start: blocks.iter().map(|b| b.start).min(),
            window_end: blocks.iter().map(|b| b.end).max(),
            tasks_considered: tasks.len(),
            time_blocks_available: blocks.iter().filter(|b| b.is_available()).count(),
            tasks_scheduled: 0,
            tasks_unscheduled: 0,
            execution_time_ms: 0,
            schedule_efficiency_score: 0.0,
            deadline_violations: None,
            deadline_compliance_rate: None,
            average_priority_score: None,
            status: RunStatus::Running,
            error_message: None,
        };

        info!(
            run_id = %run.id,
            algorithm = %algorithm,
            tasks = run.tasks_considered,
            blocks = run.time_blocks_available,
            "scheduling run opened"
        );

        Self {
            run,
            timer: Instant::now(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run.id
    }

    /// Finalize a run that reached the end of its task list.
    ///
    /// `finished_at` is the clock reading used for deadline-violation counts.
    pub fn complete(
        mut self,
        outcome: RunOutcome,
        tasks: &[Task],
        finished_at: DateTime<Utc>,
    ) -> RunReport {
        let total = self.run.tasks_considered;
        let scheduled = outcome.decisions.len();

        self.run.tasks_scheduled = scheduled;
        self.run.tasks_unscheduled = outcome.unscheduled.len();
        self.run.execution_time_ms = self.elapsed_ms();
        self.run.schedule_efficiency_score = percentage(scheduled, total, 0.0);

        let algorithm = self.run.algorithm;
        if matches!(algorithm, Algorithm::Edf | Algorithm::Hybrid) {
            let violations = tasks
                .iter()
                .filter(|t| t.deadline.is_some_and(|d| d < finished_at))
                .count();
            self.run.deadline_violations = Some(violations);
            self.run.deadline_compliance_rate =
                Some(percentage(total.saturating_sub(violations), total, 100.0));
        }
        if matches!(algorithm, Algorithm::Hpf | Algorithm::Hybrid) {
            let average = if scheduled == 0 {
                0.0
            } else {
                outcome.decisions.iter().map(|d| d.priority_score).sum::<f64>() / scheduled as f64
            };
            self.run.average_priority_score = Some(average);
        }

        self.run.status = RunStatus::Completed;

        info!(
            run_id = %self.run.id,
            algorithm = %self.run.algorithm,
            scheduled = self.run.tasks_scheduled,
            unscheduled = self.run.tasks_unscheduled,
            elapsed_ms = self.run.execution_time_ms,
            efficiency = self.run.schedule_efficiency_score,
            "scheduling run completed"
        );

        RunReport {
            run: self.run,
            decisions: outcome.decisions,
            unscheduled: outcome.unscheduled,
        }
    }

    /// Finalize a run that aborted. No partial schedule is returned.
    pub fn fail(mut self, message: impl Into<String>) -> RunReport {
        let message = message.into();
        self.run.execution_time_ms = self.elapsed_ms();
        self.run.status = RunStatus::Failed;
        self.run.error_message = Some(format!(
            "{} scheduling failed: {message}",
            self.run.algorithm
        ));

        warn!(
            run_id = %self.run.id,
            algorithm = %self.run.algorithm,
            error = %message,
            "scheduling run failed"
        );

        RunReport {
            run: self.run,
            decisions: Vec::new(),
            unscheduled: Vec::new(),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.timer.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

fn percentage(part: usize, total: usize, if_empty: f64) -> f64 {
    if total == 0 {
        if_empty
    } else {
        part as f64 / total as f64 * 100.0
    }
}
