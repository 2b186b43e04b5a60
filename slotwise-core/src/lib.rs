//! slotwise-core: deadline- and priority-aware task placement.
//!
//! Given tasks and a snapshot of free time blocks, a run orders the tasks
//! (EDF, HPF, or EDF then HPF), places each into a block, and returns the decision trail
//! plus run metrics. Inputs are never mutated.

pub mod allocator;
pub mod availability;
pub mod edf;
pub mod engine;
pub mod error;
pub mod hpf;
pub mod hybrid;
pub mod priority;
pub mod recommendations;
pub mod run;
pub mod scheduler;
pub mod task;
pub mod time;
pub mod time_block;
pub mod validation;

pub use allocator::{BlockAllocator, CommitOutcome, Placement, block_score};
pub use availability::{WorkingHours, generate_time_blocks};
pub use edf::EdfScheduler;
pub use engine::{EngineConfig, SchedulingEngine};
pub use error::{AllocatorError, EngineError, EngineResult, ValidationError, ValidationErrorKind};
pub use hpf::HpfScheduler;
pub use hybrid::HybridScheduler;
pub use priority::{calculated_priority, deadline_factor};
pub use recommendations::{Recommendation, recommend};
pub use run::{Algorithm, RunReport, RunStatus, ScheduleDecision, SchedulingRun};
pub use scheduler::{ScoredTask, Scheduler};
pub use task::{Task, TaskCategory};
pub use time::{Clock, FixedClock, SystemClock};
pub use time_block::{BlockStatus, BlockType, TimeBlock};
pub use validation::validate_inputs;
