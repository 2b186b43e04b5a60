//! Engine error types.

use std::fmt;

use thiserror::Error;

/// Categories of input problems caught before a run opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A required identifier or label is empty.
    MissingField,
    /// A duration is zero or negative, or a block ends at/before its start.
    NonPositiveDuration,
    /// Min/max bounds contradict each other or the estimate.
    InconsistentBounds,
    /// A numeric field is outside its documented range.
    OutOfRange,
    /// Two tasks or two blocks share an identifier.
    DuplicateId,
}

/// One rejected field on one input record.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Which record, e.g. `task t1` or `block b3`.
    pub subject: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        subject: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Faults raised by the allocator when its working list disagrees with a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    #[error("block {0} is not in the working list")]
    UnknownBlock(String),

    #[error("task {task} ({minutes} min) does not fit block {block}")]
    DoesNotFit {
        task: String,
        block: String,
        minutes: i64,
    },
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {}", join_errors(.0))]
    InvalidInput(Vec<ValidationError>),

    #[error("allocation fault: {0}")]
    Allocation(#[from] AllocatorError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type EngineResult<T> = Result<T, EngineError>;
