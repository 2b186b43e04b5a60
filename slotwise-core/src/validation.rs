//! Input validation, run before a scheduling run is opened.
//!
//! Checks every task and block field-by-field and rejects duplicate ids.
//! All problems are collected so the caller can fix them in one pass.

use std::collections::HashSet;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::task::Task;
use crate::time_block::TimeBlock;

pub type ValidationResult = Result<(), Vec<ValidationError>>;

pub fn validate_inputs(tasks: &[Task], blocks: &[TimeBlock]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for task in tasks {
        errors.extend(task.validate());
        if !seen.insert(task.id.as_str()) {
            errors.push(ValidationError::new(
                format!("task {}", task.id),
                ValidationErrorKind::DuplicateId,
                "task id appears more than once",
            ));
        }
    }

    let mut seen = HashSet::new();
    for block in blocks {
        errors.extend(block.validate());
        if !seen.insert(block.id.as_str()) {
            errors.push(ValidationError::new(
                format!("block {}", block.id),
                ValidationErrorKind::DuplicateId,
                "block id appears more than once",
            ));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn accepts_empty_inputs() {
        assert!(validate_inputs(&[], &[]).is_ok());
    }

    #[test]
    fn collects_problems_across_records() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let tasks = vec![
            Task::new("t1", "ok"),
            Task::new("t1", "dup"),
            Task::new("t2", "bad").with_duration(-5),
        ];
        let blocks = vec![
            TimeBlock::new("b1", t0, t0 + Duration::hours(1)),
            TimeBlock::new("b2", t0, t0),
        ];

        let errs = validate_inputs(&tasks, &blocks).unwrap_err();
        let kinds: Vec<ValidationErrorKind> = errs.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValidationErrorKind::DuplicateId,
                ValidationErrorKind::NonPositiveDuration,
                ValidationErrorKind::NonPositiveDuration,
            ]
        );
        assert_eq!(errs[2].subject, "block b2");
    }

    #[test]
    fn rejects_duplicate_block_ids() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let blocks = vec![
            TimeBlock::new("b1", t0, t0 + Duration::hours(1)),
            TimeBlock::new("b1", t0 + Duration::hours(2), t0 + Duration::hours(3)),
        ];
        let errs = validate_inputs(&[], &blocks).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::DuplicateId);
    }
}
