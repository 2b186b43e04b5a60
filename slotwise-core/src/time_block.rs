//! Time blocks: contiguous spans of placement capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    #[default]
    Available,
    Reserved,
    Occupied,
}

/// What the span represents on the user's calendar. Informational only;
/// placement eligibility is driven by [`BlockStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Available,
    Busy,
    Break,
    Blocked,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,

    #[serde(default)]
    pub status: BlockStatus,
    #[serde(default)]
    pub block_type: BlockType,

    #[serde(default = "default_true")]
    pub can_be_split: bool,
    #[serde(default)]
    pub min_task_duration_minutes: Option<i64>,
    #[serde(default)]
    pub max_task_duration_minutes: Option<i64>,

    /// Contribution to best-fit scoring.
    #[serde(default = "default_weight")]
    pub importance_weight: f64,
    #[serde(default = "default_weight")]
    pub flexibility_score: f64,
}

impl TimeBlock {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            status: BlockStatus::Available,
            block_type: BlockType::Available,
            can_be_split: true,
            min_task_duration_minutes: None,
            max_task_duration_minutes: None,
            importance_weight: 1.0,
            flexibility_score: 1.0,
        }
    }

    pub fn with_status(mut self, status: BlockStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }

    pub fn with_split(mut self, can_be_split: bool) -> Self {
        self.can_be_split = can_be_split;
        self
    }

    pub fn with_task_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_task_duration_minutes = min;
        self.max_task_duration_minutes = max;
        self
    }

    pub fn with_importance(mut self, weight: f64) -> Self {
        self.importance_weight = weight;
        self
    }

    pub fn with_flexibility(mut self, score: f64) -> Self {
        self.flexibility_score = score;
        self
    }

    /// Whole minutes between start and end.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn is_available(&self) -> bool {
        self.status == BlockStatus::Available
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let subject = format!("block {}", self.id);
        let mut errors = Vec::new();

        if self.id.trim().is_empty() {
            errors.push(ValidationError::new(
                &subject,
                ValidationErrorKind::MissingField,
                "id must be non-empty",
            ));
        }
        if self.end <= self.start {
            errors.push(ValidationError::new(
                &subject,
                ValidationErrorKind::NonPositiveDuration,
                format!("end {} must be after start {}", self.end, self.start),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_task_duration_minutes, self.max_task_duration_minutes) {
            if min > max {
                errors.push(ValidationError::new(
                    &subject,
                    ValidationErrorKind::InconsistentBounds,
                    format!("min_task_duration_minutes {min} exceeds max {max}"),
                ));
            }
        }
        if !self.importance_weight.is_finite() {
            errors.push(ValidationError::new(
                &subject,
                ValidationErrorKind::OutOfRange,
                "importance_weight must be finite",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn duration_is_whole_minutes() {
        let b = TimeBlock::new("b1", at(9, 0), at(10, 30));
        assert_eq!(b.duration_minutes(), 90);

        let b = TimeBlock::new("b2", at(9, 0), at(9, 0) + Duration::seconds(119));
        assert_eq!(b.duration_minutes(), 1);
    }

    #[test]
    fn rejects_inverted_span() {
        let errs = TimeBlock::new("b1", at(10, 0), at(9, 0)).validate();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::NonPositiveDuration);
        assert_eq!(errs[0].subject, "block b1");
    }

    #[test]
    fn rejects_inverted_task_bounds() {
        let errs = TimeBlock::new("b1", at(9, 0), at(12, 0))
            .with_task_bounds(Some(120), Some(30))
            .validate();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::InconsistentBounds);
    }

    #[test]
    fn status_serializes_lowercase_and_defaults() {
        let json = format!(
            r#"{{"id":"b1","start":"{}","end":"{}"}}"#,
            at(9, 0).to_rfc3339(),
            at(10, 0).to_rfc3339()
        );
        let b: TimeBlock = serde_json::from_str(&json).unwrap();
        assert!(b.is_available());
        assert!(b.can_be_split);
        assert_eq!(b.importance_weight, 1.0);

        let out = serde_json::to_string(&b.with_status(BlockStatus::Occupied)).unwrap();
        assert!(out.contains("\"status\":\"occupied\""));
    }
}
