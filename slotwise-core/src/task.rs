//! Task model consumed by the scheduling engine.
//!
//! Tasks arrive fully resolved; the engine reads them but never mutates them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrorKind};

/// Weight applied when a task carries no category.
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 1.0;

/// Resolved category reference. The weight is a plain multiplier on priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCategory {
    pub name: String,
    #[serde(default = "default_category_weight")]
    pub category_weight: f64,
}

fn default_category_weight() -> f64 {
    DEFAULT_CATEGORY_WEIGHT
}

impl TaskCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_weight: DEFAULT_CATEGORY_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.category_weight = weight;
        self
    }
}

/// A unit of work to place on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,

    /// Minutes. Must be positive.
    pub estimated_duration_minutes: i64,
    #[serde(default)]
    pub minimum_duration_minutes: Option<i64>,
    #[serde(default)]
    pub maximum_duration_minutes: Option<i64>,

    /// 1-5.
    pub base_priority: u8,
    /// 0.5-3.0.
    pub urgency_multiplier: f64,

    /// Optional hard deadline (UTC).
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Slack allowed when reporting on deadlines. Never enforced during placement.
    #[serde(default)]
    pub deadline_flexibility_minutes: i64,

    pub can_be_split: bool,
    /// Placements are always one contiguous span, so this only matters to consumers.
    #[serde(default)]
    pub requires_consecutive_time: bool,

    #[serde(default)]
    pub category: Option<TaskCategory>,

    /// Hours of day (0-23).
    #[serde(default)]
    pub preferred_time_of_day: BTreeSet<u32>,
    /// Hours of day (0-23).
    #[serde(default)]
    pub avoid_time_of_day: BTreeSet<u32>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            estimated_duration_minutes: 60,
            minimum_duration_minutes: None,
            maximum_duration_minutes: None,
            base_priority: 3,
            urgency_multiplier: 1.0,
            deadline: None,
            deadline_flexibility_minutes: 0,
            can_be_split: true,
            requires_consecutive_time: false,
            category: None,
            preferred_time_of_day: BTreeSet::new(),
            avoid_time_of_day: BTreeSet::new(),
        }
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.estimated_duration_minutes = minutes;
        self
    }

    pub fn with_duration_bounds(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.minimum_duration_minutes = min;
        self.maximum_duration_minutes = max;
        self
    }

    pub fn with_priority(mut self, base_priority: u8) -> Self {
        self.base_priority = base_priority;
        self
    }

    pub fn with_urgency(mut self, multiplier: f64) -> Self {
        self.urgency_multiplier = multiplier;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_deadline_flexibility(mut self, minutes: i64) -> Self {
        self.deadline_flexibility_minutes = minutes;
        self
    }

    pub fn with_split(mut self, can_be_split: bool) -> Self {
        self.can_be_split = can_be_split;
        self
    }

    pub fn with_consecutive_time(mut self, required: bool) -> Self {
        self.requires_consecutive_time = required;
        self
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_preferred_hours(mut self, hours: impl IntoIterator<Item = u32>) -> Self {
        self.preferred_time_of_day = hours.into_iter().collect();
        self
    }

    pub fn with_avoided_hours(mut self, hours: impl IntoIterator<Item = u32>) -> Self {
        self.avoid_time_of_day = hours.into_iter().collect();
        self
    }

    pub fn category_weight(&self) -> f64 {
        self.category
            .as_ref()
            .map_or(DEFAULT_CATEGORY_WEIGHT, |c| c.category_weight)
    }

    /// Check field ranges and cross-field invariants. Collects every problem.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |kind, message: String| {
            errors.push(ValidationError::new(format!("task {}", self.id), kind, message));
        };

        if self.id.trim().is_empty() {
            push(ValidationErrorKind::MissingField, "id must be non-empty".to_string());
        }
        if self.estimated_duration_minutes <= 0 {
            push(
                ValidationErrorKind::NonPositiveDuration,
                format!(
                    "estimated_duration_minutes must be > 0 (got {})",
                    self.estimated_duration_minutes
                ),
            );
        }
        if let Some(min) = self.minimum_duration_minutes {
            if min > self.estimated_duration_minutes {
                push(
                    ValidationErrorKind::InconsistentBounds,
                    format!(
                        "minimum_duration_minutes {min} exceeds estimate {}",
                        self.estimated_duration_minutes
                    ),
                );
            }
        }
        if let Some(max) = self.maximum_duration_minutes {
            if max < self.estimated_duration_minutes {
                push(
                    ValidationErrorKind::InconsistentBounds,
                    format!(
                        "maximum_duration_minutes {max} is below estimate {}",
                        self.estimated_duration_minutes
                    ),
                );
            }
        }
        if !(1..=5).contains(&self.base_priority) {
            push(
                ValidationErrorKind::OutOfRange,
                format!("base_priority must be 1-5 (got {})", self.base_priority),
            );
        }
        if !(0.5..=3.0).contains(&self.urgency_multiplier) {
            push(
                ValidationErrorKind::OutOfRange,
                format!(
                    "urgency_multiplier must be 0.5-3.0 (got {})",
                    self.urgency_multiplier
                ),
            );
        }
        if self.deadline_flexibility_minutes < 0 {
            push(
                ValidationErrorKind::OutOfRange,
                format!(
                    "deadline_flexibility_minutes must be >= 0 (got {})",
                    self.deadline_flexibility_minutes
                ),
            );
        }
        if let Some(cat) = &self.category {
            if !cat.category_weight.is_finite() || cat.category_weight <= 0.0 {
                push(
                    ValidationErrorKind::OutOfRange,
                    format!(
                        "category '{}' weight must be positive (got {})",
                        cat.name, cat.category_weight
                    ),
                );
            }
        }
        for hour in self
            .preferred_time_of_day
            .iter()
            .chain(self.avoid_time_of_day.iter())
        {
            if *hour > 23 {
                push(
                    ValidationErrorKind::OutOfRange,
                    format!("hour of day must be 0-23 (got {hour})"),
                );
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let t = Task::new("t1", "write report");
        assert!(t.validate().is_empty());
        assert_eq!(t.category_weight(), 1.0);
    }

    #[test]
    fn category_weight_defaults_when_absent_from_json() {
        let json = r#"{"name":"work"}"#;
        let cat: TaskCategory = serde_json::from_str(json).unwrap();
        assert_eq!(cat.category_weight, 1.0);

        let t = Task::new("t1", "x").with_category(TaskCategory::new("deep").with_weight(1.5));
        assert_eq!(t.category_weight(), 1.5);
    }

    #[test]
    fn rejects_non_positive_duration() {
        let errs = Task::new("t1", "x").with_duration(0).validate();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValidationErrorKind::NonPositiveDuration);
    }

    #[test]
    fn rejects_inconsistent_duration_bounds() {
        let errs = Task::new("t1", "x")
            .with_duration(60)
            .with_duration_bounds(Some(90), Some(30))
            .validate();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().all(|e| e.kind == ValidationErrorKind::InconsistentBounds));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let errs = Task::new("t1", "x")
            .with_priority(9)
            .with_urgency(4.0)
            .with_preferred_hours([25])
            .validate();
        assert_eq!(errs.len(), 3);
        assert!(errs.iter().all(|e| e.kind == ValidationErrorKind::OutOfRange));
    }

    #[test]
    fn deserializes_with_optional_fields_missing() {
        let json = r#"{
            "id": "t9",
            "name": "gym",
            "estimated_duration_minutes": 45,
            "base_priority": 2,
            "urgency_multiplier": 1.2,
            "can_be_split": false
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert!(t.deadline.is_none());
        assert!(t.preferred_time_of_day.is_empty());
        assert_eq!(t.deadline_flexibility_minutes, 0);
        assert!(t.validate().is_empty());
    }
}
