//! Plan files: the user-facing JSON a run is loaded from.
//!
//! Deadlines are local wall-clock strings and hour preferences are "HH:MM",
//! both resolved in the plan's timezone (or the configured one).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use slotwise_core::time::{parse_hour_of_day, parse_local_deadline_to_utc};
use slotwise_core::{Task, TaskCategory, TimeBlock};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    pub timezone: Option<String>,
    pub tasks: Vec<TaskSpec>,
    /// Absent means "generate from working hours".
    #[serde(default)]
    pub blocks: Option<Vec<TimeBlock>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub name: String,
    #[serde(default = "default_duration")]
    pub estimated_duration_minutes: i64,
    #[serde(default)]
    pub minimum_duration_minutes: Option<i64>,
    #[serde(default)]
    pub maximum_duration_minutes: Option<i64>,
    #[serde(default = "default_priority")]
    pub base_priority: u8,
    #[serde(default = "default_urgency")]
    pub urgency_multiplier: f64,
    /// "YYYY-MM-DD HH:MM", local
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub deadline_flexibility_minutes: i64,
    #[serde(default = "default_true")]
    pub can_be_split: bool,
    #[serde(default)]
    pub requires_consecutive_time: bool,
    #[serde(default)]
    pub category: Option<TaskCategory>,
    #[serde(default)]
    pub preferred_time_of_day: Vec<String>,
    #[serde(default)]
    pub avoid_time_of_day: Vec<String>,
}

fn default_duration() -> i64 {
    60
}

fn default_priority() -> u8 {
    3
}

fn default_urgency() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl TaskSpec {
    pub fn into_task(self, tz: &str) -> Result<Task> {
        let context = || format!("task {}", self.id);

        let preferred = self
            .preferred_time_of_day
            .iter()
            .map(|s| parse_hour_of_day(s))
            .collect::<Result<Vec<_>, _>>()
            .with_context(context)?;
        let avoided = self
            .avoid_time_of_day
            .iter()
            .map(|s| parse_hour_of_day(s))
            .collect::<Result<Vec<_>, _>>()
            .with_context(context)?;

        let mut task = Task::new(self.id.clone(), self.name.clone())
            .with_duration(self.estimated_duration_minutes)
            .with_duration_bounds(self.minimum_duration_minutes, self.maximum_duration_minutes)
            .with_priority(self.base_priority)
            .with_urgency(self.urgency_multiplier)
            .with_deadline_flexibility(self.deadline_flexibility_minutes)
            .with_split(self.can_be_split)
            .with_consecutive_time(self.requires_consecutive_time)
            .with_preferred_hours(preferred)
            .with_avoided_hours(avoided);

        if let Some(local) = &self.deadline {
            let deadline = parse_local_deadline_to_utc(local, tz).with_context(context)?;
            task = task.with_deadline(deadline);
        }
        if let Some(category) = self.category {
            task = task.with_category(category);
        }

        Ok(task)
    }
}

pub fn load_plan(path: &Path) -> Result<PlanFile> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_plan(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_plan(s: &str) -> Result<PlanFile> {
    Ok(serde_json::from_str(s)?)
}
