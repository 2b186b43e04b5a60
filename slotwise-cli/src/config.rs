use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slotwise_core::time::{parse_time_of_day, parse_timezone};
use slotwise_core::{Algorithm, WorkingHours};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_slotwise_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub working_hours: WorkingHoursSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// IANA zone used for plan deadlines, hour preferences, and generated blocks.
    pub timezone: String,
    /// "edf", "hpf" or "hybrid"
    pub default_algorithm: String,
    pub horizon_days: u32,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
            default_algorithm: "edf".to_string(),
            horizon_days: 7,
        }
    }
}

impl ScheduleSection {
    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone).context("schedule.timezone")
    }

    pub fn algorithm(&self) -> Result<Algorithm> {
        self.default_algorithm
            .parse()
            .map_err(anyhow::Error::msg)
            .context("schedule.default_algorithm")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingHoursSection {
    /// "HH:MM"
    pub start: String,
    /// "HH:MM"
    pub end: String,
    pub lunch_break_minutes: i64,
    /// 0 = Monday .. 6 = Sunday; empty means every day
    pub work_days: Vec<u32>,
    pub min_task_minutes: Option<i64>,
    pub max_task_minutes: Option<i64>,
}

impl Default for WorkingHoursSection {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            lunch_break_minutes: 60,
            work_days: vec![0, 1, 2, 3, 4],
            min_task_minutes: Some(15),
            max_task_minutes: Some(240),
        }
    }
}

impl WorkingHoursSection {
    pub fn to_prefs(&self) -> Result<WorkingHours> {
        Ok(WorkingHours {
            start: parse_time_of_day(&self.start).context("working_hours.start")?,
            end: parse_time_of_day(&self.end).context("working_hours.end")?,
            lunch_break_minutes: self.lunch_break_minutes,
            work_days: self.work_days.clone(),
            min_task_minutes: self.min_task_minutes,
            max_task_minutes: self.max_task_minutes,
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_slotwise_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [schedule]
            timezone = "Europe/Berlin"

            [working_hours]
            start = "08:30"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.schedule.timezone, "Europe/Berlin");
        assert_eq!(cfg.schedule.horizon_days, 7);
        assert_eq!(cfg.working_hours.end, "17:00");
        assert_eq!(cfg.working_hours.to_prefs().unwrap().start.to_string(), "08:30:00");
    }

    #[test]
    fn default_config_survives_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(toml::from_str::<Config>(&s).unwrap(), cfg);
    }

    #[test]
    fn bad_values_are_reported() {
        let mut cfg = Config::default();
        cfg.schedule.default_algorithm = "fifo".to_string();
        assert!(cfg.schedule.algorithm().is_err());
        cfg.schedule.default_algorithm = "hybrid".to_string();
        assert_eq!(cfg.schedule.algorithm().unwrap(), Algorithm::Hybrid);

        cfg.schedule.timezone = "Mars/Olympus".to_string();
        assert!(cfg.schedule.tz().is_err());

        cfg.working_hours.start = "9am".to_string();
        assert!(cfg.working_hours.to_prefs().is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let p = std::env::temp_dir().join("slotwise-no-such-config.toml");
        assert_eq!(load_config_from(&p).unwrap(), Config::default());
    }
}
