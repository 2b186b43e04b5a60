use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use slotwise_core::time::parse_timezone;
use slotwise_core::{
    Algorithm, EngineConfig, RunReport, SchedulingEngine, SystemClock, Task, TimeBlock,
    generate_time_blocks, recommend,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod calendar;
mod config;
mod input;
mod state;
mod summary;

use config::Config;

const DEFAULT_LOG_FILTER: &str = "slotwise=info";

#[derive(Parser, Debug)]
#[command(
    name = "slotwise",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLOTWISE_BUILD_SHA"), ")"),
    about = "Deadline- and priority-aware task placement"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Schedule a plan file with one algorithm
    Run {
        /// Plan file (JSON)
        #[arg(long)]
        input: PathBuf,

        /// edf, hpf or hybrid (default: schedule.default_algorithm from config)
        #[arg(long)]
        algorithm: Option<Algorithm>,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Also write placements to an ICS calendar file
        #[arg(long)]
        ics: Option<PathBuf>,
    },

    /// Run EDF, HPF and hybrid side by side on the same plan
    Compare {
        #[arg(long)]
        input: PathBuf,
    },

    /// Print availability blocks generated from working hours
    Blocks {
        /// Horizon in days (default: schedule.horizon_days from config)
        #[arg(long)]
        days: Option<u32>,

        /// First local date (default: today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.slotwise/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

/// A plan resolved against config: UTC tasks, blocks, and the zone they were read in.
struct Prepared {
    tz: Tz,
    tasks: Vec<Task>,
    blocks: Vec<TimeBlock>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            algorithm,
            json,
            ics,
        } => {
            let cfg = config::load_config()?;
            let algorithm = match algorithm {
                Some(a) => a,
                None => cfg.schedule.algorithm()?,
            };
            let prepared = prepare(&cfg, &input)?;
            let report = engine(prepared.tz)
                .run(algorithm, &prepared.tasks, &prepared.blocks)
                .with_context(|| format!("scheduling {}", input.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let recs = recommend(&report, &prepared.tasks, prepared.tz);
                print!("{}", summary::render_report(&report, prepared.tz, &recs));
            }

            if let Some(path) = ics {
                write_ics(&report, &path)?;
            }
            if !report.is_success() {
                bail!(
                    "run {} failed: {}",
                    report.run.id,
                    report.run.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }

        Command::Compare { input } => {
            let cfg = config::load_config()?;
            compare(&cfg, &input).await?;
        }

        Command::Blocks { days, from, json } => {
            let cfg = config::load_config()?;
            let tz = cfg.schedule.tz()?;
            let prefs = cfg.working_hours.to_prefs()?;
            let from = from.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
            let days = days.unwrap_or(cfg.schedule.horizon_days);

            let blocks = generate_time_blocks(&prefs, tz, from, days);
            if json {
                println!("{}", serde_json::to_string_pretty(&blocks)?);
            } else {
                print!("{}", summary::render_blocks(&blocks, tz));
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}\n", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise engine and CLI log at info.
fn log_filter() -> EnvFilter {
    log_filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn log_filter_from(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn engine(tz: Tz) -> SchedulingEngine<SystemClock> {
    SchedulingEngine::with_config(
        SystemClock,
        EngineConfig {
            timezone: tz,
            ..EngineConfig::default()
        },
    )
}

fn prepare(cfg: &Config, input: &Path) -> Result<Prepared> {
    let plan = input::load_plan(input)?;
    let tz_name = plan
        .timezone
        .clone()
        .unwrap_or_else(|| cfg.schedule.timezone.clone());
    let tz = parse_timezone(&tz_name).context("plan timezone")?;

    let tasks = plan
        .tasks
        .into_iter()
        .map(|spec| spec.into_task(&tz_name))
        .collect::<Result<Vec<_>>>()?;

    let blocks = match plan.blocks {
        Some(blocks) => blocks,
        None => {
            let prefs = cfg.working_hours.to_prefs()?;
            let today = Utc::now().with_timezone(&tz).date_naive();
            let blocks = generate_time_blocks(&prefs, tz, today, cfg.schedule.horizon_days);
            info!(
                count = blocks.len(),
                days = cfg.schedule.horizon_days,
                "generated blocks from working hours"
            );
            blocks
        }
    };

    Ok(Prepared { tz, tasks, blocks })
}

/// All runs share the parsed inputs read-only; each builds its own allocator.
async fn compare(cfg: &Config, input: &Path) -> Result<()> {
    let prepared = prepare(cfg, input)?;
    let tz = prepared.tz;
    let tasks = Arc::new(prepared.tasks);
    let blocks = Arc::new(prepared.blocks);
    let engine = Arc::new(engine(tz));

    let spawn = |algorithm: Algorithm| {
        let (tasks, blocks, engine) = (tasks.clone(), blocks.clone(), engine.clone());
        tokio::task::spawn_blocking(move || engine.run(algorithm, &tasks, &blocks))
    };
    let (edf, hpf, hybrid) = tokio::try_join!(
        spawn(Algorithm::Edf),
        spawn(Algorithm::Hpf),
        spawn(Algorithm::Hybrid)
    )
    .context("joining scheduling runs")?;
    let reports = [edf?, hpf?, hybrid?];

    for report in &reports {
        let recs = recommend(report, &tasks, tz);
        println!("{}", summary::render_report(report, tz, &recs));
    }
    print!("{}", summary::render_comparison(&reports, &tasks, tz));

    Ok(())
}

fn write_ics(report: &RunReport, path: &Path) -> Result<()> {
    let events = calendar::report_to_events(report);
    let ics = calendar::events_to_ics(&events);
    fs::write(path, ics).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), events = events.len(), "wrote calendar");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_default_filter() {
        let filter = log_filter_from(Some("slotwise=debug")).to_string();
        assert!(filter.contains("slotwise=debug"), "{filter}");
        assert!(!filter.contains("slotwise=info"), "{filter}");
    }

    #[test]
    fn default_filter_when_rust_log_unset_or_blank() {
        assert_eq!(log_filter_from(None).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter_from(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
    }
}
