//! Human-readable rendering of run reports.

use chrono_tz::Tz;
use slotwise_core::{Recommendation, RunReport, Task, TimeBlock};
use std::fmt::Write;

pub fn render_report(report: &RunReport, tz: Tz, recommendations: &[Recommendation]) -> String {
    let run = &report.run;
    let mut s = String::new();

    let _ = writeln!(s, "# {} run {} ({:?})\n", run.algorithm, run.id, run.status);
    if let Some(err) = &run.error_message {
        let _ = writeln!(s, "error: {err}\n");
    }

    let _ = writeln!(
        s,
        "scheduled {}/{} tasks into {} available blocks ({:.1}%), {} ms",
        run.tasks_scheduled,
        run.tasks_considered,
        run.time_blocks_available,
        run.schedule_efficiency_score,
        run.execution_time_ms
    );
    if let (Some(violations), Some(rate)) = (run.deadline_violations, run.deadline_compliance_rate) {
        let _ = writeln!(s, "deadlines already past: {violations} (compliance {rate:.1}%)");
    }
    if let Some(avg) = run.average_priority_score {
        let _ = writeln!(s, "average priority of placed tasks: {avg:.2}");
    }

    if !report.decisions.is_empty() {
        let _ = writeln!(s, "\n## Placements\n");
        for d in &report.decisions {
            let start = d.scheduled_start.with_timezone(&tz);
            let end = d.scheduled_end.with_timezone(&tz);
            let _ = writeln!(
                s,
                "- {} {}-{} | {} | priority={:.2} | block={}",
                start.format("%a %Y-%m-%d"),
                start.format("%H:%M"),
                end.format("%H:%M"),
                d.task_name,
                d.priority_score,
                d.block_id
            );
        }
    }

    if !report.unscheduled.is_empty() {
        let _ = writeln!(s, "\n## Unscheduled\n");
        for id in &report.unscheduled {
            let _ = writeln!(s, "- {id}");
        }
    }

    if !recommendations.is_empty() {
        let _ = writeln!(s, "\n## Recommendations\n");
        for r in recommendations {
            let _ = writeln!(s, "- {r}");
        }
    }

    s
}

/// Side-by-side placement table, one column per run.
pub fn render_comparison(reports: &[RunReport], tasks: &[Task], tz: Tz) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "## Comparison\n");

    let placed: Vec<String> = reports
        .iter()
        .map(|r| format!("{} placed {}", r.run.algorithm, r.run.tasks_scheduled))
        .collect();
    let considered = reports.first().map_or(tasks.len(), |r| r.run.tasks_considered);
    let _ = writeln!(s, "{} of {} tasks", placed.join(" / "), considered);

    for task in tasks {
        let _ = write!(s, "- {:<24}", task.name);
        for r in reports {
            let slot = r.decision_for(&task.id).map_or_else(
                || "-".to_string(),
                |d| d.scheduled_start.with_timezone(&tz).format("%a %H:%M").to_string(),
            );
            let _ = write!(s, " {} {:<10}", r.run.algorithm, slot);
        }
        s.truncate(s.trim_end().len());
        s.push('\n');
    }
    s
}

pub fn render_blocks(blocks: &[TimeBlock], tz: Tz) -> String {
    let mut s = String::new();
    for b in blocks {
        let start = b.start.with_timezone(&tz);
        let end = b.end.with_timezone(&tz);
        let _ = writeln!(
            s,
            "{:<28} {} {}-{} {:?}/{:?}",
            b.id,
            start.format("%a %Y-%m-%d"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            b.status,
            b.block_type
        );
    }
    s
}
