use chrono::{DateTime, Utc};
use slotwise_core::{RunReport, ScheduleDecision};

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

impl CalendarEvent {
    fn from_decision(run_id: &str, d: &ScheduleDecision) -> Self {
        Self {
            uid: format!("{run_id}-{}@slotwise", d.task_id),
            start_utc: d.scheduled_start,
            end_utc: d.scheduled_end,
            summary: d.task_name.clone(),
            description: format!(
                "TaskId: {}\nBlock: {}\nPriority: {:.2}\nConfidence: {:.2}\n{}\n",
                d.task_id, d.block_id, d.priority_score, d.confidence_level, d.reason
            ),
        }
    }
}

/// One event per placement in the run.
pub fn report_to_events(report: &RunReport) -> Vec<CalendarEvent> {
    report
        .decisions
        .iter()
        .map(|d| CalendarEvent::from_decision(&report.run.id, d))
        .collect()
}

/// Emit a minimal ICS calendar containing VEVENT blocks.
///
/// DTSTART/DTEND are UTC.
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Slotwise//EN\n");

    for e in events {
        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTART:{}\n", e.start_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("DTEND:{}\n", e.end_utc.format("%Y%m%dT%H%M%SZ")));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
