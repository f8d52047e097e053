//! Plain-text rendering of session state and reports.

use std::fmt::Write;

use classroom_core::model::{CompletionSummary, Presence, View};
use classroom_core::report::{DashboardOverview, DayCell, MonthlyReport, RateTier, SessionRow};
use services::{AttendanceView, SessionSnapshot};

fn percent(rate: Option<u32>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| format!("{rate}%"))
}

fn tier(tier: Option<RateTier>) -> &'static str {
    tier.map_or("-", RateTier::as_str)
}

fn presence_mark(status: Presence) -> &'static str {
    match status {
        Presence::Unmarked => "[ ]",
        Presence::Present => "[P]",
        Presence::Absent => "[A]",
    }
}

fn day_mark(cell: DayCell) -> char {
    match cell {
        DayCell::Present => 'P',
        DayCell::Absent => 'A',
        DayCell::NoRecord => '-',
    }
}

#[must_use]
pub fn snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", snapshot.view);
    match snapshot.view {
        View::LoggedOut => out.push_str("Type `login` to begin.\n"),
        View::Capturing if snapshot.capture_pending => out.push_str("Capturing...\n"),
        View::Capturing => {
            out.push_str("Take the class photo: `capture [path]`, or `skip` to mark without one.\n");
        }
        View::Marking => {
            match &snapshot.captured_photo {
                Some(photo) => {
                    let _ = writeln!(out, "Photo: {photo}");
                }
                None => out.push_str("Photo: none\n"),
            }
            if let Some(attendance) = &snapshot.attendance {
                out.push_str(&attendance_grid(attendance));
            }
        }
        View::Dashboard | View::Reports => {}
    }
    out
}

#[must_use]
pub fn attendance_grid(attendance: &AttendanceView) -> String {
    let mut out = String::new();
    for student in &attendance.students {
        let _ = writeln!(
            out,
            "  {} {:>3}  {}",
            presence_mark(student.status),
            student.id,
            student.name
        );
    }
    let _ = writeln!(
        out,
        "Present: {}  Absent: {}  Total: {}",
        attendance.present, attendance.absent, attendance.total
    );
    out
}

fn session_line(out: &mut String, row: &SessionRow) {
    let _ = writeln!(
        out,
        "  {}  {:>3}/{:<3} present  {:>4}  {}",
        row.date,
        row.present,
        row.total,
        percent(row.rate),
        tier(row.tier)
    );
}

#[must_use]
pub fn dashboard(teacher: &str, overview: &DashboardOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Welcome, {teacher}. Students: {}", overview.total_students);
    match &overview.today {
        Some(today) => {
            let _ = writeln!(
                out,
                "Today: {} present, {} absent, rate {}",
                today.present,
                today.absent,
                percent(today.rate)
            );
        }
        None => out.push_str("Today: no attendance taken yet\n"),
    }
    if !overview.recent.is_empty() {
        out.push_str("Recent sessions:\n");
        for row in &overview.recent {
            session_line(&mut out, row);
        }
    }
    out
}

#[must_use]
pub fn monthly_report(report: &MonthlyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Report {}: {} students, average {}, {} days",
        report.month,
        report.total_students,
        percent(report.average_attendance),
        report.days_tracked()
    );
    let header: String = report
        .days
        .iter()
        .map(|day| format!("{:>3}", day.format("%d")))
        .collect();
    let _ = writeln!(out, "Roll  {:<20}{header}    %", "Name");
    for row in &report.rows {
        let cells: String = row.cells.iter().map(|cell| format!("{:>3}", day_mark(*cell))).collect();
        let _ = writeln!(
            out,
            "{:<5} {:<20}{cells} {:>4} {}",
            row.roll_number,
            row.name,
            percent(row.percentage),
            tier(row.tier)
        );
    }
    out
}

#[must_use]
pub fn completion(summary: &CompletionSummary) -> String {
    format!("Attendance submitted: {summary}")
}
