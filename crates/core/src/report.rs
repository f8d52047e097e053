//! Pure attendance aggregation: percentages, averages, month calendars and
//! the derived report tables.
//!
//! Nothing here performs IO or holds state; callers hand in the historical
//! data they want aggregated.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{HistoricalSession, StudentHistory, StudentId, TierThresholds};

//
// ─── PERCENTAGES ───────────────────────────────────────────────────────────────
//

/// `round(part / whole * 100)` with halves rounded up, `None` when `whole == 0`.
#[must_use]
pub fn percentage(part: u32, whole: u32) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    let rounded = (200 * part + whole) / (2 * whole);
    Some(u32::try_from(rounded).unwrap_or(u32::MAX))
}

/// Attendance percentage for one student over the queried days.
///
/// Only days the student has an entry for count toward the denominator; a
/// missing day is untracked, not absent. `None` when no queried day is tracked.
#[must_use]
pub fn attendance_percentage(history: &StudentHistory, days: &[NaiveDate]) -> Option<u32> {
    let mut tracked = 0_u32;
    let mut present = 0_u32;
    for day in days {
        if let Some(flag) = history.on(*day) {
            tracked = tracked.saturating_add(1);
            if flag {
                present = present.saturating_add(1);
            }
        }
    }
    percentage(present, tracked)
}

/// Rounded arithmetic mean of the defined percentages.
///
/// Students without any tracked day (`None`) are left out. Returns `None`
/// when nothing is left, e.g. for an empty roster.
#[must_use]
pub fn average_attendance(percentages: impl IntoIterator<Item = Option<u32>>) -> Option<u32> {
    let (sum, count) = percentages
        .into_iter()
        .flatten()
        .fold((0_u64, 0_u64), |(sum, count), pct| {
            (sum + u64::from(pct), count + 1)
        });
    if count == 0 {
        return None;
    }
    let rounded = (2 * sum + count) / (2 * count);
    Some(u32::try_from(rounded).unwrap_or(u32::MAX))
}

//
// ─── RATE TIERS ────────────────────────────────────────────────────────────────
//

/// Presentation tier for an attendance rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    High,
    Medium,
    Low,
}

impl RateTier {
    #[must_use]
    pub fn classify(rate: u32, thresholds: &TierThresholds) -> Self {
        if rate >= thresholds.high() {
            Self::High
        } else if rate >= thresholds.medium() {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── MONTHS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MonthKeyError {
    #[error("month key must look like YYYY-MM, got {0:?}")]
    Malformed(String),

    #[error("month out of range: {0}")]
    InvalidMonth(u32),

    #[error("year out of range: {0}")]
    InvalidYear(i32),
}

/// A calendar year-month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// # Errors
    ///
    /// Returns `MonthKeyError::InvalidMonth` unless `1 <= month <= 12`, and
    /// `MonthKeyError::InvalidYear` for years the calendar cannot represent.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::InvalidMonth(month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(MonthKeyError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn month(&self) -> u32 {
        self.month
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Number of days in this month (28..=31).
    #[must_use]
    pub fn len_days(&self) -> u32 {
        (28..=31)
            .rev()
            .find(|day| NaiveDate::from_ymd_opt(self.year, self.month, *day).is_some())
            .unwrap_or(28)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MonthKeyError::Malformed(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let month = month.parse::<u32>().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

/// Calendar days of `month`, keeping at most the first `limit`, latest first.
#[must_use]
pub fn days_in_range(month: MonthKey, limit: u32) -> Vec<NaiveDate> {
    let last = month.len_days().min(limit);
    (1..=last)
        .rev()
        .filter_map(|day| NaiveDate::from_ymd_opt(month.year, month.month, day))
        .collect()
}

/// Months that have any recorded attendance, latest first.
#[must_use]
pub fn available_months(sessions: &[HistoricalSession], histories: &[StudentHistory]) -> Vec<MonthKey> {
    let months: BTreeSet<MonthKey> = sessions
        .iter()
        .map(HistoricalSession::date)
        .chain(histories.iter().flat_map(|h| h.entries().map(|(date, _)| date)))
        .map(MonthKey::of)
        .collect();
    months.into_iter().rev().collect()
}

//
// ─── MONTHLY REPORT ────────────────────────────────────────────────────────────
//

/// One cell of the day-by-day table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCell {
    Present,
    Absent,
    NoRecord,
}

impl From<Option<bool>> for DayCell {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Present,
            Some(false) => Self::Absent,
            None => Self::NoRecord,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentReportRow {
    pub student_id: StudentId,
    pub roll_number: String,
    pub name: String,
    /// Same order as `MonthlyReport::days`.
    pub cells: Vec<DayCell>,
    pub percentage: Option<u32>,
    pub tier: Option<RateTier>,
}

/// Day-wise attendance table for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub month: MonthKey,
    /// Latest first.
    pub days: Vec<NaiveDate>,
    pub rows: Vec<StudentReportRow>,
    pub total_students: u32,
    pub average_attendance: Option<u32>,
}

impl MonthlyReport {
    #[must_use]
    pub fn build(
        month: MonthKey,
        histories: &[StudentHistory],
        day_limit: u32,
        thresholds: &TierThresholds,
    ) -> Self {
        let days = days_in_range(month, day_limit);
        let rows: Vec<StudentReportRow> = histories
            .iter()
            .map(|history| {
                let percentage = attendance_percentage(history, &days);
                StudentReportRow {
                    student_id: history.student_id(),
                    roll_number: history.student_id().roll_number(),
                    name: history.name().to_string(),
                    cells: days.iter().map(|day| DayCell::from(history.on(*day))).collect(),
                    percentage,
                    tier: percentage.map(|rate| RateTier::classify(rate, thresholds)),
                }
            })
            .collect();
        let average_attendance = average_attendance(rows.iter().map(|row| row.percentage));

        Self {
            month,
            total_students: u32::try_from(rows.len()).unwrap_or(u32::MAX),
            days,
            rows,
            average_attendance,
        }
    }

    #[must_use]
    pub fn days_tracked(&self) -> usize {
        self.days.len()
    }
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

/// A historical session with its derived rate and tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub date: NaiveDate,
    pub present: u32,
    pub absent: u32,
    pub total: u32,
    pub rate: Option<u32>,
    pub tier: Option<RateTier>,
}

impl SessionRow {
    #[must_use]
    pub fn from_session(session: &HistoricalSession, thresholds: &TierThresholds) -> Self {
        let rate = session.rate();
        Self {
            date: session.date(),
            present: session.present_count(),
            absent: session.absent_count(),
            total: session.total_count(),
            rate,
            tier: rate.map(|rate| RateTier::classify(rate, thresholds)),
        }
    }
}

/// Figures shown on the dashboard after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub total_students: u32,
    /// The latest session held on the reference day, if any.
    pub today: Option<SessionRow>,
    /// Latest first.
    pub recent: Vec<SessionRow>,
}

impl DashboardOverview {
    #[must_use]
    pub fn build(
        sessions: &[HistoricalSession],
        today: NaiveDate,
        roster_size: usize,
        recent_limit: usize,
        thresholds: &TierThresholds,
    ) -> Self {
        // Stable sort keeps insertion order for sessions on the same day.
        let mut ordered: Vec<&HistoricalSession> = sessions.iter().collect();
        ordered.sort_by_key(|session| session.date());

        let today_row = ordered
            .iter()
            .rev()
            .find(|session| session.date() == today)
            .map(|session| SessionRow::from_session(session, thresholds));
        let recent = ordered
            .iter()
            .rev()
            .take(recent_limit)
            .map(|session| SessionRow::from_session(session, thresholds))
            .collect();

        Self {
            total_students: u32::try_from(roster_size).unwrap_or(u32::MAX),
            today: today_row,
            recent,
        }
    }
}
