use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::report::percentage;

//
// ─── VIEW ──────────────────────────────────────────────────────────────────────
//

/// The screen the session is currently on. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    LoggedOut,
    Dashboard,
    Capturing,
    Marking,
    Reports,
}

impl View {
    /// Views reachable through explicit menu navigation.
    pub const NAVIGABLE: [View; 4] = [
        View::Dashboard,
        View::Capturing,
        View::Marking,
        View::Reports,
    ];

    #[must_use]
    pub fn is_logged_in(self) -> bool {
        !matches!(self, View::LoggedOut)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            View::LoggedOut => "logged_out",
            View::Dashboard => "dashboard",
            View::Capturing => "capturing",
            View::Marking => "marking",
            View::Reports => "reports",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown view: {0}")]
pub struct ParseViewError(String);

impl FromStr for View {
    type Err = ParseViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logged_out" | "login" => Ok(View::LoggedOut),
            "dashboard" | "home" => Ok(View::Dashboard),
            "capturing" | "capture" | "camera" => Ok(View::Capturing),
            "marking" | "mark" | "students" => Ok(View::Marking),
            "reports" | "report" => Ok(View::Reports),
            other => Err(ParseViewError(other.to_string())),
        }
    }
}

//
// ─── COMPLETION SUMMARY ────────────────────────────────────────────────────────
//

/// Counts reported when a marking pass is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub present: u32,
    pub total: u32,
}

impl CompletionSummary {
    #[must_use]
    pub fn new(present: u32, total: u32) -> Self {
        Self { present, total }
    }

    #[must_use]
    pub fn absent(&self) -> u32 {
        self.total.saturating_sub(self.present)
    }

    /// Rounded present percentage, `None` for an empty roster.
    #[must_use]
    pub fn rate(&self) -> Option<u32> {
        percentage(self.present, self.total)
    }
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} students marked present.", self.present, self.total)
    }
}

//
// ─── HISTORICAL SESSION ────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HistoricalSessionError {
    #[error("present count ({present}) exceeds total count ({total})")]
    PresentExceedsTotal { present: u32, total: u32 },
}

/// Immutable summary of a completed attendance session, used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HistoricalSessionRaw")]
pub struct HistoricalSession {
    date: NaiveDate,
    present_count: u32,
    total_count: u32,
}

#[derive(Deserialize)]
struct HistoricalSessionRaw {
    date: NaiveDate,
    present_count: u32,
    total_count: u32,
}

impl TryFrom<HistoricalSessionRaw> for HistoricalSession {
    type Error = HistoricalSessionError;

    fn try_from(raw: HistoricalSessionRaw) -> Result<Self, Self::Error> {
        Self::new(raw.date, raw.present_count, raw.total_count)
    }
}

impl HistoricalSession {
    /// # Errors
    ///
    /// Returns `HistoricalSessionError::PresentExceedsTotal` if `present_count > total_count`.
    pub fn new(
        date: NaiveDate,
        present_count: u32,
        total_count: u32,
    ) -> Result<Self, HistoricalSessionError> {
        if present_count > total_count {
            return Err(HistoricalSessionError::PresentExceedsTotal {
                present: present_count,
                total: total_count,
            });
        }
        Ok(Self {
            date,
            present_count,
            total_count,
        })
    }

    /// Finalizes a completion summary as the session held on `date`.
    #[must_use]
    pub fn from_summary(date: NaiveDate, summary: CompletionSummary) -> Self {
        Self {
            date,
            present_count: summary.present.min(summary.total),
            total_count: summary.total,
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn present_count(&self) -> u32 {
        self.present_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn absent_count(&self) -> u32 {
        self.total_count - self.present_count
    }

    /// `round(present / total * 100)`, `None` when nobody was on the roster.
    #[must_use]
    pub fn rate(&self) -> Option<u32> {
        percentage(self.present_count, self.total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn view_parses_menu_names() {
        assert_eq!("camera".parse::<View>().unwrap(), View::Capturing);
        assert_eq!("Students".parse::<View>().unwrap(), View::Marking);
        assert_eq!("reports".parse::<View>().unwrap(), View::Reports);
        assert!("settings".parse::<View>().is_err());
    }

    #[test]
    fn view_defaults_to_logged_out() {
        assert_eq!(View::default(), View::LoggedOut);
        assert!(!View::LoggedOut.is_logged_in());
        assert!(View::Reports.is_logged_in());
    }

    #[test]
    fn historical_session_rejects_present_over_total() {
        let err = HistoricalSession::new(day(1), 13, 12).unwrap_err();
        assert_eq!(
            err,
            HistoricalSessionError::PresentExceedsTotal {
                present: 13,
                total: 12
            }
        );
    }

    #[test]
    fn historical_session_rate_rounds() {
        let session = HistoricalSession::new(day(15), 11, 12).unwrap();
        assert_eq!(session.rate(), Some(92));
        assert_eq!(session.absent_count(), 1);

        let session = HistoricalSession::new(day(14), 10, 12).unwrap();
        assert_eq!(session.rate(), Some(83));
    }

    #[test]
    fn historical_session_rate_is_none_for_empty_roster() {
        let session = HistoricalSession::new(day(2), 0, 0).unwrap();
        assert_eq!(session.rate(), None);
    }

    #[test]
    fn from_summary_keeps_counts() {
        let session = HistoricalSession::from_summary(day(3), CompletionSummary::new(10, 12));
        assert_eq!(session.present_count(), 10);
        assert_eq!(session.total_count(), 12);
        assert_eq!(session.date(), day(3));
    }

    #[test]
    fn completion_summary_message() {
        let summary = CompletionSummary::new(10, 12);
        assert_eq!(summary.to_string(), "10/12 students marked present.");
        assert_eq!(summary.absent(), 2);
    }
}
