use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::StudentId;
use crate::report::percentage;

/// Dated presence flags for one student across past sessions.
///
/// Days without an entry were not tracked for this student; they are neither
/// present nor absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentHistory {
    student_id: StudentId,
    name: String,
    attendance: BTreeMap<NaiveDate, bool>,
}

impl StudentHistory {
    #[must_use]
    pub fn new(student_id: StudentId, name: impl Into<String>) -> Self {
        Self {
            student_id,
            name: name.into(),
            attendance: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_entries(mut self, entries: impl IntoIterator<Item = (NaiveDate, bool)>) -> Self {
        self.attendance.extend(entries);
        self
    }

    /// Updates the display name, keeping the recorded days.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Drops the flag for a day, if any.
    pub fn forget(&mut self, date: NaiveDate) {
        self.attendance.remove(&date);
    }

    /// Records presence for a day, replacing any earlier flag for that day.
    pub fn record(&mut self, date: NaiveDate, present: bool) {
        self.attendance.insert(date, present);
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn on(&self, date: NaiveDate) -> Option<bool> {
        self.attendance.get(&date).copied()
    }

    /// Entries in ascending date order.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, bool)> + '_ {
        self.attendance.iter().map(|(date, present)| (*date, *present))
    }

    #[must_use]
    pub fn days_tracked(&self) -> usize {
        self.attendance.len()
    }

    /// Percentage over every tracked day.
    #[must_use]
    pub fn overall_percentage(&self) -> Option<u32> {
        let present = self.attendance.values().filter(|p| **p).count();
        percentage(
            u32::try_from(present).unwrap_or(u32::MAX),
            u32::try_from(self.attendance.len()).unwrap_or(u32::MAX),
        )
    }
}
