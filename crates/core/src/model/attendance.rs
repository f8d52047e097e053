use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::ids::StudentId;
use crate::model::session::CompletionSummary;
use crate::model::student::Roster;

/// Display status of a single student during marking.
///
/// `Unmarked` is never stored: it is the absence of an entry in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Unmarked,
    Present,
    Absent,
}

impl Presence {
    fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => Self::Unmarked,
            Some(true) => Self::Present,
            Some(false) => Self::Absent,
        }
    }
}

/// In-progress attendance for one marking pass.
///
/// Maps student id to a presence flag. Entries are created lazily, so a
/// student without an entry is unmarked. Only ids from the roster the record
/// was opened against can ever gain an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    roster: Arc<Roster>,
    marks: BTreeMap<StudentId, bool>,
}

impl AttendanceRecord {
    /// Opens an empty record for the given roster.
    #[must_use]
    pub fn new(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            marks: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Flips the flag for a student. The first toggle marks present.
    ///
    /// Returns the new status, or `None` when the id is not on the roster
    /// (the record is left untouched).
    pub fn toggle(&mut self, id: StudentId) -> Option<Presence> {
        if !self.roster.contains(id) {
            return None;
        }
        let flag = self.marks.entry(id).or_insert(false);
        *flag = !*flag;
        Some(Presence::from_flag(Some(*flag)))
    }

    /// Marks every roster student present, overwriting prior marks.
    pub fn mark_all_present(&mut self) {
        self.marks = self.roster.ids().map(|id| (id, true)).collect();
    }

    /// Removes every entry; all students return to unmarked.
    pub fn clear_all(&mut self) {
        self.marks.clear();
    }

    #[must_use]
    pub fn status(&self, id: StudentId) -> Presence {
        Presence::from_flag(self.marks.get(&id).copied())
    }

    #[must_use]
    pub fn flag(&self, id: StudentId) -> Option<bool> {
        self.marks.get(&id).copied()
    }

    #[must_use]
    pub fn present_count(&self) -> usize {
        self.marks.values().filter(|present| **present).count()
    }

    /// Roster size minus present. Unmarked students count as absent here.
    #[must_use]
    pub fn absent_count(&self) -> usize {
        self.roster.len().saturating_sub(self.present_count())
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.roster.len()
    }

    /// Entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = (StudentId, bool)> + '_ {
        self.marks.iter().map(|(id, flag)| (*id, *flag))
    }

    /// Freezes the current marks into the completion summary.
    #[must_use]
    pub fn summary(&self) -> CompletionSummary {
        CompletionSummary::new(
            u32::try_from(self.present_count()).unwrap_or(u32::MAX),
            u32::try_from(self.total()).unwrap_or(u32::MAX),
        )
    }
}
