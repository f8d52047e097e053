//! Sample class used by the demo binary and by tests.

use chrono::NaiveDate;
use classroom_core::Error;
use classroom_core::model::{HistoricalSession, Roster, Student, StudentHistory, StudentId};

const SAMPLE_NAMES: [&str; 12] = [
    "Emma Johnson",
    "Liam Smith",
    "Olivia Brown",
    "Noah Davis",
    "Ava Wilson",
    "William Garcia",
    "Sophia Martinez",
    "James Anderson",
    "Isabella Taylor",
    "Benjamin Thomas",
    "Mia Hernandez",
    "Lucas Moore",
];

/// Presence on 2024-01-15 down to 2024-01-08 for the first six students.
const SAMPLE_MONTH: [[bool; 8]; 6] = [
    [true, true, true, false, true, true, true, true],
    [true, false, true, true, false, true, true, true],
    [false, true, true, true, true, true, false, true],
    [true, true, true, true, true, false, true, true],
    [true, true, false, false, true, true, true, false],
    [false, true, true, true, true, true, true, true],
];

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default()
}

/// Twelve students with ids `1..=12`.
///
/// # Errors
///
/// Returns `Error::Roster` if a name or id is invalid.
pub fn sample_roster() -> Result<Roster, Error> {
    let students = SAMPLE_NAMES
        .iter()
        .zip(1_u64..)
        .map(|(name, id)| Student::new(StudentId::new(id), *name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Roster::new(students)?)
}

/// The four most recent sessions before the demo day.
///
/// # Errors
///
/// Returns `Error::HistoricalSession` if a count is inconsistent.
pub fn sample_sessions() -> Result<Vec<HistoricalSession>, Error> {
    [(12, 9), (13, 12), (14, 10), (15, 11)]
        .into_iter()
        .map(|(day, present)| HistoricalSession::new(jan(day), present, 12).map_err(Error::from))
        .collect()
}

/// Day-by-day January history for students 1 to 6.
#[must_use]
pub fn sample_histories() -> Vec<StudentHistory> {
    SAMPLE_MONTH
        .iter()
        .zip(SAMPLE_NAMES.iter().zip(1_u64..))
        .map(|(flags, (name, id))| {
            StudentHistory::new(StudentId::new(id), *name).with_entries(
                flags
                    .iter()
                    .zip((8..=15).rev())
                    .map(|(present, day)| (jan(day), *present)),
            )
        })
        .collect()
}
