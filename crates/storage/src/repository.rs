use async_trait::async_trait;
use classroom_core::model::{HistoricalSession, Roster, StudentHistory, StudentId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::fixtures;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Storage identifier for a completed session.
pub type SessionRecordId = i64;

/// One student's flag as it was when the session was completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentMark {
    pub student_id: StudentId,
    pub name: String,
    pub present: bool,
}

/// Everything persisted when a marking pass is completed.
///
/// The summary counts and the per-student marks travel together so the
/// dashboard and the monthly table stay consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub session: HistoricalSession,
    pub marks: Vec<StudentMark>,
}

/// A stored historical session with its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalSessionRow {
    pub id: SessionRecordId,
    pub session: HistoricalSession,
}

/// Supplies the class roster.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Load the roster for the class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roster cannot be read.
    async fn load_roster(&self) -> Result<Roster, StorageError>;

    /// Replace the roster used by future sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the roster cannot be stored.
    async fn save_roster(&self, roster: &Roster) -> Result<(), StorageError>;
}

/// Read/append access to completed attendance.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a completed session and fold its marks into student histories.
    ///
    /// One session is kept per day: a later pass on the same date replaces
    /// the earlier session row and its per-student flags. Stored names follow
    /// the names carried by the marks.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn append_session(
        &self,
        completed: &CompletedSession,
    ) -> Result<SessionRecordId, StorageError>;

    /// Fetch a stored session by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_session(&self, id: SessionRecordId) -> Result<HistoricalSession, StorageError>;

    /// List stored sessions in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn list_sessions(&self) -> Result<Vec<HistoricalSessionRow>, StorageError>;

    /// Per-student dated attendance, ordered by student id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn student_histories(&self) -> Result<Vec<StudentHistory>, StorageError>;
}

/// Simple in-memory repository implementation for the demo and for tests.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    roster: Arc<Mutex<Roster>>,
    sessions: Arc<Mutex<Vec<HistoricalSessionRow>>>,
    histories: Arc<Mutex<BTreeMap<StudentId, StudentHistory>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            roster: Arc::new(Mutex::new(roster)),
            ..Self::default()
        }
    }

    /// Repository pre-filled with the sample class and its past attendance.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidData` if the sample data fails validation.
    pub fn with_sample_data() -> Result<Self, StorageError> {
        let invalid = |e: classroom_core::Error| StorageError::InvalidData(e.to_string());
        let repo = Self::with_roster(fixtures::sample_roster().map_err(invalid)?);
        repo.seed(
            fixtures::sample_sessions().map_err(invalid)?,
            fixtures::sample_histories(),
        )?;
        Ok(repo)
    }

    /// Load existing sessions and student histories as-is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if a lock is poisoned.
    pub fn seed(
        &self,
        sessions: Vec<HistoricalSession>,
        histories: Vec<StudentHistory>,
    ) -> Result<(), StorageError> {
        let mut rows = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for session in sessions {
            let id = next_id(&rows);
            rows.push(HistoricalSessionRow { id, session });
        }
        drop(rows);

        let mut guard = self
            .histories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for history in histories {
            guard.insert(history.student_id(), history);
        }
        Ok(())
    }
}

fn next_id(rows: &[HistoricalSessionRow]) -> SessionRecordId {
    rows.last().map_or(1, |row| row.id + 1)
}

#[async_trait]
impl RosterRepository for InMemoryRepository {
    async fn load_roster(&self) -> Result<Roster, StorageError> {
        let guard = self
            .roster
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_roster(&self, roster: &Roster) -> Result<(), StorageError> {
        let mut guard = self
            .roster
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = roster.clone();
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_session(
        &self,
        completed: &CompletedSession,
    ) -> Result<SessionRecordId, StorageError> {
        let mut rows = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut histories = self
            .histories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let date = completed.session.date();
        let id = next_id(&rows);
        let before = rows.len();
        rows.retain(|row| row.session.date() != date);
        if rows.len() != before {
            for history in histories.values_mut() {
                history.forget(date);
            }
        }
        rows.push(HistoricalSessionRow {
            id,
            session: completed.session,
        });

        for mark in &completed.marks {
            let history = histories
                .entry(mark.student_id)
                .or_insert_with(|| StudentHistory::new(mark.student_id, mark.name.clone()));
            if history.name() != mark.name {
                history.rename(mark.name.clone());
            }
            history.record(date, mark.present);
        }
        Ok(id)
    }

    async fn get_session(&self, id: SessionRecordId) -> Result<HistoricalSession, StorageError> {
        let rows = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        rows.iter()
            .find(|row| row.id == id)
            .map(|row| row.session)
            .ok_or(StorageError::NotFound)
    }

    async fn list_sessions(&self) -> Result<Vec<HistoricalSessionRow>, StorageError> {
        let rows = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(rows.clone())
    }

    async fn student_histories(&self) -> Result<Vec<StudentHistory>, StorageError> {
        let guard = self
            .histories
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.values().cloned().collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub roster: Arc<dyn RosterRepository>,
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    /// In-memory storage seeded with the sample class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidData` if the sample data fails validation.
    pub fn sample() -> Result<Self, StorageError> {
        Ok(Self::from_repository(InMemoryRepository::with_sample_data()?))
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let roster: Arc<dyn RosterRepository> = Arc::new(repo.clone());
        let history: Arc<dyn HistoryRepository> = Arc::new(repo);
        Self { roster, history }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use classroom_core::model::Student;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn mark(id: u64, present: bool) -> StudentMark {
        StudentMark {
            student_id: StudentId::new(id),
            name: format!("Student {id}"),
            present,
        }
    }

    #[tokio::test]
    async fn append_session_updates_histories() {
        let repo = InMemoryRepository::new();
        let completed = CompletedSession {
            session: HistoricalSession::new(day(16), 1, 2).unwrap(),
            marks: vec![mark(1, true), mark(2, false)],
        };

        let id = repo.append_session(&completed).await.unwrap();
        assert_eq!(id, 1);
        assert_eq!(repo.get_session(id).await.unwrap(), completed.session);

        let histories = repo.student_histories().await.unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].on(day(16)), Some(true));
        assert_eq!(histories[1].on(day(16)), Some(false));
        assert_eq!(histories[1].name(), "Student 2");
    }

    #[tokio::test]
    async fn ids_increase_in_insertion_order() {
        let repo = InMemoryRepository::new();
        repo.seed(vec![HistoricalSession::new(day(12), 9, 12).unwrap()], Vec::new())
            .unwrap();
        let completed = CompletedSession {
            session: HistoricalSession::new(day(16), 0, 0).unwrap(),
            marks: Vec::new(),
        };
        let id = repo.append_session(&completed).await.unwrap();
        assert_eq!(id, 2);

        let rows = repo.list_sessions().await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn second_pass_on_same_day_replaces_first() {
        let repo = InMemoryRepository::new();
        let everyone = CompletedSession {
            session: HistoricalSession::new(day(16), 3, 3).unwrap(),
            marks: vec![mark(1, true), mark(2, true), mark(3, true)],
        };
        let nobody = CompletedSession {
            session: HistoricalSession::new(day(16), 0, 2).unwrap(),
            marks: vec![mark(1, false), mark(2, false)],
        };
        let first = repo.append_session(&everyone).await.unwrap();
        let second = repo.append_session(&nobody).await.unwrap();
        assert!(second > first);

        let rows = repo.list_sessions().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, second);
        assert_eq!(
            (rows[0].session.present_count(), rows[0].session.total_count()),
            (0, 2)
        );
        assert!(matches!(
            repo.get_session(first).await,
            Err(StorageError::NotFound)
        ));

        let histories = repo.student_histories().await.unwrap();
        let present = histories
            .iter()
            .filter(|h| h.on(day(16)) == Some(true))
            .count();
        assert_eq!(present, 0);
        assert_eq!(histories[2].on(day(16)), None);
    }

    #[tokio::test]
    async fn other_days_survive_a_same_day_replacement() {
        let repo = InMemoryRepository::new();
        for (d, present) in [(15, true), (16, true), (16, false)] {
            let completed = CompletedSession {
                session: HistoricalSession::new(day(d), u32::from(present), 1).unwrap(),
                marks: vec![mark(1, present)],
            };
            repo.append_session(&completed).await.unwrap();
        }
        let rows = repo.list_sessions().await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.session.date()).collect::<Vec<_>>(),
            vec![day(15), day(16)]
        );
        let history = &repo.student_histories().await.unwrap()[0];
        assert_eq!(history.on(day(15)), Some(true));
        assert_eq!(history.on(day(16)), Some(false));
    }

    #[tokio::test]
    async fn stored_name_follows_latest_mark() {
        let repo = InMemoryRepository::new();
        let old = StudentHistory::new(StudentId::new(1), "Alice Johnson")
            .with_entries([(day(15), true)]);
        repo.seed(Vec::new(), vec![old]).unwrap();
        let completed = CompletedSession {
            session: HistoricalSession::new(day(16), 1, 1).unwrap(),
            marks: vec![mark(1, true)],
        };
        repo.append_session(&completed).await.unwrap();

        let history = &repo.student_histories().await.unwrap()[0];
        assert_eq!(history.name(), "Student 1");
        assert_eq!(history.days_tracked(), 2);
    }

    #[tokio::test]
    async fn failed_append_leaves_sessions_untouched() {
        let repo = InMemoryRepository::new();
        let histories = Arc::clone(&repo.histories);
        let _ = std::thread::spawn(move || {
            let _guard = histories.lock().unwrap();
            panic!("writer died holding the histories lock");
        })
        .join();

        let completed = CompletedSession {
            session: HistoricalSession::new(day(16), 1, 1).unwrap(),
            marks: vec![mark(1, true)],
        };
        let err = repo.append_session(&completed).await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
        assert!(repo.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_session(42).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn roster_round_trips() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_roster().await.unwrap().is_empty());

        let roster =
            Roster::new(vec![Student::new(StudentId::new(7), "Sophia Martinez").unwrap()]).unwrap();
        repo.save_roster(&roster).await.unwrap();
        assert_eq!(repo.load_roster().await.unwrap(), roster);
    }
}
