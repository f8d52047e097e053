use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use classroom_core::model::{CompletionSummary, HistoricalSession, PhotoRef, View};
use storage::repository::{
    CompletedSession, HistoryRepository, RosterRepository, SessionRecordId, StudentMark,
};
use tracing::{info, warn};

use crate::Clock;
use crate::capture::PhotoSource;
use crate::error::SessionError;
use super::controller::{FinishedAttendance, SessionController, Transition};

/// How a capture attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The session moved on to marking.
    Captured(PhotoRef),
    /// No photo was delivered; the session stays in capturing.
    NoPhoto,
    /// Not in capturing, or a capture is already pending.
    Ignored,
}

/// Confirmation for a completed and stored marking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReceipt {
    pub id: SessionRecordId,
    pub date: NaiveDate,
    pub summary: CompletionSummary,
}

impl FinishedAttendance {
    /// Every roster student's flag, unmarked students recorded as absent.
    #[must_use]
    pub fn marks(&self) -> Vec<StudentMark> {
        self.record
            .roster()
            .students()
            .iter()
            .map(|student| StudentMark {
                student_id: student.id(),
                name: student.name().to_string(),
                present: self.record.flag(student.id()).unwrap_or(false),
            })
            .collect()
    }

    #[must_use]
    pub fn to_completed_session(&self, date: NaiveDate) -> CompletedSession {
        CompletedSession {
            session: HistoricalSession::from_summary(date, self.summary),
            marks: self.marks(),
        }
    }
}

/// Drives a `SessionController` through the steps that touch the outside
/// world: roster loading, photo acquisition and storing completed passes.
#[derive(Clone)]
pub struct AttendanceWorkflow {
    clock: Clock,
    roster: Arc<dyn RosterRepository>,
    history: Arc<dyn HistoryRepository>,
    capture_delay: Duration,
}

impl AttendanceWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        roster: Arc<dyn RosterRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            clock,
            roster,
            history,
            capture_delay: Duration::ZERO,
        }
    }

    /// Simulated capture latency applied after a photo is acquired.
    #[must_use]
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    #[must_use]
    pub fn capture_delay(&self) -> Duration {
        self.capture_delay
    }

    /// Create a logged-out controller over the stored roster.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the roster cannot be loaded.
    pub async fn open_session(&self) -> Result<SessionController, SessionError> {
        let roster = self.roster.load_roster().await?;
        info!(students = roster.len(), "session opened");
        Ok(SessionController::new(roster))
    }

    /// Refresh the roster, then move from the dashboard to capturing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the roster cannot be loaded.
    pub async fn start_attendance(
        &self,
        controller: &mut SessionController,
    ) -> Result<Transition, SessionError> {
        if controller.view() != View::Dashboard {
            return Ok(controller.start_attendance());
        }
        let roster = self.roster.load_roster().await?;
        controller.replace_roster(roster);
        Ok(controller.start_attendance())
    }

    /// Acquire a photo and, once the capture delay has elapsed, move to marking.
    ///
    /// A second capture while one is pending is ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Capture` if the source fails. The session stays
    /// in capturing and can retry.
    pub async fn capture(
        &self,
        controller: &mut SessionController,
        source: &dyn PhotoSource,
    ) -> Result<CaptureOutcome, SessionError> {
        if !controller.begin_capture().is_applied() {
            return Ok(CaptureOutcome::Ignored);
        }
        match source.acquire().await {
            Ok(Some(photo)) => {
                tokio::time::sleep(self.capture_delay).await;
                info!(photo = %photo, "photo captured");
                controller.photo_captured(Some(photo.clone()));
                Ok(CaptureOutcome::Captured(photo))
            }
            Ok(None) => {
                controller.capture_abandoned();
                Ok(CaptureOutcome::NoPhoto)
            }
            Err(err) => {
                warn!(error = %err, "photo capture failed");
                controller.capture_abandoned();
                Err(err.into())
            }
        }
    }

    /// Complete the marking pass and store it.
    ///
    /// Returns `Ok(None)` when the controller was not marking.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unsaved` carrying the finished pass if storage
    /// fails, so it can be handed to [`Self::record_completion`] again.
    pub async fn complete(
        &self,
        controller: &mut SessionController,
    ) -> Result<Option<CompletionReceipt>, SessionError> {
        let Transition::Completed(finished) = controller.complete_attendance() else {
            return Ok(None);
        };
        self.record_completion(finished).await.map(Some)
    }

    /// Store a finished pass dated by the workflow clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unsaved` if the history repository rejects it.
    pub async fn record_completion(
        &self,
        finished: FinishedAttendance,
    ) -> Result<CompletionReceipt, SessionError> {
        let date = self.clock.today();
        let completed = finished.to_completed_session(date);
        match self.history.append_session(&completed).await {
            Ok(id) => {
                info!(id, %date, summary = %finished.summary, "attendance saved");
                Ok(CompletionReceipt {
                    id,
                    date,
                    summary: finished.summary,
                })
            }
            Err(source) => {
                warn!(error = %source, "attendance could not be saved");
                Err(SessionError::Unsaved {
                    finished: Box::new(finished),
                    source,
                })
            }
        }
    }
}
