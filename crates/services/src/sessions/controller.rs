use std::sync::Arc;

use classroom_core::model::{
    AttendanceRecord, CompletionSummary, PhotoRef, Presence, Roster, StudentId, View,
};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::state::{SessionSnapshot, SessionState};

const EVENT_CAPACITY: usize = 64;

//
// ─── INTENTS & OUTCOMES ────────────────────────────────────────────────────────
//

/// A request issued by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Login,
    Logout,
    StartAttendance,
    Navigate(View),
    PhotoCaptured(Option<PhotoRef>),
    Toggle(StudentId),
    MarkAllPresent,
    ClearAll,
    CompleteAttendance,
}

impl Intent {
    fn name(&self) -> &'static str {
        match self {
            Intent::Login => "login",
            Intent::Logout => "logout",
            Intent::StartAttendance => "start_attendance",
            Intent::Navigate(_) => "navigate",
            Intent::PhotoCaptured(_) => "photo_captured",
            Intent::Toggle(_) => "toggle",
            Intent::MarkAllPresent => "mark_all_present",
            Intent::ClearAll => "clear_all",
            Intent::CompleteAttendance => "complete_attendance",
        }
    }
}

/// A marking pass frozen at completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedAttendance {
    pub summary: CompletionSummary,
    pub record: AttendanceRecord,
}

/// What the controller did with an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Wrong view for the intent, or nothing to change. State is untouched.
    Ignored,
    Completed(FinishedAttendance),
}

impl Transition {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}

/// Notifications for observers of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(SessionSnapshot),
    AttendanceCompleted(CompletionSummary),
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owns `SessionState` and is the only thing allowed to change it.
///
/// Every method takes `&mut self`, so intents are applied one at a time.
/// An intent issued from the wrong view is ignored rather than treated as an
/// error, which keeps double taps and stale buttons harmless.
pub struct SessionController {
    roster: Arc<Roster>,
    state: SessionState,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    #[must_use]
    pub fn new(roster: Roster) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            roster: Arc::new(roster),
            state: SessionState::default(),
            events,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.state.view
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    /// Receives a `StateChanged` event after every applied intent.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn dispatch(&mut self, intent: Intent) -> Transition {
        let name = intent.name();
        let transition = match intent {
            Intent::Login => self.login(),
            Intent::Logout => self.logout(),
            Intent::StartAttendance => self.start_attendance(),
            Intent::Navigate(view) => self.navigate(view),
            Intent::PhotoCaptured(photo) => self.photo_captured(photo),
            Intent::Toggle(id) => self.toggle(id),
            Intent::MarkAllPresent => self.mark_all_present(),
            Intent::ClearAll => self.clear_all(),
            Intent::CompleteAttendance => self.complete_attendance(),
        };
        debug!(intent = name, applied = transition.is_applied(), "dispatched");
        transition
    }

    pub fn login(&mut self) -> Transition {
        if self.state.view != View::LoggedOut {
            return self.ignore("login");
        }
        self.state.view = View::Dashboard;
        self.applied("login")
    }

    /// Clears the session payload from any logged-in view.
    pub fn logout(&mut self) -> Transition {
        if self.state.view == View::LoggedOut {
            return self.ignore("logout");
        }
        self.state = SessionState::default();
        self.applied("logout")
    }

    pub fn start_attendance(&mut self) -> Transition {
        if self.state.view != View::Dashboard {
            return self.ignore("start_attendance");
        }
        self.state.view = View::Capturing;
        self.applied("start_attendance")
    }

    /// Marks a capture as in flight. Returns `Ignored` if one already is.
    pub fn begin_capture(&mut self) -> Transition {
        if self.state.view != View::Capturing || self.state.capture_pending {
            return self.ignore("begin_capture");
        }
        self.state.capture_pending = true;
        self.applied("begin_capture")
    }

    /// The photo source finished without a photo; stay in `Capturing`.
    pub fn capture_abandoned(&mut self) -> Transition {
        if self.state.view != View::Capturing || !self.state.capture_pending {
            return self.ignore("capture_abandoned");
        }
        self.state.capture_pending = false;
        self.applied("capture_abandoned")
    }

    /// Moves from `Capturing` to `Marking` with an empty record, with or
    /// without a photo.
    pub fn photo_captured(&mut self, photo: Option<PhotoRef>) -> Transition {
        if self.state.view != View::Capturing {
            return self.ignore("photo_captured");
        }
        self.state.captured_photo = photo;
        self.state.capture_pending = false;
        self.state.attendance = Some(AttendanceRecord::new(Arc::clone(&self.roster)));
        self.state.view = View::Marking;
        self.applied("photo_captured")
    }

    /// Menu navigation between logged-in views.
    ///
    /// Entering `Marking` this way opens a fresh record and keeps whatever
    /// photo exists. Leaving `Marking` drops the in-progress record.
    pub fn navigate(&mut self, target: View) -> Transition {
        let from = self.state.view;
        if !from.is_logged_in() || !View::NAVIGABLE.contains(&target) || from == target {
            return self.ignore("navigate");
        }
        self.state.capture_pending = false;
        self.state.attendance = (target == View::Marking)
            .then(|| AttendanceRecord::new(Arc::clone(&self.roster)));
        self.state.view = target;
        self.applied("navigate")
    }

    pub fn toggle(&mut self, id: StudentId) -> Transition {
        let status = self.state.attendance.as_mut().and_then(|record| record.toggle(id));
        match status {
            Some(status) => {
                debug!(student = %id, status = presence_label(status), "toggled");
                self.applied("toggle")
            }
            None => self.ignore("toggle"),
        }
    }

    pub fn mark_all_present(&mut self) -> Transition {
        match self.state.attendance.as_mut() {
            Some(record) => {
                record.mark_all_present();
                self.applied("mark_all_present")
            }
            None => self.ignore("mark_all_present"),
        }
    }

    pub fn clear_all(&mut self) -> Transition {
        match self.state.attendance.as_mut() {
            Some(record) => {
                record.clear_all();
                self.applied("clear_all")
            }
            None => self.ignore("clear_all"),
        }
    }

    /// Freezes the record, clears the payload and returns to `Dashboard`.
    ///
    /// Unmarked students count as absent in the summary.
    pub fn complete_attendance(&mut self) -> Transition {
        if self.state.view != View::Marking {
            return self.ignore("complete_attendance");
        }
        let Some(record) = self.state.attendance.take() else {
            return self.ignore("complete_attendance");
        };
        let summary = record.summary();
        self.state.captured_photo = None;
        self.state.view = View::Dashboard;
        info!(present = summary.present, total = summary.total, "attendance completed");

        self.applied("complete_attendance");
        let _ = self.events.send(SessionEvent::AttendanceCompleted(summary));
        Transition::Completed(FinishedAttendance { summary, record })
    }

    /// Swaps the roster used by the next marking pass.
    ///
    /// Ignored while marking: the directory is fixed for the pass in progress.
    pub fn replace_roster(&mut self, roster: Roster) -> Transition {
        if self.state.view == View::Marking {
            return self.ignore("replace_roster");
        }
        info!(students = roster.len(), "roster replaced");
        self.roster = Arc::new(roster);
        Transition::Applied
    }

    fn applied(&self, intent: &'static str) -> Transition {
        debug_assert!(
            self.state.holds_invariants(),
            "session invariants broken after {intent}"
        );
        info!(intent, view = %self.state.view, "session transition");
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::StateChanged(self.state.snapshot()));
        Transition::Applied
    }

    fn ignore(&self, intent: &'static str) -> Transition {
        debug!(intent, view = %self.state.view, "intent ignored");
        Transition::Ignored
    }
}

fn presence_label(status: Presence) -> &'static str {
    match status {
        Presence::Unmarked => "unmarked",
        Presence::Present => "present",
        Presence::Absent => "absent",
    }
}
