use serde::Serialize;

use classroom_core::model::{AttendanceRecord, PhotoRef, Presence, StudentId, View};

/// The single source of truth for what the session is showing.
///
/// Only `SessionController` can change it. `attendance` is present exactly
/// while `view` is `Marking`; `captured_photo` survives until logout or
/// completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub(super) view: View,
    pub(super) captured_photo: Option<PhotoRef>,
    pub(super) attendance: Option<AttendanceRecord>,
    pub(super) capture_pending: bool,
}

impl SessionState {
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn captured_photo(&self) -> Option<&PhotoRef> {
        self.captured_photo.as_ref()
    }

    #[must_use]
    pub fn attendance(&self) -> Option<&AttendanceRecord> {
        self.attendance.as_ref()
    }

    /// True while a photo is being acquired; the capture trigger is disabled.
    #[must_use]
    pub fn capture_pending(&self) -> bool {
        self.capture_pending
    }

    pub(super) fn holds_invariants(&self) -> bool {
        let attendance_matches_view = self.attendance.is_some() == (self.view == View::Marking);
        let pending_only_while_capturing = !self.capture_pending || self.view == View::Capturing;
        let logged_out_is_empty = self.view.is_logged_in() || self.captured_photo.is_none();
        attendance_matches_view && pending_only_while_capturing && logged_out_is_empty
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            captured_photo: self.captured_photo.clone(),
            capture_pending: self.capture_pending,
            attendance: self.attendance.as_ref().map(AttendanceView::from_record),
        }
    }
}

/// Owned copy of the state handed to the presentation layer after each change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub captured_photo: Option<PhotoRef>,
    pub capture_pending: bool,
    pub attendance: Option<AttendanceView>,
}

/// Marking grid contents: one status per roster student, in roster order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    pub present: usize,
    pub absent: usize,
    pub total: usize,
    pub students: Vec<StudentStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentStatus {
    pub id: StudentId,
    pub name: String,
    pub photo: Option<PhotoRef>,
    pub status: Presence,
}

impl AttendanceView {
    #[must_use]
    pub fn from_record(record: &AttendanceRecord) -> Self {
        let students = record
            .roster()
            .students()
            .iter()
            .map(|student| StudentStatus {
                id: student.id(),
                name: student.name().to_string(),
                photo: student.photo().cloned(),
                status: record.status(student.id()),
            })
            .collect();
        Self {
            present: record.present_count(),
            absent: record.absent_count(),
            total: record.total(),
            students,
        }
    }
}
