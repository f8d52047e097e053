mod controller;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{FinishedAttendance, Intent, SessionController, SessionEvent, Transition};
pub use state::{AttendanceView, SessionSnapshot, SessionState, StudentStatus};
pub use workflow::{AttendanceWorkflow, CaptureOutcome, CompletionReceipt};
