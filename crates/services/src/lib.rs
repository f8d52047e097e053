#![forbid(unsafe_code)]

pub mod app_services;
pub mod capture;
pub mod error;
pub mod reports;
pub mod sessions;

pub use classroom_core::Clock;

pub use app_services::AppServices;
pub use capture::{FilePhotoSource, PhotoSource};
pub use error::{AppServicesError, CaptureError, ReportError, SessionError};
pub use reports::ReportService;

pub use sessions::{
    AttendanceView, AttendanceWorkflow, CaptureOutcome, CompletionReceipt, FinishedAttendance,
    Intent, SessionController, SessionEvent, SessionSnapshot, SessionState, StudentStatus,
    Transition,
};
