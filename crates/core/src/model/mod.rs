mod attendance;
mod history;
mod ids;
mod session;
mod settings;
mod student;

pub use ids::{ParseIdError, StudentId};

pub use attendance::{AttendanceRecord, Presence};
pub use history::StudentHistory;
pub use session::{
    CompletionSummary, HistoricalSession, HistoricalSessionError, ParseViewError, View,
};
pub use settings::{
    ClassroomSettings, ClassroomSettingsDraft, ClassroomSettingsError, MAX_CAPTURE_DELAY_MS,
    TierThresholds,
};
pub use student::{PhotoRef, Roster, RosterError, Student};
