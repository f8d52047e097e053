use thiserror::Error;

use crate::model::{ClassroomSettingsError, HistoricalSessionError, RosterError};
use crate::report::MonthKeyError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    HistoricalSession(#[from] HistoricalSessionError),
    #[error(transparent)]
    Settings(#[from] ClassroomSettingsError),
    #[error(transparent)]
    MonthKey(#[from] MonthKeyError),
}
