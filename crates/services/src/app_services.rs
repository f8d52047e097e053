use std::sync::Arc;

use classroom_core::model::{ClassroomSettings, Roster};
use storage::repository::{InMemoryRepository, Storage};
use tracing::info;

use crate::Clock;
use crate::error::AppServicesError;
use crate::reports::ReportService;
use crate::sessions::AttendanceWorkflow;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    settings: ClassroomSettings,
    workflow: Arc<AttendanceWorkflow>,
    reports: Arc<ReportService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, settings: ClassroomSettings, clock: Clock) -> Self {
        let workflow = Arc::new(
            AttendanceWorkflow::new(
                clock,
                Arc::clone(&storage.roster),
                Arc::clone(&storage.history),
            )
            .with_capture_delay(settings.capture_delay()),
        );
        let reports = Arc::new(
            ReportService::new(
                clock,
                Arc::clone(&storage.roster),
                Arc::clone(&storage.history),
            )
            .with_tiers(settings.tiers())
            .with_day_limit(settings.report_day_limit())
            .with_recent_limit(usize::try_from(settings.recent_sessions_limit()).unwrap_or(usize::MAX)),
        );
        Self {
            settings,
            workflow,
            reports,
        }
    }

    /// Build services over in-memory storage.
    ///
    /// Without a roster the sample class and its past attendance are loaded.
    /// A configured roster starts with an empty history, so reports only
    /// show sessions taken for that class.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the sample data fails
    /// validation.
    pub fn in_memory(
        settings: ClassroomSettings,
        clock: Clock,
        roster: Option<Roster>,
    ) -> Result<Self, AppServicesError> {
        let storage = match roster {
            Some(roster) => {
                info!(students = roster.len(), "using configured roster");
                Storage::from_repository(InMemoryRepository::with_roster(roster))
            }
            None => Storage::sample()?,
        };
        Ok(Self::new(&storage, settings, clock))
    }

    #[must_use]
    pub fn settings(&self) -> &ClassroomSettings {
        &self.settings
    }

    #[must_use]
    pub fn workflow(&self) -> Arc<AttendanceWorkflow> {
        Arc::clone(&self.workflow)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ReportService> {
        Arc::clone(&self.reports)
    }
}
