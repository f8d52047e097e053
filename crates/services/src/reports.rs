use std::sync::Arc;

use classroom_core::model::{HistoricalSession, TierThresholds};
use classroom_core::report::{self, DashboardOverview, MonthKey, MonthlyReport};
use storage::repository::{HistoryRepository, RosterRepository};

use crate::Clock;
use crate::error::ReportError;

/// Read-only view over stored attendance for the dashboard and reports screens.
#[derive(Clone)]
pub struct ReportService {
    clock: Clock,
    roster: Arc<dyn RosterRepository>,
    history: Arc<dyn HistoryRepository>,
    tiers: TierThresholds,
    day_limit: u32,
    recent_limit: usize,
}

impl ReportService {
    pub const DEFAULT_DAY_LIMIT: u32 = 15;
    pub const DEFAULT_RECENT_LIMIT: usize = 4;

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
            tiers: TierThresholds::default(),
            day_limit: Self::DEFAULT_DAY_LIMIT,
            recent_limit: Self::DEFAULT_RECENT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }

    #[must_use]
    pub fn with_day_limit(mut self, day_limit: u32) -> Self {
        self.day_limit = day_limit;
        self
    }

    #[must_use]
    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    #[must_use]
    pub fn tiers(&self) -> TierThresholds {
        self.tiers
    }

    /// Today's figures plus the most recent sessions.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if history or roster cannot be read.
    pub async fn dashboard(&self) -> Result<DashboardOverview, ReportError> {
        let sessions = self.sessions().await?;
        let roster = self.roster.load_roster().await?;
        Ok(DashboardOverview::build(
            &sessions,
            self.clock.today(),
            roster.len(),
            self.recent_limit,
            &self.tiers,
        ))
    }

    /// Day-by-day table for `month`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if history cannot be read.
    pub async fn monthly_report(&self, month: MonthKey) -> Result<MonthlyReport, ReportError> {
        let histories = self.history.student_histories().await?;
        Ok(MonthlyReport::build(
            month,
            &histories,
            self.day_limit,
            &self.tiers,
        ))
    }

    /// Months that have any recorded attendance, latest first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if history cannot be read.
    pub async fn available_months(&self) -> Result<Vec<MonthKey>, ReportError> {
        let sessions = self.sessions().await?;
        let histories = self.history.student_histories().await?;
        Ok(report::available_months(&sessions, &histories))
    }

    /// The latest month with data, or the clock's current month.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if history cannot be read.
    pub async fn default_month(&self) -> Result<MonthKey, ReportError> {
        let months = self.available_months().await?;
        Ok(months
            .first()
            .copied()
            .unwrap_or_else(|| MonthKey::of(self.clock.today())))
    }

    async fn sessions(&self) -> Result<Vec<HistoricalSession>, ReportError> {
        let rows = self.history.list_sessions().await?;
        Ok(rows.into_iter().map(|row| row.session).collect())
    }
}
