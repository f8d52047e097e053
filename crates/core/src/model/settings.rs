use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassroomSettingsError {
    #[error("tier thresholds must satisfy medium <= high <= 100 (got high {high}, medium {medium})")]
    InvalidTierThresholds { high: u32, medium: u32 },

    #[error("report day limit must be > 0")]
    InvalidReportDayLimit,

    #[error("recent sessions limit must be > 0")]
    InvalidRecentSessionsLimit,

    #[error("capture delay must be at most {max_ms} ms")]
    InvalidCaptureDelay { max_ms: u64 },
}

//
// ─── TIER THRESHOLDS ───────────────────────────────────────────────────────────
//

/// Cut points used to colour-code attendance rates.
///
/// One table is applied everywhere a rate is tiered (dashboard sessions and
/// per-student report rows alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    high: u32,
    medium: u32,
}

impl TierThresholds {
    /// # Errors
    ///
    /// Returns `ClassroomSettingsError::InvalidTierThresholds` unless `medium <= high <= 100`.
    pub fn new(high: u32, medium: u32) -> Result<Self, ClassroomSettingsError> {
        if medium > high || high > 100 {
            return Err(ClassroomSettingsError::InvalidTierThresholds { high, medium });
        }
        Ok(Self { high, medium })
    }

    #[must_use]
    pub fn high(&self) -> u32 {
        self.high
    }

    #[must_use]
    pub fn medium(&self) -> u32 {
        self.medium
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 90,
            medium: 75,
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Upper bound for the simulated capture latency.
pub const MAX_CAPTURE_DELAY_MS: u64 = 10_000;

/// Validated classroom-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassroomSettings {
    teacher_name: String,
    class_name: String,
    capture_delay: Duration,
    report_day_limit: u32,
    recent_sessions_limit: u32,
    tiers: TierThresholds,
}

/// Unvalidated settings, typically deserialized from a config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassroomSettingsDraft {
    pub teacher_name: Option<String>,
    pub class_name: Option<String>,
    pub capture_delay_ms: Option<u64>,
    pub report_day_limit: Option<u32>,
    pub recent_sessions_limit: Option<u32>,
    pub tier_high: Option<u32>,
    pub tier_medium: Option<u32>,
}

impl ClassroomSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and fill defaults.
    ///
    /// # Errors
    ///
    /// Returns `ClassroomSettingsError` for zero limits, an excessive capture
    /// delay, or an inconsistent threshold table.
    pub fn validate(self) -> Result<ClassroomSettings, ClassroomSettingsError> {
        let defaults = ClassroomSettings::default();

        let capture_delay_ms = self
            .capture_delay_ms
            .unwrap_or(ClassroomSettings::DEFAULT_CAPTURE_DELAY_MS);
        if capture_delay_ms > MAX_CAPTURE_DELAY_MS {
            return Err(ClassroomSettingsError::InvalidCaptureDelay {
                max_ms: MAX_CAPTURE_DELAY_MS,
            });
        }

        let report_day_limit = self.report_day_limit.unwrap_or(defaults.report_day_limit);
        if report_day_limit == 0 {
            return Err(ClassroomSettingsError::InvalidReportDayLimit);
        }

        let recent_sessions_limit = self
            .recent_sessions_limit
            .unwrap_or(defaults.recent_sessions_limit);
        if recent_sessions_limit == 0 {
            return Err(ClassroomSettingsError::InvalidRecentSessionsLimit);
        }

        let tiers = TierThresholds::new(
            self.tier_high.unwrap_or(defaults.tiers.high),
            self.tier_medium.unwrap_or(defaults.tiers.medium),
        )?;

        Ok(ClassroomSettings {
            teacher_name: normalize_optional(self.teacher_name).unwrap_or(defaults.teacher_name),
            class_name: normalize_optional(self.class_name).unwrap_or(defaults.class_name),
            capture_delay: Duration::from_millis(capture_delay_ms),
            report_day_limit,
            recent_sessions_limit,
            tiers,
        })
    }
}

impl ClassroomSettings {
    pub const DEFAULT_CAPTURE_DELAY_MS: u64 = 1_000;

    #[must_use]
    pub fn teacher_name(&self) -> &str {
        &self.teacher_name
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn capture_delay(&self) -> Duration {
        self.capture_delay
    }

    #[must_use]
    pub fn report_day_limit(&self) -> u32 {
        self.report_day_limit
    }

    #[must_use]
    pub fn recent_sessions_limit(&self) -> u32 {
        self.recent_sessions_limit
    }

    #[must_use]
    pub fn tiers(&self) -> TierThresholds {
        self.tiers
    }

    #[must_use]
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }
}

impl Default for ClassroomSettings {
    fn default() -> Self {
        Self {
            teacher_name: "Teacher".to_string(),
            class_name: "My Class".to_string(),
            capture_delay: Duration::from_millis(Self::DEFAULT_CAPTURE_DELAY_MS),
            report_day_limit: 15,
            recent_sessions_limit: 4,
            tiers: TierThresholds::default(),
        }
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_defaults() {
        let settings = ClassroomSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, ClassroomSettings::default());
        assert_eq!(settings.tiers().high(), 90);
        assert_eq!(settings.tiers().medium(), 75);
        assert_eq!(settings.report_day_limit(), 15);
        assert_eq!(settings.capture_delay(), Duration::from_secs(1));
    }

    #[test]
    fn blank_names_fall_back_to_defaults() {
        let settings = ClassroomSettingsDraft {
            teacher_name: Some("  ".into()),
            class_name: Some(" Grade 5B ".into()),
            ..ClassroomSettingsDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.teacher_name(), "Teacher");
        assert_eq!(settings.class_name(), "Grade 5B");
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = ClassroomSettingsDraft {
            tier_high: Some(70),
            tier_medium: Some(80),
            ..ClassroomSettingsDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            ClassroomSettingsError::InvalidTierThresholds {
                high: 70,
                medium: 80
            }
        );
    }

    #[test]
    fn rejects_zero_limits_and_long_delay() {
        let zero_days = ClassroomSettingsDraft {
            report_day_limit: Some(0),
            ..ClassroomSettingsDraft::default()
        };
        assert_eq!(
            zero_days.validate().unwrap_err(),
            ClassroomSettingsError::InvalidReportDayLimit
        );

        let zero_recent = ClassroomSettingsDraft {
            recent_sessions_limit: Some(0),
            ..ClassroomSettingsDraft::default()
        };
        assert_eq!(
            zero_recent.validate().unwrap_err(),
            ClassroomSettingsError::InvalidRecentSessionsLimit
        );

        let slow = ClassroomSettingsDraft {
            capture_delay_ms: Some(MAX_CAPTURE_DELAY_MS + 1),
            ..ClassroomSettingsDraft::default()
        };
        assert!(matches!(
            slow.validate().unwrap_err(),
            ClassroomSettingsError::InvalidCaptureDelay { .. }
        ));
    }
}
