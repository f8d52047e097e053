//! Optional TOML configuration for the binary.
//!
//! ```toml
//! [classroom]
//! teacher_name = "Ms. Rivera"
//! capture_delay_ms = 500
//!
//! [[students]]
//! id = 1
//! name = "Emma Johnson"
//! ```

use std::path::{Path, PathBuf};

use classroom_core::model::{
    ClassroomSettings, ClassroomSettingsDraft, ClassroomSettingsError, PhotoRef, Roster,
    RosterError, Student, StudentId,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Settings(#[from] ClassroomSettingsError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

#[derive(Debug, Clone, Deserialize)]
struct StudentEntry {
    id: u64,
    name: String,
    #[serde(default)]
    photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    classroom: ClassroomSettingsDraft,
    students: Vec<StudentEntry>,
}

/// Settings plus an optional roster that replaces the sample class.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: ClassroomSettings,
    pub roster: Option<Roster>,
}

impl ConfigFile {
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Parse` for unreadable files.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply command-line overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Settings` or `ConfigError::Roster` for invalid values.
    pub fn resolve(mut self, capture_delay_ms: Option<u64>) -> Result<AppConfig, ConfigError> {
        if capture_delay_ms.is_some() {
            self.classroom.capture_delay_ms = capture_delay_ms;
        }
        let settings = self.classroom.validate()?;

        let roster = if self.students.is_empty() {
            None
        } else {
            let students = self
                .students
                .into_iter()
                .map(|entry| -> Result<Student, RosterError> {
                    let student = Student::new(StudentId::new(entry.id), entry.name)?;
                    Ok(match entry.photo {
                        Some(photo) => student.with_photo(PhotoRef::new(photo)),
                        None => student,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(Roster::new(students)?)
        };

        Ok(AppConfig { settings, roster })
    }
}
