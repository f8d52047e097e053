use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::StudentId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RosterError {
    #[error("student name cannot be empty (id {0})")]
    EmptyName(StudentId),

    #[error("duplicate student id {0}")]
    DuplicateId(StudentId),
}

//
// ─── PHOTO REFERENCE ───────────────────────────────────────────────────────────
//

/// Opaque reference to a stored image (a class photo or a student avatar).
///
/// The domain never looks inside; it only carries the reference between views.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── STUDENT ───────────────────────────────────────────────────────────────────
//

/// A student eligible for attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    name: String,
    photo: Option<PhotoRef>,
}

impl Student {
    /// Creates a student with a trimmed display name.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::EmptyName` if the name is blank.
    pub fn new(id: StudentId, name: impl Into<String>) -> Result<Self, RosterError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RosterError::EmptyName(id));
        }
        Ok(Self {
            id,
            name: trimmed.to_string(),
            photo: None,
        })
    }

    #[must_use]
    pub fn with_photo(mut self, photo: PhotoRef) -> Self {
        self.photo = Some(photo);
        self
    }

    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn photo(&self) -> Option<&PhotoRef> {
        self.photo.as_ref()
    }
}

//
// ─── ROSTER ────────────────────────────────────────────────────────────────────
//

/// The fixed directory of students for a class.
///
/// Ids are unique and the roster exposes no mutating API once built, so it
/// stays fixed for the whole marking pass that borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    /// Builds a roster, preserving the given order.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::DuplicateId` if two students share an id.
    pub fn new(students: Vec<Student>) -> Result<Self, RosterError> {
        let mut seen = HashSet::with_capacity(students.len());
        for student in &students {
            if !seen.insert(student.id()) {
                return Err(RosterError::DuplicateId(student.id()));
            }
        }
        Ok(Self { students })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.students.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: StudentId) -> bool {
        self.students.iter().any(|student| student.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|student| student.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.students.iter().map(Student::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: u64, name: &str) -> Student {
        Student::new(StudentId::new(id), name).unwrap()
    }

    #[test]
    fn student_name_is_trimmed() {
        let s = student(1, "  Emma Johnson ");
        assert_eq!(s.name(), "Emma Johnson");
        assert!(s.photo().is_none());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Student::new(StudentId::new(9), "   ").unwrap_err();
        assert_eq!(err, RosterError::EmptyName(StudentId::new(9)));
    }

    #[test]
    fn roster_rejects_duplicate_ids() {
        let err = Roster::new(vec![student(1, "A"), student(2, "B"), student(1, "C")]).unwrap_err();
        assert_eq!(err, RosterError::DuplicateId(StudentId::new(1)));
    }

    #[test]
    fn roster_lookup() {
        let roster = Roster::new(vec![student(1, "A"), student(2, "B")]).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(StudentId::new(2)));
        assert!(!roster.contains(StudentId::new(3)));
        assert_eq!(roster.get(StudentId::new(1)).map(Student::name), Some("A"));
        assert_eq!(
            roster.ids().collect::<Vec<_>>(),
            vec![StudentId::new(1), StudentId::new(2)]
        );
    }

    #[test]
    fn student_photo_is_optional() {
        let s = student(4, "Noah Davis").with_photo(PhotoRef::new("avatars/4.png"));
        assert_eq!(s.photo().map(PhotoRef::as_str), Some("avatars/4.png"));
    }
}
