use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Student within a roster
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(u64);

impl StudentId {
    /// Creates a new `StudentId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Zero-padded roll number used by report tables (`7` -> `"007"`).
    #[must_use]
    pub fn roll_number(&self) -> String {
        format!("{:03}", self.0)
    }
}

impl fmt::Debug for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StudentId({})", self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse StudentId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for StudentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(StudentId::new)
            .map_err(|_| ParseIdError { raw: s.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_id_display() {
        assert_eq!(StudentId::new(42).to_string(), "42");
    }

    #[test]
    fn student_id_from_str_trims_whitespace() {
        let id: StudentId = " 12 ".parse().unwrap();
        assert_eq!(id, StudentId::new(12));
    }

    #[test]
    fn student_id_from_str_invalid() {
        let err = "roll-7".parse::<StudentId>().unwrap_err();
        assert!(err.to_string().contains("roll-7"));
    }

    #[test]
    fn roll_number_is_zero_padded() {
        assert_eq!(StudentId::new(3).roll_number(), "003");
        assert_eq!(StudentId::new(1234).roll_number(), "1234");
    }
}
