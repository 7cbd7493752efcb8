use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Lesson (URL-safe slug assigned by the server)
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LessonId(String);

impl LessonId {
    /// Creates a new `LessonId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying slug
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for an exercise task.
///
/// The server keys tasks by identifiers that are not plain integers
/// (`1.1`, `2.3`), so the id is carried verbatim as opaque text.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new `TaskId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying identity text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for LessonId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "LessonId".to_string(),
            });
        }
        Ok(LessonId::new(trimmed))
    }
}

impl FromStr for TaskId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "TaskId".to_string(),
            });
        }
        Ok(TaskId::new(trimmed))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_id_display() {
        let id = LessonId::new("lesson-1-basic-select");
        assert_eq!(id.to_string(), "lesson-1-basic-select");
    }

    #[test]
    fn test_lesson_id_from_str_trims() {
        let id: LessonId = " lesson-2-where ".parse().unwrap();
        assert_eq!(id, LessonId::new("lesson-2-where"));
    }

    #[test]
    fn test_lesson_id_from_str_rejects_empty() {
        let result = "   ".parse::<LessonId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_task_id_keeps_fractional_form() {
        let id = TaskId::new("1.2");
        assert_eq!(id.to_string(), "1.2");
        assert_eq!(id.as_str(), "1.2");
    }

    #[test]
    fn test_task_id_from_str_trims() {
        let id: TaskId = " 2.1 ".parse().unwrap();
        assert_eq!(id, TaskId::new("2.1"));
    }

    #[test]
    fn test_task_id_from_str_rejects_empty() {
        let result = "".parse::<TaskId>();
        assert!(result.is_err());
    }

    #[test]
    fn test_id_roundtrip() {
        let original = TaskId::new("3.4");
        let serialized = original.to_string();
        let deserialized: TaskId = serialized.parse().unwrap();
        assert_eq!(original, deserialized);
    }
}
