//! Subject ("Fach") and subject-kind ("Fachart") models.

use serde::{Deserialize, Serialize};

use super::{CourseKind, SubjectId};

/// A school subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique identifier (non-negative).
    pub id: SubjectId,
    /// Short display name, e.g. "M" or "D".
    pub short_name: String,
    /// Position in the school's subject order.
    pub sort_key: i32,
}

impl Subject {
    /// Creates a subject. The sort key defaults to 0.
    pub fn new(id: SubjectId, short_name: impl Into<String>) -> Self {
        Self {
            id,
            short_name: short_name.into(),
            sort_key: 0,
        }
    }

    /// Sets the position in the subject order.
    pub fn with_sort_key(mut self, sort_key: i32) -> Self {
        self.sort_key = sort_key;
        self
    }
}

/// A (subject, course kind) pair.
///
/// Courses and choices are matched on this pair: a student may only sit in
/// a course whose subject-kind equals one of the student's choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKind {
    /// Subject.
    pub subject: SubjectId,
    /// Course kind.
    pub kind: CourseKind,
}

impl SubjectKind {
    /// Creates a subject-kind pair.
    pub fn new(subject: SubjectId, kind: CourseKind) -> Self {
        Self { subject, kind }
    }
}
