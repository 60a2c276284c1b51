//! Course ("Kurs") model.

use serde::{Deserialize, Serialize};

use super::{CourseId, SubjectId, SubjectKind, TeacherId};
use crate::error::{BlockungError, Result};

/// Category of a course.
///
/// Variant order equals the numeric code order, which is the order used
/// when courses are sorted by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CourseKind {
    /// Advanced course (Leistungskurs).
    Lk,
    /// Basic course (Grundkurs).
    Gk,
    /// Supplementary course (Zusatzkurs).
    Zk,
    /// Project course (Projektkurs).
    Pjk,
    /// Deepening course (Vertiefungskurs).
    Vtf,
}

impl CourseKind {
    /// All kinds in code order.
    pub const ALL: [CourseKind; 5] = [Self::Lk, Self::Gk, Self::Zk, Self::Pjk, Self::Vtf];

    /// Stable numeric code.
    pub fn code(self) -> i64 {
        match self {
            Self::Lk => 1,
            Self::Gk => 2,
            Self::Zk => 3,
            Self::Pjk => 4,
            Self::Vtf => 5,
        }
    }

    /// Parses a numeric code.
    pub fn from_code(code: i64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| BlockungError::InvalidParameter(format!("unknown course kind code {code}")))
    }

    /// Short name used in course names and diagnostics.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Lk => "LK",
            Self::Gk => "GK",
            Self::Zk => "ZK",
            Self::Pjk => "PJK",
            Self::Vtf => "VTF",
        }
    }
}

/// A teacher assigned to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Teacher identifier.
    pub id: TeacherId,
    /// Short name ("Kürzel").
    pub short_name: String,
}

impl Teacher {
    /// Creates a teacher reference.
    pub fn new(id: TeacherId, short_name: impl Into<String>) -> Self {
        Self {
            id,
            short_name: short_name.into(),
        }
    }
}

/// A course of the base configuration.
///
/// Placements and enrolments are not stored here; they belong to the
/// [`crate::models::Assignment`] of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier (non-negative).
    pub id: CourseId,
    /// Subject of the course.
    pub subject_id: SubjectId,
    /// Course kind.
    pub kind: CourseKind,
    /// Running number within the subject-kind, used for naming and sorting.
    pub number: i32,
    /// Name suffix, usually empty.
    pub suffix: String,
    /// Number of tracks the course must occupy ("Multikurs" if > 1).
    pub required_tracks: i32,
    /// Assigned teachers.
    pub teachers: Vec<Teacher>,
}

impl Course {
    /// Creates a single-track course.
    pub fn new(id: CourseId, subject_id: SubjectId, kind: CourseKind, number: i32) -> Self {
        Self {
            id,
            subject_id,
            kind,
            number,
            suffix: String::new(),
            required_tracks: 1,
            teachers: Vec::new(),
        }
    }

    /// Sets the number of tracks the course must occupy.
    pub fn with_required_tracks(mut self, n: i32) -> Self {
        self.required_tracks = n;
        self
    }

    /// Sets the name suffix.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Adds a teacher.
    pub fn with_teacher(mut self, teacher: Teacher) -> Self {
        self.teachers.push(teacher);
        self
    }

    /// The subject-kind this course offers.
    pub fn subject_kind(&self) -> SubjectKind {
        SubjectKind::new(self.subject_id, self.kind)
    }
}
