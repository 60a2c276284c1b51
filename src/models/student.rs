//! Student and subject-choice models.

use serde::{Deserialize, Serialize};

use super::{CourseKind, StudentId, SubjectId, SubjectKind};

/// Gender as recorded in the school administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    W,
    D,
    X,
}

/// Enrolment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudentStatus {
    #[default]
    Active,
    /// Takes exams at the school without regular attendance.
    External,
}

/// A student of the blocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier (non-negative).
    pub id: StudentId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Gender.
    pub gender: Gender,
    /// Enrolment status.
    pub status: StudentStatus,
}

impl Student {
    /// Creates an active student.
    pub fn new(
        id: StudentId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        gender: Gender,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender,
            status: StudentStatus::Active,
        }
    }

    /// Sets the enrolment status.
    pub fn with_status(mut self, status: StudentStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the student is external.
    pub fn is_external(&self) -> bool {
        self.status == StudentStatus::External
    }

    /// "Last, First".
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// A student's choice of one subject with a course kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectChoice {
    /// Student.
    pub student_id: StudentId,
    /// Subject.
    pub subject_id: SubjectId,
    /// Chosen course kind.
    pub kind: CourseKind,
    /// Abitur exam rank: 0 = none, 1..=2 advanced, 3 = written, 4 = oral.
    pub abitur_rank: u8,
    /// Whether the course is taken with written exams.
    pub written: bool,
}

impl SubjectChoice {
    /// Creates a choice without abitur rank and with oral exams.
    pub fn new(student_id: StudentId, subject_id: SubjectId, kind: CourseKind) -> Self {
        Self {
            student_id,
            subject_id,
            kind,
            abitur_rank: 0,
            written: false,
        }
    }

    /// Sets the abitur rank.
    pub fn with_abitur_rank(mut self, rank: u8) -> Self {
        self.abitur_rank = rank;
        self
    }

    /// Sets the written flag.
    pub fn with_written(mut self, written: bool) -> Self {
        self.written = written;
        self
    }

    /// The subject-kind of the choice.
    pub fn subject_kind(&self) -> SubjectKind {
        SubjectKind::new(self.subject_id, self.kind)
    }

    /// Abitur subject with rank 1 or 2.
    pub fn is_abitur_lk(&self) -> bool {
        (1..=2).contains(&self.abitur_rank)
    }

    /// Third abitur subject.
    pub fn is_abitur_3(&self) -> bool {
        self.abitur_rank == 3
    }

    /// Fourth abitur subject.
    pub fn is_abitur_4(&self) -> bool {
        self.abitur_rank == 4
    }

    /// Any abitur subject.
    pub fn is_abitur(&self) -> bool {
        self.abitur_rank >= 1
    }
}
