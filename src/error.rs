//! Error types for the blocking engine.
//!
//! Only conditions that make an operation impossible are errors. Structural
//! problems in the base data (duplicate ids, gaps in track numbers, dangling
//! assignments) are collected as diagnostics by [`crate::validation`] and
//! never abort a revalidation.

use thiserror::Error;

use crate::models::{CourseId, RuleId, StudentId, SubjectId, TrackId};

/// Fatal errors raised by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockungError {
    #[error("unknown track id {0}")]
    UnknownTrack(TrackId),

    #[error("unknown track number {0}")]
    UnknownTrackNumber(i32),

    #[error("unknown course id {0}")]
    UnknownCourse(CourseId),

    #[error("unknown student id {0}")]
    UnknownStudent(StudentId),

    #[error("unknown subject id {0}")]
    UnknownSubject(SubjectId),

    #[error("unknown rule id {0}")]
    UnknownRule(RuleId),

    #[error("student {student} has no choice for subject {subject}")]
    UnknownChoice {
        student: StudentId,
        subject: SubjectId,
    },

    #[error("operation requires a blocking template: {0}")]
    NotATemplate(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("rule already exists: {0}")]
    DuplicateRule(String),

    #[error("inconsistent state: {0}")]
    Inconsistent(String),

    #[error("student {student} is locked and fixed in course {course} at the same time")]
    LockedAndFixed { student: StudentId, course: CourseId },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlockungError>;
