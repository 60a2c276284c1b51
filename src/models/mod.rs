//! Blocking domain models.
//!
//! Plain data types for one course blocking ("Blockung") and one of its
//! results. Entities reference each other by integer id only; every derived
//! relation lives in [`crate::index::Index`] and is rebuilt on revalidation.
//!
//! # Entities
//!
//! | Type | German term | Meaning |
//! |------|-------------|---------|
//! | [`Track`] | Schiene | Parallel timetable slot |
//! | [`Course`] | Kurs | Offering of one subject-kind, spans 1..n tracks |
//! | [`Subject`] | Fach | School subject |
//! | [`Student`] | Schüler | Participant with subject choices |
//! | [`SubjectChoice`] | Fachwahl | A student's choice of subject and kind |
//! | [`Rule`] | Regel | Typed constraint on the assignment |
//! | [`BlockingResult`] | Blockungsergebnis | Assignment plus score snapshot |

mod blocking;
mod course;
mod result;
mod rule;
mod student;
mod subject;
mod track;

pub use blocking::BlockingData;
pub use course::{Course, CourseKind, Teacher};
pub use result::{Assignment, BlockingResult, ResultCourse, ResultTrack, Score};
pub use rule::{Rule, RuleKind, RuleType};
pub use student::{Gender, Student, StudentStatus, SubjectChoice};
pub use subject::{Subject, SubjectKind};
pub use track::Track;

/// Track identifier.
pub type TrackId = i64;
/// Course identifier.
pub type CourseId = i64;
/// Student identifier.
pub type StudentId = i64;
/// Subject identifier.
pub type SubjectId = i64;
/// Rule identifier.
pub type RuleId = i64;
/// Teacher identifier.
pub type TeacherId = i64;
/// Blocking result identifier.
pub type ResultId = i64;
