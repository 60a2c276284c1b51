//! Blocking rules ("Regeln").
//!
//! A rule is an id plus a typed [`RuleKind`]. Two rules are equivalent when
//! their kinds are equal; the kind therefore doubles as the lookup key for
//! "does this exact rule already exist".
//!
//! The positional external format (type code plus a list of integer
//! parameters) is converted in one place, [`RuleKind::from_params`] and
//! [`RuleKind::params`].

use serde::{Deserialize, Serialize};

use super::{CourseId, CourseKind, RuleId, StudentId, SubjectId, SubjectKind};
use crate::error::{BlockungError, Result};

/// A stored rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier assigned by [`crate::models::BlockingData::add_rules`].
    pub id: RuleId,
    /// Typed rule content.
    pub kind: RuleKind,
}

impl Rule {
    /// Creates a rule.
    pub fn new(id: RuleId, kind: RuleKind) -> Self {
        Self { id, kind }
    }

    /// Type of the rule.
    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }
}

/// Rule content with typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleKind {
    /// Courses of `kind` must not lie in tracks `from..=to`.
    KindLockedInTrackRange { kind: CourseKind, from: i32, to: i32 },
    /// Course must lie in the track with this number.
    CourseFixedInTrack { course: CourseId, track_number: i32 },
    /// Course must not lie in the track with this number.
    CourseLockedInTrack { course: CourseId, track_number: i32 },
    /// Student must be enrolled in the course.
    StudentFixedInCourse { student: StudentId, course: CourseId },
    /// Student must not be enrolled in the course.
    StudentForbiddenInCourse { student: StudentId, course: CourseId },
    /// Courses of `kind` lie only in tracks `from..=to`, and those tracks
    /// hold no other kind.
    KindAloneInTrackRange { kind: CourseKind, from: i32, to: i32 },
    /// The two courses must not share a track.
    CourseForbiddenWithCourse { course1: CourseId, course2: CourseId },
    /// The two courses must share their tracks.
    CourseTogetherWithCourse { course1: CourseId, course2: CourseId },
    /// Virtual students added to the course headcount.
    CourseDummyStudents { course: CourseId, count: i32 },
    /// Courses sharing a teacher must not share a track.
    RespectTeachers,
    /// Both students sit in the same course of the subject.
    StudentTogetherWithStudentInSubject {
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    },
    /// The students sit in different courses of the subject.
    StudentForbiddenWithStudentInSubject {
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    },
    /// The students share a course in every subject-kind they share.
    StudentTogetherWithStudent { student1: StudentId, student2: StudentId },
    /// The students share no course in any subject-kind they share.
    StudentForbiddenWithStudent { student1: StudentId, student2: StudentId },
    /// Headcount (students plus dummies) must not exceed `max`.
    CourseMaxStudents { course: CourseId, max: i32 },
    /// Choice conflicts of the student are not counted.
    IgnoreStudent { student: StudentId },
    /// Course is left out of the size spread of its subject-kind.
    IgnoreCourseInSpread { course: CourseId },
    /// At most `max` courses of the subject-kind per track.
    SubjectKindMaxPerTrack {
        subject: SubjectId,
        kind: CourseKind,
        max: i32,
    },
}

/// Field-less rule discriminant with its stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleType {
    KindLockedInTrackRange,
    CourseFixedInTrack,
    CourseLockedInTrack,
    StudentFixedInCourse,
    StudentForbiddenInCourse,
    KindAloneInTrackRange,
    CourseForbiddenWithCourse,
    CourseTogetherWithCourse,
    CourseDummyStudents,
    RespectTeachers,
    StudentTogetherWithStudentInSubject,
    StudentForbiddenWithStudentInSubject,
    StudentTogetherWithStudent,
    StudentForbiddenWithStudent,
    CourseMaxStudents,
    IgnoreStudent,
    IgnoreCourseInSpread,
    SubjectKindMaxPerTrack,
}

impl RuleType {
    /// All types in code order.
    pub const ALL: [RuleType; 18] = [
        Self::KindLockedInTrackRange,
        Self::CourseFixedInTrack,
        Self::CourseLockedInTrack,
        Self::StudentFixedInCourse,
        Self::StudentForbiddenInCourse,
        Self::KindAloneInTrackRange,
        Self::CourseForbiddenWithCourse,
        Self::CourseTogetherWithCourse,
        Self::CourseDummyStudents,
        Self::RespectTeachers,
        Self::StudentTogetherWithStudentInSubject,
        Self::StudentForbiddenWithStudentInSubject,
        Self::StudentTogetherWithStudent,
        Self::StudentForbiddenWithStudent,
        Self::CourseMaxStudents,
        Self::IgnoreStudent,
        Self::IgnoreCourseInSpread,
        Self::SubjectKindMaxPerTrack,
    ];

    /// Order in which violations are listed in the rule tooltip.
    /// Track rules first, then course pairs, then student rules.
    pub const DISPLAY_ORDER: [RuleType; 18] = [
        Self::KindLockedInTrackRange,
        Self::KindAloneInTrackRange,
        Self::CourseFixedInTrack,
        Self::CourseLockedInTrack,
        Self::CourseForbiddenWithCourse,
        Self::CourseTogetherWithCourse,
        Self::RespectTeachers,
        Self::SubjectKindMaxPerTrack,
        Self::CourseMaxStudents,
        Self::StudentFixedInCourse,
        Self::StudentForbiddenInCourse,
        Self::StudentTogetherWithStudentInSubject,
        Self::StudentForbiddenWithStudentInSubject,
        Self::StudentTogetherWithStudent,
        Self::StudentForbiddenWithStudent,
        Self::CourseDummyStudents,
        Self::IgnoreStudent,
        Self::IgnoreCourseInSpread,
    ];

    /// Stable numeric code (1..=18).
    pub fn code(self) -> i32 {
        match self {
            Self::KindLockedInTrackRange => 1,
            Self::CourseFixedInTrack => 2,
            Self::CourseLockedInTrack => 3,
            Self::StudentFixedInCourse => 4,
            Self::StudentForbiddenInCourse => 5,
            Self::KindAloneInTrackRange => 6,
            Self::CourseForbiddenWithCourse => 7,
            Self::CourseTogetherWithCourse => 8,
            Self::CourseDummyStudents => 9,
            Self::RespectTeachers => 10,
            Self::StudentTogetherWithStudentInSubject => 11,
            Self::StudentForbiddenWithStudentInSubject => 12,
            Self::StudentTogetherWithStudent => 13,
            Self::StudentForbiddenWithStudent => 14,
            Self::CourseMaxStudents => 15,
            Self::IgnoreStudent => 16,
            Self::IgnoreCourseInSpread => 17,
            Self::SubjectKindMaxPerTrack => 18,
        }
    }

    /// Parses a numeric code.
    pub fn from_code(code: i32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| BlockungError::InvalidRule(format!("unknown rule type {code}")))
    }

    /// Number of positional parameters.
    pub fn param_count(self) -> usize {
        match self {
            Self::RespectTeachers => 0,
            Self::IgnoreStudent | Self::IgnoreCourseInSpread => 1,
            Self::KindLockedInTrackRange
            | Self::KindAloneInTrackRange
            | Self::StudentTogetherWithStudentInSubject
            | Self::StudentForbiddenWithStudentInSubject
            | Self::SubjectKindMaxPerTrack => 3,
            _ => 2,
        }
    }
}

impl RuleKind {
    /// Discriminant of this rule.
    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::KindLockedInTrackRange { .. } => RuleType::KindLockedInTrackRange,
            Self::CourseFixedInTrack { .. } => RuleType::CourseFixedInTrack,
            Self::CourseLockedInTrack { .. } => RuleType::CourseLockedInTrack,
            Self::StudentFixedInCourse { .. } => RuleType::StudentFixedInCourse,
            Self::StudentForbiddenInCourse { .. } => RuleType::StudentForbiddenInCourse,
            Self::KindAloneInTrackRange { .. } => RuleType::KindAloneInTrackRange,
            Self::CourseForbiddenWithCourse { .. } => RuleType::CourseForbiddenWithCourse,
            Self::CourseTogetherWithCourse { .. } => RuleType::CourseTogetherWithCourse,
            Self::CourseDummyStudents { .. } => RuleType::CourseDummyStudents,
            Self::RespectTeachers => RuleType::RespectTeachers,
            Self::StudentTogetherWithStudentInSubject { .. } => {
                RuleType::StudentTogetherWithStudentInSubject
            }
            Self::StudentForbiddenWithStudentInSubject { .. } => {
                RuleType::StudentForbiddenWithStudentInSubject
            }
            Self::StudentTogetherWithStudent { .. } => RuleType::StudentTogetherWithStudent,
            Self::StudentForbiddenWithStudent { .. } => RuleType::StudentForbiddenWithStudent,
            Self::CourseMaxStudents { .. } => RuleType::CourseMaxStudents,
            Self::IgnoreStudent { .. } => RuleType::IgnoreStudent,
            Self::IgnoreCourseInSpread { .. } => RuleType::IgnoreCourseInSpread,
            Self::SubjectKindMaxPerTrack { .. } => RuleType::SubjectKindMaxPerTrack,
        }
    }

    /// Converts the positional external format into a typed rule.
    ///
    /// Fails on an unknown type code, a wrong parameter count, an unknown
    /// course kind code or a value that does not fit its field. Inverted
    /// track ranges and negative counts or maxima are rejected as well.
    pub fn from_params(code: i32, params: &[i64]) -> Result<Self> {
        let rule_type = RuleType::from_code(code)?;
        if params.len() != rule_type.param_count() {
            return Err(BlockungError::InvalidRule(format!(
                "rule type {code} expects {} parameters, got {}",
                rule_type.param_count(),
                params.len()
            )));
        }
        let int = |i: usize| -> Result<i32> {
            i32::try_from(params[i]).map_err(|_| {
                BlockungError::InvalidRule(format!("parameter {} of rule type {code} out of range", i + 1))
            })
        };
        let p = params;
        let kind = match rule_type {
            RuleType::KindLockedInTrackRange => Self::KindLockedInTrackRange {
                kind: CourseKind::from_code(p[0])?,
                from: int(1)?,
                to: int(2)?,
            },
            RuleType::CourseFixedInTrack => Self::CourseFixedInTrack {
                course: p[0],
                track_number: int(1)?,
            },
            RuleType::CourseLockedInTrack => Self::CourseLockedInTrack {
                course: p[0],
                track_number: int(1)?,
            },
            RuleType::StudentFixedInCourse => Self::StudentFixedInCourse {
                student: p[0],
                course: p[1],
            },
            RuleType::StudentForbiddenInCourse => Self::StudentForbiddenInCourse {
                student: p[0],
                course: p[1],
            },
            RuleType::KindAloneInTrackRange => Self::KindAloneInTrackRange {
                kind: CourseKind::from_code(p[0])?,
                from: int(1)?,
                to: int(2)?,
            },
            RuleType::CourseForbiddenWithCourse => Self::CourseForbiddenWithCourse {
                course1: p[0],
                course2: p[1],
            },
            RuleType::CourseTogetherWithCourse => Self::CourseTogetherWithCourse {
                course1: p[0],
                course2: p[1],
            },
            RuleType::CourseDummyStudents => Self::CourseDummyStudents {
                course: p[0],
                count: int(1)?,
            },
            RuleType::RespectTeachers => Self::RespectTeachers,
            RuleType::StudentTogetherWithStudentInSubject => {
                Self::StudentTogetherWithStudentInSubject {
                    student1: p[0],
                    student2: p[1],
                    subject: p[2],
                }
            }
            RuleType::StudentForbiddenWithStudentInSubject => {
                Self::StudentForbiddenWithStudentInSubject {
                    student1: p[0],
                    student2: p[1],
                    subject: p[2],
                }
            }
            RuleType::StudentTogetherWithStudent => Self::StudentTogetherWithStudent {
                student1: p[0],
                student2: p[1],
            },
            RuleType::StudentForbiddenWithStudent => Self::StudentForbiddenWithStudent {
                student1: p[0],
                student2: p[1],
            },
            RuleType::CourseMaxStudents => Self::CourseMaxStudents {
                course: p[0],
                max: int(1)?,
            },
            RuleType::IgnoreStudent => Self::IgnoreStudent { student: p[0] },
            RuleType::IgnoreCourseInSpread => Self::IgnoreCourseInSpread { course: p[0] },
            RuleType::SubjectKindMaxPerTrack => Self::SubjectKindMaxPerTrack {
                subject: p[0],
                kind: CourseKind::from_code(p[1])?,
                max: int(2)?,
            },
        };
        kind.check_values(code)?;
        Ok(kind)
    }

    /// Rejects inverted track ranges and negative counts or limits.
    fn check_values(&self, code: i32) -> Result<()> {
        let problem = match *self {
            Self::KindLockedInTrackRange { from, to, .. } | Self::KindAloneInTrackRange { from, to, .. }
                if from > to =>
            {
                format!("track range {from}..={to} is inverted")
            }
            Self::CourseDummyStudents { count, .. } if count < 0 => format!("negative count {count}"),
            Self::CourseMaxStudents { max, .. } | Self::SubjectKindMaxPerTrack { max, .. } if max < 0 => {
                format!("negative maximum {max}")
            }
            _ => return Ok(()),
        };
        Err(BlockungError::InvalidRule(format!("rule type {code}: {problem}")))
    }

    /// Positional parameters in external order.
    pub fn params(&self) -> Vec<i64> {
        match *self {
            Self::KindLockedInTrackRange { kind, from, to }
            | Self::KindAloneInTrackRange { kind, from, to } => {
                vec![kind.code(), from.into(), to.into()]
            }
            Self::CourseFixedInTrack { course, track_number }
            | Self::CourseLockedInTrack { course, track_number } => {
                vec![course, track_number.into()]
            }
            Self::StudentFixedInCourse { student, course }
            | Self::StudentForbiddenInCourse { student, course } => vec![student, course],
            Self::CourseForbiddenWithCourse { course1, course2 }
            | Self::CourseTogetherWithCourse { course1, course2 } => vec![course1, course2],
            Self::CourseDummyStudents { course, count } => vec![course, count.into()],
            Self::RespectTeachers => Vec::new(),
            Self::StudentTogetherWithStudentInSubject {
                student1,
                student2,
                subject,
            }
            | Self::StudentForbiddenWithStudentInSubject {
                student1,
                student2,
                subject,
            } => vec![student1, student2, subject],
            Self::StudentTogetherWithStudent { student1, student2 }
            | Self::StudentForbiddenWithStudent { student1, student2 } => vec![student1, student2],
            Self::CourseMaxStudents { course, max } => vec![course, max.into()],
            Self::IgnoreStudent { student } => vec![student],
            Self::IgnoreCourseInSpread { course } => vec![course],
            Self::SubjectKindMaxPerTrack { subject, kind, max } => {
                vec![subject, kind.code(), max.into()]
            }
        }
    }

    /// Whether the rule mentions the course.
    pub fn references_course(&self, id: CourseId) -> bool {
        match *self {
            Self::CourseFixedInTrack { course, .. }
            | Self::CourseLockedInTrack { course, .. }
            | Self::StudentFixedInCourse { course, .. }
            | Self::StudentForbiddenInCourse { course, .. }
            | Self::CourseDummyStudents { course, .. }
            | Self::CourseMaxStudents { course, .. }
            | Self::IgnoreCourseInSpread { course } => course == id,
            Self::CourseForbiddenWithCourse { course1, course2 }
            | Self::CourseTogetherWithCourse { course1, course2 } => {
                course1 == id || course2 == id
            }
            _ => false,
        }
    }

    /// Student pair of a rule of type 11 to 14.
    pub fn student_pair(&self) -> Option<(StudentId, StudentId)> {
        match *self {
            Self::StudentTogetherWithStudentInSubject {
                student1, student2, ..
            }
            | Self::StudentForbiddenWithStudentInSubject {
                student1, student2, ..
            }
            | Self::StudentTogetherWithStudent { student1, student2 }
            | Self::StudentForbiddenWithStudent { student1, student2 } => {
                Some((student1, student2))
            }
            _ => None,
        }
    }

    /// Subject-kind of a rule of type 18.
    pub fn subject_kind(&self) -> Option<SubjectKind> {
        match *self {
            Self::SubjectKindMaxPerTrack { subject, kind, .. } => {
                Some(SubjectKind::new(subject, kind))
            }
            _ => None,
        }
    }
}
