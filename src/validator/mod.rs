//! Rule validation.
//!
//! Checks every stored rule against a freshly built [`Index`] and returns
//! structured [`RuleViolation`] records. Rendering records to text is done
//! separately by [`format`].
//!
//! Rules are checked grouped by type in code order (1, 2, ..., 18) and in
//! insertion order within a type. Types 9, 16 and 17 have no check; they
//! only influence the index and the score.
//!
//! # Usage
//!
//! ```
//! use u_blockung::config::SortOrder;
//! use u_blockung::index::Index;
//! use u_blockung::models::{Assignment, BlockingData};
//! use u_blockung::validator;
//!
//! let data = BlockingData::new(1, "Q1").with_numbered_tracks(1, 3);
//! let (index, _) = Index::build(&data, &Assignment::new(), SortOrder::default());
//! let report = validator::validate(&data, &index).unwrap();
//! assert!(report.is_empty());
//! ```

pub mod format;

use std::collections::BTreeSet;

use crate::error::{BlockungError, Result};
use crate::index::{sort_courses, Index};
use crate::models::{
    BlockingData, CourseId, CourseKind, Rule, RuleId, RuleKind, RuleType, StudentId, SubjectId,
    SubjectKind, TrackId,
};

/// One violated rule instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Violated rule.
    pub rule_id: RuleId,
    /// Type of the violated rule.
    pub rule_type: RuleType,
    /// What exactly is wrong.
    pub detail: ViolationDetail,
}

/// Structured content of a violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationDetail {
    /// A course of a locked kind lies in a locked track (type 1).
    KindInLockedTrack { course: CourseId, track_number: i32 },
    /// A course is missing from its fixed track (type 2).
    CourseNotInFixedTrack { course: CourseId, track_number: i32 },
    /// A course lies in a locked track (type 3).
    CourseInLockedTrack { course: CourseId, track_number: i32 },
    /// A fixed student is not enrolled (type 4).
    StudentNotInFixedCourse { student: StudentId, course: CourseId },
    /// A forbidden student is enrolled (type 5).
    StudentInForbiddenCourse { student: StudentId, course: CourseId },
    /// A course lies on the wrong side of an exclusive track range (type 6).
    KindOutsideExclusiveRange { course: CourseId, from: i32, to: i32 },
    /// Two courses that must stay apart share a track (type 7).
    CoursesShareTrack {
        course1: CourseId,
        course2: CourseId,
        track_number: i32,
    },
    /// A track of the smaller course is missing from the other (type 8).
    CoursesNotTogether { course1: CourseId, course2: CourseId },
    /// Two courses with a common teacher share a track (type 10).
    TeacherInParallelCourses {
        course1: CourseId,
        course2: CourseId,
        teacher: String,
        track_number: i32,
    },
    /// A student pair rule names a subject the student has not chosen
    /// (types 11 and 12).
    StudentLacksSubject { student: StudentId, subject: SubjectId },
    /// The students chose the subject with different kinds (types 11 and 12).
    StudentsDifferentKind {
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    },
    /// The students should share a course but do not (types 11 and 13).
    StudentsNotTogether {
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    },
    /// The students should not share a course but do (types 12 and 14).
    StudentsTogether {
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    },
    /// Students plus dummies exceed the maximum (type 15).
    CourseOverCapacity { course: CourseId, headcount: u32, max: i32 },
    /// Too many courses of one subject-kind in a track (type 18).
    SubjectKindOverfullTrack {
        track: TrackId,
        subject_kind: SubjectKind,
        count: usize,
        max: i32,
    },
}

/// All violations of one revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationReport {
    /// Violations in check order.
    pub violations: Vec<RuleViolation>,
}

impl ViolationReport {
    /// Whether no rule is violated.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Rule ids, one entry per violation.
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.violations.iter().map(|v| v.rule_id).collect()
    }

    /// Violations of one type.
    pub fn of_type(&self, rule_type: RuleType) -> impl Iterator<Item = &RuleViolation> {
        self.violations.iter().filter(move |v| v.rule_type == rule_type)
    }

    /// Whether the rule is violated at least once.
    pub fn is_violated(&self, rule_id: RuleId) -> bool {
        self.violations.iter().any(|v| v.rule_id == rule_id)
    }
}

/// Checks all rules of the blocking.
///
/// Fails on a rule that refers to an unknown course, subject or track
/// number, and on a type-15 maximum outside `0..=100`.
pub fn validate(data: &BlockingData, index: &Index) -> Result<ViolationReport> {
    let mut checker = Checker {
        data,
        index,
        out: Vec::new(),
    };
    for rule_type in RuleType::ALL {
        for rule in data.rules_of_type(rule_type) {
            checker.check(rule)?;
        }
    }
    Ok(ViolationReport {
        violations: checker.out,
    })
}

struct Checker<'a> {
    data: &'a BlockingData,
    index: &'a Index,
    out: Vec<RuleViolation>,
}

impl<'a> Checker<'a> {
    fn push(&mut self, rule: &Rule, detail: ViolationDetail) {
        self.out.push(RuleViolation {
            rule_id: rule.id,
            rule_type: rule.rule_type(),
            detail,
        });
    }

    fn track_id(&self, number: i32) -> Result<TrackId> {
        self.index
            .track_by_number
            .get(&number)
            .copied()
            .ok_or(BlockungError::UnknownTrackNumber(number))
    }

    fn track_number(&self, track: TrackId) -> Result<i32> {
        self.index
            .track_number
            .get(&track)
            .copied()
            .ok_or(BlockungError::UnknownTrack(track))
    }

    fn course_tracks(&self, course: CourseId) -> Result<&'a BTreeSet<TrackId>> {
        self.index
            .course_tracks
            .get(&course)
            .ok_or(BlockungError::UnknownCourse(course))
    }

    fn sorted_track_courses(&self, track: TrackId) -> Vec<CourseId> {
        let mut list: Vec<CourseId> = self
            .index
            .track_courses
            .get(&track)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        sort_courses(self.data, &mut list, self.index.sort_order);
        list
    }

    fn is_enrolled(&self, student: StudentId, course: CourseId) -> bool {
        self.index
            .student_courses
            .get(&student)
            .is_some_and(|s| s.contains(&course))
    }

    fn check(&mut self, rule: &Rule) -> Result<()> {
        match rule.kind {
            RuleKind::KindLockedInTrackRange { kind, from, to } => {
                self.kind_locked(rule, kind, from, to)
            }
            RuleKind::CourseFixedInTrack {
                course,
                track_number,
            } => {
                let track = self.track_id(track_number)?;
                if !self.course_tracks(course)?.contains(&track) {
                    self.push(
                        rule,
                        ViolationDetail::CourseNotInFixedTrack {
                            course,
                            track_number,
                        },
                    );
                }
                Ok(())
            }
            RuleKind::CourseLockedInTrack {
                course,
                track_number,
            } => {
                let track = self.track_id(track_number)?;
                if self.course_tracks(course)?.contains(&track) {
                    self.push(
                        rule,
                        ViolationDetail::CourseInLockedTrack {
                            course,
                            track_number,
                        },
                    );
                }
                Ok(())
            }
            RuleKind::StudentFixedInCourse { student, course } => {
                if !self.is_enrolled(student, course) {
                    self.push(rule, ViolationDetail::StudentNotInFixedCourse { student, course });
                }
                Ok(())
            }
            RuleKind::StudentForbiddenInCourse { student, course } => {
                if self.is_enrolled(student, course) {
                    self.push(rule, ViolationDetail::StudentInForbiddenCourse { student, course });
                }
                Ok(())
            }
            RuleKind::KindAloneInTrackRange { kind, from, to } => {
                self.kind_alone(rule, kind, from, to)
            }
            RuleKind::CourseForbiddenWithCourse { course1, course2 } => {
                let set2 = self.course_tracks(course2)?;
                for &track in self.course_tracks(course1)? {
                    if set2.contains(&track) {
                        let track_number = self.track_number(track)?;
                        self.push(
                            rule,
                            ViolationDetail::CoursesShareTrack {
                                course1,
                                course2,
                                track_number,
                            },
                        );
                    }
                }
                Ok(())
            }
            RuleKind::CourseTogetherWithCourse { course1, course2 } => {
                let set1 = self.course_tracks(course1)?;
                let set2 = self.course_tracks(course2)?;
                // The smaller set must be contained in the larger one.
                let (small, large) = if set1.len() < set2.len() {
                    (set1, set2)
                } else {
                    (set2, set1)
                };
                for track in small {
                    if !large.contains(track) {
                        self.push(rule, ViolationDetail::CoursesNotTogether { course1, course2 });
                    }
                }
                Ok(())
            }
            RuleKind::RespectTeachers => self.teachers(rule),
            RuleKind::StudentTogetherWithStudentInSubject {
                student1,
                student2,
                subject,
            } => self.student_pair_in_subject(rule, student1, student2, subject, true),
            RuleKind::StudentForbiddenWithStudentInSubject {
                student1,
                student2,
                subject,
            } => self.student_pair_in_subject(rule, student1, student2, subject, false),
            RuleKind::StudentTogetherWithStudent { student1, student2 } => {
                self.student_pair(rule, student1, student2, true);
                Ok(())
            }
            RuleKind::StudentForbiddenWithStudent { student1, student2 } => {
                self.student_pair(rule, student1, student2, false);
                Ok(())
            }
            RuleKind::CourseMaxStudents { course, max } => {
                if !(0..=100).contains(&max) {
                    return Err(BlockungError::InvalidRule(format!(
                        "rule {}: maximum of {max} students for course {} is out of range",
                        rule.id,
                        self.data.course_name(course)
                    )));
                }
                if !self.index.course_ids.contains(&course) {
                    return Err(BlockungError::UnknownCourse(course));
                }
                let headcount = self.index.course_size_with_dummies(course);
                if i64::from(headcount) > i64::from(max) {
                    self.push(
                        rule,
                        ViolationDetail::CourseOverCapacity {
                            course,
                            headcount,
                            max,
                        },
                    );
                }
                Ok(())
            }
            RuleKind::SubjectKindMaxPerTrack { subject, kind, max } => {
                if max < 0 {
                    return Err(BlockungError::InvalidRule(format!(
                        "rule {}: negative maximum {max} of courses per track for {}",
                        rule.id,
                        self.data.subject_kind_name(SubjectKind::new(subject, kind))
                    )));
                }
                let subject_kind = SubjectKind::new(subject, kind);
                let tracks: Vec<TrackId> = self.index.tracks_by_number().collect();
                for track in tracks {
                    let count = self
                        .index
                        .track_kind_courses
                        .get(&(track, subject_kind))
                        .map_or(0, Vec::len);
                    if count as i64 > i64::from(max) {
                        self.push(
                            rule,
                            ViolationDetail::SubjectKindOverfullTrack {
                                track,
                                subject_kind,
                                count,
                                max,
                            },
                        );
                    }
                }
                Ok(())
            }
            RuleKind::CourseDummyStudents { .. }
            | RuleKind::IgnoreStudent { .. }
            | RuleKind::IgnoreCourseInSpread { .. } => Ok(()),
        }
    }

    // ======================== Track rules ========================

    fn kind_locked(&mut self, rule: &Rule, kind: CourseKind, from: i32, to: i32) -> Result<()> {
        for track_number in from..=to {
            let track = self.track_id(track_number)?;
            for course in self.sorted_track_courses(track) {
                if self.data.course(course)?.kind == kind {
                    self.push(rule, ViolationDetail::KindInLockedTrack { course, track_number });
                }
            }
        }
        Ok(())
    }

    fn kind_alone(&mut self, rule: &Rule, kind: CourseKind, from: i32, to: i32) -> Result<()> {
        let data = self.data;
        for course in &data.courses {
            let tracks = self.course_tracks(course.id)?;
            let mut numbers = Vec::with_capacity(tracks.len());
            for &t in tracks {
                numbers.push(self.track_number(t)?);
            }
            numbers.sort_unstable();
            for nr in numbers {
                let is_kind = course.kind == kind;
                let in_range = (from..=to).contains(&nr);
                if is_kind != in_range {
                    self.push(
                        rule,
                        ViolationDetail::KindOutsideExclusiveRange {
                            course: course.id,
                            from,
                            to,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn teachers(&mut self, rule: &Rule) -> Result<()> {
        let data = self.data;
        let tracks: Vec<TrackId> = self.index.tracks_by_number().collect();
        for track in tracks {
            let track_number = self.track_number(track)?;
            let courses = self.sorted_track_courses(track);
            for &c1 in &courses {
                for &c2 in &courses {
                    if c1 >= c2 {
                        continue;
                    }
                    let teachers1 = &data.course(c1)?.teachers;
                    let teachers2 = &data.course(c2)?.teachers;
                    for t1 in teachers1 {
                        if teachers2.iter().any(|t2| t2.id == t1.id) {
                            self.push(
                                rule,
                                ViolationDetail::TeacherInParallelCourses {
                                    course1: c1,
                                    course2: c2,
                                    teacher: t1.short_name.clone(),
                                    track_number,
                                },
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ======================== Student pair rules ========================

    fn student_pair_in_subject(
        &mut self,
        rule: &Rule,
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
        together: bool,
    ) -> Result<()> {
        self.data.subject(subject)?;
        for student in [student1, student2] {
            if !self.data.has_subject(student, subject) {
                self.push(rule, ViolationDetail::StudentLacksSubject { student, subject });
                return Ok(());
            }
        }
        if !self.data.same_kind_in_subject(student1, student2, subject)? {
            self.push(
                rule,
                ViolationDetail::StudentsDifferentKind {
                    student1,
                    student2,
                    subject,
                },
            );
            return Ok(());
        }
        let is_together = self.index.together_in_subject(student1, student2, subject);
        if together && !is_together {
            self.push(
                rule,
                ViolationDetail::StudentsNotTogether {
                    student1,
                    student2,
                    subject,
                },
            );
        } else if !together && is_together {
            self.push(
                rule,
                ViolationDetail::StudentsTogether {
                    student1,
                    student2,
                    subject,
                },
            );
        }
        Ok(())
    }

    fn student_pair(&mut self, rule: &Rule, student1: StudentId, student2: StudentId, together: bool) {
        for sk in self.data.shared_subject_kinds(student1, student2) {
            let subject = sk.subject;
            let is_together = self.index.together_in_subject(student1, student2, subject);
            if together && !is_together {
                self.push(
                    rule,
                    ViolationDetail::StudentsNotTogether {
                        student1,
                        student2,
                        subject,
                    },
                );
            } else if !together && is_together {
                self.push(
                    rule,
                    ViolationDetail::StudentsTogether {
                        student1,
                        student2,
                        subject,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;
    use crate::models::{Assignment, Course, Gender, Student, Subject, SubjectChoice, Teacher};

    fn sample_data() -> BlockingData {
        let mut data = BlockingData::new(1, "Q1")
            .with_numbered_tracks(100, 3)
            .with_subject(Subject::new(1, "M"))
            .with_subject(Subject::new(2, "D"))
            .with_course(Course::new(10, 1, CourseKind::Lk, 1).with_teacher(Teacher::new(1, "MEY")))
            .with_course(Course::new(11, 1, CourseKind::Gk, 1))
            .with_course(Course::new(12, 1, CourseKind::Gk, 2))
            .with_course(Course::new(20, 2, CourseKind::Gk, 1).with_teacher(Teacher::new(1, "MEY")));
        for s in 1..=3 {
            data = data
                .with_student(Student::new(s, "S", format!("N{s}"), Gender::X))
                .with_choice(SubjectChoice::new(s, 1, CourseKind::Gk))
                .with_choice(SubjectChoice::new(s, 2, CourseKind::Gk));
        }
        data
    }

    fn sample_assignment() -> Assignment {
        Assignment::new()
            .with_track(10, 100)
            .with_track(11, 100)
            .with_track(12, 101)
            .with_track(20, 100)
            .with_student(11, 1)
            .with_student(11, 2)
            .with_student(12, 3)
            .with_student(20, 1)
    }

    fn run(data: &BlockingData) -> Result<ViolationReport> {
        let (index, _) = Index::build(data, &sample_assignment(), SortOrder::default());
        validate(data, &index)
    }

    #[test]
    fn test_no_rules_no_violations() {
        assert!(run(&sample_data()).unwrap().is_empty());
    }

    #[test]
    fn test_kind_locked_in_range() {
        let data = sample_data().with_rule(RuleKind::KindLockedInTrackRange {
            kind: CourseKind::Gk,
            from: 1,
            to: 2,
        });
        let report = run(&data).unwrap();
        // Courses 11 and 20 in track 1, course 12 in track 2.
        assert_eq!(report.len(), 3);
        assert!(report
            .violations
            .iter()
            .all(|v| matches!(v.detail, ViolationDetail::KindInLockedTrack { .. })));
    }

    #[test]
    fn test_kind_locked_unknown_track_is_fatal() {
        let data = sample_data().with_rule(RuleKind::KindLockedInTrackRange {
            kind: CourseKind::Gk,
            from: 3,
            to: 4,
        });
        assert_eq!(run(&data), Err(BlockungError::UnknownTrackNumber(4)));
    }

    #[test]
    fn test_course_fixed_and_locked() {
        let data = sample_data()
            .with_rule(RuleKind::CourseFixedInTrack {
                course: 12,
                track_number: 1,
            })
            .with_rule(RuleKind::CourseLockedInTrack {
                course: 12,
                track_number: 2,
            });
        let report = run(&data).unwrap();
        assert_eq!(report.rule_ids(), vec![1, 2]);
    }

    #[test]
    fn test_student_fixed_and_forbidden() {
        let data = sample_data()
            .with_rule(RuleKind::StudentFixedInCourse { student: 3, course: 11 })
            .with_rule(RuleKind::StudentForbiddenInCourse { student: 1, course: 11 })
            .with_rule(RuleKind::StudentForbiddenInCourse { student: 3, course: 11 });
        let report = run(&data).unwrap();
        assert_eq!(report.rule_ids(), vec![1, 2]);
    }

    #[test]
    fn test_kind_alone() {
        let data = sample_data().with_rule(RuleKind::KindAloneInTrackRange {
            kind: CourseKind::Lk,
            from: 1,
            to: 1,
        });
        let report = run(&data).unwrap();
        // GK courses 11 and 20 share track 1 with the LK.
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_course_pairs() {
        let data = sample_data()
            .with_rule(RuleKind::CourseForbiddenWithCourse {
                course1: 10,
                course2: 11,
            })
            .with_rule(RuleKind::CourseTogetherWithCourse {
                course1: 11,
                course2: 12,
            });
        let report = run(&data).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.violations[0].detail,
            ViolationDetail::CoursesShareTrack {
                course1: 10,
                course2: 11,
                track_number: 1
            }
        );
    }

    #[test]
    fn test_teachers() {
        let data = sample_data().with_rule(RuleKind::RespectTeachers);
        let report = run(&data).unwrap();
        assert_eq!(report.len(), 1);
        assert!(matches!(
            &report.violations[0].detail,
            ViolationDetail::TeacherInParallelCourses { course1: 10, course2: 20, teacher, track_number: 1 } if teacher == "MEY"
        ));
    }

    #[test]
    fn test_student_pair_in_subject() {
        let data = sample_data()
            .with_rule(RuleKind::StudentTogetherWithStudentInSubject {
                student1: 1,
                student2: 3,
                subject: 1,
            })
            .with_rule(RuleKind::StudentForbiddenWithStudentInSubject {
                student1: 1,
                student2: 2,
                subject: 1,
            })
            .with_rule(RuleKind::StudentTogetherWithStudentInSubject {
                student1: 1,
                student2: 2,
                subject: 2,
            });
        let report = run(&data).unwrap();
        let details: Vec<_> = report.violations.iter().map(|v| v.detail.clone()).collect();
        assert_eq!(
            details,
            vec![
                ViolationDetail::StudentsNotTogether {
                    student1: 1,
                    student2: 3,
                    subject: 1
                },
                ViolationDetail::StudentsNotTogether {
                    student1: 1,
                    student2: 2,
                    subject: 2
                },
                ViolationDetail::StudentsTogether {
                    student1: 1,
                    student2: 2,
                    subject: 1
                },
            ]
        );
    }

    #[test]
    fn test_student_lacks_subject_stops_check() {
        let data = sample_data()
            .with_subject(Subject::new(3, "E"))
            .with_rule(RuleKind::StudentTogetherWithStudentInSubject {
                student1: 1,
                student2: 2,
                subject: 3,
            });
        let report = run(&data).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.violations[0].detail,
            ViolationDetail::StudentLacksSubject { student: 1, subject: 3 }
        );
    }

    #[test]
    fn test_student_pair_over_shared_kinds() {
        let data = sample_data().with_rule(RuleKind::StudentForbiddenWithStudent {
            student1: 1,
            student2: 2,
        });
        let report = run(&data).unwrap();
        // Together in M (course 11); D not shared as a course.
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_max_students() {
        let data = sample_data()
            .with_rule(RuleKind::CourseMaxStudents { course: 11, max: 1 })
            .with_rule(RuleKind::CourseMaxStudents { course: 12, max: 1 });
        let report = run(&data).unwrap();
        assert_eq!(report.rule_ids(), vec![1]);

        let bad = sample_data().with_rule(RuleKind::CourseMaxStudents { course: 11, max: 101 });
        assert!(matches!(run(&bad), Err(BlockungError::InvalidRule(_))));
    }

    #[test]
    fn test_subject_kind_max_per_track() {
        let data = sample_data()
            .with_rule(RuleKind::SubjectKindMaxPerTrack {
                subject: 1,
                kind: CourseKind::Gk,
                max: 0,
            });
        let report = run(&data).unwrap();
        // One M-GK in track 1, one in track 2.
        assert_eq!(report.len(), 2);

        let bad = sample_data().with_rule(RuleKind::SubjectKindMaxPerTrack {
            subject: 1,
            kind: CourseKind::Gk,
            max: -1,
        });
        assert!(matches!(run(&bad), Err(BlockungError::InvalidRule(_))));
    }
}
