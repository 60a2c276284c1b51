//! Rule diffs.
//!
//! Each `rules_*` method computes the minimal [`RuleUpdate`] that moves the
//! current rule set to the requested one. Nothing is changed until the
//! update is executed with [`ResultEngine::apply_rule_update`].
//!
//! # Conventions
//!
//! | Input | Handling |
//! |-------|----------|
//! | Course pairs (types 7, 8) | Unordered pairs with `id1 < id2` |
//! | Student pairs (types 11 to 14) | Normalized to `(min, max)` first |
//! | Track ranges (types 1, 6) | Normalized to `from <= to` |
//! | Course lists | Unknown course ids fail with [`crate::error::BlockungError::UnknownCourse`] |
//!
//! Rules that contradict the requested one are removed in the same update,
//! so executing a diff never leaves e.g. a course both fixed and locked in
//! one track.

use std::collections::BTreeSet;

use super::mutation::RuleUpdate;
use super::ResultEngine;
use crate::error::{BlockungError, Result};
use crate::models::{
    CourseId, CourseKind, Rule, RuleId, RuleKind, RuleType, StudentId, SubjectChoice, SubjectId,
    SubjectKind, TrackId,
};

/// A rule that exists or would be created.
///
/// Returned by the toggle helpers, which list every cell of a selection
/// whether or not a rule is stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCandidate {
    /// Id of the stored rule, `None` if it does not exist yet.
    pub existing: Option<RuleId>,
    /// Rule content.
    pub kind: RuleKind,
}

/// Which enrolments to fix by the student's exam choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixCategory {
    /// Advanced exam course (rank 1 or 2).
    AdvancedCourse,
    /// Third exam subject.
    ThirdExam,
    /// Advanced exam course or third exam subject.
    AdvancedOrThird,
    /// Fourth exam subject.
    FourthExam,
    /// Any exam subject.
    AnyExam,
    /// Any written subject.
    Written,
}

impl FixCategory {
    pub(crate) fn matches(self, choice: &SubjectChoice) -> bool {
        match self {
            Self::AdvancedCourse => choice.is_abitur_lk(),
            Self::ThirdExam => choice.is_abitur_3(),
            Self::AdvancedOrThird => choice.is_abitur_lk() || choice.is_abitur_3(),
            Self::FourthExam => choice.is_abitur_4(),
            Self::AnyExam => choice.is_abitur(),
            Self::Written => choice.written,
        }
    }
}

fn normalized(a: i64, b: i64) -> (i64, i64) {
    (a.min(b), a.max(b))
}

/// Unordered pairs `(a, b)` with `a < b`.
fn ordered_pairs(ids: &[CourseId]) -> Vec<(CourseId, CourseId)> {
    let set: BTreeSet<CourseId> = ids.iter().copied().collect();
    let mut pairs = Vec::new();
    for &a in &set {
        for &b in set.range(a + 1..) {
            pairs.push((a, b));
        }
    }
    pairs
}

/// The part of `list` from the first of `a`, `b` up to the other, inclusive.
fn filtered_between(list: &[CourseId], a: CourseId, b: CourseId) -> Vec<CourseId> {
    let mut out = Vec::new();
    let mut found_a = false;
    let mut found_b = false;
    for &c in list {
        found_a |= c == a;
        found_b |= c == b;
        if found_a || found_b {
            out.push(c);
        }
        if found_a && found_b {
            break;
        }
    }
    out
}

impl ResultEngine {
    fn candidate(&self, kind: RuleKind) -> RuleCandidate {
        RuleCandidate {
            existing: self.data().find_rule(&kind).map(|r| r.id),
            kind,
        }
    }

    pub(crate) fn check_courses(&self, courses: &[CourseId]) -> Result<()> {
        for &c in courses {
            self.data().course(c)?;
        }
        Ok(())
    }

    // ---- type 1 and 6: kind ranges ----

    /// Type 1: lock `kind` out of tracks `from..=to`.
    ///
    /// Locks and fixes of that kind's courses inside the range become
    /// redundant or contradictory and are dropped.
    pub fn rules_lock_kind_in_range(&self, kind: CourseKind, from: i32, to: i32) -> RuleUpdate {
        let (from, to) = (from.min(to), from.max(to));
        let data = self.data();
        let mut u = RuleUpdate::new();
        for course in data.courses.iter().filter(|c| c.kind == kind) {
            for track_number in from..=to {
                u.remove_existing(
                    data,
                    &RuleKind::CourseLockedInTrack {
                        course: course.id,
                        track_number,
                    },
                );
                u.remove_existing(
                    data,
                    &RuleKind::CourseFixedInTrack {
                        course: course.id,
                        track_number,
                    },
                );
            }
        }
        u.remove_existing(
            data,
            &RuleKind::KindLockedInTrackRange {
                kind,
                from: to,
                to: from,
            },
        );
        u.add_missing(data, RuleKind::KindLockedInTrackRange { kind, from, to });
        u
    }

    /// Drops a type 1 rule, in either range orientation.
    pub fn rules_unlock_kind_in_range(&self, kind: CourseKind, from: i32, to: i32) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        u.remove_existing(self.data(), &RuleKind::KindLockedInTrackRange { kind, from, to });
        u.remove_existing(
            self.data(),
            &RuleKind::KindLockedInTrackRange {
                kind,
                from: to,
                to: from,
            },
        );
        u
    }

    /// Type 6: `kind` alone in tracks `from..=to`.
    ///
    /// Replaces every type 6 rule of the kind, and drops fixes and locks of
    /// courses on the wrong side of the range.
    pub fn rules_kind_alone_in_range(&self, kind: CourseKind, from: i32, to: i32) -> RuleUpdate {
        let (from, to) = (from.min(to), from.max(to));
        let data = self.data();
        let mut u = RuleUpdate::new();
        for rule in data.rules_of_type(RuleType::KindAloneInTrackRange) {
            if matches!(rule.kind, RuleKind::KindAloneInTrackRange { kind: k, .. } if k == kind) {
                u.remove_rule(rule);
            }
        }
        for course in &data.courses {
            for track_number in 1..=self.track_count() {
                let in_range = (from..=to).contains(&track_number);
                if in_range == (course.kind == kind) {
                    continue;
                }
                u.remove_existing(
                    data,
                    &RuleKind::CourseFixedInTrack {
                        course: course.id,
                        track_number,
                    },
                );
                u.remove_existing(
                    data,
                    &RuleKind::CourseLockedInTrack {
                        course: course.id,
                        track_number,
                    },
                );
            }
        }
        u.add_rule(RuleKind::KindAloneInTrackRange { kind, from, to });
        u
    }

    /// Drops every type 6 rule of `kind`.
    pub fn rules_remove_kind_alone(&self, kind: CourseKind) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for rule in self.data().rules_of_type(RuleType::KindAloneInTrackRange) {
            if matches!(rule.kind, RuleKind::KindAloneInTrackRange { kind: k, .. } if k == kind) {
                u.remove_rule(rule);
            }
        }
        u
    }

    // ---- type 2 and 3: course fixes and locks ----

    /// Type 2 for a marked selection: fix each course in the marked tracks
    /// it occupies, and drop its fixes in tracks it does not occupy.
    pub fn rules_fix_courses_in_marked_tracks(&self, courses: &[CourseId], numbers: &[i32]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            for &track_number in numbers {
                if !self.is_course_in_track_number(course, track_number) {
                    continue;
                }
                u.remove_existing(
                    data,
                    &RuleKind::CourseLockedInTrack {
                        course,
                        track_number,
                    },
                );
                u.add_missing(
                    data,
                    RuleKind::CourseFixedInTrack {
                        course,
                        track_number,
                    },
                );
            }
            for track_number in 1..=self.track_count() {
                if !self.is_course_in_track_number(course, track_number) {
                    u.remove_existing(
                        data,
                        &RuleKind::CourseFixedInTrack {
                            course,
                            track_number,
                        },
                    );
                }
            }
        }
        Ok(u)
    }

    /// Drops type 2 fixes in the marked tracks each course occupies.
    pub fn rules_unfix_courses_in_marked_tracks(&self, courses: &[CourseId], numbers: &[i32]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let mut u = RuleUpdate::new();
        for &course in courses {
            for track_number in self.course_track_numbers(course) {
                if numbers.contains(&track_number) {
                    u.remove_existing(
                        self.data(),
                        &RuleKind::CourseFixedInTrack {
                            course,
                            track_number,
                        },
                    );
                }
            }
        }
        Ok(u)
    }

    /// Type 2 for whole courses: fix each course in exactly the tracks it
    /// occupies.
    pub fn rules_fix_courses_in_their_tracks(&self, courses: &[CourseId]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            for track_number in 1..=self.track_count() {
                let kind = RuleKind::CourseFixedInTrack {
                    course,
                    track_number,
                };
                if self.is_course_in_track_number(course, track_number) {
                    u.add_missing(data, kind);
                } else {
                    u.remove_existing(data, &kind);
                }
            }
        }
        Ok(u)
    }

    /// Drops every type 2 fix of the courses.
    pub fn rules_unfix_courses(&self, courses: &[CourseId]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let mut u = RuleUpdate::new();
        for &course in courses {
            for track_number in 1..=self.track_count() {
                u.remove_existing(
                    self.data(),
                    &RuleKind::CourseFixedInTrack {
                        course,
                        track_number,
                    },
                );
            }
        }
        Ok(u)
    }

    /// [`Self::rules_fix_courses_in_their_tracks`] for every course.
    pub fn rules_fix_all_courses_in_their_tracks(&self) -> Result<RuleUpdate> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.rules_fix_courses_in_their_tracks(&all)
    }

    /// [`Self::rules_unfix_courses`] for every course.
    pub fn rules_unfix_all_courses(&self) -> Result<RuleUpdate> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.rules_unfix_courses(&all)
    }

    /// Toggles type 2 fixes in the marked tracks each course occupies. A new
    /// fix replaces a lock in the same track.
    pub fn rules_toggle_course_fixes(&self, courses: &[CourseId], numbers: &[i32]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            for track_number in self.course_track_numbers(course) {
                if !numbers.contains(&track_number) {
                    continue;
                }
                let fix = RuleKind::CourseFixedInTrack {
                    course,
                    track_number,
                };
                if let Some(rule) = data.find_rule(&fix) {
                    u.remove_rule(rule);
                    continue;
                }
                u.add_rule(fix);
                u.remove_existing(
                    data,
                    &RuleKind::CourseLockedInTrack {
                        course,
                        track_number,
                    },
                );
            }
        }
        Ok(u)
    }

    /// Type 2 in one track. A lock there is dropped; if the course already
    /// has all the fixes it may hold, its other fixes are dropped too.
    pub fn rules_fix_course_in_track(&self, course: CourseId, track_number: i32) -> Result<RuleUpdate> {
        let data = self.data();
        data.course(course)?;
        let mut u = RuleUpdate::new();
        u.remove_existing(
            data,
            &RuleKind::CourseLockedInTrack {
                course,
                track_number,
            },
        );
        let fix = RuleKind::CourseFixedInTrack {
            course,
            track_number,
        };
        if data.has_rule(&fix) {
            return Ok(u);
        }
        if !data.further_fixing_allowed(course)? {
            for nr in 1..=self.track_count() {
                u.remove_existing(
                    data,
                    &RuleKind::CourseFixedInTrack {
                        course,
                        track_number: nr,
                    },
                );
            }
        }
        u.add_rule(fix);
        Ok(u)
    }

    /// Drops the type 2 fix of a course in one track.
    pub fn rules_unfix_course_in_track(&self, course: CourseId, track_number: i32) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        u.remove_existing(
            self.data(),
            &RuleKind::CourseFixedInTrack {
                course,
                track_number,
            },
        );
        u
    }

    /// Type 3: lock courses out of tracks. Cells holding a lock or a fix
    /// already are left alone.
    pub fn rules_lock_courses_in_tracks(&self, courses: &[CourseId], numbers: &[i32]) -> RuleUpdate {
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            for &track_number in numbers {
                let fixed = data.is_course_fixed_in_track(course, track_number);
                if !fixed {
                    u.add_missing(
                        data,
                        RuleKind::CourseLockedInTrack {
                            course,
                            track_number,
                        },
                    );
                }
            }
        }
        u
    }

    /// Drops type 3 locks.
    pub fn rules_unlock_courses_in_tracks(&self, courses: &[CourseId], numbers: &[i32]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            for &track_number in numbers {
                u.remove_existing(
                    self.data(),
                    &RuleKind::CourseLockedInTrack {
                        course,
                        track_number,
                    },
                );
            }
        }
        u
    }

    /// Toggles type 3 locks in the marked tracks each course occupies.
    /// Fixed cells are not locked.
    pub fn rules_toggle_course_locks(&self, courses: &[CourseId], numbers: &[i32]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            for track_number in self.course_track_numbers(course) {
                if !numbers.contains(&track_number) {
                    continue;
                }
                let lock = RuleKind::CourseLockedInTrack {
                    course,
                    track_number,
                };
                if let Some(rule) = data.find_rule(&lock) {
                    u.remove_rule(rule);
                } else if !data.is_course_fixed_in_track(course, track_number) {
                    u.add_rule(lock);
                }
            }
        }
        Ok(u)
    }

    // ---- type 4 and 5: student fixes and locks ----

    /// Type 4 for explicit (student, course) pairs.
    ///
    /// Per pair: the student's lock in the course is dropped, the fix is
    /// added if missing, and fixes in other courses of the same subject-kind
    /// are dropped.
    fn fix_student_pairs(&self, pairs: &[(StudentId, CourseId)]) -> Result<RuleUpdate> {
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &(student, course) in pairs {
            let sk = data.course(course)?.subject_kind();
            u.remove_existing(data, &RuleKind::StudentForbiddenInCourse { student, course });
            for other in data.courses_of_subject_kind(sk) {
                let fix = RuleKind::StudentFixedInCourse {
                    student,
                    course: other.id,
                };
                if other.id == course {
                    u.add_missing(data, fix);
                } else {
                    u.remove_existing(data, &fix);
                }
            }
        }
        Ok(u)
    }

    /// Type 4: fix every listed student in every listed course.
    pub fn rules_fix_students_in_courses(&self, students: &[StudentId], courses: &[CourseId]) -> Result<RuleUpdate> {
        let pairs: Vec<(StudentId, CourseId)> = students
            .iter()
            .flat_map(|&s| courses.iter().map(move |&c| (s, c)))
            .collect();
        self.fix_student_pairs(&pairs)
    }

    /// Drops type 4 fixes of the listed students in the listed courses.
    pub fn rules_unfix_students_in_courses(&self, students: &[StudentId], courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &student in students {
            for &course in courses {
                u.remove_existing(self.data(), &RuleKind::StudentFixedInCourse { student, course });
            }
        }
        u
    }

    /// Type 4 for the current students of each course.
    pub fn rules_fix_students_of_courses(&self, courses: &[CourseId]) -> Result<RuleUpdate> {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.merge(self.rules_fix_students_in_courses(&self.course_students(course), &[course])?);
        }
        Ok(u)
    }

    /// Drops the type 4 fixes of the current students of each course.
    pub fn rules_unfix_students_of_courses(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.merge(self.rules_unfix_students_in_courses(&self.course_students(course), &[course]));
        }
        u
    }

    /// [`Self::rules_fix_students_of_courses`] for every course.
    pub fn rules_fix_all_students(&self) -> Result<RuleUpdate> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.rules_fix_students_of_courses(&all)
    }

    /// Drops every type 4 rule.
    pub fn rules_unfix_all_students(&self) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for rule in self.data().rules_of_type(RuleType::StudentFixedInCourse) {
            u.remove_rule(rule);
        }
        u
    }

    /// Toggles the type 4 fix of every current student of each course. The
    /// student's fixes in other courses of the subject-kind are dropped.
    pub fn rules_toggle_student_fixes_of_courses(&self, courses: &[CourseId]) -> Result<RuleUpdate> {
        self.check_courses(courses)?;
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &course in courses {
            let sk = data.course(course)?.subject_kind();
            for student in self.course_students(course) {
                let fix = RuleKind::StudentFixedInCourse { student, course };
                match data.find_rule(&fix) {
                    Some(rule) => u.remove_rule(rule),
                    None => u.add_rule(fix),
                }
                for other in data.courses_of_subject_kind(sk) {
                    if other.id != course {
                        u.remove_existing(
                            data,
                            &RuleKind::StudentFixedInCourse {
                                student,
                                course: other.id,
                            },
                        );
                    }
                }
            }
        }
        Ok(u)
    }

    /// Type 4 for the students of the courses whose choice falls into
    /// `category`.
    pub fn rules_fix_students_by_category(&self, category: FixCategory, courses: &[CourseId]) -> Result<RuleUpdate> {
        let data = self.data();
        let mut pairs = Vec::new();
        for &course in courses {
            let subject = data.course(course)?.subject_id;
            for student in self.course_students(course) {
                if data
                    .choice(student, subject)
                    .is_some_and(|choice| category.matches(choice))
                {
                    pairs.push((student, course));
                }
            }
        }
        self.fix_student_pairs(&pairs)
    }

    /// [`Self::rules_fix_students_by_category`] for every course.
    pub fn rules_fix_all_students_by_category(&self, category: FixCategory) -> Result<RuleUpdate> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.rules_fix_students_by_category(category, &all)
    }

    /// Type 5: forbid every listed student in every listed course. Fixes of
    /// the same cells are dropped.
    pub fn rules_forbid_students_in_courses(&self, students: &[StudentId], courses: &[CourseId]) -> RuleUpdate {
        let data = self.data();
        let mut u = RuleUpdate::new();
        for &student in students {
            for &course in courses {
                u.remove_existing(data, &RuleKind::StudentFixedInCourse { student, course });
                u.add_missing(data, RuleKind::StudentForbiddenInCourse { student, course });
            }
        }
        u
    }

    /// Drops type 5 locks.
    pub fn rules_allow_students_in_courses(&self, students: &[StudentId], courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &student in students {
            for &course in courses {
                u.remove_existing(
                    self.data(),
                    &RuleKind::StudentForbiddenInCourse { student, course },
                );
            }
        }
        u
    }

    /// Type 5 for the current students of each course.
    pub fn rules_forbid_students_of_courses(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.merge(self.rules_forbid_students_in_courses(&self.course_students(course), &[course]));
        }
        u
    }

    /// Drops the type 5 locks of the current students of each course.
    pub fn rules_allow_students_of_courses(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.merge(self.rules_allow_students_in_courses(&self.course_students(course), &[course]));
        }
        u
    }

    // ---- type 7 and 8: course pairs ----

    /// Type 7 for every pair of the courses. Replaces type 8 rules and the
    /// swapped type 7 rule of each pair.
    pub fn rules_keep_courses_apart(&self, courses: &[CourseId]) -> RuleUpdate {
        let data = self.data();
        let mut u = RuleUpdate::new();
        for (c1, c2) in ordered_pairs(courses) {
            u.remove_existing(data, &RuleKind::CourseTogetherWithCourse { course1: c1, course2: c2 });
            u.remove_existing(data, &RuleKind::CourseTogetherWithCourse { course1: c2, course2: c1 });
            u.remove_existing(data, &RuleKind::CourseForbiddenWithCourse { course1: c2, course2: c1 });
            u.add_missing(data, RuleKind::CourseForbiddenWithCourse { course1: c1, course2: c2 });
        }
        u
    }

    /// Drops type 7 rules between the courses, in both orders.
    pub fn rules_remove_courses_apart(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (c1, c2) in ordered_pairs(courses) {
            u.remove_existing(self.data(), &RuleKind::CourseForbiddenWithCourse { course1: c1, course2: c2 });
            u.remove_existing(self.data(), &RuleKind::CourseForbiddenWithCourse { course1: c2, course2: c1 });
        }
        u
    }

    /// Type 8 for every pair of the courses. Replaces type 7 rules and the
    /// swapped type 8 rule of each pair.
    pub fn rules_keep_courses_together(&self, courses: &[CourseId]) -> RuleUpdate {
        let data = self.data();
        let mut u = RuleUpdate::new();
        for (c1, c2) in ordered_pairs(courses) {
            u.remove_existing(data, &RuleKind::CourseForbiddenWithCourse { course1: c1, course2: c2 });
            u.remove_existing(data, &RuleKind::CourseForbiddenWithCourse { course1: c2, course2: c1 });
            u.remove_existing(data, &RuleKind::CourseTogetherWithCourse { course1: c2, course2: c1 });
            u.add_missing(data, RuleKind::CourseTogetherWithCourse { course1: c1, course2: c2 });
        }
        u
    }

    /// Drops type 8 rules between the courses, in both orders.
    pub fn rules_remove_courses_together(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (c1, c2) in ordered_pairs(courses) {
            u.remove_existing(self.data(), &RuleKind::CourseTogetherWithCourse { course1: c1, course2: c2 });
            u.remove_existing(self.data(), &RuleKind::CourseTogetherWithCourse { course1: c2, course2: c1 });
        }
        u
    }

    // ---- course parameters ----

    fn remove_course_rules_of_type(&self, u: &mut RuleUpdate, rule_type: RuleType, course: CourseId) {
        for rule in self.data().rules_of_type(rule_type) {
            if rule.kind.references_course(course) {
                u.remove_rule(rule);
            }
        }
    }

    /// Type 9: replaces the dummy student count of a course. A count of 0
    /// removes it.
    pub fn rules_set_dummy_students(&self, course: CourseId, count: i32) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        self.remove_course_rules_of_type(&mut u, RuleType::CourseDummyStudents, course);
        if count > 0 {
            u.add_rule(RuleKind::CourseDummyStudents { course, count });
        }
        u
    }

    /// Drops the type 9 rule of a course.
    pub fn rules_remove_dummy_students(&self, course: CourseId) -> RuleUpdate {
        self.rules_set_dummy_students(course, 0)
    }

    /// Type 10: switches teacher checking on or off.
    pub fn rules_respect_teachers(&self, on: bool) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        if on {
            u.add_missing(self.data(), RuleKind::RespectTeachers);
        } else {
            u.remove_existing(self.data(), &RuleKind::RespectTeachers);
        }
        u
    }

    /// Type 15: replaces the headcount limit of a course. A limit outside
    /// `0..=99` removes it.
    pub fn rules_set_course_max_students(&self, course: CourseId, max: i32) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        self.remove_course_rules_of_type(&mut u, RuleType::CourseMaxStudents, course);
        if (0..=99).contains(&max) {
            u.add_rule(RuleKind::CourseMaxStudents { course, max });
        }
        u
    }

    /// Drops the type 15 rule of a course.
    pub fn rules_remove_course_max_students(&self, course: CourseId) -> RuleUpdate {
        self.rules_set_course_max_students(course, -1)
    }

    // ---- type 11 to 14: student pairs ----

    /// Schedules removal of the student-pair rules that conflict with
    /// `keep`, which is then added if missing.
    fn replace_pair_rule(&self, s1: StudentId, s2: StudentId, subject: SubjectId, together: bool) -> RuleUpdate {
        let data = self.data();
        let mut u = RuleUpdate::new();
        let in_subject = |a, b, same: bool| {
            if same == together {
                RuleKind::StudentTogetherWithStudentInSubject {
                    student1: a,
                    student2: b,
                    subject,
                }
            } else {
                RuleKind::StudentForbiddenWithStudentInSubject {
                    student1: a,
                    student2: b,
                    subject,
                }
            }
        };
        // Opposite rule in this subject.
        u.remove_existing(data, &in_subject(s1, s2, false));
        u.remove_existing(data, &in_subject(s2, s1, false));
        // Subject-independent rules of either kind.
        for (a, b) in [(s1, s2), (s2, s1)] {
            u.remove_existing(data, &RuleKind::StudentForbiddenWithStudent { student1: a, student2: b });
            u.remove_existing(data, &RuleKind::StudentTogetherWithStudent { student1: a, student2: b });
        }
        u.remove_existing(data, &in_subject(s2, s1, true));
        u.add_missing(data, in_subject(s1, s2, true));
        u
    }

    /// Type 11: two students share their course in a subject.
    pub fn rules_students_together_in_subject(&self, s1: StudentId, s2: StudentId, subject: SubjectId) -> RuleUpdate {
        let (s1, s2) = normalized(s1, s2);
        if s1 == s2 {
            return RuleUpdate::new();
        }
        self.replace_pair_rule(s1, s2, subject, true)
    }

    /// Type 12: two students sit in different courses of a subject.
    pub fn rules_students_apart_in_subject(&self, s1: StudentId, s2: StudentId, subject: SubjectId) -> RuleUpdate {
        let (s1, s2) = normalized(s1, s2);
        if s1 == s2 {
            return RuleUpdate::new();
        }
        self.replace_pair_rule(s1, s2, subject, false)
    }

    /// Drops type 11 rules of the pair in a subject, in both orders.
    pub fn rules_remove_students_together_in_subject(
        &self,
        s1: StudentId,
        s2: StudentId,
        subject: SubjectId,
    ) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (a, b) in [(s1, s2), (s2, s1)] {
            u.remove_existing(
                self.data(),
                &RuleKind::StudentTogetherWithStudentInSubject {
                    student1: a,
                    student2: b,
                    subject,
                },
            );
        }
        u
    }

    /// Drops type 12 rules of the pair in a subject, in both orders.
    pub fn rules_remove_students_apart_in_subject(
        &self,
        s1: StudentId,
        s2: StudentId,
        subject: SubjectId,
    ) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (a, b) in [(s1, s2), (s2, s1)] {
            u.remove_existing(
                self.data(),
                &RuleKind::StudentForbiddenWithStudentInSubject {
                    student1: a,
                    student2: b,
                    subject,
                },
            );
        }
        u
    }

    /// Schedules removal of every type 11 to 14 rule of the pair.
    fn remove_all_pair_rules(&self, u: &mut RuleUpdate, s1: StudentId, s2: StudentId) {
        for rule in self.data().rules() {
            let Some((a, b)) = rule.kind.student_pair() else {
                continue;
            };
            if (a == s1 && b == s2) || (a == s2 && b == s1) {
                u.remove_rule(rule);
            }
        }
    }

    /// Type 13: two students share their course in every common
    /// subject-kind. Replaces every other rule of the pair.
    pub fn rules_students_together(&self, s1: StudentId, s2: StudentId) -> RuleUpdate {
        let (s1, s2) = normalized(s1, s2);
        let mut u = RuleUpdate::new();
        self.remove_all_pair_rules(&mut u, s1, s2);
        if 0 <= s1 && s1 < s2 {
            u.add_rule(RuleKind::StudentTogetherWithStudent {
                student1: s1,
                student2: s2,
            });
        }
        u
    }

    /// Type 14: two students never share a course. Replaces every other
    /// rule of the pair.
    pub fn rules_students_apart(&self, s1: StudentId, s2: StudentId) -> RuleUpdate {
        let (s1, s2) = normalized(s1, s2);
        let mut u = RuleUpdate::new();
        self.remove_all_pair_rules(&mut u, s1, s2);
        if 0 <= s1 && s1 < s2 {
            u.add_rule(RuleKind::StudentForbiddenWithStudent {
                student1: s1,
                student2: s2,
            });
        }
        u
    }

    /// Drops type 13 rules of the pair, in both orders.
    pub fn rules_remove_students_together(&self, s1: StudentId, s2: StudentId) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (a, b) in [(s1, s2), (s2, s1)] {
            u.remove_existing(self.data(), &RuleKind::StudentTogetherWithStudent { student1: a, student2: b });
        }
        u
    }

    /// Drops type 14 rules of the pair, in both orders.
    pub fn rules_remove_students_apart(&self, s1: StudentId, s2: StudentId) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for (a, b) in [(s1, s2), (s2, s1)] {
            u.remove_existing(self.data(), &RuleKind::StudentForbiddenWithStudent { student1: a, student2: b });
        }
        u
    }

    // ---- type 16 to 18 ----

    /// Type 16: ignore the choice conflicts of the students.
    pub fn rules_ignore_students(&self, students: &[StudentId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &student in students {
            u.add_missing(self.data(), RuleKind::IgnoreStudent { student });
        }
        u
    }

    /// Drops type 16 rules.
    pub fn rules_unignore_students(&self, students: &[StudentId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &student in students {
            u.remove_existing(self.data(), &RuleKind::IgnoreStudent { student });
        }
        u
    }

    /// Type 17: leave the courses out of the spread display.
    pub fn rules_ignore_courses_in_spread(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.add_missing(self.data(), RuleKind::IgnoreCourseInSpread { course });
        }
        u
    }

    /// Drops type 17 rules.
    pub fn rules_unignore_courses_in_spread(&self, courses: &[CourseId]) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        for &course in courses {
            u.remove_existing(self.data(), &RuleKind::IgnoreCourseInSpread { course });
        }
        u
    }

    fn remove_subject_kind_limits(&self, u: &mut RuleUpdate, subject: SubjectId, kind: CourseKind) {
        for rule in self.data().rules_of_type(RuleType::SubjectKindMaxPerTrack) {
            if matches!(rule.kind, RuleKind::SubjectKindMaxPerTrack { subject: s, kind: k, .. } if s == subject && k == kind)
            {
                u.remove_rule(rule);
            }
        }
    }

    /// Type 18: at most `max` courses of the subject-kind per track.
    ///
    /// With `max == 1` the type 7 rules between courses of that subject-kind
    /// are implied and dropped.
    ///
    /// # Errors
    /// Fails with [`BlockungError::InvalidParameter`] for a negative `max`.
    pub fn rules_set_subject_kind_max_per_track(
        &self,
        subject: SubjectId,
        kind: CourseKind,
        max: i32,
    ) -> Result<RuleUpdate> {
        if max < 0 {
            return Err(BlockungError::InvalidParameter(format!(
                "maximum {max} of {} courses per track is negative",
                self.data().subject_kind_name(SubjectKind::new(subject, kind))
            )));
        }
        let data = self.data();
        let mut u = RuleUpdate::new();
        self.remove_subject_kind_limits(&mut u, subject, kind);
        if max == 1 {
            let of_kind = |id: CourseId| {
                data.course(id)
                    .is_ok_and(|c| c.subject_id == subject && c.kind == kind)
            };
            for rule in data.rules_of_type(RuleType::CourseForbiddenWithCourse) {
                if let RuleKind::CourseForbiddenWithCourse { course1, course2 } = rule.kind {
                    if of_kind(course1) && of_kind(course2) {
                        u.remove_rule(rule);
                    }
                }
            }
        }
        u.add_rule(RuleKind::SubjectKindMaxPerTrack { subject, kind, max });
        Ok(u)
    }

    /// Drops the type 18 rule of a subject-kind.
    pub fn rules_remove_subject_kind_max_per_track(&self, subject: SubjectId, kind: CourseKind) -> RuleUpdate {
        let mut u = RuleUpdate::new();
        self.remove_subject_kind_limits(&mut u, subject, kind);
        u
    }

    // ---- toggle selections ----

    fn selection_range(&self, track_a: TrackId, track_b: TrackId) -> Result<(i32, i32)> {
        let a = self.data().track(track_a)?.number;
        let b = self.data().track(track_b)?.number;
        Ok((a.min(b), a.max(b)))
    }

    /// Type 3 cells of a rectangular selection: the courses of `list`
    /// between `course_a` and `course_b` times the track numbers between
    /// `track_a` and `track_b`.
    pub fn toggle_lock_candidates(
        &self,
        list: &[CourseId],
        course_a: CourseId,
        course_b: CourseId,
        track_a: TrackId,
        track_b: TrackId,
    ) -> Result<Vec<RuleCandidate>> {
        let (min, max) = self.selection_range(track_a, track_b)?;
        let mut out = Vec::new();
        for course in filtered_between(list, course_a, course_b) {
            for track_number in min..=max {
                out.push(self.candidate(RuleKind::CourseLockedInTrack {
                    course,
                    track_number,
                }));
            }
        }
        Ok(out)
    }

    /// Type 2 cells of a rectangular selection, limited to tracks the
    /// courses occupy.
    pub fn toggle_course_fix_candidates(
        &self,
        list: &[CourseId],
        course_a: CourseId,
        course_b: CourseId,
        track_a: TrackId,
        track_b: TrackId,
    ) -> Result<Vec<RuleCandidate>> {
        let (min, max) = self.selection_range(track_a, track_b)?;
        let mut out = Vec::new();
        for course in filtered_between(list, course_a, course_b) {
            for track_number in self.course_track_numbers(course) {
                if (min..=max).contains(&track_number) {
                    out.push(self.candidate(RuleKind::CourseFixedInTrack {
                        course,
                        track_number,
                    }));
                }
            }
        }
        Ok(out)
    }

    /// Type 4 cells of a rectangular selection: the students of every
    /// selected course that occupies a selected track. A course spanning
    /// several selected tracks contributes its students once.
    pub fn toggle_student_fix_candidates(
        &self,
        list: &[CourseId],
        course_a: CourseId,
        course_b: CourseId,
        track_a: TrackId,
        track_b: TrackId,
    ) -> Result<Vec<RuleCandidate>> {
        let (min, max) = self.selection_range(track_a, track_b)?;
        let mut out = Vec::new();
        for course in filtered_between(list, course_a, course_b) {
            let hit = self
                .course_track_numbers(course)
                .into_iter()
                .any(|nr| (min..=max).contains(&nr));
            if hit {
                for student in self.course_students(course) {
                    out.push(self.candidate(RuleKind::StudentFixedInCourse { student, course }));
                }
            }
        }
        Ok(out)
    }

    /// Turns a selection into an update: cells holding a rule lose it,
    /// empty cells gain one.
    ///
    /// # Errors
    /// Fails if a candidate names a rule id that no longer exists.
    pub fn rules_toggle_candidates(&self, candidates: &[RuleCandidate]) -> Result<RuleUpdate> {
        let mut u = RuleUpdate::new();
        for c in candidates {
            match c.existing {
                Some(id) => u.remove_rule(self.data().rule(id)?),
                None => u.add_rule(c.kind.clone()),
            }
        }
        Ok(u)
    }

    // ---- stored fixes ----

    /// All type 2 rules.
    pub fn course_fix_rules(&self) -> Vec<&Rule> {
        self.data().rules_of_type(RuleType::CourseFixedInTrack).collect()
    }

    /// Type 2 rules of one course.
    pub fn course_fix_rules_of(&self, course: CourseId) -> Vec<&Rule> {
        self.course_fix_rules_of_set(&[course])
    }

    /// Type 2 rules of any of the courses.
    pub fn course_fix_rules_of_set(&self, courses: &[CourseId]) -> Vec<&Rule> {
        self.data()
            .rules_of_type(RuleType::CourseFixedInTrack)
            .filter(|r| matches!(r.kind, RuleKind::CourseFixedInTrack { course, .. } if courses.contains(&course)))
            .collect()
    }

    /// All type 4 rules.
    pub fn student_fix_rules(&self) -> Vec<&Rule> {
        self.data().rules_of_type(RuleType::StudentFixedInCourse).collect()
    }

    /// Type 4 rules naming one course.
    pub fn student_fix_rules_of(&self, course: CourseId) -> Vec<&Rule> {
        self.student_fix_rules_of_set(&[course])
    }

    /// Type 4 rules naming any of the courses.
    pub fn student_fix_rules_of_set(&self, courses: &[CourseId]) -> Vec<&Rule> {
        self.data()
            .rules_of_type(RuleType::StudentFixedInCourse)
            .filter(|r| matches!(r.kind, RuleKind::StudentFixedInCourse { course, .. } if courses.contains(&course)))
            .collect()
    }

    // ---- missing fixes ----

    /// Type 2 rules that would fix every course in its current tracks.
    pub fn missing_course_fixes(&self) -> Vec<RuleKind> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.missing_course_fixes_of(&all)
    }

    /// Type 2 rules that would fix the courses in their current tracks.
    pub fn missing_course_fixes_of(&self, courses: &[CourseId]) -> Vec<RuleKind> {
        let mut out = Vec::new();
        for &course in courses {
            for track_number in self.course_track_numbers(course) {
                if !self.data().is_course_fixed_in_track(course, track_number) {
                    out.push(RuleKind::CourseFixedInTrack {
                        course,
                        track_number,
                    });
                }
            }
        }
        out
    }

    /// Type 4 rules that would fix every student in its current courses.
    pub fn missing_student_fixes(&self) -> Vec<RuleKind> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.missing_student_fixes_of(&all)
    }

    /// Type 4 rules that would fix the students of the courses.
    pub fn missing_student_fixes_of(&self, courses: &[CourseId]) -> Vec<RuleKind> {
        self.missing_student_fixes_where(courses, |_, _| true)
    }

    /// Like [`Self::missing_student_fixes`], for exam subjects only.
    pub fn missing_abitur_student_fixes(&self) -> Vec<RuleKind> {
        let all: Vec<CourseId> = self.course_id_set().into_iter().collect();
        self.missing_abitur_student_fixes_of(&all)
    }

    /// Like [`Self::missing_student_fixes_of`], for exam subjects only.
    pub fn missing_abitur_student_fixes_of(&self, courses: &[CourseId]) -> Vec<RuleKind> {
        self.missing_student_fixes_where(courses, |student, course| {
            self.is_abitur_in_course(student, course)
        })
    }

    fn missing_student_fixes_where<F>(&self, courses: &[CourseId], keep: F) -> Vec<RuleKind>
    where
        F: Fn(StudentId, CourseId) -> bool,
    {
        let mut out = Vec::new();
        for &course in courses {
            for student in self.course_students(course) {
                if keep(student, course) && !self.data().is_student_fixed_in_course(student, course) {
                    out.push(RuleKind::StudentFixedInCourse { student, course });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::*;
    use crate::models::BlockingData;

    fn kinds(rules: &[Rule]) -> Vec<RuleKind> {
        rules.iter().map(|r| r.kind.clone()).collect()
    }

    #[test]
    fn test_together_replaces_swapped_forbid() {
        let data = sample_data()
            .with_rule(RuleKind::CourseForbiddenWithCourse { course1: 10, course2: 30 })
            .with_rule(RuleKind::CourseForbiddenWithCourse { course1: 30, course2: 10 });
        let mut engine = engine_with(data, sample_assignment());
        let u = engine.rules_keep_courses_together(&[30, 10]);
        assert_eq!(
            kinds(&u.remove),
            vec![
                RuleKind::CourseForbiddenWithCourse { course1: 10, course2: 30 },
                RuleKind::CourseForbiddenWithCourse { course1: 30, course2: 10 },
            ]
        );
        assert_eq!(u.add, vec![RuleKind::CourseTogetherWithCourse { course1: 10, course2: 30 }]);
        engine.apply_rule_update(&u).unwrap();
        assert_eq!(
            kinds(engine.data().rules()),
            vec![RuleKind::CourseTogetherWithCourse { course1: 10, course2: 30 }]
        );
        // Applying the same diff again changes nothing.
        assert!(engine.rules_keep_courses_together(&[10, 30]).is_empty());
    }

    #[test]
    fn test_student_fix_round_trip() {
        let data = sample_data().with_rule(RuleKind::IgnoreStudent { student: 3 });
        let mut engine = engine_with(data, sample_assignment());
        let before = engine.data().rules().to_vec();

        let fix = engine.rules_fix_students_in_courses(&[2], &[10]).unwrap();
        engine.apply_rule_update(&fix).unwrap();
        assert!(engine.data().is_student_fixed_in_course(2, 10));

        let unfix = engine.rules_unfix_students_in_courses(&[2], &[10]);
        engine.apply_rule_update(&unfix).unwrap();
        assert_eq!(engine.data().rules(), before.as_slice());
    }

    /// Unrelated rules that every round trip must leave in place.
    fn with_background(data: BlockingData) -> BlockingData {
        data.with_rule(RuleKind::IgnoreStudent { student: 4 })
            .with_rule(RuleKind::CourseMaxStudents { course: 30, max: 25 })
            .with_rule(RuleKind::StudentForbiddenInCourse { student: 4, course: 12 })
            .with_rule(RuleKind::KindLockedInTrackRange {
                kind: CourseKind::Zk,
                from: 1,
                to: 1,
            })
    }

    /// Executes `create`, then the update `remove` computes on the changed
    /// rules, starting once without rules and once with unrelated ones. The
    /// rule list must end up exactly as it started.
    fn assert_round_trip<C, R>(create: C, remove: R)
    where
        C: Fn(&ResultEngine) -> RuleUpdate,
        R: Fn(&ResultEngine) -> RuleUpdate,
    {
        for data in [sample_data(), with_background(sample_data())] {
            let mut engine = engine_with(data, sample_assignment());
            let before = engine.data().rules().to_vec();

            let there = create(&engine);
            assert!(!there.add.is_empty());
            engine.apply_rule_update(&there).unwrap();
            assert_ne!(engine.data().rules(), before.as_slice());

            let back = remove(&engine);
            engine.apply_rule_update(&back).unwrap();
            assert_eq!(engine.data().rules(), before.as_slice());
        }
    }

    #[test]
    fn test_round_trip_kind_ranges() {
        assert_round_trip(
            |e| e.rules_lock_kind_in_range(CourseKind::Lk, 3, 2),
            |e| e.rules_unlock_kind_in_range(CourseKind::Lk, 3, 2),
        );
        assert_round_trip(
            |e| e.rules_kind_alone_in_range(CourseKind::Lk, 3, 3),
            |e| e.rules_remove_kind_alone(CourseKind::Lk),
        );
    }

    #[test]
    fn test_round_trip_course_fixes_and_locks() {
        assert_round_trip(
            |e| e.rules_fix_course_in_track(10, 1).unwrap(),
            |e| e.rules_unfix_course_in_track(10, 1),
        );
        assert_round_trip(
            |e| e.rules_fix_courses_in_their_tracks(&[10, 12]).unwrap(),
            |e| e.rules_unfix_courses(&[10, 12]).unwrap(),
        );
        assert_round_trip(
            |e| e.rules_fix_all_courses_in_their_tracks().unwrap(),
            |e| e.rules_unfix_all_courses().unwrap(),
        );
        assert_round_trip(
            |e| e.rules_lock_courses_in_tracks(&[10, 11], &[2, 3]),
            |e| e.rules_unlock_courses_in_tracks(&[10, 11], &[2, 3]),
        );
    }

    #[test]
    fn test_round_trip_student_locks() {
        assert_round_trip(
            |e| e.rules_forbid_students_in_courses(&[1, 2], &[11]),
            |e| e.rules_allow_students_in_courses(&[1, 2], &[11]),
        );
        assert_round_trip(
            |e| e.rules_forbid_students_of_courses(&[10]),
            |e| e.rules_allow_students_of_courses(&[10]),
        );
        assert_round_trip(
            |e| e.rules_fix_students_of_courses(&[10, 12]).unwrap(),
            |e| e.rules_unfix_students_of_courses(&[10, 12]),
        );
    }

    #[test]
    fn test_round_trip_course_pairs_and_parameters() {
        assert_round_trip(
            |e| e.rules_keep_courses_apart(&[20, 10, 11]),
            |e| e.rules_remove_courses_apart(&[20, 10, 11]),
        );
        assert_round_trip(
            |e| e.rules_keep_courses_together(&[12, 20]),
            |e| e.rules_remove_courses_together(&[12, 20]),
        );
        assert_round_trip(|e| e.rules_set_dummy_students(11, 3), |e| e.rules_remove_dummy_students(11));
        assert_round_trip(|e| e.rules_respect_teachers(true), |e| e.rules_respect_teachers(false));
        assert_round_trip(
            |e| e.rules_set_course_max_students(11, 20),
            |e| e.rules_remove_course_max_students(11),
        );
    }

    #[test]
    fn test_round_trip_student_pairs() {
        assert_round_trip(
            |e| e.rules_students_together_in_subject(2, 1, 1),
            |e| e.rules_remove_students_together_in_subject(2, 1, 1),
        );
        assert_round_trip(
            |e| e.rules_students_apart_in_subject(1, 3, 1),
            |e| e.rules_remove_students_apart_in_subject(1, 3, 1),
        );
        assert_round_trip(
            |e| e.rules_students_together(3, 1),
            |e| e.rules_remove_students_together(3, 1),
        );
        assert_round_trip(
            |e| e.rules_students_apart(1, 2),
            |e| e.rules_remove_students_apart(2, 1),
        );
    }

    #[test]
    fn test_round_trip_ignores_and_subject_kind_limit() {
        assert_round_trip(
            |e| e.rules_ignore_students(&[1, 2]),
            |e| e.rules_unignore_students(&[1, 2]),
        );
        assert_round_trip(
            |e| e.rules_ignore_courses_in_spread(&[10, 11]),
            |e| e.rules_unignore_courses_in_spread(&[10, 11]),
        );
        assert_round_trip(
            |e| e.rules_set_subject_kind_max_per_track(1, CourseKind::Gk, 1).unwrap(),
            |e| e.rules_remove_subject_kind_max_per_track(1, CourseKind::Gk),
        );
    }

    #[test]
    fn test_toggles_twice_restore_rules() {
        let list = [10, 11, 12, 20];
        assert_round_trip(
            |e| {
                let cells = e.toggle_lock_candidates(&list, 10, 11, 100, 101).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
            |e| {
                let cells = e.toggle_lock_candidates(&list, 10, 11, 100, 101).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
        );
        assert_round_trip(
            |e| {
                let cells = e.toggle_course_fix_candidates(&list, 10, 12, 101, 102).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
            |e| {
                let cells = e.toggle_course_fix_candidates(&list, 10, 12, 101, 102).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
        );
        assert_round_trip(
            |e| {
                let cells = e.toggle_student_fix_candidates(&list, 10, 10, 100, 100).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
            |e| {
                let cells = e.toggle_student_fix_candidates(&list, 10, 10, 100, 100).unwrap();
                e.rules_toggle_candidates(&cells).unwrap()
            },
        );
        assert_round_trip(
            |e| e.rules_toggle_course_fixes(&[10, 11], &[1, 2]).unwrap(),
            |e| e.rules_toggle_course_fixes(&[10, 11], &[1, 2]).unwrap(),
        );
        assert_round_trip(
            |e| e.rules_toggle_course_locks(&[11, 12], &[2, 3]).unwrap(),
            |e| e.rules_toggle_course_locks(&[11, 12], &[2, 3]).unwrap(),
        );
        assert_round_trip(
            |e| e.rules_toggle_student_fixes_of_courses(&[10]).unwrap(),
            |e| e.rules_toggle_student_fixes_of_courses(&[10]).unwrap(),
        );
    }

    #[test]
    fn test_toggle_candidates_with_stale_id() {
        let engine = sample_engine();
        let stale = RuleCandidate {
            existing: Some(99),
            kind: RuleKind::CourseLockedInTrack { course: 10, track_number: 1 },
        };
        assert!(engine.rules_toggle_candidates(&[stale]).is_err());
    }

    #[test]
    fn test_student_fix_moves_within_subject_kind() {
        let data = sample_data()
            .with_rule(RuleKind::StudentFixedInCourse { student: 1, course: 11 })
            .with_rule(RuleKind::StudentForbiddenInCourse { student: 1, course: 10 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_fix_students_in_courses(&[1], &[10]).unwrap();
        assert_eq!(u.remove.len(), 2);
        assert_eq!(u.add, vec![RuleKind::StudentFixedInCourse { student: 1, course: 10 }]);
        assert!(engine.rules_fix_students_in_courses(&[1], &[99]).is_err());
    }

    #[test]
    fn test_student_pair_normalization() {
        let data = sample_data()
            .with_rule(RuleKind::StudentForbiddenWithStudentInSubject {
                student1: 2,
                student2: 1,
                subject: 1,
            })
            .with_rule(RuleKind::StudentTogetherWithStudent { student1: 1, student2: 2 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_students_together_in_subject(2, 1, 1);
        assert_eq!(u.remove.len(), 2);
        assert_eq!(
            u.add,
            vec![RuleKind::StudentTogetherWithStudentInSubject {
                student1: 1,
                student2: 2,
                subject: 1
            }]
        );
        assert!(engine.rules_students_apart_in_subject(3, 3, 1).is_empty());

        let u = engine.rules_students_apart(2, 1);
        assert_eq!(u.remove.len(), 2);
        assert_eq!(u.add, vec![RuleKind::StudentForbiddenWithStudent { student1: 1, student2: 2 }]);
    }

    #[test]
    fn test_subject_kind_limit_drops_implied_apart_rules() {
        let data = sample_data()
            .with_rule(RuleKind::CourseForbiddenWithCourse { course1: 10, course2: 11 })
            .with_rule(RuleKind::CourseForbiddenWithCourse { course1: 10, course2: 12 })
            .with_rule(RuleKind::SubjectKindMaxPerTrack {
                subject: 1,
                kind: CourseKind::Gk,
                max: 2,
            });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_set_subject_kind_max_per_track(1, CourseKind::Gk, 1).unwrap();
        assert_eq!(
            kinds(&u.remove),
            vec![
                RuleKind::SubjectKindMaxPerTrack {
                    subject: 1,
                    kind: CourseKind::Gk,
                    max: 2
                },
                RuleKind::CourseForbiddenWithCourse { course1: 10, course2: 11 },
            ]
        );
        let u = engine.rules_set_subject_kind_max_per_track(1, CourseKind::Gk, 2).unwrap();
        assert_eq!(u.remove.len(), 1);
        assert!(matches!(
            engine.rules_set_subject_kind_max_per_track(1, CourseKind::Gk, -1),
            Err(BlockungError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_lock_kind_in_range_clears_cells() {
        let data = sample_data()
            .with_rule(RuleKind::CourseFixedInTrack { course: 12, track_number: 3 })
            .with_rule(RuleKind::CourseLockedInTrack { course: 10, track_number: 2 })
            .with_rule(RuleKind::KindLockedInTrackRange {
                kind: CourseKind::Lk,
                from: 3,
                to: 2,
            });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_lock_kind_in_range(CourseKind::Lk, 3, 2);
        assert_eq!(u.remove.len(), 2);
        assert_eq!(
            u.add,
            vec![RuleKind::KindLockedInTrackRange {
                kind: CourseKind::Lk,
                from: 2,
                to: 3
            }]
        );
    }

    #[test]
    fn test_kind_alone_clears_wrong_side() {
        let data = sample_data()
            .with_rule(RuleKind::CourseLockedInTrack { course: 12, track_number: 3 })
            .with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 3 })
            .with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 1 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_kind_alone_in_range(CourseKind::Lk, 3, 3);
        // Only the GK fix inside the range contradicts; the LK lock and the
        // GK fix outside stay.
        assert_eq!(kinds(&u.remove), vec![RuleKind::CourseFixedInTrack { course: 10, track_number: 3 }]);
        assert_eq!(
            u.add,
            vec![RuleKind::KindAloneInTrackRange {
                kind: CourseKind::Lk,
                from: 3,
                to: 3
            }]
        );
        assert!(engine.rules_remove_kind_alone(CourseKind::Lk).is_empty());
    }

    #[test]
    fn test_marked_course_fixes() {
        let data = sample_data()
            .with_rule(RuleKind::CourseLockedInTrack { course: 10, track_number: 1 })
            .with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 2 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_fix_courses_in_marked_tracks(&[10], &[1, 3]).unwrap();
        assert_eq!(u.add, vec![RuleKind::CourseFixedInTrack { course: 10, track_number: 1 }]);
        assert_eq!(u.remove.len(), 2);

        let t = engine.rules_toggle_course_fixes(&[10], &[1]).unwrap();
        assert_eq!(t.add.len(), 1);
        assert_eq!(t.remove.len(), 1);
    }

    #[test]
    fn test_fix_single_track_respects_capacity() {
        let data = sample_data().with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 2 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_fix_course_in_track(10, 1).unwrap();
        assert_eq!(kinds(&u.remove), vec![RuleKind::CourseFixedInTrack { course: 10, track_number: 2 }]);
        assert!(engine.rules_fix_course_in_track(10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_course_locks() {
        let data = sample_data().with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 1 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_lock_courses_in_tracks(&[10], &[1, 2]);
        assert_eq!(u.add, vec![RuleKind::CourseLockedInTrack { course: 10, track_number: 2 }]);
        // Track 1 is fixed, so toggling there adds nothing.
        assert!(engine.rules_toggle_course_locks(&[10], &[1]).unwrap().is_empty());
    }

    #[test]
    fn test_fix_by_category() {
        let engine = sample_engine();
        // Student 3 has M as first exam subject (LK), student 1 as third.
        let lk = engine.rules_fix_all_students_by_category(FixCategory::AdvancedCourse).unwrap();
        assert_eq!(lk.add, vec![RuleKind::StudentFixedInCourse { student: 3, course: 12 }]);
        let third = engine.rules_fix_all_students_by_category(FixCategory::ThirdExam).unwrap();
        assert_eq!(third.add, vec![RuleKind::StudentFixedInCourse { student: 1, course: 10 }]);
        let written = engine.rules_fix_all_students_by_category(FixCategory::Written).unwrap();
        assert_eq!(written.add.len(), 3);
        // Student 2 takes D as fourth subject but sits in no D course.
        assert!(engine
            .rules_fix_all_students_by_category(FixCategory::FourthExam)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_toggle_student_fixes() {
        let data = sample_data().with_rule(RuleKind::StudentFixedInCourse { student: 1, course: 10 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_toggle_student_fixes_of_courses(&[10]).unwrap();
        assert_eq!(kinds(&u.remove), vec![RuleKind::StudentFixedInCourse { student: 1, course: 10 }]);
        assert_eq!(u.add, vec![RuleKind::StudentFixedInCourse { student: 2, course: 10 }]);
        assert_eq!(engine.rules_unfix_all_students().remove.len(), 1);
    }

    #[test]
    fn test_forbid_students_replaces_fix() {
        let data = sample_data().with_rule(RuleKind::StudentFixedInCourse { student: 1, course: 10 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_forbid_students_of_courses(&[10]);
        assert_eq!(u.remove.len(), 1);
        assert_eq!(u.add.len(), 2);
        assert!(engine.rules_allow_students_of_courses(&[10]).is_empty());
    }

    #[test]
    fn test_course_parameters() {
        let data = sample_data()
            .with_rule(RuleKind::CourseDummyStudents { course: 10, count: 2 })
            .with_rule(RuleKind::CourseMaxStudents { course: 10, max: 20 });
        let engine = engine_with(data, sample_assignment());
        let u = engine.rules_set_dummy_students(10, 3);
        assert_eq!(u.remove.len(), 1);
        assert_eq!(u.add, vec![RuleKind::CourseDummyStudents { course: 10, count: 3 }]);
        assert!(engine.rules_remove_dummy_students(10).add.is_empty());
        assert!(engine.rules_set_course_max_students(10, 100).add.is_empty());
        assert_eq!(engine.rules_set_course_max_students(10, 0).add.len(), 1);
        assert_eq!(engine.rules_respect_teachers(true).add, vec![RuleKind::RespectTeachers]);
        assert!(engine.rules_respect_teachers(false).is_empty());
    }

    #[test]
    fn test_ignore_rules() {
        let data = sample_data().with_rule(RuleKind::IgnoreStudent { student: 1 });
        let engine = engine_with(data, sample_assignment());
        assert_eq!(engine.rules_ignore_students(&[1, 2]).add.len(), 1);
        assert_eq!(engine.rules_unignore_students(&[1, 2]).remove.len(), 1);
        assert_eq!(engine.rules_ignore_courses_in_spread(&[10]).add.len(), 1);
        assert!(engine.rules_unignore_courses_in_spread(&[10]).is_empty());
    }

    #[test]
    fn test_toggle_rectangles() {
        let data = sample_data().with_rule(RuleKind::CourseLockedInTrack { course: 11, track_number: 2 });
        let engine = engine_with(data, sample_assignment());
        let list = [10, 11, 12, 20];

        let locks = engine.toggle_lock_candidates(&list, 11, 10, 100, 101).unwrap();
        assert_eq!(locks.len(), 4);
        assert_eq!(locks.iter().filter(|c| c.existing.is_some()).count(), 1);

        // Course 10 lies in track 1, course 11 in track 2, course 12 in 3.
        let fixes = engine.toggle_course_fix_candidates(&list, 10, 12, 101, 102).unwrap();
        let cells: Vec<RuleKind> = fixes.into_iter().map(|c| c.kind).collect();
        assert_eq!(
            cells,
            vec![
                RuleKind::CourseFixedInTrack { course: 11, track_number: 2 },
                RuleKind::CourseFixedInTrack { course: 12, track_number: 3 },
            ]
        );

        let students = engine.toggle_student_fix_candidates(&list, 10, 10, 100, 100).unwrap();
        assert_eq!(students.len(), 2);
        assert!(engine.toggle_lock_candidates(&list, 10, 11, 100, 999).is_err());
    }

    #[test]
    fn test_filtered_between() {
        assert_eq!(filtered_between(&[1, 2, 3, 4], 3, 2), vec![2, 3]);
        assert_eq!(filtered_between(&[1, 2, 3, 4], 2, 2), vec![2]);
        assert_eq!(filtered_between(&[1, 2, 3], 9, 9), Vec::<CourseId>::new());
    }

    #[test]
    fn test_fix_lists() {
        let data = sample_data()
            .with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 1 })
            .with_rule(RuleKind::StudentFixedInCourse { student: 1, course: 10 });
        let engine = engine_with(data, sample_assignment());
        assert_eq!(engine.course_fix_rules().len(), 1);
        assert_eq!(engine.course_fix_rules_of(11).len(), 0);
        assert_eq!(engine.student_fix_rules_of_set(&[10, 11]).len(), 1);
        assert_eq!(engine.student_fix_rules().len(), 1);

        // Placed: 10, 11, 12, 20 in one track each; 10 is fixed.
        assert_eq!(engine.missing_course_fixes().len(), 3);
        assert_eq!(engine.missing_student_fixes().len(), 4);
        assert_eq!(engine.missing_student_fixes_of(&[10]).len(), 1);
        // Exam enrolments: student 1 in M-GK1 (fixed), student 3 in M-LK1.
        assert_eq!(
            engine.missing_abitur_student_fixes(),
            vec![RuleKind::StudentFixedInCourse { student: 3, course: 12 }]
        );
    }
}
