//! Derived lookup structures of one result.
//!
//! An [`Index`] is rebuilt from scratch by every revalidation: it reads the
//! base data and the raw [`Assignment`] and derives every relation the
//! scoring, the rule checks and the query API need. It is never patched
//! incrementally.
//!
//! # Build order
//!
//! | Step | Derives |
//! |------|---------|
//! | 0 | Id sets, track number maps, track → courses |
//! | 1 | Course → students (valid only), quarantine, dummies, subject lists, course → tracks, subject-kind → courses |
//! | 2 | Student → courses, sorted subject-kinds, spreads, track collisions and headcounts, (student, track) and (track, subject-kind) maps |
//! | 3 | Student collisions, (student, subject) → course |
//!
//! Every map has an entry for every known key, empty if nothing is
//! assigned, so lookups with a known id never miss.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::SortOrder;
use crate::models::{
    Assignment, BlockingData, Course, CourseId, RuleKind, StudentId, SubjectId, SubjectKind,
    TrackId,
};
use crate::validation::{self, StructuralDiagnostic};

/// A (student, course) pair whose course matches one of the student's
/// choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidPair {
    pub student: StudentId,
    pub course: CourseId,
}

/// A (student, course) pair without a matching choice. Kept out of every
/// count and listed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quarantined {
    pub student: StudentId,
    pub course: CourseId,
}

/// Classifies an enrolment.
pub fn classify(
    data: &BlockingData,
    course: &Course,
    student: StudentId,
) -> Result<ValidPair, Quarantined> {
    if data.has_subject_kind(student, course.subject_kind()) {
        Ok(ValidPair {
            student,
            course: course.id,
        })
    } else {
        Err(Quarantined {
            student,
            course: course.id,
        })
    }
}

/// All derived relations of one result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    /// Ordering the sorted lists were built with.
    pub sort_order: SortOrder,

    /// Known track ids.
    pub track_ids: BTreeSet<TrackId>,
    /// Known course ids.
    pub course_ids: BTreeSet<CourseId>,
    /// Known subject ids, including subjects only referenced by courses or
    /// choices.
    pub subject_ids: BTreeSet<SubjectId>,
    /// Known student ids.
    pub student_ids: BTreeSet<StudentId>,
    /// Track id → number.
    pub track_number: BTreeMap<TrackId, i32>,
    /// Track number → id.
    pub track_by_number: BTreeMap<i32, TrackId>,

    /// Track → courses placed in it.
    pub track_courses: BTreeMap<TrackId, BTreeSet<CourseId>>,
    /// Course → tracks it is placed in.
    pub course_tracks: BTreeMap<CourseId, BTreeSet<TrackId>>,
    /// Course → validly enrolled students.
    pub course_students: BTreeMap<CourseId, BTreeSet<StudentId>>,
    /// Student → courses enrolled in without a matching choice.
    pub quarantined: BTreeMap<StudentId, BTreeSet<CourseId>>,
    /// Course → dummy students.
    pub course_dummies: BTreeMap<CourseId, u32>,
    /// Subject → courses, sorted.
    pub subject_courses: BTreeMap<SubjectId, Vec<CourseId>>,
    /// Subject-kind → courses, sorted. Includes subject-kinds that only
    /// occur in choices.
    pub subject_kind_courses: BTreeMap<SubjectKind, Vec<CourseId>>,

    /// Student → valid courses.
    pub student_courses: BTreeMap<StudentId, BTreeSet<CourseId>>,
    /// All subject-kinds in sort order.
    pub subject_kinds_sorted: Vec<SubjectKind>,
    /// Subject-kind → course size spread.
    pub subject_kind_spread: BTreeMap<SubjectKind, u32>,
    /// Track → collisions (enrolments minus distinct students).
    pub track_collisions: BTreeMap<TrackId, u32>,
    /// Track → sum of course sizes.
    pub track_headcount: BTreeMap<TrackId, u32>,
    /// (student, track) → courses of the student in that track.
    pub student_track_courses: BTreeMap<(StudentId, TrackId), BTreeSet<CourseId>>,
    /// (track, subject-kind) → courses, sorted.
    pub track_kind_courses: BTreeMap<(TrackId, SubjectKind), Vec<CourseId>>,

    /// Student → Σ (courses in a track − 1) over tracks with ≥ 2 courses.
    pub student_collisions: BTreeMap<StudentId, u32>,
    /// (student, subject) → assigned course, `None` for a choice without one.
    pub student_subject_course: BTreeMap<(StudentId, SubjectId), Option<CourseId>>,
}

impl Index {
    /// Builds the index. Structural findings are returned, not raised.
    pub fn build(
        data: &BlockingData,
        assignment: &Assignment,
        sort_order: SortOrder,
    ) -> (Self, Vec<StructuralDiagnostic>) {
        let mut diagnostics = validation::check_blocking(data);
        diagnostics.extend(validation::check_assignment(data, assignment));

        let mut idx = Index {
            sort_order,
            ..Default::default()
        };

        // Step 0
        for t in &data.tracks {
            idx.track_ids.insert(t.id);
            idx.track_number.insert(t.id, t.number);
            idx.track_by_number.insert(t.number, t.id);
        }
        idx.course_ids = data.courses.iter().map(|c| c.id).collect();
        idx.subject_ids = data
            .subjects
            .iter()
            .map(|s| s.id)
            .chain(data.courses.iter().map(|c| c.subject_id))
            .chain(data.choices.iter().map(|c| c.subject_id))
            .collect();
        idx.student_ids = data.students.iter().map(|s| s.id).collect();

        idx.track_courses = idx.track_ids.iter().map(|&t| (t, BTreeSet::new())).collect();
        for (course, tracks) in &assignment.course_tracks {
            if !idx.course_ids.contains(course) {
                continue;
            }
            for track in tracks {
                if let Some(set) = idx.track_courses.get_mut(track) {
                    set.insert(*course);
                }
            }
        }

        // Step 1
        idx.course_students = idx.course_ids.iter().map(|&c| (c, BTreeSet::new())).collect();
        for (&course_id, students) in &assignment.course_students {
            let Ok(course) = data.course(course_id) else {
                continue;
            };
            for &student in students {
                match classify(data, course, student) {
                    Ok(pair) => {
                        idx.course_students
                            .entry(pair.course)
                            .or_default()
                            .insert(pair.student);
                    }
                    Err(q) => {
                        idx.quarantined.entry(q.student).or_default().insert(q.course);
                    }
                }
            }
        }

        let (dummies, dummy_diagnostics) = validation::dummy_students(data, &idx.course_ids);
        idx.course_dummies = dummies;
        diagnostics.extend(dummy_diagnostics);

        idx.subject_courses = idx.subject_ids.iter().map(|&s| (s, Vec::new())).collect();
        for c in &data.courses {
            idx.subject_courses.entry(c.subject_id).or_default().push(c.id);
        }
        for list in idx.subject_courses.values_mut() {
            sort_courses(data, list, sort_order);
        }

        idx.course_tracks = idx.course_ids.iter().map(|&c| (c, BTreeSet::new())).collect();
        for (&track, courses) in &idx.track_courses {
            for course in courses {
                idx.course_tracks.entry(*course).or_default().insert(track);
            }
        }

        for c in &data.courses {
            idx.subject_kind_courses.entry(c.subject_kind()).or_default().push(c.id);
        }
        for ch in &data.choices {
            idx.subject_kind_courses.entry(ch.subject_kind()).or_default();
        }
        for list in idx.subject_kind_courses.values_mut() {
            sort_courses(data, list, sort_order);
        }

        // Step 2
        idx.student_courses = idx.student_ids.iter().map(|&s| (s, BTreeSet::new())).collect();
        for (&course, students) in &idx.course_students {
            for &s in students {
                idx.student_courses.entry(s).or_default().insert(course);
            }
        }

        idx.subject_kinds_sorted = idx.subject_kind_courses.keys().copied().collect();
        idx.subject_kinds_sorted
            .sort_by(|a, b| data.compare_subject_kinds(*a, *b, sort_order));

        let spreads: BTreeMap<SubjectKind, u32> = idx
            .subject_kind_courses
            .iter()
            .map(|(&sk, courses)| {
                let (min, max) = courses
                    .iter()
                    .filter(|&&c| !data.has_rule(&RuleKind::IgnoreCourseInSpread { course: c }))
                    .map(|&c| idx.course_size_with_dummies(c))
                    .fold((u32::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)));
                // No counted course leaves min above max.
                (sk, max.saturating_sub(min))
            })
            .collect();
        idx.subject_kind_spread = spreads;

        for (&track, courses) in &idx.track_courses {
            let mut with_duplicates = 0u32;
            let mut distinct = BTreeSet::new();
            for c in courses {
                if let Some(students) = idx.course_students.get(c) {
                    with_duplicates += students.len() as u32;
                    distinct.extend(students.iter().copied());
                }
            }
            idx.track_collisions
                .insert(track, with_duplicates - distinct.len() as u32);
            idx.track_headcount.insert(track, with_duplicates);
        }

        let all_students: BTreeSet<StudentId> = idx
            .student_ids
            .iter()
            .chain(idx.student_courses.keys())
            .copied()
            .collect();
        for &track in &idx.track_ids {
            for &s in &all_students {
                idx.student_track_courses.insert((s, track), BTreeSet::new());
            }
        }
        for (&track, courses) in &idx.track_courses {
            for c in courses {
                for &s in &idx.course_students[c] {
                    idx.student_track_courses.entry((s, track)).or_default().insert(*c);
                }
            }
        }

        for &track in &idx.track_ids {
            for &sk in idx.subject_kind_courses.keys() {
                idx.track_kind_courses.insert((track, sk), Vec::new());
            }
        }
        for c in &data.courses {
            if let Some(tracks) = idx.course_tracks.get(&c.id) {
                for &track in tracks {
                    idx.track_kind_courses
                        .entry((track, c.subject_kind()))
                        .or_default()
                        .push(c.id);
                }
            }
        }
        for list in idx.track_kind_courses.values_mut() {
            sort_courses(data, list, sort_order);
        }

        // Step 3
        for &s in &all_students {
            idx.student_collisions.insert(s, 0);
        }
        for (&(student, _), courses) in &idx.student_track_courses {
            let entry = idx.student_collisions.entry(student).or_insert(0);
            if courses.len() >= 2 {
                *entry += courses.len() as u32 - 1;
            }
        }

        for (&student, courses) in &idx.student_courses {
            for &c in courses {
                if let Ok(course) = data.course(c) {
                    idx.student_subject_course
                        .insert((student, course.subject_id), Some(c));
                }
            }
        }
        for ch in &data.choices {
            idx.student_subject_course
                .entry((ch.student_id, ch.subject_id))
                .or_insert(None);
        }

        (idx, diagnostics)
    }

    /// Valid students of a course.
    pub fn course_size(&self, course: CourseId) -> u32 {
        self.course_students.get(&course).map_or(0, |s| s.len() as u32)
    }

    /// Valid students plus dummies.
    pub fn course_size_with_dummies(&self, course: CourseId) -> u32 {
        self.course_size(course) + self.course_dummies.get(&course).copied().unwrap_or(0)
    }

    /// Courses of a student in a track.
    pub fn courses_in_track(&self, student: StudentId, track: TrackId) -> Option<&BTreeSet<CourseId>> {
        self.student_track_courses.get(&(student, track))
    }

    /// Whether two students sit in the same course of a subject.
    pub fn together_in_subject(&self, s1: StudentId, s2: StudentId, subject: SubjectId) -> bool {
        match (
            self.student_subject_course.get(&(s1, subject)),
            self.student_subject_course.get(&(s2, subject)),
        ) {
            (Some(Some(c1)), Some(Some(c2))) => c1 == c2,
            _ => false,
        }
    }

    /// Track ids ordered by track number.
    pub fn tracks_by_number(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.track_by_number.values().copied()
    }
}

/// Sorts course ids with the engine's course order.
pub fn sort_courses(data: &BlockingData, list: &mut [CourseId], order: SortOrder) {
    list.sort_by(|a, b| data.compare_courses(*a, *b, order));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseKind, Gender, Student, Subject, SubjectChoice};

    fn sample_data() -> BlockingData {
        let mut data = BlockingData::new(1, "Q1")
            .with_numbered_tracks(100, 2)
            .with_subject(Subject::new(1, "M"))
            .with_subject(Subject::new(2, "D"))
            .with_course(Course::new(10, 1, CourseKind::Gk, 1))
            .with_course(Course::new(11, 1, CourseKind::Gk, 2))
            .with_course(Course::new(20, 2, CourseKind::Gk, 1));
        for s in 1..=3 {
            data = data
                .with_student(Student::new(s, "S", format!("N{s}"), Gender::X))
                .with_choice(SubjectChoice::new(s, 1, CourseKind::Gk))
                .with_choice(SubjectChoice::new(s, 2, CourseKind::Gk));
        }
        data
    }

    #[test]
    fn test_classify() {
        let data = sample_data().with_course(Course::new(30, 1, CourseKind::Lk, 1));
        let gk = data.course(10).unwrap();
        let lk = data.course(30).unwrap();
        assert!(classify(&data, gk, 1).is_ok());
        assert_eq!(
            classify(&data, lk, 1),
            Err(Quarantined {
                student: 1,
                course: 30
            })
        );
    }

    #[test]
    fn test_quarantine_disjoint() {
        let data = sample_data().with_course(Course::new(30, 1, CourseKind::Lk, 1));
        let assignment = Assignment::new().with_student(30, 1).with_student(10, 1);
        let (idx, _) = Index::build(&data, &assignment, SortOrder::default());
        assert!(idx.course_students[&30].is_empty());
        assert!(idx.quarantined[&1].contains(&30));
        assert!(idx.course_students[&10].contains(&1));
        assert!(!idx.student_courses[&1].contains(&30));
    }

    #[test]
    fn test_every_known_key_present() {
        let (idx, diags) = Index::build(&sample_data(), &Assignment::new(), SortOrder::default());
        assert!(diags.is_empty());
        assert_eq!(idx.course_students.len(), 3);
        assert_eq!(idx.track_courses.len(), 2);
        assert_eq!(idx.student_track_courses.len(), 6);
        assert_eq!(idx.student_subject_course.len(), 6);
        assert!(idx.student_subject_course.values().all(Option::is_none));
    }

    #[test]
    fn test_track_collisions() {
        let assignment = Assignment::new()
            .with_track(10, 100)
            .with_track(20, 100)
            .with_student(10, 1)
            .with_student(20, 1)
            .with_student(20, 2);
        let (idx, _) = Index::build(&sample_data(), &assignment, SortOrder::default());
        assert_eq!(idx.track_collisions[&100], 1);
        assert_eq!(idx.track_headcount[&100], 3);
        assert_eq!(idx.student_collisions[&1], 1);
        assert_eq!(idx.student_collisions[&2], 0);
        assert_eq!(idx.courses_in_track(1, 100).map(BTreeSet::len), Some(2));
    }

    #[test]
    fn test_spread_ignores_rule_17_and_counts_dummies() {
        let data = sample_data()
            .with_rule(RuleKind::CourseDummyStudents { course: 11, count: 5 });
        let assignment = Assignment::new().with_student(10, 1).with_student(10, 2);
        let (idx, _) = Index::build(&data, &assignment, SortOrder::default());
        let sk = SubjectKind::new(1, CourseKind::Gk);
        assert_eq!(idx.subject_kind_spread[&sk], 3);

        let data = data.with_rule(RuleKind::IgnoreCourseInSpread { course: 11 });
        let (idx, _) = Index::build(&data, &assignment, SortOrder::default());
        assert_eq!(idx.subject_kind_spread[&sk], 0);
    }

    #[test]
    fn test_spread_zero_without_courses() {
        let data = sample_data().with_choice(SubjectChoice::new(1, 3, CourseKind::Lk));
        let (idx, _) = Index::build(&data, &Assignment::new(), SortOrder::default());
        let sk = SubjectKind::new(3, CourseKind::Lk);
        assert!(idx.subject_kind_courses[&sk].is_empty());
        assert_eq!(idx.subject_kind_spread[&sk], 0);
    }

    #[test]
    fn test_subject_course_map() {
        let assignment = Assignment::new().with_student(11, 2);
        let (idx, _) = Index::build(&sample_data(), &assignment, SortOrder::default());
        assert_eq!(idx.student_subject_course[&(2, 1)], Some(11));
        assert_eq!(idx.student_subject_course[&(2, 2)], None);
    }
}
