//! Structural checks of the base data and the raw assignment.
//!
//! Detects:
//! - Negative or duplicate ids (tracks, courses, subjects, students)
//! - Invalid, duplicate or missing track numbers
//! - Courses and choices referring to undefined subjects
//! - Invalid dummy-student rules
//! - Assignment entries for courses or tracks that do not exist
//!
//! Findings are returned as data. They never abort a revalidation; the
//! engine keeps them as diagnostics and logs each one.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Assignment, BlockingData, CourseId, RuleKind, RuleType};

/// A structural finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralDiagnostic {
    /// Finding category.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of structural findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Negative id.
    InvalidId,
    /// Two entities share an id.
    DuplicateId,
    /// Track number ≤ 0.
    InvalidTrackNumber,
    /// Two tracks share a number.
    DuplicateTrackNumber,
    /// The numbers do not form `1..=N`.
    MissingTrackNumber,
    /// A course or choice refers to a subject that is not defined.
    UndefinedSubject,
    /// A dummy-student rule names an unknown course, an out-of-range count
    /// or repeats a course.
    InvalidDummyRule,
    /// The assignment mentions a course or track that does not exist.
    DanglingAssignment,
}

impl StructuralDiagnostic {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Checks ids, track numbers and subject references of the base data.
///
/// Checks, in this order:
/// 1. Track ids and numbers, then gaps in `1..=N`
/// 2. Course ids
/// 3. Subject ids, then undefined subjects of courses and choices
/// 4. Student ids
pub fn check_blocking(data: &BlockingData) -> Vec<StructuralDiagnostic> {
    let mut out = Vec::new();

    let mut track_ids = BTreeSet::new();
    let mut track_numbers = BTreeSet::new();
    for t in &data.tracks {
        if t.id < 0 {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidId,
                format!("Die Schienen-ID {} ist ungültig!", t.id),
            ));
        }
        if !track_ids.insert(t.id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DuplicateId,
                format!("Die Schienen-ID {} ist doppelt!", t.id),
            ));
        }
        if t.number <= 0 {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidTrackNumber,
                format!("Die Schienen-NR {} ist ungültig!", t.number),
            ));
        }
        if !track_numbers.insert(t.number) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DuplicateTrackNumber,
                format!("Die Schienen-NR {} ist doppelt!", t.number),
            ));
        }
    }
    let n = track_numbers.len();
    for nr in 1..=n as i32 {
        if !track_numbers.contains(&nr) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::MissingTrackNumber,
                format!("Es gibt {n} Schienen, aber es fehlt die Schienen-Nr. {nr}!"),
            ));
        }
    }

    let mut course_ids = BTreeSet::new();
    for c in &data.courses {
        if c.id < 0 {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidId,
                format!("Die Kurs-ID {} ist ungültig!", c.id),
            ));
        }
        if !course_ids.insert(c.id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DuplicateId,
                format!("Die Kurs-ID {} ist doppelt!", c.id),
            ));
        }
    }

    let mut subject_ids = BTreeSet::new();
    for s in &data.subjects {
        if s.id < 0 {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidId,
                format!("Die Fach-ID {} ist ungültig!", s.id),
            ));
        }
        if !subject_ids.insert(s.id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DuplicateId,
                format!("Die Fach-ID {} ist doppelt!", s.id),
            ));
        }
    }
    // Each undefined subject is reported once, at its first reference.
    for c in &data.courses {
        if subject_ids.insert(c.subject_id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::UndefinedSubject,
                format!(
                    "Kurs {} hat ein undefiniertes Fach (im Fächer-Manager)!",
                    data.course_name(c.id)
                ),
            ));
        }
    }
    for ch in &data.choices {
        if subject_ids.insert(ch.subject_id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::UndefinedSubject,
                format!(
                    "Fachwahl {} {}-{} hat ein undefiniertes Fach (im Fächer-Manager)!",
                    data.student_name(ch.student_id),
                    ch.subject_id,
                    ch.kind.short_name()
                ),
            ));
        }
    }

    let mut student_ids = BTreeSet::new();
    for s in &data.students {
        if s.id < 0 {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidId,
                format!("Die Schüler-ID {} ist ungültig!", s.id),
            ));
        }
        if !student_ids.insert(s.id) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DuplicateId,
                format!("Die Schüler-ID {} ist doppelt!", s.id),
            ));
        }
    }

    out
}

/// Reads dummy-student counts from the rules of type 9.
///
/// Every known course gets an entry, defaulting to 0. Rules naming an
/// unknown course, a count outside `1..=99` or a course that already has a
/// count are skipped and reported.
pub fn dummy_students(
    data: &BlockingData,
    course_ids: &BTreeSet<CourseId>,
) -> (BTreeMap<CourseId, u32>, Vec<StructuralDiagnostic>) {
    let mut map = BTreeMap::new();
    let mut out = Vec::new();
    for rule in data.rules_of_type(RuleType::CourseDummyStudents) {
        let RuleKind::CourseDummyStudents { course, count } = rule.kind else {
            continue;
        };
        let name = data.course_name(course);
        if !course_ids.contains(&course) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidDummyRule,
                format!("Kurs {name} soll {count} externe SuS haben, aber den Kurs gibt es nicht!"),
            ));
            continue;
        }
        if !(1..=99).contains(&count) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidDummyRule,
                format!("Kurs {name} mit {count} externen SuS ist ungültig!"),
            ));
            continue;
        }
        if map.contains_key(&course) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::InvalidDummyRule,
                format!("Kurs {name} mit {count} externen SuS. Doppelte Regel gefunden!"),
            ));
            continue;
        }
        map.insert(course, count.unsigned_abs());
    }
    for &id in course_ids {
        map.entry(id).or_insert(0);
    }
    (map, out)
}

/// Reports assignment entries that refer to unknown courses or tracks.
pub fn check_assignment(data: &BlockingData, assignment: &Assignment) -> Vec<StructuralDiagnostic> {
    let mut out = Vec::new();
    let course_known = |id: CourseId| data.courses.iter().any(|c| c.id == id);
    for (&course, students) in &assignment.course_students {
        if !students.is_empty() && !course_known(course) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DanglingAssignment,
                format!("Kurs-ID {course} hat {} SuS, aber den Kurs gibt es nicht!", students.len()),
            ));
        }
    }
    for (&course, tracks) in &assignment.course_tracks {
        if tracks.is_empty() {
            continue;
        }
        if !course_known(course) {
            out.push(StructuralDiagnostic::new(
                DiagnosticKind::DanglingAssignment,
                format!("Kurs-ID {course} liegt in Schienen, aber den Kurs gibt es nicht!"),
            ));
            continue;
        }
        for &track in tracks {
            if data.track(track).is_err() {
                out.push(StructuralDiagnostic::new(
                    DiagnosticKind::DanglingAssignment,
                    format!(
                        "Kurs {} liegt in Schienen-ID {track}, aber die Schiene gibt es nicht!",
                        data.course_name(course)
                    ),
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseKind, Gender, Student, Subject, SubjectChoice, Track};

    fn sample_data() -> BlockingData {
        BlockingData::new(1, "Q1")
            .with_numbered_tracks(100, 2)
            .with_subject(Subject::new(1, "M"))
            .with_course(Course::new(10, 1, CourseKind::Gk, 1))
            .with_student(Student::new(1, "Anna", "Berg", Gender::W))
            .with_choice(SubjectChoice::new(1, 1, CourseKind::Gk))
    }

    #[test]
    fn test_valid_data() {
        assert!(check_blocking(&sample_data()).is_empty());
    }

    #[test]
    fn test_duplicate_and_invalid_ids() {
        let data = sample_data()
            .with_course(Course::new(10, 1, CourseKind::Gk, 2))
            .with_student(Student::new(-3, "X", "Y", Gender::X));
        let diags = check_blocking(&data);
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::DuplicateId && d.message == "Die Kurs-ID 10 ist doppelt!"));
        assert!(diags
            .iter()
            .any(|d| d.kind == DiagnosticKind::InvalidId && d.message == "Die Schüler-ID -3 ist ungültig!"));
    }

    #[test]
    fn test_missing_track_number() {
        let data = BlockingData::new(1, "Q1")
            .with_track(Track::new(1, 1))
            .with_track(Track::new(2, 3));
        let diags = check_blocking(&data);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::MissingTrackNumber);
        assert_eq!(diags[0].message, "Es gibt 2 Schienen, aber es fehlt die Schienen-Nr. 2!");
    }

    #[test]
    fn test_undefined_subject_reported_once() {
        let data = sample_data()
            .with_course(Course::new(11, 7, CourseKind::Gk, 1))
            .with_course(Course::new(12, 7, CourseKind::Gk, 2));
        let diags = check_blocking(&data);
        let count = diags
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UndefinedSubject)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_dummy_students() {
        let data = sample_data()
            .with_rule(RuleKind::CourseDummyStudents { course: 10, count: 3 })
            .with_rule(RuleKind::CourseDummyStudents { course: 10, count: 4 })
            .with_rule(RuleKind::CourseDummyStudents { course: 99, count: 1 })
            .with_rule(RuleKind::CourseDummyStudents { course: 10, count: 0 });
        let ids: BTreeSet<CourseId> = [10, 11].into_iter().collect();
        let (map, diags) = dummy_students(&data, &ids);
        assert_eq!(map[&10], 3);
        assert_eq!(map[&11], 0);
        assert_eq!(diags.len(), 3);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::InvalidDummyRule));
    }

    #[test]
    fn test_dangling_assignment() {
        let data = sample_data();
        let assignment = Assignment::new()
            .with_student(55, 1)
            .with_track(10, 999)
            .with_track(10, 100);
        let diags = check_assignment(&data, &assignment);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::DanglingAssignment));
    }
}
