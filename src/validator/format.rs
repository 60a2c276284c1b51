//! German text rendering of rule violations.
//!
//! Names are resolved through [`BlockingData`]; the records themselves carry
//! ids only.

use std::collections::BTreeMap;

use super::{RuleViolation, ViolationDetail, ViolationReport};
use crate::models::{BlockingData, RuleId, RuleType};

/// Renders one violation.
pub fn describe(data: &BlockingData, v: &RuleViolation) -> String {
    // Type 12 words its pair messages slightly differently.
    let apart_in_subject = v.rule_type == RuleType::StudentForbiddenWithStudentInSubject;
    match &v.detail {
        ViolationDetail::KindInLockedTrack {
            course,
            track_number,
        } => format!(
            "Kursart {} sollte nicht auf Schiene {track_number} liegen.",
            data.course_name(*course)
        ),
        ViolationDetail::CourseNotInFixedTrack {
            course,
            track_number,
        } => format!(
            "Kurs {} sollte fixiert sein in Schiene {track_number}.",
            data.course_name(*course)
        ),
        ViolationDetail::CourseInLockedTrack {
            course,
            track_number,
        } => format!(
            "Kurs {} sollte gesperrt sein in Schiene {track_number}.",
            data.course_name(*course)
        ),
        ViolationDetail::StudentNotInFixedCourse { student, course } => format!(
            "{} sollte fixiert sein in Kurs {}.",
            data.student_name(*student),
            data.course_name(*course)
        ),
        ViolationDetail::StudentInForbiddenCourse { student, course } => format!(
            "{} sollte verboten sein in Kurs {}.",
            data.student_name(*student),
            data.course_name(*course)
        ),
        ViolationDetail::KindOutsideExclusiveRange { course, from, to } => format!(
            "Kursart von {} sollte innerhalb der Schienen {from} bis {to} sein.",
            data.course_name(*course)
        ),
        ViolationDetail::CoursesShareTrack {
            course1,
            course2,
            track_number,
        } => format!(
            "Kurs {} und Kurs {} sollten nicht gemeinsam in einer Schiene ({track_number}) sein.",
            data.course_name(*course1),
            data.course_name(*course2)
        ),
        ViolationDetail::CoursesNotTogether { course1, course2 } => format!(
            "Kurs {} und Kurs {} sollten gemeinsam in einer Schiene sein.",
            data.course_name(*course1),
            data.course_name(*course2)
        ),
        ViolationDetail::TeacherInParallelCourses {
            course1,
            course2,
            teacher,
            track_number,
        } => format!(
            "Kurs {} und Kurs {} haben die Lehrkraft {teacher} in der selben Schiene ({track_number}).",
            data.course_name(*course1),
            data.course_name(*course2)
        ),
        ViolationDetail::StudentLacksSubject { student, subject } => {
            let tail = if apart_in_subject {
                "hat aber eine Regel, die das Fach definiert."
            } else {
                "aber eine Regel, die das Fach definiert."
            };
            format!(
                "{} hat keine Fachwahl {}, {tail}",
                data.student_name(*student),
                data.subject_name(*subject)
            )
        }
        ViolationDetail::StudentsDifferentKind {
            student1,
            student2,
            subject,
        } => format!(
            "{} und {}{} haben nicht die selbe Kursart bei {}.",
            data.student_name(*student1),
            if apart_in_subject { "SchülerIn " } else { "" },
            data.student_name(*student2),
            data.subject_name(*subject)
        ),
        ViolationDetail::StudentsNotTogether {
            student1,
            student2,
            subject,
        } => format!(
            "{} und {} sollten gemeinsam in {} sein.",
            data.student_name(*student1),
            data.student_name(*student2),
            data.subject_name(*subject)
        ),
        ViolationDetail::StudentsTogether {
            student1,
            student2,
            subject,
        } => format!(
            "{} und {}{} sollten nicht gemeinsam in {} sein.",
            data.student_name(*student1),
            if apart_in_subject { "SchülerIn " } else { "" },
            data.student_name(*student2),
            data.subject_name(*subject)
        ),
        ViolationDetail::CourseOverCapacity {
            course,
            headcount,
            max,
        } => format!(
            "Kurs {} hat {headcount} SuS, sollte aber nicht mehr als {max} haben.",
            data.course_name(*course)
        ),
        ViolationDetail::SubjectKindOverfullTrack {
            track,
            subject_kind,
            count,
            max,
        } => format!(
            "In {} ist die Fachart {} insgesamt {count} Mal vertreten, erlaubt sind aber nur {max}!",
            data.track_name(*track),
            data.subject_kind_name(*subject_kind)
        ),
    }
}

/// Rule id → description.
///
/// A rule violated more than once keeps its last description, except for
/// type 18 where all per-track descriptions are joined with newlines.
pub fn texts_by_rule(data: &BlockingData, report: &ViolationReport) -> BTreeMap<RuleId, String> {
    let mut map: BTreeMap<RuleId, String> = BTreeMap::new();
    for v in &report.violations {
        let text = describe(data, v);
        match map.get_mut(&v.rule_id) {
            Some(old) if v.rule_type == RuleType::SubjectKindMaxPerTrack => {
                old.push('\n');
                old.push_str(&text);
            }
            _ => {
                map.insert(v.rule_id, text);
            }
        }
    }
    map
}

/// Rule type → descriptions, in check order.
pub fn texts_by_type(data: &BlockingData, report: &ViolationReport) -> BTreeMap<RuleType, Vec<String>> {
    let mut map: BTreeMap<RuleType, Vec<String>> = BTreeMap::new();
    for v in &report.violations {
        map.entry(v.rule_type).or_default().push(describe(data, v));
    }
    map
}
