//! Base configuration of a blocking ("Blockungsdaten").
//!
//! Holds the entity lists shared by all results of one blocking, the rule
//! list, and the score summaries pushed back by each result engine.
//! Lookups fail with [`BlockungError`] when an id is unknown; name helpers
//! fall back to a generic label instead, since they only feed diagnostics.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    Course, CourseId, ResultId, Rule, RuleId, RuleKind, RuleType, Score, Student, StudentId,
    Subject, SubjectChoice, SubjectId, SubjectKind, Track, TrackId,
};
use crate::config::SortOrder;
use crate::error::{BlockungError, Result};

/// Shared data of one blocking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingData {
    /// Blocking id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Whether this is the editable template ("Vorlage"). Rule edits and
    /// track-count changes are only allowed on the template.
    pub is_template: bool,
    /// Tracks.
    pub tracks: Vec<Track>,
    /// Subjects.
    pub subjects: Vec<Subject>,
    /// Courses.
    pub courses: Vec<Course>,
    /// Students.
    pub students: Vec<Student>,
    /// Subject choices of all students.
    pub choices: Vec<SubjectChoice>,
    /// Rules in insertion order.
    pub rules: Vec<Rule>,
    /// Score summaries per result, written by the result engines.
    pub result_scores: BTreeMap<ResultId, Score>,
}

impl BlockingData {
    /// Creates an empty template blocking.
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_template: true,
            ..Default::default()
        }
    }

    /// Sets the template flag.
    pub fn with_template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    /// Adds a track.
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    /// Adds tracks numbered `1..=n` with ids `first_id..`.
    pub fn with_numbered_tracks(mut self, first_id: TrackId, n: i32) -> Self {
        for i in 0..n {
            self.tracks.push(Track::new(first_id + i64::from(i), i + 1));
        }
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Adds a course.
    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    /// Adds a student.
    pub fn with_student(mut self, student: Student) -> Self {
        self.students.push(student);
        self
    }

    /// Adds a subject choice.
    pub fn with_choice(mut self, choice: SubjectChoice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Adds a rule with the next free id.
    pub fn with_rule(mut self, kind: RuleKind) -> Self {
        let id = self.next_rule_id();
        self.rules.push(Rule::new(id, kind));
        self
    }

    // ---- entity lookup ----

    /// Track by id.
    pub fn track(&self, id: TrackId) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .ok_or(BlockungError::UnknownTrack(id))
    }

    /// Track by number.
    pub fn track_by_number(&self, number: i32) -> Result<&Track> {
        self.tracks
            .iter()
            .find(|t| t.number == number)
            .ok_or(BlockungError::UnknownTrackNumber(number))
    }

    /// Course by id.
    pub fn course(&self, id: CourseId) -> Result<&Course> {
        self.courses
            .iter()
            .find(|c| c.id == id)
            .ok_or(BlockungError::UnknownCourse(id))
    }

    /// Mutable course by id.
    pub fn course_mut(&mut self, id: CourseId) -> Result<&mut Course> {
        self.courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(BlockungError::UnknownCourse(id))
    }

    /// Student by id.
    pub fn student(&self, id: StudentId) -> Result<&Student> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .ok_or(BlockungError::UnknownStudent(id))
    }

    /// Subject by id.
    pub fn subject(&self, id: SubjectId) -> Result<&Subject> {
        self.subjects
            .iter()
            .find(|s| s.id == id)
            .ok_or(BlockungError::UnknownSubject(id))
    }

    // ---- choices ----

    /// The student's choice for a subject.
    pub fn choice(&self, student: StudentId, subject: SubjectId) -> Option<&SubjectChoice> {
        self.choices
            .iter()
            .find(|c| c.student_id == student && c.subject_id == subject)
    }

    /// The student's choice for a subject, or an error.
    pub fn choice_or_err(&self, student: StudentId, subject: SubjectId) -> Result<&SubjectChoice> {
        self.choice(student, subject)
            .ok_or(BlockungError::UnknownChoice { student, subject })
    }

    /// All choices of a student in subject order.
    pub fn choices_of_student(&self, student: StudentId) -> Vec<&SubjectChoice> {
        let mut list: Vec<&SubjectChoice> = self
            .choices
            .iter()
            .filter(|c| c.student_id == student)
            .collect();
        list.sort_by(|a, b| self.compare_subjects(a.subject_id, b.subject_id));
        list
    }

    /// Whether the student chose the subject.
    pub fn has_subject(&self, student: StudentId, subject: SubjectId) -> bool {
        self.choice(student, subject).is_some()
    }

    /// Whether the student chose the subject with this course kind.
    pub fn has_subject_kind(&self, student: StudentId, sk: SubjectKind) -> bool {
        self.choice(student, sk.subject)
            .is_some_and(|c| c.kind == sk.kind)
    }

    /// Whether both students chose the subject with the same course kind.
    /// Fails if either has no choice for the subject.
    pub fn same_kind_in_subject(
        &self,
        student1: StudentId,
        student2: StudentId,
        subject: SubjectId,
    ) -> Result<bool> {
        let c1 = self.choice_or_err(student1, subject)?;
        let c2 = self.choice_or_err(student2, subject)?;
        Ok(c1.kind == c2.kind)
    }

    /// Subject-kinds chosen identically by both students, in subject order.
    pub fn shared_subject_kinds(&self, student1: StudentId, student2: StudentId) -> Vec<SubjectKind> {
        self.choices_of_student(student1)
            .into_iter()
            .filter(|c| self.has_subject_kind(student2, c.subject_kind()))
            .map(SubjectChoice::subject_kind)
            .collect()
    }

    /// Courses offering the subject-kind, ascending by id.
    pub fn courses_of_subject_kind(&self, sk: SubjectKind) -> Vec<&Course> {
        let mut list: Vec<&Course> = self
            .courses
            .iter()
            .filter(|c| c.subject_kind() == sk)
            .collect();
        list.sort_by_key(|c| c.id);
        list
    }

    /// Whether the student is external. Unknown students count as regular.
    pub fn is_external(&self, student: StudentId) -> bool {
        self.student(student).is_ok_and(Student::is_external)
    }

    // ---- rules ----

    /// All rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules of one type in insertion order.
    pub fn rules_of_type(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.rule_type() == rule_type)
    }

    /// Rule equivalent to `kind`.
    pub fn find_rule(&self, kind: &RuleKind) -> Option<&Rule> {
        self.rules.iter().find(|r| &r.kind == kind)
    }

    /// Whether a rule equivalent to `kind` exists.
    pub fn has_rule(&self, kind: &RuleKind) -> bool {
        self.find_rule(kind).is_some()
    }

    /// Rule by id.
    pub fn rule(&self, id: RuleId) -> Result<&Rule> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .ok_or(BlockungError::UnknownRule(id))
    }

    /// Next free rule id.
    pub fn next_rule_id(&self) -> RuleId {
        self.rules.iter().map(|r| r.id + 1).max().unwrap_or(1)
    }

    /// Adds rules, allocating ids. All or nothing: fails without changes if
    /// any kind already exists or appears twice in the list.
    pub fn add_rules(&mut self, kinds: &[RuleKind]) -> Result<Vec<RuleId>> {
        for (i, kind) in kinds.iter().enumerate() {
            if self.has_rule(kind) || kinds[..i].contains(kind) {
                return Err(BlockungError::DuplicateRule(format!("{kind:?}")));
            }
        }
        let mut ids = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let id = self.next_rule_id();
            self.rules.push(Rule::new(id, kind.clone()));
            ids.push(id);
        }
        Ok(ids)
    }

    /// Removes rules by id. All or nothing: fails without changes if any id
    /// is unknown.
    pub fn remove_rules(&mut self, ids: &[RuleId]) -> Result<()> {
        for &id in ids {
            self.rule(id)?;
        }
        self.rules.retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    /// Whether the student is fixed in the course (rule 4).
    pub fn is_student_fixed_in_course(&self, student: StudentId, course: CourseId) -> bool {
        self.has_rule(&RuleKind::StudentFixedInCourse { student, course })
    }

    /// Whether the student is forbidden in the course (rule 5).
    pub fn is_student_forbidden_in_course(&self, student: StudentId, course: CourseId) -> bool {
        self.has_rule(&RuleKind::StudentForbiddenInCourse { student, course })
    }

    /// Whether the course is fixed in the track number (rule 2).
    pub fn is_course_fixed_in_track(&self, course: CourseId, track_number: i32) -> bool {
        self.has_rule(&RuleKind::CourseFixedInTrack {
            course,
            track_number,
        })
    }

    /// Whether the course is locked out of the track number (rule 3).
    pub fn is_course_locked_in_track(&self, course: CourseId, track_number: i32) -> bool {
        self.has_rule(&RuleKind::CourseLockedInTrack {
            course,
            track_number,
        })
    }

    /// Whether the course may receive another track fix: it has fewer fixes
    /// than required tracks.
    pub fn further_fixing_allowed(&self, course: CourseId) -> Result<bool> {
        let required = self.course(course)?.required_tracks;
        let fixes = self
            .rules
            .iter()
            .filter(|r| matches!(r.kind, RuleKind::CourseFixedInTrack { course: c, .. } if c == course))
            .count();
        Ok((fixes as i64) < i64::from(required))
    }

    // ---- ordering ----

    /// Total subject order: sort key, short name, id. Unknown subjects last.
    pub fn compare_subjects(&self, a: SubjectId, b: SubjectId) -> Ordering {
        let key = |id: SubjectId| {
            self.subject(id)
                .map(|s| (0, s.sort_key, s.short_name.clone()))
                .unwrap_or((1, 0, String::new()))
        };
        key(a).cmp(&key(b)).then(a.cmp(&b))
    }

    /// Subject-kind order for the given sort order.
    pub fn compare_subject_kinds(&self, a: SubjectKind, b: SubjectKind, order: SortOrder) -> Ordering {
        match order {
            SortOrder::KindSubjectNumber => a
                .kind
                .cmp(&b.kind)
                .then_with(|| self.compare_subjects(a.subject, b.subject)),
            SortOrder::SubjectKindNumber => self
                .compare_subjects(a.subject, b.subject)
                .then(a.kind.cmp(&b.kind)),
        }
    }

    /// Course order for the given sort order. Unknown courses last.
    pub fn compare_courses(&self, a: CourseId, b: CourseId, order: SortOrder) -> Ordering {
        match (self.course(a), self.course(b)) {
            (Ok(ca), Ok(cb)) => self
                .compare_subject_kinds(ca.subject_kind(), cb.subject_kind(), order)
                .then(ca.number.cmp(&cb.number))
                .then(a.cmp(&b)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(&b),
        }
    }

    // ---- names ----

    /// Course name, e.g. "M-GK2".
    pub fn course_name(&self, id: CourseId) -> String {
        match self.course(id) {
            Ok(c) => format!(
                "{}-{}{}{}",
                self.subject_name(c.subject_id),
                c.kind.short_name(),
                c.number,
                c.suffix
            ),
            Err(_) => format!("Kurs#{id}"),
        }
    }

    /// Student name as "Last, First".
    pub fn student_name(&self, id: StudentId) -> String {
        self.student(id)
            .map(Student::display_name)
            .unwrap_or_else(|_| format!("Schüler#{id}"))
    }

    /// Subject short name.
    pub fn subject_name(&self, id: SubjectId) -> String {
        self.subject(id)
            .map(|s| s.short_name.clone())
            .unwrap_or_else(|_| format!("Fach#{id}"))
    }

    /// Subject-kind name, e.g. "M-GK".
    pub fn subject_kind_name(&self, sk: SubjectKind) -> String {
        format!("{}-{}", self.subject_name(sk.subject), sk.kind.short_name())
    }

    /// Track name, e.g. "Schiene 3".
    pub fn track_name(&self, id: TrackId) -> String {
        match self.track(id) {
            Ok(t) => format!("Schiene {}", t.number),
            Err(_) => format!("Schiene#{id}"),
        }
    }

    // ---- parent notifications ----

    /// Records the score summary of a result.
    pub fn update_result_score(&mut self, result: ResultId, score: Score) {
        self.result_scores.insert(result, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseKind, Gender};

    fn sample_data() -> BlockingData {
        BlockingData::new(1, "Q1")
            .with_numbered_tracks(100, 3)
            .with_subject(Subject::new(1, "M").with_sort_key(2))
            .with_subject(Subject::new(2, "D").with_sort_key(1))
            .with_course(Course::new(10, 1, CourseKind::Gk, 1))
            .with_course(Course::new(11, 2, CourseKind::Lk, 1).with_required_tracks(2))
            .with_student(Student::new(1, "Anna", "Berg", Gender::W))
            .with_student(Student::new(2, "Ben", "Cox", Gender::M))
            .with_choice(SubjectChoice::new(1, 1, CourseKind::Gk))
            .with_choice(SubjectChoice::new(1, 2, CourseKind::Lk))
            .with_choice(SubjectChoice::new(2, 1, CourseKind::Gk))
            .with_choice(SubjectChoice::new(2, 2, CourseKind::Gk))
    }

    #[test]
    fn test_lookups() {
        let d = sample_data();
        assert_eq!(d.track_by_number(2).unwrap().id, 101);
        assert_eq!(d.track(105), Err(BlockungError::UnknownTrack(105)));
        assert!(d.course(99).is_err());
        assert_eq!(d.course_name(10), "M-GK1");
        assert_eq!(d.student_name(2), "Cox, Ben");
        assert_eq!(d.track_name(102), "Schiene 3");
    }

    #[test]
    fn test_shared_subject_kinds() {
        let d = sample_data();
        let shared = d.shared_subject_kinds(1, 2);
        assert_eq!(shared, vec![SubjectKind::new(1, CourseKind::Gk)]);
        assert!(!d.same_kind_in_subject(1, 2, 2).unwrap());
        assert!(d.same_kind_in_subject(1, 2, 3).is_err());
    }

    #[test]
    fn test_choices_in_subject_order() {
        let d = sample_data();
        let subjects: Vec<SubjectId> = d.choices_of_student(1).iter().map(|c| c.subject_id).collect();
        assert_eq!(subjects, vec![2, 1]);
    }

    #[test]
    fn test_add_rules_rejects_duplicates() {
        let mut d = sample_data();
        let ids = d.add_rules(&[RuleKind::RespectTeachers]).unwrap();
        assert_eq!(ids, vec![1]);
        assert!(d.add_rules(&[RuleKind::RespectTeachers]).is_err());

        let k = RuleKind::IgnoreStudent { student: 1 };
        assert!(d.add_rules(&[k.clone(), k]).is_err());
        assert_eq!(d.rules().len(), 1);
    }

    #[test]
    fn test_remove_rules_all_or_nothing() {
        let mut d = sample_data().with_rule(RuleKind::RespectTeachers);
        assert!(d.remove_rules(&[1, 42]).is_err());
        assert_eq!(d.rules().len(), 1);
        d.remove_rules(&[1]).unwrap();
        assert!(d.rules().is_empty());
    }

    #[test]
    fn test_further_fixing_allowed() {
        let d = sample_data()
            .with_rule(RuleKind::CourseFixedInTrack {
                course: 11,
                track_number: 1,
            });
        assert!(d.further_fixing_allowed(11).unwrap());
        let d = d.with_rule(RuleKind::CourseFixedInTrack {
            course: 11,
            track_number: 2,
        });
        assert!(!d.further_fixing_allowed(11).unwrap());
    }

    #[test]
    fn test_course_order() {
        let d = sample_data();
        // Kind first: LK (course 11) before GK (course 10).
        assert_eq!(d.compare_courses(11, 10, SortOrder::KindSubjectNumber), Ordering::Less);
        // Subject first: D (sort key 1, course 11) before M.
        assert_eq!(d.compare_courses(11, 10, SortOrder::SubjectKindNumber), Ordering::Less);
        let d = d.with_course(Course::new(12, 1, CourseKind::Lk, 1));
        // Subject first: D-LK (11) < M-LK (12); kind first: D-LK < M-LK too, but M-LK < M-GK.
        assert_eq!(d.compare_courses(12, 10, SortOrder::SubjectKindNumber), Ordering::Less);
        assert_eq!(d.compare_courses(10, 11, SortOrder::KindSubjectNumber), Ordering::Greater);
    }
}
