//! Read-only queries.
//!
//! Every query reads the structures of the last revalidation; nothing here
//! recomputes or mutates. Lookups of unknown ids fail with the matching
//! [`BlockungError`] variant, predicates on unknown ids answer `false`.
//!
//! # Groups
//!
//! | Group | Examples |
//! |-------|----------|
//! | Result | [`ResultEngine::result_including_quarantined`], [`ResultEngine::diagnostics`] |
//! | Subject | [`ResultEngine::subject_kind_spread`], [`ResultEngine::subject_kinds_sorted`] |
//! | Student | [`ResultEngine::student_courses_sorted`], [`ResultEngine::unassigned_choices`] |
//! | Filter | [`ResultEngine::students_filtered`], [`ResultEngine::count_students`] |
//! | Course | [`ResultEngine::course_headcount`], [`ResultEngine::unfixed_students`] |
//! | Track | [`ResultEngine::track_collision_text`], [`ResultEngine::track_removal_allowed`] |
//! | Proposal | [`ResultEngine::proposal_for_student`] |

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::mutation::{StudentCourseUpdate, StudentCoursePair};
use super::rule_diff::FixCategory;
use super::tooltip::{self, TrackCollisionGroup, Tooltips};
use super::ResultEngine;
use crate::error::{BlockungError, Result};
use crate::index::sort_courses;
use crate::models::{
    BlockingResult, CourseId, CourseKind, Gender, ResultCourse, ResultTrack, RuleId, Score,
    StudentId, SubjectChoice, SubjectId, SubjectKind, TrackId,
};
use crate::scoring::{spread_badge, SpreadBreakdown};
use crate::solver::{ProposalCourse, ProposalInput, ProposalSolver};
use crate::validation::StructuralDiagnostic;

/// Conflict criterion of a [`StudentFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictFilter {
    #[default]
    Any,
    /// Students with at least one collision.
    Collision,
    /// Students with at least one choice without course.
    Unassigned,
    CollisionOrUnassigned,
}

/// Student selection; all set criteria must hold.
///
/// `kind` only narrows a `subject` criterion. `written` compares against the
/// choice of the course's subject, or of `subject`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub course: Option<CourseId>,
    pub subject: Option<SubjectId>,
    pub kind: Option<CourseKind>,
    pub conflict: ConflictFilter,
    /// Case-insensitive part of the first or last name. Empty matches all.
    pub name: String,
    pub gender: Option<Gender>,
    pub written: Option<bool>,
}

impl StudentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, course: CourseId) -> Self {
        self.course = Some(course);
        self
    }

    pub fn with_subject(mut self, subject: SubjectId) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_subject_kind(mut self, sk: SubjectKind) -> Self {
        self.subject = Some(sk.subject);
        self.kind = Some(sk.kind);
        self
    }

    pub fn with_conflict(mut self, conflict: ConflictFilter) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_written(mut self, written: bool) -> Self {
        self.written = Some(written);
        self
    }
}

impl ResultEngine {
    // ---- result ----

    /// The result with quarantined enrolments added back to their courses.
    pub fn result_including_quarantined(&self) -> BlockingResult {
        let mut result = self.result().clone();
        for (&student, courses) in &self.index().quarantined {
            for &course in courses {
                if let Some(rc) = result.courses.iter_mut().find(|c| c.id == course) {
                    if !rc.students.contains(&student) {
                        rc.students.push(student);
                        rc.students.sort_unstable();
                    }
                }
            }
        }
        result
    }

    /// Structural findings of the last revalidation.
    pub fn diagnostics(&self) -> &[StructuralDiagnostic] {
        &self.derived.diagnostics
    }

    pub fn external_student_count(&self) -> usize {
        self.data()
            .students
            .iter()
            .filter(|s| s.is_external())
            .count()
    }

    /// Σ dummy students over all courses.
    pub fn dummy_student_count(&self) -> u32 {
        self.index().course_dummies.values().sum()
    }

    pub fn score(&self) -> &Score {
        &self.result().score
    }

    /// Criterion 3 split into advanced, basic and other courses.
    pub fn spread_breakdown(&self) -> SpreadBreakdown {
        self.derived.breakdown
    }

    pub fn criterion3_value_lk(&self) -> u32 {
        self.derived.breakdown.lk
    }

    pub fn criterion3_value_gk(&self) -> u32 {
        self.derived.breakdown.gk
    }

    pub fn criterion3_value_rest(&self) -> u32 {
        self.derived.breakdown.rest
    }

    pub fn criterion3_badge_lk(&self) -> f64 {
        spread_badge(self.derived.breakdown.lk)
    }

    pub fn criterion3_badge_gk(&self) -> f64 {
        spread_badge(self.derived.breakdown.gk)
    }

    pub fn criterion3_badge_rest(&self) -> f64 {
        spread_badge(self.derived.breakdown.rest)
    }

    /// Whether no choice has a course.
    pub fn all_choices_unassigned(&self) -> bool {
        self.index()
            .student_subject_course
            .values()
            .all(Option::is_none)
    }

    // ---- subjects ----

    /// Courses of a subject in course order.
    pub fn subject_courses(&self, subject: SubjectId) -> Result<&[CourseId]> {
        self.index()
            .subject_courses
            .get(&subject)
            .map(Vec::as_slice)
            .ok_or(BlockungError::UnknownSubject(subject))
    }

    /// Courses of a subject-kind in course order.
    pub fn subject_kind_courses(&self, sk: SubjectKind) -> Result<&[CourseId]> {
        self.index()
            .subject_kind_courses
            .get(&sk)
            .map(Vec::as_slice)
            .ok_or(BlockungError::UnknownSubject(sk.subject))
    }

    /// Largest headcount difference between the courses of a subject-kind.
    pub fn subject_kind_spread(&self, sk: SubjectKind) -> Result<u32> {
        self.index()
            .subject_kind_spread
            .get(&sk)
            .copied()
            .ok_or(BlockungError::UnknownSubject(sk.subject))
    }

    pub fn subject_kind_name(&self, sk: SubjectKind) -> String {
        self.data().subject_kind_name(sk)
    }

    /// Subject-kinds in the engine's sort order.
    pub fn subject_kinds_sorted(&self) -> &[SubjectKind] {
        &self.index().subject_kinds_sorted
    }

    /// Students choosing the subject, by gender.
    pub fn subject_count_by_gender(&self, subject: SubjectId, gender: Gender) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_subject(subject).with_gender(gender))
    }

    /// Students taking the subject written (`true`) or oral.
    pub fn subject_count_written(&self, subject: SubjectId, written: bool) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_subject(subject).with_written(written))
    }

    pub fn subject_kind_count_by_gender(&self, sk: SubjectKind, gender: Gender) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_subject_kind(sk).with_gender(gender))
    }

    pub fn subject_kind_count_written(&self, sk: SubjectKind, written: bool) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_subject_kind(sk).with_written(written))
    }

    // ---- students ----

    /// Valid courses of a student.
    pub fn student_courses(&self, student: StudentId) -> Result<&BTreeSet<CourseId>> {
        self.index()
            .student_courses
            .get(&student)
            .ok_or(BlockungError::UnknownStudent(student))
    }

    /// Valid courses of a student in the engine's course order.
    pub fn student_courses_sorted(&self, student: StudentId) -> Result<Vec<CourseId>> {
        let mut list: Vec<CourseId> = self.student_courses(student)?.iter().copied().collect();
        sort_courses(self.data(), &mut list, self.index().sort_order);
        Ok(list)
    }

    /// Courses of a student that share a track with another of its courses.
    pub fn student_collision_courses(&self, student: StudentId) -> BTreeSet<CourseId> {
        let mut out = BTreeSet::new();
        for track in self.index().tracks_by_number() {
            if let Some(courses) = self.index().courses_in_track(student, track) {
                if courses.len() > 1 {
                    out.extend(courses.iter().copied());
                }
            }
        }
        out
    }

    /// Choices of a student without a course, in subject order.
    pub fn unassigned_choices(&self, student: StudentId) -> Vec<&SubjectChoice> {
        self.data()
            .choices_of_student(student)
            .into_iter()
            .filter(|c| self.assigned_course(student, c.subject_id).is_none())
            .collect()
    }

    /// Whether the student has fewer courses than choices.
    pub fn has_unassigned_choice(&self, student: StudentId) -> Result<bool> {
        let assigned = self.student_courses(student)?.len();
        let chosen = self
            .index()
            .student_subject_course
            .range((student, SubjectId::MIN)..=(student, SubjectId::MAX))
            .count();
        Ok(assigned < chosen)
    }

    pub fn has_choice(&self, student: StudentId, sk: SubjectKind) -> bool {
        self.data().has_subject_kind(student, sk)
    }

    pub fn has_subject(&self, student: StudentId, subject: SubjectId) -> bool {
        self.data().has_subject(student, subject)
    }

    pub fn student_collision_count(&self, student: StudentId) -> Result<u32> {
        self.index()
            .student_collisions
            .get(&student)
            .copied()
            .ok_or(BlockungError::UnknownStudent(student))
    }

    pub fn student_has_collision(&self, student: StudentId) -> Result<bool> {
        Ok(self.student_collision_count(student)? > 0)
    }

    /// Whether the student sits in more than one course of the track.
    pub fn student_has_collision_in_track(&self, student: StudentId, track: TrackId) -> bool {
        self.index()
            .courses_in_track(student, track)
            .is_some_and(|c| c.len() > 1)
    }

    /// Course kind the student chose for a subject.
    pub fn student_kind_in_subject(&self, student: StudentId, subject: SubjectId) -> Result<CourseKind> {
        Ok(self.data().choice_or_err(student, subject)?.kind)
    }

    /// The student's course in a subject, if any.
    pub fn assigned_course(&self, student: StudentId, subject: SubjectId) -> Option<CourseId> {
        self.index()
            .student_subject_course
            .get(&(student, subject))
            .copied()
            .flatten()
    }

    /// Valid enrolment.
    pub fn is_student_in_course(&self, student: StudentId, course: CourseId) -> bool {
        self.index()
            .course_students
            .get(&course)
            .is_some_and(|set| set.contains(&student))
    }

    pub fn is_student_fixed(&self, student: StudentId, course: CourseId) -> bool {
        self.data().is_student_fixed_in_course(student, course)
    }

    pub fn is_student_locked(&self, student: StudentId, course: CourseId) -> bool {
        self.data().is_student_forbidden_in_course(student, course)
    }

    /// The student's choice for the subject of a course.
    pub fn choice_for_course(&self, student: StudentId, course: CourseId) -> Result<&SubjectChoice> {
        let subject = self.data().course(course)?.subject_id;
        self.data().choice_or_err(student, subject)
    }

    /// Whether the student's choice for the course falls into `category`.
    pub fn is_in_exam_category(&self, student: StudentId, course: CourseId, category: FixCategory) -> Result<bool> {
        Ok(category.matches(self.choice_for_course(student, course)?))
    }

    /// Whether the course's subject is one of the student's exam subjects.
    pub fn is_abitur_in_course(&self, student: StudentId, course: CourseId) -> bool {
        self.choice_for_course(student, course)
            .is_ok_and(SubjectChoice::is_abitur)
    }

    pub fn is_written_in_course(&self, student: StudentId, course: CourseId) -> Result<bool> {
        Ok(self.choice_for_course(student, course)?.written)
    }

    /// Case-insensitive match on first or last name.
    pub fn student_name_contains(&self, student: StudentId, needle: &str) -> Result<bool> {
        let s = self.data().student(student)?;
        let needle = needle.to_lowercase();
        Ok(s.last_name.to_lowercase().contains(&needle) || s.first_name.to_lowercase().contains(&needle))
    }

    pub fn is_external(&self, student: StudentId) -> bool {
        self.data().is_external(student)
    }

    /// Enrolments without a matching choice, per student.
    pub fn quarantined(&self) -> &BTreeMap<StudentId, BTreeSet<CourseId>> {
        &self.index().quarantined
    }

    /// Whether a track of the course holds another course of the student.
    pub fn student_has_collision_in_course(&self, student: StudentId, course: CourseId) -> Result<bool> {
        if !self.student_has_collision(student)? {
            return Ok(false);
        }
        Ok(self
            .index()
            .course_tracks
            .get(&course)
            .into_iter()
            .flatten()
            .any(|&t| self.student_has_collision_in_track(student, t)))
    }

    /// Whether both students sit in the same course of a subject.
    pub fn is_together_in_subject(&self, s1: StudentId, s2: StudentId, subject: SubjectId) -> bool {
        self.index().together_in_subject(s1, s2, subject)
    }

    // ---- filter ----

    /// Whether a student meets every criterion of `filter`.
    pub fn student_matches(&self, student: StudentId, filter: &StudentFilter) -> Result<bool> {
        let collision = || self.student_has_collision(student);
        let unassigned = || self.has_unassigned_choice(student);
        let conflict_ok = match filter.conflict {
            ConflictFilter::Any => true,
            ConflictFilter::Collision => collision()?,
            ConflictFilter::Unassigned => unassigned()?,
            ConflictFilter::CollisionOrUnassigned => collision()? || unassigned()?,
        };
        if !conflict_ok {
            return Ok(false);
        }
        if !filter.name.is_empty() && !self.student_name_contains(student, &filter.name)? {
            return Ok(false);
        }
        if let Some(gender) = filter.gender {
            if self.data().student(student)?.gender != gender {
                return Ok(false);
            }
        }
        if let Some(course) = filter.course {
            if !self.is_student_in_course(student, course) {
                return Ok(false);
            }
            if let Some(written) = filter.written {
                if self.is_written_in_course(student, course)? != written {
                    return Ok(false);
                }
            }
        }
        if let Some(subject) = filter.subject {
            let chosen = match filter.kind {
                Some(kind) => self.has_choice(student, SubjectKind::new(subject, kind)),
                None => self.has_subject(student, subject),
            };
            if !chosen {
                return Ok(false);
            }
            if let Some(written) = filter.written {
                if self.data().choice_or_err(student, subject)?.written != written {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Students meeting `filter`, in base data order.
    ///
    /// # Errors
    /// Fails if a student of the base data is missing from the index.
    pub fn students_filtered(&self, filter: &StudentFilter) -> Result<Vec<StudentId>> {
        let mut out = Vec::new();
        for s in &self.data().students {
            if self.student_matches(s.id, filter)? {
                out.push(s.id);
            }
        }
        Ok(out)
    }

    pub fn count_students(&self, filter: &StudentFilter) -> Result<usize> {
        Ok(self.students_filtered(filter)?.len())
    }

    pub fn student_count_by_gender(&self, gender: Gender) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_gender(gender))
    }

    /// Students with a collision or a choice without course.
    pub fn students_with_conflicts_count(&self) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_conflict(ConflictFilter::CollisionOrUnassigned))
    }

    // ---- courses ----

    pub fn course(&self, course: CourseId) -> Result<&ResultCourse> {
        self.result()
            .course(course)
            .ok_or(BlockungError::UnknownCourse(course))
    }

    pub fn courses(&self) -> &[ResultCourse] {
        &self.result().courses
    }

    pub fn course_name(&self, course: CourseId) -> String {
        self.data().course_name(course)
    }

    pub fn is_course_in_track(&self, course: CourseId, track: TrackId) -> bool {
        self.index()
            .course_tracks
            .get(&course)
            .is_some_and(|t| t.contains(&track))
    }

    pub fn is_course_in_track_number(&self, course: CourseId, track_number: i32) -> bool {
        self.index()
            .track_by_number
            .get(&track_number)
            .is_some_and(|&t| self.is_course_in_track(course, t))
    }

    /// Whether the course is fixed in the track's number.
    pub fn is_course_fixed_in_track(&self, course: CourseId, track: TrackId) -> Result<bool> {
        let number = self.data().track(track)?.number;
        Ok(self.data().is_course_fixed_in_track(course, number))
    }

    /// Valid students of a course, ascending. Empty for unknown courses.
    pub fn course_students(&self, course: CourseId) -> Vec<StudentId> {
        self.index()
            .course_students
            .get(&course)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn course_tracks(&self, course: CourseId) -> Result<&BTreeSet<TrackId>> {
        self.index()
            .course_tracks
            .get(&course)
            .ok_or(BlockungError::UnknownCourse(course))
    }

    /// Numbers of the course's tracks, ascending.
    pub fn course_track_numbers(&self, course: CourseId) -> Vec<i32> {
        let index = self.index();
        let mut numbers: Vec<i32> = index
            .course_tracks
            .get(&course)
            .into_iter()
            .flatten()
            .filter_map(|t| index.track_number.get(t).copied())
            .collect();
        numbers.sort_unstable();
        numbers
    }

    /// Students of the course that collide in one of its tracks.
    pub fn course_collision_students(&self, course: CourseId) -> BTreeSet<StudentId> {
        let mut out = BTreeSet::new();
        for &track in self.index().course_tracks.get(&course).into_iter().flatten() {
            for student in self.course_students(course) {
                if self.student_has_collision_in_track(student, track) {
                    out.insert(student);
                }
            }
        }
        out
    }

    pub fn course_collision_count(&self, course: CourseId) -> usize {
        self.course_collision_students(course).len()
    }

    pub fn course_has_collision(&self, course: CourseId) -> bool {
        self.course_collision_count(course) > 0
    }

    /// Courses with at least one colliding student.
    pub fn courses_with_collisions(&self) -> BTreeSet<CourseId> {
        self.index()
            .course_ids
            .iter()
            .copied()
            .filter(|&c| self.course_has_collision(c))
            .collect()
    }

    pub fn course_headcount(&self, course: CourseId) -> u32 {
        self.index().course_size(course)
    }

    pub fn course_headcount_with_dummies(&self, course: CourseId) -> u32 {
        self.index().course_size_with_dummies(course)
    }

    pub fn course_dummy_count(&self, course: CourseId) -> u32 {
        self.index().course_dummies.get(&course).copied().unwrap_or(0)
    }

    pub fn course_external_count(&self, course: CourseId) -> usize {
        self.course_students(course)
            .into_iter()
            .filter(|&s| self.is_external(s))
            .count()
    }

    pub fn course_regular_count(&self, course: CourseId) -> usize {
        self.course_students(course)
            .into_iter()
            .filter(|&s| !self.is_external(s))
            .count()
    }

    pub fn course_count_by_gender(&self, course: CourseId, gender: Gender) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_course(course).with_gender(gender))
    }

    pub fn course_count_written(&self, course: CourseId, written: bool) -> Result<usize> {
        self.count_students(&StudentFilter::new().with_course(course).with_written(written))
    }

    /// Students of the course whose choice falls into `category`.
    pub fn course_exam_count(&self, course: CourseId, category: FixCategory) -> Result<usize> {
        let mut count = 0;
        for student in self.course_students(course) {
            if self.is_in_exam_category(student, course, category)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Tracks the course occupies.
    pub fn course_track_count(&self, course: CourseId) -> usize {
        self.index().course_tracks.get(&course).map_or(0, BTreeSet::len)
    }

    /// Tracks the course should occupy.
    pub fn course_required_tracks(&self, course: CourseId) -> Result<i32> {
        Ok(self.data().course(course)?.required_tracks)
    }

    /// A course may be deleted once it has no students.
    pub fn course_removal_allowed(&self, course: CourseId) -> Result<bool> {
        self.course(course)?;
        Ok(self.course_headcount(course) == 0)
    }

    /// Students of the course without a fix there.
    pub fn unfixed_students(&self, course: CourseId) -> Vec<StudentId> {
        self.course_students(course)
            .into_iter()
            .filter(|&s| !self.is_student_fixed(s, course))
            .collect()
    }

    /// Like [`Self::unfixed_students`], exam subjects only.
    pub fn unfixed_abitur_students(&self, course: CourseId) -> Vec<StudentId> {
        self.unfixed_students(course)
            .into_iter()
            .filter(|&s| self.is_abitur_in_course(s, course))
            .collect()
    }

    // ---- tracks ----

    pub fn track(&self, track: TrackId) -> Result<&ResultTrack> {
        self.result()
            .track(track)
            .ok_or(BlockungError::UnknownTrack(track))
    }

    pub fn track_by_number(&self, track_number: i32) -> Result<&ResultTrack> {
        self.track(self.track_id_of_number(track_number)?)
    }

    pub fn track_id_of_number(&self, track_number: i32) -> Result<TrackId> {
        self.index()
            .track_by_number
            .get(&track_number)
            .copied()
            .ok_or(BlockungError::UnknownTrackNumber(track_number))
    }

    /// Tracks ordered by number.
    pub fn tracks(&self) -> &[ResultTrack] {
        &self.result().tracks
    }

    pub fn track_count(&self) -> i32 {
        self.index().track_by_number.len() as i32
    }

    pub fn tracks_with_collisions(&self) -> Vec<TrackId> {
        self.index()
            .tracks_by_number()
            .filter(|t| self.index().track_collisions.get(t).is_some_and(|&n| n > 0))
            .collect()
    }

    /// Σ valid students over the courses of a track.
    pub fn track_headcount(&self, track: TrackId) -> Result<u32> {
        self.index()
            .track_headcount
            .get(&track)
            .copied()
            .ok_or(BlockungError::UnknownTrack(track))
    }

    pub fn track_collisions(&self, track: TrackId) -> Result<u32> {
        self.index()
            .track_collisions
            .get(&track)
            .copied()
            .ok_or(BlockungError::UnknownTrack(track))
    }

    pub fn track_has_collision(&self, track: TrackId) -> Result<bool> {
        Ok(self.track_collisions(track)? > 0)
    }

    pub fn track_collision_students(&self, track: TrackId) -> BTreeSet<StudentId> {
        self.index()
            .student_ids
            .iter()
            .copied()
            .filter(|&s| self.student_has_collision_in_track(s, track))
            .collect()
    }

    /// Courses of the track with a colliding student, in course order.
    pub fn track_collision_courses(&self, track: TrackId) -> Result<Vec<CourseId>> {
        Ok(self
            .track_courses_sorted(track)?
            .iter()
            .copied()
            .filter(|&c| self.course_has_collision(c))
            .collect())
    }

    pub fn track_courses_sorted(&self, track: TrackId) -> Result<&[CourseId]> {
        Ok(&self.track(track)?.courses)
    }

    /// Shared-student groups of the track's courses.
    pub fn track_collision_groups(&self, track: TrackId) -> Result<Vec<TrackCollisionGroup>> {
        let courses = self.track_courses_sorted(track)?;
        Ok(tooltip::track_collision_groups(self.index(), courses))
    }

    /// Tooltip listing shared students between the courses of a track.
    pub fn track_collision_text(&self, track: TrackId) -> Result<String> {
        let courses = self.track_courses_sorted(track)?;
        Ok(tooltip::track_collision_text(self.data(), self.index(), courses))
    }

    /// A track may be deleted once it holds no course.
    pub fn track_removal_allowed(&self, track: TrackId) -> Result<bool> {
        Ok(self.track(track)?.courses.is_empty())
    }

    /// Most courses in any track.
    pub fn max_courses_per_track(&self) -> usize {
        self.tracks().iter().map(|t| t.courses.len()).max().unwrap_or(0)
    }

    pub fn track_external_count(&self, track: TrackId) -> Result<usize> {
        Ok(self
            .track_courses_sorted(track)?
            .iter()
            .map(|&c| self.course_external_count(c))
            .sum())
    }

    pub fn track_dummy_count(&self, track: TrackId) -> Result<u32> {
        Ok(self
            .track_courses_sorted(track)?
            .iter()
            .map(|&c| self.course_dummy_count(c))
            .sum())
    }

    // ---- rules ----

    /// Violation text per violated rule.
    pub fn texts_by_rule(&self) -> &BTreeMap<RuleId, String> {
        &self.derived.texts_by_rule
    }

    pub fn tooltips(&self) -> &Tooltips {
        &self.derived.tooltips
    }

    // ---- proposal ----

    /// Re-places one student with `solver` and returns the enrolment
    /// changes. Nothing is applied.
    ///
    /// # Arguments
    /// * `student` - Student to re-place.
    /// * `fix_enrolled` - Treat the student's current courses as fixed.
    /// * `solver` - Placement algorithm.
    ///
    /// # Errors
    /// Fails for unknown students and when a candidate course is both locked
    /// and fixed for the student.
    pub fn proposal_for_student(
        &self,
        student: StudentId,
        fix_enrolled: bool,
        solver: &dyn ProposalSolver,
    ) -> Result<StudentCourseUpdate> {
        let input = self.proposal_input(student, fix_enrolled)?;
        let mut update = StudentCourseUpdate::default();
        if input.courses.is_empty() {
            return Ok(update);
        }
        let output = solver.solve(&input);
        for (subject, target) in output.assignments {
            let current = self.assigned_course(student, subject);
            if current == target {
                continue;
            }
            if let Some(old) = current {
                update.remove.push(StudentCoursePair::new(old, student));
            }
            if let Some(new) = target {
                self.data().course(new)?;
                update.add.push(StudentCoursePair::new(new, student));
            }
        }
        debug!(
            event = "proposal_built",
            student,
            candidates = input.courses.len(),
            removed = update.remove.len(),
            added = update.add.len()
        );
        Ok(update)
    }

    fn proposal_input(&self, student: StudentId, fix_enrolled: bool) -> Result<ProposalInput> {
        self.data().student(student)?;
        let mut input = ProposalInput {
            tracks: self.track_count(),
            ..ProposalInput::default()
        };
        for choice in self.data().choices_of_student(student) {
            let sk = choice.subject_kind();
            input.choices.push(choice.clone());
            input.choice_labels.push(self.subject_kind_name(sk));
            for &course in self.subject_kind_courses(sk).unwrap_or(&[]) {
                let locked = self.is_student_locked(student, course);
                let fixed = self.is_student_fixed(student, course)
                    || (fix_enrolled && self.is_student_in_course(student, course));
                if locked && fixed {
                    return Err(BlockungError::LockedAndFixed { course, student });
                }
                input.courses.push(ProposalCourse {
                    id: course,
                    subject_id: sk.subject,
                    kind: sk.kind,
                    locked,
                    fixed,
                    headcount: self.course_headcount(course),
                    track_numbers: self.course_track_numbers(course),
                });
            }
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::*;
    use crate::models::{Assignment, BlockingData, RuleKind, Student, Subject};
    use crate::solver::stub::SmallestCourseSolver;

    #[test]
    fn test_result_including_quarantined() {
        let engine = engine_with(sample_data(), sample_assignment().with_student(12, 1));
        assert_eq!(engine.result().course(12).unwrap().students, vec![3]);
        let full = engine.result_including_quarantined();
        assert_eq!(full.course(12).unwrap().students, vec![1, 3]);
        assert_eq!(engine.quarantined()[&1].len(), 1);
    }

    #[test]
    fn test_totals() {
        let data = sample_data().with_rule(RuleKind::CourseDummyStudents { course: 10, count: 2 });
        let engine = engine_with(data, sample_assignment());
        assert_eq!(engine.external_student_count(), 1);
        assert_eq!(engine.dummy_student_count(), 2);
        assert_eq!(engine.course_headcount_with_dummies(10), 4);
        assert_eq!(engine.track_dummy_count(100).unwrap(), 2);
        assert!(engine.diagnostics().is_empty());
        assert!(!engine.all_choices_unassigned());
    }

    #[test]
    fn test_subject_queries() {
        let engine = sample_engine();
        let m_gk = SubjectKind::new(1, CourseKind::Gk);
        assert_eq!(engine.subject_kind_courses(m_gk).unwrap(), &[10, 11]);
        // M-GK1 has 2 students, M-GK2 has 1.
        assert_eq!(engine.subject_kind_spread(m_gk).unwrap(), 1);
        assert_eq!(engine.subject_kind_name(m_gk), "M-GK");
        assert_eq!(engine.subject_courses(1).unwrap().len(), 3);
        assert!(engine.subject_courses(99).is_err());
        assert_eq!(engine.subject_count_by_gender(1, Gender::M).unwrap(), 2);
        assert_eq!(engine.subject_count_written(1, true).unwrap(), 3);
        assert_eq!(engine.subject_kind_count_written(m_gk, false).unwrap(), 1);
        assert_eq!(engine.subject_kind_count_by_gender(m_gk, Gender::W).unwrap(), 2);
    }

    #[test]
    fn test_student_queries() {
        let engine = sample_engine();
        assert_eq!(engine.student_courses_sorted(1).unwrap(), vec![10, 20]);
        // M-GK1 and D-GK1 share track 1.
        assert_eq!(engine.student_collision_count(1).unwrap(), 1);
        assert_eq!(engine.student_collision_courses(1), BTreeSet::from([10, 20]));
        assert!(engine.student_has_collision_in_course(1, 10).unwrap());
        assert!(!engine.student_has_collision_in_course(2, 10).unwrap());
        assert!(engine.student_has_collision_in_track(1, 100));

        // Student 2 has no D course, student 3 no E course.
        assert!(engine.has_unassigned_choice(2).unwrap());
        assert!(!engine.has_unassigned_choice(1).unwrap());
        let open: Vec<SubjectId> = engine.unassigned_choices(3).iter().map(|c| c.subject_id).collect();
        assert_eq!(open, vec![3]);

        assert_eq!(engine.assigned_course(1, 1), Some(10));
        assert_eq!(engine.student_kind_in_subject(3, 1).unwrap(), CourseKind::Lk);
        assert!(engine.is_together_in_subject(1, 2, 1));
        assert!(engine.is_abitur_in_course(1, 10));
        assert!(!engine.is_abitur_in_course(2, 10));
        assert!(engine
            .is_in_exam_category(3, 12, FixCategory::AdvancedOrThird)
            .unwrap());
        assert!(engine.is_written_in_course(2, 10).unwrap());
        assert!(engine.student_name_contains(1, "BER").unwrap());
        assert!(engine.is_external(4));
        assert!(engine.student_courses(99).is_err());
    }

    #[test]
    fn test_student_filter() {
        let engine = sample_engine();
        let collision = StudentFilter::new().with_conflict(ConflictFilter::Collision);
        assert_eq!(engine.students_filtered(&collision).unwrap(), vec![1]);
        let unassigned = StudentFilter::new().with_conflict(ConflictFilter::Unassigned);
        assert_eq!(engine.students_filtered(&unassigned).unwrap(), vec![2, 3]);
        assert_eq!(engine.students_with_conflicts_count().unwrap(), 3);

        let m_gk_written = StudentFilter::new()
            .with_subject_kind(SubjectKind::new(1, CourseKind::Gk))
            .with_written(true);
        assert_eq!(engine.students_filtered(&m_gk_written).unwrap(), vec![1, 2]);

        let by_name = StudentFilter::new().with_name("o").with_course(10);
        assert_eq!(engine.students_filtered(&by_name).unwrap(), vec![2]);
        assert_eq!(engine.student_count_by_gender(Gender::W).unwrap(), 2);
    }

    #[test]
    fn test_filter_on_blocking_without_tracks() {
        let data = BlockingData::new(1, "Q1")
            .with_subject(Subject::new(1, "M"))
            .with_student(Student::new(1, "Anna", "Berg", Gender::W))
            .with_choice(SubjectChoice::new(1, 1, CourseKind::Gk));
        let engine = engine_with(data, Assignment::new());
        assert!(!engine.student_has_collision(1).unwrap());
        let collision = StudentFilter::new().with_conflict(ConflictFilter::Collision);
        assert!(engine.students_filtered(&collision).unwrap().is_empty());
        assert_eq!(engine.students_with_conflicts_count().unwrap(), 1);
    }

    #[test]
    fn test_course_queries() {
        let data = sample_data()
            .with_rule(RuleKind::StudentFixedInCourse { student: 1, course: 10 })
            .with_rule(RuleKind::CourseFixedInTrack { course: 10, track_number: 1 });
        let engine = engine_with(data, sample_assignment());
        assert_eq!(engine.course_name(11), "M-GK2");
        assert!(engine.is_course_in_track(10, 100));
        assert!(engine.is_course_in_track_number(11, 2));
        assert!(!engine.is_course_in_track_number(11, 9));
        assert!(engine.is_course_fixed_in_track(10, 100).unwrap());
        assert_eq!(engine.course_track_numbers(12), vec![3]);
        assert_eq!(engine.course_collision_students(10), BTreeSet::from([1]));
        assert_eq!(engine.courses_with_collisions(), BTreeSet::from([10, 20]));
        assert_eq!(engine.course_external_count(11), 1);
        assert_eq!(engine.course_regular_count(11), 0);
        assert_eq!(engine.course_count_by_gender(10, Gender::M).unwrap(), 1);
        assert_eq!(engine.course_count_written(10, true).unwrap(), 2);
        assert_eq!(engine.course_exam_count(10, FixCategory::ThirdExam).unwrap(), 1);
        assert_eq!(engine.course_exam_count(12, FixCategory::AdvancedCourse).unwrap(), 1);
        assert_eq!(engine.course_track_count(30), 0);
        assert_eq!(engine.course_required_tracks(30).unwrap(), 1);
        assert!(engine.course_removal_allowed(30).unwrap());
        assert!(!engine.course_removal_allowed(10).unwrap());
        assert_eq!(engine.unfixed_students(10), vec![2]);
        assert!(engine.unfixed_abitur_students(10).is_empty());
        assert_eq!(engine.unfixed_abitur_students(12), vec![3]);
    }

    #[test]
    fn test_track_queries() {
        let engine = sample_engine();
        assert_eq!(engine.track_count(), 3);
        assert_eq!(engine.track_id_of_number(2).unwrap(), 101);
        assert_eq!(engine.track_by_number(3).unwrap().courses, vec![12]);
        assert!(engine.track_by_number(4).is_err());
        assert_eq!(engine.tracks_with_collisions(), vec![100]);
        assert_eq!(engine.track_headcount(100).unwrap(), 3);
        assert_eq!(engine.track_collisions(100).unwrap(), 1);
        assert_eq!(engine.track_collision_students(100), BTreeSet::from([1]));
        assert_eq!(engine.track_collision_courses(100).unwrap(), vec![10, 20]);
        assert_eq!(
            engine.track_collision_text(100).unwrap(),
            "M-GK1(1): D-GK1(1)\nD-GK1(1): M-GK1(1)\n"
        );
        assert_eq!(engine.track_collision_groups(101).unwrap(), vec![]);
        assert!(!engine.track_removal_allowed(100).unwrap());
        assert_eq!(engine.max_courses_per_track(), 2);
        assert_eq!(engine.track_external_count(101).unwrap(), 1);
    }

    #[test]
    fn test_rule_texts_and_tooltips() {
        let data = sample_data().with_rule(RuleKind::CourseLockedInTrack { course: 10, track_number: 1 });
        let engine = engine_with(data, sample_assignment());
        assert_eq!(engine.texts_by_rule().len(), 1);
        assert!(engine.tooltips().rule_violations.starts_with("1 Regelverletzungen\n"));
        assert!(engine.tooltips().choice_conflicts.starts_with("Wahlkonflikte = 3\n"));
    }

    #[test]
    fn test_proposal_moves_to_smaller_course() {
        let engine = sample_engine();
        let solver = SmallestCourseSolver::default();
        // Student 2 sits in M-GK1 (2 students); M-GK2 has 1. D has one course.
        let update = engine.proposal_for_student(2, false, &solver).unwrap();
        assert_eq!(update.remove, vec![StudentCoursePair::new(10, 2)]);
        assert_eq!(
            update.add,
            vec![StudentCoursePair::new(11, 2), StudentCoursePair::new(20, 2)]
        );

        // Fixing the current courses keeps the student in place.
        let update = engine.proposal_for_student(2, true, &solver).unwrap();
        assert_eq!(update.add, vec![StudentCoursePair::new(20, 2)]);
        assert!(update.remove.is_empty());
    }

    #[test]
    fn test_proposal_locked_and_fixed_is_fatal() {
        let data = sample_data()
            .with_rule(RuleKind::StudentForbiddenInCourse { student: 1, course: 10 });
        let engine = engine_with(data, sample_assignment());
        let solver = SmallestCourseSolver::default();
        assert_eq!(
            engine.proposal_for_student(1, true, &solver),
            Err(BlockungError::LockedAndFixed { course: 10, student: 1 })
        );
        assert_eq!(solver.calls.get(), 0);
    }

    #[test]
    fn test_proposal_without_candidates_skips_solver() {
        let engine = engine_with(
            sample_data().with_student(crate::models::Student::new(5, "Eva", "Fink", Gender::W)),
            sample_assignment(),
        );
        let solver = SmallestCourseSolver::default();
        assert!(engine.proposal_for_student(5, false, &solver).unwrap().is_empty());
        assert_eq!(solver.calls.get(), 0);
        assert!(engine.proposal_for_student(99, false, &solver).is_err());
    }
}
