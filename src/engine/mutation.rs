//! Mutations of a result and its blocking.
//!
//! Every mutation goes through one transaction: the base data and the raw
//! assignment are copied, changed, revalidated and swapped in only if the
//! revalidation succeeds.
//!
//! # Update objects
//!
//! | Type | Applies to | Rule part |
//! |------|-----------|-----------|
//! | [`RuleUpdate`] | Rules | Template only, fatal otherwise |
//! | [`StudentCourseUpdate`] | Enrolments | Applied only on a template |
//! | [`CourseTrackUpdate`] | Placements | Applied only on a template |
//!
//! Update builders (`update_*`) read the current state and never change it.
//! Their output can be inspected, merged and then executed with the matching
//! `apply_*` call.

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::ResultEngine;
use crate::config::SortOrder;
use crate::error::{BlockungError, Result};
use crate::models::{
    BlockingData, Course, CourseId, Rule, RuleId, RuleKind, StudentId, Teacher, Track, TrackId,
};

/// Rules to remove and rule kinds to add, executed as one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleUpdate {
    /// Existing rules to delete.
    pub remove: Vec<Rule>,
    /// New rules; ids are allocated on execution.
    pub add: Vec<RuleKind>,
}

impl RuleUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }

    /// Schedules a rule for removal. Ignored if already scheduled.
    pub fn remove_rule(&mut self, rule: &Rule) {
        if !self.remove.iter().any(|r| r.id == rule.id) {
            self.remove.push(rule.clone());
        }
    }

    /// Schedules a rule kind for addition. Ignored if already scheduled.
    pub fn add_rule(&mut self, kind: RuleKind) {
        if !self.add.contains(&kind) {
            self.add.push(kind);
        }
    }

    /// Appends another update.
    pub fn merge(&mut self, other: RuleUpdate) {
        for rule in &other.remove {
            self.remove_rule(rule);
        }
        for kind in other.add {
            self.add_rule(kind);
        }
    }

    /// Schedules the rule equal to `kind` for removal, if it exists.
    pub(crate) fn remove_existing(&mut self, data: &BlockingData, kind: &RuleKind) {
        if let Some(rule) = data.find_rule(kind) {
            self.remove_rule(rule);
        }
    }

    /// Schedules `kind` for addition unless it already exists.
    pub(crate) fn add_missing(&mut self, data: &BlockingData, kind: RuleKind) {
        if !data.has_rule(&kind) {
            self.add_rule(kind);
        }
    }

    /// Removes first, then adds.
    pub(crate) fn apply(&self, data: &mut BlockingData) -> Result<Vec<RuleId>> {
        let ids: Vec<RuleId> = self.remove.iter().map(|r| r.id).collect();
        data.remove_rules(&ids)?;
        data.add_rules(&self.add)
    }
}

/// One enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentCoursePair {
    pub course: CourseId,
    pub student: StudentId,
}

impl StudentCoursePair {
    pub fn new(course: CourseId, student: StudentId) -> Self {
        Self { course, student }
    }
}

/// One course placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseTrackPair {
    pub course: CourseId,
    pub track: TrackId,
}

impl CourseTrackPair {
    pub fn new(course: CourseId, track: TrackId) -> Self {
        Self { course, track }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Enrolment changes plus the rule changes they imply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentCourseUpdate {
    /// Enrolments to drop.
    pub remove: Vec<StudentCoursePair>,
    /// Enrolments to create.
    pub add: Vec<StudentCoursePair>,
    /// Rule part, applied only on a template.
    pub rules: RuleUpdate,
}

impl StudentCourseUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty() && self.rules.is_empty()
    }
}

/// Placement changes plus the rule changes they imply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseTrackUpdate {
    /// Placements to drop.
    pub remove: Vec<CourseTrackPair>,
    /// Placements to create.
    pub add: Vec<CourseTrackPair>,
    /// Rule part, applied only on a template.
    pub rules: RuleUpdate,
}

impl CourseTrackUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty() && self.rules.is_empty()
    }
}

fn require_template(data: &BlockingData, what: &'static str) -> Result<()> {
    if data.is_template {
        Ok(())
    } else {
        Err(BlockungError::NotATemplate(what))
    }
}

/// Shifts rules that name track numbers after track `removed` was deleted.
///
/// Course fixes and locks on the removed number are dropped, higher numbers
/// move down by one. Ranges shrink; a range left empty is dropped. Rules
/// that became equal keep their first occurrence.
fn shift_rules_after_track_removal(rules: &mut Vec<Rule>, removed: i32) {
    let shift = |nr: i32| if nr > removed { nr - 1 } else { nr };
    let mut kept: Vec<Rule> = Vec::with_capacity(rules.len());
    for rule in rules.drain(..) {
        let id = rule.id;
        let locked = matches!(rule.kind, RuleKind::KindLockedInTrackRange { .. });
        let kind = match rule.kind {
            RuleKind::CourseFixedInTrack { track_number, .. }
            | RuleKind::CourseLockedInTrack { track_number, .. }
                if track_number == removed =>
            {
                continue;
            }
            RuleKind::CourseFixedInTrack {
                course,
                track_number,
            } => RuleKind::CourseFixedInTrack {
                course,
                track_number: shift(track_number),
            },
            RuleKind::CourseLockedInTrack {
                course,
                track_number,
            } => RuleKind::CourseLockedInTrack {
                course,
                track_number: shift(track_number),
            },
            RuleKind::KindLockedInTrackRange { kind, from, to }
            | RuleKind::KindAloneInTrackRange { kind, from, to } => {
                let new_from = shift(from);
                let new_to = if to >= removed { to - 1 } else { to };
                if new_from > new_to {
                    continue;
                }
                if locked {
                    RuleKind::KindLockedInTrackRange {
                        kind,
                        from: new_from,
                        to: new_to,
                    }
                } else {
                    RuleKind::KindAloneInTrackRange {
                        kind,
                        from: new_from,
                        to: new_to,
                    }
                }
            }
            other => other,
        };
        if !kept.iter().any(|r| r.kind == kind) {
            kept.push(Rule::new(id, kind));
        }
    }
    *rules = kept;
}

impl ResultEngine {
    // ---- single mutations ----

    /// Enrols a student. Enrolling twice is a no-op.
    pub fn add_student_to_course(&mut self, student: StudentId, course: CourseId) -> Result<()> {
        self.transact(|data, assignment| {
            data.student(student)?;
            data.course(course)?;
            assignment.add_student(course, student);
            Ok(())
        })
    }

    /// Drops an enrolment, valid or quarantined.
    pub fn remove_student_from_course(&mut self, student: StudentId, course: CourseId) -> Result<()> {
        self.transact(|data, assignment| {
            data.student(student)?;
            data.course(course)?;
            assignment.remove_student(course, student);
            Ok(())
        })
    }

    /// Places a course in a track.
    pub fn add_course_to_track(&mut self, course: CourseId, track: TrackId) -> Result<()> {
        self.transact(|data, assignment| {
            data.course(course)?;
            data.track(track)?;
            assignment.add_track(course, track);
            Ok(())
        })
    }

    /// Places a course in the track with the given number.
    pub fn add_course_to_track_number(&mut self, course: CourseId, track_number: i32) -> Result<()> {
        let track = *self
            .index()
            .track_by_number
            .get(&track_number)
            .ok_or(BlockungError::UnknownTrackNumber(track_number))?;
        self.add_course_to_track(course, track)
    }

    /// Takes a course out of a track.
    pub fn remove_course_from_track(&mut self, course: CourseId, track: TrackId) -> Result<()> {
        self.transact(|data, assignment| {
            data.course(course)?;
            data.track(track)?;
            assignment.remove_track(course, track);
            Ok(())
        })
    }

    /// Adds a track to the blocking.
    pub fn add_track(&mut self, track: Track) -> Result<()> {
        self.transact(|data, _| {
            if data.tracks.iter().any(|t| t.id == track.id) {
                return Err(BlockungError::Inconsistent(format!(
                    "Schiene {} existiert bereits!",
                    track.id
                )));
            }
            data.tracks.push(track);
            Ok(())
        })
    }

    /// Removes an empty track and renumbers the tracks behind it.
    ///
    /// Rules naming track numbers follow the renumbering.
    ///
    /// # Errors
    /// Fails if the track is unknown or still holds a course.
    pub fn remove_track(&mut self, id: TrackId) -> Result<()> {
        self.transact(|data, assignment| {
            let removed = data.track(id)?.number;
            let occupied = assignment
                .course_tracks
                .values()
                .filter(|set| set.contains(&id))
                .count();
            if occupied > 0 {
                return Err(BlockungError::Inconsistent(format!(
                    "Entfernen unmöglich: {} hat noch {occupied} Kurse!",
                    data.track_name(id)
                )));
            }
            data.tracks.retain(|t| t.id != id);
            for t in &mut data.tracks {
                if t.number > removed {
                    t.number -= 1;
                }
            }
            shift_rules_after_track_removal(&mut data.rules, removed);
            assignment.remove_track_everywhere(id);
            Ok(())
        })
    }

    /// Adds a course and places it in tracks `1..=required_tracks`.
    ///
    /// # Errors
    /// Fails on a duplicate id or when the course needs more tracks than
    /// the blocking has.
    pub fn add_course(&mut self, course: Course) -> Result<()> {
        let by_number = self.index().track_by_number.clone();
        self.transact(|data, assignment| {
            if data.courses.iter().any(|c| c.id == course.id) {
                return Err(BlockungError::Inconsistent(format!(
                    "Kurs {} existiert bereits!",
                    course.id
                )));
            }
            let n = data.tracks.len();
            if (n as i64) < i64::from(course.required_tracks) {
                return Err(BlockungError::Inconsistent(format!(
                    "Es gibt {n} Schienen, da passt ein Kurs mit {} nicht hinein!",
                    course.required_tracks
                )));
            }
            for nr in 1..=course.required_tracks {
                let track = by_number
                    .get(&nr)
                    .ok_or(BlockungError::UnknownTrackNumber(nr))?;
                assignment.add_track(course.id, *track);
            }
            data.courses.push(course);
            Ok(())
        })
    }

    /// Deletes courses with their placements, enrolments and rules.
    pub fn remove_courses(&mut self, ids: &[CourseId]) -> Result<()> {
        self.transact(|data, assignment| {
            for &id in ids {
                data.course(id)?;
            }
            data.courses.retain(|c| !ids.contains(&c.id));
            data.rules
                .retain(|r| !ids.iter().any(|&id| r.kind.references_course(id)));
            for &id in ids {
                assignment.remove_course(id);
            }
            Ok(())
        })
    }

    /// Moves all students of `delete` into `keep` and deletes `delete`.
    pub fn merge_courses(&mut self, keep: CourseId, delete: CourseId) -> Result<()> {
        if keep == delete {
            return Err(BlockungError::InvalidParameter(format!(
                "Kurs {keep} kann nicht mit sich selbst zusammengelegt werden"
            )));
        }
        self.transact(|data, assignment| {
            data.course(keep)?;
            data.course(delete)?;
            let moved: Vec<StudentId> = assignment
                .course_students
                .get(&delete)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            for s in moved {
                assignment.add_student(keep, s);
            }
            assignment.remove_course(delete);
            data.courses.retain(|c| c.id != delete);
            data.rules.retain(|r| !r.kind.references_course(delete));
            Ok(())
        })
    }

    /// Adds `new_course` in the tracks of `old` and moves `students` to it.
    pub fn split_course(&mut self, old: CourseId, new_course: Course, students: &[StudentId]) -> Result<()> {
        self.transact(|data, assignment| {
            data.course(old)?;
            if data.courses.iter().any(|c| c.id == new_course.id) {
                return Err(BlockungError::Inconsistent(format!(
                    "Kurs {} existiert bereits!",
                    new_course.id
                )));
            }
            let tracks: Vec<TrackId> = assignment
                .course_tracks
                .get(&old)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            for t in tracks {
                assignment.add_track(new_course.id, t);
            }
            for &s in students {
                assignment.remove_student(old, s);
                assignment.add_student(new_course.id, s);
            }
            data.courses.push(new_course);
            Ok(())
        })
    }

    /// Changes how many tracks a course occupies, one placement at a time.
    ///
    /// Growing takes the free track with the lowest number, shrinking gives
    /// up the occupied track with the highest number.
    ///
    /// # Errors
    /// Template only. `n` must lie in `1..=tracks`.
    pub fn set_course_track_count(&mut self, course: CourseId, n: i32) -> Result<()> {
        let by_number = self.index().track_by_number.clone();
        let old = self.data().course(course)?.required_tracks;
        self.transact(|data, assignment| {
            require_template(data, "Schienenanzahl eines Kurses ändern")?;
            let tracks = data.tracks.len() as i64;
            if tracks == 0 {
                return Err(BlockungError::Inconsistent(
                    "Die Blockung hat 0 Schienen.".to_string(),
                ));
            }
            if n <= 0 || i64::from(n) > tracks {
                return Err(BlockungError::InvalidParameter(format!(
                    "Es gibt nur {tracks} Schienen, somit kann {} nicht {n} Schienen zugeordnet werden!",
                    data.course_name(course)
                )));
            }
            let mut current = data.course(course)?.required_tracks;
            while n > current {
                let free = by_number
                    .values()
                    .find(|&&t| !assignment.has_track(course, t))
                    .copied();
                let Some(track) = free else {
                    return Err(BlockungError::Inconsistent(format!(
                        "Es wurde keine freie Schiene für {} gefunden!",
                        data.course_name(course)
                    )));
                };
                assignment.add_track(course, track);
                current += 1;
            }
            while n < current {
                let occupied = by_number
                    .values()
                    .rev()
                    .find(|&&t| assignment.has_track(course, t))
                    .copied();
                let Some(track) = occupied else {
                    return Err(BlockungError::Inconsistent(format!(
                        "Es wurde keine belegte Schiene von {} gefunden!",
                        data.course_name(course)
                    )));
                };
                assignment.remove_track(course, track);
                current -= 1;
            }
            data.course_mut(course)?.required_tracks = n;
            Ok(())
        })?;
        info!(event = "track_count_changed", course, old, new = n);
        Ok(())
    }

    /// Adds rules to the template. All or nothing.
    pub fn add_rules(&mut self, kinds: &[RuleKind]) -> Result<Vec<RuleId>> {
        let mut ids = Vec::new();
        self.transact(|data, _| {
            require_template(data, "Regeln hinzufügen")?;
            ids = data.add_rules(kinds)?;
            Ok(())
        })?;
        Ok(ids)
    }

    /// Removes rules from the template. All or nothing.
    pub fn remove_rules(&mut self, ids: &[RuleId]) -> Result<()> {
        self.transact(|data, _| {
            require_template(data, "Regeln entfernen")?;
            data.remove_rules(ids)
        })
    }

    /// Switches the course order and re-sorts every list.
    pub fn set_sort_order(&mut self, order: SortOrder) -> Result<()> {
        let config = self.config().clone().with_sort_order(order);
        self.commit(self.data().clone(), self.assignment().clone(), config)
    }

    /// Re-reads teacher assignments after they changed in the base data.
    pub fn notify_teachers_changed(&mut self) -> Result<()> {
        self.revalidate()
    }

    /// Replaces the teachers of a course.
    pub fn set_course_teachers(&mut self, course: CourseId, teachers: Vec<Teacher>) -> Result<()> {
        self.transact(|data, _| {
            data.course_mut(course)?.teachers = teachers;
            Ok(())
        })
    }

    // ---- update execution ----

    /// Executes a rule update.
    ///
    /// # Errors
    /// Fails unless the blocking is a template, or when a rule to remove is
    /// unknown or a rule to add already exists.
    pub fn apply_rule_update(&mut self, update: &RuleUpdate) -> Result<()> {
        self.transact(|data, _| {
            require_template(data, "Ein RegelUpdate ist nur bei einer Blockungsvorlage erlaubt!")?;
            update.apply(data)?;
            Ok(())
        })?;
        info!(
            event = "rule_update_applied",
            removed = update.remove.len(),
            added = update.add.len()
        );
        Ok(())
    }

    /// Executes an enrolment update. Its rule part is skipped unless the
    /// blocking is a template.
    pub fn apply_student_course_update(&mut self, update: &StudentCourseUpdate) -> Result<()> {
        self.transact(|data, assignment| {
            let template = data.is_template;
            if template {
                let ids: Vec<RuleId> = update.rules.remove.iter().map(|r| r.id).collect();
                data.remove_rules(&ids)?;
            }
            for p in &update.remove {
                assignment.remove_student(p.course, p.student);
            }
            for p in &update.add {
                assignment.add_student(p.course, p.student);
            }
            if template {
                data.add_rules(&update.rules.add)?;
            }
            Ok(())
        })?;
        info!(
            event = "student_update_applied",
            removed = update.remove.len(),
            added = update.add.len(),
            rules_removed = update.rules.remove.len(),
            rules_added = update.rules.add.len()
        );
        Ok(())
    }

    /// Executes a placement update. Its rule part is skipped unless the
    /// blocking is a template.
    pub fn apply_course_track_update(&mut self, update: &CourseTrackUpdate) -> Result<()> {
        self.transact(|data, assignment| {
            let template = data.is_template;
            if template {
                let ids: Vec<RuleId> = update.rules.remove.iter().map(|r| r.id).collect();
                data.remove_rules(&ids)?;
            }
            for p in &update.remove {
                assignment.remove_track(p.course, p.track);
            }
            for p in &update.add {
                assignment.add_track(p.course, p.track);
            }
            if template {
                data.add_rules(&update.rules.add)?;
            }
            Ok(())
        })?;
        info!(
            event = "track_update_applied",
            removed = update.remove.len(),
            added = update.add.len(),
            rules_removed = update.rules.remove.len(),
            rules_added = update.rules.add.len()
        );
        Ok(())
    }

    // ---- update builders ----

    /// Empties every course. Fixed students stay unless `also_fixed`.
    pub fn update_clear_all_courses(&self, also_fixed: bool) -> StudentCourseUpdate {
        let ids: Vec<CourseId> = self.index().course_ids.iter().copied().collect();
        self.clear_courses(&ids, also_fixed)
    }

    /// Empties the given courses. Fixed students stay unless `also_fixed`.
    pub fn update_clear_courses(&self, courses: &[CourseId], also_fixed: bool) -> Result<StudentCourseUpdate> {
        self.check_courses(courses)?;
        Ok(self.clear_courses(courses, also_fixed))
    }

    fn clear_courses(&self, courses: &[CourseId], also_fixed: bool) -> StudentCourseUpdate {
        let mut u = StudentCourseUpdate::default();
        for &course in courses {
            for student in self.course_students(course) {
                if also_fixed || !self.data().is_student_fixed_in_course(student, course) {
                    push_unique(&mut u.remove, StudentCoursePair::new(course, student));
                }
            }
        }
        u
    }

    /// Takes students out of one course. A fixed student is only taken out
    /// with `also_fixed`, and then loses the fix as well.
    pub fn update_remove_students_from_course(
        &self,
        students: &[StudentId],
        course: CourseId,
        also_fixed: bool,
    ) -> Result<StudentCourseUpdate> {
        self.data().course(course)?;
        let mut u = StudentCourseUpdate::default();
        for &student in students {
            if !self.is_student_in_course(student, course) {
                continue;
            }
            let fix = RuleKind::StudentFixedInCourse { student, course };
            match self.data().find_rule(&fix) {
                None => push_unique(&mut u.remove, StudentCoursePair::new(course, student)),
                Some(rule) if also_fixed => {
                    push_unique(&mut u.remove, StudentCoursePair::new(course, student));
                    u.rules.remove_rule(rule);
                }
                Some(_) => {}
            }
        }
        Ok(u)
    }

    /// Enrols students. Pairs without a matching choice are skipped; the
    /// student leaves other courses of the same subject-kind.
    pub fn update_add_pairs(&self, pairs: &[StudentCoursePair]) -> Result<StudentCourseUpdate> {
        let mut u = StudentCourseUpdate::default();
        for p in pairs {
            let Some(course) = self.chosen_course(p)? else {
                continue;
            };
            let sk = course.subject_kind();
            if !self.is_student_in_course(p.student, p.course) {
                push_unique(&mut u.add, *p);
            }
            for other in self.data().courses_of_subject_kind(sk) {
                if other.id != p.course && self.is_student_in_course(p.student, other.id) {
                    push_unique(&mut u.remove, StudentCoursePair::new(other.id, p.student));
                }
            }
        }
        Ok(u)
    }

    /// Moves students into target courses, out of their current course of
    /// the same subject.
    ///
    /// # Arguments
    /// * `pairs` - Target enrolments.
    /// * `move_fixed` - Also move students fixed in their current course;
    ///   the old fix is dropped.
    /// * `fix_in_target` - Fix the students in their target course.
    pub fn update_move_students(
        &self,
        pairs: &[StudentCoursePair],
        move_fixed: bool,
        fix_in_target: bool,
    ) -> Result<StudentCourseUpdate> {
        let mut u = StudentCourseUpdate::default();
        for p in pairs {
            let Some(course) = self.chosen_course(p)? else {
                continue;
            };
            let current = self
                .index()
                .student_subject_course
                .get(&(p.student, course.subject_id))
                .copied()
                .flatten();
            if let Some(old) = current {
                let old_fix = self.data().find_rule(&RuleKind::StudentFixedInCourse {
                    student: p.student,
                    course: old,
                });
                if old_fix.is_some() && !move_fixed {
                    continue;
                }
                push_unique(&mut u.remove, StudentCoursePair::new(old, p.student));
                if let Some(rule) = old_fix {
                    u.rules.remove_rule(rule);
                }
            }
            push_unique(&mut u.add, *p);
            if fix_in_target {
                let fix = RuleKind::StudentFixedInCourse {
                    student: p.student,
                    course: p.course,
                };
                let removed_here = u.rules.remove.iter().any(|r| r.kind == fix);
                if removed_here || !self.data().has_rule(&fix) {
                    u.rules.add_rule(fix);
                }
            }
        }
        Ok(u)
    }

    /// Drops enrolments that exist, valid or quarantined.
    pub fn update_remove_pairs(&self, pairs: &[StudentCoursePair]) -> StudentCourseUpdate {
        let mut u = StudentCourseUpdate::default();
        for p in pairs {
            if self.assignment().has_student(p.course, p.student) {
                push_unique(&mut u.remove, *p);
            }
        }
        u
    }

    /// Adds placements that do not exist yet.
    pub fn update_add_course_track_pairs(&self, pairs: &[CourseTrackPair]) -> CourseTrackUpdate {
        CourseTrackUpdate {
            add: self.placements_where(pairs, false),
            ..CourseTrackUpdate::default()
        }
    }

    /// Drops placements that exist.
    pub fn update_remove_course_track_pairs(&self, pairs: &[CourseTrackPair]) -> CourseTrackUpdate {
        CourseTrackUpdate {
            remove: self.placements_where(pairs, true),
            ..CourseTrackUpdate::default()
        }
    }

    /// The distinct pairs whose placement exists (`placed`) or not.
    fn placements_where(&self, pairs: &[CourseTrackPair], placed: bool) -> Vec<CourseTrackPair> {
        let mut out = Vec::new();
        for p in pairs {
            if self.assignment().has_track(p.course, p.track) == placed {
                push_unique(&mut out, *p);
            }
        }
        out
    }

    /// The pair's course, if the student chose its subject-kind.
    fn chosen_course(&self, p: &StudentCoursePair) -> Result<Option<&Course>> {
        let course = self.data().course(p.course)?;
        Ok(self
            .data()
            .has_subject_kind(p.student, course.subject_kind())
            .then_some(course))
    }

    /// Moves a course from one track to another. Empty if the course is not
    /// in `from` or already in `to`.
    pub fn update_move_course(&self, course: CourseId, from: TrackId, to: TrackId) -> CourseTrackUpdate {
        let mut u = CourseTrackUpdate::default();
        if !self.assignment().has_track(course, from) || self.assignment().has_track(course, to) {
            return u;
        }
        u.remove.push(CourseTrackPair::new(course, from));
        u.add.push(CourseTrackPair::new(course, to));
        debug!(event = "course_move_built", course, from, to);
        u
    }

    /// Courses of the current result as an id set.
    pub(crate) fn course_id_set(&self) -> BTreeSet<CourseId> {
        self.index().course_ids.clone()
    }
}
