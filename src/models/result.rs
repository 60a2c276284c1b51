//! Blocking result model.
//!
//! A [`BlockingResult`] is the exported view of one assignment: which courses
//! lie in which track, which students sit in which course, and the score
//! snapshot. It is written only by revalidation. The raw, editable input is
//! the [`Assignment`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{CourseId, CourseKind, ResultId, RuleId, StudentId, SubjectId, TrackId};

/// Score snapshot ("Bewertung") of a result.
///
/// Lower is better for every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Criterion 1a: ids of violated rules, one entry per violation.
    pub rule_violations: Vec<RuleId>,
    /// Criterion 1b: sum over courses of |required tracks − actual tracks|.
    pub unplaced_course_tracks: u32,
    /// Criterion 2a: choices without a course, ignored students excluded.
    pub unassigned_choices: u32,
    /// Criterion 2b: sum of per-student collisions.
    pub student_collisions: u32,
    /// Criterion 3: largest course size spread of any subject-kind.
    pub spread_max: u32,
    /// Criterion 3: number of subject-kinds per spread value.
    pub spread_histogram: Vec<u32>,
    /// Criterion 4: surplus courses of one subject-kind in one track.
    pub duplicate_kinds_per_track: u32,
}

/// Track entry of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTrack {
    /// Track id.
    pub id: TrackId,
    /// Track number.
    pub number: i32,
    /// Courses in this track, in the engine's sort order.
    pub courses: Vec<CourseId>,
}

/// Course entry of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCourse {
    /// Course id.
    pub id: CourseId,
    /// Subject.
    pub subject_id: SubjectId,
    /// Course kind.
    pub kind: CourseKind,
    /// Required track count.
    pub required_tracks: i32,
    /// Valid enrolments, ascending.
    pub students: Vec<StudentId>,
    /// Placements, ascending.
    pub tracks: Vec<TrackId>,
}

/// One result of a blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingResult {
    /// Result id.
    pub id: ResultId,
    /// Id of the owning blocking.
    pub blocking_id: i64,
    /// Display name.
    pub name: String,
    /// Whether this is the active result of the blocking.
    pub is_active: bool,
    /// Tracks, ordered by number.
    pub tracks: Vec<ResultTrack>,
    /// Courses, ordered by id.
    pub courses: Vec<ResultCourse>,
    /// Score snapshot.
    pub score: Score,
}

impl BlockingResult {
    /// Creates an empty result header.
    pub fn new(id: ResultId, blocking_id: i64) -> Self {
        Self {
            id,
            blocking_id,
            ..Default::default()
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the result as active.
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Course entry by id.
    pub fn course(&self, id: CourseId) -> Option<&ResultCourse> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// Track entry by id.
    pub fn track(&self, id: TrackId) -> Option<&ResultTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

/// Raw student and track placements of a result.
///
/// May hold pairs that revalidation quarantines (a student without a
/// matching choice) or ignores (a course or track that no longer exists).
/// Such pairs stay here and are re-classified on every revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Course → enrolled students.
    pub course_students: BTreeMap<CourseId, BTreeSet<StudentId>>,
    /// Course → tracks the course lies in.
    pub course_tracks: BTreeMap<CourseId, BTreeSet<TrackId>>,
}

impl Assignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the placements of an exported result.
    pub fn from_result(result: &BlockingResult) -> Self {
        let mut assignment = Self::new();
        for course in &result.courses {
            for &s in &course.students {
                assignment.add_student(course.id, s);
            }
            for &t in &course.tracks {
                assignment.add_track(course.id, t);
            }
        }
        for track in &result.tracks {
            for &c in &track.courses {
                assignment.add_track(c, track.id);
            }
        }
        assignment
    }

    /// Enrols a student (builder form).
    pub fn with_student(mut self, course: CourseId, student: StudentId) -> Self {
        self.add_student(course, student);
        self
    }

    /// Places a course in a track (builder form).
    pub fn with_track(mut self, course: CourseId, track: TrackId) -> Self {
        self.add_track(course, track);
        self
    }

    /// Enrols a student. Returns `false` if already enrolled.
    pub fn add_student(&mut self, course: CourseId, student: StudentId) -> bool {
        self.course_students.entry(course).or_default().insert(student)
    }

    /// Removes an enrolment. Returns `false` if it did not exist.
    pub fn remove_student(&mut self, course: CourseId, student: StudentId) -> bool {
        self.course_students
            .get_mut(&course)
            .is_some_and(|set| set.remove(&student))
    }

    /// Places a course in a track. Returns `false` if already placed.
    pub fn add_track(&mut self, course: CourseId, track: TrackId) -> bool {
        self.course_tracks.entry(course).or_default().insert(track)
    }

    /// Removes a placement. Returns `false` if it did not exist.
    pub fn remove_track(&mut self, course: CourseId, track: TrackId) -> bool {
        self.course_tracks
            .get_mut(&course)
            .is_some_and(|set| set.remove(&track))
    }

    /// Whether the student is enrolled (valid or not).
    pub fn has_student(&self, course: CourseId, student: StudentId) -> bool {
        self.course_students
            .get(&course)
            .is_some_and(|set| set.contains(&student))
    }

    /// Whether the course is placed in the track.
    pub fn has_track(&self, course: CourseId, track: TrackId) -> bool {
        self.course_tracks
            .get(&course)
            .is_some_and(|set| set.contains(&track))
    }

    /// Drops all placements and enrolments of a course.
    pub fn remove_course(&mut self, course: CourseId) {
        self.course_students.remove(&course);
        self.course_tracks.remove(&course);
    }

    /// Drops all placements in a track.
    pub fn remove_track_everywhere(&mut self, track: TrackId) {
        for set in self.course_tracks.values_mut() {
            set.remove(&track);
        }
    }
}
