//! Result engine.
//!
//! A [`ResultEngine`] owns one blocking result for an editing session: the
//! base data, the raw [`Assignment`] and everything derived from it. Every
//! derived structure is rebuilt in one pass by [`ResultEngine::revalidate`].
//!
//! # Atomicity
//!
//! Mutations work on a copy of the base data and the assignment. The copy is
//! revalidated and only swapped in when that succeeds, so a failing call
//! leaves the engine exactly as it was.
//!
//! # Example
//! ```
//! use u_blockung::config::EngineConfig;
//! use u_blockung::engine::ResultEngine;
//! use u_blockung::models::{Assignment, BlockingData, BlockingResult, Course, CourseKind, Subject};
//!
//! let data = BlockingData::new(1, "Q1")
//!     .with_numbered_tracks(100, 2)
//!     .with_subject(Subject::new(1, "M"))
//!     .with_course(Course::new(10, 1, CourseKind::Gk, 1));
//! let assignment = Assignment::new().with_track(10, 100);
//! let engine = ResultEngine::new(data, BlockingResult::new(7, 1), assignment, EngineConfig::default()).unwrap();
//! assert_eq!(engine.result().tracks[0].courses, vec![10]);
//! ```

pub mod mutation;
pub mod query;
pub mod rule_diff;
pub mod tooltip;

pub use mutation::{
    CourseTrackPair, CourseTrackUpdate, RuleUpdate, StudentCoursePair, StudentCourseUpdate,
};
pub use query::{ConflictFilter, StudentFilter};
pub use rule_diff::{FixCategory, RuleCandidate};
pub use tooltip::{TrackCollisionGroup, Tooltips};

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::{EngineConfig, SortOrder};
use crate::error::Result;
use crate::index::{sort_courses, Index};
use crate::models::{
    Assignment, BlockingData, BlockingResult, CourseId, ResultCourse, ResultTrack, RuleId,
    RuleType, Score, TrackId,
};
use crate::scoring::SpreadBreakdown;
use crate::validation::StructuralDiagnostic;
use crate::validator::{self, format, ViolationReport};

/// Everything one revalidation derives.
#[derive(Debug, Clone, Default)]
struct Derived {
    result: BlockingResult,
    index: Index,
    report: ViolationReport,
    breakdown: SpreadBreakdown,
    texts_by_rule: BTreeMap<RuleId, String>,
    texts_by_type: BTreeMap<RuleType, Vec<String>>,
    tooltips: Tooltips,
    diagnostics: Vec<StructuralDiagnostic>,
}

impl Derived {
    fn build(
        data: &BlockingData,
        assignment: &Assignment,
        header: &BlockingResult,
        order: SortOrder,
    ) -> Result<Self> {
        let (index, diagnostics) = Index::build(data, assignment, order);
        let report = validator::validate(data, &index)?;
        let score = Score::calculate(data, &index, &report);
        let breakdown = SpreadBreakdown::calculate(&index);
        let texts_by_rule = format::texts_by_rule(data, &report);
        let texts_by_type = format::texts_by_type(data, &report);
        let tooltips = Tooltips::build(data, &index, &score, &breakdown, &texts_by_type);
        let result = build_result(data, &index, header, score);
        Ok(Self {
            result,
            index,
            report,
            breakdown,
            texts_by_rule,
            texts_by_type,
            tooltips,
            diagnostics,
        })
    }
}

/// Builds the exported result: tracks by number with sorted courses, courses
/// by id with their valid students and tracks.
fn build_result(
    data: &BlockingData,
    index: &Index,
    header: &BlockingResult,
    score: Score,
) -> BlockingResult {
    let mut track_ids: Vec<TrackId> = index.track_ids.iter().copied().collect();
    track_ids.sort_by_key(|t| (index.track_number.get(t).copied().unwrap_or(0), *t));
    let tracks = track_ids
        .into_iter()
        .map(|id| {
            let mut courses: Vec<CourseId> = index
                .track_courses
                .get(&id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            sort_courses(data, &mut courses, index.sort_order);
            ResultTrack {
                id,
                number: index.track_number.get(&id).copied().unwrap_or(0),
                courses,
            }
        })
        .collect();

    let courses = index
        .course_ids
        .iter()
        .filter_map(|&id| data.course(id).ok())
        .map(|c| ResultCourse {
            id: c.id,
            subject_id: c.subject_id,
            kind: c.kind,
            required_tracks: c.required_tracks,
            students: index
                .course_students
                .get(&c.id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
            tracks: index
                .course_tracks
                .get(&c.id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
        })
        .collect();

    BlockingResult {
        tracks,
        courses,
        score,
        ..header.clone()
    }
}

/// Revalidating owner of one blocking result.
#[derive(Debug, Clone)]
pub struct ResultEngine {
    data: BlockingData,
    config: EngineConfig,
    assignment: Assignment,
    derived: Derived,
}

impl ResultEngine {
    /// Creates an engine and runs the first revalidation.
    ///
    /// # Arguments
    /// * `data` - Base data of the blocking.
    /// * `header` - Result id, blocking id, name and active flag. Its track
    ///   and course lists are replaced by the revalidation.
    /// * `assignment` - Raw course placements and enrolments.
    /// * `config` - Engine settings.
    ///
    /// # Errors
    /// Fails when a rule refers to an unknown entity or carries an invalid
    /// parameter.
    pub fn new(
        data: BlockingData,
        header: BlockingResult,
        assignment: Assignment,
        config: EngineConfig,
    ) -> Result<Self> {
        let derived = Derived::build(&data, &assignment, &header, config.sort_order)?;
        let mut engine = Self {
            data,
            config,
            assignment,
            derived: Derived::default(),
        };
        engine.install(derived);
        Ok(engine)
    }

    /// Creates an engine from a stored result, reading its assignment.
    pub fn from_result(data: BlockingData, result: BlockingResult, config: EngineConfig) -> Result<Self> {
        let assignment = Assignment::from_result(&result);
        Self::new(data, result, assignment, config)
    }

    /// Rebuilds every derived structure. Idempotent.
    ///
    /// On error the previous state is kept.
    pub fn revalidate(&mut self) -> Result<()> {
        let derived = Derived::build(
            &self.data,
            &self.assignment,
            &self.derived.result,
            self.config.sort_order,
        )?;
        self.install(derived);
        Ok(())
    }

    fn install(&mut self, derived: Derived) {
        for d in &derived.diagnostics {
            warn!(event = "structural_diagnostic", kind = ?d.kind, message = %d.message);
        }
        let score = &derived.result.score;
        debug!(
            event = "revalidated",
            result = derived.result.id,
            courses = derived.index.course_ids.len(),
            students = derived.index.student_ids.len(),
            violations = score.rule_violations.len(),
            unassigned = score.unassigned_choices,
            collisions = score.student_collisions,
            quarantined = derived.index.quarantined.values().map(|s| s.len()).sum::<usize>(),
        );
        self.data
            .update_result_score(derived.result.id, derived.result.score.clone());
        self.derived = derived;
    }

    /// Revalidates the given candidate state and swaps it in on success.
    fn commit(&mut self, data: BlockingData, assignment: Assignment, config: EngineConfig) -> Result<()> {
        let derived = Derived::build(&data, &assignment, &self.derived.result, config.sort_order)?;
        self.data = data;
        self.assignment = assignment;
        self.config = config;
        self.install(derived);
        Ok(())
    }

    /// Runs `f` on copies of the base data and the assignment, then commits.
    fn transact<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BlockingData, &mut Assignment) -> Result<()>,
    {
        let mut data = self.data.clone();
        let mut assignment = self.assignment.clone();
        f(&mut data, &mut assignment)?;
        self.commit(data, assignment, self.config.clone())
    }

    // ---- accessors ----

    /// Base data, including the score summaries of this result.
    pub fn data(&self) -> &BlockingData {
        &self.data
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw assignment, including quarantined enrolments.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The result as of the last revalidation.
    pub fn result(&self) -> &BlockingResult {
        &self.derived.result
    }

    /// Derived index of the last revalidation.
    pub fn index(&self) -> &Index {
        &self.derived.index
    }

    /// Rule violations of the last revalidation.
    pub fn report(&self) -> &ViolationReport {
        &self.derived.report
    }

    /// Hands back the base data and the result.
    pub fn into_parts(self) -> (BlockingData, BlockingResult) {
        (self.data, self.derived.result)
    }
}
