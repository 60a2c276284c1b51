//! Result quality criteria.
//!
//! Computes the [`Score`] of a result from a built [`Index`] and the
//! [`ViolationReport`] of the same revalidation. All criteria are lower is
//! better.
//!
//! # Criteria
//!
//! | Criterion | Value | Definition |
//! |-----------|-------|-----------|
//! | 1 | violations + unplaced | Rule violations plus Σ \|required − actual\| tracks per course |
//! | 2 | unassigned + collisions | Choices without course (ignored students excluded) plus student collisions |
//! | 3 | spread max | Largest headcount spread (with dummies) of any subject-kind |
//! | 4 | duplicate kinds | Σ (n − 1) over (track, subject-kind) with n ≥ 2 courses |
//!
//! Each value maps to a badge in `[0, 1)` through `1 − 1/(0.25·v + 1)`.
//! Criterion 3 first lowers positive values by one, so a spread of 1 is
//! rated like a spread of 0.

use std::collections::BTreeSet;

use crate::index::Index;
use crate::models::{BlockingData, CourseKind, RuleKind, RuleType, Score, StudentId};
use crate::validator::ViolationReport;

/// Number of histogram buckets exposed to callers.
pub const EXTERNAL_HISTOGRAM_LEN: usize = 10;

impl Score {
    /// Computes all criteria.
    ///
    /// # Arguments
    /// * `data` - Base data (students, rules, course requirements).
    /// * `index` - Index of the same revalidation.
    /// * `report` - Rule violations of the same revalidation.
    pub fn calculate(data: &BlockingData, index: &Index, report: &ViolationReport) -> Self {
        // Criterion 1
        let rule_violations = report.rule_ids();
        let mut unplaced_course_tracks = 0u32;
        for (&course, tracks) in &index.course_tracks {
            if let Ok(c) = data.course(course) {
                let diff = i64::from(c.required_tracks) - tracks.len() as i64;
                unplaced_course_tracks += diff.unsigned_abs() as u32;
            }
        }

        // Criterion 2
        let unassigned_total = index
            .student_subject_course
            .values()
            .filter(|c| c.is_none())
            .count() as u32;
        let ignored: BTreeSet<StudentId> = data
            .rules_of_type(RuleType::IgnoreStudent)
            .filter_map(|r| match r.kind {
                RuleKind::IgnoreStudent { student } => Some(student),
                _ => None,
            })
            .collect();
        let unassigned_ignored = index
            .student_subject_course
            .iter()
            .filter(|&(&(student, _), course)| course.is_none() && ignored.contains(&student))
            .count() as u32;
        let student_collisions = index.student_collisions.values().sum();

        // Criterion 3
        let mut spread_histogram = vec![0u32; data.students.len() + 1];
        let mut spread_max = 0;
        for &spread in index.subject_kind_spread.values() {
            let bucket = spread as usize;
            if bucket >= spread_histogram.len() {
                spread_histogram.resize(bucket + 1, 0);
            }
            spread_histogram[bucket] += 1;
            spread_max = spread_max.max(spread);
        }

        // Criterion 4
        let duplicate_kinds_per_track = index
            .track_kind_courses
            .values()
            .filter(|list| list.len() >= 2)
            .map(|list| list.len() as u32 - 1)
            .sum();

        Score {
            rule_violations,
            unplaced_course_tracks,
            unassigned_choices: unassigned_total - unassigned_ignored,
            student_collisions,
            spread_max,
            spread_histogram,
            duplicate_kinds_per_track,
        }
    }

    /// Criterion 1: rule violations plus unplaced course tracks.
    pub fn criterion1_value(&self) -> u32 {
        self.rule_violations.len() as u32 + self.unplaced_course_tracks
    }

    /// Criterion 2: unassigned choices plus student collisions.
    pub fn criterion2_value(&self) -> u32 {
        self.unassigned_choices + self.student_collisions
    }

    /// Criterion 3: largest course size spread.
    pub fn criterion3_value(&self) -> u32 {
        self.spread_max
    }

    /// Criterion 4: surplus parallel courses of one subject-kind.
    pub fn criterion4_value(&self) -> u32 {
        self.duplicate_kinds_per_track
    }

    /// Badge of criterion 1.
    pub fn criterion1_badge(&self) -> f64 {
        badge(self.criterion1_value())
    }

    /// Badge of criterion 2.
    pub fn criterion2_badge(&self) -> f64 {
        badge(self.criterion2_value())
    }

    /// Badge of criterion 3.
    pub fn criterion3_badge(&self) -> f64 {
        spread_badge(self.criterion3_value())
    }

    /// Badge of criterion 4.
    pub fn criterion4_badge(&self) -> f64 {
        badge(self.criterion4_value())
    }

    /// The first ten histogram buckets, zero-padded.
    pub fn external_histogram(&self) -> [u32; EXTERNAL_HISTOGRAM_LEN] {
        let mut out = [0; EXTERNAL_HISTOGRAM_LEN];
        for (slot, &v) in out.iter_mut().zip(&self.spread_histogram) {
            *slot = v;
        }
        out
    }
}

/// Maps a criterion value to `[0, 1)`. 0 is perfect.
pub fn badge(value: u32) -> f64 {
    1.0 - 1.0 / (0.25 * f64::from(value) + 1.0)
}

/// Badge for a spread value: positive values are lowered by one first.
pub fn spread_badge(value: u32) -> f64 {
    badge(value.saturating_sub(1))
}

/// Largest spread per kind group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpreadBreakdown {
    /// Advanced courses.
    pub lk: u32,
    /// Basic courses.
    pub gk: u32,
    /// All other kinds.
    pub rest: u32,
}

impl SpreadBreakdown {
    /// Splits the subject-kind spreads of an index by kind group.
    pub fn calculate(index: &Index) -> Self {
        let mut out = Self::default();
        for (sk, &spread) in &index.subject_kind_spread {
            let slot = match sk.kind {
                CourseKind::Lk => &mut out.lk,
                CourseKind::Gk => &mut out.gk,
                _ => &mut out.rest,
            };
            *slot = (*slot).max(spread);
        }
        out
    }
}
