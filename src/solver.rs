//! Proposal solver seam.
//!
//! The engine does not place single students itself. For a re-placement
//! proposal it collects the student's candidate courses into a
//! [`ProposalInput`], hands it to a [`ProposalSolver`] and turns the
//! returned [`ProposalOutput`] into an enrolment update.
//!
//! # Contract
//!
//! - A course is never both `locked` and `fixed`; the engine fails before
//!   calling the solver otherwise.
//! - The solver returns at most one course per chosen subject. A subject
//!   missing from the output keeps its current course.
//! - `None` means the student gets no course in that subject.

use std::fmt::Debug;

use crate::models::{CourseId, CourseKind, SubjectChoice, SubjectId};

/// A candidate course of the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCourse {
    pub id: CourseId,
    pub subject_id: SubjectId,
    pub kind: CourseKind,
    /// The student must not be placed here.
    pub locked: bool,
    /// The student must be placed here.
    pub fixed: bool,
    /// Current valid students.
    pub headcount: u32,
    /// Occupied track numbers, ascending.
    pub track_numbers: Vec<i32>,
}

/// Everything a solver sees of one student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalInput {
    /// Number of tracks.
    pub tracks: i32,
    /// The student's choices in subject order.
    pub choices: Vec<SubjectChoice>,
    /// Display label per choice, e.g. "M-GK".
    pub choice_labels: Vec<String>,
    /// Candidate courses of every chosen subject-kind.
    pub courses: Vec<ProposalCourse>,
}

/// The solver's answer: one course or none per subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalOutput {
    pub assignments: Vec<(SubjectId, Option<CourseId>)>,
}

/// Places one student into courses.
pub trait ProposalSolver: Debug {
    /// Computes a placement for the student described by `input`.
    fn solve(&self, input: &ProposalInput) -> ProposalOutput;
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::cell::Cell;

    /// Picks the fixed course of each subject, else the smallest unlocked
    /// one. Counts its calls.
    #[derive(Debug, Default)]
    pub(crate) struct SmallestCourseSolver {
        pub(crate) calls: Cell<u32>,
    }

    impl ProposalSolver for SmallestCourseSolver {
        fn solve(&self, input: &ProposalInput) -> ProposalOutput {
            self.calls.set(self.calls.get() + 1);
            let mut out = ProposalOutput::default();
            for choice in &input.choices {
                let candidates: Vec<&ProposalCourse> = input
                    .courses
                    .iter()
                    .filter(|c| c.subject_id == choice.subject_id && c.kind == choice.kind)
                    .collect();
                let pick = candidates
                    .iter()
                    .find(|c| c.fixed)
                    .or_else(|| {
                        candidates
                            .iter()
                            .filter(|c| !c.locked)
                            .min_by_key(|c| (c.headcount, c.id))
                    })
                    .map(|c| c.id);
                out.assignments.push((choice.subject_id, pick));
            }
            out
        }
    }

    #[test]
    fn test_stub_prefers_fixed_then_smallest() {
        let course = |id, headcount, locked, fixed| ProposalCourse {
            id,
            subject_id: 1,
            kind: CourseKind::Gk,
            locked,
            fixed,
            headcount,
            track_numbers: vec![1],
        };
        let mut input = ProposalInput {
            tracks: 2,
            choices: vec![SubjectChoice::new(1, 1, CourseKind::Gk)],
            choice_labels: vec!["M-GK".to_string()],
            courses: vec![course(10, 5, false, false), course(11, 1, true, false), course(12, 3, false, false)],
        };
        let solver = SmallestCourseSolver::default();
        assert_eq!(solver.solve(&input).assignments, vec![(1, Some(12))]);
        input.courses[0].fixed = true;
        assert_eq!(solver.solve(&input).assignments, vec![(1, Some(10))]);
        assert_eq!(solver.calls.get(), 2);
    }
}
