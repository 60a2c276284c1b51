//! Course-blocking result engine.
//!
//! Holds one result of an upper-school course blocking ("Blockung"): which
//! course sits in which tracks and which student sits in which course. After
//! every change the whole result is revalidated: derived indices are rebuilt,
//! rules are checked and the four quality criteria are scored.
//!
//! # Modules
//!
//! - **`models`**: Plain data: tracks, courses, students, choices, rules, results
//! - **`validation`**: Structural diagnostics of the base data (never fatal)
//! - **`index`**: Derived relations of one revalidation
//! - **`validator`**: Rule checks and violation texts
//! - **`scoring`**: The four quality criteria and their badges
//! - **`engine`**: [`engine::ResultEngine`] with mutations, rule diffs and queries
//! - **`solver`**: Seam for single-student placement proposals
//! - **`config`**: Engine settings, from code or TOML
//! - **`error`**: Fatal error type
//!
//! # Architecture
//!
//! The engine is single-threaded and synchronous. It performs no I/O and
//! never installs a `tracing` subscriber; events are emitted for the host
//! to collect.
//!
//! # Example
//!
//! ```
//! use u_blockung::config::EngineConfig;
//! use u_blockung::engine::ResultEngine;
//! use u_blockung::models::{
//!     Assignment, BlockingData, BlockingResult, Course, CourseKind, Gender, Student, Subject,
//!     SubjectChoice,
//! };
//!
//! let data = BlockingData::new(1, "Q1")
//!     .with_numbered_tracks(100, 2)
//!     .with_subject(Subject::new(1, "M"))
//!     .with_course(Course::new(10, 1, CourseKind::Gk, 1))
//!     .with_student(Student::new(1, "Anna", "Berg", Gender::W))
//!     .with_choice(SubjectChoice::new(1, 1, CourseKind::Gk));
//! let assignment = Assignment::new().with_track(10, 100);
//! let mut engine =
//!     ResultEngine::new(data, BlockingResult::new(7, 1), assignment, EngineConfig::default()).unwrap();
//! assert_eq!(engine.score().criterion2_value(), 1);
//!
//! engine.add_student_to_course(1, 10).unwrap();
//! assert_eq!(engine.score().criterion2_value(), 0);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod models;
pub mod scoring;
pub mod solver;
pub mod validation;
pub mod validator;
