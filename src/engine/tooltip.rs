//! Diagnostic tooltip texts.
//!
//! Pure projections of a finished revalidation. The engine stores the four
//! criterion tooltips next to the score; the per-track collision tooltip is
//! rendered on request from the same index.
//!
//! # Tooltips
//!
//! | Tooltip | Header | Lines |
//! |---------|--------|-------|
//! | T1 | `N Regelverletzungen` | Violation texts in display order |
//! | T2 | `Wahlkonflikte = N` | Unassigned choices, then collisions |
//! | T3 | `Maximale Kursdifferenz (LK, GK, REST): a, b, c` | Spread histogram |
//! | T4 | `Schiene n:` per track | Parallel courses of one subject-kind |
//!
//! T1 and T2 print at most ten lines and summarize the rest as
//! `+k weitere Konflikte.`.

use std::collections::{BTreeMap, BTreeSet};

use crate::index::{sort_courses, Index};
use crate::models::{BlockingData, CourseId, RuleType, Score, SubjectKind, TrackId};
use crate::scoring::SpreadBreakdown;

/// Lines printed verbatim before the remainder is summarized.
pub const MAX_TOOLTIP_LINES: usize = 10;

/// The four criterion tooltips of one revalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tooltips {
    /// T1: rule violations. Empty when no rule is violated.
    pub rule_violations: String,
    /// T2: unassigned choices and collisions.
    pub choice_conflicts: String,
    /// T3: course size spreads.
    pub spreads: String,
    /// T4: parallel courses of one subject-kind per track.
    pub parallel_kinds: String,
}

impl Tooltips {
    /// Renders all four tooltips.
    pub fn build(
        data: &BlockingData,
        index: &Index,
        score: &Score,
        breakdown: &SpreadBreakdown,
        texts_by_type: &BTreeMap<RuleType, Vec<String>>,
    ) -> Self {
        Self {
            rule_violations: rule_violations(texts_by_type),
            choice_conflicts: choice_conflicts(data, index),
            spreads: spreads(score, breakdown),
            parallel_kinds: parallel_kinds(data, index),
        }
    }
}

fn summary(ignored: usize) -> String {
    if ignored == 0 {
        String::new()
    } else {
        format!("+{ignored} weitere Konflikte.")
    }
}

fn rule_violations(texts_by_type: &BTreeMap<RuleType, Vec<String>>) -> String {
    let mut lines = String::new();
    let mut total = 0usize;
    let mut ignored = 0usize;
    for rule_type in RuleType::DISPLAY_ORDER {
        for text in texts_by_type.get(&rule_type).into_iter().flatten() {
            if total < MAX_TOOLTIP_LINES {
                lines.push_str(text);
                lines.push('\n');
            } else {
                ignored += 1;
            }
            total += 1;
        }
    }
    if total == 0 {
        return String::new();
    }
    format!("{total} Regelverletzungen\n{lines}{}", summary(ignored))
}

fn choice_conflicts(data: &BlockingData, index: &Index) -> String {
    let mut lines = String::new();
    let mut conflicts = 0usize;
    let mut ignored = 0usize;

    for (&(student, subject), course) in &index.student_subject_course {
        if course.is_some() {
            continue;
        }
        if conflicts < MAX_TOOLTIP_LINES {
            let subject_kind = match data.choice(student, subject) {
                Some(choice) => data.subject_kind_name(choice.subject_kind()),
                None => data.subject_name(subject),
            };
            lines.push_str(&format!(
                "{} ist im Fach {subject_kind} keinem Kurs zugeordnet.\n",
                data.student_name(student)
            ));
        } else {
            ignored += 1;
        }
        conflicts += 1;
    }

    for (&(student, track), courses) in &index.student_track_courses {
        if courses.len() <= 1 {
            continue;
        }
        if conflicts < MAX_TOOLTIP_LINES {
            let mut sorted: Vec<CourseId> = courses.iter().copied().collect();
            sort_courses(data, &mut sorted, index.sort_order);
            let names: Vec<String> = sorted.iter().map(|&c| data.course_name(c)).collect();
            lines.push_str(&format!(
                "{} ist in {} in mehreren Kursen:{}\n",
                data.student_name(student),
                data.track_name(track),
                names.join(", ")
            ));
        } else {
            ignored += 1;
        }
        conflicts += courses.len() - 1;
    }

    format!("Wahlkonflikte = {conflicts}\n{lines}{}", summary(ignored))
}

fn spreads(score: &Score, breakdown: &SpreadBreakdown) -> String {
    let histogram = &score.spread_histogram;
    let mut out = format!(
        "Maximale Kursdifferenz (LK, GK, REST): {}, {}, {}\n",
        breakdown.lk, breakdown.gk, breakdown.rest
    );
    if histogram.len() >= 2 {
        out.push_str(&format!("Optimal 0/1: {}x\n", histogram[0] + histogram[1]));
    }
    for (i, &n) in histogram.iter().enumerate().skip(2) {
        if n > 0 {
            out.push_str(&format!("Differenz {i}: {n}x\n"));
        }
    }
    out
}

fn parallel_kinds(data: &BlockingData, index: &Index) -> String {
    let mut out = String::new();
    for (&number, &track) in &index.track_by_number {
        let mut per_track = String::new();
        for &sk in &index.subject_kinds_sorted {
            per_track.push_str(&parallel_line(data, index, track, sk));
        }
        if !per_track.is_empty() {
            out.push_str(&format!("Schiene {number}:\n{per_track}"));
        }
    }
    out
}

fn parallel_line(data: &BlockingData, index: &Index, track: TrackId, sk: SubjectKind) -> String {
    let Some(courses) = index.track_kind_courses.get(&(track, sk)) else {
        return String::new();
    };
    if courses.len() < 2 {
        return String::new();
    }
    let mut line = format!("  {} (+{}):", data.subject_kind_name(sk), courses.len() - 1);
    for (i, &c) in courses.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push(' ');
        line.push_str(&data.course_name(c));
    }
    line.push('\n');
    line
}

/// One course of a track and the courses it shares students with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCollisionGroup {
    /// The course.
    pub course: CourseId,
    /// Σ shared students over all partners.
    pub total: u32,
    /// Partner courses with their shared student count, in track order.
    pub partners: Vec<(CourseId, u32)>,
}

fn shared_students(index: &Index, c1: CourseId, c2: CourseId) -> u32 {
    let empty = BTreeSet::new();
    let s1 = index.course_students.get(&c1).unwrap_or(&empty);
    let s2 = index.course_students.get(&c2).unwrap_or(&empty);
    s1.intersection(s2).count() as u32
}

/// Shared-student groups of the courses of one track.
///
/// `courses` is the sorted course list of the track; courses without any
/// shared student are left out.
pub fn track_collision_groups(index: &Index, courses: &[CourseId]) -> Vec<TrackCollisionGroup> {
    let mut groups = Vec::new();
    for &c1 in courses {
        let partners: Vec<(CourseId, u32)> = courses
            .iter()
            .filter(|&&c2| c2 != c1)
            .map(|&c2| (c2, shared_students(index, c1, c2)))
            .filter(|&(_, n)| n > 0)
            .collect();
        let total = partners.iter().map(|&(_, n)| n).sum();
        if total > 0 {
            groups.push(TrackCollisionGroup {
                course: c1,
                total,
                partners,
            });
        }
    }
    groups
}

/// Text form of [`track_collision_groups`].
pub fn track_collision_text(data: &BlockingData, index: &Index, courses: &[CourseId]) -> String {
    let groups = track_collision_groups(index, courses);
    if groups.is_empty() {
        return "Keine Kollisionen in der Schiene".to_string();
    }
    let mut out = String::new();
    for g in groups {
        let partners: Vec<String> = g
            .partners
            .iter()
            .map(|&(c, n)| format!("{}({n})", data.course_name(c)))
            .collect();
        out.push_str(&format!(
            "{}({}): {}\n",
            data.course_name(g.course),
            g.total,
            partners.join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;
    use crate::models::{Assignment, Course, CourseKind, Gender, Student, Subject, SubjectChoice};

    fn sample_data() -> BlockingData {
        BlockingData::new(1, "Q1")
            .with_numbered_tracks(100, 2)
            .with_subject(Subject::new(1, "M"))
            .with_subject(Subject::new(2, "D"))
            .with_course(Course::new(10, 1, CourseKind::Gk, 1))
            .with_course(Course::new(11, 1, CourseKind::Gk, 2))
            .with_course(Course::new(20, 2, CourseKind::Gk, 1))
            .with_student(Student::new(1, "Anna", "Berg", Gender::W))
            .with_student(Student::new(2, "Ben", "Cox", Gender::M))
            .with_choice(SubjectChoice::new(1, 1, CourseKind::Gk))
            .with_choice(SubjectChoice::new(1, 2, CourseKind::Gk))
            .with_choice(SubjectChoice::new(2, 1, CourseKind::Gk))
    }

    fn sample_index(assignment: &Assignment) -> Index {
        Index::build(&sample_data(), assignment, SortOrder::default()).0
    }

    #[test]
    fn test_rule_violations_empty() {
        assert_eq!(rule_violations(&BTreeMap::new()), "");
    }

    #[test]
    fn test_rule_violations_capped_in_display_order() {
        let mut texts = BTreeMap::new();
        texts.insert(
            RuleType::CourseFixedInTrack,
            (0..11).map(|i| format!("fix {i}")).collect::<Vec<_>>(),
        );
        texts.insert(RuleType::KindAloneInTrackRange, vec!["alone".to_string()]);
        let out = rule_violations(&texts);
        // Type 6 is displayed before type 2.
        assert!(out.starts_with("12 Regelverletzungen\nalone\nfix 0\n"));
        assert!(out.contains("fix 8\n"));
        assert!(!out.contains("fix 9"));
        assert!(out.ends_with("+2 weitere Konflikte."));
    }

    #[test]
    fn test_choice_conflicts() {
        let data = sample_data();
        let assignment = Assignment::new()
            .with_track(10, 100)
            .with_track(20, 100)
            .with_student(10, 1)
            .with_student(20, 1);
        let index = Index::build(&data, &assignment, SortOrder::default()).0;
        assert_eq!(
            choice_conflicts(&data, &index),
            "Wahlkonflikte = 2\n\
             Cox, Ben ist im Fach M-GK keinem Kurs zugeordnet.\n\
             Berg, Anna ist in Schiene 1 in mehreren Kursen:D-GK1, M-GK1\n"
        );
    }

    #[test]
    fn test_spreads() {
        let score = Score {
            spread_histogram: vec![2, 1, 0, 3],
            ..Default::default()
        };
        let breakdown = SpreadBreakdown { lk: 0, gk: 3, rest: 1 };
        assert_eq!(
            spreads(&score, &breakdown),
            "Maximale Kursdifferenz (LK, GK, REST): 0, 3, 1\nOptimal 0/1: 3x\nDifferenz 3: 3x\n"
        );
    }

    #[test]
    fn test_parallel_kinds() {
        let data = sample_data();
        let index = sample_index(&Assignment::new().with_track(10, 101).with_track(11, 101));
        assert_eq!(
            parallel_kinds(&data, &index),
            "Schiene 2:\n  M-GK (+1): M-GK1, M-GK2\n"
        );
    }

    #[test]
    fn test_track_collisions() {
        let data = sample_data();
        let index = sample_index(
            &Assignment::new()
                .with_track(10, 100)
                .with_track(20, 100)
                .with_student(10, 1)
                .with_student(20, 1),
        );
        assert_eq!(
            track_collision_text(&data, &index, &[10, 20]),
            "M-GK1(1): D-GK1(1)\nD-GK1(1): M-GK1(1)\n"
        );
        let groups = track_collision_groups(&index, &[10, 20]);
        assert_eq!(groups[0].partners, vec![(20, 1)]);
        assert_eq!(
            track_collision_text(&data, &index, &[11]),
            "Keine Kollisionen in der Schiene"
        );
    }
}
