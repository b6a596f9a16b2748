// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Position Resolver: ordered normalization rules over a hierarchy snapshot.
//!
//! Rules are checked in table order and the first whose matcher accepts the
//! reference wins; evaluation stops there even if its resolver has nothing
//! to correct. Everything here is pure: no I/O, no guard, no logging.
//!
//! ```text
//! /course/C                 -> resume point, else first sequence   (Resume)
//! /course/C/SECTION[/U]     -> /course/C/SEQ[/U]                   (SectionToSequence)
//! /course/C/UNIT            -> /course/C/SEQ/UNIT                  (UnitToSequence)
//! /course/C/UNKNOWN[/U]     -> /course/C                           (UnknownBlock)
//! /course/C/SEQ             -> /course/C/SEQ/ACTIVE_UNIT           (SequenceToUnit)
//! /course/C/EXAM[/U]        -> external exam URL                   (SpecialExam)
//! ```

use crate::ids::{BlockId, CourseId, SequenceId};
use crate::model::{CourseStatus, LoadStatus, ResumePoint, Sequence};
use crate::route::CoursewareRef;
use crate::store::HierarchyStore;

/// Identifies a resolver rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    /// Bare course URL: consult the resume point.
    Resume,
    /// Second component is a section.
    SectionToSequence,
    /// Second component is a unit.
    UnitToSequence,
    /// Second component is not a sequence, section or unit.
    UnknownBlock,
    /// Sequence without a unit.
    SequenceToUnit,
    /// Timed exam served outside the player.
    SpecialExam,
}

impl RuleKind {
    /// All rules in precedence order.
    pub const ALL: [RuleKind; 6] = [
        RuleKind::Resume,
        RuleKind::SectionToSequence,
        RuleKind::UnitToSequence,
        RuleKind::UnknownBlock,
        RuleKind::SequenceToUnit,
        RuleKind::SpecialExam,
    ];
}

/// Outcome a rule asks the shell to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// Fetch the resume point; the path is corrected when it arrives.
    RequestResume(CourseId),
    /// History-replace the route.
    Replace(CoursewareRef),
    /// Leave the application for an external URL.
    LeaveApp {
        /// Destination.
        url: String,
    },
}

/// Predicate half of a rule.
pub type MatchFn = fn(&dyn HierarchyStore, &CoursewareRef) -> bool;

/// Action half of a rule; `None` means the rule claims the pass but changes nothing.
pub type ResolveFn = fn(&dyn HierarchyStore, &CoursewareRef) -> Option<Correction>;

/// Descriptor for one normalization rule.
#[derive(Debug)]
pub struct ResolutionRule {
    /// Stable identity.
    pub kind: RuleKind,
    /// Human-readable name for logs.
    pub name: &'static str,
    /// Whether the rule applies to the reference.
    pub matcher: MatchFn,
    /// Correction to apply once matched.
    pub resolver: ResolveFn,
}

/// Winning rule of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Rule that claimed the pass.
    pub rule: RuleKind,
    /// What it wants done, if anything.
    pub correction: Option<Correction>,
}

static RULES: [ResolutionRule; 6] = [
    ResolutionRule {
        kind: RuleKind::Resume,
        name: "resume",
        matcher: resume_matches,
        resolver: resume_resolve,
    },
    ResolutionRule {
        kind: RuleKind::SectionToSequence,
        name: "section-to-sequence",
        matcher: section_matches,
        resolver: section_resolve,
    },
    ResolutionRule {
        kind: RuleKind::UnitToSequence,
        name: "unit-to-sequence",
        matcher: unit_matches,
        resolver: unit_resolve,
    },
    ResolutionRule {
        kind: RuleKind::UnknownBlock,
        name: "unknown-block",
        matcher: unknown_matches,
        resolver: unknown_resolve,
    },
    ResolutionRule {
        kind: RuleKind::SequenceToUnit,
        name: "sequence-to-unit",
        matcher: sequence_matches,
        resolver: sequence_resolve,
    },
    ResolutionRule {
        kind: RuleKind::SpecialExam,
        name: "special-exam",
        matcher: exam_matches,
        resolver: exam_resolve,
    },
];

/// The rule table in precedence order.
pub fn rules() -> &'static [ResolutionRule] {
    &RULES
}

/// Descriptor for `kind`.
pub fn rule(kind: RuleKind) -> &'static ResolutionRule {
    match kind {
        RuleKind::Resume => &RULES[0],
        RuleKind::SectionToSequence => &RULES[1],
        RuleKind::UnitToSequence => &RULES[2],
        RuleKind::UnknownBlock => &RULES[3],
        RuleKind::SequenceToUnit => &RULES[4],
        RuleKind::SpecialExam => &RULES[5],
    }
}

/// First matching rule and its correction.
pub fn evaluate_rules(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Resolution> {
    RULES
        .iter()
        .find(|r| (r.matcher)(store, route))
        .map(|r| Resolution {
            rule: r.kind,
            correction: (r.resolver)(store, route),
        })
}

/// Correction for `route`, or `None` once it is canonical.
pub fn resolve(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    evaluate_rules(store, route).and_then(|r| r.correction)
}

/// Every rule whose matcher accepts `route`, ignoring precedence.
pub fn applicable_rules(store: &dyn HierarchyStore, route: &CoursewareRef) -> Vec<RuleKind> {
    RULES
        .iter()
        .filter(|r| (r.matcher)(store, route))
        .map(|r| r.kind)
        .collect()
}

/// Second half of the resume rule, run when the resume point arrives.
///
/// A point naming a unit and a block this course still has wins. Otherwise
/// the first sequence that has not already failed to load; otherwise nothing.
pub fn resume_target(
    store: &dyn HierarchyStore,
    course_id: &CourseId,
    point: &ResumePoint,
) -> Option<CoursewareRef> {
    if let (Some(section), Some(unit)) = (&point.section_id, &point.unit_id) {
        if resumable_block(store, course_id, &BlockId::from(section)) {
            return Some(CoursewareRef::unit(
                course_id.clone(),
                section.clone(),
                unit.clone(),
            ));
        }
    }
    store
        .course_sequence_ids(course_id)
        .into_iter()
        .find(|seq| not_failed(store, seq))
        .map(|seq| CoursewareRef::sequence(course_id, &seq, None))
}

/// Block that one of the path rules can still place inside `course_id`.
///
/// Anything that could only lead to a sequence already known to fail is
/// excluded: it would bounce back to the course root through the
/// unknown-block rule and ask for the same resume point again.
fn resumable_block(store: &dyn HierarchyStore, course_id: &CourseId, block: &BlockId) -> bool {
    let Some(course) = store.course(course_id) else {
        return false;
    };
    let sequences = store.course_sequence_ids(course_id);
    let section = block.as_section();
    if course.section_ids.contains(&section) {
        return store
            .section(&section)
            .is_some_and(|s| s.sequence_ids.iter().any(|seq| not_failed(store, seq)));
    }
    let sequence = block.as_sequence();
    if sequences.contains(&sequence) {
        return not_failed(store, &sequence);
    }
    store.unit(&block.as_unit()).is_some_and(|unit| {
        sequences.contains(&unit.sequence_id) && not_failed(store, &unit.sequence_id)
    })
}

fn not_failed(store: &dyn HierarchyStore, sequence: &SequenceId) -> bool {
    store.sequence_status(sequence) != LoadStatus::Failed
}

fn course_loaded(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    store.course_status(route.course_id()) == CourseStatus::Loaded
}

fn block_failed_as_sequence(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    route
        .sequence_id()
        .is_some_and(|seq| store.sequence_status(&seq) == LoadStatus::Failed)
}

fn loaded_sequence<'s>(
    store: &'s dyn HierarchyStore,
    route: &CoursewareRef,
) -> Option<&'s Sequence> {
    let seq = route.sequence_id()?;
    if store.sequence_status(&seq) != LoadStatus::Loaded {
        return None;
    }
    store.sequence(&seq)
}

fn resume_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    course_loaded(store, route) && route.block_id().is_none()
}

fn resume_resolve(_store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    Some(Correction::RequestResume(route.course_id().clone()))
}

fn section_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    course_loaded(store, route)
        && block_failed_as_sequence(store, route)
        && route
            .block_id()
            .is_some_and(|b| store.section(&b.as_section()).is_some())
}

fn section_resolve(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    let section = store.section(&route.block_id()?.as_section())?;
    let course = route.course_id();
    let owning = route
        .unit_id()
        .and_then(|u| store.unit(u))
        .filter(|unit| section.sequence_ids.contains(&unit.sequence_id))
        .filter(|unit| not_failed(store, &unit.sequence_id));
    let first = section.sequence_ids.iter().find(|seq| not_failed(store, seq));
    let target = match (owning, first) {
        (Some(unit), _) => CoursewareRef::sequence(course, &unit.sequence_id, Some(&unit.id)),
        (None, Some(first)) => CoursewareRef::sequence(course, first, None),
        (None, None) => CoursewareRef::course(course.clone()),
    };
    Some(Correction::Replace(target))
}

fn unit_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    course_loaded(store, route)
        && block_failed_as_sequence(store, route)
        && route.block_id().is_some_and(|b| {
            store.section(&b.as_section()).is_none() && store.unit(&b.as_unit()).is_some()
        })
}

fn unit_resolve(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    let unit = store.unit(&route.block_id()?.as_unit())?;
    Some(Correction::Replace(CoursewareRef::sequence(
        route.course_id(),
        &unit.sequence_id,
        Some(&unit.id),
    )))
}

fn unknown_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    course_loaded(store, route)
        && block_failed_as_sequence(store, route)
        && route.block_id().is_some_and(|b| {
            store.section(&b.as_section()).is_none() && store.unit(&b.as_unit()).is_none()
        })
}

fn unknown_resolve(_store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    Some(Correction::Replace(CoursewareRef::course(
        route.course_id().clone(),
    )))
}

fn sequence_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    route.unit_id().is_none()
        && loaded_sequence(store, route).is_some_and(|seq| seq.special_exam_url().is_none())
}

fn sequence_resolve(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    let seq = loaded_sequence(store, route)?;
    let unit = seq.active_unit()?;
    Some(Correction::Replace(CoursewareRef::sequence(
        route.course_id(),
        &seq.id,
        Some(unit),
    )))
}

fn exam_matches(store: &dyn HierarchyStore, route: &CoursewareRef) -> bool {
    loaded_sequence(store, route).is_some_and(|seq| seq.special_exam_url().is_some())
}

fn exam_resolve(store: &dyn HierarchyStore, route: &CoursewareRef) -> Option<Correction> {
    let url = loaded_sequence(store, route)?.special_exam_url()?;
    Some(Correction::LeaveApp {
        url: url.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::model::{Course, Section, Unit};
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        s.insert_course(Course::new("C", vec!["SEC1".into(), "SEC2".into()]));
        s.set_course_status("C".into(), CourseStatus::Loaded);
        s.insert_section(Section {
            id: "SEC1".into(),
            sequence_ids: vec!["SEQ1".into(), "SEQ2".into()],
        });
        s.insert_section(Section {
            id: "SEC2".into(),
            sequence_ids: vec![],
        });
        for (unit, seq) in [("U1", "SEQ1"), ("U2", "SEQ1"), ("U3", "SEQ2")] {
            s.insert_unit(Unit::new(unit, seq));
        }
        s
    }

    fn load(s: &mut MemoryStore, seq: Sequence) {
        s.set_sequence_status(seq.id.clone(), LoadStatus::Loaded);
        s.insert_sequence(seq);
    }

    fn fail(s: &mut MemoryStore, id: &str) {
        s.set_sequence_status(SequenceId::from(id), LoadStatus::Failed);
    }

    fn replace(path: &str) -> Option<Correction> {
        Some(Correction::Replace(CoursewareRef::parse(path).unwrap()))
    }

    #[test]
    fn bare_course_requests_resume() {
        let s = store();
        let r = CoursewareRef::course("C");
        assert_eq!(resolve(&s, &r), Some(Correction::RequestResume("C".into())));
    }

    #[test]
    fn nothing_applies_while_course_loads() {
        let s = MemoryStore::new();
        assert!(evaluate_rules(&s, &CoursewareRef::course("C")).is_none());
    }

    #[test]
    fn section_with_member_unit_keeps_unit() {
        let mut s = store();
        fail(&mut s, "SEC1");
        let r = CoursewareRef::unit("C", "SEC1", "U3");
        assert_eq!(resolve(&s, &r), replace("/course/C/SEQ2/U3"));
    }

    #[test]
    fn section_with_foreign_unit_goes_to_first_sequence() {
        let mut s = store();
        s.insert_unit(Unit::new("UX", "ELSEWHERE"));
        fail(&mut s, "SEC1");
        let r = CoursewareRef::unit("C", "SEC1", "UX");
        assert_eq!(resolve(&s, &r), replace("/course/C/SEQ1"));
    }

    #[test]
    fn section_skips_sequences_known_to_fail() {
        let mut s = store();
        fail(&mut s, "SEC1");
        fail(&mut s, "SEQ1");
        assert_eq!(
            resolve(&s, &CoursewareRef::unit("C", "SEC1", "U1")),
            replace("/course/C/SEQ2")
        );
        fail(&mut s, "SEQ2");
        assert_eq!(
            resolve(&s, &CoursewareRef::block("C", "SEC1")),
            replace("/course/C")
        );
    }

    #[test]
    fn empty_section_goes_to_course_root() {
        let mut s = store();
        fail(&mut s, "SEC2");
        assert_eq!(
            resolve(&s, &CoursewareRef::block("C", "SEC2")),
            replace("/course/C")
        );
    }

    #[test]
    fn bare_unit_gains_its_sequence() {
        let mut s = store();
        fail(&mut s, "U3");
        assert_eq!(
            resolve(&s, &CoursewareRef::block("C", "U3")),
            replace("/course/C/SEQ2/U3")
        );
    }

    #[test]
    fn unknown_block_falls_back_to_course_root() {
        let mut s = store();
        fail(&mut s, "GHOST");
        assert_eq!(
            resolve(&s, &CoursewareRef::unit("C", "GHOST", "U1")),
            replace("/course/C")
        );
    }

    #[test]
    fn pending_block_is_left_alone() {
        let s = store();
        assert!(evaluate_rules(&s, &CoursewareRef::block("C", "GHOST")).is_none());
    }

    #[test]
    fn sequence_lands_on_active_unit() {
        let mut s = store();
        let mut seq = Sequence::new("SEQ1", "SEC1", vec!["U1".into(), "U2".into()]);
        seq.active_unit_index = Some(1);
        load(&mut s, seq);
        assert_eq!(
            resolve(&s, &CoursewareRef::block("C", "SEQ1")),
            replace("/course/C/SEQ1/U2")
        );
    }

    #[test]
    fn empty_sequence_claims_the_pass_without_correction() {
        let mut s = store();
        load(&mut s, Sequence::new("SEQ1", "SEC1", vec![]));
        let resolution = evaluate_rules(&s, &CoursewareRef::block("C", "SEQ1")).unwrap();
        assert_eq!(resolution.rule, RuleKind::SequenceToUnit);
        assert!(resolution.correction.is_none());
    }

    #[test]
    fn exam_leaves_the_app_with_or_without_unit() {
        let mut s = store();
        let mut seq = Sequence::new("SEQ1", "SEC1", vec!["U1".into()]);
        seq.is_time_limited = true;
        seq.exam_url = Some("https://lms.example/exam/SEQ1".into());
        load(&mut s, seq);
        let expected = Some(Correction::LeaveApp {
            url: "https://lms.example/exam/SEQ1".into(),
        });
        assert_eq!(resolve(&s, &CoursewareRef::block("C", "SEQ1")), expected);
        assert_eq!(resolve(&s, &CoursewareRef::unit("C", "SEQ1", "U1")), expected);
    }

    #[test]
    fn canonical_reference_is_a_fixed_point() {
        let mut s = store();
        load(
            &mut s,
            Sequence::new("SEQ1", "SEC1", vec!["U1".into(), "U2".into()]),
        );
        assert!(evaluate_rules(&s, &CoursewareRef::unit("C", "SEQ1", "U2")).is_none());
    }

    #[test]
    fn resume_target_prefers_point_then_first_sequence() {
        let s = store();
        let c = CourseId::from("C");
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::at("SEC1", "U2")),
            Some(CoursewareRef::unit("C", "SEC1", "U2"))
        );
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::default()),
            Some(CoursewareRef::block("C", "SEQ1"))
        );
        let half = ResumePoint {
            section_id: Some("SEC1".into()),
            unit_id: None,
        };
        assert_eq!(
            resume_target(&s, &c, &half),
            Some(CoursewareRef::block("C", "SEQ1"))
        );
    }

    #[test]
    fn resume_target_ignores_blocks_the_course_no_longer_has() {
        let mut s = store();
        let c = CourseId::from("C");
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::at("GONE", "U2")),
            Some(CoursewareRef::block("C", "SEQ1"))
        );
        // Sequences and units of the course are fine as resume blocks.
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::at("SEQ2", "U3")),
            Some(CoursewareRef::unit("C", "SEQ2", "U3"))
        );
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::at("U3", "U3")),
            Some(CoursewareRef::unit("C", "U3", "U3"))
        );

        // Empty sections and anything leading only to failed sequences are
        // not worth resuming into.
        assert_eq!(
            resume_target(&s, &c, &ResumePoint::at("SEC2", "U1")),
            Some(CoursewareRef::block("C", "SEQ1"))
        );
        fail(&mut s, "SEQ1");
        for block in ["SEQ1", "U1"] {
            assert_eq!(
                resume_target(&s, &c, &ResumePoint::at(block, "U1")),
                Some(CoursewareRef::block("C", "SEQ2"))
            );
        }
        fail(&mut s, "SEQ2");
        assert!(resume_target(&s, &c, &ResumePoint::default()).is_none());
    }

    #[test]
    fn resume_target_is_none_for_a_course_without_sequences() {
        let mut s = MemoryStore::new();
        s.insert_course(Course::new("C", vec!["SEC".into()]));
        s.set_course_status("C".into(), CourseStatus::Loaded);
        s.insert_section(Section {
            id: "SEC".into(),
            sequence_ids: vec![],
        });
        assert!(resume_target(&s, &"C".into(), &ResumePoint::default()).is_none());
    }

    #[test]
    fn table_order_matches_kind_order() {
        for (rule, kind) in rules().iter().zip(RuleKind::ALL) {
            assert_eq!(rule.kind, kind);
            assert_eq!(super::rule(kind).name, rule.name);
        }
    }
}
