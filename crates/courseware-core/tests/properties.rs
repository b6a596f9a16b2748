// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use courseware_core::{
    applicable_rules, resolve, resume_target, Correction, CoursewareEngine, CoursewareRef,
    EffectGuard, EffectSlot, GuardKey, HierarchyStore, LoadStatus, MemoryStore, PlayerPrefs,
    ResumePoint, Sandbox, SequenceId, Settled,
};
use courseware_dry_tests::CourseFixture;
use proptest::prelude::*;

/// Section count, then per-section sequence unit counts.
fn outline() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 1..4)
}

#[derive(Debug, Clone)]
struct Shape {
    outline: Vec<Vec<usize>>,
    active: Vec<usize>,
    exam: Option<usize>,
    failing: Option<usize>,
    resume: Option<(usize, usize)>,
    block: usize,
    unit: usize,
}

fn shape() -> impl Strategy<Value = Shape> {
    (
        outline(),
        prop::collection::vec(0usize..5, 16),
        prop::option::of(0usize..16),
        prop::option::of(0usize..16),
        prop::option::of((0usize..64, 0usize..64)),
        0usize..64,
        0usize..64,
    )
        .prop_map(|(outline, active, exam, failing, resume, block, unit)| Shape {
            outline,
            active,
            exam,
            failing,
            resume,
            block,
            unit,
        })
}

struct Built {
    fixture: CourseFixture,
    sections: Vec<String>,
    sequences: Vec<String>,
    units: Vec<String>,
}

fn build(shape: &Shape) -> Built {
    let mut fixture = CourseFixture::new("C");
    let (mut sections, mut sequences, mut units) = (Vec::new(), Vec::new(), Vec::new());
    for (i, seqs) in shape.outline.iter().enumerate() {
        let section = format!("SEC{i}");
        fixture = fixture.section(&section);
        sections.push(section);
        for (j, &count) in seqs.iter().enumerate() {
            let seq = format!("SEQ{i}_{j}");
            let ids: Vec<String> = (0..count).map(|k| format!("U{i}_{j}_{k}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            fixture = fixture.sequence(&seq, &refs);
            let n = sequences.len();
            if let Some(&active) = shape.active.get(n) {
                fixture = fixture.active_index(&seq, active);
            }
            if shape.exam == Some(n) {
                fixture = fixture.exam(&seq, &format!("https://exams.example/{seq}"));
            }
            if shape.failing == Some(n) {
                fixture = fixture.failing_sequence(&seq);
            }
            sequences.push(seq);
            units.extend(ids);
        }
    }
    let mut built = Built {
        fixture,
        sections,
        sequences,
        units,
    };
    // Resume points may name any block, including ones the course lacks.
    if let Some((block, unit)) = shape.resume {
        let point = ResumePoint::at(pick(&built, block), pick(&built, unit));
        built.fixture = built.fixture.resume(point);
    }
    built
}

/// Pick an id from every kind of block, plus one that is nothing.
fn pick(built: &Built, n: usize) -> String {
    let pool: Vec<&String> = built
        .sections
        .iter()
        .chain(&built.sequences)
        .chain(&built.units)
        .collect();
    pool.get(n % (pool.len() + 1))
        .map_or_else(|| "BOGUS".to_owned(), |s| (*s).clone())
}

fn route(built: &Built, shape: &Shape) -> CoursewareRef {
    match (shape.block % 5, shape.unit % 3) {
        (0, _) => CoursewareRef::course("C"),
        (_, 0) => CoursewareRef::block("C", pick(built, shape.block).as_str()),
        (_, _) => CoursewareRef::unit(
            "C",
            pick(built, shape.block).as_str(),
            pick(built, shape.unit).as_str(),
        ),
    }
}

/// Loaded store where every non-sequence id has already failed as a sequence.
fn settled_store(built: &Built) -> MemoryStore {
    let mut store = built.fixture.loaded_store();
    let bogus = "BOGUS".to_owned();
    for id in built.sections.iter().chain(&built.units).chain([&bogus]) {
        store.set_sequence_status(SequenceId::from(id.as_str()), LoadStatus::Failed);
    }
    store
}

fn assert_contained(
    store: &dyn HierarchyStore,
    target: &CoursewareRef,
) -> Result<(), TestCaseError> {
    if let Some(seq) = target.sequence_id() {
        if store.sequence(&seq).is_some() {
            prop_assert!(store.section_of_sequence(target.course_id(), &seq).is_some());
            if let Some(unit) = target.unit_id() {
                prop_assert!(store.sequence(&seq).unwrap().unit_ids.contains(unit));
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn at_most_one_rule_applies(shape in shape()) {
        let built = build(&shape);
        let store = settled_store(&built);
        let r = route(&built, &shape);
        let matching = applicable_rules(&store, &r);
        prop_assert!(matching.len() <= 1, "{r}: {matching:?}");
    }

    #[test]
    fn corrections_reach_a_contained_fixed_point(shape in shape()) {
        let built = build(&shape);
        let store = settled_store(&built);
        let mut r = route(&built, &shape);
        let mut settled = false;
        for _ in 0..8 {
            match resolve(&store, &r) {
                Some(Correction::Replace(target)) => {
                    prop_assert_ne!(&target, &r);
                    assert_contained(&store, &target)?;
                    r = target;
                }
                Some(Correction::RequestResume(course)) => {
                    match resume_target(&store, &course, &ResumePoint::default()) {
                        Some(target) => r = target,
                        None => { settled = true; break; }
                    }
                }
                Some(Correction::LeaveApp { .. }) | None => { settled = true; break; }
            }
        }
        prop_assert!(settled, "no fixed point from {}", route(&built, &shape));
        // A canonical reference resolves to nothing new.
        if let Some(Correction::Replace(again)) = resolve(&store, &r) {
            prop_assert!(false, "{r} corrected again to {again}");
        }
    }

    #[test]
    fn sandbox_always_settles(shape in shape()) {
        let built = build(&shape);
        let start = route(&built, &shape);
        // Each failed sequence may cost one extra trip through the course root.
        let prefs = PlayerPrefs { max_settle_passes: 64, ..PlayerPrefs::default() };
        let mut sb = Sandbox::new(
            CoursewareEngine::new(prefs),
            built.fixture.world(),
            start.clone(),
        ).unwrap();
        match sb.settle() {
            Settled::FixedPoint { .. } | Settled::Exited { .. } => {}
            Settled::Exhausted { passes } => {
                prop_assert!(false, "{start} did not settle in {passes} passes");
            }
        }
    }

    #[test]
    fn guard_fires_exactly_on_key_change(
        keys in prop::collection::vec((0usize..3, 0usize..3), 1..40)
    ) {
        let slots = [EffectSlot::FetchCourse, EffectSlot::FetchSequence, EffectSlot::SavePosition];
        let mut guard = EffectGuard::new();
        let mut last: [Option<usize>; 3] = [None; 3];
        for (slot, key) in keys {
            let mut calls = 0;
            let guard_key = GuardKey::new().with(key.to_string());
            let fired = guard.guard(slots[slot], guard_key, || calls += 1);
            prop_assert_eq!(fired, last[slot] != Some(key));
            prop_assert_eq!(calls, usize::from(fired));
            last[slot] = Some(key);
        }
    }
}
