// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-initiated navigation: unit and sequence stepping.
//!
//! Every action returns history *pushes* (never replaces); the engine shell
//! runs them through the same runner as normalization effects.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::effects::Effect;
use crate::ids::{SequenceId, UnitId};
use crate::route::CoursewareRef;
use crate::store::HierarchyStore;

/// A navigation request from the player chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    /// Next unit, or the next sequence at the sequence edge.
    Next,
    /// Previous unit, or the previous sequence at the sequence edge.
    Previous,
    /// First unit of the next sequence.
    NextSequence,
    /// Last unit of the previous sequence.
    PreviousSequence,
    /// A specific unit of the current sequence.
    Unit(UnitId),
}

/// Unrecognized navigation action text.
#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "unknown navigation action `{0}` \
     (expected next, previous, next-sequence, previous-sequence or unit=ID)"
)]
pub struct ParseNavActionError(String);

impl FromStr for NavAction {
    type Err = ParseNavActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Self::Next),
            "previous" | "prev" => Ok(Self::Previous),
            "next-sequence" => Ok(Self::NextSequence),
            "previous-sequence" => Ok(Self::PreviousSequence),
            other => match other.strip_prefix("unit=") {
                Some(id) if !id.is_empty() => Ok(Self::Unit(UnitId::from(id))),
                _ => Err(ParseNavActionError(other.to_owned())),
            },
        }
    }
}

impl fmt::Display for NavAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next"),
            Self::Previous => f.write_str("previous"),
            Self::NextSequence => f.write_str("next-sequence"),
            Self::PreviousSequence => f.write_str("previous-sequence"),
            Self::Unit(id) => write!(f, "unit={id}"),
        }
    }
}

/// Position facts the sequence navigation bar renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationMetadata {
    /// First unit of the first sequence in the course.
    pub is_first_unit: bool,
    /// Last unit of the last sequence in the course.
    pub is_last_unit: bool,
    /// The sequence is gated behind prerequisites.
    pub is_locked: bool,
    /// Index of the route unit within its sequence.
    pub unit_index: usize,
}

/// Jump to `unit_id` inside `sequence_id`.
///
/// The unit being *left* is reported for completion before the push.
pub fn go_to_unit(
    route: &CoursewareRef,
    sequence_id: &SequenceId,
    unit_id: &UnitId,
) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let (Some(current), Some(leaving)) = (route.sequence_id(), route.unit_id()) {
        effects.push(Effect::CheckCompletion {
            course_id: route.course_id().clone(),
            sequence_id: current,
            unit_id: leaving.clone(),
        });
    }
    let target = CoursewareRef::sequence(route.course_id(), sequence_id, Some(unit_id));
    effects.push(Effect::Push {
        path: target.to_string(),
    });
    effects
}

/// Advance to the next sequence in course order.
///
/// Crossing into a new section fires the celebration when both the course
/// and `celebrate` allow it.
pub fn next_sequence(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
    celebrate: bool,
) -> Vec<Effect> {
    let Some((current, next)) = neighbour(store, route, Step::Forward) else {
        return Vec::new();
    };
    let course_id = route.course_id();
    let first_unit = store
        .sequence(&next)
        .and_then(|s| s.unit_ids.first())
        .cloned();
    let target = CoursewareRef::sequence(course_id, &next, first_unit.as_ref());
    let mut effects = vec![Effect::Push {
        path: target.to_string(),
    }];

    let course_flag = store
        .course(course_id)
        .is_some_and(|c| c.celebrations.first_section);
    if celebrate && course_flag {
        let from_section = store.section_of_sequence(course_id, &current);
        let to_section = store.section_of_sequence(course_id, &next);
        if from_section != to_section {
            effects.push(Effect::Celebrate {
                from: current,
                to: next,
                unit_id: first_unit,
            });
        }
    }
    effects
}

/// Return to the previous sequence, landing on its last unit.
pub fn previous_sequence(store: &dyn HierarchyStore, route: &CoursewareRef) -> Vec<Effect> {
    let Some((_, previous)) = neighbour(store, route, Step::Back) else {
        return Vec::new();
    };
    let last_unit = store.sequence(&previous).and_then(|s| s.unit_ids.last());
    let target = CoursewareRef::sequence(route.course_id(), &previous, last_unit);
    vec![Effect::Push {
        path: target.to_string(),
    }]
}

/// Step forward one unit, falling over to [`next_sequence`] at the end.
pub fn next_unit(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
    celebrate: bool,
) -> Vec<Effect> {
    let Some((sequence_id, units, index)) = position(store, route) else {
        return next_sequence(store, route, celebrate);
    };
    match units.get(index + 1) {
        Some(unit) => go_to_unit(route, &sequence_id, unit),
        None => next_sequence(store, route, celebrate),
    }
}

/// Step back one unit, falling over to [`previous_sequence`] at the start.
pub fn previous_unit(store: &dyn HierarchyStore, route: &CoursewareRef) -> Vec<Effect> {
    let Some((sequence_id, units, index)) = position(store, route) else {
        return previous_sequence(store, route);
    };
    match index.checked_sub(1).and_then(|i| units.get(i)) {
        Some(unit) => go_to_unit(route, &sequence_id, unit),
        None => previous_sequence(store, route),
    }
}

/// Dispatch a [`NavAction`].
pub fn navigate(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
    action: &NavAction,
    celebrate: bool,
) -> Vec<Effect> {
    match action {
        NavAction::Next => next_unit(store, route, celebrate),
        NavAction::Previous => previous_unit(store, route),
        NavAction::NextSequence => next_sequence(store, route, celebrate),
        NavAction::PreviousSequence => previous_sequence(store, route),
        NavAction::Unit(unit) => route
            .sequence_id()
            .map(|seq| go_to_unit(route, &seq, unit))
            .unwrap_or_default(),
    }
}

/// Metadata for a canonical route, or `None` until its sequence has loaded
/// and contains the route unit.
pub fn navigation_metadata(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
) -> Option<NavigationMetadata> {
    let sequence_id = route.sequence_id()?;
    let sequence = store.sequence(&sequence_id)?;
    let unit_index = sequence.index_of(route.unit_id()?)?;
    let order = store.course_sequence_ids(route.course_id());
    let sequence_index = order.iter().position(|s| *s == sequence_id);
    let last_unit = unit_index + 1 == sequence.unit_ids.len();
    Some(NavigationMetadata {
        is_first_unit: sequence_index == Some(0) && unit_index == 0,
        is_last_unit: sequence_index.is_some_and(|i| i + 1 == order.len()) && last_unit,
        is_locked: sequence.gated,
        unit_index,
    })
}

#[derive(Clone, Copy)]
enum Step {
    Forward,
    Back,
}

/// Current sequence and its neighbour in course order.
fn neighbour(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
    step: Step,
) -> Option<(SequenceId, SequenceId)> {
    let current = route.sequence_id()?;
    let order = store.course_sequence_ids(route.course_id());
    let at = order.iter().position(|s| *s == current)?;
    let target = match step {
        Step::Forward => order.get(at + 1),
        Step::Back => at.checked_sub(1).and_then(|i| order.get(i)),
    }?;
    Some((current, target.clone()))
}

/// Loaded sequence, its units, and the route unit's index (active unit when
/// the route names none).
fn position(
    store: &dyn HierarchyStore,
    route: &CoursewareRef,
) -> Option<(SequenceId, Vec<UnitId>, usize)> {
    let sequence_id = route.sequence_id()?;
    let sequence = store.sequence(&sequence_id)?;
    let index = match route.unit_id() {
        Some(unit) => sequence.index_of(unit)?,
        None => sequence.index_of(sequence.active_unit()?)?,
    };
    Some((sequence_id, sequence.unit_ids.clone(), index))
}
