// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Effects emitted by the engine and the runners that deliver them to ports.
//!
//! The redirect dispatcher is the history half of [`PortEffectsRunner`]:
//! normalization lands as `replace`, user navigation as `push`, exams as
//! `assign`. It never decides anything itself.

use serde::{Deserialize, Serialize};

use crate::ids::{CourseId, SequenceId, UnitId};
use crate::ports::{FetchPort, HistoryPort, ProgressPort};

/// One side effect requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Load course metadata.
    FetchCourse {
        /// Course to load.
        course_id: CourseId,
    },
    /// Load a sequence (the id may turn out to be a section or unit).
    FetchSequence {
        /// Id to try as a sequence.
        sequence_id: SequenceId,
    },
    /// Ask for the resume point.
    FetchResumePoint {
        /// Course being resumed.
        course_id: CourseId,
    },
    /// History replace.
    Replace {
        /// New path.
        path: String,
    },
    /// History push.
    Push {
        /// New path.
        path: String,
    },
    /// Leave the application.
    LeaveApp {
        /// Destination.
        url: String,
    },
    /// Report a unit as visited.
    CheckCompletion {
        /// Course.
        course_id: CourseId,
        /// Sequence holding the unit.
        sequence_id: SequenceId,
        /// Unit being left.
        unit_id: UnitId,
    },
    /// Persist sequence position.
    SavePosition {
        /// Course.
        course_id: CourseId,
        /// Sequence.
        sequence_id: SequenceId,
        /// New active index.
        unit_index: usize,
    },
    /// First-section celebration.
    Celebrate {
        /// Sequence being left.
        from: SequenceId,
        /// Sequence being entered.
        to: SequenceId,
        /// Unit being entered, if the sequence has any.
        unit_id: Option<UnitId>,
    },
}

impl Effect {
    /// True for effects that move the router.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Effect::Replace { .. } | Effect::Push { .. } | Effect::LeaveApp { .. }
        )
    }
}

/// Delivers effects to the outside world.
pub trait EffectsRunner {
    /// Apply effects in order.
    fn run(&mut self, effects: Vec<Effect>);
}

/// Runner that fans effects out to the three port traits.
pub struct PortEffectsRunner<'a> {
    fetch: &'a mut dyn FetchPort,
    progress: &'a mut dyn ProgressPort,
    history: &'a mut dyn HistoryPort,
}

impl<'a> PortEffectsRunner<'a> {
    /// Bind the runner to concrete ports.
    pub fn new(
        fetch: &'a mut dyn FetchPort,
        progress: &'a mut dyn ProgressPort,
        history: &'a mut dyn HistoryPort,
    ) -> Self {
        Self {
            fetch,
            progress,
            history,
        }
    }
}

impl EffectsRunner for PortEffectsRunner<'_> {
    fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchCourse { course_id } => self.fetch.fetch_course(&course_id),
                Effect::FetchSequence { sequence_id } => self.fetch.fetch_sequence(&sequence_id),
                Effect::FetchResumePoint { course_id } => {
                    self.fetch.fetch_resume_point(&course_id);
                }
                Effect::Replace { path } => self.history.replace(&path),
                Effect::Push { path } => self.history.push(&path),
                Effect::LeaveApp { url } => self.history.assign(&url),
                Effect::CheckCompletion {
                    course_id,
                    sequence_id,
                    unit_id,
                } => self
                    .progress
                    .check_completion(&course_id, &sequence_id, &unit_id),
                Effect::SavePosition {
                    course_id,
                    sequence_id,
                    unit_index,
                } => self
                    .progress
                    .save_position(&course_id, &sequence_id, unit_index),
                Effect::Celebrate { from, to, unit_id } => {
                    self.progress.celebrate(&from, &to, unit_id.as_ref());
                }
            }
        }
    }
}

/// Test fake: records every effect it is handed.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    /// Effects in delivery order.
    pub calls: Vec<Effect>,
}

impl RecordingRunner {
    /// Paths handed to `replace`, in order.
    pub fn replaced(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|e| match e {
                Effect::Replace { path } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Paths handed to `push`, in order.
    pub fn pushed(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|e| match e {
                Effect::Push { path } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EffectsRunner for RecordingRunner {
    fn run(&mut self, effects: Vec<Effect>) {
        self.calls.extend(effects);
    }
}
