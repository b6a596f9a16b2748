// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port traits the engine's effects are delivered through.

use crate::ids::{CourseId, SequenceId, UnitId};

/// Data-fetch collaborators. All calls are fire-and-forget; results land in
/// the hierarchy store (or, for resume points, come back through
/// [`crate::CoursewareEngine::on_resume_point`]).
pub trait FetchPort {
    /// Start loading course metadata and outline.
    fn fetch_course(&mut self, course_id: &CourseId);
    /// Start loading a sequence and its units.
    fn fetch_sequence(&mut self, sequence_id: &SequenceId);
    /// Ask the server where the learner left off.
    fn fetch_resume_point(&mut self, course_id: &CourseId);
}

/// Learner-progress collaborators.
pub trait ProgressPort {
    /// Report `unit_id` as visited.
    fn check_completion(
        &mut self,
        course_id: &CourseId,
        sequence_id: &SequenceId,
        unit_id: &UnitId,
    );
    /// Persist the active position of a sequence.
    fn save_position(&mut self, course_id: &CourseId, sequence_id: &SequenceId, unit_index: usize);
    /// Record the first-section celebration trigger.
    fn celebrate(&mut self, from: &SequenceId, to: &SequenceId, unit_id: Option<&UnitId>);
}

/// Routing surface.
pub trait HistoryPort {
    /// Replace the current entry (normalization; no back-button entry).
    fn replace(&mut self, path: &str);
    /// Push a new entry (user navigation).
    fn push(&mut self, path: &str);
    /// Leave the application entirely.
    fn assign(&mut self, url: &str);
}
