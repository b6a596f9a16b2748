// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Course hierarchy records (course → section → sequence → unit).
//!
//! Records are written by fetch collaborators and only ever read by the
//! engine. Ordering of child id lists is significant and preserved.

use serde::{Deserialize, Serialize};

use crate::access::DenialCode;
use crate::ids::{CourseId, SectionId, SequenceId, UnitId};

/// Load status of a sequence fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Fetch issued or not yet issued.
    #[default]
    Loading,
    /// Record is in the store.
    Loaded,
    /// Fetch settled without a sequence record.
    Failed,
}

/// Load status of a course fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    /// Fetch issued or not yet issued.
    #[default]
    Loading,
    /// Course metadata and outline are in the store.
    Loaded,
    /// Course metadata could not be fetched.
    Failed,
    /// Course loaded but the learner may not view courseware.
    Denied,
}

/// Access decision carried with course metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Access {
    /// Courseware may be shown.
    #[default]
    Allowed,
    /// Courseware is blocked; `code` selects the redirect.
    Denied {
        /// Backend error code.
        code: DenialCode,
        /// Extra user-facing context (e.g. the audit-expired message).
        #[serde(default)]
        message: Option<String>,
    },
}

/// Course-level celebration switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Celebrations {
    /// Celebrate when the learner first crosses into a new section.
    #[serde(default)]
    pub first_section: bool,
}

/// Top-level course record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course key.
    pub id: CourseId,
    /// Sections in outline order.
    #[serde(default)]
    pub section_ids: Vec<SectionId>,
    /// Whether courseware may be shown.
    #[serde(default)]
    pub access: Access,
    /// Course start as an RFC 3339 timestamp.
    #[serde(default)]
    pub start: Option<String>,
    /// Celebration switches.
    #[serde(default)]
    pub celebrations: Celebrations,
}

impl Course {
    /// Course with the given sections and open access.
    pub fn new(id: impl Into<CourseId>, section_ids: Vec<SectionId>) -> Self {
        Self {
            id: id.into(),
            section_ids,
            access: Access::Allowed,
            start: None,
            celebrations: Celebrations::default(),
        }
    }
}

/// Chapter-like group of sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section id.
    pub id: SectionId,
    /// Child sequences in order; may be empty.
    #[serde(default)]
    pub sequence_ids: Vec<SequenceId>,
}

/// Lesson-level group of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    /// Sequence id.
    pub id: SequenceId,
    /// Owning section.
    pub section_id: SectionId,
    /// Units in order, unique.
    #[serde(default)]
    pub unit_ids: Vec<UnitId>,
    /// Last visited position (0-based).
    #[serde(default)]
    pub active_unit_index: Option<usize>,
    /// Timed exam served outside the player.
    #[serde(default)]
    pub is_time_limited: bool,
    /// Where a timed exam is served.
    #[serde(default)]
    pub exam_url: Option<String>,
    /// Whether position changes are persisted.
    #[serde(default = "yes")]
    pub save_unit_position: bool,
    /// Content gating lock (prerequisite not met).
    #[serde(default)]
    pub gated: bool,
}

impl Sequence {
    /// Plain sequence with position saving on.
    pub fn new(
        id: impl Into<SequenceId>,
        section_id: impl Into<SectionId>,
        unit_ids: Vec<UnitId>,
    ) -> Self {
        Self {
            id: id.into(),
            section_id: section_id.into(),
            unit_ids,
            active_unit_index: None,
            is_time_limited: false,
            exam_url: None,
            save_unit_position: true,
            gated: false,
        }
    }

    /// Unit to land on when only the sequence is known.
    ///
    /// Out-of-range or absent positions fall back to the first unit.
    pub fn active_unit(&self) -> Option<&UnitId> {
        self.active_unit_index
            .and_then(|idx| self.unit_ids.get(idx))
            .or_else(|| self.unit_ids.first())
    }

    /// Position of `unit` within this sequence.
    pub fn index_of(&self, unit: &UnitId) -> Option<usize> {
        self.unit_ids.iter().position(|u| u == unit)
    }

    /// Exam URL when this sequence must be served outside the player.
    pub fn special_exam_url(&self) -> Option<&str> {
        if self.is_time_limited {
            self.exam_url.as_deref()
        } else {
            None
        }
    }
}

const fn yes() -> bool {
    true
}

/// Smallest navigable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit id.
    pub id: UnitId,
    /// Owning sequence.
    pub sequence_id: SequenceId,
}

impl Unit {
    /// Unit owned by `sequence_id`.
    pub fn new(id: impl Into<UnitId>, sequence_id: impl Into<SequenceId>) -> Self {
        Self {
            id: id.into(),
            sequence_id: sequence_id.into(),
        }
    }
}

/// Server-suggested place to resume. The `section_id` slot may hold any block
/// id the backend chooses to report; it is resolved like a route component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResumePoint {
    /// Block the learner was last in.
    #[serde(default)]
    pub section_id: Option<SectionId>,
    /// Unit the learner was last on.
    #[serde(default)]
    pub unit_id: Option<UnitId>,
}

impl ResumePoint {
    /// Resume point naming a block and unit.
    pub fn at(section_id: impl Into<SectionId>, unit_id: impl Into<UnitId>) -> Self {
        Self {
            section_id: Some(section_id.into()),
            unit_id: Some(unit_id.into()),
        }
    }
}
