// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! courseware-core: resolves partial courseware URLs to canonical
//! `/course/{course}/{sequence}/{unit}` positions.
//!
//! The hierarchy (course, sections, sequences, units) loads lazily, so a route
//! is re-evaluated every time the store changes. The pure rule table in
//! [`resolver`] decides what the route *should* be; [`CoursewareEngine`] turns
//! that into fetches, history replaces and progress effects, with an
//! [`EffectGuard`] making each effect fire once per distinct input.
#![forbid(unsafe_code)]

pub mod access;
pub mod effects;
pub mod engine;
pub mod guard;
pub mod ids;
pub mod model;
pub mod navigation;
pub mod ports;
pub mod resolver;
pub mod route;
pub mod sandbox;
pub mod store;

pub use access::{denial_redirect, format_start_date, DenialCode};
pub use effects::{Effect, EffectsRunner, PortEffectsRunner, RecordingRunner};
pub use engine::CoursewareEngine;
pub use guard::{EffectGuard, EffectSlot, GuardKey};
pub use ids::{BlockId, CourseId, SectionId, SequenceId, UnitId};
pub use model::{
    Access, Celebrations, Course, CourseStatus, LoadStatus, ResumePoint, Section, Sequence, Unit,
};
pub use navigation::{navigation_metadata, NavAction, NavigationMetadata};
pub use ports::{FetchPort, HistoryPort, ProgressPort};
pub use resolver::{
    applicable_rules, evaluate_rules, resolve, resume_target, rules, Correction, Resolution,
    ResolutionRule, RuleKind,
};
pub use route::{CoursewareRef, RouteError};
pub use sandbox::{HistoryEntry, ProgressLog, Sandbox, Settled, WorldFixture};
pub use store::{HierarchySnapshot, HierarchyStore, MemoryStore, SnapshotError};

/// Re-exported so hosts can build an engine without naming the config crate.
pub use courseware_app_core::prefs::{DateStyle, PlayerPrefs};
