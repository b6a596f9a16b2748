// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulated player host.
//!
//! A `Sandbox` owns a *world* (everything the backend could return) and a
//! *visible* store (what has been fetched so far). Effects flow through the
//! real port traits: a course fetch copies the outline (sections, sequences,
//! units) and a sequence fetch settles that sequence's status, history
//! calls move the route, progress calls are logged. Fetches resolve between
//! passes and resume points arrive one pass after they were requested, so
//! `settle` exercises the same re-evaluation loop a UI event loop would.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{Effect, EffectsRunner, PortEffectsRunner};
use crate::engine::CoursewareEngine;
use crate::ids::{CourseId, SequenceId, UnitId};
use crate::model::{CourseStatus, LoadStatus, ResumePoint};
use crate::navigation::NavAction;
use crate::ports::{FetchPort, HistoryPort, ProgressPort};
use crate::route::{CoursewareRef, RouteError};
use crate::store::{HierarchySnapshot, HierarchyStore, MemoryStore, SnapshotError};

/// Backend contents a sandbox serves from (CLI fixture format).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldFixture {
    /// Records and fetch outcomes.
    pub hierarchy: HierarchySnapshot,
    /// Resume point per course; missing means an empty point.
    pub resume: FxHashMap<CourseId, ResumePoint>,
}

/// One history call, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// Normalization.
    Replace(String),
    /// User navigation.
    Push(String),
    /// Left the application.
    Assign(String),
}

/// How a `settle` call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settled {
    /// No pass produced further effects.
    FixedPoint {
        /// Passes run.
        passes: usize,
    },
    /// The route left the player (denial redirect or exam).
    Exited {
        /// Final destination.
        target: String,
    },
    /// Pass budget ran out.
    Exhausted {
        /// Passes run.
        passes: usize,
    },
}

/// Progress calls the sandbox has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressLog {
    /// `(sequence, unit)` pairs reported as visited.
    pub completed: Vec<(SequenceId, UnitId)>,
    /// `(sequence, index)` positions persisted.
    pub saved: Vec<(SequenceId, usize)>,
    /// `(from, to)` celebration triggers.
    pub celebrations: Vec<(SequenceId, SequenceId)>,
}

impl ProgressPort for ProgressLog {
    fn check_completion(
        &mut self,
        _course_id: &CourseId,
        sequence_id: &SequenceId,
        unit_id: &UnitId,
    ) {
        self.completed.push((sequence_id.clone(), unit_id.clone()));
    }

    fn save_position(
        &mut self,
        _course_id: &CourseId,
        sequence_id: &SequenceId,
        unit_index: usize,
    ) {
        self.saved.push((sequence_id.clone(), unit_index));
    }

    fn celebrate(&mut self, from: &SequenceId, to: &SequenceId, _unit_id: Option<&UnitId>) {
        self.celebrations.push((from.clone(), to.clone()));
    }
}

struct Backend {
    world: MemoryStore,
    visible: MemoryStore,
    resume: FxHashMap<CourseId, ResumePoint>,
    pending_resume: Option<CourseId>,
}

impl FetchPort for Backend {
    fn fetch_course(&mut self, course_id: &CourseId) {
        let Some(course) = self.world.course(course_id).cloned() else {
            self.visible.set_course_status(course_id.clone(), CourseStatus::Failed);
            return;
        };
        for section_id in &course.section_ids {
            let Some(section) = self.world.section(section_id).cloned() else {
                continue;
            };
            for sequence_id in &section.sequence_ids {
                let Some(sequence) = self.world.sequence(sequence_id) else {
                    continue;
                };
                for unit_id in &sequence.unit_ids {
                    if let Some(unit) = self.world.unit(unit_id) {
                        self.visible.insert_unit(unit.clone());
                    }
                }
                // Outline records only; the status stays with fetch_sequence.
                self.visible.insert_sequence(sequence.clone());
            }
            self.visible.insert_section(section);
        }
        let status = match self.world.course_status(course_id) {
            CourseStatus::Loading => CourseStatus::Loaded,
            status => status,
        };
        self.visible.insert_course(course);
        self.visible.set_course_status(course_id.clone(), status);
    }

    fn fetch_sequence(&mut self, sequence_id: &SequenceId) {
        let failed = self.world.sequence_status(sequence_id) == LoadStatus::Failed;
        match self.world.sequence(sequence_id) {
            Some(sequence) if !failed => {
                for unit_id in &sequence.unit_ids {
                    if let Some(unit) = self.world.unit(unit_id) {
                        self.visible.insert_unit(unit.clone());
                    }
                }
                self.visible.insert_sequence(sequence.clone());
                self.visible
                    .set_sequence_status(sequence_id.clone(), LoadStatus::Loaded);
            }
            _ => self
                .visible
                .set_sequence_status(sequence_id.clone(), LoadStatus::Failed),
        }
    }

    fn fetch_resume_point(&mut self, course_id: &CourseId) {
        self.pending_resume = Some(course_id.clone());
    }
}

struct History {
    route: CoursewareRef,
    entries: Vec<HistoryEntry>,
    exit: Option<String>,
    redirect_prefix: String,
}

impl History {
    fn go(&mut self, path: &str) {
        if path.starts_with(&self.redirect_prefix) {
            self.exit = Some(path.to_owned());
            return;
        }
        match CoursewareRef::parse(path) {
            Ok(route) => self.route = route,
            Err(err) => {
                debug!(%path, %err, "route left the player");
                self.exit = Some(path.to_owned());
            }
        }
    }
}

impl HistoryPort for History {
    fn replace(&mut self, path: &str) {
        self.entries.push(HistoryEntry::Replace(path.to_owned()));
        self.go(path);
    }

    fn push(&mut self, path: &str) {
        self.entries.push(HistoryEntry::Push(path.to_owned()));
        self.go(path);
    }

    fn assign(&mut self, url: &str) {
        self.entries.push(HistoryEntry::Assign(url.to_owned()));
        self.exit = Some(url.to_owned());
    }
}

/// Simulated host driving a [`CoursewareEngine`].
pub struct Sandbox {
    engine: CoursewareEngine,
    backend: Backend,
    history: History,
    progress: ProgressLog,
    effects: Vec<Effect>,
}

impl Sandbox {
    /// Host serving `world`, starting at `route` with nothing fetched.
    pub fn new(
        engine: CoursewareEngine,
        world: WorldFixture,
        route: CoursewareRef,
    ) -> Result<Self, SnapshotError> {
        let redirect_prefix = engine.prefs().redirect_prefix.clone();
        Ok(Self {
            engine,
            backend: Backend {
                world: MemoryStore::from_snapshot(world.hierarchy)?,
                visible: MemoryStore::new(),
                resume: world.resume,
                pending_resume: None,
            },
            history: History {
                route,
                entries: Vec::new(),
                exit: None,
                redirect_prefix,
            },
            progress: ProgressLog::default(),
            effects: Vec::new(),
        })
    }

    /// Current route.
    pub fn route(&self) -> &CoursewareRef {
        &self.history.route
    }

    /// Where the player went when it left, if it did.
    pub fn exit(&self) -> Option<&str> {
        self.history.exit.as_deref()
    }

    /// Every history call so far.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history.entries
    }

    /// Progress calls so far.
    pub fn progress(&self) -> &ProgressLog {
        &self.progress
    }

    /// Every effect dispatched so far.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Records fetched so far.
    pub fn visible(&self) -> &dyn HierarchyStore {
        &self.backend.visible
    }

    /// Move the route as the user would by editing the address bar.
    pub fn visit(&mut self, path: &str) -> Result<(), RouteError> {
        self.history.route = CoursewareRef::parse(path)?;
        self.history.exit = None;
        Ok(())
    }

    /// Run evaluation passes until nothing changes, the player exits, or
    /// `max_settle_passes` is reached.
    pub fn settle(&mut self) -> Settled {
        let budget = self.engine.prefs().max_settle_passes;
        for pass in 0..budget {
            if let Some(target) = &self.history.exit {
                return Settled::Exited {
                    target: target.clone(),
                };
            }
            let mut effects = self
                .engine
                .evaluate(&self.backend.visible, &self.history.route);
            if let Some(course_id) = self.backend.pending_resume.take() {
                let point = self.backend.resume.get(&course_id).cloned().unwrap_or_default();
                effects.extend(self.engine.on_resume_point(
                    &self.backend.visible,
                    &self.history.route,
                    &course_id,
                    &point,
                ));
            }
            if effects.is_empty() {
                return Settled::FixedPoint { passes: pass };
            }
            self.dispatch(effects);
        }
        match &self.history.exit {
            Some(target) => Settled::Exited {
                target: target.clone(),
            },
            None => Settled::Exhausted { passes: budget },
        }
    }

    /// Run a navigation action from the current route.
    pub fn navigate(&mut self, action: &NavAction) {
        let effects = self
            .engine
            .navigate(&self.backend.visible, &self.history.route, action);
        self.dispatch(effects);
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        self.effects.extend(effects.iter().cloned());
        let saved_before = self.progress.saved.len();
        PortEffectsRunner::new(&mut self.backend, &mut self.progress, &mut self.history)
            .run(effects);
        for (sequence_id, index) in &self.progress.saved[saved_before..] {
            for store in [&mut self.backend.visible, &mut self.backend.world] {
                if let Some(sequence) = store.sequence_mut(sequence_id) {
                    sequence.active_unit_index = Some(*index);
                }
            }
        }
    }
}
