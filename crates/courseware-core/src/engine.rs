// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Effectful shell around the pure resolver.
//!
//! `evaluate` is called on every route change and every store update. It
//! reads the store, asks the rule table for a correction and returns the
//! effects that still need to happen; the [`EffectGuard`] filters out
//! everything that already happened for the same inputs.

use courseware_app_core::prefs::PlayerPrefs;
use tracing::{debug, info, warn};

use crate::access::denial_redirect;
use crate::effects::{Effect, EffectsRunner};
use crate::guard::{EffectGuard, EffectSlot, GuardKey};
use crate::ids::CourseId;
use crate::model::{CourseStatus, LoadStatus, ResumePoint};
use crate::navigation::{self, NavAction};
use crate::resolver::{evaluate_rules, resume_target, Correction, Resolution, RuleKind};
use crate::route::CoursewareRef;
use crate::store::HierarchyStore;

/// Navigation engine: prefs plus the idempotence memo.
#[derive(Debug, Default)]
pub struct CoursewareEngine {
    prefs: PlayerPrefs,
    guard: EffectGuard,
}

impl CoursewareEngine {
    /// Engine with a fresh guard.
    pub fn new(prefs: PlayerPrefs) -> Self {
        Self {
            prefs,
            guard: EffectGuard::new(),
        }
    }

    /// Active preferences.
    pub fn prefs(&self) -> &PlayerPrefs {
        &self.prefs
    }

    /// Read access to the memo table.
    pub fn guard(&self) -> &EffectGuard {
        &self.guard
    }

    /// One evaluation pass over a consistent store snapshot.
    pub fn evaluate(&mut self, store: &dyn HierarchyStore, route: &CoursewareRef) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.fetch_triggers(route, &mut effects);

        let course_id = route.course_id();
        if store.course_status(course_id) == CourseStatus::Denied {
            let key = GuardKey::new().with(course_id).with_opt(route.unit_id());
            let target = denial_redirect(
                course_id,
                store.course(course_id),
                route.unit_id(),
                &self.prefs,
            );
            self.guard.guard(EffectSlot::AccessDenied, key, || {
                info!(course = %course_id, %target, "course access denied");
                effects.push(Effect::Replace { path: target });
            });
            return effects;
        }

        self.apply_rules(store, route, &mut effects);
        self.persist_position(store, route, &mut effects);
        effects
    }

    /// Deliver the resume point fetched for `course_id`.
    ///
    /// Dropped when the route has moved on since the fetch was issued.
    pub fn on_resume_point(
        &mut self,
        store: &dyn HierarchyStore,
        route: &CoursewareRef,
        course_id: &CourseId,
        point: &ResumePoint,
    ) -> Vec<Effect> {
        if route.course_id() != course_id || route.block_id().is_some() {
            warn!(course = %course_id, route = %route, "dropping stale resume point");
            return Vec::new();
        }
        match resume_target(store, course_id, point) {
            Some(target) => {
                debug!(from = %route, to = %target, "resume");
                vec![Effect::Replace {
                    path: target.to_string(),
                }]
            }
            None => {
                debug!(course = %course_id, "course has no sequences to resume into");
                Vec::new()
            }
        }
    }

    /// Effects for a user navigation action.
    pub fn navigate(
        &self,
        store: &dyn HierarchyStore,
        route: &CoursewareRef,
        action: &NavAction,
    ) -> Vec<Effect> {
        let effects = navigation::navigate(store, route, action, self.prefs.celebrations_enabled);
        if effects.is_empty() {
            debug!(%route, %action, "nowhere to navigate");
        }
        effects
    }

    /// Evaluate and hand the result to `runner`.
    pub fn drive(
        &mut self,
        store: &dyn HierarchyStore,
        route: &CoursewareRef,
        runner: &mut dyn EffectsRunner,
    ) {
        let effects = self.evaluate(store, route);
        if !effects.is_empty() {
            runner.run(effects);
        }
    }

    fn fetch_triggers(&mut self, route: &CoursewareRef, effects: &mut Vec<Effect>) {
        let course_id = route.course_id();
        self.guard
            .guard(EffectSlot::FetchCourse, GuardKey::new().with(course_id), || {
                effects.push(Effect::FetchCourse {
                    course_id: course_id.clone(),
                });
            });

        let key = GuardKey::new().with_opt(route.block_id());
        match route.sequence_id() {
            Some(sequence_id) => {
                self.guard.guard(EffectSlot::FetchSequence, key, || {
                    effects.push(Effect::FetchSequence { sequence_id });
                });
            }
            None => self.guard.observe(EffectSlot::FetchSequence, key),
        }
    }

    fn apply_rules(
        &mut self,
        store: &dyn HierarchyStore,
        route: &CoursewareRef,
        effects: &mut Vec<Effect>,
    ) {
        let resolution = evaluate_rules(store, route);
        let winner = resolution.as_ref().map(|r| r.rule);
        for kind in RuleKind::ALL {
            if Some(kind) != winner {
                self.guard.forget(EffectSlot::Redirect(kind));
            }
        }
        let Some(Resolution { rule, correction }) = resolution else {
            return;
        };
        let slot = EffectSlot::Redirect(rule);
        let route_key = GuardKey::new().with(route.to_string());
        match correction {
            None => self.guard.observe(slot, route_key),
            Some(Correction::RequestResume(course_id)) => {
                let key = GuardKey::new().with(&course_id);
                let fired = self.guard.guard(slot, key, || {
                    effects.push(Effect::FetchResumePoint { course_id });
                });
                if fired {
                    debug!(%route, "requested resume point");
                }
            }
            Some(Correction::Replace(target)) => {
                let path = target.to_string();
                let fired = self.guard.guard(slot, route_key.with(&path), || {
                    effects.push(Effect::Replace { path });
                });
                if fired {
                    debug!(from = %route, to = %target, ?rule, "normalized route");
                } else {
                    debug!(%route, ?rule, "correction already issued");
                }
            }
            Some(Correction::LeaveApp { url }) => {
                let key = GuardKey::new()
                    .with(route.course_id())
                    .with_opt(route.block_id())
                    .with(&url);
                self.guard.guard(slot, key, || {
                    info!(%route, %url, "leaving player for special exam");
                    effects.push(Effect::LeaveApp { url });
                });
            }
        }
    }

    fn persist_position(
        &mut self,
        store: &dyn HierarchyStore,
        route: &CoursewareRef,
        effects: &mut Vec<Effect>,
    ) {
        if !self.prefs.persist_positions {
            return;
        }
        let (Some(sequence_id), Some(unit_id)) = (route.sequence_id(), route.unit_id()) else {
            return;
        };
        if store.sequence_status(&sequence_id) != LoadStatus::Loaded {
            return;
        }
        let Some(sequence) = store.sequence(&sequence_id) else {
            return;
        };
        if !sequence.save_unit_position {
            return;
        }
        let Some(unit_index) = sequence.index_of(unit_id) else {
            return;
        };
        let key = GuardKey::new()
            .with(route.course_id())
            .with(&sequence_id)
            .with(unit_id);
        self.guard.guard(EffectSlot::SavePosition, key, || {
            effects.push(Effect::SavePosition {
                course_id: route.course_id().clone(),
                sequence_id,
                unit_index,
            });
        });
    }
}
