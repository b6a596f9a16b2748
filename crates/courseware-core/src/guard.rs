// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Idempotence Guard: a keyed memo table for side effects.
//!
//! Each effect class owns one slot holding the last key it fired for.
//! Re-evaluating with the same key is a no-op, any other key fires again.
//! Evaluation re-runs on every store update, so this table is what keeps
//! redirects from looping and fetches from repeating.

use rustc_hash::FxHashMap;

use crate::resolver::RuleKind;

/// Identity of a guarded effect class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectSlot {
    /// Course metadata fetch.
    FetchCourse,
    /// Sequence metadata fetch.
    FetchSequence,
    /// Correction issued by a resolver rule.
    Redirect(RuleKind),
    /// Access-denial redirect.
    AccessDenied,
    /// Position persistence.
    SavePosition,
}

/// Ordered key parts; `None` parts keep absent ids distinct from empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GuardKey(Vec<Option<String>>);

impl GuardKey {
    /// Empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a present part.
    pub fn with(mut self, part: impl AsRef<str>) -> Self {
        self.0.push(Some(part.as_ref().to_owned()));
        self
    }

    /// Append an optional part.
    pub fn with_opt<T: AsRef<str>>(mut self, part: Option<T>) -> Self {
        self.0.push(part.map(|p| p.as_ref().to_owned()));
        self
    }
}

/// Memo table from effect slot to the last key it fired for.
#[derive(Debug, Default)]
pub struct EffectGuard {
    seen: FxHashMap<EffectSlot, GuardKey>,
}

impl EffectGuard {
    /// Fresh guard; every slot fires on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `effect` unless `slot` last fired for `key`. Returns whether it ran.
    pub fn guard<F>(&mut self, slot: EffectSlot, key: GuardKey, effect: F) -> bool
    where
        F: FnOnce(),
    {
        if self.seen.get(&slot) == Some(&key) {
            return false;
        }
        self.seen.insert(slot, key);
        effect();
        true
    }

    /// Record `key` for `slot` without running anything.
    ///
    /// Used when the inputs changed but there is nothing to do for them, so a
    /// later return to the previous inputs counts as a change.
    pub fn observe(&mut self, slot: EffectSlot, key: GuardKey) {
        self.seen.insert(slot, key);
    }

    /// Drop the memo for `slot`.
    pub fn forget(&mut self, slot: EffectSlot) {
        self.seen.remove(&slot);
    }

    /// Last key recorded for `slot`.
    pub fn last_key(&self, slot: EffectSlot) -> Option<&GuardKey> {
        self.seen.get(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_fires_once() {
        let mut guard = EffectGuard::new();
        let mut calls = 0;
        let key = GuardKey::new().with("C");
        assert!(guard.guard(EffectSlot::FetchCourse, key.clone(), || calls += 1));
        assert!(!guard.guard(EffectSlot::FetchCourse, key, || calls += 1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn changed_key_fires_again() {
        let mut guard = EffectGuard::new();
        let mut calls = 0;
        guard.guard(EffectSlot::FetchCourse, GuardKey::new().with("A"), || calls += 1);
        guard.guard(EffectSlot::FetchCourse, GuardKey::new().with("B"), || calls += 1);
        guard.guard(EffectSlot::FetchCourse, GuardKey::new().with("A"), || calls += 1);
        assert_eq!(calls, 3);
    }

    #[test]
    fn slots_are_independent() {
        let mut guard = EffectGuard::new();
        let key = GuardKey::new().with("X");
        assert!(guard.guard(EffectSlot::FetchCourse, key.clone(), || {}));
        assert!(guard.guard(EffectSlot::FetchSequence, key, || {}));
    }

    #[test]
    fn forget_rearms_a_slot() {
        let mut guard = EffectGuard::new();
        let slot = EffectSlot::Redirect(RuleKind::Resume);
        let key = GuardKey::new().with("C");
        assert!(guard.guard(slot, key.clone(), || {}));
        guard.forget(slot);
        assert!(guard.guard(slot, key, || {}));
    }

    #[test]
    fn absent_parts_differ_from_empty_parts() {
        let none = GuardKey::new().with_opt(None::<&str>);
        let empty = GuardKey::new().with("");
        assert_ne!(none, empty);
        let mut guard = EffectGuard::new();
        guard.observe(EffectSlot::FetchSequence, none.clone());
        assert_eq!(guard.last_key(EffectSlot::FetchSequence), Some(&none));
        assert!(guard.guard(EffectSlot::FetchSequence, empty, || {}));
    }
}
