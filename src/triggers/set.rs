//! Arena of trigger records owned by the engine.

use crate::config::CoachConfig;
use crate::triggers::kind::{TriggerKind, TriggerTag};
use crate::triggers::trigger::{Trigger, TriggerId};

/// Registration order of the built-in triggers.
const BUILT_IN: [TriggerTag; 5] = [
    TriggerTag::Split,
    TriggerTag::PaceDrift,
    TriggerTag::ZoneTransition,
    TriggerTag::ZoneDuration,
    TriggerTag::CheckIn,
];

/// Triggers indexed by [`TriggerId`], mutated only by the tick loop.
#[derive(Debug, Clone, Default)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in triggers configured from `config`.
    pub fn from_config(config: &CoachConfig) -> Self {
        let mut set = Self::new();
        for tag in BUILT_IN {
            set.register(TriggerKind::from_config(tag, config));
        }
        set.apply_config(config);
        set
    }

    /// Add a trigger and return its id.
    pub fn register(&mut self, kind: TriggerKind) -> TriggerId {
        let id = TriggerId(self.triggers.len());
        self.triggers.push(Trigger::new(id, kind, 0.0));
        id
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id.0)
    }

    pub fn get_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// First trigger of the given variant.
    pub fn find(&self, tag: TriggerTag) -> Option<TriggerId> {
        self.triggers.iter().find(|t| t.tag() == tag).map(|t| t.id)
    }

    /// Ids by descending priority, registration order within a tier.
    pub fn evaluation_order(&self) -> Vec<TriggerId> {
        let mut ids: Vec<_> = self.triggers.iter().map(|t| (t.priority, t.id)).collect();
        // sort_by is stable
        ids.sort_by(|a, b| b.0.cmp(&a.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Re-read enabled flags, cooldowns and thresholds from `config`.
    ///
    /// A trigger that gets switched off loses its in-progress state (pending
    /// split, zone streak); its cooldown bookkeeping and a fault are kept.
    pub fn apply_config(&mut self, config: &CoachConfig) {
        for trigger in &mut self.triggers {
            let params = trigger.kind.apply_config(config);
            if trigger.enabled && !params.enabled {
                trigger.reset_transient();
            }
            trigger.enabled = params.enabled;
            trigger.cooldown_secs = params.cooldown_secs;
        }
    }

    /// Ids of triggers disabled by an evaluation error.
    pub fn faulted(&self) -> Vec<TriggerId> {
        self.triggers
            .iter()
            .filter(|t| t.faulted)
            .map(|t| t.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitAnnouncement;
    use crate::prompt::Priority;

    #[test]
    fn built_in_set_has_all_variants() {
        let set = TriggerSet::from_config(&CoachConfig::default());
        assert_eq!(set.len(), 5);
        for tag in BUILT_IN {
            assert!(set.find(tag).is_some(), "{}", tag.label());
        }
        assert!(set.iter().all(|t| t.enabled));
    }

    #[test]
    fn evaluation_order_is_priority_then_registration() {
        let set = TriggerSet::from_config(&CoachConfig::default());
        let tags: Vec<_> = set
            .evaluation_order()
            .into_iter()
            .filter_map(|id| set.get(id).map(|t| t.tag()))
            .collect();
        assert_eq!(
            tags,
            [
                TriggerTag::PaceDrift,
                TriggerTag::ZoneDuration,
                TriggerTag::CheckIn,
                TriggerTag::Split,
                TriggerTag::ZoneTransition,
            ]
        );
    }

    #[test]
    fn cooldowns_come_from_engine_config() {
        let mut cfg = CoachConfig::default();
        cfg.engine.split_cooldown_secs = 12.0;
        let set = TriggerSet::from_config(&cfg);
        let split = set.find(TriggerTag::Split).and_then(|id| set.get(id));
        assert_eq!(split.map(|t| t.cooldown_secs), Some(12.0));
        assert_eq!(split.map(|t| t.priority), Some(Priority::Medium));
    }

    #[test]
    fn disabling_keeps_fault_and_cooldown() {
        let mut cfg = CoachConfig::default();
        let mut set = TriggerSet::from_config(&cfg);
        let id = set.find(TriggerTag::Split).unwrap();
        {
            let t = set.get_mut(id).unwrap();
            t.faulted = true;
            t.last_fired_at = Some(42.0);
        }

        cfg.coach.announce_splits = SplitAnnouncement::Off;
        set.apply_config(&cfg);
        cfg.coach.announce_splits = SplitAnnouncement::Basic;
        set.apply_config(&cfg);

        let t = set.get(id).unwrap();
        assert!(t.enabled);
        assert!(t.faulted);
        assert!(!t.is_active());
        assert_eq!(t.last_fired_at, Some(42.0));
        assert_eq!(set.faulted(), vec![id]);
    }
}
