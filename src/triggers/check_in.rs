//! Periodic "how are you feeling" check-ins.

use crate::triggers::kind::EvalContext;

const QUESTIONS: &[&str] = &[
    "How are you feeling?",
    "Quick check-in. How's the run going?",
    "How do your legs feel right now?",
    "How's your energy?",
];

/// Fires every `interval_secs` of run time, first at `elapsed >= interval`.
///
/// The wording rotates through a fixed list. The answer is picked up by the
/// voice coordinator, which arms its pending question once the prompt is
/// actually dispatched to speech.
#[derive(Debug, Clone)]
pub struct CheckInTrigger {
    /// `0` disables check-ins.
    pub interval_secs: u64,
    asked: usize,
}

impl Default for CheckInTrigger {
    fn default() -> Self {
        Self::new(600)
    }
}

impl CheckInTrigger {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            asked: 0,
        }
    }

    pub(crate) fn should_fire(&self, ctx: &EvalContext<'_>) -> bool {
        self.interval_secs > 0 && ctx.snapshot.elapsed_secs >= self.interval_secs as f64
    }

    pub(crate) fn generate_prompt(&self) -> String {
        QUESTIONS[self.asked % QUESTIONS.len()].to_string()
    }

    pub(crate) fn on_fired(&mut self) {
        self.asked += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{DistanceUnit, RunStateSnapshot};

    fn ctx(snapshot: &RunStateSnapshot) -> EvalContext<'_> {
        EvalContext {
            snapshot,
            new_splits: &[],
            splits: &[],
            unit: DistanceUnit::Kilometers,
        }
    }

    #[test]
    fn waits_for_first_interval() {
        let t = CheckInTrigger::new(600);
        assert!(!t.should_fire(&ctx(&RunStateSnapshot::new(599.0, 0.0))));
        assert!(t.should_fire(&ctx(&RunStateSnapshot::new(600.0, 0.0))));
    }

    #[test]
    fn zero_interval_never_fires() {
        let t = CheckInTrigger::new(0);
        assert!(!t.should_fire(&ctx(&RunStateSnapshot::new(10_000.0, 0.0))));
    }

    #[test]
    fn wording_rotates() {
        let mut t = CheckInTrigger::new(60);
        let first = t.generate_prompt();
        t.on_fired();
        let second = t.generate_prompt();
        assert_ne!(first, second);
        for _ in 1..QUESTIONS.len() {
            t.on_fired();
        }
        assert_eq!(t.generate_prompt(), first);
    }
}
