//! Bounded priority queue of prompts waiting for the speech output.
//!
//! Ordering is strict priority, FIFO within a priority tier. The queue is
//! deliberately tiny (3 by default): anything that cannot be spoken soon is
//! stale, so overflow drops rather than grows.
//!
//! # Example
//!
//! ```rust
//! use runaway_coach::prompt::{EnqueueOutcome, Priority, PromptCategory, PromptQueue, PromptSource, QueuedPrompt};
//!
//! let mut queue = PromptQueue::new(2);
//! let low = QueuedPrompt::new("low", Priority::Low, 0.0, PromptSource::Announcement(1), PromptCategory::Announcement);
//! let high = QueuedPrompt::new("high", Priority::High, 1.0, PromptSource::Announcement(2), PromptCategory::Announcement);
//!
//! assert_eq!(queue.enqueue(low), EnqueueOutcome::Admitted);
//! assert_eq!(queue.enqueue(high), EnqueueOutcome::Admitted);
//! assert_eq!(queue.dequeue().map(|p| p.message), Some("high".to_string()));
//! ```

use crate::prompt::types::QueuedPrompt;

// ---------------------------------------------------------------------------
// EnqueueOutcome
// ---------------------------------------------------------------------------

/// Result of [`PromptQueue::enqueue`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    Admitted,
    /// Admitted after evicting the contained lower-priority prompt.
    AdmittedWithEviction(QueuedPrompt),
    /// A prompt from the same source is already pending.
    Duplicate,
    /// The queue is full of equal-or-higher priority prompts.
    Dropped,
    /// Rejected before reaching the queue (paused, muted or disabled coach).
    Suppressed,
}

impl EnqueueOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(
            self,
            EnqueueOutcome::Admitted | EnqueueOutcome::AdmittedWithEviction(_)
        )
    }
}

// ---------------------------------------------------------------------------
// PromptQueue
// ---------------------------------------------------------------------------

/// Fixed-capacity prompt queue.
///
/// ## Overflow behaviour
///
/// When full, the lowest-priority, oldest entry is evicted only if it is
/// strictly lower than the incoming prompt; otherwise the incoming prompt is
/// dropped. An equal-or-higher priority entry is never evicted.
#[derive(Debug)]
pub struct PromptQueue {
    entries: Vec<QueuedPrompt>,
    capacity: usize,
    next_sequence: u64,
}

impl PromptQueue {
    /// Create a queue holding at most `capacity` prompts (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            next_sequence: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Offer `prompt` to the queue.
    pub fn enqueue(&mut self, mut prompt: QueuedPrompt) -> EnqueueOutcome {
        if self.entries.iter().any(|p| p.source == prompt.source) {
            return EnqueueOutcome::Duplicate;
        }

        let mut evicted = None;
        if self.is_full() {
            match self.eviction_candidate() {
                Some(idx) if self.entries[idx].priority < prompt.priority => {
                    evicted = Some(self.entries.remove(idx));
                }
                _ => return EnqueueOutcome::Dropped,
            }
        }

        prompt.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(prompt);

        match evicted {
            Some(old) => EnqueueOutcome::AdmittedWithEviction(old),
            None => EnqueueOutcome::Admitted,
        }
    }

    /// Remove and return the highest-priority, oldest prompt.
    pub fn dequeue(&mut self) -> Option<QueuedPrompt> {
        let idx = self.head_index()?;
        Some(self.entries.remove(idx))
    }

    /// The prompt [`dequeue`](Self::dequeue) would return.
    pub fn peek(&self) -> Option<&QueuedPrompt> {
        self.head_index().map(|idx| &self.entries[idx])
    }

    /// Pending prompts in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedPrompt> {
        self.entries.iter()
    }

    /// Drop every pending prompt.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Drop every pending prompt that is not `Critical`; returns how many.
    pub fn retain_critical(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| p.priority.is_critical());
        before - self.entries.len()
    }

    /// Change the capacity, evicting lowest-priority oldest entries if the
    /// queue now holds too many.
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<QueuedPrompt> {
        self.capacity = capacity.max(1);
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.eviction_candidate() {
                Some(idx) => evicted.push(self.entries.remove(idx)),
                None => break,
            }
        }
        evicted
    }

    // -- helpers ------------------------------------------------------------

    /// Highest priority; oldest within the tier.
    fn head_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| b.sequence.cmp(&a.sequence))
            })
            .map(|(idx, _)| idx)
    }

    /// Lowest priority; oldest within the tier.
    fn eviction_candidate(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| a.sequence.cmp(&b.sequence))
            })
            .map(|(idx, _)| idx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::types::{Priority, PromptCategory, PromptSource};

    fn prompt(id: u64, priority: Priority) -> QueuedPrompt {
        QueuedPrompt::new(
            format!("p{id}"),
            priority,
            id as f64,
            PromptSource::Announcement(id),
            PromptCategory::Announcement,
        )
    }

    fn messages(q: &mut PromptQueue) -> Vec<String> {
        std::iter::from_fn(|| q.dequeue()).map(|p| p.message).collect()
    }

    #[test]
    fn dequeues_by_priority_then_fifo() {
        let mut q = PromptQueue::new(5);
        q.enqueue(prompt(1, Priority::Low));
        q.enqueue(prompt(2, Priority::High));
        q.enqueue(prompt(3, Priority::Medium));
        q.enqueue(prompt(4, Priority::High));
        q.enqueue(prompt(5, Priority::Critical));

        assert_eq!(messages(&mut q), ["p5", "p2", "p4", "p3", "p1"]);
    }

    #[test]
    fn peek_matches_dequeue() {
        let mut q = PromptQueue::new(3);
        q.enqueue(prompt(1, Priority::Medium));
        q.enqueue(prompt(2, Priority::High));
        assert_eq!(q.peek().map(|p| p.message.clone()), Some("p2".into()));
        assert_eq!(q.dequeue().map(|p| p.message), Some("p2".into()));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let mut q = PromptQueue::new(3);
        assert_eq!(q.enqueue(prompt(1, Priority::Low)), EnqueueOutcome::Admitted);
        assert_eq!(q.enqueue(prompt(1, Priority::High)), EnqueueOutcome::Duplicate);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn full_queue_drops_equal_or_lower_incoming() {
        // [high, medium, medium] + low → dropped
        let mut q = PromptQueue::new(3);
        q.enqueue(prompt(1, Priority::High));
        q.enqueue(prompt(2, Priority::Medium));
        q.enqueue(prompt(3, Priority::Medium));

        assert_eq!(q.enqueue(prompt(4, Priority::Low)), EnqueueOutcome::Dropped);
        assert_eq!(q.enqueue(prompt(5, Priority::Medium)), EnqueueOutcome::Dropped);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn full_queue_evicts_lowest_oldest_for_higher_incoming() {
        let mut q = PromptQueue::new(3);
        q.enqueue(prompt(1, Priority::High));
        q.enqueue(prompt(2, Priority::Medium));
        q.enqueue(prompt(3, Priority::Medium));

        match q.enqueue(prompt(4, Priority::Critical)) {
            EnqueueOutcome::AdmittedWithEviction(old) => assert_eq!(old.message, "p2"),
            other => panic!("expected eviction, got {other:?}"),
        }
        assert_eq!(q.len(), 3);
        assert_eq!(messages(&mut q), ["p4", "p1", "p3"]);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut q = PromptQueue::new(3);
        let tiers = [Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        for id in 0..40 {
            q.enqueue(prompt(id, tiers[(id as usize * 7) % tiers.len()]));
            assert!(q.len() <= 3);
        }
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut q = PromptQueue::new(0);
        assert_eq!(q.capacity(), 1);
        assert!(q.enqueue(prompt(1, Priority::Low)).is_admitted());
        assert!(q.is_full());
    }

    #[test]
    fn retain_critical_flushes_the_rest() {
        let mut q = PromptQueue::new(4);
        q.enqueue(prompt(1, Priority::High));
        q.enqueue(prompt(2, Priority::Critical));
        q.enqueue(prompt(3, Priority::Low));

        assert_eq!(q.retain_critical(), 2);
        assert_eq!(messages(&mut q), ["p2"]);
    }

    #[test]
    fn shrinking_capacity_evicts_lowest() {
        let mut q = PromptQueue::new(3);
        q.enqueue(prompt(1, Priority::Low));
        q.enqueue(prompt(2, Priority::High));
        q.enqueue(prompt(3, Priority::Medium));

        let evicted = q.set_capacity(1);
        assert_eq!(evicted.len(), 2);
        assert_eq!(q.peek().map(|p| p.message.clone()), Some("p2".into()));
    }

    #[test]
    fn clear_empties_queue() {
        let mut q = PromptQueue::new(3);
        q.enqueue(prompt(1, Priority::Low));
        q.enqueue(prompt(2, Priority::Critical));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
