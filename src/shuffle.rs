use rand::RngExt;
use rand::rngs::SmallRng;
use std::collections::{BTreeMap, HashSet};

/// Bidirectional shuffle order, grown lazily around an anchor track.
///
/// Offsets relative to the anchor map to track indices. Moving to an offset
/// that was already visited replays the stored index instead of drawing new
/// randomness, so forward-then-backward walks retrace their own steps.
/// Fresh offsets sample uniformly from the indices not yet in the queue;
/// once every index has been used, sampling falls back to an unconstrained
/// draw so small libraries keep playing instead of deadlocking.
#[derive(Debug, Default)]
pub struct ShuffleQueue {
    enabled: bool,
    queue: BTreeMap<i32, usize>,
    cursor: i32,
    max_explored: i32,
    min_explored: i32,
}

impl ShuffleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns shuffling on, anchored at the given track. Offset 0 always maps
    /// to the anchor.
    pub fn enable(&mut self, anchor: usize) {
        self.enabled = true;
        self.rebuild(anchor);
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.queue.clear();
        self.cursor = 0;
        self.max_explored = 0;
        self.min_explored = 0;
    }

    /// Discards the explored order and restarts exploration from a new
    /// anchor. Called when the user explicitly selects a track, so the
    /// random walk originates from the most recent deliberate choice.
    pub fn reset_anchor(&mut self, anchor: usize) {
        if self.enabled {
            self.rebuild(anchor);
        }
    }

    /// Moves the cursor one step in `direction` (+1 or -1) and returns the
    /// track index at the new offset. Returns `None` for an empty library;
    /// the caller guards playlist emptiness one level up.
    pub fn advance(
        &mut self,
        direction: i32,
        track_count: usize,
        rng: &mut SmallRng,
    ) -> Option<usize> {
        if !self.enabled || track_count == 0 {
            return None;
        }

        let target = self.cursor + direction;
        if let Some(&index) = self.queue.get(&target) {
            self.cursor = target;
            return Some(index);
        }

        let index = self.sample_unused(track_count, rng);
        self.queue.insert(target, index);
        self.max_explored = self.max_explored.max(target);
        self.min_explored = self.min_explored.min(target);
        self.cursor = target;
        Some(index)
    }

    /// Inclusive offset range visited so far.
    pub fn explored_range(&self) -> (i32, i32) {
        (self.min_explored, self.max_explored)
    }

    pub fn cursor_offset(&self) -> i32 {
        self.cursor
    }

    pub fn explored_len(&self) -> usize {
        self.queue.len()
    }

    fn rebuild(&mut self, anchor: usize) {
        self.queue.clear();
        self.queue.insert(0, anchor);
        self.cursor = 0;
        self.max_explored = 0;
        self.min_explored = 0;
    }

    fn sample_unused(&self, track_count: usize, rng: &mut SmallRng) -> usize {
        let used: HashSet<usize> = self.queue.values().copied().collect();
        let unused: Vec<usize> = (0..track_count)
            .filter(|index| !used.contains(index))
            .collect();

        if unused.is_empty() {
            // Pool exhausted: repeats are allowed from here on.
            rng.random_range(0..track_count)
        } else {
            unused[rng.random_range(0..unused.len())]
        }
    }
}
