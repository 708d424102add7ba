//! Undo/redo over full-state snapshots.
//!
//! # Responsibility
//! - Keep an ordered stack of immutable graph snapshots and an undo pointer.
//! - Discard the redo branch whenever a new edit is recorded.
//!
//! # Invariants
//! - The stack is never empty; entry 0 is the session baseline.
//! - `index` always points at the snapshot equal to the live store after
//!   every completed edit.
//! - Depth is capped; the oldest entries are dropped first.

use crate::settings::DEFAULT_HISTORY_LIMIT;
use crate::store::GraphSnapshot;
use log::debug;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<GraphSnapshot>,
    index: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(GraphSnapshot::default(), DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Starts a history whose baseline is `initial`.
    pub fn new(initial: GraphSnapshot, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            limit: limit.max(1),
        }
    }

    /// Drops every entry and starts again from `baseline`.
    pub fn reset(&mut self, baseline: GraphSnapshot) {
        self.entries.clear();
        self.entries.push(baseline);
        self.index = 0;
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.enforce_limit();
    }

    /// Records the state after a completed edit.
    ///
    /// Entries after the pointer (the redo branch) are discarded.
    pub fn save(&mut self, snapshot: GraphSnapshot) {
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        self.index = self.entries.len() - 1;
        self.enforce_limit();
        debug!(
            "event=history_save module=history status=ok depth={} index={}",
            self.entries.len(),
            self.index
        );
    }

    /// Moves the pointer back; returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<GraphSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Moves the pointer forward; returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<GraphSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Snapshot at the undo pointer.
    pub fn current(&self) -> &GraphSnapshot {
        &self.entries[self.index]
    }

    fn enforce_limit(&mut self) {
        // +1: the baseline entry does not count against the limit.
        let max_entries = self.limit + 1;
        if self.entries.len() > max_entries {
            let overflow = self.entries.len() - max_entries;
            self.entries.drain(..overflow);
            self.index = self.index.saturating_sub(overflow);
        }
    }
}
