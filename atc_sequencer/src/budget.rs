//! Cycle settle-time budget.
//!
//! Spindle spin-down and rack travel run concurrently with the first Z
//! move, so their requirements combine by maximum, not by sum. Time that
//! has already passed (interim dwells, motion settle) is credited against
//! every outstanding requirement at once.
//!
//! Invariant: once `require(d)` was called, no dependent move is issued
//! before `d` has elapsed, counted from the `require` call.

use std::time::Duration;

/// Outstanding settle time for the current cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleTimeBudget {
    remaining: Duration,
}

impl CycleTimeBudget {
    pub const fn new() -> Self {
        Self {
            remaining: Duration::ZERO,
        }
    }

    /// Register a requirement starting now. Raises the floor, never lowers it.
    pub fn require(&mut self, settle: Duration) {
        self.remaining = self.remaining.max(settle);
    }

    /// Credit time that has passed since requirements were registered.
    pub fn elapse(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    /// Time still to wait before a dependent move.
    #[inline]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.remaining.is_zero()
    }
}
