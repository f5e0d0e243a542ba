//! I/O Simulator for digital I/O simulation.
//!
//! The `IoSimulator` manages:
//! - Digital inputs and outputs addressed by `IoPoint`
//! - Linked input reactions (an output edge triggers a delayed input change)
//!
//! Time is the driver's virtual clock, expressed as a `Duration` since
//! power-up.

use atc_common::io::IoPoint;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, trace};

/// Reaction of an input to an output edge.
///
/// When the output changes to `trigger`, after `delay` the input is set
/// to `result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedInput {
    /// Output state that triggers this reaction.
    pub trigger: bool,
    /// Delay before the input changes.
    pub delay: Duration,
    /// Input to affect.
    pub input: IoPoint,
    /// State to set the input to.
    pub result: bool,
}

impl LinkedInput {
    /// Input that follows the output in both directions after `delay`.
    pub fn follow(input: IoPoint, delay: Duration) -> [Self; 2] {
        [true, false].map(|state| Self {
            trigger: state,
            delay,
            input,
            result: state,
        })
    }
}

/// Pending input change queued by a linked reaction.
#[derive(Debug, Clone, Copy)]
struct PendingInputChange {
    at: Duration,
    input: IoPoint,
    state: bool,
}

/// I/O Simulator for digital I/O.
#[derive(Debug, Default)]
pub struct IoSimulator {
    inputs: HashMap<IoPoint, bool>,
    outputs: HashMap<IoPoint, bool>,
    reactions: HashMap<IoPoint, Vec<LinkedInput>>,
    /// Sorted by `at`.
    pending: VecDeque<PendingInputChange>,
}

impl IoSimulator {
    /// Create a simulator with every point low and no reactions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reaction on `output`.
    pub fn link(&mut self, output: IoPoint, reaction: LinkedInput) {
        self.reactions.entry(output).or_default().push(reaction);
    }

    /// Force an input, cancelling any pending change for it.
    pub fn set_input(&mut self, input: IoPoint, state: bool) {
        self.pending.retain(|p| p.input != input);
        self.inputs.insert(input, state);
    }

    /// Current input state. Unknown points read low.
    pub fn input(&self, input: IoPoint) -> bool {
        self.inputs.get(&input).copied().unwrap_or(false)
    }

    /// Last written output state. Unknown points read low.
    pub fn output(&self, output: IoPoint) -> bool {
        self.outputs.get(&output).copied().unwrap_or(false)
    }

    /// Write an output at virtual time `now` and queue linked reactions on
    /// an edge.
    pub fn write(&mut self, output: IoPoint, state: bool, now: Duration) {
        let prev = self.outputs.insert(output, state).unwrap_or(false);
        if prev == state {
            return;
        }

        let Some(reactions) = self.reactions.get(&output) else {
            return;
        };
        for reaction in reactions.iter().filter(|r| r.trigger == state) {
            let change = PendingInputChange {
                at: now + reaction.delay,
                input: reaction.input,
                state: reaction.result,
            };
            trace!(
                "DO {} {} -> queued DI {} = {} in {:?}",
                output,
                if state { "ON" } else { "OFF" },
                reaction.input,
                if reaction.result { "ON" } else { "OFF" },
                reaction.delay
            );
            // A newer edge supersedes whatever was queued for the input.
            self.pending.retain(|p| p.input != change.input);
            let index = self.pending.partition_point(|p| p.at <= change.at);
            self.pending.insert(index, change);
        }
    }

    /// Apply every pending change due at or before `now`.
    pub fn advance(&mut self, now: Duration) {
        while let Some(change) = self.pending.front().copied() {
            if change.at > now {
                break;
            }
            self.pending.pop_front();
            let old = self.inputs.insert(change.input, change.state).unwrap_or(false);
            if old != change.state {
                debug!(
                    "DI {} changed: {} -> {}",
                    change.input,
                    if old { "ON" } else { "OFF" },
                    if change.state { "ON" } else { "OFF" }
                );
            }
        }
    }

    /// Number of queued input changes.
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }
}
