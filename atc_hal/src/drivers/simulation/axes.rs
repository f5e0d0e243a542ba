//! XYZ motion simulator.
//!
//! Moves are linear interpolations with a fixed duration: rapids run the
//! longest axis at the rapid speed, feed moves run Z at the programmed
//! feed. A move issued while another is still running starts where and
//! when the previous one ends.

use atc_common::machine::types::MotionCommand;
use atc_common::tool::ToolNumber;
use std::time::Duration;
use tracing::{debug, trace};

/// Segment currently being executed.
#[derive(Debug, Clone, Copy)]
struct Segment {
    from: [f64; 3],
    to: [f64; 3],
    start: Duration,
    end: Duration,
}

/// Three-axis motion simulator on the virtual clock.
#[derive(Debug, Clone)]
pub struct MotionSimulator {
    /// mm/s
    rapid_speed: f64,
    segment: Segment,
    offset: Option<ToolNumber>,
}

impl MotionSimulator {
    /// Create a simulator at rest at `position`.
    pub fn new(position: [f64; 3], rapid_speed: f64) -> Self {
        Self {
            rapid_speed,
            segment: Segment {
                from: position,
                to: position,
                start: Duration::ZERO,
                end: Duration::ZERO,
            },
            offset: None,
        }
    }

    /// Execute a command issued at virtual time `now`.
    pub fn issue(&mut self, command: &MotionCommand, now: Duration) {
        let from = self.segment.to;
        let start = now.max(self.segment.end);
        let (to, duration) = match *command {
            MotionCommand::Rapid { x, y, z } => {
                let to = [x.unwrap_or(from[0]), y.unwrap_or(from[1]), z.unwrap_or(from[2])];
                let longest = (0..3).map(|i| (to[i] - from[i]).abs()).fold(0.0, f64::max);
                (to, self.travel_time(longest, self.rapid_speed))
            }
            MotionCommand::Feed { z, feed } => {
                let to = [from[0], from[1], z];
                (to, self.travel_time((z - from[2]).abs(), feed / 60.0))
            }
            MotionCommand::LoadToolOffset(tool) => {
                debug!(%tool, "Tool offset loaded");
                self.offset = Some(tool);
                (from, Duration::ZERO)
            }
        };
        trace!(?from, ?to, ?duration, "Motion segment");
        self.segment = Segment {
            from,
            to,
            start,
            end: start + duration,
        };
    }

    fn travel_time(&self, distance: f64, speed: f64) -> Duration {
        if distance <= 0.0 || speed <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(distance / speed)
    }

    /// True until the last issued move has completed.
    pub fn is_moving(&self, now: Duration) -> bool {
        now < self.segment.end
    }

    /// Interpolated position at `now`.
    pub fn position(&self, now: Duration) -> [f64; 3] {
        let Segment { from, to, start, end } = self.segment;
        if now >= end {
            return to;
        }
        if now <= start {
            return from;
        }
        let t = (now - start).as_secs_f64() / (end - start).as_secs_f64();
        [0, 1, 2].map(|i| from[i] + (to[i] - from[i]) * t)
    }

    /// Tool offset loaded by the last `G43`.
    pub fn loaded_offset(&self) -> Option<ToolNumber> {
        self.offset
    }

    /// Stop all axes at their position at `now`.
    pub fn halt(&mut self, now: Duration) {
        let here = self.position(now);
        self.segment = Segment {
            from: here,
            to: here,
            start: now,
            end: now,
        };
    }
}
