//! Wall-clock frame timing.

use std::time::Instant;

/// Default delta returned by the first tick, before any sample exists.
pub const DEFAULT_FRAME_DT: f32 = 1.0 / 60.0;

/// Converts frame arrivals into sanitized delta-time values.
///
/// The first tick returns [`DEFAULT_FRAME_DT`]; subsequent ticks return the
/// wall-clock time elapsed since the previous tick, in seconds. Negative
/// deltas (clock skew) clamp to 0 and oversized deltas (resume from a stalled
/// or suspended loop) clamp to `max_step`, so a single frame can never
/// teleport the animation past multiple bounce cycles.
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    max_step: f32,
}

impl FrameClock {
    #[must_use]
    pub const fn new(max_step_secs: f32) -> Self {
        Self {
            last: None,
            max_step: max_step_secs,
        }
    }

    /// Sample the clock now and return the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Testable entry point: tick against an externally supplied instant.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            None => DEFAULT_FRAME_DT,
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
        };
        self.last = Some(now);
        dt.clamp(0.0, self.max_step)
    }
}
