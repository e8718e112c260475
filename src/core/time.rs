//! Simulation Time
//!
//! Every gameplay timer counts whole ticks at [`TICK_RATE`](crate::TICK_RATE).
//! Durations are configured in seconds and converted once, so a timer set to
//! 0.2 s expires on exactly the 12th tick regardless of float drift.

use crate::{TICK_DT, TICK_RATE};

/// Number of simulation ticks.
pub type Ticks = u32;

/// Most ticks a single host frame may run before the clock drops time.
pub const MAX_CATCH_UP_TICKS: u32 = 5;

/// Convert a duration in seconds to ticks (rounded to nearest).
///
/// Negative and non-finite durations map to zero.
#[inline]
pub fn seconds_to_ticks(seconds: f32) -> Ticks {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * TICK_RATE as f32).round() as Ticks
}

/// Convert ticks back to seconds.
#[inline]
pub fn ticks_to_seconds(ticks: Ticks) -> f32 {
    ticks as f32 / TICK_RATE as f32
}

/// Accumulates variable host frame time into whole fixed ticks.
///
/// Hosts that don't run at exactly 60 Hz call [`advance`](Self::advance)
/// with their frame delta and run [`GameWorld::tick`](crate::game::world::GameWorld::tick)
/// that many times.
#[derive(Clone, Debug, Default)]
pub struct FixedStepClock {
    accumulator: f32,
    dropped_ticks: u64,
}

impl FixedStepClock {
    /// Create an empty clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `dt` seconds and return how many ticks to run now.
    ///
    /// At most [`MAX_CATCH_UP_TICKS`] are returned; any backlog beyond that
    /// is dropped so a stalled host can't spiral.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }

        let mut ticks = 0;
        // Small epsilon so 1/60 accumulated 60 times doesn't lose a tick
        while self.accumulator + 1e-6 >= TICK_DT {
            self.accumulator -= TICK_DT;
            ticks += 1;
        }
        self.accumulator = self.accumulator.max(0.0);

        if ticks > MAX_CATCH_UP_TICKS {
            self.dropped_ticks += (ticks - MAX_CATCH_UP_TICKS) as u64;
            ticks = MAX_CATCH_UP_TICKS;
        }
        ticks
    }

    /// Leftover time not yet consumed by a tick.
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Total ticks discarded because of catch-up limiting.
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }
}
