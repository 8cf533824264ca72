//! Frame timing.

use std::time::Instant;

/// Tracks per-frame elapsed time and total running time.
///
/// `update` is the first task of every frame; everything downstream reads
/// the frozen `elapsed_time` so the whole frame agrees on one delta.
pub struct Timer {
    previous: Instant,
    elapsed_time: f32,
    total_time: f32,
}

impl Timer {
    /// Starts the timer; the first frame's elapsed time is zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            elapsed_time: 0.0,
            total_time: 0.0,
        }
    }

    /// Freezes the delta since the previous update.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.elapsed_time = now.duration_since(self.previous).as_secs_f32();
        self.total_time += self.elapsed_time;
        self.previous = now;
    }

    /// Seconds between the last two updates.
    #[must_use]
    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    /// Seconds since the timer started, summed over updates.
    #[must_use]
    pub fn total_time(&self) -> f32 {
        self.total_time
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
