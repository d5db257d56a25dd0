//! Frame clock
//!
//! Converts raw frame deltas into the millisecond deltas fed to the system
//! pipeline. All simulation code works in milliseconds.

use serde::{Deserialize, Serialize};

/// Configuration for the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Simulation milliseconds per real millisecond
    pub time_scale: f32,
    /// Maximum delta per frame to prevent spiral of death
    pub max_delta_ms: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_ms: 50.0,
        }
    }
}

/// Frame time tracking
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    pub config: ClockConfig,
    /// Simulation time since start in milliseconds
    pub total_ms: f64,
    /// Delta time for this frame (clamped and scaled, 0 while paused)
    pub delta_ms: f32,
    /// Clamped delta before scaling and pausing
    pub unscaled_delta_ms: f32,
    pub frame_count: u64,
    /// While paused the driver only runs render-only passes
    pub paused: bool,
}

impl FrameClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Advance with the raw delta from the previous frame
    pub fn update(&mut self, raw_delta_ms: f32) {
        self.unscaled_delta_ms = raw_delta_ms.clamp(0.0, self.config.max_delta_ms);
        self.frame_count += 1;

        if self.paused {
            self.delta_ms = 0.0;
            return;
        }

        self.delta_ms = self.unscaled_delta_ms * self.config.time_scale;
        self.total_ms += self.delta_ms as f64;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal, 2.0 = double speed)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::default();
        clock.update(16.0);
        assert_eq!(clock.delta_ms, 16.0);
        assert_eq!(clock.frame_count, 1);

        clock.pause();
        clock.update(16.0);
        assert_eq!(clock.delta_ms, 0.0);
        assert_eq!(clock.total_ms, 16.0);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::default();
        clock.update(500.0);
        assert_eq!(clock.delta_ms, 50.0);

        clock.update(-3.0);
        assert_eq!(clock.delta_ms, 0.0);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::default();
        clock.set_time_scale(0.5);
        clock.update(20.0);
        assert_eq!(clock.delta_ms, 10.0);
        clock.set_time_scale(-1.0);
        assert_eq!(clock.config.time_scale, 0.0);
    }
}
