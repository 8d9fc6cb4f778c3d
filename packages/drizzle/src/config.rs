//! Pipeline configuration.

use crate::{Overflow, droplet::GRAVITY};
use std::time::Duration;


/// Settings the pipeline runs with
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Animation frames per second. Each frame batches one window of droplets.
    pub frame_rate: f64,
    /// Bound on the droplet channel
    pub max_drops: usize,
    /// Gravitational constant passed to [`Droplet::fall`](crate::droplet::Droplet::fall)
    pub gravity: f64,
    /// What the droplet channel does when it reaches `max_drops`
    pub overflow: Overflow,
}

impl PipelineConfig {
    /// Duration of one batching window, `1 / frame_rate` seconds.
    ///
    /// Panics if the frame rate does not pass [`validate`](Self::validate).
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate)
    }

    /// Check the settings can actually be run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = Duration::try_from_secs_f64(1.0 / self.frame_rate);
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) || window.is_err() {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        if self.max_drops == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Gravity(self.gravity));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            frame_rate: 25.0,
            max_drops: 1000,
            gravity: GRAVITY,
            overflow: Overflow::DropOldest,
        }
    }
}

/// Error for a [`PipelineConfig`] that cannot be run with
#[derive(Debug, Copy, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Frame rate is zero, negative, not finite, or too small for its window to be a duration
    #[error("frame rate must be positive and finite, got {0}")]
    FrameRate(f64),
    /// Droplet channel bound is zero
    #[error("max drops must be greater than zero")]
    ZeroCapacity,
    /// Gravitational constant is not finite
    #[error("gravity must be finite, got {0}")]
    Gravity(f64),
}
