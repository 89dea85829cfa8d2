use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Streaming configuration: window size around the anchor and recompute threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Half the window's width and height, in world units (one cell per unit).
    pub half_extents: Vec2,
    /// Minimum anchor displacement before the window is recomputed.
    pub movement_threshold: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            half_extents: Vec2::new(8.0, 8.0),
            movement_threshold: 1.0,
        }
    }
}

impl StreamConfig {
    pub fn new(half_extents: Vec2, movement_threshold: f32) -> Self {
        Self {
            half_extents,
            movement_threshold,
        }
    }

    /// Reject configurations that could invert the window bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Vec2 { x, y } = self.half_extents;
        if !(x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0) {
            return Err(ConfigError::InvalidHalfExtents { x, y });
        }
        let t = self.movement_threshold;
        if !(t.is_finite() && t >= 0.0) {
            return Err(ConfigError::InvalidMovementThreshold(t));
        }
        Ok(())
    }
}
