//! Velocity command sent to the robot's motion executor.

use serde::{Deserialize, Serialize};

/// Linear/angular velocity pair.
///
/// Built fresh for every publish tick and never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Linear velocity (m/s, positive = forward)
    pub linear: f32,

    /// Angular velocity (rad/s, positive = counter-clockwise)
    pub angular: f32,
}

impl VelocityCommand {
    /// The zero command. Publishing it stops the robot.
    pub const STOP: Self = Self {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    /// Pure rotation about the robot center.
    pub fn rotation(angular: f32) -> Self {
        Self {
            linear: 0.0,
            angular,
        }
    }

    /// Straight-line translation.
    pub fn translation(linear: f32) -> Self {
        Self {
            linear,
            angular: 0.0,
        }
    }

    /// True when both components are zero.
    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }
}
