//! Configuration loading for Gati

use crate::error::{GatiError, Result};
use crate::wire::WireFormat;
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GatiConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Where velocity commands go
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log commands only (dry run)
    #[default]
    Log,
    /// Send commands to the robot daemon over TCP
    Tcp,
}

/// How body velocities are encoded for the daemon
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    /// `SetVelocity { linear, angular }`
    #[default]
    Velocity,
    /// `SetWheelVelocity { left, right }` in encoder ticks/sec
    Wheel,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub sink: SinkKind,

    /// Robot IP address (default: 127.0.0.1 for local mock)
    #[serde(default = "default_robot_ip")]
    pub robot_ip: String,

    /// TCP command port (default: 5555)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection timeout in milliseconds (default: 5000)
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub wire_format: WireFormat,

    #[serde(default)]
    pub drive_mode: DriveMode,
}

/// Robot physical parameters
#[derive(Clone, Debug, Deserialize)]
pub struct RobotConfig {
    /// Distance between wheels in meters (default: 0.233)
    #[serde(default = "default_wheel_base")]
    pub wheel_base: f32,

    /// Encoder ticks per meter of travel (default: 4464.0)
    #[serde(default = "default_ticks_per_meter")]
    pub ticks_per_meter: f32,

    /// Linear velocity used when none is given, m/s (default: 0.2)
    #[serde(default = "default_linear_velocity")]
    pub default_linear_velocity: f32,

    /// Angular velocity used when none is given, rad/s (default: 0.5)
    #[serde(default = "default_angular_velocity")]
    pub default_angular_velocity: f32,
}

/// Motion loop parameters
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Command publish rate in Hz (default: 10)
    #[serde(default = "default_publish_frequency")]
    pub publish_frequency_hz: f64,

    /// Obstacle stop distance in meters (default: 0.8).
    /// Not used by the timed primitives; read by callers that gate motion on range data.
    #[serde(default = "default_threshold_distance")]
    pub threshold_distance: f32,

    /// Bearing of the forward-facing laser beam in radians (default: 0)
    #[serde(default)]
    pub laser_angle_front: f32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            robot_ip: default_robot_ip(),
            port: default_port(),
            timeout_ms: default_timeout(),
            wire_format: WireFormat::default(),
            drive_mode: DriveMode::default(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            wheel_base: default_wheel_base(),
            ticks_per_meter: default_ticks_per_meter(),
            default_linear_velocity: default_linear_velocity(),
            default_angular_velocity: default_angular_velocity(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            publish_frequency_hz: default_publish_frequency(),
            threshold_distance: default_threshold_distance(),
            laser_angle_front: 0.0,
        }
    }
}

// Default value functions
fn default_robot_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5555
}
fn default_timeout() -> u64 {
    5000
}
fn default_wheel_base() -> f32 {
    0.233
}
fn default_ticks_per_meter() -> f32 {
    4464.0
}
fn default_linear_velocity() -> f32 {
    0.2
}
fn default_angular_velocity() -> f32 {
    0.5
}
fn default_publish_frequency() -> f64 {
    10.0
}
fn default_threshold_distance() -> f32 {
    0.8
}

impl GatiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatiError::Config(format!("Failed to read config file: {}", e)))?;
        let config: GatiConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the full address string for connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.robot_ip, self.connection.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatiConfig::default();
        assert_eq!(config.motion.publish_frequency_hz, 10.0);
        assert_eq!(config.motion.threshold_distance, 0.8);
        assert_eq!(config.motion.laser_angle_front, 0.0);
        assert_eq!(config.connection.sink, SinkKind::Log);
        assert_eq!(config.connection.wire_format, WireFormat::Json);
        assert_eq!(config.address(), "127.0.0.1:5555");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: GatiConfig = toml::from_str("").unwrap();
        assert_eq!(config.robot.wheel_base, 0.233);
        assert_eq!(config.robot.default_angular_velocity, 0.5);
    }

    #[test]
    fn test_partial_override() {
        let config: GatiConfig = toml::from_str(
            r#"
            [connection]
            sink = "tcp"
            robot_ip = "192.168.68.101"
            drive_mode = "wheel"
            wire_format = "postcard"

            [motion]
            publish_frequency_hz = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.sink, SinkKind::Tcp);
        assert_eq!(config.connection.drive_mode, DriveMode::Wheel);
        assert_eq!(config.connection.wire_format, WireFormat::Postcard);
        assert_eq!(config.connection.port, 5555);
        assert_eq!(config.motion.publish_frequency_hz, 20.0);
        assert_eq!(config.motion.threshold_distance, 0.8);
        assert_eq!(config.address(), "192.168.68.101:5555");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = toml::from_str::<GatiConfig>("[motion]\npublish_frequency_hz = \"fast\"")
            .map_err(GatiError::from)
            .unwrap_err();
        assert!(matches!(err, GatiError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GatiConfig::load(Path::new("/nonexistent/gati.toml")).unwrap_err();
        assert!(matches!(err, GatiError::Config(_)));
    }
}
