//! TCP command sink for the robot daemon.
//!
//! Opens one TCP connection and writes each velocity command as a
//! length-prefixed frame (see [`crate::wire`]). Nothing is read back.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::command::VelocityCommand;
use crate::config::{DriveMode, GatiConfig};
use crate::error::{GatiError, Result};
use crate::sink::CommandSink;
use crate::wire::{RobotCommand, Serializer, WireFormat, write_frame};

/// Differential-drive geometry used to turn body velocity into wheel speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveGeometry {
    /// Distance between wheels (meters)
    pub wheel_base: f32,
    /// Encoder ticks per meter of travel
    pub ticks_per_meter: f32,
}

impl DriveGeometry {
    /// Wheel velocities (left, right) in ticks/sec.
    pub fn wheel_ticks(&self, command: VelocityCommand) -> (f64, f64) {
        let half_base = self.wheel_base as f64 / 2.0;
        let v = command.linear as f64;
        let w = command.angular as f64;
        let tpm = self.ticks_per_meter as f64;
        ((v - w * half_base) * tpm, (v + w * half_base) * tpm)
    }
}

/// Encode a velocity command for the daemon.
pub fn encode_command(
    command: VelocityCommand,
    mode: DriveMode,
    geometry: DriveGeometry,
) -> RobotCommand {
    match mode {
        DriveMode::Velocity => RobotCommand::SetVelocity {
            linear: command.linear,
            angular: command.angular,
        },
        DriveMode::Wheel => {
            let (left, right) = geometry.wheel_ticks(command);
            RobotCommand::SetWheelVelocity { left, right }
        }
    }
}

/// Sink that streams commands to the robot daemon over TCP.
pub struct TcpCommandSink {
    stream: TcpStream,
    serializer: Serializer,
    mode: DriveMode,
    geometry: DriveGeometry,
    buffer: Vec<u8>,
}

impl TcpCommandSink {
    /// Connect with timeout
    pub fn connect_timeout(
        addr: &str,
        timeout: Duration,
        format: WireFormat,
        mode: DriveMode,
        geometry: DriveGeometry,
    ) -> Result<Self> {
        let sock_addr: SocketAddr = addr
            .parse()
            .map_err(|e| GatiError::Config(format!("Invalid address: {}", e)))?;
        let stream = TcpStream::connect_timeout(&sock_addr, timeout)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(timeout))?;

        tracing::info!(
            "Connected to robot daemon at {} ({:?} frames, {:?} mode)",
            sock_addr,
            format,
            mode
        );

        Ok(Self {
            stream,
            serializer: Serializer::new(format),
            mode,
            geometry,
            buffer: Vec::with_capacity(64),
        })
    }

    /// Connect using the `[connection]` and `[robot]` sections of the config.
    pub fn from_config(config: &GatiConfig) -> Result<Self> {
        Self::connect_timeout(
            &config.address(),
            Duration::from_millis(config.connection.timeout_ms),
            config.connection.wire_format,
            config.connection.drive_mode,
            DriveGeometry {
                wheel_base: config.robot.wheel_base,
                ticks_per_meter: config.robot.ticks_per_meter,
            },
        )
    }
}

impl CommandSink for TcpCommandSink {
    fn publish(&mut self, command: VelocityCommand) -> Result<()> {
        let msg = encode_command(command, self.mode, self.geometry);
        let payload = self.serializer.serialize(&msg)?;

        // Single write keeps the length prefix and payload in one segment
        self.buffer.clear();
        write_frame(&mut self.buffer, &payload)?;
        self.stream.write_all(&self.buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::read_frame;
    use std::net::TcpListener;
    use std::thread;

    const GEOMETRY: DriveGeometry = DriveGeometry {
        wheel_base: 0.2,
        ticks_per_meter: 1000.0,
    };

    #[test]
    fn test_wheel_ticks_straight() {
        let (left, right) = GEOMETRY.wheel_ticks(VelocityCommand::translation(0.5));
        assert_eq!(left, 500.0);
        assert_eq!(right, 500.0);
    }

    #[test]
    fn test_wheel_ticks_ccw_rotation() {
        // CCW: left wheel backward, right wheel forward
        let (left, right) = GEOMETRY.wheel_ticks(VelocityCommand::rotation(1.0));
        assert!((left + 100.0).abs() < 1e-3);
        assert!((right - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_encode_stop_is_zero_in_both_modes() {
        assert_eq!(
            encode_command(VelocityCommand::STOP, DriveMode::Velocity, GEOMETRY),
            RobotCommand::SetVelocity {
                linear: 0.0,
                angular: 0.0
            }
        );
        assert_eq!(
            encode_command(VelocityCommand::STOP, DriveMode::Wheel, GEOMETRY),
            RobotCommand::SetWheelVelocity {
                left: 0.0,
                right: 0.0
            }
        );
    }

    #[test]
    fn test_publish_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let serializer = Serializer::new(WireFormat::Json);
            let mut received = Vec::new();
            for _ in 0..2 {
                let payload = read_frame(&mut stream).unwrap();
                received.push(serializer.deserialize(&payload).unwrap());
            }
            received
        });

        let mut sink = TcpCommandSink::connect_timeout(
            &addr,
            Duration::from_secs(2),
            WireFormat::Json,
            DriveMode::Velocity,
            GEOMETRY,
        )
        .unwrap();
        sink.publish(VelocityCommand::rotation(1.0)).unwrap();
        sink.publish(VelocityCommand::STOP).unwrap();

        let received = server.join().unwrap();
        assert_eq!(
            received,
            vec![
                RobotCommand::SetVelocity {
                    linear: 0.0,
                    angular: 1.0
                },
                RobotCommand::SetVelocity {
                    linear: 0.0,
                    angular: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_publish_wheel_velocity_as_postcard() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let serializer = Serializer::new(WireFormat::Postcard);
            let mut received = Vec::new();
            for _ in 0..2 {
                let payload = read_frame(&mut stream).unwrap();
                received.push(serializer.deserialize(&payload).unwrap());
            }
            received
        });

        let mut sink = TcpCommandSink::connect_timeout(
            &addr,
            Duration::from_secs(2),
            WireFormat::Postcard,
            DriveMode::Wheel,
            GEOMETRY,
        )
        .unwrap();
        sink.publish(VelocityCommand::translation(0.5)).unwrap();
        sink.publish(VelocityCommand::STOP).unwrap();

        let received = server.join().unwrap();
        assert_eq!(
            received,
            vec![
                RobotCommand::SetWheelVelocity {
                    left: 500.0,
                    right: 500.0
                },
                RobotCommand::SetWheelVelocity {
                    left: 0.0,
                    right: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_invalid_address() {
        let result = TcpCommandSink::connect_timeout(
            "not an address",
            Duration::from_millis(10),
            WireFormat::Json,
            DriveMode::Velocity,
            GEOMETRY,
        );
        assert!(matches!(result, Err(GatiError::Config(_))));
    }
}
