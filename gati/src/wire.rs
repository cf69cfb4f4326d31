//! Wire format for the robot daemon's command channel
//!
//! Every command travels as one length-prefixed frame:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON or Postcard binary  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - Payloads larger than [`MAX_FRAME_SIZE`] are refused on both ends.
//! - No response is sent back; commands are fire-and-forget.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{GatiError, Result};

/// Maximum payload size (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Commands understood by the robot daemon
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum RobotCommand {
    /// Body velocity; the daemon does the drive kinematics
    SetVelocity { linear: f32, angular: f32 },

    /// Wheel velocities in encoder ticks/sec (positive = forward)
    ///
    /// To stop, send `SetWheelVelocity { left: 0.0, right: 0.0 }`
    SetWheelVelocity { left: f64, right: f64 },
}

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Serializer for one wire format
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn serialize(&self, cmd: &RobotCommand) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(cmd).map_err(|e| GatiError::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(cmd).map_err(|e| GatiError::Serialization(e.to_string()))
            }
        }
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Result<RobotCommand> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| GatiError::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| GatiError::Serialization(e.to_string()))
            }
        }
    }
}

/// Write one frame (length prefix + payload) and flush.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(GatiError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }

    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame, returning its payload.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(GatiError::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}
