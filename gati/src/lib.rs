//! Gati - open-loop motion primitives for a wheeled robot
//!
//! Rotates in place, moves forward and stops by commanding a fixed
//! velocity for a computed duration. There is no sensor feedback: the
//! distance covered is whatever `velocity × time` turns out to be on the
//! floor.
//!
//! ## Pieces
//!
//! - [`MotionPrimitives`]: the timed loops (`rotate_in_place`, `move_forward`, `stop`)
//! - [`CommandSink`]: where velocity commands go (TCP daemon, channel, log, memory)
//! - [`Clock`]: monotonic time, fixed-rate sleep and cancellation
//!
//! ```
//! use gati::{MotionPrimitives, RecordingSink, SimClock, VelocityCommand};
//!
//! let mut sink = RecordingSink::new();
//! let mut clock = SimClock::new();
//! let report = MotionPrimitives::default()
//!     .move_forward(2.0, 0.5, &mut sink, &mut clock)?;
//!
//! assert_eq!(report.ticks, 40);
//! assert_eq!(sink.commands().last(), Some(&VelocityCommand::STOP));
//! # Ok::<(), gati::GatiError>(())
//! ```

pub mod client;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod primitives;
pub mod sink;
pub mod wire;

// Re-export commonly used types
pub use client::TcpCommandSink;
pub use clock::{Clock, SimClock, SystemClock};
pub use command::VelocityCommand;
pub use config::GatiConfig;
pub use error::{GatiError, Result};
pub use primitives::{MotionOutcome, MotionPhase, MotionPrimitives, MotionReport};
pub use sink::{ChannelSink, CommandSink, RecordingSink, TracingSink};
