//! Open-loop motion primitives.
//!
//! Each timed primitive commands a constant velocity for
//! `amount / velocity` seconds and then publishes one zero command.
//! Nothing is measured: if the wheels slip, the robot ends up short.
//!
//! ## Loop
//!
//! ```text
//! start = now
//! loop {
//!     cancelled?            -> Cancelled
//!     now - start >= dur?   -> Completed
//!     publish(command)
//!     sleep until next tick
//! }
//! publish(STOP)
//! ```
//!
//! The exit check compares absolute elapsed time against `start`, so a
//! late tick shortens the remaining motion instead of accumulating.
//!
//! ## Sign convention
//!
//! Angles and distances are divided by the velocity as given. A velocity
//! whose sign disagrees with the requested amount gives a negative
//! duration, which is clamped to zero: the robot does not move and only
//! the stop command is sent.

use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use crate::clock::{Clock, tick_period};
use crate::command::VelocityCommand;
use crate::config::MotionConfig;
use crate::error::{GatiError, Result};
use crate::sink::CommandSink;

/// Per-invocation state of a timed primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    /// Before the first tick
    Idle,
    /// Publishing the motion command every tick
    Commanding,
    /// Zero command sent; terminal
    Stopped,
}

/// Why a timed primitive left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Planned duration elapsed
    Completed,
    /// Clock reported cancellation first
    Cancelled,
}

/// Summary of one timed primitive run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    pub outcome: MotionOutcome,
    /// `amount / velocity`, clamped at zero
    pub planned: Duration,
    /// Clock time between loop start and loop exit
    pub elapsed: Duration,
    /// Motion commands accepted by the sink
    pub ticks: u64,
    /// Motion commands the sink rejected
    pub dropped: u64,
}

impl MotionReport {
    pub fn is_cancelled(&self) -> bool {
        self.outcome == MotionOutcome::Cancelled
    }

    /// Publish attempts, accepted or not.
    pub fn attempts(&self) -> u64 {
        self.ticks + self.dropped
    }
}

/// Publish a single zero command.
///
/// Keeps no state; calling it N times publishes N zero commands.
pub fn stop<S: CommandSink + ?Sized>(sink: &mut S) -> Result<()> {
    sink.publish(VelocityCommand::STOP)
}

/// Timed rotate/translate/stop primitives at a fixed publish rate.
#[derive(Debug, Clone, Copy)]
pub struct MotionPrimitives {
    frequency_hz: f64,
}

impl Default for MotionPrimitives {
    fn default() -> Self {
        Self {
            frequency_hz: MotionConfig::default().publish_frequency_hz,
        }
    }
}

impl MotionPrimitives {
    /// Create primitives publishing at `frequency_hz`.
    ///
    /// The tick period must be at least one nanosecond, otherwise the
    /// clock could never advance between ticks.
    pub fn new(frequency_hz: f64) -> Result<Self> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(GatiError::InvalidArgument(format!(
                "publish frequency must be positive and finite, got {}",
                frequency_hz
            )));
        }
        if tick_period(frequency_hz).is_zero() {
            return Err(GatiError::InvalidArgument(format!(
                "publish frequency {}Hz gives a zero tick period",
                frequency_hz
            )));
        }
        Ok(Self { frequency_hz })
    }

    pub fn from_config(config: &MotionConfig) -> Result<Self> {
        Self::new(config.publish_frequency_hz)
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    /// Rotate in place by `angle` radians at `angular_velocity` rad/s.
    ///
    /// Publishes `{linear: 0, angular: angular_velocity}` every tick for
    /// `angle / angular_velocity` seconds, then one zero command.
    ///
    /// # Errors
    /// - `InvalidArgument` if `angular_velocity` is zero or either input is
    ///   not finite. Nothing is published in that case.
    /// - The sink's error if the final zero command cannot be published.
    pub fn rotate_in_place<S, C>(
        &self,
        angle: f32,
        angular_velocity: f32,
        sink: &mut S,
        clock: &mut C,
    ) -> Result<MotionReport>
    where
        S: CommandSink + ?Sized,
        C: Clock + ?Sized,
    {
        let planned = planned_duration(angle, angular_velocity, "angular_velocity")?;

        tracing::info!(
            "Rotate {:.3}rad ({:.1}°) at {:.3}rad/s, planned {:.2}s",
            angle,
            angle.to_degrees(),
            angular_velocity,
            planned.as_secs_f64()
        );

        self.drive_for(
            "rotate",
            planned,
            VelocityCommand::rotation(angular_velocity),
            sink,
            clock,
        )
    }

    /// Move straight by `distance` meters at `linear_velocity` m/s.
    ///
    /// Publishes `{linear: linear_velocity, angular: 0}` every tick for
    /// `distance / linear_velocity` seconds, then one zero command.
    ///
    /// # Errors
    /// Same as [`rotate_in_place`](Self::rotate_in_place).
    pub fn move_forward<S, C>(
        &self,
        distance: f32,
        linear_velocity: f32,
        sink: &mut S,
        clock: &mut C,
    ) -> Result<MotionReport>
    where
        S: CommandSink + ?Sized,
        C: Clock + ?Sized,
    {
        let planned = planned_duration(distance, linear_velocity, "linear_velocity")?;

        tracing::info!(
            "Move {:.3}m at {:.3}m/s, planned {:.2}s",
            distance,
            linear_velocity,
            planned.as_secs_f64()
        );

        self.drive_for(
            "move",
            planned,
            VelocityCommand::translation(linear_velocity),
            sink,
            clock,
        )
    }

    /// Publish a single zero command. See [`stop`].
    pub fn stop<S: CommandSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        stop(sink)
    }

    /// Drive a square: four legs of `move_forward(side)` followed by a
    /// quarter turn. Ends after the current leg once a leg is cancelled.
    ///
    /// Both velocities are checked before the first command is sent.
    pub fn drive_square<S, C>(
        &self,
        side: f32,
        linear_velocity: f32,
        angular_velocity: f32,
        sink: &mut S,
        clock: &mut C,
    ) -> Result<Vec<MotionReport>>
    where
        S: CommandSink + ?Sized,
        C: Clock + ?Sized,
    {
        planned_duration(side, linear_velocity, "linear_velocity")?;
        planned_duration(FRAC_PI_2, angular_velocity, "angular_velocity")?;

        let mut legs = Vec::with_capacity(8);
        for corner in 0..4 {
            tracing::debug!("Square: side {}", corner + 1);

            let report = self.move_forward(side, linear_velocity, sink, clock)?;
            legs.push(report);
            if report.is_cancelled() {
                break;
            }

            let report = self.rotate_in_place(FRAC_PI_2, angular_velocity, sink, clock)?;
            legs.push(report);
            if report.is_cancelled() {
                break;
            }
        }

        Ok(legs)
    }

    fn drive_for<S, C>(
        &self,
        label: &str,
        planned: Duration,
        command: VelocityCommand,
        sink: &mut S,
        clock: &mut C,
    ) -> Result<MotionReport>
    where
        S: CommandSink + ?Sized,
        C: Clock + ?Sized,
    {
        let mut phase = MotionPhase::Idle;
        let mut ticks = 0u64;
        let mut dropped = 0u64;

        clock.begin_ticks();
        let start = clock.now();

        let outcome = loop {
            if clock.is_cancelled() {
                break MotionOutcome::Cancelled;
            }
            if clock.now().saturating_duration_since(start) >= planned {
                break MotionOutcome::Completed;
            }

            if phase == MotionPhase::Idle {
                phase = transition(label, phase, MotionPhase::Commanding);
            }

            match sink.publish(command) {
                Ok(()) => ticks += 1,
                Err(e) => {
                    dropped += 1;
                    tracing::warn!("{}: dropped tick {}: {}", label, ticks + dropped, e);
                }
            }

            clock.sleep_until_next_tick(self.frequency_hz);
        };

        let elapsed = clock.now().saturating_duration_since(start);
        transition(label, phase, MotionPhase::Stopped);
        stop(sink)?;

        match outcome {
            MotionOutcome::Completed => tracing::info!(
                "{} complete: {} ticks in {:.2}s",
                label,
                ticks,
                elapsed.as_secs_f64()
            ),
            MotionOutcome::Cancelled => tracing::info!(
                "{} cancelled after {} ticks ({:.2}s of {:.2}s)",
                label,
                ticks,
                elapsed.as_secs_f64(),
                planned.as_secs_f64()
            ),
        }

        Ok(MotionReport {
            outcome,
            planned,
            elapsed,
            ticks,
            dropped,
        })
    }
}

fn transition(label: &str, from: MotionPhase, to: MotionPhase) -> MotionPhase {
    tracing::debug!("{}: {:?} -> {:?}", label, from, to);
    to
}

/// `amount / velocity` as a duration. Negative results clamp to zero.
fn planned_duration(amount: f32, velocity: f32, name: &str) -> Result<Duration> {
    if velocity == 0.0 || !velocity.is_finite() {
        return Err(GatiError::InvalidArgument(format!(
            "{} must be nonzero and finite, got {}",
            name, velocity
        )));
    }
    if !amount.is_finite() {
        return Err(GatiError::InvalidArgument(format!(
            "motion amount must be finite, got {}",
            amount
        )));
    }

    let secs = amount as f64 / velocity as f64;
    if secs < 0.0 {
        tracing::warn!(
            "Sign of {} ({}) opposes requested amount ({}); not moving",
            name,
            velocity,
            amount
        );
        return Ok(Duration::ZERO);
    }

    Duration::try_from_secs_f64(secs).map_err(|e| {
        GatiError::InvalidArgument(format!("duration {}s not representable: {}", secs, e))
    })
}
