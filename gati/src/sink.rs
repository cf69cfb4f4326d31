//! Destinations for velocity commands.
//!
//! Publishing is fire-and-forget: a sink either accepts a command or reports
//! an error, and never acknowledges execution. The TCP sink that talks to the
//! robot daemon lives in [`crate::client`].

use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::command::VelocityCommand;
use crate::error::{GatiError, Result};

/// Consumer of velocity commands.
pub trait CommandSink {
    fn publish(&mut self, command: VelocityCommand) -> Result<()>;
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn publish(&mut self, command: VelocityCommand) -> Result<()> {
        (**self).publish(command)
    }
}

/// In-memory sink that keeps every published command.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// primitive and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    commands: Arc<Mutex<Vec<VelocityCommand>>>,
    fail_on: Arc<Mutex<Vec<usize>>>,
    attempts: Arc<Mutex<usize>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the publish attempts with these zero-based indices.
    pub fn failing_on(indices: &[usize]) -> Self {
        let sink = Self::default();
        sink.fail_on.lock().extend_from_slice(indices);
        sink
    }

    /// Snapshot of accepted commands in publish order.
    pub fn commands(&self) -> Vec<VelocityCommand> {
        self.commands.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    /// Number of accepted stop commands.
    pub fn stop_count(&self) -> usize {
        self.commands.lock().iter().filter(|c| c.is_stop()).count()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
        *self.attempts.lock() = 0;
    }
}

impl CommandSink for RecordingSink {
    fn publish(&mut self, command: VelocityCommand) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock();
            let current = *attempts;
            *attempts += 1;
            current
        };

        if self.fail_on.lock().contains(&attempt) {
            return Err(GatiError::Sink(format!(
                "injected failure on publish #{}",
                attempt
            )));
        }

        self.commands.lock().push(command);
        Ok(())
    }
}

/// Sink that only logs. Used for dry runs of the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    published: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl CommandSink for TracingSink {
    fn publish(&mut self, command: VelocityCommand) -> Result<()> {
        self.published += 1;
        tracing::info!(
            "cmd_vel #{}: linear={:.3}m/s, angular={:.3}rad/s",
            self.published,
            command.linear,
            command.angular
        );
        Ok(())
    }
}

/// Sink that forwards commands to another thread over a channel.
///
/// Never blocks: a full bounded channel counts as a failed publish.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<VelocityCommand>,
}

impl ChannelSink {
    pub fn new(tx: Sender<VelocityCommand>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn publish(&mut self, command: VelocityCommand) -> Result<()> {
        self.tx
            .try_send(command)
            .map_err(|e| GatiError::Sink(format!("channel publish failed: {}", e)))
    }
}
