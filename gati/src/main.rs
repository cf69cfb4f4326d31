//! Gati - run open-loop motion primitives against a robot
//!
//! ```bash
//! gati rotate --angle 1.5708 --velocity 1.0
//! gati forward --distance 2.0 --velocity 0.5
//! gati --sink tcp square --side 0.5
//! gati stop
//! ```
//!
//! Configuration is read from `--config <path>`, else `gati.toml` in the
//! working directory, else built-in defaults. Ctrl-C ends the running motion;
//! the zero command is still sent.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gati::config::SinkKind;
use gati::{
    CommandSink, GatiConfig, GatiError, MotionPrimitives, Result, SystemClock, TcpCommandSink,
    TracingSink,
};

#[derive(Parser)]
#[command(name = "gati", version)]
#[command(about = "Open-loop timed motion primitives for a wheeled robot")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command destination (overrides [connection].sink)
    #[arg(long, value_enum)]
    sink: Option<SinkArg>,

    /// Publish frequency in Hz (overrides [motion].publish_frequency_hz)
    #[arg(long)]
    frequency: Option<f64>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SinkArg {
    Log,
    Tcp,
}

#[derive(Subcommand)]
enum Action {
    /// Rotate in place (positive angle = counter-clockwise)
    Rotate {
        /// Angle in radians
        #[arg(long, allow_hyphen_values = true)]
        angle: f32,
        /// Angular velocity in rad/s; its sign must match the angle's
        #[arg(long, allow_hyphen_values = true)]
        velocity: Option<f32>,
    },
    /// Drive straight (negative distance with negative velocity = backward)
    Forward {
        /// Distance in meters
        #[arg(long, allow_hyphen_values = true)]
        distance: f32,
        /// Linear velocity in m/s
        #[arg(long, allow_hyphen_values = true)]
        velocity: Option<f32>,
    },
    /// Drive a square with counter-clockwise corners
    Square {
        /// Side length in meters
        #[arg(long)]
        side: f32,
    },
    /// Publish a single zero command
    Stop,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gati=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(sink) = args.sink {
        config.connection.sink = match sink {
            SinkArg::Log => SinkKind::Log,
            SinkArg::Tcp => SinkKind::Tcp,
        };
    }
    if let Some(hz) = args.frequency {
        config.motion.publish_frequency_hz = hz;
    }

    info!("Gati v{}", env!("CARGO_PKG_VERSION"));

    let primitives = MotionPrimitives::from_config(&config.motion)?;
    let mut sink = open_sink(&config)?;

    let mut clock = SystemClock::new();
    let shutdown = clock.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    })
    .map_err(|e| GatiError::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let linear = config.robot.default_linear_velocity;
    let angular = config.robot.default_angular_velocity;

    match args.action {
        Action::Rotate { angle, velocity } => {
            let velocity = velocity.unwrap_or(angular.copysign(angle));
            let report = primitives.rotate_in_place(angle, velocity, &mut sink, &mut clock)?;
            info!("{:?}", report);
        }
        Action::Forward { distance, velocity } => {
            let velocity = velocity.unwrap_or(linear.copysign(distance));
            let report = primitives.move_forward(distance, velocity, &mut sink, &mut clock)?;
            info!("{:?}", report);
        }
        Action::Square { side } => {
            let legs = primitives.drive_square(side, linear, angular, &mut sink, &mut clock)?;
            let dropped: u64 = legs.iter().map(|r| r.dropped).sum();
            info!("Square finished after {} legs", legs.len());
            if dropped > 0 {
                warn!("{} commands were dropped by the sink", dropped);
            }
        }
        Action::Stop => primitives.stop(&mut sink)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GatiConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            GatiConfig::load(path)
        }
        None if Path::new("gati.toml").exists() => {
            info!("Loading configuration from gati.toml");
            GatiConfig::load(Path::new("gati.toml"))
        }
        None => {
            info!("Using default configuration");
            Ok(GatiConfig::default())
        }
    }
}

fn open_sink(config: &GatiConfig) -> Result<Box<dyn CommandSink>> {
    match config.connection.sink {
        SinkKind::Log => {
            info!("Dry run: commands are logged, not sent");
            Ok(Box::new(TracingSink::new()))
        }
        SinkKind::Tcp => {
            info!("Connecting to {}", config.address());
            Ok(Box::new(TcpCommandSink::from_config(config)?))
        }
    }
}
