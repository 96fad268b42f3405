//! # Session configuration
//!
//! Everything that drives a session is plain data: the radio URI, where to cache the TOCs, which telemetry
//! variables to stream and which flights to perform. The defaults reproduce the values the scripts were written
//! with; a JSON file can override any subset of them.
//!
//! ```no_run
//! # fn load() -> cfpilot::Result<()> {
//! let config = cfpilot::PilotConfig::from_json_file("flight.json")?;
//! println!("Flying {} waypoints on {}", config.sequence.len(), config.uri);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::flight::{RampProfile, Waypoint};
use crate::telemetry::{LogConfig, VarType};
use crate::{Error, Result};

/// URI used when nothing else is configured
pub const DEFAULT_URI: &str = "radio://0/80/250K/E7E7E7E7E7";

/// Environment variable overriding the default URI
pub const URI_ENV_VAR: &str = "CFLIB_URI";

/// Default location of the TOC cache
pub const DEFAULT_CACHE_DIR: &str = "./cache";

/// Position setpoints sent for each waypoint of a sequence
pub const SETPOINTS_PER_WAYPOINT: u32 = 50;

/// Pacing of setpoint loops, in milliseconds
pub const SETPOINT_PERIOD_MS: u64 = 100;

/// Delay of the one-shot disconnect, in milliseconds
pub const DISCONNECT_DELAY_MS: u64 = 1000;

/// Default tour: a cross around (2.5, 2.5) at 1.2m followed by a descent to 0.4m
pub const DEFAULT_SEQUENCE: [Waypoint; 7] = [
    Waypoint::new(2.5, 2.5, 1.2, 0.0),
    Waypoint::new(1.5, 2.5, 1.2, 0.0),
    Waypoint::new(2.5, 2.0, 1.2, 0.0),
    Waypoint::new(3.5, 2.5, 1.2, 0.0),
    Waypoint::new(2.5, 3.0, 1.2, 0.0),
    Waypoint::new(2.5, 2.5, 1.2, 0.0),
    Waypoint::new(2.5, 2.5, 0.4, 0.0),
];

/// Return the URI from the `CFLIB_URI` environment variable, or `default` if it is unset or empty.
pub fn uri_from_env(default: &str) -> String {
    match std::env::var(URI_ENV_VAR) {
        Ok(uri) if !uri.trim().is_empty() => uri.trim().to_owned(),
        _ => default.to_owned(),
    }
}

/// Stabilizer state estimate with altitude: roll, pitch, yaw, z and barometer, every 100ms.
pub fn state_estimate() -> LogConfig {
    let mut config = LogConfig::new("StateEstimate", 100);
    config.add_variable("stateEstimate.roll", VarType::Float);
    config.add_variable("stateEstimate.pitch", VarType::Float);
    config.add_variable("stateEstimate.yaw", VarType::Float);
    config.add_variable("stateEstimate.z", VarType::Float);
    config.add_variable("baro.asl", VarType::Float);
    config
}

/// Attitude only: roll, pitch and yaw every 40ms.
pub fn attitude() -> LogConfig {
    let mut config = LogConfig::new("StateEstimate", 40);
    config.add_variable("stateEstimate.roll", VarType::Float);
    config.add_variable("stateEstimate.pitch", VarType::Float);
    config.add_variable("stateEstimate.yaw", VarType::Float);
    config
}

/// # Session configuration
///
/// All fields can be set from a JSON file, fields absent from the file keep their default value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Link URI
    pub uri: String,
    /// TOC cache directory, `None` disables the cache
    pub cache_dir: Option<PathBuf>,
    /// Telemetry block streamed by the session
    pub telemetry: LogConfig,
    /// Waypoints flown by [Pilot::run_sequence()](crate::Pilot::run_sequence)
    pub sequence: Vec<Waypoint>,
    /// Number of position setpoints sent per waypoint
    pub setpoints_per_waypoint: u32,
    /// Setpoint loop period in milliseconds
    pub setpoint_period_ms: u64,
    /// Thrust ramp used by [Pilot::take_off()](crate::Pilot::take_off)
    pub ramp: RampProfile,
    /// Vertical speed of the velocity climb, in m/s
    pub climb_velocity: f32,
    /// Duration of the velocity climb in milliseconds
    pub climb_duration_ms: u64,
    /// Delay of [Pilot::disconnect_after()](crate::Pilot::disconnect_after) in milliseconds
    pub disconnect_delay_ms: u64,
}

impl Default for PilotConfig {
    fn default() -> Self {
        PilotConfig {
            uri: uri_from_env(DEFAULT_URI),
            cache_dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            telemetry: state_estimate(),
            sequence: DEFAULT_SEQUENCE.to_vec(),
            setpoints_per_waypoint: SETPOINTS_PER_WAYPOINT,
            setpoint_period_ms: SETPOINT_PERIOD_MS,
            ramp: RampProfile::default(),
            climb_velocity: 0.1,
            climb_duration_ms: 2000,
            disconnect_delay_ms: DISCONNECT_DELAY_MS,
        }
    }
}

impl PilotConfig {
    /// Load a configuration from a JSON file
    ///
    /// The telemetry block is validated, a file that describes an unusable block is rejected here rather than
    /// when logging starts.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        let config: PilotConfig = serde_json::from_str(text)?;
        config.telemetry.validate()?;
        config.ramp.validate()?;
        if config.setpoint_period_ms == 0 {
            return Err(Error::Config("setpoint_period_ms must be positive".into()));
        }
        Ok(config)
    }

    /// Setpoint loop period
    pub fn setpoint_period(&self) -> Duration {
        Duration::from_millis(self.setpoint_period_ms)
    }

    /// Duration of the velocity climb
    pub fn climb_duration(&self) -> Duration {
        Duration::from_millis(self.climb_duration_ms)
    }

    /// Delay of the one-shot disconnect
    pub fn disconnect_delay(&self) -> Duration {
        Duration::from_millis(self.disconnect_delay_ms)
    }
}
