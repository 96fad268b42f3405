//! # Vehicle abstraction
//!
//! The session logic only needs three things from a connected Crazyflie: send setpoints, stream a log block and
//! know when the link goes away. These traits are that seam. They are implemented for the real Crazyflie by
//! [ConnectedCrazyflie](crate::ConnectedCrazyflie) and can be implemented by a simulated vehicle for testing.

use async_trait::async_trait;

use crate::telemetry::{LogConfig, TelemetryFrame};
use crate::Result;

/// # Low level setpoint
///
/// Setpoints set the instant target state of the Crazyflie, they need to be sent continuously for the Crazyflie to
/// follow a flight profile. If no setpoint is received for 2 seconds the Crazyflie cuts the motors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setpoint {
    /// Roll and pitch in degrees, yaw rate in degrees/second, thrust from 0 to 65535.
    ///
    /// Thrust is locked after connection, one setpoint with all values at 0 unlocks it.
    Rpyt {
        roll: f32,
        pitch: f32,
        yawrate: f32,
        thrust: u16,
    },
    /// Absolute position in meters, world frame, and absolute yaw in degrees
    Position { x: f32, y: f32, z: f32, yaw: f32 },
    /// Velocity in m/s, world frame, and yaw rate in degrees/second
    VelocityWorld {
        vx: f32,
        vy: f32,
        vz: f32,
        yawrate: f32,
    },
    /// Stop the motors immediately
    Stop,
    /// Lower the priority of the current setpoint so that other sources can take over
    NotifyStop { remain_valid_ms: u32 },
}

impl Setpoint {
    /// The all-zero RPYT setpoint that unlocks the thrust and idles the motors
    pub const IDLE: Setpoint = Setpoint::Rpyt {
        roll: 0.0,
        pitch: 0.0,
        yawrate: 0.0,
        thrust: 0,
    };
}

/// Sends setpoints to a vehicle
#[async_trait]
pub trait Commander: Send + Sync {
    async fn send(&self, setpoint: Setpoint) -> Result<()>;
}

/// A running log block
#[async_trait]
pub trait TelemetryStream: Send {
    /// Wait for the next sample of the block
    ///
    /// Returns an error when the block cannot deliver data anymore, typically because the link is closed.
    async fn next_frame(&mut self) -> Result<TelemetryFrame>;

    /// Stop the block on the Crazyflie
    async fn stop(self: Box<Self>) -> Result<()>;
}

/// A connected vehicle
#[async_trait]
pub trait Vehicle: Commander {
    /// URI of the link
    fn uri(&self) -> &str;

    /// Create and start a log block
    ///
    /// The configuration is validated and every variable is looked up in the log TOC before the block is created:
    /// [Error::VariableNotFound](crate::Error::VariableNotFound) is returned for the first unknown variable.
    async fn start_telemetry(&self, config: &LogConfig) -> Result<Box<dyn TelemetryStream>>;

    /// Close the link. Returns once fully disconnected.
    async fn disconnect(&self);

    /// Wait for the link to close, returns the reason of the disconnection.
    async fn wait_disconnect(&self) -> String;
}
