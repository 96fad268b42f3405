//! # Scripted flights
//!
//! Open loop flight routines built from low-level setpoints. None of them read telemetry back: setpoints are sent
//! at a fixed pace for a fixed number of iterations, there is no feedback control and no recovery other than
//! returning the first error.
//!
//! The Crazyflie drops back to its lowest priority setpoint when none is received for a while, so every routine
//! keeps sending at [RampProfile::period_ms] or the period given as argument.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;

use crate::vehicle::{Commander, Setpoint};
use crate::{Error, Result};

/// Position target: meters in the world frame and yaw in degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
}

impl Waypoint {
    pub const fn new(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        Waypoint { x, y, z, yaw }
    }

    fn setpoint(&self) -> Setpoint {
        Setpoint::Position {
            x: self.x,
            y: self.y,
            z: self.z,
            yaw: self.yaw,
        }
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.yaw)
    }
}

/// Direction of a thrust ramp flight
///
/// Directions are relative to the Crazyflie body, front being the side with the blue LEDs facing the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Level attitude
    #[default]
    Upwards,
    /// Positive roll
    Right,
    /// Negative roll
    Left,
    /// Positive pitch
    Forward,
    /// Negative pitch
    Backward,
}

impl Direction {
    /// Roll and pitch, in degrees, for a tilt of `tilt` degrees in this direction
    pub fn attitude(&self, tilt: f32) -> (f32, f32) {
        match self {
            Direction::Upwards => (0.0, 0.0),
            Direction::Right => (tilt, 0.0),
            Direction::Left => (-tilt, 0.0),
            Direction::Forward => (0.0, tilt),
            Direction::Backward => (0.0, -tilt),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upwards" | "up" => Ok(Direction::Upwards),
            "right" => Ok(Direction::Right),
            "left" => Ok(Direction::Left),
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(Error::Config(format!("unknown direction {:?}", other))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Upwards => "upwards",
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        };
        f.write_str(name)
    }
}

/// Thrust used by a take-off when none is given
pub const DEFAULT_TAKE_OFF_THRUST: u16 = 25_000;

/// # Shape of a thrust ramp
///
/// The ramp rises by `step` every tick until it is `span` above the starting thrust, then descends by `step` for
/// the remaining ticks. With the defaults that is 3 seconds of flight: 15 ticks of 100ms.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RampProfile {
    /// Thrust increment per tick
    pub step: u16,
    /// Thrust gained before the ramp turns around
    pub span: u16,
    /// Number of setpoints in the ramp
    pub ticks: u32,
    /// Time between setpoints, in milliseconds
    pub period_ms: u64,
    /// Roll or pitch applied for a directional flight, in degrees
    pub tilt: f32,
}

impl Default for RampProfile {
    fn default() -> Self {
        RampProfile {
            step: 500,
            span: 5000,
            ticks: 15,
            period_ms: 100,
            tilt: 2.0,
        }
    }
}

/// Longest thrust ramp accepted, in ticks
pub const MAX_RAMP_TICKS: u32 = 600;

impl RampProfile {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Reject profiles that cannot be flown: no pacing, or more than [MAX_RAMP_TICKS] setpoints
    pub fn validate(&self) -> Result<()> {
        if self.period_ms == 0 {
            return Err(Error::Config("ramp period_ms must be positive".into()));
        }
        if self.ticks > MAX_RAMP_TICKS {
            return Err(Error::Config(format!(
                "ramp of {} ticks, at most {} are allowed",
                self.ticks, MAX_RAMP_TICKS
            )));
        }
        Ok(())
    }
}

/// A queued thrust ramp flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightRequest {
    pub direction: Direction,
    pub thrust: u16,
}

impl FlightRequest {
    pub fn new(direction: Direction, thrust: u16) -> Self {
        FlightRequest { direction, thrust }
    }
}

/// # Thrust ramp
///
/// ```
/// use cfpilot::flight::{RampProfile, ThrustRamp};
///
/// let ramp = ThrustRamp::new(25_000, RampProfile::default());
/// let schedule = ramp.schedule();
/// assert_eq!(schedule.first(), Some(&25_000));
/// assert_eq!(schedule.iter().max(), Some(&30_000));
/// assert_eq!(schedule.last(), Some(&28_000));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ThrustRamp {
    start: u16,
    profile: RampProfile,
}

impl ThrustRamp {
    pub fn new(start: u16, profile: RampProfile) -> Self {
        ThrustRamp { start, profile }
    }

    /// Thrust of every tick of the ramp
    ///
    /// The turn around is checked after each tick: the tick that reaches `start + span` is still flown and the
    /// ramp descends from the next one. Thrust saturates at 0 and 65535.
    pub fn schedule(&self) -> Vec<u16> {
        let step = i64::from(self.profile.step);
        let limit = i64::from(self.start) + i64::from(self.profile.span);

        let mut thrust = i64::from(self.start);
        let mut direction = 1;
        let mut schedule = Vec::with_capacity(self.profile.ticks.min(MAX_RAMP_TICKS) as usize);

        for _ in 0..self.profile.ticks {
            schedule.push(thrust.clamp(0, i64::from(u16::MAX)) as u16);
            if thrust >= limit {
                direction = -1;
            }
            thrust += step * direction;
        }

        schedule
    }
}

/// Fly a thrust ramp
///
/// Unlocks the thrust, flies the [ThrustRamp] of `request` with the attitude of its direction, idles the motors
/// and waits one period so that the last setpoint leaves before the link can be closed.
///
/// Returns the thrust of every setpoint of the ramp.
pub async fn fly_thrust_ramp<C>(
    commander: &C,
    request: &FlightRequest,
    profile: &RampProfile,
) -> Result<Vec<u16>>
where
    C: Commander + ?Sized,
{
    let (roll, pitch) = request.direction.attitude(profile.tilt);
    let schedule = ThrustRamp::new(request.thrust, *profile).schedule();

    log::info!(
        "Taking off {} from thrust {} (roll {}, pitch {})",
        request.direction,
        request.thrust,
        roll,
        pitch
    );

    commander.send(Setpoint::IDLE).await?;

    for &thrust in &schedule {
        log::debug!("Current thrust: {}", thrust);
        commander
            .send(Setpoint::Rpyt {
                roll,
                pitch,
                yawrate: 0.0,
                thrust,
            })
            .await?;
        sleep(profile.period()).await;
    }

    commander.send(Setpoint::IDLE).await?;
    sleep(profile.period()).await;

    Ok(schedule)
}

/// Fly through `waypoints` in order
///
/// Every waypoint is held for `repeats` position setpoints sent every `period`. The motors are stopped after the
/// last waypoint.
pub async fn fly_sequence<C>(
    commander: &C,
    waypoints: &[Waypoint],
    repeats: u32,
    period: Duration,
) -> Result<()>
where
    C: Commander + ?Sized,
{
    for waypoint in waypoints {
        log::info!("Setting position {}", waypoint);
        for _ in 0..repeats {
            commander.send(waypoint.setpoint()).await?;
            sleep(period).await;
        }
    }

    commander.send(Setpoint::Stop).await?;
    sleep(period).await;

    Ok(())
}

/// Climb at `vz` m/s, world frame, for `duration`
///
/// A single velocity setpoint is sent, the Crazyflie holds it until it times out.
pub async fn climb<C>(commander: &C, vz: f32, duration: Duration) -> Result<()>
where
    C: Commander + ?Sized,
{
    commander
        .send(Setpoint::VelocityWorld {
            vx: 0.0,
            vy: 0.0,
            vz,
            yawrate: 0.0,
        })
        .await?;
    sleep(duration).await;
    Ok(())
}
