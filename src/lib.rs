//! # cfpilot
//!
//! Telemetry logging and scripted flights for the Crazyflie, on top of the [crazyflie-lib] crate.
//!
//! The radio link, the CRTP protocol, the log and param TOCs and the setpoint encoding are all handled by
//! [crazyflie-lib]. This crate adds what a flight script needs around it:
//!
//! | Module | Role |
//! |--------|------|
//! | [config] | URI, TOC cache location, telemetry block, waypoints and flight profiles |
//! | [telemetry] | Log block definition and validation, frames, latest values buffer |
//! | [flight] | Open loop flights: thrust ramp, waypoint sequence, velocity climb |
//! | [pilot] | A session: background telemetry, queued take-offs, delayed disconnect |
//! | [vehicle] | The traits a vehicle implements, the seam with the Crazyflie library |
//! | [toc_cache] | TOC cache in a directory |
//! | [command] | Text commands of the interactive front-end |
//!
//! ## Usage
//!
//! The basic procedure is:
//!  - Build a [PilotConfig], from the defaults or from a JSON file
//!  - [connect()] to the Crazyflie and wrap the connection in a [Pilot]
//!  - Start logging, fly, and either wait for the link to close or disconnect
//!
//! For example:
//! ``` no_run
//! # async fn fly() -> Result<(), Box<dyn std::error::Error>> {
//! use cfpilot::{connect, FileTocCache, Pilot, PilotConfig};
//!
//! let config = PilotConfig::default();
//! let crazyflie = connect(&config.uri, FileTocCache::new("./cache")).await?;
//! let pilot = Pilot::new(crazyflie, config);
//!
//! pilot.start_default_logging().await?;
//! pilot.run_sequence().await?;
//! println!("Last state estimate: {:?}", pilot.latest());
//!
//! pilot.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! [crazyflie-lib]: https://crates.io/crates/crazyflie-lib

pub mod command;
pub mod config;
mod crazyflie;
mod error;
pub mod flight;
pub mod pilot;
pub mod telemetry;
pub mod toc_cache;
pub mod vehicle;

pub use crate::config::PilotConfig;
pub use crate::crazyflie::{connect, ConnectedCrazyflie};
pub use crate::error::{Error, Result};
pub use crate::flight::{Direction, FlightRequest, Waypoint};
pub use crate::pilot::Pilot;
pub use crate::toc_cache::FileTocCache;
pub use crate::vehicle::{Commander, Setpoint, TelemetryStream, Vehicle};
