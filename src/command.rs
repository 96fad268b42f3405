//! # Interactive commands
//!
//! Text commands accepted by the interactive front-end, one per line:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `show` | print the latest telemetry values |
//! | `fly <direction> [thrust]` | queue a thrust ramp take-off |
//! | `sequence` | fly the waypoint sequence |
//! | `climb` | velocity take-off |
//! | `disconnect` | disconnect after the configured delay |
//! | `quit` | disconnect now and exit |
//!
//! ```
//! use cfpilot::command::PilotCommand;
//! use cfpilot::Direction;
//!
//! let command: PilotCommand = "fly left 20000".parse().unwrap();
//! assert_eq!(command, PilotCommand::Fly { direction: Direction::Left, thrust: 20000 });
//! ```

use std::str::FromStr;

use crate::flight::{Direction, DEFAULT_TAKE_OFF_THRUST};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PilotCommand {
    Show,
    Fly { direction: Direction, thrust: u16 },
    Sequence,
    Climb,
    Disconnect,
    Quit,
    Help,
}

impl FromStr for PilotCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut words = s.split_whitespace();
        let verb = words.next().unwrap_or("").to_ascii_lowercase();

        let command = match verb.as_str() {
            "show" | "list" => PilotCommand::Show,
            "fly" | "takeoff" | "take-off" => {
                let direction = match words.next() {
                    Some(direction) => direction.parse()?,
                    None => Direction::Upwards,
                };
                let thrust = match words.next() {
                    Some(thrust) => thrust
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid thrust {:?}", thrust)))?,
                    None => DEFAULT_TAKE_OFF_THRUST,
                };
                PilotCommand::Fly { direction, thrust }
            }
            "sequence" => PilotCommand::Sequence,
            "climb" => PilotCommand::Climb,
            "disconnect" => PilotCommand::Disconnect,
            "quit" | "exit" => PilotCommand::Quit,
            "help" | "?" => PilotCommand::Help,
            "" => return Err(Error::Config("empty command".into())),
            other => return Err(Error::Config(format!("unknown command {:?}", other))),
        };

        if let Some(extra) = words.next() {
            return Err(Error::Config(format!("unexpected argument {:?}", extra)));
        }

        Ok(command)
    }
}
