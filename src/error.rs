use std::fmt;

/// [Result] alias for return types of the crate API
pub type Result<T> = std::result::Result<T, Error>;

/// Error enum type
#[derive(Debug)]
pub enum Error {
    /// The link could not be opened or the Crazyflie did not answer.
    Connection {
        /// URI that was being connected
        uri: String,
        /// Reason reported by the link
        reason: String,
    },
    /// A telemetry variable is not present in the log TOC of the connected Crazyflie.
    VariableNotFound(String),
    /// The log block definition is not acceptable. The String contains the reason.
    InvalidLogConfig(String),
    /// Error returned by the Crazyflie library.
    Crazyflie(crazyflie_lib::Error),
    /// The Crazyflie is already executing a flight.
    Busy,
    /// The Crazyflie object is currently disconnected.
    Disconnected,
    /// Configuration file could not be parsed. The String contains the reason.
    Config(String),
    /// Input/output error, mostly from the TOC cache and the configuration file.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection { uri, reason } => {
                write!(f, "connection to {} failed: {}", uri, reason)
            }
            Error::VariableNotFound(name) => write!(f, "{} not found in TOC", name),
            Error::InvalidLogConfig(reason) => write!(f, "bad log configuration: {}", reason),
            Error::Crazyflie(e) => write!(f, "crazyflie error: {:?}", e),
            Error::Busy => write!(f, "a flight is already in progress"),
            Error::Disconnected => write!(f, "disconnected"),
            Error::Config(reason) => write!(f, "invalid configuration: {}", reason),
            Error::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crazyflie_lib::Error> for Error {
    fn from(error: crazyflie_lib::Error) -> Self {
        match error {
            crazyflie_lib::Error::Disconnected => Self::Disconnected,
            e => Self::Crazyflie(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(format!("{}", error))
    }
}

