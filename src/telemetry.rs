//! # Telemetry
//!
//! Telemetry is streamed from the Crazyflie log subsystem in blocks: a set of named variables sampled together at
//! a fixed period. This module holds the ground side of it: the block definition ([LogConfig]), the decoded frames
//! ([TelemetryFrame]) and the buffer of most recent values ([LatestValues]).
//!
//! The Crazyflie limits a block to 26 bytes of payload and a period between 10ms and 2550ms. [LogConfig::validate()]
//! checks those limits before anything is sent to the Crazyflie:
//!
//! ```
//! use cfpilot::telemetry::{LogConfig, VarType};
//!
//! let mut config = LogConfig::new("Stabilizer", 100);
//! config.add_variable("stabilizer.roll", VarType::Float);
//! config.add_variable("stabilizer.thrust", VarType::Uint16);
//! assert_eq!(config.payload_size(), 6);
//! assert!(config.validate().is_ok());
//! ```

use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum payload of a log block, in bytes
pub const LOG_BLOCK_MAX_BYTES: usize = 26;

/// Shortest log period accepted by the Crazyflie, in milliseconds
pub const MIN_PERIOD_MS: u32 = 10;

/// Longest log period accepted by the Crazyflie, in milliseconds
pub const MAX_PERIOD_MS: u32 = 2550;

/// Type of a log variable, as declared by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VarType {
    Uint8,
    Uint16,
    Uint32,
    Int8,
    Int16,
    Int32,
    Float,
    Fp16,
}

impl VarType {
    /// Size of the variable in a log packet
    pub fn byte_length(&self) -> usize {
        match self {
            VarType::Uint8 | VarType::Int8 => 1,
            VarType::Uint16 | VarType::Int16 | VarType::Fp16 => 2,
            VarType::Uint32 | VarType::Int32 | VarType::Float => 4,
        }
    }

    /// C type name used by the firmware
    pub fn c_name(&self) -> &'static str {
        match self {
            VarType::Uint8 => "uint8_t",
            VarType::Uint16 => "uint16_t",
            VarType::Uint32 => "uint32_t",
            VarType::Int8 => "int8_t",
            VarType::Int16 => "int16_t",
            VarType::Int32 => "int32_t",
            VarType::Float => "float",
            VarType::Fp16 => "FP16",
        }
    }
}

impl FromStr for VarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let var_type = match s {
            "uint8_t" => VarType::Uint8,
            "uint16_t" => VarType::Uint16,
            "uint32_t" => VarType::Uint32,
            "int8_t" => VarType::Int8,
            "int16_t" => VarType::Int16,
            "int32_t" => VarType::Int32,
            "float" => VarType::Float,
            "FP16" => VarType::Fp16,
            _ => {
                return Err(Error::InvalidLogConfig(format!(
                    "unknown variable type {:?}",
                    s
                )))
            }
        };
        Ok(var_type)
    }
}

impl TryFrom<String> for VarType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VarType> for String {
    fn from(value: VarType) -> Self {
        value.c_name().to_owned()
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/// One variable of a log block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogVariable {
    /// Full name, formatted as "group.name"
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub var_type: VarType,
}

/// # Log block definition
///
/// A named set of variables streamed together every `period_ms`. The order in which variables are added is the
/// order of the values in every [TelemetryFrame] and in the [LatestValues] buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Name used when reporting errors
    pub name: String,
    /// Sampling period in milliseconds
    pub period_ms: u32,
    /// Variables, in declaration order
    pub variables: Vec<LogVariable>,
}

impl LogConfig {
    pub fn new(name: impl Into<String>, period_ms: u32) -> Self {
        LogConfig {
            name: name.into(),
            period_ms,
            variables: Vec::new(),
        }
    }

    /// Append a variable to the block
    pub fn add_variable(&mut self, name: impl Into<String>, var_type: VarType) -> &mut Self {
        self.variables.push(LogVariable {
            name: name.into(),
            var_type,
        });
        self
    }

    /// Variable names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    /// Payload size of one sample of the block
    pub fn payload_size(&self) -> usize {
        self.variables.iter().map(|v| v.var_type.byte_length()).sum()
    }

    /// Check the block against the limits of the Crazyflie log subsystem
    ///
    /// Returns [Error::InvalidLogConfig] if the block is empty, has duplicated variables, a period outside
    /// [MIN_PERIOD_MS]..=[MAX_PERIOD_MS] or a payload larger than [LOG_BLOCK_MAX_BYTES].
    pub fn validate(&self) -> Result<()> {
        if self.variables.is_empty() {
            return Err(Error::InvalidLogConfig(format!("{} has no variable", self.name)));
        }

        if !(MIN_PERIOD_MS..=MAX_PERIOD_MS).contains(&self.period_ms) {
            return Err(Error::InvalidLogConfig(format!(
                "{} period of {}ms is outside {}..={}ms",
                self.name, self.period_ms, MIN_PERIOD_MS, MAX_PERIOD_MS
            )));
        }

        let mut seen = HashSet::new();
        for name in self.names() {
            if !seen.insert(name) {
                return Err(Error::InvalidLogConfig(format!(
                    "{} is added twice to {}",
                    name, self.name
                )));
            }
        }

        let size = self.payload_size();
        if size > LOG_BLOCK_MAX_BYTES {
            return Err(Error::InvalidLogConfig(format!(
                "{} needs {} bytes, a block holds at most {}",
                self.name, size, LOG_BLOCK_MAX_BYTES
            )));
        }

        Ok(())
    }
}

/// Round to two decimal places, ties to even
///
/// ```
/// use cfpilot::telemetry::round_2dp;
///
/// assert_eq!(round_2dp(0.125), 0.12);
/// assert_eq!(round_2dp(0.375), 0.38);
/// ```
pub fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// # One sample of a log block
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFrame {
    /// Crazyflie timestamp in milliseconds
    pub timestamp: u32,
    values: Vec<(String, f64)>,
}

impl TelemetryFrame {
    pub fn new(timestamp: u32, values: Vec<(String, f64)>) -> Self {
        TelemetryFrame { timestamp, values }
    }

    /// Values in block order
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().map(|(_, v)| *v).collect()
    }

    /// Values in block order, rounded to two decimal places
    pub fn rounded(&self) -> Vec<f64> {
        self.values.iter().map(|(_, v)| round_2dp(*v)).collect()
    }

    /// Value of a variable by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Iterate over `(name, value)` pairs in block order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

/// # Most recent telemetry values
///
/// Cheap to clone, all clones share the same buffer. Every [store()](LatestValues::store) replaces the whole
/// content, there is no history. Values of a snapshot come from the same frame.
#[derive(Debug, Clone, Default)]
pub struct LatestValues {
    values: Arc<RwLock<Vec<f64>>>,
}

impl LatestValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, values: Vec<f64>) {
        let mut current = self.values.write().unwrap_or_else(|e| e.into_inner());
        *current = values;
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.values.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}
