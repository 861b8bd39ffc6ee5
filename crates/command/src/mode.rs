use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightMode {
    Manual,
    Auto,
    Takeoff,
    Loiter,
    Circle,
    Stabilize,
    Rtl,
}

impl FlightMode {
    pub const ALL: [FlightMode; 7] = [
        FlightMode::Manual,
        FlightMode::Auto,
        FlightMode::Takeoff,
        FlightMode::Loiter,
        FlightMode::Circle,
        FlightMode::Stabilize,
        FlightMode::Rtl,
    ];

    /// Name the autopilot knows the mode by.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightMode::Manual => "MANUAL",
            FlightMode::Auto => "AUTO",
            FlightMode::Takeoff => "TAKEOFF",
            FlightMode::Loiter => "LOITER",
            FlightMode::Circle => "CIRCLE",
            FlightMode::Stabilize => "STABILIZE",
            FlightMode::Rtl => "RTL",
        }
    }
}

impl fmt::Display for FlightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid flight mode {0:?}, expected one of MANUAL, AUTO, TAKEOFF, LOITER, CIRCLE, STABILIZE, RTL")]
pub struct ParseModeError(String);

impl FromStr for FlightMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlightMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseModeError(s.to_owned()))
    }
}
