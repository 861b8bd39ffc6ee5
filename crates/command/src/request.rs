use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{ArmToggle, FlightMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    SetMode,
    InsertCommand,
    JumpToWaypoint,
    Arm,
    Disarm,

    // present on the panel, but the backend has no endpoint for them yet
    MissionStart,
    MissionRestart,
    AbortLanding,
    SetHomeAltitude,
    Calibration,
    SystemRestart,
}

impl CommandKind {
    pub const ALL: [CommandKind; 11] = [
        CommandKind::SetMode,
        CommandKind::InsertCommand,
        CommandKind::JumpToWaypoint,
        CommandKind::Arm,
        CommandKind::Disarm,
        CommandKind::MissionStart,
        CommandKind::MissionRestart,
        CommandKind::AbortLanding,
        CommandKind::SetHomeAltitude,
        CommandKind::Calibration,
        CommandKind::SystemRestart,
    ];

    /// Backend path which serves this command, if there is one.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            CommandKind::SetMode => Some("/uav/mode/set"),
            CommandKind::InsertCommand => Some("/uav/commands/insert"),
            CommandKind::JumpToWaypoint => Some("/uav/commands/jump"),
            CommandKind::Arm => Some("/uav/arm"),
            CommandKind::Disarm => Some("/uav/disarm"),
            CommandKind::MissionStart
            | CommandKind::MissionRestart
            | CommandKind::AbortLanding
            | CommandKind::SetHomeAltitude
            | CommandKind::Calibration
            | CommandKind::SystemRestart => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandKind::SetMode => "set mode",
            CommandKind::InsertCommand => "insert command",
            CommandKind::JumpToWaypoint => "jump to waypoint",
            CommandKind::Arm => "arm",
            CommandKind::Disarm => "disarm",
            CommandKind::MissionStart => "mission start",
            CommandKind::MissionRestart => "mission restart",
            CommandKind::AbortLanding => "abort landing",
            CommandKind::SetHomeAltitude => "set home altitude",
            CommandKind::Calibration => "calibration",
            CommandKind::SystemRestart => "restart",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl From<&str> for CommandValue {
    fn from(s: &str) -> Self {
        CommandValue::Text(s.to_owned())
    }
}

impl From<String> for CommandValue {
    fn from(s: String) -> Self {
        CommandValue::Text(s)
    }
}

impl From<i64> for CommandValue {
    fn from(i: i64) -> Self {
        CommandValue::Integer(i)
    }
}

impl From<f64> for CommandValue {
    fn from(n: f64) -> Self {
        CommandValue::Number(n)
    }
}

/// Location the vehicle is sent to by the land command.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LandTarget {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lon: f64,

    /// Altitude in meters, relative to home
    pub alt: f64,
}

/// Named mission phases the panel can jump straight to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ArgEnum)]
pub enum WaypointShortcut {
    /// start of the waypoint run (#1)
    Waypoints,
    /// object detection, localization and classification (#20)
    Odlc,
    /// mapping run (#50)
    Map,
}

impl WaypointShortcut {
    pub fn index(&self) -> u16 {
        match self {
            WaypointShortcut::Waypoints => 1,
            WaypointShortcut::Odlc => 20,
            WaypointShortcut::Map => 50,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaypointShortcut::Waypoints => "WAYPOINTS (#1)",
            WaypointShortcut::Odlc => "ODLC (#20)",
            WaypointShortcut::Map => "MAP (#50)",
        }
    }
}

/// A single operator command: what to do and the JSON body to send.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub parameters: BTreeMap<String, CommandValue>,
}

impl CommandRequest {
    pub fn new(kind: CommandKind) -> Self {
        CommandRequest {
            kind,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<CommandValue>) -> Self {
        self.parameters.insert(key.to_owned(), value.into());
        self
    }

    pub fn set_mode(mode: FlightMode) -> Self {
        CommandRequest::new(CommandKind::SetMode).with("mode", mode.as_str())
    }

    pub fn land(target: LandTarget) -> Self {
        CommandRequest::new(CommandKind::InsertCommand)
            .with("command", "LAND")
            .with("lat", target.lat)
            .with("lon", target.lon)
            .with("alt", target.alt)
    }

    pub fn jump(index: u16) -> Self {
        CommandRequest::new(CommandKind::JumpToWaypoint).with("command", i64::from(index))
    }

    /// `input` is the current text of the waypoint box, sent along as the
    /// command value.
    pub fn arm(toggle: ArmToggle, input: &str) -> Self {
        CommandRequest::new(toggle.kind()).with("command", input)
    }

    pub fn endpoint(&self) -> Option<&'static str> {
        self.kind.endpoint()
    }
}
