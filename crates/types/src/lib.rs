//! Telemetry data shared between the poller, the panels and the command
//! console.
//!
//! The `*Wire` types mirror the JSON served by the backend's `/uav/stats` and
//! `/ugv/stats` endpoints. They are converted into the display snapshots
//! ([`UavQuickStats`], [`UgvQuickStats`]) which the rest of the workspace
//! works with.

use serde::Deserialize;
use uom::si::{
    angle::degree,
    electric_potential::volt,
    f64::{Angle, ElectricPotential, Length, Velocity},
    length::foot,
    velocity::mile_per_hour,
};

/// Every backend response is wrapped in `{ "result": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub result: T,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub yaw: Angle,
    pub pitch: Angle,
    pub roll: Angle,
}

impl Orientation {
    pub fn new<T: uom::si::angle::Unit + uom::Conversion<f64, T = f64>>(
        yaw: f64,
        pitch: f64,
        roll: f64,
    ) -> Self {
        Self {
            yaw: Angle::new::<T>(yaw),
            pitch: Angle::new::<T>(pitch),
            roll: Angle::new::<T>(roll),
        }
    }
}

/// Orientation as sent by the backend, in degrees.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrientationWire {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// x is longitude, y is latitude, both in degrees
    pub point: geo::Point<f64>,
}

impl Default for Position {
    fn default() -> Self {
        Position::new(0.0, 0.0)
    }
}

impl Position {
    pub fn new(lat: f64, lon: f64) -> Self {
        Position {
            point: geo::Point::new(lon, lat),
        }
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lon(&self) -> f64 {
        self.point.x()
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct WaypointProgress {
    /// Zero-based index into the mission plan
    pub index: u32,

    pub distance: Length,
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct GpsQuality {
    pub hdop: f64,
    pub vdop: f64,
    pub satellites: u32,
}

impl From<(f64, f64, u32)> for GpsQuality {
    fn from((hdop, vdop, satellites): (f64, f64, u32)) -> Self {
        GpsQuality {
            hdop,
            vdop,
            satellites,
        }
    }
}

/// Result of `GET /uav/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct UavStatsWire {
    pub mode: String,
    pub armed: bool,
    pub status: String,
    pub quick: UavQuickWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UavQuickWire {
    pub altitude: f64,
    #[serde(default)]
    pub throttle: Option<f64>,
    pub orientation: OrientationWire,
    pub lat: f64,
    pub lon: f64,
    pub ground_speed: f64,
    pub air_speed: f64,
    pub battery: f64,
    /// (index, distance in feet)
    pub waypoint: (u32, f64),
    /// (hdop, vdop, satellites)
    pub connection: (f64, f64, u32),
}

/// Result of `GET /ugv/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct UgvStatsWire {
    pub quick: UgvQuickWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UgvQuickWire {
    /// (current state, next objective, distance to waypoint in feet)
    pub states: (String, String, f64),
    pub yaw: f64,
    pub lat: f64,
    pub lon: f64,
    pub ground_speed: f64,
    pub connection: (f64, f64, u32),
}

/// The subset of `GET /uav/stats` needed to label the arm toggle.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ArmedWire {
    pub armed: bool,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct UavQuickStats {
    pub altitude: Length,

    /// Throttle in percent, absent when the autopilot does not report it
    pub throttle: Option<f64>,

    pub orientation: Orientation,
    pub position: Position,
    pub mode: String,
    pub armed: bool,
    pub status: String,
    pub ground_speed: Velocity,
    pub air_speed: Velocity,
    pub battery: ElectricPotential,
    pub waypoint: WaypointProgress,
    pub gps: GpsQuality,
}

impl From<UavStatsWire> for UavQuickStats {
    fn from(wire: UavStatsWire) -> Self {
        let UavStatsWire {
            mode,
            armed,
            status,
            quick,
        } = wire;

        let OrientationWire { yaw, pitch, roll } = quick.orientation;

        UavQuickStats {
            altitude: Length::new::<foot>(quick.altitude),
            throttle: quick.throttle,
            orientation: Orientation::new::<degree>(yaw, pitch, roll),
            position: Position::new(quick.lat, quick.lon),
            mode,
            armed,
            status,
            ground_speed: Velocity::new::<mile_per_hour>(quick.ground_speed),
            air_speed: Velocity::new::<mile_per_hour>(quick.air_speed),
            battery: ElectricPotential::new::<volt>(quick.battery),
            waypoint: WaypointProgress {
                index: quick.waypoint.0,
                distance: Length::new::<foot>(quick.waypoint.1),
            },
            gps: quick.connection.into(),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct UgvQuickStats {
    pub current_state: String,
    pub next_objective: String,
    pub distance_to_waypoint: Length,
    pub yaw: Angle,
    pub position: Position,
    pub ground_speed: Velocity,
    pub gps: GpsQuality,
}

impl From<UgvStatsWire> for UgvQuickStats {
    fn from(wire: UgvStatsWire) -> Self {
        let (current_state, next_objective, distance) = wire.quick.states;

        UgvQuickStats {
            current_state,
            next_objective,
            distance_to_waypoint: Length::new::<foot>(distance),
            yaw: Angle::new::<degree>(wire.quick.yaw),
            position: Position::new(wire.quick.lat, wire.quick.lon),
            ground_speed: Velocity::new::<mile_per_hour>(wire.quick.ground_speed),
            gps: wire.quick.connection.into(),
        }
    }
}
