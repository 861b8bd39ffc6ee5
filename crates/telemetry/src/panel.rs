//! The "Quick" view: the latest UAV and UGV snapshots laid out as labeled
//! boxes, preceded by the connection indicator.

use std::fmt;

use chrono::Local;
use colored::Colorize;
use gc_types::{UavQuickStats, UgvQuickStats};
use prettytable::{format, Cell, Row, Table};
use uom::si::{
    angle::degree,
    electric_potential::volt,
    f64::{Angle, ElectricPotential, Length, Velocity},
    length::foot,
    velocity::mile_per_hour,
};

use crate::{LinkHealth, LinkStatus, Telemetry};

const DEGREE: char = '\u{00B0}';

pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

pub fn feet(value: Length) -> String {
    format!("{} ft", fixed(value.get::<foot>(), 2))
}

pub fn mph(value: Velocity) -> String {
    format!("{} mph", fixed(value.get::<mile_per_hour>(), 2))
}

pub fn degrees(value: Angle) -> String {
    format!("{}{}", fixed(value.get::<degree>(), 2), DEGREE)
}

pub fn volts(value: ElectricPotential) -> String {
    format!("{}V", fixed(value.get::<volt>(), 2))
}

// hemispheres are fixed to the competition field (north-west)
pub fn latitude(value: f64) -> String {
    format!("{}{} N", fixed(value.abs(), 8), DEGREE)
}

pub fn longitude(value: f64) -> String {
    format!("{}{} W", fixed(value.abs(), 8), DEGREE)
}

pub fn throttle(value: Option<f64>) -> String {
    match value {
        Some(t) if t != 0.0 => format!("{} %", fixed(t, 2)),
        _ => "0".to_owned(),
    }
}

/// Waypoints are stored zero-based and shown one-based.
pub fn waypoint_number(index: u32) -> String {
    format!("#{}", u64::from(index) + 1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    pub label: &'static str,
    pub content: String,
}

fn labeled(label: &'static str, content: impl Into<String>) -> LabeledBox {
    LabeledBox {
        label,
        content: content.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub rows: Vec<Vec<LabeledBox>>,
}

impl Section {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .flatten()
            .find(|b| b.label == label)
            .map(|b| b.content.as_str())
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        for row in &self.rows {
            table.add_row(Row::new(
                row.iter()
                    .map(|b| Cell::new(&format!("{}\n{}", b.label, b.content.bold())))
                    .collect(),
            ));
        }

        table
    }
}

pub fn uav_section(stats: &UavQuickStats) -> Section {
    let title = if stats.armed { "Plane (ARMED)" } else { "Plane" };

    Section {
        title: title.to_owned(),
        rows: vec![
            vec![
                labeled("Altitude", feet(stats.altitude)),
                labeled("Throttle", throttle(stats.throttle)),
                labeled("Roll", degrees(stats.orientation.roll)),
                labeled("Pitch", degrees(stats.orientation.pitch)),
                labeled("Yaw", degrees(stats.orientation.yaw)),
            ],
            vec![
                labeled("Latitude", latitude(stats.position.lat())),
                labeled("Longitude", longitude(stats.position.lon())),
                labeled("Battery (6S)", volts(stats.battery)),
            ],
            vec![
                labeled("Ground Speed", mph(stats.ground_speed)),
                labeled("Airspeed", mph(stats.air_speed)),
                labeled("Status", stats.status.clone()),
                labeled("Mode", stats.mode.clone()),
            ],
            vec![
                labeled("Waypoint #", waypoint_number(stats.waypoint.index)),
                labeled("Distance", feet(stats.waypoint.distance)),
                labeled("GPS HDOP", fixed(stats.gps.hdop, 2)),
                labeled("GPS VDOP", fixed(stats.gps.vdop, 2)),
                labeled("Satellites", stats.gps.satellites.to_string()),
            ],
        ],
    }
}

pub fn ugv_section(stats: &UgvQuickStats) -> Section {
    Section {
        title: "UGV".to_owned(),
        rows: vec![
            vec![
                labeled("Current State", stats.current_state.clone()),
                labeled("Next Objective", stats.next_objective.clone()),
                labeled("To Destination", feet(stats.distance_to_waypoint)),
            ],
            vec![
                labeled("Latitude", latitude(stats.position.lat())),
                labeled("Longitude", longitude(stats.position.lon())),
            ],
            vec![
                labeled("Ground Speed", mph(stats.ground_speed)),
                labeled("Yaw", degrees(stats.yaw)),
                labeled("GPS HDOP", fixed(stats.gps.hdop, 2)),
                labeled("GPS VDOP", fixed(stats.gps.vdop, 2)),
                labeled("Satellites", stats.gps.satellites.to_string()),
            ],
        ],
    }
}

pub fn health_line(vehicle: &str, health: &LinkHealth) -> String {
    let stale = health
        .staleness(Local::now())
        .map(|secs| format!(", last update {:.1}s ago", secs))
        .unwrap_or_default();

    let error = health
        .last_error
        .as_ref()
        .map(|e| format!(" ({}: {})", e.kind, e.message))
        .unwrap_or_default();

    let status = match health.status {
        LinkStatus::Connecting => "● LINK CONNECTING".blue().to_string(),
        LinkStatus::Connected => format!("{}{}", "● LINK OK".green(), stale),
        LinkStatus::Degraded => format!(
            "{}{}{}",
            format!("● LINK DEGRADED, {} failed polls", health.consecutive_failures).yellow(),
            stale,
            error
        ),
        LinkStatus::Disconnected => format!(
            "{}{}{}",
            "● LINK LOST".red().bold(),
            stale,
            error
        ),
    };

    format!("{} {}", vehicle, status)
}

/// One health line per vehicle, UAV first.
pub fn health_lines(telemetry: &Telemetry) -> String {
    format!(
        "{}\n{}\n",
        health_line("UAV", &telemetry.uav_health),
        health_line("UGV", &telemetry.ugv_health)
    )
}

/// Everything the Quick view shows for one telemetry snapshot. Vehicles that
/// have not reported yet are shown with zeroed values.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickPanel {
    pub health: String,
    pub uav: Section,
    pub ugv: Section,
}

impl QuickPanel {
    pub fn new(telemetry: &Telemetry) -> Self {
        let uav = telemetry
            .uav
            .as_ref()
            .map(|s| uav_section(&s.value))
            .unwrap_or_else(|| uav_section(&UavQuickStats::default()));

        let ugv = telemetry
            .ugv
            .as_ref()
            .map(|s| ugv_section(&s.value))
            .unwrap_or_else(|| ugv_section(&UgvQuickStats::default()));

        QuickPanel {
            health: health_lines(telemetry),
            uav,
            ugv,
        }
    }
}

impl fmt::Display for QuickPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.health)?;

        for section in [&self.uav, &self.ugv] {
            writeln!(f, "{}", section.title.bold())?;
            write!(f, "{}", section.table())?;
        }

        Ok(())
    }
}
