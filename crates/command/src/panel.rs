//! The "Actions" view. Buttons are grouped the way the operator finds them on
//! the field laptop; anything the backend cannot serve is drawn struck out.

use std::fmt;

use colored::Colorize;
use prettytable::{format, Cell, Row, Table};

use crate::{
    ArmToggle, Capabilities, CommandKind, CommandOutcome, FlightMode, WaypointInput,
    WaypointShortcut,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub label: String,
    pub kind: CommandKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonGroup {
    pub title: &'static str,
    pub rows: Vec<Vec<Button>>,
}

impl ButtonGroup {
    pub fn button(&self, label: &str) -> Option<&Button> {
        self.rows.iter().flatten().find(|b| b.label == label)
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        for row in &self.rows {
            table.add_row(Row::new(
                row.iter()
                    .map(|b| {
                        let label = if b.enabled {
                            b.label.bold()
                        } else {
                            b.label.dimmed().strikethrough()
                        };
                        Cell::new(&label.to_string())
                    })
                    .collect(),
            ));
        }

        table
    }
}

/// Everything the Actions view shows: four button groups, the waypoint box and
/// the result of the last command.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionsPanel {
    pub groups: Vec<ButtonGroup>,
    pub waypoint: String,
    pub outcome: Option<CommandOutcome>,
}

impl ActionsPanel {
    pub fn new(
        capabilities: &Capabilities,
        input: &WaypointInput,
        armed: bool,
        outcome: Option<CommandOutcome>,
    ) -> Self {
        let button = |label: &str, kind: CommandKind| Button {
            label: label.to_owned(),
            kind,
            enabled: capabilities.is_enabled(kind),
        };

        let mode = |mode: FlightMode| button(mode.as_str(), CommandKind::SetMode);

        let land = button("LAND", CommandKind::InsertCommand);

        let modes = ButtonGroup {
            title: "Flight Modes",
            rows: vec![
                vec![
                    mode(FlightMode::Manual),
                    mode(FlightMode::Auto),
                    mode(FlightMode::Takeoff),
                    land,
                ],
                vec![
                    mode(FlightMode::Loiter),
                    mode(FlightMode::Circle),
                    mode(FlightMode::Stabilize),
                    mode(FlightMode::Rtl),
                ],
            ],
        };

        let shortcuts = [
            WaypointShortcut::Waypoints,
            WaypointShortcut::Odlc,
            WaypointShortcut::Map,
        ]
        .iter()
        .map(|s| button(s.label(), CommandKind::JumpToWaypoint))
        .collect();

        let waypoints = ButtonGroup {
            title: "Waypoints",
            rows: vec![vec![button("GO!", CommandKind::JumpToWaypoint)], shortcuts],
        };

        let mission = ButtonGroup {
            title: "Mission",
            rows: vec![vec![
                button("START", CommandKind::MissionStart),
                button("RESTART", CommandKind::MissionRestart),
                button("ABORT LANDING", CommandKind::AbortLanding),
            ]],
        };

        let toggle = ArmToggle::from(armed);
        let configuration = ButtonGroup {
            title: "Configuration",
            rows: vec![vec![
                button("SET HOME ALT", CommandKind::SetHomeAltitude),
                button("CALIBRATION", CommandKind::Calibration),
                button(toggle.label(), toggle.kind()),
                button("RESTART", CommandKind::SystemRestart),
            ]],
        };

        let waypoint = if input.value().is_empty() {
            "#".to_owned()
        } else {
            input.value().to_owned()
        };

        ActionsPanel {
            groups: vec![modes, waypoints, mission, configuration],
            waypoint,
            outcome,
        }
    }

    pub fn group(&self, title: &str) -> Option<&ButtonGroup> {
        self.groups.iter().find(|g| g.title == title)
    }
}

fn outcome_line(outcome: &CommandOutcome) -> String {
    let at = outcome.at.format("%H:%M:%S");

    match &outcome.error {
        None => format!("{} {} sent", at, outcome.kind).green().to_string(),
        Some(err) => format!("{} {} failed: {}", at, outcome.kind, err)
            .red()
            .to_string(),
    }
}

impl fmt::Display for ActionsPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "{}", group.title.bold())?;
            if group.title == "Waypoints" {
                writeln!(f, "[{:>3}]", self.waypoint)?;
            }
            write!(f, "{}", group.table())?;
        }

        if let Some(outcome) = &self.outcome {
            writeln!(f, "{}", outcome_line(outcome))?;
        }

        Ok(())
    }
}
