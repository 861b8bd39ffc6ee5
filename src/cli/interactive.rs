use std::time::Duration;

use clap::{Parser, Subcommand};
use futures::{AsyncWriteExt, FutureExt, StreamExt};
use gc_client::{ChannelCommandSink, CommandSink};
use gc_command::{
    panel::ActionsPanel, ArmToggle, Capabilities, CommandError, CommandKind, CommandOutcome,
    CommandReceipt, CommandRequest, FlightMode, Key, KeyOutcome, LandTarget, WaypointInput,
    WaypointShortcut,
};
use gc_telemetry::{
    panel::{health_lines, QuickPanel},
    Telemetry,
};
use rustyline_async::{Readline, SharedWriter};
use tokio::{select, sync::watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[clap(setting(clap::AppSettings::NoBinaryName))]
#[clap(rename_all = "kebab-case")]
enum Commands {
    /// Show the telemetry panel
    Quick {
        /// Keep redrawing on every update for this many seconds
        #[clap(long)]
        follow: Option<u64>,
    },

    /// Show the command panel
    Actions,

    /// Show the backend connection status
    Health,

    /// Switch the UAV's flight mode
    Mode { mode: FlightMode },

    /// Send the UAV to land, at the configured location unless one is given
    Land {
        #[clap(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[clap(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        #[clap(long, allow_hyphen_values = true)]
        alt: Option<f64>,
    },

    /// Type into the waypoint box without sending anything
    Waypoint { text: String },

    /// Jump to the waypoint in the box, after typing `text` into it if given
    Go { text: Option<String> },

    /// Jump to a named point of the mission
    Jump {
        #[clap(arg_enum)]
        to: WaypointShortcut,
    },

    /// Arm or disarm, whichever the UAV is not
    Arm,

    #[clap(subcommand)]
    Mission(MissionCommand),

    #[clap(subcommand)]
    Configure(ConfigureCommand),

    Exit,
}

#[derive(Subcommand, Debug)]
#[clap(rename_all = "kebab-case")]
enum MissionCommand {
    Start,
    Restart,
    AbortLanding,
}

#[derive(Subcommand, Debug)]
#[clap(rename_all = "kebab-case")]
enum ConfigureCommand {
    SetHomeAlt,
    Calibration,
    Restart,
}

#[derive(Debug, PartialEq)]
enum Action {
    Print(String),
    Send(CommandRequest),
    Follow(Duration),
    Exit,
}

/// Everything the console needs to turn a typed line into output or a
/// command.
pub struct Console {
    pub telemetry: watch::Receiver<Telemetry>,
    pub armed: watch::Receiver<bool>,
    pub outcomes: watch::Receiver<Option<CommandOutcome>>,
    pub capabilities: Capabilities,
    pub land_target: Option<LandTarget>,
    pub waypoint: WaypointInput,
}

impl Console {
    fn quick(&self) -> String {
        QuickPanel::new(&self.telemetry.borrow()).to_string()
    }

    fn actions(&self) -> String {
        ActionsPanel::new(
            &self.capabilities,
            &self.waypoint,
            *self.armed.borrow(),
            self.outcomes.borrow().clone(),
        )
        .to_string()
    }

    fn land_target(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
        alt: Option<f64>,
    ) -> Result<LandTarget, CommandError> {
        match (lat, lon, alt, self.land_target) {
            (Some(lat), Some(lon), Some(alt), _) => Ok(LandTarget { lat, lon, alt }),
            (lat, lon, alt, Some(default)) => Ok(LandTarget {
                lat: lat.unwrap_or(default.lat),
                lon: lon.unwrap_or(default.lon),
                alt: alt.unwrap_or(default.alt),
            }),
            _ => Err(CommandError::MissingLandTarget),
        }
    }

    /// Replaces the waypoint box contents, one key at a time.
    fn type_waypoint(&mut self, text: &str) -> String {
        self.waypoint.input("");

        let filtered = text
            .chars()
            .map(|c| self.waypoint.key(Key::Char(c)))
            .filter(|outcome| *outcome == KeyOutcome::Filtered)
            .count();

        match filtered {
            0 => format!("waypoint box: {}\n", self.waypoint.value()),
            n => format!(
                "waypoint box: {} ({} characters dropped)\n",
                self.waypoint.value(),
                n
            ),
        }
    }

    fn handle(&mut self, command: Commands) -> Result<Action, CommandError> {
        let action = match command {
            Commands::Quick { follow: None } => Action::Print(self.quick()),
            Commands::Quick { follow: Some(secs) } => Action::Follow(Duration::from_secs(secs)),
            Commands::Actions => Action::Print(self.actions()),
            Commands::Health => Action::Print(health_lines(&self.telemetry.borrow())),

            Commands::Mode { mode } => Action::Send(CommandRequest::set_mode(mode)),
            Commands::Land { lat, lon, alt } => {
                Action::Send(CommandRequest::land(self.land_target(lat, lon, alt)?))
            }

            Commands::Waypoint { text } => Action::Print(self.type_waypoint(&text)),
            Commands::Go { text } => {
                if let Some(text) = text {
                    self.type_waypoint(&text);
                }
                Action::Send(CommandRequest::jump(self.waypoint.commit()?))
            }
            Commands::Jump { to } => Action::Send(CommandRequest::jump(to.index())),

            Commands::Arm => {
                let toggle = ArmToggle::from(*self.armed.borrow());
                Action::Send(CommandRequest::arm(toggle, self.waypoint.value()))
            }

            Commands::Mission(cmd) => Action::Send(CommandRequest::new(match cmd {
                MissionCommand::Start => CommandKind::MissionStart,
                MissionCommand::Restart => CommandKind::MissionRestart,
                MissionCommand::AbortLanding => CommandKind::AbortLanding,
            })),
            Commands::Configure(cmd) => Action::Send(CommandRequest::new(match cmd {
                ConfigureCommand::SetHomeAlt => CommandKind::SetHomeAltitude,
                ConfigureCommand::Calibration => CommandKind::Calibration,
                ConfigureCommand::Restart => CommandKind::SystemRestart,
            })),

            Commands::Exit => Action::Exit,
        };

        Ok(action)
    }
}

async fn follow_quick(
    console: &Console,
    stdout: &mut SharedWriter,
    duration: Duration,
    cancellation_token: &CancellationToken,
) -> anyhow::Result<()> {
    let mut updates = WatchStream::new(console.telemetry.clone());
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        select! {
            _ = cancellation_token.cancelled() => break,
            _ = &mut deadline => break,
            update = updates.next() => match update {
                Some(telemetry) => {
                    let rendered = QuickPanel::new(&telemetry).to_string();
                    stdout.write_all(rendered.as_bytes()).await?;
                }
                None => break,
            },
        }
    }

    Ok(())
}

pub async fn run_interactive_cli(
    mut editor: Readline,
    mut stdout: SharedWriter,
    mut console: Console,
    cmd_tx: ChannelCommandSink<CommandRequest, CommandReceipt>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        select! {
            _ = cancellation_token.cancelled() => {
                break;
            }
            result = editor.readline().fuse() => {
                match result {
                    Ok(line) => {
                        stdout.write_all(format!("gc> {}\n", line).as_bytes()).await?;

                        let request: Result<Commands, _> = Parser::try_parse_from(line.split_ascii_whitespace());

                        let request = match request {
                            Ok(request) => request,
                            Err(err) => {
                                stdout.write_all(err.to_string().as_bytes()).await?;
                                continue;
                            },
                        };

                        editor.add_history_entry(line);

                        match console.handle(request) {
                            Ok(Action::Print(text)) => {
                                stdout.write_all(text.as_bytes()).await?;
                            }
                            Ok(Action::Follow(duration)) => {
                                follow_quick(&console, &mut stdout, duration, &cancellation_token).await?;
                            }
                            Ok(Action::Send(request)) => {
                                let kind = request.kind;
                                match cmd_tx.command(request).await {
                                    Ok(receipt) => info!("{} sent to {}", kind, receipt.endpoint),
                                    Err(err) => error!("{}: {:#}", kind, err),
                                }
                            }
                            Ok(Action::Exit) => {
                                info!("exiting");
                                cancellation_token.cancel();
                            }
                            Err(err) => {
                                stdout.write_all(format!("{}\n", err).as_bytes()).await?;
                            }
                        };
                    }
                    Err(err) => {
                        error!("interactive error: {:#?}", err);
                        break;
                    }
                };
            }
        }
    }

    cancellation_token.cancel();

    Ok(())
}
