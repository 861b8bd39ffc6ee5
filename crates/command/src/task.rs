use async_trait::async_trait;
use chrono::{DateTime, Local};
use gc_backend::BackendClient;
use gc_client::{ChannelCommandSink, ChannelCommandSource, Task};
use tokio::{select, sync::watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Capabilities, CommandError, CommandKind, CommandRequest, CommandsConfig};

/// Proof that the backend accepted a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReceipt {
    pub kind: CommandKind,
    pub endpoint: String,
}

/// Result of the most recent command, shown under the Actions panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub kind: CommandKind,
    pub at: DateTime<Local>,
    pub error: Option<String>,
}

/// Checks a request against the capability set and sends it once. Nothing is
/// retried.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    client: BackendClient,
    capabilities: Capabilities,
}

impl CommandDispatcher {
    pub fn new(client: BackendClient, capabilities: Capabilities) -> Self {
        CommandDispatcher {
            client,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub async fn dispatch(&self, request: &CommandRequest) -> Result<CommandReceipt, CommandError> {
        let endpoint = match request.endpoint() {
            Some(endpoint) if self.capabilities.is_enabled(request.kind) => endpoint,
            _ => return Err(CommandError::Unavailable(request.kind)),
        };

        self.client.post_json(endpoint, &request.parameters).await?;

        Ok(CommandReceipt {
            kind: request.kind,
            endpoint: endpoint.to_owned(),
        })
    }
}

pub struct CommandTask {
    dispatcher: CommandDispatcher,
    cmd_tx: ChannelCommandSink<CommandRequest, CommandReceipt>,
    cmd_rx: ChannelCommandSource<CommandRequest, CommandReceipt>,
    outcome_tx: watch::Sender<Option<CommandOutcome>>,
    outcome_rx: watch::Receiver<Option<CommandOutcome>>,
}

pub fn create_task(config: &CommandsConfig, client: BackendClient) -> anyhow::Result<CommandTask> {
    let (cmd_tx, cmd_rx) = flume::bounded(256);
    let (outcome_tx, outcome_rx) = watch::channel(None);

    let capabilities = Capabilities::default().without(config.disabled.iter().copied());

    Ok(CommandTask {
        dispatcher: CommandDispatcher::new(client, capabilities),
        cmd_tx,
        cmd_rx,
        outcome_tx,
        outcome_rx,
    })
}

impl CommandTask {
    pub fn cmd(&self) -> ChannelCommandSink<CommandRequest, CommandReceipt> {
        self.cmd_tx.clone()
    }

    pub fn outcomes(&self) -> watch::Receiver<Option<CommandOutcome>> {
        self.outcome_rx.clone()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.dispatcher.capabilities().clone()
    }
}

#[async_trait]
impl Task for CommandTask {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            dispatcher,
            cmd_rx,
            outcome_tx,
            ..
        } = *self;

        let loop_fut = async {
            while let Ok((request, ret_tx)) = cmd_rx.recv_async().await {
                debug!("dispatching {:?}", request);

                let result = dispatcher.dispatch(&request).await;

                match &result {
                    Ok(receipt) => info!("{} accepted by {}", receipt.kind, receipt.endpoint),
                    Err(err) => warn!("{} failed: {}", request.kind, err),
                }

                let _ = outcome_tx.send(Some(CommandOutcome {
                    kind: request.kind,
                    at: Local::now(),
                    error: result.as_ref().err().map(|e| e.to_string()),
                }));

                // the console may have given up waiting
                let _ = ret_tx.send(result.map_err(anyhow::Error::from));
            }

            Ok::<_, anyhow::Error>(())
        };

        select! {
          _ = cancel.cancelled() => {}
          res = loop_fut => { res? }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gc_backend::{
        mock::{MockBackend, RecordedPost},
        ErrorKind,
    };
    use gc_client::CommandSink;
    use serde_json::json;

    use super::*;
    use crate::{ArmToggle, FlightMode, LandTarget, WaypointShortcut};

    fn dispatcher(backend: &MockBackend) -> CommandDispatcher {
        CommandDispatcher::new(
            BackendClient::new(&backend.config()).unwrap(),
            Capabilities::default(),
        )
    }

    #[tokio::test]
    async fn commands_are_posted_to_their_endpoints() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        let dispatcher = dispatcher(&backend);

        dispatcher
            .dispatch(&CommandRequest::set_mode(FlightMode::Auto))
            .await?;
        dispatcher
            .dispatch(&CommandRequest::land(LandTarget {
                lat: 38.1,
                lon: -76.4,
                alt: 10.0,
            }))
            .await?;
        dispatcher
            .dispatch(&CommandRequest::jump(WaypointShortcut::Map.index()))
            .await?;
        let receipt = dispatcher
            .dispatch(&CommandRequest::arm(ArmToggle::from(false), "5"))
            .await?;

        assert_eq!(receipt.endpoint, "/uav/arm");
        assert_eq!(
            backend.posts(),
            vec![
                RecordedPost {
                    path: "/uav/mode/set".into(),
                    body: json!({ "mode": "AUTO" }),
                },
                RecordedPost {
                    path: "/uav/commands/insert".into(),
                    body: json!({ "command": "LAND", "lat": 38.1, "lon": -76.4, "alt": 10.0 }),
                },
                RecordedPost {
                    path: "/uav/commands/jump".into(),
                    body: json!({ "command": 50 }),
                },
                RecordedPost {
                    path: "/uav/arm".into(),
                    body: json!({ "command": "5" }),
                },
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn placeholder_commands_send_nothing() {
        let backend = MockBackend::start();
        let dispatcher = dispatcher(&backend);

        for kind in [
            CommandKind::MissionStart,
            CommandKind::AbortLanding,
            CommandKind::Calibration,
        ] {
            let err = dispatcher
                .dispatch(&CommandRequest::new(kind))
                .await
                .unwrap_err();
            assert!(matches!(err, CommandError::Unavailable(k) if k == kind));
        }

        assert_eq!(backend.total_hits(), 0);
    }

    #[tokio::test]
    async fn rejected_command_is_reported() {
        let backend = MockBackend::start();
        backend.reject_posts(409);

        let err = dispatcher(&backend)
            .dispatch(&CommandRequest::arm(ArmToggle::Arm, ""))
            .await
            .unwrap_err();

        match err {
            CommandError::Backend(err) => assert_eq!(err.kind(), ErrorKind::CommandRejected),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn task_answers_over_the_channel() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        let config = CommandsConfig {
            disabled: vec![CommandKind::JumpToWaypoint],
            ..Default::default()
        };

        let task = create_task(&config, BackendClient::new(&backend.config())?)?;
        let cmd_tx = task.cmd();
        let mut outcomes = task.outcomes();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Box::new(task).run(cancel.clone()));

        let receipt = cmd_tx
            .command(CommandRequest::set_mode(FlightMode::Rtl))
            .await?;
        assert_eq!(receipt.kind, CommandKind::SetMode);

        let err = cmd_tx.command(CommandRequest::jump(3)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Unavailable(CommandKind::JumpToWaypoint))
        ));

        outcomes.changed().await?;
        let outcome = outcomes.borrow().clone().unwrap();
        assert_eq!(outcome.kind, CommandKind::JumpToWaypoint);
        assert!(outcome.error.is_some());

        assert_eq!(backend.posts().len(), 1);

        cancel.cancel();
        handle.await??;
        Ok(())
    }
}
