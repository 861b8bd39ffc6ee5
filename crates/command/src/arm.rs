use anyhow::bail;
use async_trait::async_trait;
use gc_backend::BackendClient;
use gc_client::Task;
use gc_telemetry::{
    poll::{poll_loop, Generation},
    TelemetryConfig, UAV_STATS_PATH,
};
use gc_types::{ArmedWire, Envelope};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::CommandKind;

/// The single ARM/DISARM button. What it says and where it goes depends on the
/// last armed flag read from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmToggle {
    Arm,
    Disarm,
}

impl From<bool> for ArmToggle {
    fn from(armed: bool) -> Self {
        if armed {
            ArmToggle::Disarm
        } else {
            ArmToggle::Arm
        }
    }
}

impl ArmToggle {
    pub fn label(&self) -> &'static str {
        match self {
            ArmToggle::Arm => "ARM",
            ArmToggle::Disarm => "DISARM",
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            ArmToggle::Arm => CommandKind::Arm,
            ArmToggle::Disarm => CommandKind::Disarm,
        }
    }
}

/// Polls the UAV's armed flag on its own timer, independent of the telemetry
/// panel.
pub struct ArmedTask {
    client: BackendClient,
    config: TelemetryConfig,
    armed_tx: watch::Sender<bool>,
    armed_rx: watch::Receiver<bool>,
}

pub fn create_armed_task(
    config: TelemetryConfig,
    client: BackendClient,
) -> anyhow::Result<ArmedTask> {
    if config.period.is_zero() {
        bail!("armed poll period must be greater than zero");
    }

    let (armed_tx, armed_rx) = watch::channel(false);

    Ok(ArmedTask {
        client,
        config,
        armed_tx,
        armed_rx,
    })
}

impl ArmedTask {
    pub fn armed(&self) -> watch::Receiver<bool> {
        self.armed_rx.clone()
    }
}

#[async_trait]
impl Task for ArmedTask {
    fn name(&self) -> &'static str {
        "armed"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            client,
            config,
            armed_tx,
            ..
        } = *self;

        let mut generation = Generation::default();

        poll_loop(
            config.period,
            cancel,
            move |_| {
                let client = client.clone();
                async move {
                    client
                        .get_json::<Envelope<ArmedWire>>(UAV_STATS_PATH)
                        .await
                        .map(|envelope| envelope.result.armed)
                }
            },
            move |tick, result| match result {
                Ok(armed) => {
                    if generation.accept(tick) {
                        armed_tx.send_if_modified(|current| {
                            let changed = *current != armed;
                            *current = armed;
                            changed
                        });
                    }
                }
                // the telemetry task reports link problems; keep the last flag
                Err(err) => trace!("armed poll {} failed: {}", tick, err),
            },
        )
        .await;

        debug!("armed polling stopped");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gc_backend::mock::{self, MockBackend, MockReply};

    use super::*;

    #[test]
    fn toggle_follows_armed_flag() {
        let armed = ArmToggle::from(true);
        assert_eq!(armed.label(), "DISARM");
        assert_eq!(armed.kind().endpoint(), Some("/uav/disarm"));

        let disarmed = ArmToggle::from(false);
        assert_eq!(disarmed.label(), "ARM");
        assert_eq!(disarmed.kind().endpoint(), Some("/uav/arm"));
    }

    #[tokio::test]
    async fn armed_flag_is_polled() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(10.0, true)));

        let task = create_armed_task(
            TelemetryConfig::default(),
            BackendClient::new(&backend.config())?,
        )?;
        let mut armed_rx = task.armed();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Box::new(task).run(cancel.clone()));

        tokio::time::timeout(Duration::from_secs(5), armed_rx.changed()).await??;
        assert!(*armed_rx.borrow());

        // a failing poll leaves the last known flag in place
        backend.set_reply(UAV_STATS_PATH, MockReply::Status(500));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(*armed_rx.borrow());

        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(10.0, false)));
        tokio::time::timeout(Duration::from_secs(5), armed_rx.changed()).await??;
        assert!(!*armed_rx.borrow());

        cancel.cancel();
        handle.await??;
        Ok(())
    }
}
