use anyhow::bail;
use async_trait::async_trait;
use chrono::prelude::*;
use gc_backend::{BackendClient, BackendError};
use gc_client::Task;
use gc_types::{Envelope, UavQuickStats, UavStatsWire, UgvQuickStats, UgvStatsWire};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    poll::{poll_loop, Generation},
    LinkHealth, TelemetryConfig,
};

pub const UAV_STATS_PATH: &str = "/uav/stats";
pub const UGV_STATS_PATH: &str = "/ugv/stats";

/// A snapshot together with the poll tick that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub tick: u64,
    pub received: DateTime<Local>,
}

/// Latest state of both vehicles. Each vehicle is polled on its own, so one
/// of them failing or lagging leaves the other untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    pub uav: Option<Stamped<UavQuickStats>>,
    pub ugv: Option<Stamped<UgvQuickStats>>,
    pub uav_health: LinkHealth,
    pub ugv_health: LinkHealth,
}

pub struct TelemetryTask {
    client: BackendClient,
    config: TelemetryConfig,
    telem_rx: watch::Receiver<Telemetry>,
    telem_tx: watch::Sender<Telemetry>,
}

pub fn create_task(
    config: TelemetryConfig,
    client: BackendClient,
) -> anyhow::Result<TelemetryTask> {
    if config.period.is_zero() {
        bail!("telemetry period must be greater than zero");
    }

    let (telem_tx, telem_rx) = watch::channel(Telemetry::default());

    Ok(TelemetryTask {
        client,
        config,
        telem_rx,
        telem_tx,
    })
}

impl TelemetryTask {
    pub fn telemetry(&self) -> watch::Receiver<Telemetry> {
        self.telem_rx.clone()
    }
}

pub async fn fetch_uav(client: &BackendClient) -> Result<UavQuickStats, BackendError> {
    let envelope: Envelope<UavStatsWire> = client.get_json(UAV_STATS_PATH).await?;
    Ok(envelope.result.into())
}

pub async fn fetch_ugv(client: &BackendClient) -> Result<UgvQuickStats, BackendError> {
    let envelope: Envelope<UgvStatsWire> = client.get_json(UGV_STATS_PATH).await?;
    Ok(envelope.result.into())
}

type Slot<T> = fn(&mut Telemetry) -> (&mut Option<Stamped<T>>, &mut LinkHealth);

/// Builds the `apply` half of a vehicle's poll loop: results older than the
/// newest applied tick are dropped, the rest update that vehicle's snapshot
/// and health.
fn apply_to<T: 'static>(
    telem_tx: &watch::Sender<Telemetry>,
    vehicle: &'static str,
    disconnect_after: u32,
    slot: Slot<T>,
) -> impl FnMut(u64, Result<T, BackendError>) + '_ {
    let mut generation = Generation::default();

    move |tick, result| {
        if !generation.accept(tick) {
            return;
        }

        let now = Local::now();

        telem_tx.send_modify(|telemetry| {
            let (snapshot, health) = slot(telemetry);

            match result {
                Ok(value) => {
                    *snapshot = Some(Stamped {
                        value,
                        tick,
                        received: now,
                    });
                    health.record_success(now);
                }
                Err(err) => {
                    warn!("{} poll {} failed: {}", vehicle, tick, err);
                    health.record_failure(&err, disconnect_after, now);
                }
            }
        });
    }
}

#[async_trait]
impl Task for TelemetryTask {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
        let Self {
            client,
            config,
            telem_tx,
            ..
        } = *self;

        debug!("polling {} every {:?}", client.base_url(), config.period);

        let uav_loop = poll_loop(
            config.period,
            cancel.clone(),
            {
                let client = client.clone();
                move |_| {
                    let client = client.clone();
                    async move { fetch_uav(&client).await }
                }
            },
            apply_to(&telem_tx, "uav", config.disconnect_after, |t| {
                (&mut t.uav, &mut t.uav_health)
            }),
        );

        let ugv_loop = poll_loop(
            config.period,
            cancel,
            move |_| {
                let client = client.clone();
                async move { fetch_ugv(&client).await }
            },
            apply_to(&telem_tx, "ugv", config.disconnect_after, |t| {
                (&mut t.ugv, &mut t.ugv_health)
            }),
        );

        tokio::join!(uav_loop, ugv_loop);

        debug!("telemetry polling stopped");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gc_backend::{
        mock::{self, MockBackend, MockReply},
        ErrorKind,
    };

    use tokio::task::JoinHandle;
    use uom::si::length::foot;

    use super::*;
    use crate::LinkStatus;

    fn start(
        backend: &MockBackend,
    ) -> (
        watch::Receiver<Telemetry>,
        CancellationToken,
        JoinHandle<anyhow::Result<()>>,
    ) {
        let client = BackendClient::new(&backend.config()).unwrap();
        let task = create_task(TelemetryConfig::default(), client).unwrap();
        let telem_rx = task.telemetry();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Box::new(task).run(cancel.clone()));
        (telem_rx, cancel, handle)
    }

    async fn wait_for<F: Fn(&Telemetry) -> bool>(
        rx: &mut watch::Receiver<Telemetry>,
        f: F,
    ) -> Telemetry {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let current = rx.borrow();
                    if f(&current) {
                        return current.clone();
                    }
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("telemetry condition not reached")
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = gc_backend::BackendConfig::with_address("http://localhost:5000");
        let client = BackendClient::new(&config).unwrap();
        let config = TelemetryConfig {
            period: Duration::ZERO,
            ..Default::default()
        };

        assert!(create_task(config, client).is_err());
    }

    #[tokio::test]
    async fn both_vehicles_are_polled() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(123.456, true)));
        backend.set_reply(UGV_STATS_PATH, MockReply::Json(mock::ugv_stats(88.0)));

        let (mut rx, cancel, handle) = start(&backend);

        let telemetry = wait_for(&mut rx, |t| t.uav.is_some() && t.ugv.is_some()).await;

        let uav = telemetry.uav.unwrap().value;
        assert!((uav.altitude.get::<foot>() - 123.456).abs() < 1e-9);
        assert!(uav.armed);
        let ugv = telemetry.ugv.unwrap().value;
        assert!((ugv.distance_to_waypoint.get::<foot>() - 88.0).abs() < 1e-9);
        assert_eq!(telemetry.uav_health.status, LinkStatus::Connected);
        assert_eq!(telemetry.ugv_health.status, LinkStatus::Connected);

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn failed_poll_keeps_last_values_and_flags_link() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(100.0, false)));
        backend.set_reply(UGV_STATS_PATH, MockReply::Json(mock::ugv_stats(10.0)));

        let (mut rx, cancel, handle) = start(&backend);

        let before = wait_for(&mut rx, |t| t.uav.is_some() && t.ugv.is_some()).await;

        backend.set_reply(UAV_STATS_PATH, MockReply::Garbage);
        backend.set_reply(UGV_STATS_PATH, MockReply::Status(500));

        let after = wait_for(&mut rx, |t| {
            t.uav_health.status == LinkStatus::Degraded
                && t.ugv_health.status == LinkStatus::Degraded
        })
        .await;

        assert_eq!(
            after.uav.as_ref().map(|s| &s.value),
            before.uav.as_ref().map(|s| &s.value)
        );
        assert_eq!(
            after.ugv.as_ref().map(|s| &s.value),
            before.ugv.as_ref().map(|s| &s.value)
        );
        assert_eq!(
            after.uav_health.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::MalformedResponse)
        );
        assert_eq!(
            after.ugv_health.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::MalformedResponse)
        );

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn stalled_ugv_does_not_hold_back_uav() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(50.0, false)));
        backend.set_reply(UGV_STATS_PATH, MockReply::Json(mock::ugv_stats(5.0)));
        // longer than the client timeout, so every ugv poll fails
        backend.stall(UGV_STATS_PATH, Duration::from_secs(5));

        let (mut rx, cancel, handle) = start(&backend);

        let first = tokio::time::timeout(
            Duration::from_millis(400),
            wait_for(&mut rx, |t| t.uav.is_some()),
        )
        .await?;
        assert!(first.ugv.is_none());
        assert_eq!(first.uav_health.status, LinkStatus::Connected);

        let later = wait_for(&mut rx, |t| t.ugv_health.status == LinkStatus::Degraded).await;
        assert_eq!(later.uav_health.status, LinkStatus::Connected);
        assert_eq!(
            later.ugv_health.last_error.as_ref().map(|e| e.kind),
            Some(ErrorKind::Network)
        );
        assert!(later.uav.map(|s| s.tick).unwrap_or_default() > 1);

        cancel.cancel();
        handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn unmounting_stops_requests() -> anyhow::Result<()> {
        let backend = MockBackend::start();
        backend.set_reply(UAV_STATS_PATH, MockReply::Json(mock::uav_stats(1.0, false)));
        backend.set_reply(UGV_STATS_PATH, MockReply::Json(mock::ugv_stats(1.0)));

        let (mut rx, cancel, handle) = start(&backend);
        wait_for(&mut rx, |t| t.uav.is_some()).await;

        cancel.cancel();
        handle.await??;

        // let anything already on the wire land before counting
        tokio::time::sleep(Duration::from_millis(100)).await;
        let before = backend.total_hits();
        assert!(before >= 2);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(backend.total_hits(), before);
        Ok(())
    }
}
