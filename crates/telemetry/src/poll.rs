//! Periodic polling of the backend.
//!
//! Every tick of the interval gets a monotonically increasing number. Fetches
//! are started without waiting for earlier ones to finish, so a slow response
//! can land after a newer one; [`Generation`] is used to drop such responses
//! instead of letting them overwrite fresher data.

use std::time::Duration;

use futures::{stream::FuturesUnordered, Future, StreamExt};
use tokio::{select, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Tracks the newest tick whose result has been applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct Generation {
    latest: Option<u64>,
}

impl Generation {
    /// Returns true and records `tick` if it is newer than every tick accepted
    /// so far.
    pub fn accept(&mut self, tick: u64) -> bool {
        match self.latest {
            Some(latest) if tick <= latest => {
                trace!("discarding result of tick {} (latest is {})", tick, latest);
                false
            }
            _ => {
                self.latest = Some(tick);
                true
            }
        }
    }

    pub fn latest(&self) -> Option<u64> {
        self.latest
    }
}

/// Calls `fetch` once per `period` until `cancel` fires, handing every
/// completed fetch to `apply` together with the tick it was started on.
///
/// Fetches still in flight when the token is cancelled are dropped, and no
/// fetch is started after cancellation.
pub async fn poll_loop<F, Fut, A>(period: Duration, cancel: CancellationToken, mut fetch: F, mut apply: A)
where
    F: FnMut(u64) -> Fut,
    Fut: Future,
    A: FnMut(u64, Fut::Output),
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight = FuturesUnordered::new();
    let mut tick: u64 = 0;

    loop {
        select! {
            biased;

            _ = cancel.cancelled() => break,

            Some((done, output)) = in_flight.next(), if !in_flight.is_empty() => {
                apply(done, output);
            }

            _ = interval.tick() => {
                tick += 1;
                trace!("poll tick {}", tick);

                let fut = fetch(tick);
                let started = tick;
                in_flight.push(async move { (started, fut.await) });
            }
        }
    }
}
