use anyhow::Context;
use async_trait::async_trait;
use tokio::{sync::oneshot, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[async_trait]
pub trait CommandSink {
    type Request;
    type Response;

    async fn command(&self, request: Self::Request) -> Self::Response;
}

/// A long-running unit of work (a poller, a dispatcher, ...) which runs until
/// it fails or its cancellation token fires.
#[async_trait]
pub trait Task {
    fn name(&self) -> &'static str;

    async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()>;
}

pub type Command<Req, Res> = (Req, oneshot::Sender<anyhow::Result<Res>>);
pub type ChannelCommandSink<Req, Res> = flume::Sender<Command<Req, Res>>;
pub type ChannelCommandSource<Req, Res> = flume::Receiver<Command<Req, Res>>;

#[async_trait]
impl<Req: Send, Res: Send> CommandSink for ChannelCommandSink<Req, Res> {
    type Request = Req;
    type Response = anyhow::Result<Res>;

    async fn command(&self, request: Self::Request) -> Self::Response {
        let (tx, rx) = oneshot::channel();
        if self.send_async((request, tx)).await.is_err() {
            anyhow::bail!("could not send command");
        }
        rx.await?
    }
}

/// Spawns every task on a shared cancellation token and waits for all of them.
/// The first task to fail (or panic) cancels the rest and its error is
/// returned.
pub async fn run_tasks(
    tasks: Vec<Box<dyn Task + Send>>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut join_set = JoinSet::new();

    for task in tasks {
        debug!("starting {} task", task.name());
        let name = task.name();
        let cancel = cancel.clone();
        join_set.spawn(async move { (name, task.run(cancel).await) });
    }

    while let Some(res) = join_set.join_next().await {
        // if task panicked, then will be Err
        // if task terminated w/ error, then will be Ok((_, Err))
        match res {
            Err(err) => {
                cancel.cancel();
                return Err(err).context("task failed");
            }
            Ok((name, Err(err))) => {
                cancel.cancel();
                return Err(err).with_context(|| format!("{} task terminated with error", name));
            }
            Ok((name, Ok(()))) => {
                info!("exited {} task", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Idle;

    #[async_trait]
    impl Task for Idle {
        fn name(&self) -> &'static str {
            "idle"
        }

        async fn run(self: Box<Self>, cancel: CancellationToken) -> anyhow::Result<()> {
            cancel.cancelled().await;
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Task for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(self: Box<Self>, _cancel: CancellationToken) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn failing_task_cancels_the_others() {
        let cancel = CancellationToken::new();
        let err = run_tasks(vec![Box::new(Idle), Box::new(Failing)], cancel.clone())
            .await
            .unwrap_err();

        assert!(cancel.is_cancelled());
        assert!(format!("{:#}", err).contains("failing task terminated with error"));
    }

    #[tokio::test]
    async fn cancelled_tasks_exit_cleanly() -> anyhow::Result<()> {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_tasks(vec![Box::new(Idle), Box::new(Idle)], cancel.clone()));

        cancel.cancel();
        handle.await??;

        Ok(())
    }

    #[tokio::test]
    async fn channel_sink_round_trips_a_command() -> anyhow::Result<()> {
        let (tx, rx): (ChannelCommandSink<u32, u32>, ChannelCommandSource<u32, u32>) =
            flume::bounded(4);

        tokio::spawn(async move {
            while let Ok((req, ret)) = rx.recv_async().await {
                let _ = ret.send(Ok(req * 2));
            }
        });

        assert_eq!(tx.command(21).await?, 42);

        Ok(())
    }
}
