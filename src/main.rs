use anyhow::Context;
use clap::Parser;
use gc_backend::BackendClient;
use gc_client::Task;
use rustyline_async::{Readline, SharedWriter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{filter::Targets, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::cli::interactive::{run_interactive_cli, Console};

#[macro_use]
extern crate tracing;

mod cli;
mod config;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // setup colorful backtraces
    color_backtrace::install();

    // set up logging and interactive line editor
    let (editor, stdout) =
        Readline::new("gc> ".into()).context("failed to create interactive editor")?;

    let mut targets = tracing_subscriber::filter::Targets::new();

    if let Ok(directives) = std::env::var("RUST_LOG") {
        for directive in directives.split(',') {
            if let Some((target, level)) = directive.split_once('=') {
                targets = targets.with_target(
                    target,
                    level.parse::<LevelFilter>().context("invalid log level")?,
                );
            } else {
                targets = targets.with_default(
                    directive
                        .parse::<LevelFilter>()
                        .context("invalid log level")?,
                );
            }
        }
    }

    let (writer, _guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::hourly("logs", "ground-control"));

    let reg = tracing_subscriber::registry();

    #[cfg(tokio_unstable)]
    let reg = reg.with(console_subscriber::spawn());

    reg
        // writer that outputs to console
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer({
                    let stdout = stdout.clone();
                    move || stdout.clone()
                })
                .with_filter(targets),
        )
        // writer that outputs to files
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(Targets::new().with_targets(vec![
                    ("ground_control", LevelFilter::DEBUG),
                    ("gc_backend", LevelFilter::DEBUG),
                    ("gc_client", LevelFilter::DEBUG),
                    ("gc_command", LevelFilter::DEBUG),
                    ("gc_telemetry", LevelFilter::DEBUG),
                ])),
        )
        .init();

    let main_args: cli::args::MainArgs = cli::args::MainArgs::parse();

    debug!("reading config from {:?}", &main_args.config);
    let config = crate::config::GroundControlConfig::read_from_path(main_args.config)
        .context("failed to read config file")?;

    run_tasks(config, editor, stdout).await
}

async fn run_tasks(
    config: crate::config::GroundControlConfig,
    editor: Readline,
    stdout: SharedWriter,
) -> anyhow::Result<()> {
    let cancellation_token = CancellationToken::new();

    ctrlc::set_handler({
        let cancellation_token = cancellation_token.clone();
        move || {
            info!("received interrupt, shutting down");
            cancellation_token.cancel();
        }
    })
    .context("could not set ctrl+c handler")?;

    info!("using backend at {}", config.backend.address);
    let client = BackendClient::new(&config.backend).context("failed to create backend client")?;

    let mut tasks = Vec::<Box<dyn Task + Send>>::new();

    debug!("initializing telemetry task");
    let telem_task = gc_telemetry::create_task(config.telemetry.clone(), client.clone())
        .context("failed to initialize telemetry task")?;
    let telem_rx = telem_task.telemetry();
    tasks.push(Box::new(telem_task));

    debug!("initializing armed task");
    let armed_task = gc_command::create_armed_task(config.telemetry.clone(), client.clone())
        .context("failed to initialize armed task")?;
    let armed_rx = armed_task.armed();
    tasks.push(Box::new(armed_task));

    debug!("initializing command task");
    let command_task = gc_command::create_task(&config.commands, client)
        .context("failed to initialize command task")?;
    let command_tx = command_task.cmd();
    let console = Console {
        telemetry: telem_rx,
        armed: armed_rx,
        outcomes: command_task.outcomes(),
        capabilities: command_task.capabilities(),
        land_target: config.commands.land_target,
        waypoint: Default::default(),
    };
    tasks.push(Box::new(command_task));

    let mut join_set = JoinSet::new();

    join_set.spawn(run_interactive_cli(
        editor,
        stdout,
        console,
        command_tx,
        cancellation_token.clone(),
    ));

    join_set.spawn(gc_client::run_tasks(tasks, cancellation_token.clone()));

    while let Some(res) = join_set.join_next().await {
        // if task panicked, then will be Some(Err)
        // if task terminated w/ error, then will be Some(Ok(Err))
        // need to propagate errors in both cases

        match res {
            Err(err) => {
                cancellation_token.cancel();
                return Err(err).context("task failed");
            }
            Ok(Err(err)) => {
                cancellation_token.cancel();
                return Err(err).context("task terminated with error");
            }
            _ => {
                info!("exited task");
            }
        }
    }

    Ok(())
}
