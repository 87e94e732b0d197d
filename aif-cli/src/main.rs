// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Run an AI workflow on synthetic input and report its verdicts

use aif::analysis::messages::{Correlation, Verdict};
use aif::config::{self, AifConfig};
use aif::prelude::*;
use anyhow::{anyhow, Context, Error};
use argh::FromArgs;
use log::{info, warn, LevelFilter};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::fmt::format::FmtSpan;

mod driver;

#[derive(FromArgs)]
#[argh(help_triggers("-h", "--help", "help"))]
/// aifd arguments
struct Args {
    #[argh(description = "configuration file (JSON), the built-in configuration if omitted")]
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(description = "workflow to run")]
    #[argh(option, short = 'w')]
    workflow: Option<String>,

    #[argh(description = "run duration in seconds")]
    #[argh(option, short = 'd', default = "10")]
    duration: u64,

    #[argh(description = "log level")]
    #[argh(option, short = 'l')]
    log_level: Option<LevelFilter>,

    #[argh(description = "print tracing spans to stderr")]
    #[argh(switch)]
    trace: bool,

    #[argh(description = "toggle the supervised AIM of the workflow between alive and paused")]
    #[argh(switch)]
    supervise: bool,
}

/// Verdict counters
#[derive(Debug, Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
}

fn main() -> Result<(), Error> {
    let Args {
        config,
        workflow,
        duration,
        log_level,
        trace,
        supervise,
    } = argh::from_env();

    aif_logger::init(log_level.unwrap_or(LevelFilter::Info), true);
    if trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to install trace subscriber: {e}"))?;
    }
    aif::timestamp::initialize();

    let config = match config {
        Some(path) => AifConfig::load(&path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => AifConfig::default(),
    };
    let workflow = workflow.unwrap_or_else(|| config::DEFAULT_WORKFLOW.to_owned());
    let supervision = config.workflow(&workflow).and_then(|w| w.supervisor.clone());

    let mut controller = Controller::initialize(config)?;
    let id = controller
        .aiw_start(&workflow)
        .with_context(|| format!("failed to start workflow {workflow}"))?;
    let store = controller.store(id)?;
    let controller = Arc::new(Mutex::new(controller));

    let supervisor = match (supervise, supervision) {
        (true, Some(supervision)) => Some(Supervisor::spawn(
            Arc::clone(&controller),
            id,
            &supervision.aim,
            Duration::from_millis(supervision.interval_ms),
        )?),
        (true, None) => {
            warn!("Workflow {workflow} has no supervisor configuration");
            None
        }
        (false, _) => None,
    };

    let driver = driver::Driver::spawn(store.clone())?;
    let tally = report_verdicts(&store, Duration::from_secs(duration))?;

    if let Some(supervisor) = supervisor {
        supervisor.stop();
    }
    driver.stop();
    controller.lock().destroy();

    info!(
        "Finished: {} movements validated, {} failed",
        tally.succeeded, tally.failed
    );
    Ok(())
}

/// Print the verdicts published during `duration`
fn report_verdicts(store: &MessageStore, duration: Duration) -> Result<Tally, Error> {
    let mut tally = Tally::default();
    let Ok(channel) = store.channel(config::VALIDATION_CHANNEL) else {
        warn!("No verdict channel, running without report");
        thread::sleep(duration);
        return Ok(tally);
    };

    let reader = Subscriber::new(store.clone(), SubscriberId::next());
    let deadline = Instant::now() + duration;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match reader.recv(remaining, channel) {
            Ok(message) => match message.payload::<Verdict>() {
                Some(Verdict(correlation @ Correlation::Succeeded { .. })) => {
                    tally.succeeded += 1;
                    println!("{}: {correlation:?}", message.timestamp());
                }
                Some(Verdict(correlation)) => {
                    tally.failed += 1;
                    println!("{}: {correlation:?}", message.timestamp());
                }
                None => warn!("Unexpected message on the verdict channel"),
            },
            Err(aif::error::Error::Timeout) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(tally)
}
