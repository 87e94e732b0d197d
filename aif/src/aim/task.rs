// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::Aim;
use crate::com::{Subscriber, TaskControl};
use crate::error::{Error, Result};
use log::{debug, error, info};
use std::thread;
use tracing::{span, Level};

/// The thread running one AIM
pub struct AimTask {
    name: String,
    control: TaskControl,
    thread: thread::JoinHandle<()>,
}

impl AimTask {
    /// Spawn a new thread running `aim` with the given context.
    ///
    /// The context must be bound to `control`, otherwise pause and stop are not observed.
    pub fn spawn(
        name: &str,
        aim: Box<dyn Aim>,
        ctx: Subscriber,
        control: TaskControl,
        stack_size: Option<usize>,
    ) -> Result<AimTask> {
        let thread_name = format!("aim-{name}").to_lowercase();
        let mut builder = thread::Builder::new().name(thread_name);
        if let Some(stack_size) = stack_size {
            builder = builder.stack_size(stack_size);
        }

        let task_name = name.to_owned();
        let thread = builder
            .spawn(move || run(task_name, aim, ctx))
            .map_err(|e| Error::Io((e, "failed to spawn AIM thread")))?;

        Ok(AimTask {
            name: name.to_owned(),
            control,
            thread,
        })
    }

    pub fn control(&self) -> &TaskControl {
        &self.control
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    /// Whether the task body has returned
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Cancel the task and wait for its thread to exit
    pub fn stop(self) {
        self.control.cancel();
        if self.thread.join().is_err() {
            error!("AIM task {} panicked", self.name);
        }
    }
}

/// AIM thread main function
fn run(name: String, mut aim: Box<dyn Aim>, ctx: Subscriber) {
    let _span = span!(Level::INFO, "AIM", name = %name, subscriber = %ctx.id()).entered();
    debug!("Starting AIM task {name}");

    let result = aim.startup(&ctx).and_then(|()| aim.run(&ctx));
    aim.shutdown();

    match result {
        Ok(()) => debug!("AIM task {name} finished"),
        Err(Error::Cancelled) => info!("Execution of {name} stopped"),
        Err(e) => error!("AIM task {name} terminated: {e}"),
    }
}
