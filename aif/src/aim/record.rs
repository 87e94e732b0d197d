// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::{AimBuilder, AimStatus, AimTask};
use crate::com::{ChannelHandle, MessageStore, Subscriber, TaskControl};
use crate::error::{Error, Result};
use crate::ids::{AiwId, SubscriberId};
use log::{info, warn};
use tracing::{span, Level};

/// Runtime record of one AIM within a workflow.
///
/// Owns what must outlive a task: identity, inputs, subscriber id (and with it the
/// delivery state kept by the store) and the builder. The task exists iff the
/// status is [`AimStatus::Alive`] or [`AimStatus::Paused`].
pub struct AimRecord {
    name: String,
    aiw_id: AiwId,
    inputs: Vec<ChannelHandle>,
    subscriber: SubscriberId,
    store: MessageStore,
    builder: Box<dyn AimBuilder>,
    stack_size: Option<usize>,
    status: AimStatus,
    task: Option<AimTask>,
}

impl AimRecord {
    /// Create a record in state [`AimStatus::Created`]
    pub fn new(
        name: &str,
        store: MessageStore,
        inputs: Vec<ChannelHandle>,
        builder: Box<dyn AimBuilder>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            aiw_id: store.aiw_id(),
            inputs,
            subscriber: SubscriberId::next(),
            store,
            builder,
            stack_size: None,
            status: AimStatus::Created,
            task: None,
        }
    }

    /// Set the stack size of the task thread
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aiw_id(&self) -> AiwId {
        self.aiw_id
    }

    pub fn inputs(&self) -> &[ChannelHandle] {
        &self.inputs
    }

    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    /// Current status. A task that ended on its own is reported as stopped.
    pub fn status(&mut self) -> AimStatus {
        self.reconcile();
        self.status
    }

    /// Build the AIM and spawn its task
    pub fn start(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Start", aim = %self.name).entered();
        self.reconcile();
        match self.status {
            AimStatus::Created | AimStatus::Stopped => {}
            AimStatus::Alive | AimStatus::Paused => {
                return Err(Error::AlreadyRunning(self.name.clone()))
            }
        }

        let aim = (self.builder)(&self.store)?;
        let control = TaskControl::new(&self.store);
        let ctx = Subscriber::with_control(self.store.clone(), self.subscriber, control.clone());
        let task = AimTask::spawn(&self.name, aim, ctx, control, self.stack_size)?;

        self.task = Some(task);
        self.status = AimStatus::Alive;
        info!("Execution of {} started", self.name);
        Ok(())
    }

    /// Suspend the task at its next wait
    pub fn pause(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Pause", aim = %self.name).entered();
        self.reconcile();
        match &self.task {
            Some(task) if self.status == AimStatus::Alive => task.pause(),
            _ => return Err(self.invalid_state("pause")),
        }
        self.status = AimStatus::Paused;
        info!("Execution of {} paused", self.name);
        Ok(())
    }

    /// Continue a paused task where it was waiting
    pub fn resume(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Resume", aim = %self.name).entered();
        self.reconcile();
        match &self.task {
            Some(task) if self.status == AimStatus::Paused => task.resume(),
            _ => return Err(self.invalid_state("resume")),
        }
        self.status = AimStatus::Alive;
        info!("Execution of {} resumed", self.name);
        Ok(())
    }

    /// Cancel the task and wait for it to exit
    pub fn stop(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Stop", aim = %self.name).entered();
        if !self.status.has_task() {
            return Err(self.invalid_state("stop"));
        }
        if let Some(task) = self.task.take() {
            task.stop();
        }
        self.status = AimStatus::Stopped;
        info!("Execution of {} stopped", self.name);
        Ok(())
    }

    /// Release the record, stopping its task first if needed
    pub fn destroy(mut self) {
        if self.status.has_task() {
            let _ = self.stop();
        }
        info!("AIM {} destroyed", self.name);
    }

    /// Move a record whose task body has returned on its own to `Stopped`
    fn reconcile(&mut self) {
        if self.task.as_ref().is_some_and(AimTask::is_finished) {
            if let Some(task) = self.task.take() {
                task.stop();
            }
            warn!("Task of {} has terminated", self.name);
            self.status = AimStatus::Stopped;
        }
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            name: self.name.clone(),
            status: self.status,
            operation,
        }
    }
}

impl Drop for AimRecord {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop();
        }
    }
}

impl std::fmt::Debug for AimRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AimRecord")
            .field("name", &self.name)
            .field("aiw_id", &self.aiw_id)
            .field("subscriber", &self.subscriber)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
