// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! AI workflow: a message store, its channels and the AIM records wired to it

use crate::aim::{AimRecord, AimStatus};
use crate::analysis::{self, FailureSignal};
use crate::com::{ChannelHandle, MessageStore};
use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::ids::AiwId;
use log::{debug, error, info};
use std::sync::Arc;
use tracing::{span, Level};

/// A running instance of a configured workflow.
///
/// AIMs are started and resumed in declaration order, paused and stopped in
/// reverse order so that consumers go down before their producers.
#[derive(Debug)]
pub struct Workflow {
    id: AiwId,
    name: String,
    store: MessageStore,
    records: Vec<AimRecord>,
    channels: Vec<ChannelHandle>,
}

impl Workflow {
    /// Create the store, its channels and one record per configured AIM
    pub fn new(id: AiwId, config: &WorkflowConfig, signal: Arc<dyn FailureSignal>) -> Result<Self> {
        let store = MessageStore::new(id, &config.name, config.channel_capacity);
        let channels = config
            .channels
            .iter()
            .map(|name| store.create_channel(name))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(config.aims.len());
        for aim in &config.aims {
            let inputs = aim
                .kind
                .inputs()
                .into_iter()
                .map(|name| store.channel(name))
                .collect::<Result<Vec<_>>>()?;
            let builder = analysis::builder(&aim.kind, Arc::clone(&signal));
            records.push(AimRecord::new(&aim.name, store.clone(), inputs, builder));
        }

        debug!(
            "Workflow {} ({id}) created with {} channels and {} AIMs",
            config.name,
            channels.len(),
            records.len()
        );
        Ok(Self {
            id,
            name: config.name.clone(),
            store,
            records,
            channels,
        })
    }

    pub fn id(&self) -> AiwId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn channels(&self) -> &[ChannelHandle] {
        &self.channels
    }

    pub fn records(&self) -> &[AimRecord] {
        &self.records
    }

    /// Position of the named AIM in declaration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name() == name)
    }

    pub fn record(&mut self, name: &str) -> Result<&mut AimRecord> {
        self.records
            .iter_mut()
            .find(|r| r.name() == name)
            .ok_or_else(|| Error::NotFound(format!("AIM {name} in workflow {}", self.name)))
    }

    pub(crate) fn record_at(&mut self, index: usize) -> Option<&mut AimRecord> {
        self.records.get_mut(index)
    }

    /// Whether any AIM is alive or paused
    pub fn is_running(&mut self) -> bool {
        self.records.iter_mut().any(|r| r.status().has_task())
    }

    /// Start every AIM without a task. On failure the AIMs started so far are stopped again.
    pub fn start_all(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Start workflow", name = %self.name).entered();
        let mut started: Vec<usize> = Vec::new();
        for index in 0..self.records.len() {
            let record = &mut self.records[index];
            if record.status().has_task() {
                continue;
            }
            if let Err(e) = record.start() {
                error!("Failed to start {}: {e}", record.name());
                for index in started.into_iter().rev() {
                    let _ = self.records[index].stop();
                }
                return Err(e);
            }
            started.push(index);
        }
        info!("Workflow {} started", self.name);
        Ok(())
    }

    /// Pause every alive AIM, last declared first
    pub fn pause_all(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Pause workflow", name = %self.name).entered();
        for record in self.records.iter_mut().rev() {
            if record.status() == AimStatus::Alive {
                record.pause()?;
            }
        }
        info!("Workflow {} paused", self.name);
        Ok(())
    }

    /// Resume every paused AIM in declaration order
    pub fn resume_all(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Resume workflow", name = %self.name).entered();
        for record in self.records.iter_mut() {
            if record.status() == AimStatus::Paused {
                record.resume()?;
            }
        }
        info!("Workflow {} resumed", self.name);
        Ok(())
    }

    /// Stop every AIM with a task, last declared first
    pub fn stop_all(&mut self) -> Result<()> {
        let _span = span!(Level::INFO, "Stop workflow", name = %self.name).entered();
        for record in self.records.iter_mut().rev() {
            if record.status().has_task() {
                record.stop()?;
            }
        }
        info!("Workflow {} stopped", self.name);
        Ok(())
    }

    /// Stop all AIMs, release the records and destroy the store
    pub fn destroy(mut self) {
        let _ = self.stop_all();
        for record in self.records.drain(..).rev() {
            record.destroy();
        }
        self.store.destroy();
        info!("Workflow {} ({}) destroyed", self.name, self.id);
    }
}
