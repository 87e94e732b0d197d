// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! AIF controller
//!
//! Registry of configured workflows and the arena of running ones. Running
//! workflows are addressed by generation-checked [`AiwId`]s; an id of a
//! destroyed workflow never resolves to a later workflow in the same slot.

use crate::aim::{AimRecord, AimStatus};
use crate::analysis::{FailureSignal, LogSignal};
use crate::com::MessageStore;
use crate::config::AifConfig;
use crate::error::{Error, Result};
use crate::ids::AiwId;
use crate::workflow::Workflow;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{span, Level};

/// One arena slot
#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    workflow: Option<Workflow>,
}

/// The AIF controller
pub struct Controller {
    config: AifConfig,
    signal: Arc<dyn FailureSignal>,
    slots: Vec<Slot>,
    /// AIM name to running workflow and record position
    aims: HashMap<String, (AiwId, usize)>,
}

impl Controller {
    /// Validate the configuration and register its workflows
    pub fn initialize(config: AifConfig) -> Result<Self> {
        let _span = span!(Level::INFO, "Initialize", name = %config.name).entered();
        config.validate()?;
        for workflow in &config.workflows {
            debug!(
                "Registered workflow {} with AIMs {:?}",
                workflow.name,
                workflow.aims.iter().map(|a| &a.name).collect::<Vec<_>>()
            );
        }
        info!(
            "Controller {} initialized with {} workflows",
            config.name,
            config.workflows.len()
        );
        Ok(Self {
            config,
            signal: Arc::new(LogSignal),
            slots: Vec::new(),
            aims: HashMap::new(),
        })
    }

    /// Report failed validations to `signal` in workflows started from now on
    pub fn with_failure_signal(mut self, signal: Arc<dyn FailureSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn config(&self) -> &AifConfig {
        &self.config
    }

    /// Ids and names of the running workflows
    pub fn workflows(&self) -> impl Iterator<Item = (AiwId, &str)> + '_ {
        self.slots.iter().filter_map(|slot| {
            slot.workflow.as_ref().map(|w| (w.id(), w.name()))
        })
    }

    /// Instantiate and start the named workflow.
    ///
    /// A stopped instance of the workflow is restarted and keeps its id.
    pub fn aiw_start(&mut self, name: &str) -> Result<AiwId> {
        let _span = span!(Level::INFO, "AIW start", name).entered();
        let config = self
            .config
            .workflow(name)
            .ok_or_else(|| Error::NotFound(format!("workflow {name}")))?;
        let existing = self
            .workflows()
            .find(|(_, running)| *running == name)
            .map(|(id, _)| id);
        if let Some(id) = existing {
            let workflow = self.workflow_mut(id)?;
            if workflow.is_running() {
                return Err(Error::AlreadyRunning(name.to_owned()));
            }
            // a stopped instance is started again under its id
            workflow.start_all()?;
            info!("Workflow {name} restarted as {id}");
            return Ok(id);
        }

        let index = self
            .slots
            .iter()
            .position(|slot| slot.workflow.is_none())
            .unwrap_or_else(|| {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            });
        let id = AiwId::new(index, self.slots[index].generation);

        let mut workflow = Workflow::new(id, config, Arc::clone(&self.signal))?;
        if let Err(e) = workflow.start_all() {
            workflow.destroy();
            return Err(e);
        }

        for (position, record) in workflow.records().iter().enumerate() {
            self.aims.insert(record.name().to_owned(), (id, position));
        }
        self.slots[index].workflow = Some(workflow);
        info!("Workflow {name} running as {id}");
        Ok(id)
    }

    pub fn aiw_pause(&mut self, id: AiwId) -> Result<()> {
        self.workflow_mut(id)?.pause_all()
    }

    pub fn aiw_resume(&mut self, id: AiwId) -> Result<()> {
        self.workflow_mut(id)?.resume_all()
    }

    pub fn aiw_stop(&mut self, id: AiwId) -> Result<()> {
        self.workflow_mut(id)?.stop_all()
    }

    /// Stop the workflow, release it and invalidate `id`
    pub fn aiw_destroy(&mut self, id: AiwId) -> Result<()> {
        let _span = span!(Level::INFO, "AIW destroy", id = %id).entered();
        self.workflow_mut(id)?;
        let slot = &mut self.slots[id.index()];
        let Some(workflow) = slot.workflow.take() else {
            return Err(Error::NotFound(format!("workflow {id}")));
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.aims.retain(|_, (aiw, _)| *aiw != id);
        workflow.destroy();
        Ok(())
    }

    /// Status of the named AIM in workflow `id`
    pub fn aim_get_status(&mut self, id: AiwId, name: &str) -> Result<AimStatus> {
        Ok(self.record_mut(id, name)?.status())
    }

    pub fn aim_start(&mut self, id: AiwId, name: &str) -> Result<()> {
        self.record_mut(id, name)?.start()
    }

    pub fn aim_pause(&mut self, id: AiwId, name: &str) -> Result<()> {
        self.record_mut(id, name)?.pause()
    }

    pub fn aim_resume(&mut self, id: AiwId, name: &str) -> Result<()> {
        self.record_mut(id, name)?.resume()
    }

    pub fn aim_stop(&mut self, id: AiwId, name: &str) -> Result<()> {
        self.record_mut(id, name)?.stop()
    }

    /// The running workflow hosting the named AIM
    pub fn aim_workflow(&self, name: &str) -> Option<AiwId> {
        self.aims.get(name).map(|(id, _)| *id)
    }

    /// Handle to the message store of workflow `id`, e.g. for external producers
    pub fn store(&mut self, id: AiwId) -> Result<MessageStore> {
        Ok(self.workflow_mut(id)?.store().clone())
    }

    /// Destroy every running workflow. Called on drop.
    pub fn destroy(&mut self) {
        let ids: Vec<AiwId> = self.workflows().map(|(id, _)| id).collect();
        for id in ids {
            if let Err(e) = self.aiw_destroy(id) {
                warn!("Failed to destroy workflow {id}: {e}");
            }
        }
    }

    fn workflow_mut(&mut self, id: AiwId) -> Result<&mut Workflow> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.workflow.as_mut())
            .ok_or_else(|| Error::NotFound(format!("workflow {id}")))
    }

    fn record_mut(&mut self, id: AiwId, name: &str) -> Result<&mut AimRecord> {
        let position = match self.aims.get(name) {
            Some((aiw, position)) if *aiw == id => *position,
            _ => return Err(Error::NotFound(format!("AIM {name} in workflow {id}"))),
        };
        self.workflow_mut(id)?
            .record_at(position)
            .ok_or_else(|| Error::NotFound(format!("AIM {name} in workflow {id}")))
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.config.name)
            .field("workflows", &self.workflows().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
