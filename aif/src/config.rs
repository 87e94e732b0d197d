// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Declarative configuration of workflows and their AIMs
//!
//! A configuration is plain data: it can be built in code, loaded from JSON or
//! taken from [`AifConfig::default`], which describes the built-in rehabilitation
//! exercises validation workflow (CAE-REV).

use crate::com::DEFAULT_CHANNEL_CAPACITY;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const SENSORS_CHANNEL: &str = "SensorsDataChannel";
pub const MIC_BUFFER_CHANNEL: &str = "MicBufferDataChannel";
pub const MIC_PEAK_CHANNEL: &str = "MicPeakDataChannel";
pub const MOTION_CHANNEL: &str = "MotionDataChannel";
pub const VALIDATION_CHANNEL: &str = "ValidationResultChannel";

pub const DEFAULT_WORKFLOW: &str = "CAE-REV";
pub const MOTION_RECOGNITION_AIM: &str = "MotionRecognitionAnalysis";
pub const MOVEMENT_VALIDATION_AIM: &str = "MovementsWithAudioValidation";

/// Configuration of a controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AifConfig {
    pub name: String,
    pub workflows: Vec<WorkflowConfig>,
}

/// Configuration of one AI workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub name: String,
    /// Channels created in the workflow's store, in this order
    pub channels: Vec<String>,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// AIMs of the workflow in start order
    pub aims: Vec<AimConfig>,
    #[serde(default)]
    pub supervisor: Option<SupervisorConfig>,
}

/// Configuration of one AIM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AimConfig {
    pub name: String,
    #[serde(flatten)]
    pub kind: AimKind,
}

/// The AIM variants known to the framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AimKind {
    MotionRecognition(MotionRecognitionConfig),
    MovementValidation(MovementValidationConfig),
}

impl AimKind {
    /// Channels the AIM subscribes to
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            AimKind::MotionRecognition(c) => vec![c.input.as_str()],
            AimKind::MovementValidation(c) => vec![c.primary.as_str(), c.confirmation.as_str()],
        }
    }

    /// Channels the AIM publishes to
    pub fn outputs(&self) -> Vec<&str> {
        match self {
            AimKind::MotionRecognition(c) => vec![c.output.as_str()],
            AimKind::MovementValidation(c) => c.verdicts.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionRecognitionConfig {
    pub input: String,
    pub output: String,
    /// Poll timeout on the sensor channel
    pub poll_timeout_ms: u64,
    /// Lower bound of the still window, m/s²
    pub accel_min: f32,
    /// Upper bound of the still window, m/s²
    pub accel_max: f32,
    pub min_stop_delay_ms: u64,
    /// Also publish `Started` events
    pub publish_started: bool,
}

impl Default for MotionRecognitionConfig {
    fn default() -> Self {
        Self {
            input: SENSORS_CHANNEL.to_owned(),
            output: MOTION_CHANNEL.to_owned(),
            poll_timeout_ms: 1000,
            accel_min: 9.5,
            accel_max: 10.5,
            min_stop_delay_ms: 100,
            publish_started: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementValidationConfig {
    /// Channel carrying motion events
    pub primary: String,
    /// Channel carrying audio peaks
    pub confirmation: String,
    /// Optional channel receiving the verdicts
    pub verdicts: Option<String>,
    pub primary_timeout_ms: u64,
    pub confirmation_timeout_ms: u64,
}

impl Default for MovementValidationConfig {
    fn default() -> Self {
        Self {
            primary: MOTION_CHANNEL.to_owned(),
            confirmation: MIC_PEAK_CHANNEL.to_owned(),
            verdicts: Some(VALIDATION_CHANNEL.to_owned()),
            primary_timeout_ms: 3000,
            confirmation_timeout_ms: 1000,
        }
    }
}

/// Periodic pause/resume toggling of one AIM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    pub aim: String,
    pub interval_ms: u64,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl AifConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Io((e, "failed to read configuration file")))?;
        Self::from_json_str(&json)
    }

    pub fn workflow(&self, name: &str) -> Option<&WorkflowConfig> {
        self.workflows.iter().find(|w| w.name == name)
    }

    /// Check names and channel references
    pub fn validate(&self) -> Result<()> {
        let mut workflows = HashSet::new();
        let mut aims = HashSet::new();

        for workflow in &self.workflows {
            if !workflows.insert(workflow.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate workflow {}",
                    workflow.name
                )));
            }
            if workflow.channels.len() > workflow.channel_capacity {
                return Err(Error::Config(format!(
                    "workflow {} declares {} channels, capacity is {}",
                    workflow.name,
                    workflow.channels.len(),
                    workflow.channel_capacity
                )));
            }

            let channels: HashSet<&str> = workflow.channels.iter().map(String::as_str).collect();
            for aim in &workflow.aims {
                if !aims.insert(aim.name.as_str()) {
                    return Err(Error::Config(format!("duplicate AIM {}", aim.name)));
                }
                let kind = &aim.kind;
                if let Some(channel) = kind
                    .inputs()
                    .into_iter()
                    .chain(kind.outputs())
                    .find(|c| !channels.contains(c))
                {
                    return Err(Error::Config(format!(
                        "AIM {} uses undeclared channel {channel}",
                        aim.name
                    )));
                }
            }

            if let Some(supervisor) = &workflow.supervisor {
                if !workflow.aims.iter().any(|a| a.name == supervisor.aim) {
                    return Err(Error::Config(format!(
                        "supervised AIM {} is not part of workflow {}",
                        supervisor.aim, workflow.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for AifConfig {
    fn default() -> Self {
        let channels = [
            SENSORS_CHANNEL,
            MIC_BUFFER_CHANNEL,
            MIC_PEAK_CHANNEL,
            MOTION_CHANNEL,
            VALIDATION_CHANNEL,
        ];
        Self {
            name: "aif".to_owned(),
            workflows: vec![WorkflowConfig {
                name: DEFAULT_WORKFLOW.to_owned(),
                channels: channels.iter().map(|c| c.to_string()).collect(),
                channel_capacity: DEFAULT_CHANNEL_CAPACITY,
                aims: vec![
                    AimConfig {
                        name: MOTION_RECOGNITION_AIM.to_owned(),
                        kind: AimKind::MotionRecognition(Default::default()),
                    },
                    AimConfig {
                        name: MOVEMENT_VALIDATION_AIM.to_owned(),
                        kind: AimKind::MovementValidation(Default::default()),
                    },
                ],
                supervisor: None,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = AifConfig::default();
        config.validate().unwrap();
        let workflow = config.workflow(DEFAULT_WORKFLOW).unwrap();
        assert_eq!(workflow.channels.len(), 5);
        assert_eq!(workflow.aims[0].name, MOTION_RECOGNITION_AIM);
        assert_eq!(workflow.aims[1].name, MOVEMENT_VALIDATION_AIM);
    }

    #[test]
    fn parse_json_with_defaults() {
        let json = r#"{
            "name": "bench",
            "workflows": [{
                "name": "W",
                "channels": ["SensorsDataChannel", "MotionDataChannel", "MicPeakDataChannel"],
                "aims": [
                    { "name": "Motion", "kind": "motion_recognition", "accel_min": 9.0 },
                    { "name": "Validation", "kind": "movement_validation",
                      "verdicts": null, "primary_timeout_ms": 500 }
                ],
                "supervisor": { "aim": "Motion", "interval_ms": 200 }
            }]
        }"#;
        let config = AifConfig::from_json_str(json).unwrap();
        config.validate().unwrap();

        let workflow = &config.workflows[0];
        assert_eq!(workflow.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        match &workflow.aims[0].kind {
            AimKind::MotionRecognition(c) => {
                assert_eq!(c.accel_min, 9.0);
                assert_eq!(c.accel_max, 10.5);
                assert_eq!(c.input, SENSORS_CHANNEL);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        match &workflow.aims[1].kind {
            AimKind::MovementValidation(c) => {
                assert_eq!(c.verdicts, None);
                assert_eq!(c.primary_timeout_ms, 500);
                assert_eq!(c.confirmation_timeout_ms, 1000);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(workflow.supervisor.as_ref().unwrap().interval_ms, 200);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            AifConfig::from_json_str("{ \"name\": 1 }"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            AifConfig::load("/nonexistent/aif.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = AifConfig::default();
        config.workflows.push(config.workflows[0].clone());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AifConfig::default();
        let mut other = config.workflows[0].clone();
        other.name = "other".to_owned();
        config.workflows.push(other);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn undeclared_channel_is_rejected() {
        let mut config = AifConfig::default();
        config.workflows[0]
            .channels
            .retain(|c| c != MIC_PEAK_CHANNEL);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn unknown_supervised_aim_is_rejected() {
        let mut config = AifConfig::default();
        config.workflows[0].supervisor = Some(SupervisorConfig {
            aim: "Nobody".to_owned(),
            interval_ms: 10,
        });
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
