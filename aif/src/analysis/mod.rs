// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Analysis AIMs
//!
//! The AIM variants shipped with the framework and the payload records they
//! exchange. [`builder`] maps a configured [`AimKind`] onto an [`AimBuilder`].

pub mod messages;
mod motion;
mod validation;

pub use motion::{MotionDetector, MotionRecognition};
pub use validation::{Correlator, FailureSignal, LogSignal, MovementValidation, Step};

use crate::aim::{Aim, AimBuilder};
use crate::com::MessageStore;
use crate::config::AimKind;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Create the builder of an AIM variant.
///
/// Channels are resolved by name in the store on every start. Failed
/// validations are reported to `signal`.
pub fn builder(kind: &AimKind, signal: Arc<dyn FailureSignal>) -> Box<dyn AimBuilder> {
    match kind.clone() {
        AimKind::MotionRecognition(config) => {
            Box::new(move |store: &MessageStore| -> Result<Box<dyn Aim>> {
                let input = store.channel(&config.input)?;
                let output = store.channel(&config.output)?;
                Ok(Box::new(MotionRecognition::new(input, output, &config)))
            })
        }
        AimKind::MovementValidation(config) => {
            Box::new(move |store: &MessageStore| -> Result<Box<dyn Aim>> {
                let correlator = Correlator::new(
                    store.channel(&config.primary)?,
                    store.channel(&config.confirmation)?,
                    Duration::from_millis(config.primary_timeout_ms),
                    Duration::from_millis(config.confirmation_timeout_ms),
                );
                let verdicts = config
                    .verdicts
                    .as_deref()
                    .map(|name| store.channel(name))
                    .transpose()?;
                Ok(Box::new(MovementValidation::new(
                    correlator,
                    verdicts,
                    Arc::clone(&signal),
                )))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MotionRecognitionConfig, MovementValidationConfig};
    use crate::error::Error;
    use crate::ids::AiwId;

    #[test]
    fn builder_resolves_channels() {
        let store = MessageStore::new(AiwId::new(0, 0), "analysis", 4);
        let kind = AimKind::MovementValidation(MovementValidationConfig::default());
        let build = builder(&kind, Arc::new(LogSignal));
        assert!(matches!(build(&store), Err(Error::NotFound(_))));

        for name in kind.inputs().into_iter().chain(kind.outputs()) {
            store.create_channel(name).unwrap();
        }
        assert!(build(&store).is_ok());
    }

    #[test]
    fn builder_for_motion_recognition() {
        let store = MessageStore::new(AiwId::new(0, 0), "analysis", 4);
        let config = MotionRecognitionConfig::default();
        store.create_channel(&config.input).unwrap();
        store.create_channel(&config.output).unwrap();
        let build = builder(&AimKind::MotionRecognition(config), Arc::new(LogSignal));
        assert!(build(&store).is_ok());
    }
}
