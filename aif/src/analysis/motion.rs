// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Motion recognition: turns accelerometer samples into motion events

use super::messages::{MotionEvent, MotionKind, SensorReading};
use crate::aim::Aim;
use crate::com::{ChannelHandle, Delivery, Message, PollTimeout, Subscriber};
use crate::config::MotionRecognitionConfig;
use crate::error::Result;
use crate::timestamp::{self, Timestamp};
use log::{debug, info, warn};
use std::time::Duration;

/// Stop/start detection on total acceleration.
///
/// The device counts as still while the total acceleration stays inside the
/// configured window around gravity. One `Stopped` event is emitted per stop.
#[derive(Debug)]
pub struct MotionDetector {
    accel_min: f32,
    accel_max: f32,
    min_stop_delay: Duration,
    publish_started: bool,
    /// Time of the reading that started the current stop
    stopped_at: Option<Timestamp>,
}

impl MotionDetector {
    pub fn new(config: &MotionRecognitionConfig) -> Self {
        Self {
            accel_min: config.accel_min,
            accel_max: config.accel_max,
            min_stop_delay: Duration::from_millis(config.min_stop_delay_ms),
            publish_started: config.publish_started,
            stopped_at: None,
        }
    }

    /// Assume the device is standing still as of `at`
    pub fn assume_stopped(&mut self, at: Timestamp) {
        self.stopped_at = Some(at);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped_at.is_some()
    }

    /// Feed one reading taken at `at`; returns the event to publish, if any
    pub fn observe(&mut self, at: Timestamp, reading: &SensorReading) -> Option<MotionEvent> {
        let accel_total = reading.total_acceleration();

        if (self.accel_min..=self.accel_max).contains(&accel_total) {
            if let Some(stopped_at) = self.stopped_at {
                // already stopped, nothing new to report
                if at.saturating_since(stopped_at) >= self.min_stop_delay {
                    debug!("Still stopped since {stopped_at}");
                }
                return None;
            }
            self.stopped_at = Some(at);
            info!("Motion stopped: total acceleration {accel_total:.5} m/s²");
            return Some(MotionEvent {
                kind: MotionKind::Stopped,
                accel_total,
            });
        }

        let was_stopped = self.stopped_at.take().is_some();
        if was_stopped {
            info!("Motion started: total acceleration {accel_total:.5} m/s²");
            if self.publish_started {
                return Some(MotionEvent {
                    kind: MotionKind::Started,
                    accel_total,
                });
            }
        }
        None
    }
}

/// AIM publishing motion events derived from the sensor channel
pub struct MotionRecognition {
    input: ChannelHandle,
    output: ChannelHandle,
    poll_timeout: Duration,
    detector: MotionDetector,
}

impl MotionRecognition {
    pub fn new(input: ChannelHandle, output: ChannelHandle, config: &MotionRecognitionConfig) -> Self {
        Self {
            input,
            output,
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
            detector: MotionDetector::new(config),
        }
    }
}

impl Aim for MotionRecognition {
    fn startup(&mut self, _ctx: &Subscriber) -> Result<()> {
        self.detector.assume_stopped(timestamp::now());
        Ok(())
    }

    fn run(&mut self, ctx: &Subscriber) -> Result<()> {
        loop {
            match ctx.poll(PollTimeout::from(self.poll_timeout), self.input)? {
                Delivery::Delivered => {
                    let Some(message) = ctx.copy(self.input) else {
                        continue;
                    };
                    let Some(reading) = message.payload::<SensorReading>() else {
                        warn!("Ignoring sensor message of unexpected type");
                        continue;
                    };
                    debug!("Received reading from {}", message.timestamp());

                    if let Some(event) = self.detector.observe(message.timestamp(), reading) {
                        ctx.publish(&Message::new(event), self.output)?;
                        debug!("Published motion event {:?}", event.kind);
                    }
                }
                Delivery::TimedOut => {
                    warn!(
                        "Did not receive new sensor data for {:?}, continuing poll",
                        self.poll_timeout
                    );
                }
            }
        }
    }
}
