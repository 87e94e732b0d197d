// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Synthetic sensor and microphone input

use aif::analysis::messages::{AudioPeak, SensorReading};
use aif::com::{ChannelHandle, Message, MessageStore};
use aif::config::{MIC_PEAK_CHANNEL, SENSORS_CHANNEL};
use anyhow::{Context, Error};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Sampling period of the synthetic accelerometer
const TICK: Duration = Duration::from_millis(50);
/// Ticks per exercise repetition
const CYCLE_TICKS: u64 = 60;
/// Ticks of movement at the start of a repetition
const MOVING_TICKS: u64 = 20;
/// Tick of the audio peak, shortly after the movement stopped
const PEAK_TICK: u64 = 24;

const MOVING: SensorReading = SensorReading {
    accel: [3.0, 4.0, 11.0],
};
const STILL: SensorReading = SensorReading {
    accel: [0.05, 0.1, 9.81],
};

/// Publishes repetitions of "move, then stop" on the sensor channel. Every
/// other repetition is confirmed by an audio peak.
pub struct Driver {
    running: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl Driver {
    pub fn spawn(store: MessageStore) -> Result<Self, Error> {
        let sensors = store
            .channel(SENSORS_CHANNEL)
            .context("sensor channel missing")?;
        let peaks = store
            .channel(MIC_PEAK_CHANNEL)
            .context("microphone peak channel missing")?;

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let thread = thread::Builder::new()
            .name("aifd-driver".to_owned())
            .spawn(move || drive(&store, sensors, peaks, &thread_running))
            .context("failed to spawn driver thread")?;
        Ok(Self { running, thread })
    }

    pub fn stop(self) {
        self.running.store(false, Ordering::Relaxed);
        if self.thread.join().is_err() {
            warn!("Driver thread panicked");
        }
    }
}

fn drive(store: &MessageStore, sensors: ChannelHandle, peaks: ChannelHandle, running: &AtomicBool) {
    let mut tick = 0u64;
    while running.load(Ordering::Relaxed) {
        let phase = tick % CYCLE_TICKS;
        let repetition = tick / CYCLE_TICKS;

        let reading = if phase < MOVING_TICKS { MOVING } else { STILL };
        if let Err(e) = store.publish(&Message::new(reading), sensors) {
            warn!("Driver stopped: {e}");
            return;
        }

        if phase == PEAK_TICK && repetition % 2 == 0 {
            debug!("Publishing audio peak of repetition {repetition}");
            if let Err(e) = store.publish(&Message::new(AudioPeak { level: 0.8 }), peaks) {
                warn!("Driver stopped: {e}");
                return;
            }
        }

        tick += 1;
        thread::sleep(TICK);
    }
}
