// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Workflows driven end to end through the controller

use aif::analysis::messages::{AudioPeak, Correlation, FailureReason, SensorReading, Verdict};
use aif::analysis::FailureSignal;
use aif::config::{
    AifConfig, MIC_PEAK_CHANNEL, MOTION_RECOGNITION_AIM, MOVEMENT_VALIDATION_AIM,
    SENSORS_CHANNEL, VALIDATION_CHANNEL,
};
use aif::prelude::*;
use log::LevelFilter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WORKFLOW: &str = "bench";

/// The rehabilitation exercises validation workflow with windows short enough for tests
const CONFIG: &str = r#"{
    "name": "test",
    "workflows": [{
        "name": "bench",
        "channels": [
            "SensorsDataChannel",
            "MicPeakDataChannel",
            "MotionDataChannel",
            "ValidationResultChannel"
        ],
        "channel_capacity": 4,
        "aims": [
            { "name": "MotionRecognitionAnalysis", "kind": "motion_recognition",
              "poll_timeout_ms": 50 },
            { "name": "MovementsWithAudioValidation", "kind": "movement_validation",
              "primary_timeout_ms": 300, "confirmation_timeout_ms": 150 }
        ]
    }]
}"#;

const MOVING: SensorReading = SensorReading {
    accel: [3.0, 4.0, 11.0],
};
const STILL: SensorReading = SensorReading {
    accel: [0.0, 0.0, 9.81],
};

#[derive(Default)]
struct Recorder(Mutex<Vec<FailureReason>>);

impl FailureSignal for Recorder {
    fn signal(&self, reason: FailureReason) {
        self.0.lock().push(reason);
    }
}

struct Bench {
    controller: Controller,
    id: AiwId,
    store: MessageStore,
    recorder: Arc<Recorder>,
    verdicts: Subscriber,
    verdict_channel: ChannelHandle,
}

fn bench() -> Bench {
    let _ = aif_logger::try_init(LevelFilter::Warn, true);
    let recorder = Arc::new(Recorder::default());
    let config = AifConfig::from_json_str(CONFIG).unwrap();
    let mut controller = Controller::initialize(config)
        .unwrap()
        .with_failure_signal(recorder.clone());
    let id = controller.aiw_start(WORKFLOW).unwrap();
    let store = controller.store(id).unwrap();
    let verdict_channel = store.channel(VALIDATION_CHANNEL).unwrap();
    let verdicts = Subscriber::new(store.clone(), SubscriberId::next());
    Bench {
        controller,
        id,
        store,
        recorder,
        verdicts,
        verdict_channel,
    }
}

impl Bench {
    /// Publish `reading` a few times so that the motion AIM sees it
    fn hold(&self, reading: SensorReading) {
        let sensors = self.store.channel(SENSORS_CHANNEL).unwrap();
        for _ in 0..3 {
            self.store.publish(&Message::new(reading), sensors).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn peak(&self) {
        let peaks = self.store.channel(MIC_PEAK_CHANNEL).unwrap();
        self.store
            .publish(&Message::new(AudioPeak { level: 0.9 }), peaks)
            .unwrap();
    }

    /// Wait for the first verdict matching `predicate`
    fn await_verdict(&self, predicate: impl Fn(&Correlation) -> bool) -> Option<Correlation> {
        let deadline = Instant::now() + Duration::from_secs(3);
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            let Ok(message) = self.verdicts.recv(remaining, self.verdict_channel) else {
                return None;
            };
            match message.payload::<Verdict>() {
                Some(Verdict(correlation)) if predicate(correlation) => return Some(*correlation),
                _ => continue,
            }
        }
        None
    }
}

#[test]
fn confirmed_stop_is_validated() {
    let bench = bench();
    bench.hold(MOVING);
    bench.hold(STILL);
    bench.peak();

    let verdict = bench.await_verdict(Correlation::is_success).unwrap();
    let Correlation::Succeeded {
        primary,
        confirmation,
    } = verdict
    else {
        unreachable!()
    };
    assert!(!primary.is_zero());
    assert!(!confirmation.is_zero());
}

#[test]
fn unconfirmed_stop_fails_and_signals() {
    let bench = bench();
    bench.hold(MOVING);
    bench.hold(STILL);

    let verdict = bench
        .await_verdict(|c| *c == Correlation::Failed(FailureReason::NoConfirmation))
        .unwrap();
    assert_eq!(verdict, Correlation::Failed(FailureReason::NoConfirmation));
    assert!(bench
        .recorder
        .0
        .lock()
        .contains(&FailureReason::NoConfirmation));
}

#[test]
fn silence_fails_without_primary_event() {
    let bench = bench();
    let verdict = bench.await_verdict(|_| true).unwrap();
    assert_eq!(verdict, Correlation::Failed(FailureReason::NoPrimaryEvent));
}

#[test]
fn unknown_names_are_not_found() {
    let mut bench = bench();
    assert!(matches!(
        bench.controller.aiw_start("X"),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        bench.controller.aim_get_status(bench.id, "Unregistered"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn lifecycle_is_idempotent() {
    let mut bench = bench();
    let (controller, id) = (&mut bench.controller, bench.id);

    assert!(matches!(
        controller.aim_start(id, MOTION_RECOGNITION_AIM),
        Err(Error::AlreadyRunning(_))
    ));
    assert_eq!(
        controller.aim_get_status(id, MOTION_RECOGNITION_AIM).unwrap(),
        AimStatus::Alive
    );

    controller.aim_stop(id, MOVEMENT_VALIDATION_AIM).unwrap();
    assert!(matches!(
        controller.aim_stop(id, MOVEMENT_VALIDATION_AIM),
        Err(Error::InvalidState { .. })
    ));
    assert!(matches!(
        controller.aim_resume(id, MOVEMENT_VALIDATION_AIM),
        Err(Error::InvalidState { .. })
    ));

    controller.aiw_stop(id).unwrap();
    controller.aiw_stop(id).unwrap();
    controller.aiw_destroy(id).unwrap();
    assert!(bench.store.is_destroyed());
    assert!(matches!(
        controller.aim_get_status(id, MOTION_RECOGNITION_AIM),
        Err(Error::NotFound(_))
    ));

    // the workflow can be instantiated again
    let id = controller.aiw_start(WORKFLOW).unwrap();
    assert_eq!(
        controller.aim_get_status(id, MOVEMENT_VALIDATION_AIM).unwrap(),
        AimStatus::Alive
    );
}

#[test]
fn supervisor_toggles_through_shared_controller() {
    let bench = bench();
    let id = bench.id;
    let controller = Arc::new(Mutex::new(bench.controller));
    let supervisor = Supervisor::spawn(
        Arc::clone(&controller),
        id,
        MOTION_RECOGNITION_AIM,
        Duration::from_millis(20),
    )
    .unwrap();

    let mut seen_paused = false;
    for _ in 0..100 {
        let status = controller
            .lock()
            .aim_get_status(id, MOTION_RECOGNITION_AIM)
            .unwrap();
        if status == AimStatus::Paused {
            seen_paused = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    supervisor.stop();
    assert!(seen_paused);
}
