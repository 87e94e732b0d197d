// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Periodic pause/resume policy for a single AIM

use crate::aim::AimStatus;
use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::ids::AiwId;
use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Stop flag with a wake-up for the sleeping supervisor thread
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

/// Alternates one AIM between alive and paused on a fixed interval
pub struct Supervisor {
    signal: Arc<StopSignal>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Supervisor {
    /// Spawn the supervisor thread
    pub fn spawn(
        controller: Arc<Mutex<Controller>>,
        aiw: AiwId,
        aim: &str,
        interval: Duration,
    ) -> Result<Self> {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let aim = aim.to_owned();
        let thread = thread::Builder::new()
            .name("aif-supervisor".to_owned())
            .spawn(move || supervise(&controller, aiw, &aim, interval, &thread_signal))
            .map_err(|e| Error::Io((e, "failed to spawn supervisor thread")))?;

        Ok(Self {
            signal,
            thread: Some(thread),
        })
    }

    /// Stop toggling and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.cond.notify_all();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Supervisor thread panicked");
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn supervise(
    controller: &Mutex<Controller>,
    aiw: AiwId,
    aim: &str,
    interval: Duration,
    signal: &StopSignal,
) {
    info!("Supervising {aim} every {interval:?}");
    loop {
        {
            let mut stopped = signal.stopped.lock();
            if !*stopped {
                signal.cond.wait_for(&mut stopped, interval);
            }
            if *stopped {
                break;
            }
        }

        if let Err(e) = toggle(&mut controller.lock(), aiw, aim) {
            warn!("Supervision of {aim} ended: {e}");
            break;
        }
    }
    debug!("Supervisor of {aim} finished");
}

/// Pause an alive AIM, resume a paused one
fn toggle(controller: &mut Controller, aiw: AiwId, aim: &str) -> Result<()> {
    match controller.aim_get_status(aiw, aim)? {
        AimStatus::Alive => controller.aim_pause(aiw, aim),
        AimStatus::Paused => controller.aim_resume(aiw, aim),
        status => {
            debug!("Not toggling {aim} in state {status}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AifConfig, DEFAULT_WORKFLOW, MOTION_RECOGNITION_AIM};

    #[test]
    fn toggles_between_alive_and_paused() {
        let mut controller = Controller::initialize(AifConfig::default()).unwrap();
        let id = controller.aiw_start(DEFAULT_WORKFLOW).unwrap();

        toggle(&mut controller, id, MOTION_RECOGNITION_AIM).unwrap();
        assert_eq!(
            controller.aim_get_status(id, MOTION_RECOGNITION_AIM).unwrap(),
            AimStatus::Paused
        );
        toggle(&mut controller, id, MOTION_RECOGNITION_AIM).unwrap();
        assert_eq!(
            controller.aim_get_status(id, MOTION_RECOGNITION_AIM).unwrap(),
            AimStatus::Alive
        );

        controller.aim_stop(id, MOTION_RECOGNITION_AIM).unwrap();
        toggle(&mut controller, id, MOTION_RECOGNITION_AIM).unwrap();
        assert_eq!(
            controller.aim_get_status(id, MOTION_RECOGNITION_AIM).unwrap(),
            AimStatus::Stopped
        );
        assert!(matches!(
            toggle(&mut controller, id, "Nobody"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn stop_ends_thread() {
        let mut controller = Controller::initialize(AifConfig::default()).unwrap();
        let id = controller.aiw_start(DEFAULT_WORKFLOW).unwrap();
        let controller = Arc::new(Mutex::new(controller));

        let supervisor = Supervisor::spawn(
            Arc::clone(&controller),
            id,
            MOTION_RECOGNITION_AIM,
            Duration::from_millis(10),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(55));
        supervisor.stop();

        let status = controller
            .lock()
            .aim_get_status(id, MOTION_RECOGNITION_AIM)
            .unwrap();
        assert!(status.has_task());
        assert_eq!(Arc::strong_count(&controller), 1);
    }
}
