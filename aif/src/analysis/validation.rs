// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

//! Movement validation: correlates motion stops with audio peaks

use super::messages::{Correlation, FailureReason, MotionEvent, MotionKind, Verdict};
use crate::aim::Aim;
use crate::com::{ChannelHandle, Delivery, Message, PollTimeout, Subscriber};
use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one [`Correlator::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A correlation window was completed
    Verdict(Correlation),
    /// The primary event was not newer than the last confirmation
    Discarded(Timestamp),
    /// The primary event carries a tag without a defined action
    Ignored(MotionKind),
}

/// Two-phase correlation of a primary channel with a confirmation channel.
///
/// Waits for a `Stopped` motion event, then for a confirmation within the
/// confirmation window. Confirmations not newer than the stop are dropped. The baseline is the timestamp of the last confirmation
/// and guards against correlating an event twice. A zero baseline accepts any
/// primary event.
#[derive(Debug)]
pub struct Correlator {
    primary: ChannelHandle,
    confirmation: ChannelHandle,
    primary_timeout: Duration,
    confirmation_timeout: Duration,
    baseline: Timestamp,
}

impl Correlator {
    pub fn new(
        primary: ChannelHandle,
        confirmation: ChannelHandle,
        primary_timeout: Duration,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            confirmation,
            primary_timeout,
            confirmation_timeout,
            baseline: Timestamp::ZERO,
        }
    }

    /// Timestamp of the last confirmation, zero if none
    pub fn baseline(&self) -> Timestamp {
        self.baseline
    }

    /// Forget the last confirmation
    pub fn reset(&mut self) {
        self.baseline = Timestamp::ZERO;
    }

    /// Run one correlation window
    pub fn step(&mut self, ctx: &Subscriber) -> Result<Step> {
        let event = match ctx.poll(PollTimeout::from(self.primary_timeout), self.primary)? {
            Delivery::Delivered => ctx
                .copy(self.primary)
                .ok_or(Error::Transport("primary channel delivered no value"))?,
            Delivery::TimedOut => {
                return Ok(Step::Verdict(Correlation::Failed(
                    FailureReason::NoPrimaryEvent,
                )))
            }
        };

        let primary = event.timestamp();
        if !self.baseline.is_zero() && primary <= self.baseline {
            warn!("Discarding old motion event from {primary}");
            return Ok(Step::Discarded(primary));
        }

        let kind = event
            .payload::<MotionEvent>()
            .map(|e| e.kind)
            .unwrap_or_default();
        if kind != MotionKind::Stopped {
            debug!("No action for motion event {kind:?}");
            return Ok(Step::Ignored(kind));
        }

        info!("Motion stopped at {primary}, waiting for confirmation");
        let deadline = Instant::now().checked_add(self.confirmation_timeout);
        loop {
            let timeout = match deadline {
                Some(deadline) => {
                    PollTimeout::from(deadline.saturating_duration_since(Instant::now()))
                }
                None => PollTimeout::Infinite,
            };
            match ctx.poll(timeout, self.confirmation)? {
                Delivery::Delivered => {
                    let confirmation = ctx
                        .copy(self.confirmation)
                        .ok_or(Error::Transport("confirmation channel delivered no value"))?
                        .timestamp();
                    if confirmation <= primary {
                        debug!("Dropping audio peak from {confirmation}, stop was at {primary}");
                        continue;
                    }
                    self.baseline = confirmation;
                    return Ok(Step::Verdict(Correlation::Succeeded {
                        primary,
                        confirmation,
                    }));
                }
                Delivery::TimedOut => {
                    self.reset();
                    return Ok(Step::Verdict(Correlation::Failed(
                        FailureReason::NoConfirmation,
                    )));
                }
            }
        }
    }
}

/// Reports a failed correlation to the outside world
pub trait FailureSignal: Send + Sync {
    fn signal(&self, reason: FailureReason);
}

/// Failure signal writing a warning to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSignal;

impl FailureSignal for LogSignal {
    fn signal(&self, reason: FailureReason) {
        warn!("Movement validation failed: {reason:?}");
    }
}

/// AIM validating movements against audio peaks
pub struct MovementValidation {
    correlator: Correlator,
    verdicts: Option<ChannelHandle>,
    signal: Arc<dyn FailureSignal>,
}

impl MovementValidation {
    pub fn new(
        correlator: Correlator,
        verdicts: Option<ChannelHandle>,
        signal: Arc<dyn FailureSignal>,
    ) -> Self {
        Self {
            correlator,
            verdicts,
            signal,
        }
    }

    fn report(&self, ctx: &Subscriber, correlation: Correlation) -> Result<()> {
        match correlation {
            Correlation::Succeeded {
                primary,
                confirmation,
            } => info!("Movement correct: stop at {primary} confirmed at {confirmation}"),
            Correlation::Failed(FailureReason::NoConfirmation) => {
                error!("Movement not correct: no audio peak after stop")
            }
            Correlation::Failed(FailureReason::NoPrimaryEvent) => {
                warn!("Movement not recognized")
            }
        }

        if let Some(verdicts) = self.verdicts {
            ctx.publish(&Message::new(Verdict(correlation)), verdicts)?;
        }
        if let Correlation::Failed(reason) = correlation {
            self.signal.signal(reason);
        }
        Ok(())
    }
}

impl Aim for MovementValidation {
    fn startup(&mut self, _ctx: &Subscriber) -> Result<()> {
        self.correlator.reset();
        Ok(())
    }

    fn run(&mut self, ctx: &Subscriber) -> Result<()> {
        loop {
            if let Step::Verdict(correlation) = self.correlator.step(ctx)? {
                self.report(ctx, correlation)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::messages::AudioPeak;
    use crate::com::MessageStore;
    use crate::ids::{AiwId, SubscriberId};
    use std::sync::Mutex;

    const WINDOW: Duration = Duration::from_millis(30);

    struct Setup {
        store: MessageStore,
        ctx: Subscriber,
        motion: ChannelHandle,
        peaks: ChannelHandle,
        correlator: Correlator,
    }

    fn setup() -> Setup {
        let store = MessageStore::new(AiwId::new(0, 0), "validation", 4);
        let motion = store.create_channel("MotionDataChannel").unwrap();
        let peaks = store.create_channel("MicPeakDataChannel").unwrap();
        let ctx = Subscriber::new(store.clone(), SubscriberId::next());
        let correlator = Correlator::new(motion, peaks, WINDOW, WINDOW);
        Setup {
            store,
            ctx,
            motion,
            peaks,
            correlator,
        }
    }

    fn stopped(millis: u64) -> Message {
        Message::at(
            Timestamp::from_millis(millis),
            MotionEvent {
                kind: MotionKind::Stopped,
                accel_total: 9.8,
            },
        )
    }

    fn peak(millis: u64) -> Message {
        Message::at(Timestamp::from_millis(millis), AudioPeak { level: 0.9 })
    }

    #[test]
    fn confirmed_stop_succeeds_and_moves_baseline() {
        let mut s = setup();
        s.store.publish(&stopped(1000), s.motion).unwrap();
        s.store.publish(&peak(1500), s.peaks).unwrap();

        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Succeeded {
                primary: Timestamp::from_millis(1000),
                confirmation: Timestamp::from_millis(1500),
            })
        );
        assert_eq!(s.correlator.baseline(), Timestamp::from_millis(1500));

        // the same event is not delivered twice
        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Failed(FailureReason::NoPrimaryEvent))
        );
    }

    #[test]
    fn stale_primary_is_discarded() {
        let mut s = setup();
        s.store.publish(&stopped(1000), s.motion).unwrap();
        s.store.publish(&peak(1500), s.peaks).unwrap();
        s.correlator.step(&s.ctx).unwrap();

        s.store.publish(&stopped(1200), s.motion).unwrap();
        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(step, Step::Discarded(Timestamp::from_millis(1200)));
        assert_eq!(s.correlator.baseline(), Timestamp::from_millis(1500));
    }

    #[test]
    fn confirmation_older_than_stop_is_dropped() {
        let mut s = setup();
        s.store.publish(&peak(100), s.peaks).unwrap();
        s.store.publish(&stopped(5000), s.motion).unwrap();

        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Failed(FailureReason::NoConfirmation))
        );
        assert!(s.correlator.baseline().is_zero());
    }

    #[test]
    fn newer_confirmation_after_stale_one_succeeds() {
        let s = setup();
        let mut correlator = Correlator::new(s.motion, s.peaks, WINDOW, Duration::from_secs(2));
        s.store.publish(&peak(100), s.peaks).unwrap();
        s.store.publish(&stopped(5000), s.motion).unwrap();
        let producer = {
            let store = s.store.clone();
            let peaks = s.peaks;
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                store.publish(&peak(5100), peaks).unwrap();
            })
        };

        let step = correlator.step(&s.ctx).unwrap();
        producer.join().unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Succeeded {
                primary: Timestamp::from_millis(5000),
                confirmation: Timestamp::from_millis(5100),
            })
        );
        assert_eq!(correlator.baseline(), Timestamp::from_millis(5100));
    }

    #[test]
    fn unconfirmed_stop_fails_and_resets_baseline() {
        let mut s = setup();
        s.store.publish(&stopped(1000), s.motion).unwrap();
        s.store.publish(&peak(1500), s.peaks).unwrap();
        s.correlator.step(&s.ctx).unwrap();

        s.store.publish(&stopped(2000), s.motion).unwrap();
        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Failed(FailureReason::NoConfirmation))
        );
        assert!(s.correlator.baseline().is_zero());

        // with a zero baseline any primary event is accepted again
        s.store.publish(&stopped(500), s.motion).unwrap();
        s.store.publish(&peak(600), s.peaks).unwrap();
        assert!(matches!(
            s.correlator.step(&s.ctx).unwrap(),
            Step::Verdict(Correlation::Succeeded { .. })
        ));
    }

    #[test]
    fn missing_primary_fails() {
        let mut s = setup();
        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(
            step,
            Step::Verdict(Correlation::Failed(FailureReason::NoPrimaryEvent))
        );
    }

    #[test]
    fn started_event_is_ignored() {
        let mut s = setup();
        let started = MotionEvent {
            kind: MotionKind::Started,
            accel_total: 14.0,
        };
        s.store.publish(&Message::new(started), s.motion).unwrap();
        s.store.publish(&peak(1500), s.peaks).unwrap();
        let step = s.correlator.step(&s.ctx).unwrap();
        assert_eq!(step, Step::Ignored(MotionKind::Started));
        assert!(s.correlator.baseline().is_zero());
    }

    #[test]
    fn destroyed_store_ends_step() {
        let mut s = setup();
        s.store.destroy();
        assert!(matches!(
            s.correlator.step(&s.ctx),
            Err(Error::Transport(_))
        ));
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<FailureReason>>);

    impl FailureSignal for Recorder {
        fn signal(&self, reason: FailureReason) {
            self.0.lock().unwrap().push(reason);
        }
    }

    #[test]
    fn report_publishes_verdict_and_signals_failures() {
        let s = setup();
        let verdicts = s.store.create_channel("ValidationResultChannel").unwrap();
        let recorder = Arc::new(Recorder::default());
        let aim = MovementValidation::new(s.correlator, Some(verdicts), recorder.clone());

        let failed = Correlation::Failed(FailureReason::NoConfirmation);
        aim.report(&s.ctx, failed).unwrap();
        let reader = Subscriber::new(s.store.clone(), SubscriberId::next());
        let verdict = reader.recv(PollTimeout::Immediate, verdicts).unwrap();
        assert_eq!(verdict.payload::<Verdict>(), Some(&Verdict(failed)));
        assert_eq!(*recorder.0.lock().unwrap(), vec![FailureReason::NoConfirmation]);

        let succeeded = Correlation::Succeeded {
            primary: Timestamp::from_millis(1),
            confirmation: Timestamp::from_millis(2),
        };
        aim.report(&s.ctx, succeeded).unwrap();
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }
}
