//! A filter bound to a sample source.
//!
//! [`SampleTask`] is the unit the rest of the crate registers with a
//! [`SampleSource`]. It owns its filter, and everything the interrupt side
//! touches (filter, flags, counters) sits in one critical-section cell so
//! the main loop always sees a consistent snapshot.
//!
//! A task finishes either when its filter reports
//! [`is_complete`](Filter::is_complete) or, if it has one, when its
//! wall-clock period runs out. The period is also checked from the main
//! loop, so a dead input cannot stall whoever waits on the task.

use core::cell::RefCell;

use critical_section::Mutex;

use super::{Channel, Sample, SampleSink, SampleSource};
use crate::filter::Filter;
use crate::hal::{elapsed, Clock};

struct TaskState<F> {
    filter: F,
    started: bool,
    finished: bool,
    accepted: u32,
    started_at: u32,
}

pub struct SampleTask<'a, F> {
    source: &'a dyn SampleSource<'a>,
    clock: &'a dyn Clock,
    channel: Channel,
    period_ms: Option<u32>,
    state: Mutex<RefCell<TaskState<F>>>,
}

impl<'a, F: Filter + Send> SampleTask<'a, F> {
    pub fn new(
        source: &'a dyn SampleSource<'a>,
        clock: &'a dyn Clock,
        channel: Channel,
        filter: F,
    ) -> Self {
        SampleTask {
            source,
            clock,
            channel,
            period_ms: None,
            state: Mutex::new(RefCell::new(TaskState {
                filter,
                started: false,
                finished: false,
                accepted: 0,
                started_at: 0,
            })),
        }
    }

    /// Finish `period_ms` after [`start`](Self::start) regardless of the
    /// filter.
    pub fn with_period(mut self, period_ms: u32) -> Self {
        self.period_ms = Some(period_ms);
        self
    }

    /// Clear the filter and register with the source. No-op while started.
    pub fn start(&'a self)
    where
        F: 'a,
    {
        let now = self.clock.millis();
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if st.started {
                return;
            }
            st.filter.clear();
            st.started = true;
            st.finished = false;
            st.accepted = 0;
            st.started_at = now;
            drop(st);
            self.source.register(self, self.channel);
        });
    }

    /// Unregister from the source. The filter keeps its result.
    pub fn stop(&self) {
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if !st.started {
                return;
            }
            st.started = false;
            drop(st);
            self.source.unregister(self);
        });
    }

    pub fn is_started(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).started)
    }

    pub fn is_finished(&self) -> bool {
        let now = self.clock.millis();
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if !st.finished && st.started && self.period_expired(&st, now) {
                st.finished = true;
            }
            st.finished
        })
    }

    /// Samples fed to the filter since the last start.
    pub fn accepted(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).accepted)
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Run `f` on the filter inside a critical section.
    pub fn read<R>(&self, f: impl FnOnce(&F) -> R) -> R {
        critical_section::with(|cs| f(&self.state.borrow_ref(cs).filter))
    }

    fn period_expired(&self, st: &TaskState<F>, now: u32) -> bool {
        self.period_ms
            .is_some_and(|period| elapsed(now, st.started_at) >= period)
    }
}

impl<F: Filter + Send> SampleSink for SampleTask<'_, F> {
    fn service(&self, sample: Sample) {
        let now = self.clock.millis();
        critical_section::with(|cs| {
            let mut st = self.state.borrow_ref_mut(cs);
            if !st.started || st.finished {
                return;
            }
            if self.period_expired(&st, now) {
                st.finished = true;
                return;
            }
            st.filter.process_sample(sample);
            st.accepted = st.accepted.wrapping_add(1);
            if st.filter.is_complete() {
                st.finished = true;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::SampleClock;
    use crate::constants::SETTLE_SAMPLES;
    use crate::filter::{Average, SampleCounter};
    use crate::sim::{SimAdc, SimClock, SimInputs};

    fn ch(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[test]
    fn nothing_accepted_while_settling() {
        let time = SimClock::new();
        let inputs = SimInputs::new();
        let clock = SampleClock::new(SimAdc::new(inputs.clone()));
        let task = SampleTask::new(&clock, &time, ch(3), SampleCounter::new());

        task.start();
        for _ in 0..SETTLE_SAMPLES {
            clock.tick();
        }
        assert_eq!(task.accepted(), 0);

        clock.tick();
        assert_eq!(task.accepted(), 1);
    }

    #[test]
    fn finishes_when_filter_completes() {
        let time = SimClock::new();
        let inputs = SimInputs::new();
        inputs.set(0, 40);
        let clock = SampleClock::new(SimAdc::new(inputs.clone()));
        let task = SampleTask::new(&clock, &time, ch(0), Average::new(3).unwrap());

        task.start();
        for _ in 0..SETTLE_SAMPLES + 3 {
            clock.tick();
        }
        assert!(task.is_finished());
        assert_eq!(task.read(|avg| avg.value()), 40);

        // Further samples are ignored once finished.
        clock.tick();
        assert_eq!(task.accepted(), 3);
        task.stop();
        assert!(!clock.has_sink());
    }

    #[test]
    fn period_expiry_seen_from_main_loop() {
        let time = SimClock::new();
        let clock = SampleClock::new(SimAdc::new(SimInputs::new()));
        let task = SampleTask::new(&clock, &time, ch(0), SampleCounter::new()).with_period(100);

        task.start();
        time.advance_ms(99);
        assert!(!task.is_finished());
        time.advance_ms(1);
        assert!(task.is_finished());
    }

    #[test]
    fn restart_clears_filter() {
        let time = SimClock::new();
        let clock = SampleClock::new(SimAdc::new(SimInputs::new()));
        let task = SampleTask::new(&clock, &time, ch(0), SampleCounter::new());

        task.start();
        for _ in 0..SETTLE_SAMPLES + 5 {
            clock.tick();
        }
        assert_eq!(task.read(|c| c.count()), 5);

        task.stop();
        task.start();
        assert_eq!(task.read(|c| c.count()), 0);
        assert_eq!(task.accepted(), 0);
    }
}
