//! Timer-driven ADC sampler.
//!
//! [`SampleClock::tick`] runs from the sample timer interrupt. Each tick
//! collects the conversion started on the previous tick, retargets the
//! input mux if the registered sink wants another channel, starts the next
//! conversion and hands the collected sample to the sink. After every
//! registration the first [`SETTLE_SAMPLES`] conversions are thrown away so
//! the sample-and-hold can settle on the new input.

use core::cell::RefCell;

use critical_section::Mutex;

use super::{same_sink, Channel, Sample, SampleSink, SampleSource};
use crate::constants::SETTLE_SAMPLES;
use crate::hal::AdcHardware;

/// Tick diagnostics. All counters wrap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockStats {
    /// Timer interrupts seen.
    pub ticks: u32,
    /// Ticks skipped because the conversion had not finished.
    pub stale_ticks: u32,
    /// Conversions thrown away while settling.
    pub discarded: u32,
    /// Samples handed to a sink.
    pub delivered: u32,
}

struct Shared<'a, A> {
    adc: A,
    sink: Option<&'a dyn SampleSink>,
    desired: Option<Channel>,
    active: Option<Channel>,
    settle: u8,
    stats: ClockStats,
}

impl<A: AdcHardware> Shared<'_, A> {
    fn retarget(&mut self) {
        if let Some(channel) = self.desired {
            if self.active != Some(channel) {
                self.adc.select_channel(channel);
                self.active = Some(channel);
            }
        }
    }
}

/// Owns the ADC and feeds one [`SampleSink`] at a time.
pub struct SampleClock<'a, A> {
    shared: Mutex<RefCell<Shared<'a, A>>>,
}

impl<'a, A: AdcHardware> SampleClock<'a, A> {
    pub const fn new(adc: A) -> Self {
        SampleClock {
            shared: Mutex::new(RefCell::new(Shared {
                adc,
                sink: None,
                desired: None,
                active: None,
                settle: 0,
                stats: ClockStats {
                    ticks: 0,
                    stale_ticks: 0,
                    discarded: 0,
                    delivered: 0,
                },
            })),
        }
    }

    /// Prime every input in `channels` with one blocking conversion, then
    /// start the conversion pipeline. Call once before enabling the timer.
    pub fn initialise(&self, channels: &[Channel]) {
        critical_section::with(|cs| {
            let mut s = self.shared.borrow_ref_mut(cs);
            for &channel in channels {
                let _ = s.adc.read_raw_channel(channel);
                s.active = Some(channel);
            }
            s.adc.start_conversion();
        });
        log::debug!("sample clock primed {} inputs", channels.len());
    }

    /// Timer interrupt body.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let mut s = self.shared.borrow_ref_mut(cs);
            s.stats.ticks = s.stats.ticks.wrapping_add(1);

            if !s.adc.conversion_ready() {
                s.stats.stale_ticks = s.stats.stale_ticks.wrapping_add(1);
                log::trace!("stale conversion on tick {}", s.stats.ticks);
                return;
            }

            if s.settle > 0 {
                s.settle -= 1;
                let _ = s.adc.read_sample();
                s.retarget();
                s.adc.start_conversion();
                s.stats.discarded = s.stats.discarded.wrapping_add(1);
                return;
            }

            let sample = s.adc.read_sample();
            s.retarget();
            s.adc.start_conversion();

            let Some(sink) = s.sink else {
                return;
            };
            s.stats.delivered = s.stats.delivered.wrapping_add(1);
            drop(s);

            // Still inside the critical section: an unregister from the main
            // loop cannot interleave with this delivery.
            sink.service(sample);
        });
    }

    /// Snapshot of the tick diagnostics.
    pub fn stats(&self) -> ClockStats {
        critical_section::with(|cs| self.shared.borrow_ref(cs).stats)
    }

    pub fn has_sink(&self) -> bool {
        critical_section::with(|cs| self.shared.borrow_ref(cs).sink.is_some())
    }

    /// Input the mux currently points at.
    pub fn active_channel(&self) -> Option<Channel> {
        critical_section::with(|cs| self.shared.borrow_ref(cs).active)
    }
}

impl<'a, A: AdcHardware + Send> SampleSource<'a> for SampleClock<'a, A> {
    fn register(&self, sink: &'a dyn SampleSink, channel: Channel) {
        critical_section::with(|cs| {
            let mut s = self.shared.borrow_ref_mut(cs);
            s.sink = Some(sink);
            s.desired = Some(channel);
            s.settle = SETTLE_SAMPLES;
            s.adc.start_conversion();
        });
    }

    fn unregister(&self, sink: &dyn SampleSink) {
        critical_section::with(|cs| {
            let mut s = self.shared.borrow_ref_mut(cs);
            if s.sink.is_some_and(|current| same_sink(current, sink)) {
                s.sink = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimAdc, SimInputs};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::vec::Vec;

    struct Recorder {
        samples: std::sync::Mutex<Vec<Sample>>,
    }

    impl Recorder {
        fn new() -> Self {
            Recorder {
                samples: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn taken(&self) -> Vec<Sample> {
            self.samples.lock().unwrap().clone()
        }
    }

    impl SampleSink for Recorder {
        fn service(&self, sample: Sample) {
            self.samples.lock().unwrap().push(sample);
        }
    }

    struct Counter(AtomicU32);

    impl SampleSink for Counter {
        fn service(&self, _sample: Sample) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn ch(n: u8) -> Channel {
        Channel::new(n).unwrap()
    }

    #[test]
    fn settle_discards_then_delivers() {
        let inputs = SimInputs::new();
        inputs.set(2, 77);
        let clock = SampleClock::new(SimAdc::new(inputs.clone()));
        let sink = Recorder::new();

        clock.register(&sink, ch(2));
        for _ in 0..SETTLE_SAMPLES {
            clock.tick();
        }
        assert!(sink.taken().is_empty());
        assert_eq!(clock.stats().discarded, SETTLE_SAMPLES as u32);

        clock.tick();
        assert_eq!(sink.taken(), [77]);
        assert_eq!(clock.active_channel(), Some(ch(2)));
    }

    #[test]
    fn samples_arrive_in_acquisition_order() {
        let inputs = SimInputs::new();
        let clock = SampleClock::new(SimAdc::new(inputs.clone()));
        let sink = Recorder::new();
        clock.register(&sink, ch(0));
        for _ in 0..SETTLE_SAMPLES {
            clock.tick();
        }

        for v in [10u8, 20, 30] {
            // The conversion collected on this tick was started on the last.
            inputs.set(0, v);
            clock.tick();
        }
        clock.tick();
        assert_eq!(sink.taken(), [0, 10, 20, 30]);
    }

    #[test]
    fn stale_conversion_skips_tick() {
        let inputs = SimInputs::new();
        let adc = SimAdc::new(inputs.clone());
        let busy = adc.busy_handle();
        let clock = SampleClock::new(adc);
        let sink = Counter(AtomicU32::new(0));
        clock.register(&sink, ch(1));
        for _ in 0..SETTLE_SAMPLES {
            clock.tick();
        }

        busy.store(true, Ordering::Relaxed);
        clock.tick();
        clock.tick();
        busy.store(false, Ordering::Relaxed);
        clock.tick();

        let stats = clock.stats();
        assert_eq!(stats.stale_ticks, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(sink.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn stale_handle_does_not_clear_newer_sink() {
        let clock = SampleClock::new(SimAdc::new(SimInputs::new()));
        let first = Counter(AtomicU32::new(0));
        let second = Counter(AtomicU32::new(0));

        clock.register(&first, ch(0));
        clock.register(&second, ch(1));
        clock.unregister(&first);
        assert!(clock.has_sink());

        for _ in 0..=SETTLE_SAMPLES {
            clock.tick();
        }
        assert_eq!(first.0.load(Ordering::Relaxed), 0);
        assert_eq!(second.0.load(Ordering::Relaxed), 1);

        clock.unregister(&second);
        assert!(!clock.has_sink());
    }

    #[test]
    fn no_sink_keeps_converting() {
        let clock = SampleClock::new(SimAdc::new(SimInputs::new()));
        clock.initialise(&[ch(0), ch(1)]);
        clock.tick();
        clock.tick();
        let stats = clock.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.stale_ticks, 0);
        assert_eq!(stats.delivered, 0);
    }
}
