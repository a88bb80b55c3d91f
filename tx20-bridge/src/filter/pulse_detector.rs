//! Debounced reed-switch pulse detector.
//!
//! The reed input idles high and is pulled low while the switch is closed.
//! Each sample pushes `1` into a [`MovingAverage`] window when the level is
//! at or below `low_level`, `0` otherwise. The pulse is asserted while the
//! window sum reaches the threshold. A pulse is counted only when asserted
//! with the debounce counter at zero, and every asserted sample re-arms the
//! counter, so one long closure counts once and a second closure must come
//! at least `debounce_width` samples after the first one ends.

use super::{Filter, MovingAverage, PulseTally};
use crate::acquisition::Sample;
use crate::error::ConfigError;

/// How many of the window's samples must read low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PulseThreshold {
    /// Every sample in the window.
    Exact,
    /// All but `floor(factor * width)` samples.
    NoiseTolerant(f32),
}

impl PulseThreshold {
    fn required(self, width: usize) -> Result<u16, ConfigError> {
        match self {
            PulseThreshold::Exact => Ok(width as u16),
            PulseThreshold::NoiseTolerant(factor) => {
                if !(0.0..1.0).contains(&factor) {
                    return Err(ConfigError::NoiseFactorOutOfRange(factor));
                }
                let slack = (factor * width as f32) as usize;
                Ok((width - slack) as u16)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PulseDetector {
    window: MovingAverage,
    required: u16,
    low_level: Sample,
    debounce_width: u16,
    debounce: u16,
    count: u8,
    on_pulse: Option<fn()>,
}

impl PulseDetector {
    /// `pulse_width` and `debounce_width` are in samples.
    pub fn new(
        pulse_width: usize,
        debounce_width: u16,
        low_level: Sample,
        threshold: PulseThreshold,
    ) -> Result<Self, ConfigError> {
        let window = MovingAverage::new(pulse_width)?;
        let required = threshold.required(pulse_width)?;
        Ok(PulseDetector {
            window,
            required,
            low_level,
            debounce_width,
            debounce: 0,
            count: 0,
            on_pulse: None,
        })
    }

    /// Call `on_pulse` from the sampling interrupt for every counted pulse.
    pub fn with_callback(mut self, on_pulse: fn()) -> Self {
        self.on_pulse = Some(on_pulse);
        self
    }

    /// Pulses counted since the last clear, saturating at 255.
    pub fn pulse_count(&self) -> u8 {
        self.count
    }

    /// Window samples that must read low for the pulse to assert.
    pub fn required(&self) -> u16 {
        self.required
    }

    pub fn is_asserted(&self) -> bool {
        self.window.sum() >= self.required
    }
}

impl Filter for PulseDetector {
    fn clear(&mut self) {
        self.window.clear();
        self.debounce = 0;
        self.count = 0;
    }

    fn process_sample(&mut self, value: Sample) {
        if self.debounce > 0 {
            self.debounce -= 1;
        }

        self.window.push(u8::from(value <= self.low_level));

        if self.is_asserted() {
            if self.debounce == 0 {
                self.count = self.count.saturating_add(1);
                if let Some(on_pulse) = self.on_pulse {
                    on_pulse();
                }
            }
            self.debounce = self.debounce_width;
        }
    }
}

impl PulseTally for PulseDetector {
    fn pulses(&self) -> u8 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const HIGH: Sample = 200;
    const LOW: Sample = 0;

    fn feed(det: &mut PulseDetector, value: Sample, n: usize) {
        for _ in 0..n {
            det.process_sample(value);
        }
    }

    #[test]
    fn one_long_pulse_counts_once() {
        let mut det = PulseDetector::new(4, 8, 10, PulseThreshold::Exact).unwrap();
        feed(&mut det, HIGH, 10);
        feed(&mut det, LOW, 40);
        feed(&mut det, HIGH, 20);
        assert_eq!(det.pulse_count(), 1);
    }

    #[test]
    fn short_glitch_is_not_a_pulse() {
        let mut det = PulseDetector::new(4, 8, 10, PulseThreshold::Exact).unwrap();
        feed(&mut det, LOW, 3);
        feed(&mut det, HIGH, 10);
        assert_eq!(det.pulse_count(), 0);
    }

    #[test]
    fn pulses_inside_debounce_merge() {
        let mut det = PulseDetector::new(4, 8, 10, PulseThreshold::Exact).unwrap();
        feed(&mut det, LOW, 4);
        feed(&mut det, HIGH, 2);
        feed(&mut det, LOW, 4);
        assert_eq!(det.pulse_count(), 1);

        // Well clear of the debounce interval.
        feed(&mut det, HIGH, 12);
        feed(&mut det, LOW, 4);
        assert_eq!(det.pulse_count(), 2);
    }

    #[test]
    fn noise_tolerant_threshold() {
        // floor(0.25 * 8) = 2 high samples allowed in the window.
        let mut det =
            PulseDetector::new(8, 4, 10, PulseThreshold::NoiseTolerant(0.25)).unwrap();
        assert_eq!(det.required(), 6);
        for v in [LOW, LOW, HIGH, LOW, LOW, HIGH, LOW, LOW] {
            det.process_sample(v);
        }
        assert_eq!(det.pulse_count(), 1);
    }

    #[test]
    fn level_at_threshold_counts_as_low() {
        let mut det = PulseDetector::new(2, 2, 10, PulseThreshold::Exact).unwrap();
        feed(&mut det, 10, 2);
        assert!(det.is_asserted());
        feed(&mut det, 11, 1);
        assert!(!det.is_asserted());
    }

    #[test]
    fn callback_fires_per_counted_pulse() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn on_pulse() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let mut det = PulseDetector::new(2, 3, 10, PulseThreshold::Exact)
            .unwrap()
            .with_callback(on_pulse);
        for _ in 0..3 {
            feed(&mut det, LOW, 5);
            feed(&mut det, HIGH, 6);
        }
        assert_eq!(det.pulse_count(), 3);
        assert_eq!(FIRED.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn clear_resets_count_and_window() {
        let mut det = PulseDetector::new(2, 2, 10, PulseThreshold::Exact).unwrap();
        feed(&mut det, LOW, 2);
        det.clear();
        assert_eq!(det.pulse_count(), 0);
        assert!(!det.is_asserted());
    }

    #[test]
    fn rejects_bad_noise_factor() {
        assert_eq!(
            PulseDetector::new(4, 4, 10, PulseThreshold::NoiseTolerant(1.0)).unwrap_err(),
            ConfigError::NoiseFactorOutOfRange(1.0)
        );
    }
}
