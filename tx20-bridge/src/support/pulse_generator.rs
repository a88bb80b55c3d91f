//! Synthetic reed-switch signal for bench testing.
//!
//! Wire the output to the speed input and the bridge should report
//! `1000 / period_ms * 2.25` mph.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ConfigError;

/// Drives its pin low from the start of every `period_ms` through
/// `width_ms` inclusive, so each low phase lasts `width_ms + 1` ms.
pub struct PulseGenerator<P> {
    pin: P,
    period_ms: u32,
    width_ms: u32,
    low: Option<bool>,
    pulses: u32,
}

impl<P: OutputPin> PulseGenerator<P> {
    pub fn new(pin: P, period_ms: u32, width_ms: u32) -> Result<Self, ConfigError> {
        if period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(PulseGenerator {
            pin,
            period_ms,
            width_ms,
            low: None,
            pulses: 0,
        })
    }

    /// Update the output for the millisecond clock `now_ms`.
    pub fn service(&mut self, now_ms: u32) {
        let low = now_ms % self.period_ms <= self.width_ms;
        if self.low == Some(low) {
            return;
        }
        if low {
            self.pulses = self.pulses.wrapping_add(1);
        }
        self.low = Some(low);
        let _ = self.pin.set_state(PinState::from(!low));
    }

    /// Low phases started so far.
    pub fn pulses(&self) -> u32 {
        self.pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimPin;

    #[test]
    fn low_for_width_each_period() {
        let pin = SimPin::new(true);
        let mut pulse = PulseGenerator::new(pin.clone(), 100, 20).unwrap();
        let mut low_ms = 0;
        for ms in 0..1_000 {
            pulse.service(ms);
            if !pin.is_high_now() {
                low_ms += 1;
            }
        }
        // 0..=20 of every period.
        assert_eq!(low_ms, 21 * 10);
        assert_eq!(pulse.pulses(), 10);
    }

    #[test]
    fn writes_only_on_change() {
        let pin = SimPin::new(true);
        let mut pulse = PulseGenerator::new(pin.clone(), 50, 5).unwrap();
        for ms in 0..50 {
            pulse.service(ms);
        }
        assert_eq!(pin.writes(), 2);
    }
}
