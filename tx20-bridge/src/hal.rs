//! Hardware seams.
//!
//! The core never touches registers. A board crate implements
//! [`AdcHardware`] for its ADC and [`Clock`] for a free-running timer, and
//! passes `embedded-hal` 1.0 pins for the DTR, TXD and LED lines.

use crate::acquisition::{Channel, Sample};

/// A multiplexed 8-bit ADC driven one conversion at a time.
///
/// Conversions are pipelined: [`start_conversion`](Self::start_conversion)
/// samples the currently selected input, and the result is collected with
/// [`read_sample`](Self::read_sample) once
/// [`conversion_ready`](Self::conversion_ready) reports completion.
pub trait AdcHardware {
    /// Route `channel` to the converter. Takes effect for the next
    /// conversion started.
    fn select_channel(&mut self, channel: Channel);

    /// Start one conversion on the selected input.
    fn start_conversion(&mut self);

    /// `true` once the last started conversion has a result.
    fn conversion_ready(&mut self) -> bool;

    /// Result of the last completed conversion.
    fn read_sample(&mut self) -> Sample;

    /// Blocking conversion of `channel`, used to prime inputs at start-up.
    fn read_raw_channel(&mut self, channel: Channel) -> Sample {
        self.select_channel(channel);
        self.start_conversion();
        while !self.conversion_ready() {
            core::hint::spin_loop();
        }
        self.read_sample()
    }
}

/// Free-running time base. Both counters wrap; compare with `wrapping_sub`.
pub trait Clock: Sync {
    /// Microseconds since an arbitrary epoch.
    fn micros(&self) -> u32;

    /// Milliseconds since the same epoch.
    fn millis(&self) -> u32;
}

/// `true` once `now` has reached `deadline` on a wrapping counter.
#[inline]
pub fn reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Time elapsed from `since` to `now` on a wrapping counter.
#[inline]
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_across_wrap() {
        let deadline = 10u32;
        assert!(!reached(u32::MAX - 5, deadline));
        assert!(reached(10, deadline));
        assert!(reached(11, deadline));
    }

    #[test]
    fn elapsed_across_wrap() {
        assert_eq!(elapsed(4, u32::MAX - 1), 6);
        assert_eq!(elapsed(100, 40), 60);
    }
}
