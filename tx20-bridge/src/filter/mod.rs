//! Sample-stream filters.
//!
//! A [`Filter`] consumes samples pushed one at a time from interrupt
//! context through a [`SampleTask`](crate::acquisition::SampleTask). Filters
//! never allocate and never block; each keeps its result for the main loop
//! to read once the task has finished.

pub mod average;
pub mod moving_average;
pub mod pulse_detector;
pub mod sample_counter;

pub use average::Average;
pub use moving_average::MovingAverage;
pub use pulse_detector::{PulseDetector, PulseThreshold};
pub use sample_counter::SampleCounter;

use crate::acquisition::Sample;

/// A consumer of a pushed sample stream.
pub trait Filter {
    /// Reset to the state right after construction.
    fn clear(&mut self);

    /// Consume one sample.
    fn process_sample(&mut self, value: Sample);

    /// `true` once the filter has all the samples it needs. Filters that
    /// run until stopped keep the default.
    fn is_complete(&self) -> bool {
        false
    }
}

/// A filter that counts wind-cup revolutions.
pub trait PulseTally {
    fn pulses(&self) -> u8;
}
