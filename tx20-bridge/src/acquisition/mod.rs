//! Real-time sample acquisition.
//!
//! A [`SampleSource`] delivers samples from interrupt context to exactly
//! one registered [`SampleSink`]. Two sources exist: the timer-driven
//! [`SampleClock`], which multiplexes the ADC, and [`EdgeTrigger`], which
//! turns debounced pin edges into [`EDGE_SAMPLE`](crate::constants::EDGE_SAMPLE)
//! events. A [`SampleTask`] binds a [`Filter`](crate::filter::Filter) to a
//! source and is what gets registered.
//!
//! Sinks are held by reference, never owned. Registration replaces the
//! current sink and unregistration compares by identity, so a stale handle
//! cannot clear a newer registration.

pub mod edge_trigger;
pub mod sample_clock;
pub mod task;

pub use edge_trigger::EdgeTrigger;
pub use sample_clock::{ClockStats, SampleClock};
pub use task::SampleTask;

use crate::constants::ADC_CHANNELS;
use crate::error::ConfigError;

/// One 8-bit ADC reading, or [`EDGE_SAMPLE`](crate::constants::EDGE_SAMPLE)
/// for an edge event.
pub type Sample = u8;

/// A validated ADC input index, `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(u8);

impl Channel {
    pub const fn new(index: u8) -> Result<Self, ConfigError> {
        if index < ADC_CHANNELS {
            Ok(Channel(index))
        } else {
            Err(ConfigError::InvalidChannel(index))
        }
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Consumer of a sample stream. Called from interrupt context.
pub trait SampleSink: Sync {
    fn service(&self, sample: Sample);
}

/// Producer of a sample stream with a single registered consumer.
pub trait SampleSource<'a>: Sync {
    /// Make `sink` the current consumer, reading from `channel` where the
    /// source is multiplexed. Never blocks.
    fn register(&self, sink: &'a dyn SampleSink, channel: Channel);

    /// Clear the current consumer if it is `sink`.
    fn unregister(&self, sink: &dyn SampleSink);
}

/// Identity comparison of two sinks, ignoring vtables.
#[inline]
pub(crate) fn same_sink(a: &dyn SampleSink, b: &dyn SampleSink) -> bool {
    core::ptr::addr_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_range() {
        assert_eq!(Channel::new(7).map(Channel::index), Ok(7));
        assert_eq!(Channel::new(8), Err(ConfigError::InvalidChannel(8)));
    }
}
