//! Counts every sample it is given. With an
//! [`EdgeTrigger`](crate::acquisition::EdgeTrigger) source each sample is
//! one debounced reed closure.

use super::{Filter, PulseTally};
use crate::acquisition::Sample;

#[derive(Debug, Clone, Default)]
pub struct SampleCounter {
    count: u8,
}

impl SampleCounter {
    pub const fn new() -> Self {
        SampleCounter { count: 0 }
    }

    pub fn count(&self) -> u8 {
        self.count
    }
}

impl Filter for SampleCounter {
    fn clear(&mut self) {
        self.count = 0;
    }

    fn process_sample(&mut self, _value: Sample) {
        self.count = self.count.saturating_add(1);
    }
}

impl PulseTally for SampleCounter {
    fn pulses(&self) -> u8 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturates() {
        let mut counter = SampleCounter::new();
        for _ in 0..300 {
            counter.process_sample(255);
        }
        assert_eq!(counter.pulses(), u8::MAX);
        counter.clear();
        assert_eq!(counter.count(), 0);
    }
}
