//! Fixed-count arithmetic mean.

use super::Filter;
use crate::acquisition::Sample;
use crate::error::ConfigError;

/// Mean of the first `n` samples after a clear. Samples past `n` are
/// ignored until the next clear.
#[derive(Debug, Clone)]
pub struct Average {
    n: u16,
    count: u16,
    sum: u32,
    done: bool,
}

impl Average {
    pub const fn new(n: u16) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::ZeroAverageSamples);
        }
        Ok(Average {
            n,
            count: 0,
            sum: 0,
            done: false,
        })
    }

    /// Integer mean of the samples taken so far.
    ///
    /// Must not be called before the first sample; returns 0 in release
    /// builds if it is.
    pub fn value(&self) -> Sample {
        debug_assert!(self.count > 0, "Average::value with no samples");
        if self.count == 0 {
            return 0;
        }
        (self.sum / self.count as u32) as Sample
    }

    /// Samples taken since the last clear.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Samples this average waits for.
    pub fn target(&self) -> u16 {
        self.n
    }
}

impl Filter for Average {
    fn clear(&mut self) {
        self.count = 0;
        self.sum = 0;
        self.done = false;
    }

    fn process_sample(&mut self, value: Sample) {
        if self.done {
            return;
        }
        self.sum += value as u32;
        self.count += 1;
        if self.count == self.n {
            self.done = true;
        }
    }

    fn is_complete(&self) -> bool {
        self.done
    }
}
