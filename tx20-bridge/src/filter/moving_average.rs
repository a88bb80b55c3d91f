//! Sliding-window sum over the last `width` samples.

use crate::acquisition::Sample;
use crate::constants::MOVING_AVERAGE_MAX_WIDTH;
use crate::error::ConfigError;

/// Ring buffer of up to [`MOVING_AVERAGE_MAX_WIDTH`] samples with a running
/// sum. The window width is chosen at construction.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    buf: [Sample; MOVING_AVERAGE_MAX_WIDTH],
    width: usize,
    index: usize,
    sum: u16,
}

impl MovingAverage {
    pub const fn new(width: usize) -> Result<Self, ConfigError> {
        if width == 0 {
            return Err(ConfigError::ZeroWindowWidth);
        }
        if width > MOVING_AVERAGE_MAX_WIDTH {
            return Err(ConfigError::PulseWidthTooLarge {
                width,
                max: MOVING_AVERAGE_MAX_WIDTH,
            });
        }
        Ok(MovingAverage {
            buf: [0; MOVING_AVERAGE_MAX_WIDTH],
            width,
            index: 0,
            sum: 0,
        })
    }

    /// Replace the oldest sample with `value`.
    #[inline]
    pub fn push(&mut self, value: Sample) {
        // 128 * 255 fits in u16.
        self.sum -= self.buf[self.index] as u16;
        self.buf[self.index] = value;
        self.sum += value as u16;
        self.index += 1;
        if self.index == self.width {
            self.index = 0;
        }
    }

    #[inline]
    pub fn sum(&self) -> u16 {
        self.sum
    }

    pub fn average(&self) -> Sample {
        (self.sum / self.width as u16) as Sample
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Zero the window.
    pub fn clear(&mut self) {
        self.buf[..self.width].fill(0);
        self.index = 0;
        self.sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_tracks_last_width_values() {
        let mut ma = MovingAverage::new(4).unwrap();
        for v in [1, 2, 3, 4, 5, 6] {
            ma.push(v);
        }
        assert_eq!(ma.sum(), 3 + 4 + 5 + 6);
        assert_eq!(ma.average(), 4);
    }

    #[test]
    fn clear_forgets_history() {
        let mut ma = MovingAverage::new(3).unwrap();
        for _ in 0..10 {
            ma.push(255);
        }
        ma.clear();
        assert_eq!(ma.sum(), 0);
        for v in [7, 8, 9] {
            ma.push(v);
        }
        assert_eq!(ma.sum(), 24);
    }

    #[test]
    fn full_capacity_of_max_samples() {
        let mut ma = MovingAverage::new(MOVING_AVERAGE_MAX_WIDTH).unwrap();
        for _ in 0..MOVING_AVERAGE_MAX_WIDTH * 2 {
            ma.push(255);
        }
        assert_eq!(ma.sum(), 255 * MOVING_AVERAGE_MAX_WIDTH as u16);
        assert_eq!(ma.average(), 255);
    }

    #[test]
    fn width_limits() {
        assert_eq!(MovingAverage::new(0).unwrap_err(), ConfigError::ZeroWindowWidth);
        assert_eq!(
            MovingAverage::new(MOVING_AVERAGE_MAX_WIDTH + 1).unwrap_err(),
            ConfigError::PulseWidthTooLarge {
                width: MOVING_AVERAGE_MAX_WIDTH + 1,
                max: MOVING_AVERAGE_MAX_WIDTH,
            }
        );
    }
}
