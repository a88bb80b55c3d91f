//! Runtime tuning for the Davis 6410 sampler.

use crate::acquisition::{Channel, SampleSource, SampleTask};
use crate::constants::{
    DIRECTION_SAMPLES, DIRECTION_TIMEOUT_MS, MOVING_AVERAGE_MAX_WIDTH, PULSE_DEBOUNCE_MS,
    PULSE_LOW_LEVEL, PULSE_NOISE_FACTOR, PULSE_WIDTH_MS, SAMPLES_PER_MS, SPEED_PERIOD_MS,
};
use crate::error::ConfigError;
use crate::filter::{Average, PulseDetector, PulseThreshold};
use crate::hal::Clock;

/// Sampling parameters. Widths are in samples at
/// [`SAMPLE_RATE_HZ`](crate::constants::SAMPLE_RATE_HZ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentConfig {
    /// Length of the speed window.
    pub speed_period_ms: u32,
    /// Vane samples per direction reading.
    pub direction_samples: u16,
    /// Direction sampling gives up after this long.
    pub direction_timeout_ms: u32,
    pub pulse_width: usize,
    pub pulse_debounce: u16,
    pub pulse_low_level: u8,
    pub pulse_threshold: PulseThreshold,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        InstrumentConfig {
            speed_period_ms: SPEED_PERIOD_MS,
            direction_samples: DIRECTION_SAMPLES,
            direction_timeout_ms: DIRECTION_TIMEOUT_MS,
            pulse_width: (PULSE_WIDTH_MS * SAMPLES_PER_MS) as usize,
            pulse_debounce: (PULSE_DEBOUNCE_MS * SAMPLES_PER_MS) as u16,
            pulse_low_level: PULSE_LOW_LEVEL,
            pulse_threshold: PulseThreshold::NoiseTolerant(PULSE_NOISE_FACTOR),
        }
    }
}

impl InstrumentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speed_period_ms == 0 || self.direction_timeout_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.direction_samples == 0 {
            return Err(ConfigError::ZeroAverageSamples);
        }
        if self.pulse_width == 0 {
            return Err(ConfigError::ZeroWindowWidth);
        }
        if self.pulse_width > MOVING_AVERAGE_MAX_WIDTH {
            return Err(ConfigError::PulseWidthTooLarge {
                width: self.pulse_width,
                max: MOVING_AVERAGE_MAX_WIDTH,
            });
        }
        if let PulseThreshold::NoiseTolerant(factor) = self.pulse_threshold {
            if !(0.0..1.0).contains(&factor) {
                return Err(ConfigError::NoiseFactorOutOfRange(factor));
            }
        }
        Ok(())
    }

    pub fn pulse_detector(&self) -> Result<PulseDetector, ConfigError> {
        PulseDetector::new(
            self.pulse_width,
            self.pulse_debounce,
            self.pulse_low_level,
            self.pulse_threshold,
        )
    }

    pub fn direction_average(&self) -> Result<Average, ConfigError> {
        Average::new(self.direction_samples)
    }

    /// Speed task on an ADC input: a [`PulseDetector`] over the speed window.
    pub fn speed_task<'a>(
        &self,
        source: &'a dyn SampleSource<'a>,
        clock: &'a dyn Clock,
        channel: Channel,
    ) -> Result<SampleTask<'a, PulseDetector>, ConfigError> {
        self.validate()?;
        Ok(SampleTask::new(source, clock, channel, self.pulse_detector()?)
            .with_period(self.speed_period_ms))
    }

    /// Vane task: an [`Average`] bounded by the direction timeout.
    pub fn direction_task<'a>(
        &self,
        source: &'a dyn SampleSource<'a>,
        clock: &'a dyn Clock,
        channel: Channel,
    ) -> Result<SampleTask<'a, Average>, ConfigError> {
        self.validate()?;
        Ok(SampleTask::new(source, clock, channel, self.direction_average()?)
            .with_period(self.direction_timeout_ms))
    }
}
