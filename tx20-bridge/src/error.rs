//! Error types for configuration and TX20 frame decoding.
//!
//! Runtime conditions on the sampling path (a busy instrument, a stale ADC
//! conversion) are not errors: they are reported through return values and
//! diagnostic counters. These types cover values that are wrong before
//! anything starts running, and frames that fail validation on the bench.

use thiserror_no_std::Error;

/// A configuration value outside the range the sampling pipeline supports.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("ADC channel {0} out of range 0..=7")]
    InvalidChannel(u8),
    #[error("sampling period must be non-zero")]
    ZeroPeriod,
    #[error("an average needs at least one sample")]
    ZeroAverageSamples,
    #[error("window width must be non-zero")]
    ZeroWindowWidth,
    #[error("pulse width {width} exceeds window capacity {max}")]
    PulseWidthTooLarge { width: usize, max: usize },
    #[error("noise factor {0} outside 0.0..1.0")]
    NoiseFactorOutOfRange(f32),
    #[error("bit time must be non-zero")]
    ZeroBitTime,
}

/// Why a captured TX20 line trace is not a valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame header is not 00100")]
    BadHeader,
    #[error("checksum mismatch: computed {expected:#x}, received {found:#x}")]
    ChecksumMismatch { expected: u8, found: u8 },
    #[error("inverted direction or speed copy does not match")]
    InvertedMismatch,
    #[error("line not idle-high after the last data bit")]
    MissingStopBit,
}
