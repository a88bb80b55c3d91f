//! Wind instrument abstraction and the Davis 6410 implementation.
//!
//! A [`WindSource`] produces one wind reading per
//! [`start_sample`](WindSource::start_sample) request and reports completion
//! through a [`SampleListener`]. The protocol side only ever sees this
//! trait, never the sampling machinery behind it.

pub mod config;
pub mod instrument;

pub use config::InstrumentConfig;
pub use instrument::{InstrumentState, WindInstrument};

use core::fmt;

use crate::constants::MPH_PER_HZ;

/// Notified once when a requested reading is complete.
pub trait SampleListener {
    fn sample_complete(&self);
}

/// Something that can be asked for a wind reading.
pub trait WindSource<'a> {
    /// Begin a reading. Returns `false`, changing nothing, if a reading is
    /// already in progress or the source is not initialised.
    fn start_sample(&mut self, listener: &'a dyn SampleListener) -> bool;

    /// Cancel the reading in progress. The listener is not notified.
    fn abort_sample(&mut self);

    /// Speed of the last completed reading.
    fn wind_mph(&self) -> f32;

    /// Direction of the last completed reading, `0..=15` clockwise from
    /// north.
    fn wind_direction(&self) -> u8;
}

/// Raw result of one sampling cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindReading {
    /// Reed closures counted in the speed window.
    pub pulse_count: u8,
    /// Vane position, 10-bit.
    pub direction_raw: u16,
}

impl WindReading {
    /// Speed for a window of `period_ms`.
    pub fn speed_mph(&self, period_ms: u32) -> f32 {
        self.pulse_count as f32 * MPH_PER_HZ * 1000.0 / period_ms as f32
    }

    /// Vane position rounded to one of 16 compass points. The top half
    /// bucket wraps back to north.
    pub fn direction(&self) -> u8 {
        (((self.direction_raw + 31) >> 6) & 0x0F) as u8
    }

    pub fn compass(&self) -> Compass {
        Compass::from_index(self.direction())
    }
}

/// The 16 compass points, in TX20 direction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Compass {
    const ALL: [Compass; 16] = [
        Compass::N,
        Compass::NNE,
        Compass::NE,
        Compass::ENE,
        Compass::E,
        Compass::ESE,
        Compass::SE,
        Compass::SSE,
        Compass::S,
        Compass::SSW,
        Compass::SW,
        Compass::WSW,
        Compass::W,
        Compass::WNW,
        Compass::NW,
        Compass::NNW,
    ];

    /// Point for a direction index; only the low four bits are used.
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x0F) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NNE => "NNE",
            Compass::NE => "NE",
            Compass::ENE => "ENE",
            Compass::E => "E",
            Compass::ESE => "ESE",
            Compass::SE => "SE",
            Compass::SSE => "SSE",
            Compass::S => "S",
            Compass::SSW => "SSW",
            Compass::SW => "SW",
            Compass::WSW => "WSW",
            Compass::W => "W",
            Compass::WNW => "WNW",
            Compass::NW => "NW",
            Compass::NNW => "NNW",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_pulses_in_window_is_ten_mph() {
        let reading = WindReading {
            pulse_count: 10,
            direction_raw: 0,
        };
        assert_eq!(reading.speed_mph(2_250), 10.0);
        assert_eq!(reading.speed_mph(4_500), 5.0);
    }

    #[test]
    fn direction_rounds_to_nearest_point() {
        let dir = |raw| WindReading {
            pulse_count: 0,
            direction_raw: raw,
        };
        assert_eq!(dir(0).direction(), 0);
        assert_eq!(dir(32).direction(), 0);
        assert_eq!(dir(33).direction(), 1);
        assert_eq!(dir(256).direction(), 4);
        assert_eq!(dir(512).compass(), Compass::S);
        // Top bucket folds back to north.
        assert_eq!(dir(1009).direction(), 0);
        assert_eq!(dir(1023).compass(), Compass::N);
    }

    #[test]
    fn compass_names() {
        assert_eq!(Compass::from_index(7).name(), "SSE");
        assert_eq!(Compass::from_index(12).name(), "W");
        assert_eq!(Compass::from_index(0x13), Compass::ENE);
    }
}
