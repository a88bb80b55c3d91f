//! TX20 frame layout.
//!
//! Symbols, in transmission order, all fields LSB first:
//!
//! ```text
//!  bits  0..5   header      0 0 1 0 0
//!  bits  5..9   direction   4 bits
//!  bits  9..21  speed       12 bits, 0.1 m/s
//!  bits 21..25  checksum    (dir + speed nibbles) & 0xF
//!  bits 25..29  !direction
//!  bits 29..41  !speed
//!  bit  41      stop        line idle-high
//! ```
//!
//! On the line a `1` symbol is driven low and a `0` symbol high. The
//! header goes through the same inversion as the data.

use crate::constants::{TX20_FRAME_BITS, TX20_MAX_SPEED};
use crate::error::FrameError;

const HEADER: [bool; 5] = [false, false, true, false, false];

/// Symbols carrying data: everything but the stop bit.
const DATA_BITS: usize = TX20_FRAME_BITS - 1;

const KMH_PER_MPH: f32 = 1.609_344;

/// One wind report as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tx20Frame {
    direction: u8,
    speed: u16,
}

impl Tx20Frame {
    /// `direction` is masked to four bits, `speed` (0.1 m/s) clamped to
    /// twelve.
    pub fn new(direction: u8, speed: u16) -> Self {
        Tx20Frame {
            direction: direction & 0x0F,
            speed: speed.min(TX20_MAX_SPEED),
        }
    }

    /// Frame for a speed in mph and a compass index.
    pub fn from_wind(mph: f32, direction: u8) -> Self {
        let tenths = libm::roundf(mph * KMH_PER_MPH * 1000.0 * 10.0 / 3600.0);
        let speed = if tenths <= 0.0 {
            0
        } else if tenths >= TX20_MAX_SPEED as f32 {
            TX20_MAX_SPEED
        } else {
            tenths as u16
        };
        Self::new(direction, speed)
    }

    pub fn direction(&self) -> u8 {
        self.direction
    }

    /// Speed in 0.1 m/s.
    pub fn speed(&self) -> u16 {
        self.speed
    }

    pub fn speed_mps(&self) -> f32 {
        self.speed as f32 / 10.0
    }

    pub fn checksum(&self) -> u8 {
        let s = self.speed;
        let sum = self.direction as u16 + (s & 0xF) + ((s >> 4) & 0xF) + ((s >> 8) & 0xF);
        (sum & 0xF) as u8
    }

    /// Logical symbols, stop bit excluded.
    pub fn symbols(&self) -> [bool; DATA_BITS] {
        let mut out = [false; DATA_BITS];
        out[..HEADER.len()].copy_from_slice(&HEADER);
        let mut pos = HEADER.len();
        for (value, width) in [
            (self.direction as u16, 4),
            (self.speed, 12),
            (self.checksum() as u16, 4),
            (!self.direction as u16 & 0x0F, 4),
            (!self.speed & 0x0FFF, 12),
        ] {
            for bit in 0..width {
                out[pos] = value >> bit & 1 == 1;
                pos += 1;
            }
        }
        out
    }

    /// Line level for each bit-time, `true` for high.
    pub fn line_levels(&self) -> [bool; TX20_FRAME_BITS] {
        let mut levels = [true; TX20_FRAME_BITS];
        for (level, symbol) in levels.iter_mut().zip(self.symbols()) {
            *level = !symbol;
        }
        levels
    }

    /// Validate and decode a captured line trace, one level per bit-time.
    pub fn decode(levels: &[bool; TX20_FRAME_BITS]) -> Result<Self, FrameError> {
        let mut symbols = [false; DATA_BITS];
        for (symbol, level) in symbols.iter_mut().zip(levels) {
            *symbol = !*level;
        }
        if symbols[..HEADER.len()] != HEADER {
            return Err(FrameError::BadHeader);
        }
        if !levels[DATA_BITS] {
            return Err(FrameError::MissingStopBit);
        }

        let field = |start: usize, width: usize| {
            (0..width).fold(0u16, |acc, bit| acc | (symbols[start + bit] as u16) << bit)
        };
        let direction = field(5, 4) as u8;
        let speed = field(9, 12);
        let found = field(21, 4) as u8;
        let inverted_direction = field(25, 4) as u8;
        let inverted_speed = field(29, 12);

        let frame = Tx20Frame { direction, speed };
        let expected = frame.checksum();
        if found != expected {
            return Err(FrameError::ChecksumMismatch { expected, found });
        }
        if inverted_direction != !direction & 0x0F || inverted_speed != !speed & 0x0FFF {
            return Err(FrameError::InvertedMismatch);
        }
        Ok(frame)
    }
}
