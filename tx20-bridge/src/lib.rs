//! # tx20-bridge
//!
//! A `no_std`, allocation-free bridge that turns a microcontroller into a
//! TX20 wind sensor. A Davis 6410 anemometer (reed-switch pulses plus a
//! potentiometer wind vane) is sampled in real time, reduced to one wind
//! speed and direction per request, and re-emitted as the bit-exact TX20
//! serial frame a weather station expects.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Hardware | [`hal`] | ADC and microsecond clock seams, `embedded-hal` pins |
//! | Acquisition | [`acquisition`] | Timer-driven [`SampleClock`](acquisition::SampleClock), edge source, sample tasks |
//! | Filters | [`filter`] | Average, moving average, debounced pulse detector |
//! | Instrument | [`wind`] | Davis 6410 sampling sequencer behind [`WindSource`](wind::WindSource) |
//! | Protocol | [`tx20`] | TX20 frame codec and DTR-driven emulator (feature-gated) |
//! | Support | [`support`] | Indicator LED, bench pulse generator |
//!
//! ## Data flow
//!
//! ```text
//! timer ISR ─► SampleClock::tick ─► SampleTask (sink) ─► Filter
//!                                         │
//!                  WindInstrument::service ◄─ is_finished()
//!                         │ sample_complete()
//!                         ▼
//!              ProtocolEmulator::service ─► TXD (42 bit-times)
//! ```
//!
//! Everything shared between the timer interrupt and the main loop lives in
//! a `critical_section::Mutex<RefCell<_>>` owned by one object, so the crate
//! works with any `critical-section` implementation (single-core Cortex-M on
//! target, `std` on the host for tests).
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `tx20` | yes | [`tx20`] frame codec and protocol emulator |
//! | `bench` | yes | [`support::PulseGenerator`] for bench testing |
//!
//! ## Timing parameters
//!
//! - **Sample rate:** 4 kHz ([`constants::SAMPLE_RATE_HZ`])
//! - **Speed window:** 2250 ms ([`constants::SPEED_PERIOD_MS`]), so pulses in
//!   the window equal miles per hour
//! - **TX20 bit time:** 1220 µs ([`constants::TX20_BIT_US`])

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod error;
pub mod hal;
pub mod acquisition;
pub mod filter;
pub mod wind;
pub mod support;

#[cfg(feature = "tx20")]
pub mod tx20;

#[cfg(test)]
mod sim;


pub use error::{ConfigError, FrameError};
