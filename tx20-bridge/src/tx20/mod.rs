//! TX20 protocol: frame codec and the DTR-driven emulator.
//!
//! A TX20 stays silent until the station pulls DTR low. After a wake-up
//! delay it samples the wind and clocks out one 42 bit-time frame on TXD,
//! then keeps sending frames at least two seconds apart for as long as DTR
//! stays low.

pub mod emulator;
pub mod frame;

pub use emulator::{EmulatorEvent, EmulatorState, ProtocolEmulator, Tx20Timing};
pub use frame::Tx20Frame;
