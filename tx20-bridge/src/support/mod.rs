//! Front-panel and bench helpers.

pub mod led;
#[cfg(feature = "bench")]
pub mod pulse_generator;

pub use led::Led;
#[cfg(feature = "bench")]
pub use pulse_generator::PulseGenerator;
