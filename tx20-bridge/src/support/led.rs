//! Indicator LED with timed flashes.

use embedded_hal::digital::OutputPin;

use crate::hal::{reached, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Off,
    On,
    /// Lit until the deadline, in milliseconds.
    Flash(u32),
}

/// An LED that can be switched or flashed. Call
/// [`service`](Led::service) from the main loop to end flashes.
pub struct Led<'a, P> {
    pin: P,
    clock: &'a dyn Clock,
    mode: Mode,
}

impl<'a, P: OutputPin> Led<'a, P> {
    pub fn new(pin: P, clock: &'a dyn Clock) -> Self {
        let mut led = Led {
            pin,
            clock,
            mode: Mode::Off,
        };
        led.off();
        led
    }

    pub fn on(&mut self) {
        self.mode = Mode::On;
        let _ = self.pin.set_high();
    }

    pub fn off(&mut self) {
        self.mode = Mode::Off;
        let _ = self.pin.set_low();
    }

    /// Light for `duration_ms`, restarting any flash in progress.
    pub fn flash(&mut self, duration_ms: u32) {
        let until = self.clock.millis().wrapping_add(duration_ms);
        self.mode = Mode::Flash(until);
        let _ = self.pin.set_high();
    }

    pub fn service(&mut self) {
        if let Mode::Flash(until) = self.mode {
            if reached(self.clock.millis(), until) {
                self.off();
            }
        }
    }

    pub fn is_lit(&self) -> bool {
        self.mode != Mode::Off
    }
}
