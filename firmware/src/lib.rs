//! Teensy 4.1 adapters for the bridge core.
//!
//! Wiring:
//!
//! | Signal | Pin | Notes |
//! |--------|-----|-------|
//! | Wind vane | A0 (p14) | ADC1 input 7, wiper of the 20 kΩ pot |
//! | Reed switch | A1 (p15) | ADC1 input 8, pulled up, closes to ground |
//! | DTR | p3 | active low, internal pull-up |
//! | TXD | p4 | to the station's data input |
//! | Panel LED | p9 | flashes once per frame |
//! | Indicator | p13 | on-board LED, lit while sampling |
//! | Bench pulses | p5 | `pulse_bench` only, jumper to A1 |

#![no_std]

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use teensy4_bsp as bsp;

use bsp::board;
use bsp::hal;
use bsp::ral;

use tx20_bridge::acquisition::{Channel, Sample};
use tx20_bridge::hal::{AdcHardware, Clock};

/// Logical channel used for the vane.
pub const VANE_CHANNEL: u8 = 0;
/// Logical channel used for the reed switch.
pub const SPEED_CHANNEL: u8 = 1;

/// ADC1 input behind each logical channel A0..A7.
const ADC1_INPUTS: [u32; 8] = [7, 8, 12, 11, 6, 5, 15, 0];

// ── ADC ──────────────────────────────────────────────────────────────

/// ADC1 in 8-bit software-triggered mode, one conversion at a time on
/// result slot 0.
pub struct TeensyAdc {
    adc: ral::adc::ADC1,
    input: u32,
}

impl TeensyAdc {
    /// Configure and calibrate ADC1. The ADC clock gate must be on.
    pub fn new(adc: ral::adc::ADC1) -> Self {
        // 8-bit, IPG/2 clock, long sample time for the high-impedance vane.
        ral::write_reg!(ral::adc, adc, CFG, MODE: 0, ADICLK: 0, ADIV: 1, ADLSMP: 1, ADSTS: 3);
        ral::modify_reg!(ral::adc, adc, GC, CAL: 1);
        while ral::read_reg!(ral::adc, adc, GC, CAL == 1) {
            core::hint::spin_loop();
        }
        TeensyAdc {
            adc,
            input: ADC1_INPUTS[0],
        }
    }
}

impl AdcHardware for TeensyAdc {
    fn select_channel(&mut self, channel: Channel) {
        self.input = ADC1_INPUTS[channel.index() as usize];
    }

    fn start_conversion(&mut self) {
        // Writing HC0 aborts any conversion in flight and starts a new one.
        ral::write_reg!(ral::adc, self.adc, HC0, ADCH: self.input);
    }

    fn conversion_ready(&mut self) -> bool {
        ral::read_reg!(ral::adc, self.adc, HS, COCO0 == 1)
    }

    fn read_sample(&mut self) -> Sample {
        ral::read_reg!(ral::adc, self.adc, R0, CDATA) as Sample
    }
}

/// Turn on the ADC1 clock gate. `board::t41` leaves it to the driver.
pub fn enable_adc1_clock() {
    // SAFETY: read-modify-write of a clock gate nothing else touches.
    unsafe {
        let ccm = ral::ccm::CCM::instance();
        ral::modify_reg!(ral::ccm, ccm, CCGR1, CG8: 0b11);
    }
}

// ── Time base ────────────────────────────────────────────────────────

struct Extended {
    gpt: hal::gpt::Gpt1,
    last: u32,
    wraps: u32,
}

impl Extended {
    fn now_us(&mut self) -> u64 {
        let count = self.gpt.count();
        if count < self.last {
            self.wraps = self.wraps.wrapping_add(1);
        }
        self.last = count;
        (self.wraps as u64) << 32 | count as u64
    }
}

/// GPT1 free-running at 1 MHz, extended to 64 bits so `millis` stays
/// continuous across the 32-bit microsecond wrap. Must be read at least
/// once per wrap (71 minutes); the main loop does so continuously.
pub struct MonotonicClock {
    inner: Mutex<RefCell<Extended>>,
}

impl MonotonicClock {
    pub fn new(mut gpt: hal::gpt::Gpt1) -> Self {
        gpt.disable();
        gpt.set_clock_source(hal::gpt::ClockSource::PeripheralClock);
        gpt.set_divider(board::PERCLK_FREQUENCY / 1_000_000);
        gpt.set_mode(hal::gpt::Mode::FreeRunning);
        gpt.set_reset_on_enable(true);
        gpt.enable();
        MonotonicClock {
            inner: Mutex::new(RefCell::new(Extended {
                gpt,
                last: 0,
                wraps: 0,
            })),
        }
    }

    fn now_us(&self) -> u64 {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).now_us())
    }
}

impl Clock for MonotonicClock {
    fn micros(&self) -> u32 {
        self.now_us() as u32
    }

    fn millis(&self) -> u32 {
        (self.now_us() / 1_000) as u32
    }
}

// ── Pins ─────────────────────────────────────────────────────────────

/// `embedded-hal` 1.0 output over a HAL GPIO output.
pub struct PushPull<P>(pub hal::gpio::Output<P>);

impl<P> ErrorType for PushPull<P> {
    type Error = Infallible;
}

impl<P> OutputPin for PushPull<P> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.clear();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set();
        Ok(())
    }
}

/// `embedded-hal` 1.0 input over a HAL GPIO input.
pub struct Sense<P>(pub hal::gpio::Input<P>);

impl<P> ErrorType for Sense<P> {
    type Error = Infallible;
}

impl<P> InputPin for Sense<P> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_set())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.is_set())
    }
}
