//! Simulated hardware for host tests.
//!
//! Handles are cheap clones over shared atomics so a test can keep one copy
//! to drive or observe while the code under test owns another.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::acquisition::{Channel, Sample};
use crate::hal::{AdcHardware, Clock};

// ── Clock ────────────────────────────────────────────────────────────

struct ClockInner {
    now_us: AtomicU32,
    step_us: u32,
}

/// Manually advanced clock. With a non-zero step, every `micros()` read
/// also advances time, so spin-waits terminate.
#[derive(Clone)]
pub struct SimClock {
    inner: Arc<ClockInner>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::with_step(0)
    }

    pub fn with_step(step_us: u32) -> Self {
        SimClock {
            inner: Arc::new(ClockInner {
                now_us: AtomicU32::new(0),
                step_us,
            }),
        }
    }

    pub fn advance_us(&self, us: u32) {
        self.inner.now_us.fetch_add(us, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(ms * 1_000);
    }

    /// Current time without stepping.
    pub fn now_us(&self) -> u32 {
        self.inner.now_us.load(Ordering::SeqCst)
    }
}

impl Clock for SimClock {
    fn micros(&self) -> u32 {
        self.inner
            .now_us
            .fetch_add(self.inner.step_us, Ordering::SeqCst)
    }

    fn millis(&self) -> u32 {
        self.now_us() / 1_000
    }
}

// ── ADC ──────────────────────────────────────────────────────────────

/// Analog levels on the eight ADC inputs.
#[derive(Clone)]
pub struct SimInputs {
    levels: Arc<[AtomicU8; 8]>,
}

impl SimInputs {
    pub fn new() -> Self {
        SimInputs {
            levels: Arc::new(core::array::from_fn(|_| AtomicU8::new(0))),
        }
    }

    pub fn set(&self, channel: u8, level: Sample) {
        self.levels[channel as usize].store(level, Ordering::SeqCst);
    }

    pub fn get(&self, channel: u8) -> Sample {
        self.levels[channel as usize].load(Ordering::SeqCst)
    }
}

/// ADC that latches the selected input when a conversion starts.
pub struct SimAdc {
    inputs: SimInputs,
    selected: u8,
    latched: Option<Sample>,
    busy: Arc<AtomicBool>,
}

impl SimAdc {
    pub fn new(inputs: SimInputs) -> Self {
        SimAdc {
            inputs,
            selected: 0,
            latched: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While set, conversions never complete.
    pub fn busy_handle(&self) -> Arc<AtomicBool> {
        self.busy.clone()
    }
}

impl AdcHardware for SimAdc {
    fn select_channel(&mut self, channel: Channel) {
        self.selected = channel.index();
    }

    fn start_conversion(&mut self) {
        self.latched = Some(self.inputs.get(self.selected));
    }

    fn conversion_ready(&mut self) -> bool {
        self.latched.is_some() && !self.busy.load(Ordering::SeqCst)
    }

    fn read_sample(&mut self) -> Sample {
        self.latched.take().unwrap_or(0)
    }
}

// ── Pins ─────────────────────────────────────────────────────────────

/// A digital line. Output writes can be logged with a timestamp or mirrored
/// onto an ADC input (low = 0, high = 255).
#[derive(Clone)]
pub struct SimPin {
    level: Arc<AtomicBool>,
    log: Option<(SimClock, Arc<Mutex<Vec<(u32, bool)>>>)>,
    analog: Option<(SimInputs, u8)>,
    writes: Arc<AtomicU32>,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        SimPin {
            level: Arc::new(AtomicBool::new(high)),
            log: None,
            analog: None,
            writes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Output that records `(time_us, level)` for every write.
    pub fn recording(high: bool, clock: &SimClock) -> Self {
        SimPin {
            log: Some((clock.clone(), Arc::new(Mutex::new(Vec::new())))),
            ..Self::new(high)
        }
    }

    /// Output wired to ADC input `channel`.
    pub fn analog(inputs: &SimInputs, channel: u8, high: bool) -> Self {
        inputs.set(channel, if high { 255 } else { 0 });
        SimPin {
            analog: Some((inputs.clone(), channel)),
            ..Self::new(high)
        }
    }

    /// Drive the line from the test side.
    pub fn drive(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }

    pub fn is_high_now(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Writes made through the `OutputPin` side.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<(u32, bool)> {
        match &self.log {
            Some((_, log)) => log.lock().unwrap().clone(),
            None => Vec::new(),
        }
    }

    pub fn clear_log(&self) {
        if let Some((_, log)) = &self.log {
            log.lock().unwrap().clear();
        }
    }

    fn write(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some((clock, log)) = &self.log {
            log.lock().unwrap().push((clock.now_us(), high));
        }
        if let Some((inputs, channel)) = &self.analog {
            inputs.set(*channel, if high { 255 } else { 0 });
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.write(true);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.is_high_now())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.is_high_now())
    }
}
