//! TX20 protocol emulator.
//!
//! Drives TXD and an activity indicator from the DTR enable line and a
//! [`WindSource`]. The TXD and indicator levels depend only on the state and
//! are applied on entry:
//!
//! | State | TXD | Indicator |
//! |-------|-----|-----------|
//! | `Disabled` | high | off |
//! | `StartSample` | high | off |
//! | `Sampling` | low | on |
//! | `Sending` | frame bits | on |
//!
//! Every transition except `Sampling → Sending` happens inside
//! [`service`](ProtocolEmulator::service). That one is made by the wind
//! source calling [`SampleListener::sample_complete`] when its reading is
//! ready. Frame bits are timed by spinning on the microsecond clock against
//! absolute per-bit deadlines, so loop overhead never accumulates.

use core::cell::{Cell, RefCell};

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use heapless::Deque;

use super::Tx20Frame;
use crate::constants::{TX20_BIT_US, TX20_MIN_FRAME_INTERVAL_US, TX20_WAKEUP_US};
use crate::error::ConfigError;
use crate::hal::{reached, Clock};
use crate::wind::{SampleListener, WindSource};

/// Events kept for the application loop.
pub const EVENT_QUEUE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorState {
    /// DTR released; line idle.
    Disabled,
    /// DTR active; waiting for the wake-up or inter-frame deadline.
    StartSample,
    /// Wind source is taking a reading.
    Sampling,
    /// Reading complete; frame goes out on the next service call.
    Sending,
}

/// Protocol milestones, drained with [`ProtocolEmulator::next_event`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmulatorEvent {
    StartSample,
    AbortSample,
    StartDataFrame,
    EndDataFrame(Tx20Frame),
    EndSample { mph: f32, direction: u8 },
}

/// Protocol timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tx20Timing {
    pub bit_us: u32,
    pub wakeup_us: u32,
    pub min_frame_interval_us: u32,
}

impl Default for Tx20Timing {
    fn default() -> Self {
        Tx20Timing {
            bit_us: TX20_BIT_US,
            wakeup_us: TX20_WAKEUP_US,
            min_frame_interval_us: TX20_MIN_FRAME_INTERVAL_US,
        }
    }
}

impl Tx20Timing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bit_us == 0 {
            return Err(ConfigError::ZeroBitTime);
        }
        Ok(())
    }
}

struct Lines<Dtr, Txd, Ind> {
    dtr: Dtr,
    txd: Txd,
    indicator: Ind,
}

pub struct ProtocolEmulator<'a, Dtr, Txd, Ind> {
    lines: RefCell<Lines<Dtr, Txd, Ind>>,
    clock: &'a dyn Clock,
    timing: Tx20Timing,
    state: Cell<EmulatorState>,
    deadline: Cell<u32>,
    last_frame: Cell<Option<Tx20Frame>>,
    frames_sent: Cell<u32>,
    events: RefCell<Deque<EmulatorEvent, EVENT_QUEUE_LEN>>,
}

impl<'a, Dtr, Txd, Ind> ProtocolEmulator<'a, Dtr, Txd, Ind>
where
    Dtr: InputPin + 'a,
    Txd: OutputPin + 'a,
    Ind: OutputPin + 'a,
{
    pub fn new(
        dtr: Dtr,
        txd: Txd,
        indicator: Ind,
        clock: &'a dyn Clock,
        timing: Tx20Timing,
    ) -> Result<Self, ConfigError> {
        timing.validate()?;
        let emulator = ProtocolEmulator {
            lines: RefCell::new(Lines {
                dtr,
                txd,
                indicator,
            }),
            clock,
            timing,
            state: Cell::new(EmulatorState::Disabled),
            deadline: Cell::new(0),
            last_frame: Cell::new(None),
            frames_sent: Cell::new(0),
            events: RefCell::new(Deque::new()),
        };
        emulator.enter(EmulatorState::Disabled);
        Ok(emulator)
    }

    /// Advance the protocol. A `Sending` call blocks for the whole frame.
    pub fn service<W: WindSource<'a>>(&'a self, wind: &mut W) {
        match self.state.get() {
            EmulatorState::Disabled => {
                if self.dtr_active() {
                    let now = self.clock.micros();
                    self.deadline.set(now.wrapping_add(self.timing.wakeup_us));
                    self.enter(EmulatorState::StartSample);
                    log::debug!("dtr active, waking up");
                }
            }
            EmulatorState::StartSample => {
                if !self.dtr_active() {
                    self.enter(EmulatorState::Disabled);
                    return;
                }
                if !reached(self.clock.micros(), self.deadline.get()) {
                    return;
                }
                if wind.start_sample(self) {
                    self.push_event(EmulatorEvent::StartSample);
                    self.enter(EmulatorState::Sampling);
                }
            }
            EmulatorState::Sampling => {
                if !self.dtr_active() {
                    wind.abort_sample();
                    self.push_event(EmulatorEvent::AbortSample);
                    self.enter(EmulatorState::Disabled);
                    log::debug!("dtr released while sampling");
                }
            }
            EmulatorState::Sending => self.send_frame(wind),
        }
    }

    fn send_frame<W: WindSource<'a>>(&self, wind: &mut W) {
        let mph = wind.wind_mph();
        let direction = wind.wind_direction();
        let frame = Tx20Frame::from_wind(mph, direction);
        let levels = frame.line_levels();

        self.push_event(EmulatorEvent::StartDataFrame);
        let start = self.clock.micros();
        {
            let mut lines = self.lines.borrow_mut();
            let mut deadline = start;
            for &high in levels.iter() {
                let _ = lines.txd.set_state(PinState::from(high));
                deadline = deadline.wrapping_add(self.timing.bit_us);
                while !reached(self.clock.micros(), deadline) {
                    core::hint::spin_loop();
                }
            }
        }
        self.frames_sent.set(self.frames_sent.get().wrapping_add(1));
        self.last_frame.set(Some(frame));
        self.push_event(EmulatorEvent::EndDataFrame(frame));
        self.push_event(EmulatorEvent::EndSample { mph, direction });
        log::info!(
            "tx20 frame: direction {}, speed {} (0.1 m/s)",
            frame.direction(),
            frame.speed()
        );

        if self.dtr_active() {
            self.deadline
                .set(start.wrapping_add(self.timing.min_frame_interval_us));
            self.enter(EmulatorState::StartSample);
        } else {
            self.enter(EmulatorState::Disabled);
        }
    }

    fn enter(&self, next: EmulatorState) {
        self.state.set(next);
        let (txd_high, indicator_on) = match next {
            EmulatorState::Disabled | EmulatorState::StartSample => (true, false),
            EmulatorState::Sampling | EmulatorState::Sending => (false, true),
        };
        let mut lines = self.lines.borrow_mut();
        let _ = lines.txd.set_state(PinState::from(txd_high));
        let _ = lines.indicator.set_state(PinState::from(indicator_on));
    }

    /// DTR is active low. A read error counts as released.
    fn dtr_active(&self) -> bool {
        self.lines.borrow_mut().dtr.is_low().unwrap_or(false)
    }
}

impl<Dtr, Txd, Ind> ProtocolEmulator<'_, Dtr, Txd, Ind> {
    fn push_event(&self, event: EmulatorEvent) {
        let mut events = self.events.borrow_mut();
        if events.is_full() {
            events.pop_front();
        }
        let _ = events.push_back(event);
    }

    /// Oldest undrained event. Drain from the main loop; only the last
    /// [`EVENT_QUEUE_LEN`] are kept.
    pub fn next_event(&self) -> Option<EmulatorEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn state(&self) -> EmulatorState {
        self.state.get()
    }

    pub fn last_frame(&self) -> Option<Tx20Frame> {
        self.last_frame.get()
    }

    pub fn frames_sent(&self) -> u32 {
        self.frames_sent.get()
    }
}

impl<'a, Dtr, Txd, Ind> SampleListener for ProtocolEmulator<'a, Dtr, Txd, Ind>
where
    Dtr: InputPin + 'a,
    Txd: OutputPin + 'a,
    Ind: OutputPin + 'a,
{
    fn sample_complete(&self) {
        if self.state.get() == EmulatorState::Sampling {
            self.enter(EmulatorState::Sending);
        }
    }
}
