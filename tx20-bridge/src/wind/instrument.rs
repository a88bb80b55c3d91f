//! Davis 6410 sampling sequencer.
//!
//! One reading is a speed window followed by a short vane average:
//!
//! ```text
//!  Idle ─start_sample─► NewSample ─► SamplingSpeed ─► SamplingDirection ─► SendFrame
//!   ▲                                                                          │
//!   └──────────────────────── listener.sample_complete() ◄─────────────────────┘
//! ```
//!
//! Each [`service`](WindInstrument::service) call makes at most one
//! transition. The two tasks are borrowed, not owned, because the sample
//! source keeps references to them while they are registered.

use super::{InstrumentConfig, SampleListener, WindReading, WindSource};
use crate::acquisition::SampleTask;
use crate::filter::{Average, Filter, PulseTally};

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentState {
    /// No reading requested.
    Idle,
    /// Reading requested, speed task not yet started.
    NewSample,
    /// Counting reed pulses for the speed window.
    SamplingSpeed,
    /// Averaging the vane.
    SamplingDirection,
    /// Reading complete, listener about to be told.
    SendFrame,
}

pub struct WindInstrument<'a, S> {
    speed: &'a SampleTask<'a, S>,
    direction: &'a SampleTask<'a, Average>,
    speed_period_ms: u32,
    state: InstrumentState,
    listener: Option<&'a dyn SampleListener>,
    reading: WindReading,
    initialised: bool,
    completed: u32,
}

impl<'a, S: Filter + PulseTally + Send + 'a> WindInstrument<'a, S> {
    pub fn new(
        speed: &'a SampleTask<'a, S>,
        direction: &'a SampleTask<'a, Average>,
        config: &InstrumentConfig,
    ) -> Self {
        WindInstrument {
            speed,
            direction,
            speed_period_ms: config.speed_period_ms,
            state: InstrumentState::Idle,
            listener: None,
            reading: WindReading::default(),
            initialised: false,
            completed: 0,
        }
    }

    /// Arm the instrument. Readings are refused until this is called.
    pub fn initialise(&mut self) {
        self.speed.stop();
        self.direction.stop();
        self.state = InstrumentState::Idle;
        self.listener = None;
        self.initialised = true;
        log::info!(
            "davis 6410 ready: speed ch {}, vane ch {}, window {} ms",
            self.speed.channel().index(),
            self.direction.channel().index(),
            self.speed_period_ms
        );
    }

    /// Advance the sequencer by at most one step. Main loop only.
    pub fn service(&mut self) {
        match self.state {
            InstrumentState::Idle => {}
            InstrumentState::NewSample => {
                let speed = self.speed;
                speed.start();
                self.state = InstrumentState::SamplingSpeed;
                log::debug!("sampling speed");
            }
            InstrumentState::SamplingSpeed => {
                if !self.speed.is_finished() {
                    return;
                }
                self.reading.pulse_count = self.speed.read(|f| f.pulses());
                self.speed.stop();
                let direction = self.direction;
                direction.start();
                self.state = InstrumentState::SamplingDirection;
                log::debug!("{} pulses, sampling direction", self.reading.pulse_count);
            }
            InstrumentState::SamplingDirection => {
                if !self.direction.is_finished() {
                    return;
                }
                let (count, value) = self
                    .direction
                    .read(|avg| (avg.count(), if avg.count() > 0 { avg.value() } else { 0 }));
                self.direction.stop();
                if count > 0 {
                    // 8-bit ADC reading to the vane's 10-bit scale.
                    self.reading.direction_raw = (value as u16) << 2;
                } else {
                    log::warn!("no vane samples before timeout, keeping last direction");
                }
                self.state = InstrumentState::SendFrame;
            }
            InstrumentState::SendFrame => {
                self.state = InstrumentState::Idle;
                self.completed = self.completed.wrapping_add(1);
                log::info!(
                    "wind {} mph from {} ({} pulses, vane {})",
                    self.wind_mph(),
                    self.reading.compass(),
                    self.reading.pulse_count,
                    self.reading.direction_raw
                );
                if let Some(listener) = self.listener.take() {
                    listener.sample_complete();
                }
            }
        }
    }

    pub fn state(&self) -> InstrumentState {
        self.state
    }

    /// Last completed reading.
    pub fn reading(&self) -> WindReading {
        self.reading
    }

    pub fn pulses(&self) -> u8 {
        self.reading.pulse_count
    }

    /// Readings completed since construction.
    pub fn completed(&self) -> u32 {
        self.completed
    }
}

impl<'a, S: Filter + PulseTally + Send + 'a> WindSource<'a> for WindInstrument<'a, S> {
    fn start_sample(&mut self, listener: &'a dyn SampleListener) -> bool {
        if !self.initialised || self.state != InstrumentState::Idle {
            return false;
        }
        self.listener = Some(listener);
        self.state = InstrumentState::NewSample;
        true
    }

    fn abort_sample(&mut self) {
        if self.state == InstrumentState::Idle {
            return;
        }
        self.speed.stop();
        self.direction.stop();
        self.listener = None;
        self.state = InstrumentState::Idle;
        log::debug!("sample aborted");
    }

    fn wind_mph(&self) -> f32 {
        self.reading.speed_mph(self.speed_period_ms)
    }

    fn wind_direction(&self) -> u8 {
        self.reading.direction()
    }
}
