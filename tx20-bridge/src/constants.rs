// ── Acquisition ──────────────────────────────────────────────────────

/// Sample timer rate in Hz. One ADC conversion completes per tick.
pub const SAMPLE_RATE_HZ: u32 = 4_000;

/// Samples delivered per millisecond at [`SAMPLE_RATE_HZ`].
pub const SAMPLES_PER_MS: u32 = SAMPLE_RATE_HZ / 1_000;

/// Timer period in microseconds.
pub const SAMPLE_PERIOD_US: u32 = 1_000_000 / SAMPLE_RATE_HZ;

/// Conversions discarded after a sink registers, while the input mux settles.
pub const SETTLE_SAMPLES: u8 = 4;

/// Number of multiplexed ADC inputs.
pub const ADC_CHANNELS: u8 = 8;

/// Synthetic sample value delivered for a digital edge event.
pub const EDGE_SAMPLE: u8 = 255;

/// Compile-time capacity of a [`MovingAverage`](crate::filter::MovingAverage).
pub const MOVING_AVERAGE_MAX_WIDTH: usize = 128;

// ── Davis 6410 ───────────────────────────────────────────────────────

/// Speed sampling window. At 2.25 s one reed pulse per window is 1 mph.
pub const SPEED_PERIOD_MS: u32 = 2_250;

/// Miles per hour per reed pulse per second.
pub const MPH_PER_HZ: f32 = 2.25;

/// Vane samples averaged for one direction reading.
pub const DIRECTION_SAMPLES: u16 = 10;

/// Give up on the vane after this long and keep the previous direction.
pub const DIRECTION_TIMEOUT_MS: u32 = 50;

/// Minimum low time of a reed closure.
pub const PULSE_WIDTH_MS: u32 = 4;

/// Minimum spacing between two counted reed closures.
pub const PULSE_DEBOUNCE_MS: u32 = 8;

/// Minimum spacing between two edges on the interrupt-driven speed input.
pub const EDGE_DEBOUNCE_MS: u32 = 10;

/// 8-bit ADC level at or below which the reed input counts as closed.
pub const PULSE_LOW_LEVEL: u8 = 10;

/// Fraction of the pulse window allowed to read high while still asserted.
pub const PULSE_NOISE_FACTOR: f32 = 0.03;

// ── TX20 ─────────────────────────────────────────────────────────────

/// Length of one TX20 bit-time.
pub const TX20_BIT_US: u32 = 1_220;

/// Delay between DTR going active and the first sample request.
pub const TX20_WAKEUP_US: u32 = 1_000_000;

/// Minimum spacing between the starts of two frames.
pub const TX20_MIN_FRAME_INTERVAL_US: u32 = 2_000_000;

/// Bit-times per frame, stop bit included.
pub const TX20_FRAME_BITS: usize = 42;

/// Largest speed value a frame can carry, in 0.1 m/s.
pub const TX20_MAX_SPEED: u16 = 0x0FFF;

// ── Front panel ──────────────────────────────────────────────────────

/// Panel LED flash length for each transmitted frame.
pub const PANEL_FLASH_MS: u32 = 333;
