//! Davis 6410 ==> TX20 bridge.
//!
//! The PIT fires at the sample rate and runs the sample clock; everything
//! else happens in `idle`, which services the wind instrument, the TX20
//! emulator and the panel LED in a tight loop.
//!
//! ```text
//!   PIT (prio 2) ──► SampleClock::tick ──► speed / vane task
//!   idle ──► WindInstrument::service ──► ProtocolEmulator::service ──► TXD
//!        └─► drain events: panel flash, log reading
//! ```
//!
//! Logs go out over RTT.

#![no_std]
#![no_main]

use teensy4_panic as _;

#[rtic::app(device = teensy4_bsp, peripherals = true, dispatchers = [KPP])]
mod app {
    use bsp::board;
    use bsp::hal;
    use bsp::pins;
    use bsp::ral;
    use teensy4_bsp as bsp;

    use static_cell::StaticCell;

    use tx20_bridge::acquisition::{Channel, SampleClock, SampleTask};
    use tx20_bridge::constants::{PANEL_FLASH_MS, SAMPLE_RATE_HZ};
    use tx20_bridge::filter::{Average, PulseDetector};
    use tx20_bridge::support::Led;
    use tx20_bridge::tx20::{EmulatorEvent, ProtocolEmulator, Tx20Timing};
    use tx20_bridge::wind::{Compass, InstrumentConfig, WindInstrument};
    use tx20_bridge_firmware::{
        enable_adc1_clock, MonotonicClock, PushPull, Sense, TeensyAdc, SPEED_CHANNEL,
        VANE_CHANNEL,
    };

    type Sampler = SampleClock<'static, TeensyAdc>;
    type Emulator = ProtocolEmulator<
        'static,
        Sense<pins::t41::P3>,
        PushPull<pins::t41::P4>,
        PushPull<pins::t41::P13>,
    >;

    static TIME: StaticCell<MonotonicClock> = StaticCell::new();
    static SAMPLER: StaticCell<Sampler> = StaticCell::new();
    static SPEED: StaticCell<SampleTask<'static, PulseDetector>> = StaticCell::new();
    static VANE: StaticCell<SampleTask<'static, Average>> = StaticCell::new();

    // ── RTIC resources ───────────────────────────────────────────────

    #[local]
    struct Local {
        pit: hal::pit::Pit<0>,
        tick_sampler: &'static Sampler,
        sampler: &'static Sampler,
        speed: &'static SampleTask<'static, PulseDetector>,
        vane: &'static SampleTask<'static, Average>,
        config: InstrumentConfig,
        emulator: Emulator,
        panel: Led<'static, PushPull<pins::t41::P9>>,
    }

    #[shared]
    struct Shared {}

    // ── Init ─────────────────────────────────────────────────────────

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        rtt_target::rtt_init_log!();

        let board::Resources {
            pit: (mut pit, _, _, _),
            gpt1,
            mut gpio2,
            mut gpio4,
            mut pins,
            ..
        } = board::t41(cx.device);

        log::info!("Davis 6410 ==> TX20 bridge v{}", env!("CARGO_PKG_VERSION"));

        // ── Lines ───────────────────────────────────────────────────
        let pull_up = hal::iomuxc::Config::zero()
            .set_pull_keeper(Some(hal::iomuxc::PullKeeper::Pullup100k));
        hal::iomuxc::configure(&mut pins.p3, pull_up);
        let dtr = Sense(gpio4.input(pins.p3));
        let txd = PushPull(gpio4.output(pins.p4));
        let panel = PushPull(gpio2.output(pins.p9));
        let indicator = PushPull(board::led(&mut gpio2, pins.p13));

        hal::iomuxc::adc::prepare::<_, { hal::iomuxc::adc::ADC1 }>(&mut pins.p14);
        hal::iomuxc::adc::prepare::<_, { hal::iomuxc::adc::ADC1 }>(&mut pins.p15);

        // ── Time base and sampler ───────────────────────────────────
        let time: &'static MonotonicClock = TIME.init(MonotonicClock::new(gpt1));

        enable_adc1_clock();
        // SAFETY: ADC1 is not handed out by the board and is owned by the
        // sampler from here on.
        let adc1 = unsafe { ral::adc::ADC1::instance() };
        let sampler: &'static Sampler = SAMPLER.init(SampleClock::new(TeensyAdc::new(adc1)));

        let vane_channel = Channel::new(VANE_CHANNEL).expect("vane channel");
        let speed_channel = Channel::new(SPEED_CHANNEL).expect("speed channel");
        sampler.initialise(&[vane_channel, speed_channel]);

        // ── Sampling tasks ──────────────────────────────────────────
        let config = InstrumentConfig::default();
        let speed: &'static SampleTask<'static, PulseDetector> = SPEED.init(
            config
                .speed_task(sampler, time, speed_channel)
                .expect("speed task config"),
        );
        let vane: &'static SampleTask<'static, Average> = VANE.init(
            config
                .direction_task(sampler, time, vane_channel)
                .expect("vane task config"),
        );

        // ── Protocol side ───────────────────────────────────────────
        let emulator = ProtocolEmulator::new(dtr, txd, indicator, time, Tx20Timing::default())
            .expect("tx20 timing");
        let panel = Led::new(panel, time);

        // ── Sample timer ────────────────────────────────────────────
        pit.set_load_timer_value(board::PERCLK_FREQUENCY / SAMPLE_RATE_HZ);
        pit.set_interrupt_enable(true);
        pit.enable();

        (
            Shared {},
            Local {
                pit,
                tick_sampler: sampler,
                sampler,
                speed,
                vane,
                config,
                emulator,
                panel,
            },
        )
    }

    // ── Main loop ────────────────────────────────────────────────────

    #[idle(local = [sampler, speed, vane, config, emulator, panel])]
    fn idle(cx: idle::Context) -> ! {
        let emulator: &'static Emulator = cx.local.emulator;
        let panel = cx.local.panel;

        // The instrument holds the emulator as its completion listener, so
        // it lives on this stack rather than in a resource.
        let mut wind = WindInstrument::new(*cx.local.speed, *cx.local.vane, cx.local.config);
        wind.initialise();

        let sampler: &'static Sampler = *cx.local.sampler;
        let mut stale_seen = 0;

        loop {
            wind.service();
            emulator.service(&mut wind);
            panel.service();

            while let Some(event) = emulator.next_event() {
                match event {
                    EmulatorEvent::StartDataFrame => panel.flash(PANEL_FLASH_MS),
                    EmulatorEvent::EndSample { mph, direction } => log::info!(
                        "pulses={}, mph={}, direction={}",
                        wind.pulses(),
                        mph,
                        Compass::from_index(direction)
                    ),
                    EmulatorEvent::AbortSample => log::info!("sample aborted"),
                    _ => {}
                }
            }

            let stats = sampler.stats();
            if stats.stale_ticks != stale_seen {
                log::warn!(
                    "{} stale ADC ticks of {}",
                    stats.stale_ticks.wrapping_sub(stale_seen),
                    stats.ticks
                );
                stale_seen = stats.stale_ticks;
            }
        }
    }

    // ── Sample timer ISR ─────────────────────────────────────────────

    #[task(binds = PIT, local = [pit, tick_sampler], priority = 2)]
    fn sample_tick(cx: sample_tick::Context) {
        let pit = cx.local.pit;
        while pit.is_elapsed() {
            pit.clear_elapsed();
        }
        cx.local.tick_sampler.tick();
    }
}
