//! Bench check of the reed-switch path without an anemometer.
//!
//! p5 generates one 20 ms low pulse every 225 ms (10 mph). Jumper p5 to A1
//! and the log should read 10 pulses per 2.25 s window.

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
    use tx20_bridge::constants::SAMPLE_RATE_HZ;
    use tx20_bridge::filter::{PulseDetector, PulseTally};
    use tx20_bridge::hal::Clock;
    use tx20_bridge::support::PulseGenerator;
    use tx20_bridge::wind::{InstrumentConfig, WindReading};
    use tx20_bridge_firmware::{enable_adc1_clock, MonotonicClock, PushPull, TeensyAdc, SPEED_CHANNEL};

    const PERIOD_MS: u32 = 225;
    const WIDTH_MS: u32 = 20;

    type Sampler = SampleClock<'static, TeensyAdc>;

    static TIME: StaticCell<MonotonicClock> = StaticCell::new();
    static SAMPLER: StaticCell<Sampler> = StaticCell::new();
    static SPEED: StaticCell<SampleTask<'static, PulseDetector>> = StaticCell::new();

    #[local]
    struct Local {
        pit: hal::pit::Pit<0>,
        sampler: &'static Sampler,
        time: &'static MonotonicClock,
        speed: &'static SampleTask<'static, PulseDetector>,
        period_ms: u32,
        pulse: PulseGenerator<PushPull<pins::t41::P5>>,
    }

    #[shared]
    struct Shared {}

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        rtt_target::rtt_init_log!();

        let board::Resources {
            pit: (mut pit, _, _, _),
            gpt1,
            mut gpio4,
            mut pins,
            ..
        } = board::t41(cx.device);

        let pulse = PulseGenerator::new(PushPull(gpio4.output(pins.p5)), PERIOD_MS, WIDTH_MS)
            .expect("pulse timing");
        hal::iomuxc::adc::prepare::<_, { hal::iomuxc::adc::ADC1 }>(&mut pins.p15);

        let time: &'static MonotonicClock = TIME.init(MonotonicClock::new(gpt1));
        enable_adc1_clock();
        // SAFETY: ADC1 is not handed out by the board.
        let adc1 = unsafe { ral::adc::ADC1::instance() };
        let sampler: &'static Sampler = SAMPLER.init(SampleClock::new(TeensyAdc::new(adc1)));

        let channel = Channel::new(SPEED_CHANNEL).expect("speed channel");
        sampler.initialise(&[channel]);

        let config = InstrumentConfig::default();
        let speed: &'static SampleTask<'static, PulseDetector> = SPEED.init(
            config
                .speed_task(sampler, time, channel)
                .expect("speed task config"),
        );

        pit.set_load_timer_value(board::PERCLK_FREQUENCY / SAMPLE_RATE_HZ);
        pit.set_interrupt_enable(true);
        pit.enable();

        log::info!("pulse bench: {} ms period, {} ms low", PERIOD_MS, WIDTH_MS);

        (
            Shared {},
            Local {
                pit,
                sampler,
                time,
                speed,
                period_ms: config.speed_period_ms,
                pulse,
            },
        )
    }

    #[idle(local = [time, speed, period_ms, pulse])]
    fn idle(cx: idle::Context) -> ! {
        let time = *cx.local.time;
        let speed = *cx.local.speed;
        let pulse = cx.local.pulse;

        speed.start();
        loop {
            pulse.service(time.millis());

            if speed.is_finished() {
                let reading = WindReading {
                    pulse_count: speed.read(|f| f.pulses()),
                    direction_raw: 0,
                };
                speed.stop();
                log::info!(
                    "pulses={} ({} generated since boot), mph={}",
                    reading.pulse_count,
                    pulse.pulses(),
                    reading.speed_mph(*cx.local.period_ms)
                );
                speed.start();
            }
        }
    }

    #[task(binds = PIT, local = [pit, sampler], priority = 2)]
    fn sample_tick(cx: sample_tick::Context) {
        let pit = cx.local.pit;
        while pit.is_elapsed() {
            pit.clear_elapsed();
        }
        cx.local.sampler.tick();
    }
}
