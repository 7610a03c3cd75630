#![no_std]
#![no_main]

//! Firmware for the 500 W helical Gorlov VAWT testbed.
//!
//! Wires the RP2040 peripherals to the capability interfaces and ticks
//! the control pipeline at 1 Hz. Everything stateful lives in one
//! [`TurbineController`] value; the tasks spawned here only move data in
//! and out of the control loop.

use defmt_rtt as _;
use panic_probe as _;

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::spi::{self, Spi};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Instant, Ticker, Timer};

use gale_config::{CONVERTER_PWM_FREQ_HZ, INA226_I2C_FREQ, SD_SPI_FREQ, TurbineConfig, WATCHDOG_TIMEOUT_MS};
use gale_control::regime::Regime;
use gale_hardware::status_led::{LED_PATTERN, pattern_for_regime};
use gale_hardware::{
    Anemometer, HallTachometer, Ina226, PowerStage, SdCsvSink, sd_logger_task, status_led_task,
    tachometer_task,
};
use gale_system::{Capabilities, TurbineController};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("=== VAWT control system starting ===");

    // Status LED on the on-board pin.
    spawner
        .spawn(status_led_task(Output::new(p.PIN_25, Level::Low)))
        .unwrap();

    // Rotor tachometer: one falling edge per magnet pass.
    spawner
        .spawn(tachometer_task(Input::new(p.PIN_22, Pull::Up)))
        .unwrap();

    // Operator fault-clear input, active low.
    let reset_button = Input::new(p.PIN_15, Pull::Up);

    // SD card CSV sink on SPI0.
    let mut spi_config = spi::Config::default();
    spi_config.frequency = SD_SPI_FREQ;
    let spi = Spi::new_blocking(p.SPI0, p.PIN_2, p.PIN_3, p.PIN_0, spi_config);
    let sd_cs = Output::new(p.PIN_1, Level::High);
    spawner.spawn(sd_logger_task(spi, sd_cs)).unwrap();

    // Anemometer on ADC channel 0.
    let adc = Adc::new_blocking(p.ADC, adc::Config::default());
    let wind_channel = Channel::new_pin(p.PIN_26, Pull::None);
    let mut anemometer = Anemometer::new(adc, wind_channel);

    // INA226 bus monitor on I2C0.
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = INA226_I2C_FREQ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let mut bus_sensor = Ina226::new(i2c);
    if let Err(e) = bus_sensor.init() {
        // Not fatal: reads substitute zero until the part responds.
        warn!("INA226 init failed: {}", e);
    }

    let mut tachometer = HallTachometer;

    // Converter PWM at 20 kHz plus the brake relay.
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = (embassy_rp::clocks::clk_sys_freq() / CONVERTER_PWM_FREQ_HZ) as u16 - 1;
    pwm_config.compare_a = 0;
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config.clone());
    let brake_relay = Output::new(p.PIN_17, Level::Low);
    let mut power_stage = PowerStage::new(pwm, pwm_config, brake_relay);

    let mut controller: TurbineController = match TurbineController::new(TurbineConfig::default()) {
        Ok(controller) => controller,
        Err(e) => {
            // Construction invariants are the one fatal error class.
            error!("invalid turbine config: {}", e);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));

    controller.complete_init(Instant::now().as_millis());
    info!("initialization complete, entering STANDBY");

    let mut sink = SdCsvSink;
    let tick_period = Duration::from_millis(controller.config().tick_period_ms);
    let mut ticker = Ticker::every(tick_period);

    loop {
        ticker.next().await;
        watchdog.feed();

        let now_ms = Instant::now().as_millis();

        // Fault is exited only through this external path.
        if controller.regime() == Regime::Fault && reset_button.is_low() {
            info!("fault-clear pressed");
            controller.reset(now_ms);
        }

        let mut caps = Capabilities {
            wind: &mut anemometer,
            bus: &mut bus_sensor,
            tach: &mut tachometer,
            actuators: &mut power_stage,
            sink: Some(&mut sink),
        };
        let sample = controller.tick(now_ms, &mut caps);

        LED_PATTERN.signal(pattern_for_regime(controller.regime()));

        info!(
            "state={} wind={} m/s rpm={} P={} W lambda={} cp={}",
            controller.regime().tag(),
            sample.wind_speed_ms,
            sample.rotor_rpm,
            sample.power_w,
            sample.lambda,
            sample.cp,
        );
    }
}
