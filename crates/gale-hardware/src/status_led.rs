//! On-board status LED driven from the operating regime.

use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use gale_control::regime::Regime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum LedPattern {
    Solid,
    SlowBlink,
    FastBlink,
}

/// Latest pattern request from the control loop; the LED task picks it up
/// on its next frame.
pub static LED_PATTERN: Signal<CriticalSectionRawMutex, LedPattern> = Signal::new();

pub fn pattern_for_regime(regime: Regime) -> LedPattern {
    match regime {
        Regime::Mppt | Regime::PowerRegulation => LedPattern::Solid,
        Regime::Idle | Regime::Standby | Regime::Startup => LedPattern::SlowBlink,
        Regime::Stall | Regime::Fault => LedPattern::FastBlink,
    }
}

#[embassy_executor::task]
pub async fn status_led_task(mut led: Output<'static>) {
    let mut pattern = LedPattern::SlowBlink;
    loop {
        if let Some(next) = LED_PATTERN.try_take() {
            pattern = next;
        }
        match pattern {
            LedPattern::Solid => {
                led.set_high();
                Timer::after(Duration::from_millis(100)).await;
            }
            LedPattern::SlowBlink => {
                led.toggle();
                Timer::after(Duration::from_millis(500)).await;
            }
            LedPattern::FastBlink => {
                led.toggle();
                Timer::after(Duration::from_millis(100)).await;
            }
        }
    }
}
