//! Hall-effect rotor tachometer.
//!
//! The edge task is the interrupt plane: it alone writes the two
//! word-sized scalars below. The control loop reads them with single
//! aligned loads, so a torn read cannot occur and a zero period simply
//! means "no rotation".

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_rp::gpio::Input;
use embassy_time::Instant;
use gale_config::{TACH_PULSES_PER_REV, TACH_STALE_MS};
use gale_control::capability::{CapabilityResult, RotorTach};

/// Microsecond timestamp (wrapping) of the most recent pulse edge.
static LAST_PULSE_TIME_US: AtomicU32 = AtomicU32::new(0);

/// Microseconds between the two most recent pulse edges, 0 until two
/// edges have been seen.
static PULSE_PERIOD_US: AtomicU32 = AtomicU32::new(0);

/// Edge-capture task, one falling edge per magnet pass.
#[embassy_executor::task]
pub async fn tachometer_task(mut pin: Input<'static>) {
    loop {
        pin.wait_for_falling_edge().await;
        let now_us = Instant::now().as_micros() as u32;
        let last_us = LAST_PULSE_TIME_US.load(Ordering::Relaxed);
        if last_us != 0 {
            PULSE_PERIOD_US.store(now_us.wrapping_sub(last_us), Ordering::Relaxed);
        }
        LAST_PULSE_TIME_US.store(now_us, Ordering::Relaxed);
    }
}

/// RPM capability over the shared pulse scalars.
pub struct HallTachometer;

impl RotorTach for HallTachometer {
    fn read_rotor_rpm(&mut self) -> CapabilityResult<f32> {
        let period_us = PULSE_PERIOD_US.load(Ordering::Relaxed);
        if period_us == 0 {
            return Ok(0.0);
        }

        // A rotor that stopped between edges never produces the final
        // edge, so an old pulse means standstill, not a slow turn.
        let last_us = LAST_PULSE_TIME_US.load(Ordering::Relaxed);
        let age_us = (Instant::now().as_micros() as u32).wrapping_sub(last_us);
        if age_us > TACH_STALE_MS as u32 * 1_000 {
            return Ok(0.0);
        }

        Ok(60_000_000.0 / (period_us as f32 * TACH_PULSES_PER_REV as f32))
    }
}
