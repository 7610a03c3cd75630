//! Turbulence-adaptive hill-climb maximum-power-point tracker.
//!
//! A plain hill climber perturbs the converter duty and keeps or reverses
//! direction based on the observed power change. In steady wind a large
//! step converges quickly to the peak of the lambda-Cp curve; in gusts the
//! step must shrink so the climber does not chase measurement noise and
//! settle away from the true peak. The step is therefore scaled down by a
//! running estimate of wind-speed standard deviation.

use gale_config::{
    DUTY_INITIAL, DUTY_MAX, DUTY_MIN, MPPT_BASE_STEP, MPPT_MIN_STEP, TURBULENCE_GAIN,
    WIND_WINDOW_LEN,
};

use crate::fmt::debug;
use crate::wind::WindWindow;

pub struct MpptTracker<const N: usize = WIND_WINDOW_LEN> {
    duty_cycle: f32,
    last_power_w: f32,
    direction: i8,
    window: WindWindow<N>,
}

impl<const N: usize> Default for MpptTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MpptTracker<N> {
    pub const fn new() -> Self {
        Self {
            duty_cycle: DUTY_INITIAL,
            last_power_w: 0.0,
            direction: 1,
            window: WindWindow::new(),
        }
    }

    /// One hill-climb iteration. Returns the new duty, always within
    /// [DUTY_MIN, DUTY_MAX].
    pub fn update(&mut self, power_w: f32, wind_ms: f32) -> f32 {
        self.window.push(wind_ms);

        let step = self.adaptive_step();

        // Power rose: keep climbing the same way. Power fell: reverse.
        if power_w <= self.last_power_w {
            self.direction = -self.direction;
        }

        self.duty_cycle =
            (self.duty_cycle + f32::from(self.direction) * step).clamp(DUTY_MIN, DUTY_MAX);
        self.last_power_w = power_w;

        debug!(
            "mppt: P={} step={} dir={} duty={}",
            power_w, step, self.direction, self.duty_cycle
        );

        self.duty_cycle
    }

    /// Step shrinks as sigma grows: base / (1 + k*sigma), floored at
    /// MPPT_MIN_STEP. Until the window has filled once the estimate is
    /// meaningless and the base step is used as-is.
    fn adaptive_step(&self) -> f32 {
        if !self.window.is_full() {
            return MPPT_BASE_STEP;
        }
        let sigma = self.window.std_dev();
        let step = MPPT_BASE_STEP / (1.0 + TURBULENCE_GAIN * sigma);
        step.max(MPPT_MIN_STEP)
    }

    pub fn duty_cycle(&self) -> f32 {
        self.duty_cycle
    }

    /// Gustiness diagnostic, sigma/mu over the window.
    pub fn turbulence_intensity(&self) -> f32 {
        self.window.turbulence_intensity()
    }

    /// Back to the initial search state. Invoked on entry to the MPPT
    /// regime from any other regime and on fault clear.
    pub fn reset(&mut self) {
        self.duty_cycle = DUTY_INITIAL;
        self.last_power_w = 0.0;
        self.direction = 1;
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_tracker(wind: impl Fn(usize) -> f32) -> MpptTracker<100> {
        let mut t: MpptTracker<100> = MpptTracker::new();
        for i in 0..100 {
            t.update(100.0 + i as f32, wind(i));
        }
        t
    }

    #[test]
    fn duty_stays_within_limits() {
        let mut t: MpptTracker<10> = MpptTracker::new();
        // Monotonically rising power pushes the duty hard one way.
        for i in 0..200 {
            let duty = t.update(i as f32, 5.0);
            assert!((0.1..=0.9).contains(&duty));
        }
        // Falling power oscillates the direction; limits must still hold.
        for i in 0..200 {
            let duty = t.update(200.0 - i as f32, 5.0);
            assert!((0.1..=0.9).contains(&duty));
        }
    }

    #[test]
    fn first_update_steps_up_by_base() {
        let mut t: MpptTracker<100> = MpptTracker::new();
        // Any positive power beats the initial last_power of zero.
        let duty = t.update(96.0, 5.0);
        assert!((duty - 0.32).abs() < 1e-6);
    }

    #[test]
    fn constant_wind_keeps_base_step() {
        // sigma = 0 over a full window: the adaptive step must equal the
        // base step exactly.
        let mut t = filled_tracker(|_| 7.0);
        t.update(0.0, 7.0); // power collapse flips direction off the clamp
        let before = t.duty_cycle();
        let after = t.update(0.0, 7.0);
        let step = (after - before).abs();
        assert!((step - MPPT_BASE_STEP).abs() < 1e-6);
    }

    #[test]
    fn alternating_wind_halves_the_step() {
        // delta = 2 => sigma = 2 => step = 0.02 / (1 + 0.5*2) = 0.01
        let mut t = filled_tracker(|i| if i % 2 == 0 { 6.0 } else { 10.0 });
        // Force a known direction flip so the step magnitude is observable.
        t.update(0.0, 6.0); // power collapse, direction reverses
        let before = t.duty_cycle();
        let after = t.update(0.0, 10.0); // collapse again, reverses again
        let step = (after - before).abs();
        assert!((step - 0.01).abs() < 1e-4);
    }

    #[test]
    fn step_never_drops_below_floor() {
        // Extreme gusts: sigma = 10 would give 0.02/6 = 0.0033, floored.
        let mut t = filled_tracker(|i| if i % 2 == 0 { 2.0 } else { 22.0 });
        t.update(0.0, 2.0);
        let before = t.duty_cycle();
        let after = t.update(0.0, 22.0);
        assert!(((after - before).abs() - MPPT_MIN_STEP).abs() < 1e-5);
    }

    #[test]
    fn falling_power_reverses_direction() {
        let mut t: MpptTracker<10> = MpptTracker::new();
        t.update(100.0, 5.0); // up to 0.32
        let duty = t.update(50.0, 5.0); // power fell: climb back down
        assert!((duty - 0.30).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_initial_search_state() {
        let mut t: MpptTracker<10> = MpptTracker::new();
        for i in 0..50 {
            t.update(i as f32 * 3.0, 9.0);
        }
        t.reset();
        assert!((t.duty_cycle() - 0.3).abs() < 1e-6);
        assert_eq!(t.turbulence_intensity(), 0.0);
        // Direction is +1 again: a rising first sample steps upward.
        let duty = t.update(10.0, 5.0);
        assert!(duty > 0.3);
    }
}
