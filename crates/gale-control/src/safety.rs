//! Threshold supervision with latched trip flags.
//!
//! The monitor only observes and latches; deciding what a trip means for
//! the operating regime is the scheduler's job.

use crate::fmt::warn;

/// Latched protection flags. Once a flag trips it stays set until an
/// explicit `reset`, regardless of later in-range readings.
pub struct SafetyMonitor {
    overspeed_rpm: f32,
    overvoltage_v: f32,
    overcurrent_a: f32,

    overspeed: bool,
    overvoltage: bool,
    overcurrent: bool,

    last_check_ms: u64,
}

impl SafetyMonitor {
    pub const fn new(overspeed_rpm: f32, overvoltage_v: f32, overcurrent_a: f32) -> Self {
        Self {
            overspeed_rpm,
            overvoltage_v,
            overcurrent_a,
            overspeed: false,
            overvoltage: false,
            overcurrent: false,
            last_check_ms: 0,
        }
    }

    /// Evaluate all three thresholds (strict `>`), latching any violation.
    /// Returns true when no flag is latched.
    pub fn check(&mut self, now_ms: u64, rpm: f32, voltage_v: f32, current_a: f32) -> bool {
        self.last_check_ms = now_ms;

        if rpm > self.overspeed_rpm && !self.overspeed {
            warn!("safety: overspeed {} RPM (limit {})", rpm, self.overspeed_rpm);
            self.overspeed = true;
        }
        if voltage_v > self.overvoltage_v && !self.overvoltage {
            warn!("safety: overvoltage {} V (limit {})", voltage_v, self.overvoltage_v);
            self.overvoltage = true;
        }
        if current_a > self.overcurrent_a && !self.overcurrent {
            warn!("safety: overcurrent {} A (limit {})", current_a, self.overcurrent_a);
            self.overcurrent = true;
        }

        !self.any_tripped()
    }

    pub fn is_overspeed(&self) -> bool {
        self.overspeed
    }

    pub fn is_overvoltage(&self) -> bool {
        self.overvoltage
    }

    pub fn is_overcurrent(&self) -> bool {
        self.overcurrent
    }

    pub fn any_tripped(&self) -> bool {
        self.overspeed || self.overvoltage || self.overcurrent
    }

    pub fn last_check_ms(&self) -> u64 {
        self.last_check_ms
    }

    /// Transition-reason tag for the highest-priority latched flag.
    pub fn trip_reason(&self) -> Option<&'static str> {
        if self.overspeed {
            Some("safety:overspeed")
        } else if self.overvoltage {
            Some("safety:overvoltage")
        } else if self.overcurrent {
            Some("safety:overcurrent")
        } else {
            None
        }
    }

    /// Clear all flags. Only an explicit external reset may do this.
    pub fn reset(&mut self) {
        self.overspeed = false;
        self.overvoltage = false;
        self.overcurrent = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> SafetyMonitor {
        SafetyMonitor::new(250.0, 60.0, 30.0)
    }

    #[test]
    fn in_range_values_keep_all_flags_clear() {
        let mut m = monitor();
        assert!(m.check(1, 180.0, 48.0, 8.0));
        assert!(!m.any_tripped());
        assert_eq!(m.trip_reason(), None);
    }

    #[test]
    fn thresholds_are_strict() {
        let mut m = monitor();
        // Exactly at the limit is still in range.
        assert!(m.check(1, 250.0, 60.0, 30.0));
        assert!(!m.check(2, 250.1, 60.0, 30.0));
        assert!(m.is_overspeed());
    }

    #[test]
    fn flags_stay_latched_after_recovery() {
        let mut m = monitor();
        assert!(!m.check(1, 260.0, 48.0, 8.0));
        // Reading back in range does not clear the latch.
        assert!(!m.check(2, 100.0, 48.0, 8.0));
        assert!(m.is_overspeed());
        assert_eq!(m.trip_reason(), Some("safety:overspeed"));
    }

    #[test]
    fn reset_then_safe_check_leaves_flags_clear() {
        let mut m = monitor();
        m.check(1, 260.0, 70.0, 40.0);
        assert!(m.any_tripped());
        m.reset();
        assert!(m.check(2, 180.0, 48.0, 8.0));
        assert!(!m.any_tripped());
    }

    #[test]
    fn trip_reason_prefers_overspeed() {
        let mut m = monitor();
        m.check(1, 300.0, 70.0, 40.0);
        assert_eq!(m.trip_reason(), Some("safety:overspeed"));
    }

    #[test]
    fn check_records_timestamp() {
        let mut m = monitor();
        m.check(1_234, 0.0, 0.0, 0.0);
        assert_eq!(m.last_check_ms(), 1_234);
    }
}
