//! Operating regimes and the transition bookkeeping around them.
//!
//! Per-regime behaviour (tag, entry action, tick handler) is centralized
//! on the variant rather than spread over parallel match ladders; the
//! scheduler in gale-system dispatches actuation through a single match.

use heapless::String;

/// Max length of a transition reason tag.
pub const REASON_MAX: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Regime {
    /// System constructed, init not yet complete. No actuation.
    Idle,
    /// Ready, converter idle, waiting for wind.
    Standby,
    /// Reserved for installations that need spin-up assist.
    Startup,
    /// Hill-climb power tracking.
    Mppt,
    /// At rated power, soft-stall regulation.
    PowerRegulation,
    /// High wind, dump load active.
    Stall,
    /// Latched failure. Exited only by external reset.
    Fault,
}

impl Regime {
    /// Canonical CSV/state tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Regime::Idle => "IDLE",
            Regime::Standby => "STANDBY",
            Regime::Startup => "STARTUP",
            Regime::Mppt => "MPPT",
            Regime::PowerRegulation => "POWER_REG",
            Regime::Stall => "STALL",
            Regime::Fault => "FAULT",
        }
    }

    /// Inverse of [`tag`]; unrecognized tags map to `None` (logged as
    /// `UNKNOWN` by sinks).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "IDLE" => Regime::Idle,
            "STANDBY" => Regime::Standby,
            "STARTUP" => Regime::Startup,
            "MPPT" => Regime::Mppt,
            "POWER_REG" => Regime::PowerRegulation,
            "STALL" => Regime::Stall,
            "FAULT" => Regime::Fault,
            _ => return None,
        })
    }
}

/// Tag emitted for a state no known regime maps to.
pub const UNKNOWN_TAG: &str = "UNKNOWN";

/// Record of the most recent transition. Single-slot: each transition
/// overwrites the previous record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub timestamp_ms: u64,
    pub from: Regime,
    pub to: Regime,
    pub reason: String<REASON_MAX>,
}

pub struct RegimeMachine {
    current: Regime,
    previous: Regime,
    entry_time_ms: u64,
    last_transition: Option<Transition>,
}

impl Default for RegimeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegimeMachine {
    pub const fn new() -> Self {
        Self {
            current: Regime::Idle,
            previous: Regime::Idle,
            entry_time_ms: 0,
            last_transition: None,
        }
    }

    pub fn current(&self) -> Regime {
        self.current
    }

    pub fn previous(&self) -> Regime {
        self.previous
    }

    pub fn time_in_state_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.entry_time_ms)
    }

    pub fn last_transition(&self) -> Option<&Transition> {
        self.last_transition.as_ref()
    }

    /// Move to `to`, recording the transition. Returns false (and does
    /// nothing) when `to` equals the current regime or when the machine
    /// is latched in Fault; Fault is left only through [`clear_fault`].
    pub fn transition(&mut self, now_ms: u64, to: Regime, reason: &str) -> bool {
        if to == self.current {
            return false;
        }
        if self.current == Regime::Fault {
            return false;
        }
        self.apply(now_ms, to, reason);
        true
    }

    /// External reset path out of Fault, back to Standby. No-op in any
    /// other regime.
    pub fn clear_fault(&mut self, now_ms: u64) -> bool {
        if self.current != Regime::Fault {
            return false;
        }
        self.apply(now_ms, Regime::Standby, "external_reset");
        true
    }

    fn apply(&mut self, now_ms: u64, to: Regime, reason: &str) {
        self.previous = self.current;
        self.current = to;
        self.entry_time_ms = now_ms;

        let mut tag: String<REASON_MAX> = String::new();
        // Truncate silently; the reason is a short free-form tag.
        for c in reason.chars() {
            if tag.push(c).is_err() {
                break;
            }
        }
        self.last_transition = Some(Transition {
            timestamp_ms: now_ms,
            from: self.previous,
            to,
            reason: tag,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_idle() {
        let m = RegimeMachine::new();
        assert_eq!(m.current(), Regime::Idle);
        assert_eq!(m.previous(), Regime::Idle);
    }

    #[test]
    fn transition_records_slot_and_entry_time() {
        let mut m = RegimeMachine::new();
        assert!(m.transition(1_000, Regime::Standby, "init_ok"));
        assert_eq!(m.current(), Regime::Standby);
        assert_eq!(m.previous(), Regime::Idle);
        assert_eq!(m.time_in_state_ms(3_500), 2_500);

        let t = m.last_transition().unwrap();
        assert_eq!(t.from, Regime::Idle);
        assert_eq!(t.to, Regime::Standby);
        assert_eq!(t.reason.as_str(), "init_ok");
        assert_eq!(t.timestamp_ms, 1_000);
    }

    #[test]
    fn self_transition_is_refused() {
        let mut m = RegimeMachine::new();
        m.transition(1, Regime::Standby, "init_ok");
        assert!(!m.transition(2, Regime::Standby, "again"));
        // The slot still holds the original record.
        assert_eq!(m.last_transition().unwrap().timestamp_ms, 1);
    }

    #[test]
    fn fault_is_terminal_without_external_reset() {
        let mut m = RegimeMachine::new();
        m.transition(1, Regime::Mppt, "test");
        m.transition(2, Regime::Fault, "safety:overspeed");
        assert!(!m.transition(3, Regime::Standby, "wind<cut_in"));
        assert!(!m.transition(3, Regime::Mppt, "wind>cut_in"));
        assert_eq!(m.current(), Regime::Fault);

        assert!(m.clear_fault(4));
        assert_eq!(m.current(), Regime::Standby);
        assert_eq!(m.last_transition().unwrap().reason.as_str(), "external_reset");
    }

    #[test]
    fn clear_fault_outside_fault_is_a_noop() {
        let mut m = RegimeMachine::new();
        m.transition(1, Regime::Standby, "init_ok");
        assert!(!m.clear_fault(2));
        assert_eq!(m.current(), Regime::Standby);
    }

    #[test]
    fn overlong_reason_is_truncated() {
        let mut m = RegimeMachine::new();
        let long = "x".repeat(100);
        m.transition(1, Regime::Standby, &long);
        assert_eq!(m.last_transition().unwrap().reason.len(), REASON_MAX);
    }

    #[test]
    fn tags_round_trip() {
        for r in [
            Regime::Idle,
            Regime::Standby,
            Regime::Startup,
            Regime::Mppt,
            Regime::PowerRegulation,
            Regime::Stall,
            Regime::Fault,
        ] {
            assert_eq!(Regime::from_tag(r.tag()), Some(r));
        }
        assert_eq!(Regime::from_tag(UNKNOWN_TAG), None);
    }
}
