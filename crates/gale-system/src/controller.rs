//! The periodic control pipeline.
//!
//! One `TurbineController` value owns all controller state and is ticked
//! at the configured period by the firmware. Sensors, actuators and the
//! log sink are borrowed per tick, never owned, so tests can drive the
//! whole pipeline with fakes.
//!
//! Tick order is fixed: acquire sample, evaluate safety, evaluate regime
//! transitions, actuate for the resulting regime, emit the log record.
//! All runtime failures are absorbed here: missing sensors read as zero,
//! actuator faults force the Fault regime, and the sink is fire-and-forget.

use gale_config::{
    ConfigError, MIN_OPERATIONAL_RPM, POWER_REG_ENTER_FRACTION, POWER_REG_EXIT_FRACTION,
    TurbineConfig, WIND_WINDOW_LEN,
};
use gale_control::capability::{Actuators, BusSensor, CapabilityResult, RecordSink, RotorTach, WindSensor};
use gale_control::metrics::Sample;
use gale_control::mppt::MpptTracker;
use gale_control::record::LogRecord;
use gale_control::regime::{Regime, RegimeMachine, Transition};
use gale_control::regulator::SoftStallRegulator;
use gale_control::safety::SafetyMonitor;

use crate::fmt::{info, warn};

/// Borrowed collaborators for one tick.
pub struct Capabilities<'a> {
    pub wind: &'a mut dyn WindSensor,
    pub bus: &'a mut dyn BusSensor,
    pub tach: &'a mut dyn RotorTach,
    pub actuators: &'a mut dyn Actuators,
    /// Absent or failing sinks never stall the control path.
    pub sink: Option<&'a mut dyn RecordSink>,
}

pub struct TurbineController<const N: usize = WIND_WINDOW_LEN> {
    config: TurbineConfig,
    mppt: MpptTracker<N>,
    regulator: SoftStallRegulator,
    safety: SafetyMonitor,
    machine: RegimeMachine,
}

impl<const N: usize> TurbineController<N> {
    /// Validates the config; a bad config refuses to construct.
    pub fn new(config: TurbineConfig) -> Result<Self, ConfigError> {
        let config = config.validated()?;
        let regulator = SoftStallRegulator::new(config.rated_power_w);
        let safety = SafetyMonitor::new(
            config.overspeed_rpm,
            config.overvoltage_v,
            config.overcurrent_a,
        );
        Ok(Self {
            config,
            mppt: MpptTracker::new(),
            regulator,
            safety,
            machine: RegimeMachine::new(),
        })
    }

    /// Signal successful initialization: Idle -> Standby.
    pub fn complete_init(&mut self, now_ms: u64) {
        if self.machine.current() == Regime::Idle {
            self.machine.transition(now_ms, Regime::Standby, "init_ok");
            info!("controller: init complete, entering STANDBY");
        }
    }

    /// Signal failed initialization: Idle -> Fault.
    pub fn init_failed(&mut self, now_ms: u64, reason: &str) {
        if self.machine.current() == Regime::Idle {
            self.machine.transition(now_ms, Regime::Fault, reason);
            self.regulator.reset();
        }
    }

    /// Request spin-up assist. Only honoured from Standby; the Startup
    /// regime exits to MPPT once the rotor passes minimum operating speed.
    pub fn begin_startup(&mut self, now_ms: u64) -> bool {
        if self.machine.current() != Regime::Standby {
            return false;
        }
        self.machine.transition(now_ms, Regime::Startup, "spinup_assist")
    }

    /// External fault-clear and general controller reset. The only path
    /// out of Fault.
    pub fn reset(&mut self, now_ms: u64) {
        self.safety.reset();
        self.regulator.reset();
        self.mppt.reset();
        if self.machine.clear_fault(now_ms) {
            info!("controller: fault cleared, back to STANDBY");
        }
    }

    /// Run one tick of the pipeline. Never fails; callers inspect the
    /// regime and safety flags instead.
    pub fn tick(&mut self, now_ms: u64, caps: &mut Capabilities<'_>) -> Sample {
        // Acquire. Unavailable sensors substitute zero; current is taken
        // as magnitude (regen shows negative on the shunt).
        let wind = caps.wind.read_wind_speed_ms().unwrap_or(0.0);
        let rpm = caps.tach.read_rotor_rpm().unwrap_or(0.0);
        let voltage = caps.bus.read_bus_voltage_v().unwrap_or(0.0);
        let current = caps
            .bus
            .read_bus_current_a()
            .map(|i| i.abs())
            .unwrap_or(0.0);

        let sample = Sample::derive(now_ms, wind, rpm, voltage, current, &self.config);

        // Safety runs on substituted values too. A trip forces Fault in
        // the same tick; the Fault handler below engages the brake.
        let safe = self.safety.check(now_ms, rpm, voltage, current);
        if !safe && self.machine.current() != Regime::Fault {
            let reason = self.safety.trip_reason().unwrap_or("safety");
            self.enter_fault(now_ms, reason);
        }

        if self.machine.current() != Regime::Fault {
            self.evaluate_transitions(now_ms, &sample, safe);
        }

        if self.actuate(caps, &sample).is_err() {
            if self.machine.current() != Regime::Fault {
                self.enter_fault(now_ms, "actuator_fail");
                // Best effort: try to reach the braked safe state anyway.
                let _ = self.actuate(caps, &sample);
            } else {
                warn!("controller: actuator fault while already in FAULT");
            }
        }

        if let Some(sink) = &mut caps.sink {
            sink.record(&LogRecord::from_sample(
                &sample,
                self.machine.current().tag(),
            ));
        }

        sample
    }

    fn enter_fault(&mut self, now_ms: u64, reason: &str) {
        let from = self.machine.current();
        if self.machine.transition(now_ms, Regime::Fault, reason) {
            // Integrator must not carry a stale operating point across a
            // fault; safety flags stay latched.
            self.regulator.reset();
            warn!("controller: {} -> FAULT ({})", from.tag(), reason);
        }
    }

    /// Decide the next regime from the current sample. Conditions are
    /// ordered so that when several fire at once the higher-priority
    /// regime wins: Fault (handled upstream) > Stall > PowerRegulation >
    /// MPPT > Standby.
    fn evaluate_transitions(&mut self, now_ms: u64, sample: &Sample, safe: bool) {
        let cfg = &self.config;
        let power = sample.power_w;
        let wind = sample.wind_speed_ms;
        let rpm = sample.rotor_rpm;

        let target: Option<(Regime, &'static str)> = match self.machine.current() {
            Regime::Idle => None, // waits for the init-complete signal
            Regime::Standby => {
                (wind > cfg.cut_in_wind_ms && safe).then_some((Regime::Mppt, "wind>cut_in"))
            }
            Regime::Startup => {
                (rpm > MIN_OPERATIONAL_RPM).then_some((Regime::Mppt, "rpm>min_operational"))
            }
            Regime::Mppt => {
                if wind > cfg.stall_wind_ms {
                    Some((Regime::Stall, "wind>stall"))
                } else if power > cfg.rated_power_w * POWER_REG_ENTER_FRACTION {
                    Some((Regime::PowerRegulation, "power>0.95rated"))
                } else if wind < cfg.cut_in_wind_ms {
                    Some((Regime::Standby, "wind<cut_in"))
                } else {
                    None
                }
            }
            Regime::PowerRegulation => {
                if wind > cfg.stall_wind_ms {
                    Some((Regime::Stall, "wind>stall"))
                } else if power < cfg.rated_power_w * POWER_REG_EXIT_FRACTION {
                    Some((Regime::Mppt, "power<0.80rated"))
                } else {
                    None
                }
            }
            Regime::Stall => (rpm < cfg.rated_rpm).then_some((Regime::Standby, "rpm<rated")),
            Regime::Fault => None,
        };

        if let Some((to, reason)) = target {
            let from = self.machine.current();
            if self.machine.transition(now_ms, to, reason) {
                // Entry hooks. PowerRegulation deliberately keeps its
                // integrator across re-entries.
                if to == Regime::Mppt && from != Regime::Mppt {
                    self.mppt.reset();
                }
                info!("regime: {} -> {} ({})", from.tag(), to.tag(), reason);
            }
        }
    }

    /// Issue this tick's actuator sequence for the current regime. Each
    /// regime asserts its complete actuator state so a regime change never
    /// leaves a stale command behind.
    fn actuate(&mut self, caps: &mut Capabilities<'_>, sample: &Sample) -> CapabilityResult<()> {
        match self.machine.current() {
            // No actuation before init completes.
            Regime::Idle => Ok(()),
            Regime::Standby | Regime::Startup => {
                caps.actuators.set_dump_load_active(false)?;
                caps.actuators.set_brake_engaged(false)?;
                caps.actuators.set_converter_duty(0.0)
            }
            Regime::Mppt => {
                let duty = self.mppt.update(sample.power_w, sample.wind_speed_ms);
                caps.actuators.set_dump_load_active(false)?;
                caps.actuators.set_brake_engaged(false)?;
                caps.actuators.set_converter_duty(duty)
            }
            Regime::PowerRegulation => {
                let duty = self.regulator.update(sample.power_w, sample.rotor_rpm);
                caps.actuators.set_dump_load_active(false)?;
                caps.actuators.set_brake_engaged(false)?;
                caps.actuators.set_converter_duty(duty)
            }
            Regime::Stall => {
                caps.actuators.set_brake_engaged(false)?;
                caps.actuators.set_dump_load_active(true)
            }
            // Brake first: it must land even if a later write fails.
            Regime::Fault => {
                caps.actuators.set_brake_engaged(true)?;
                caps.actuators.set_dump_load_active(false)?;
                caps.actuators.set_converter_duty(0.0)
            }
        }
    }

    pub fn regime(&self) -> Regime {
        self.machine.current()
    }

    pub fn safety(&self) -> &SafetyMonitor {
        &self.safety
    }

    pub fn last_transition(&self) -> Option<&Transition> {
        self.machine.last_transition()
    }

    pub fn time_in_state_ms(&self, now_ms: u64) -> u64 {
        self.machine.time_in_state_ms(now_ms)
    }

    pub fn turbulence_intensity(&self) -> f32 {
        self.mppt.turbulence_intensity()
    }

    pub fn config(&self) -> &TurbineConfig {
        &self.config
    }
}
