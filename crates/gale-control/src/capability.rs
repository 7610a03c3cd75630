//! Narrow capability interfaces between the control core and the outside
//! world. Hardware crates implement these against real peripherals; tests
//! drive the controller with fakes.

use thiserror::Error;

use crate::record::LogRecord;

/// Failures a capability may report. The core never propagates these:
/// missing sensor readings are substituted with zero and actuator faults
/// force the Fault regime.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapabilityError {
    #[error("sensor reading unavailable")]
    Unavailable,

    #[error("actuator rejected the command")]
    ActuatorFault,
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Anemometer probe. Readings are metres per second, non-negative.
pub trait WindSensor {
    fn read_wind_speed_ms(&mut self) -> CapabilityResult<f32>;
}

/// DC bus telemetry (INA-class voltage/current monitor).
pub trait BusSensor {
    /// Bus voltage in volts, non-negative.
    fn read_bus_voltage_v(&mut self) -> CapabilityResult<f32>;

    /// Bus current in amperes. May be negative during regeneration; the
    /// core takes the magnitude.
    fn read_bus_current_a(&mut self) -> CapabilityResult<f32>;
}

/// Rotor speed derived from the tachometer pulse period:
/// rpm = 60e6 / period_us, 0 when the period is zero or stale.
pub trait RotorTach {
    fn read_rotor_rpm(&mut self) -> CapabilityResult<f32>;
}

/// Power-stage actuation. One implementor owns the converter PWM, the
/// dump-load path and the brake relay so the three commands cannot race.
pub trait Actuators {
    /// Converter duty in [0, 1].
    fn set_converter_duty(&mut self, duty: f32) -> CapabilityResult<()>;

    /// Dump load on drives the converter to full duty and releases the
    /// brake.
    fn set_dump_load_active(&mut self, active: bool) -> CapabilityResult<()>;

    /// Engaging the mechanical brake forces converter duty to zero.
    fn set_brake_engaged(&mut self, engaged: bool) -> CapabilityResult<()>;
}

/// Audit-trail sink. Free to batch, drop or persist; the core does not
/// observe the outcome.
pub trait RecordSink {
    fn record(&mut self, record: &LogRecord);
}
