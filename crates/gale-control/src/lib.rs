#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

pub mod capability;
pub mod metrics;
pub mod mppt;
pub mod record;
pub mod regime;
pub mod regulator;
pub mod safety;
pub mod wind;

// Re-export commonly used types
pub use capability::{Actuators, BusSensor, CapabilityError, RecordSink, RotorTach, WindSensor};
pub use metrics::Sample;
pub use mppt::MpptTracker;
pub use record::LogRecord;
pub use regime::{Regime, RegimeMachine, Transition};
pub use regulator::SoftStallRegulator;
pub use safety::SafetyMonitor;
pub use wind::WindWindow;
