#![no_std]

pub mod anemometer;
pub mod ina226;
pub mod power_stage;
pub mod sdlog;
pub mod status_led;
pub mod tacho;

// Re-export commonly used types
pub use anemometer::Anemometer;
pub use ina226::Ina226;
pub use power_stage::PowerStage;
pub use sdlog::{SdCsvSink, sd_logger_task};
pub use status_led::{LedPattern, status_led_task};
pub use tacho::{HallTachometer, tachometer_task};
