//! Canonical CSV audit record.
//!
//! Field order, widths and decimal precisions are part of the persisted
//! interface; downstream analysis scripts parse these rows.

use core::fmt::Write;

use heapless::String;

use crate::metrics::Sample;

/// CSV header written once when a fresh log file is created.
pub const CSV_HEADER: &str =
    "timestamp,state,wind_speed_ms,rotor_rpm,voltage_dc,current_dc,power_w,lambda,cp";

/// One formatted row, newline included.
pub type CsvRow = String<128>;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogRecord {
    pub timestamp_ms: u64,
    pub regime_tag: &'static str,
    pub wind_speed_ms: f32,
    pub rotor_rpm: f32,
    pub bus_voltage_v: f32,
    pub bus_current_a: f32,
    pub power_w: f32,
    pub lambda: f32,
    pub cp: f32,
}

impl LogRecord {
    pub fn from_sample(sample: &Sample, regime_tag: &'static str) -> Self {
        Self {
            timestamp_ms: sample.timestamp_ms,
            regime_tag,
            wind_speed_ms: sample.wind_speed_ms,
            rotor_rpm: sample.rotor_rpm,
            bus_voltage_v: sample.bus_voltage_v,
            bus_current_a: sample.bus_current_a,
            power_w: sample.power_w,
            lambda: sample.lambda,
            cp: sample.cp,
        }
    }

    /// Render the row. Capacity is sized for the full sensor ranges, so
    /// formatting cannot overflow for finite inputs.
    pub fn to_csv_row(&self) -> CsvRow {
        let mut row = CsvRow::new();
        let _ = write!(
            row,
            "{},{},{:.1},{:.0},{:.2},{:.2},{:.1},{:.2},{:.3}\n",
            self.timestamp_ms,
            self.regime_tag,
            self.wind_speed_ms,
            self.rotor_rpm,
            self.bus_voltage_v,
            self.bus_current_a,
            self.power_w,
            self.lambda,
            self.cp,
        );
        row
    }
}
