//! Analog anemometer on the RP2040 ADC.
//!
//! The transducer outputs 0-3.3 V for 0-25 m/s; conversion is a straight
//! line through the ADC full scale.

use embassy_rp::adc::{Adc, Blocking, Channel};
use gale_config::{ADC_FULL_SCALE, ANEMOMETER_FULL_SCALE_MS};
use gale_control::capability::{CapabilityError, CapabilityResult, WindSensor};

pub struct Anemometer<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> Anemometer<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl WindSensor for Anemometer<'_> {
    fn read_wind_speed_ms(&mut self) -> CapabilityResult<f32> {
        let raw = self
            .adc
            .blocking_read(&mut self.channel)
            .map_err(|_| CapabilityError::Unavailable)?;
        Ok(raw as f32 / ADC_FULL_SCALE * ANEMOMETER_FULL_SCALE_MS)
    }
}
