//! Converter PWM, dump load and brake relay behind one actuator bank.
//!
//! A single owner for all three outputs keeps the coupling rules local:
//! activating the dump load drives the converter to full duty and drops
//! the brake; engaging the brake forces duty to zero.

use embassy_rp::gpio::Output;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use gale_control::capability::{Actuators, CapabilityResult};

pub struct PowerStage<'d> {
    converter: Pwm<'d>,
    pwm_config: PwmConfig,
    top: u16,
    brake_relay: Output<'d>,
}

impl<'d> PowerStage<'d> {
    /// `pwm` must be configured by the caller with the 20 kHz top value;
    /// the same config is reused for every duty update.
    pub fn new(converter: Pwm<'d>, pwm_config: PwmConfig, brake_relay: Output<'d>) -> Self {
        let top = pwm_config.top;
        let mut stage = Self {
            converter,
            pwm_config,
            top,
            brake_relay,
        };
        stage.write_duty(0.0);
        stage
    }

    fn write_duty(&mut self, duty: f32) {
        let compare = (duty.clamp(0.0, 1.0) * self.top as f32) as u16;
        self.pwm_config.compare_a = compare;
        self.converter.set_config(&self.pwm_config);
    }
}

impl Actuators for PowerStage<'_> {
    fn set_converter_duty(&mut self, duty: f32) -> CapabilityResult<()> {
        self.write_duty(duty);
        Ok(())
    }

    fn set_dump_load_active(&mut self, active: bool) -> CapabilityResult<()> {
        if active {
            self.brake_relay.set_low();
            self.write_duty(1.0);
        }
        Ok(())
    }

    fn set_brake_engaged(&mut self, engaged: bool) -> CapabilityResult<()> {
        if engaged {
            self.brake_relay.set_high();
            self.write_duty(0.0);
        } else {
            self.brake_relay.set_low();
        }
        Ok(())
    }
}
