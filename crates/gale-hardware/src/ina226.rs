//! Minimal INA226 driver for DC bus voltage and current over blocking I2C.
//!
//! Only the registers the control loop needs are implemented: one-time
//! configuration plus bus-voltage and current reads. The calibration
//! register is programmed for a 1 mA/bit current LSB against the 2 mOhm
//! shunt on the rectifier board.

use embassy_rp::i2c::{self, Blocking, I2c};
use gale_config::{INA226_BUS_LSB_V, INA226_CURRENT_LSB_A, INA226_I2C_ADDR};
use gale_control::capability::{BusSensor, CapabilityError, CapabilityResult};
use thiserror::Error;

const REG_CONFIG: u8 = 0x00;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_CURRENT: u8 = 0x04;
const REG_CALIBRATION: u8 = 0x05;

// 16-sample averaging, 1.1 ms conversion times, continuous shunt+bus.
const CONFIG_VALUE: u16 = 0x4527;

// cal = 0.00512 / (current_lsb * r_shunt) = 0.00512 / (0.001 * 0.002)
const CALIBRATION_VALUE: u16 = 2_560;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum Ina226Error {
    #[error("I2C transfer failed")]
    Bus,
}

pub struct Ina226<'d, T: i2c::Instance> {
    i2c: I2c<'d, T, Blocking>,
    address: u8,
}

impl<'d, T: i2c::Instance> Ina226<'d, T> {
    pub fn new(i2c: I2c<'d, T, Blocking>) -> Self {
        Self {
            i2c,
            address: INA226_I2C_ADDR,
        }
    }

    /// Program averaging mode and shunt calibration. Must run once before
    /// the first read; reads on an unconfigured part return garbage.
    pub fn init(&mut self) -> Result<(), Ina226Error> {
        self.write_register(REG_CONFIG, CONFIG_VALUE)?;
        self.write_register(REG_CALIBRATION, CALIBRATION_VALUE)
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), Ina226Error> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .blocking_write(self.address, &[reg, hi, lo])
            .map_err(|_| Ina226Error::Bus)
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, Ina226Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .blocking_write_read(self.address, &[reg], &mut buf)
            .map_err(|_| Ina226Error::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<T: i2c::Instance> BusSensor for Ina226<'_, T> {
    fn read_bus_voltage_v(&mut self) -> CapabilityResult<f32> {
        let raw = self
            .read_register(REG_BUS_VOLTAGE)
            .map_err(|_| CapabilityError::Unavailable)?;
        Ok(raw as f32 * INA226_BUS_LSB_V)
    }

    fn read_bus_current_a(&mut self) -> CapabilityResult<f32> {
        let raw = self
            .read_register(REG_CURRENT)
            .map_err(|_| CapabilityError::Unavailable)?;
        // Two's complement: negative during regeneration.
        Ok(raw as i16 as f32 * INA226_CURRENT_LSB_A)
    }
}
