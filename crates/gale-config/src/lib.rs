#![cfg_attr(not(test), no_std)]

use thiserror::Error;

// Duty-cycle limits for the boost converter
pub const DUTY_MIN: f32 = 0.1;
pub const DUTY_MAX: f32 = 0.9;
pub const DUTY_INITIAL: f32 = 0.3; // MPPT starting point

// Hill-climb step sizing
pub const MPPT_BASE_STEP: f32 = 0.02;
pub const MPPT_MIN_STEP: f32 = 0.005;
pub const TURBULENCE_GAIN: f32 = 0.5; // k in step = base / (1 + k*sigma)
pub const WIND_WINDOW_LEN: usize = 100; // sigma estimation window, independent of tick rate

// Soft-stall power regulation gains
pub const SOFT_STALL_KP: f32 = 0.01;
pub const SOFT_STALL_KI: f32 = 0.001;
pub const SOFT_STALL_DUTY_BIAS: f32 = 0.5;

// Regime transition thresholds (fractions of rated power)
pub const POWER_REG_ENTER_FRACTION: f32 = 0.95;
pub const POWER_REG_EXIT_FRACTION: f32 = 0.80;

// Wind below this is treated as calm; lambda and Cp are defined 0
pub const MIN_WIND_SPEED_MS: f32 = 0.5;

// Startup regime exits to MPPT above this shaft speed
pub const MIN_OPERATIONAL_RPM: f32 = 40.0;

// Control loop timing
pub const TICK_PERIOD_MS: u64 = 1_000; // 1 Hz sampling, DAQ-compatible

// Tachometer parameters
pub const TACH_STALE_MS: u64 = 2_000; // pulse older than this means no rotation
pub const TACH_PULSES_PER_REV: u32 = 1;

// Anemometer scaling (analog 0-3.3V full scale)
pub const ANEMOMETER_FULL_SCALE_MS: f32 = 25.0;
pub const ADC_FULL_SCALE: f32 = 4_095.0;

// INA226 bus sensor
pub const INA226_I2C_ADDR: u8 = 0x40;
pub const INA226_I2C_FREQ: u32 = 400_000;
pub const INA226_BUS_LSB_V: f32 = 0.00125; // 1.25 mV per bit
pub const INA226_CURRENT_LSB_A: f32 = 0.001; // 1 mA per bit with 2 mOhm shunt calibration

// Converter PWM
pub const CONVERTER_PWM_FREQ_HZ: u32 = 20_000;

// SD logging
pub const LOG_FILE_NAME: &str = "vawt_data.csv";
pub const LOG_CHANNEL_DEPTH: usize = 32;
pub const LOG_FLUSH_EVERY: u32 = 10; // rows between SD flushes
pub const SD_SPI_FREQ: u32 = 16_000_000;

// Supervisor parameters (firmware-side; the core never blocks)
pub const WATCHDOG_TIMEOUT_MS: u64 = 5_000;

/// Static description of the machine and its protection envelope.
///
/// Built once at startup and never mutated afterwards. All control and
/// safety thresholds flow from here; the constants above are algorithm
/// tuning that does not vary between installations.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TurbineConfig {
    pub rotor_radius_m: f32,
    pub rotor_height_m: f32,
    /// 2*R*H for a helical rotor, stored explicitly to avoid recomputation drift
    pub swept_area_m2: f32,
    pub lambda_opt: f32,
    pub cp_max: f32,
    pub rated_power_w: f32,
    pub rated_rpm: f32,
    pub overspeed_rpm: f32,
    pub overvoltage_v: f32,
    pub overcurrent_a: f32,
    pub air_density_kg_m3: f32,
    pub cut_in_wind_ms: f32,
    pub stall_wind_ms: f32,
    pub tick_period_ms: u64,
}

impl Default for TurbineConfig {
    /// 500 W helical Gorlov testbed
    fn default() -> Self {
        Self {
            rotor_radius_m: 0.6,
            rotor_height_m: 1.5,
            swept_area_m2: 1.8,
            lambda_opt: 2.0,
            cp_max: 0.35,
            rated_power_w: 500.0,
            rated_rpm: 180.0,
            overspeed_rpm: 250.0, // 1.4x rated
            overvoltage_v: 60.0,
            overcurrent_a: 30.0,
            air_density_kg_m3: 1.15, // tropical sea level
            cut_in_wind_ms: 3.0,
            stall_wind_ms: 12.0,
            tick_period_ms: TICK_PERIOD_MS,
        }
    }
}

impl TurbineConfig {
    /// Check construction invariants, consuming and returning the config.
    ///
    /// Controllers must refuse to run on a config that fails here.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.rotor_radius_m <= 0.0
            || self.rotor_height_m <= 0.0
            || self.swept_area_m2 <= 0.0
            || self.air_density_kg_m3 <= 0.0
        {
            return Err(ConfigError::NonPositiveDimension);
        }
        if self.rated_power_w <= 0.0 {
            return Err(ConfigError::NonPositiveRatedPower);
        }
        if self.overspeed_rpm <= self.rated_rpm {
            return Err(ConfigError::OverspeedNotAboveRated);
        }
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        Ok(self)
    }
}

/// Construction-time config violations. Fatal for the control core.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("rotor dimension or air density is not strictly positive")]
    NonPositiveDimension,

    #[error("rated power must be strictly positive")]
    NonPositiveRatedPower,

    #[error("overspeed threshold must exceed rated RPM")]
    OverspeedNotAboveRated,

    #[error("tick period must be non-zero")]
    ZeroTickPeriod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TurbineConfig::default().validated().is_ok());
    }

    #[test]
    fn rejects_overspeed_at_or_below_rated() {
        let cfg = TurbineConfig {
            overspeed_rpm: 180.0,
            ..TurbineConfig::default()
        };
        assert_eq!(cfg.validated(), Err(ConfigError::OverspeedNotAboveRated));
    }

    #[test]
    fn rejects_zero_swept_area() {
        let cfg = TurbineConfig {
            swept_area_m2: 0.0,
            ..TurbineConfig::default()
        };
        assert_eq!(cfg.validated(), Err(ConfigError::NonPositiveDimension));
    }

    #[test]
    fn rejects_negative_rated_power() {
        let cfg = TurbineConfig {
            rated_power_w: -500.0,
            ..TurbineConfig::default()
        };
        assert_eq!(cfg.validated(), Err(ConfigError::NonPositiveRatedPower));
    }
}
