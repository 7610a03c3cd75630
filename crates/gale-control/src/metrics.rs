//! Derived aerodynamic quantities: shaft speed, tip-speed ratio and power
//! coefficient.

use core::f32::consts::PI;

use gale_config::{MIN_WIND_SPEED_MS, TurbineConfig};

/// Shaft angular velocity in rad/s.
#[inline]
pub fn shaft_omega_rad_s(rpm: f32) -> f32 {
    rpm * (2.0 * PI / 60.0)
}

/// Tip-speed ratio lambda = omega * R / v, defined 0 in calm air.
pub fn tip_speed_ratio(rpm: f32, wind_ms: f32, rotor_radius_m: f32) -> f32 {
    if wind_ms < MIN_WIND_SPEED_MS {
        return 0.0;
    }
    shaft_omega_rad_s(rpm) * rotor_radius_m / wind_ms
}

/// Kinetic power carried by the free stream through the swept area.
#[inline]
pub fn wind_power_w(wind_ms: f32, swept_area_m2: f32, air_density_kg_m3: f32) -> f32 {
    0.5 * air_density_kg_m3 * swept_area_m2 * wind_ms * wind_ms * wind_ms
}

/// Power coefficient Cp = P_elec / P_wind, defined 0 in calm air.
///
/// Deliberately unclamped: transient mis-sampling can push Cp past the
/// Betz limit, and consumers must treat it as a diagnostic only.
pub fn power_coefficient(
    power_w: f32,
    wind_ms: f32,
    swept_area_m2: f32,
    air_density_kg_m3: f32,
) -> f32 {
    if wind_ms < MIN_WIND_SPEED_MS {
        return 0.0;
    }
    power_w / wind_power_w(wind_ms, swept_area_m2, air_density_kg_m3)
}

/// One tick's worth of telemetry with its derived quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub timestamp_ms: u64,
    pub wind_speed_ms: f32,
    pub rotor_rpm: f32,
    pub bus_voltage_v: f32,
    pub bus_current_a: f32,
    pub power_w: f32,
    pub lambda: f32,
    pub cp: f32,
}

impl Sample {
    /// Build a sample from raw sensor values, computing power, lambda and
    /// Cp from the config geometry.
    pub fn derive(
        timestamp_ms: u64,
        wind_speed_ms: f32,
        rotor_rpm: f32,
        bus_voltage_v: f32,
        bus_current_a: f32,
        config: &TurbineConfig,
    ) -> Self {
        let power_w = bus_voltage_v * bus_current_a;
        Self {
            timestamp_ms,
            wind_speed_ms,
            rotor_rpm,
            bus_voltage_v,
            bus_current_a,
            power_w,
            lambda: tip_speed_ratio(rotor_rpm, wind_speed_ms, config.rotor_radius_m),
            cp: power_coefficient(
                power_w,
                wind_speed_ms,
                config.swept_area_m2,
                config.air_density_kg_m3,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omega_of_60_rpm_is_two_pi() {
        let omega = shaft_omega_rad_s(60.0);
        assert!((omega - 2.0 * PI).abs() < 1e-5);
    }

    #[test]
    fn lambda_and_cp_are_zero_in_calm_air() {
        // Just below the calm threshold
        assert_eq!(tip_speed_ratio(100.0, 0.49, 0.6), 0.0);
        assert_eq!(power_coefficient(200.0, 0.49, 1.8, 1.15), 0.0);
    }

    #[test]
    fn lambda_matches_hand_calculation() {
        // 150 RPM, 5 m/s, R = 0.6: omega = 15.708 rad/s, lambda = 1.885
        let lambda = tip_speed_ratio(150.0, 5.0, 0.6);
        assert!((lambda - 1.8850).abs() < 1e-3);
    }

    #[test]
    fn cp_is_not_clamped_to_betz() {
        // Implausibly high power against weak wind: Cp > 0.593 must pass
        // through untouched.
        let cp = power_coefficient(500.0, 2.0, 1.8, 1.15);
        assert!(cp > 0.593);
    }

    #[test]
    fn sample_derives_power_from_bus_telemetry() {
        let cfg = TurbineConfig::default();
        let s = Sample::derive(1_000, 5.0, 150.0, 48.0, 4.0, &cfg);
        assert!((s.power_w - 192.0).abs() < 1e-4);
        assert!(s.lambda > 0.0);
        assert!(s.cp > 0.0);
    }
}
