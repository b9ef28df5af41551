use libm::pow;

use crate::algorithm::{kalman::KalmanFilter, lpf::LPF};

pub const STANDARD_SEA_LEVEL_PRESSURE: f64 = 101325.0;

const BARO_EXPONENT: f64 = 0.190295;
const BARO_SCALE: f64 = 44330.0;

// Damping applied to the raw barometric altitude before it reaches the
// filter, and the variance assumed for the damped observation.
const ALTITUDE_DAMP: f64 = 0.05;
const POSITION_NOISE: f64 = 0.2;
const ACCELERATION_NOISE: f64 = 1.0;

/// Fuses periodic barometric pressure samples into a smoothed altitude and
/// climb rate estimate.
pub struct Altimeter {
    sea_level_pressure: f64,
    raw_pressure: f64,
    raw_altitude: f64,
    damp: LPF,
    filter: KalmanFilter,
}

impl Default for Altimeter {
    fn default() -> Self {
        Self::new()
    }
}

impl Altimeter {
    pub fn new() -> Self {
        Self {
            sea_level_pressure: STANDARD_SEA_LEVEL_PRESSURE,
            raw_pressure: STANDARD_SEA_LEVEL_PRESSURE,
            raw_altitude: 0.0,
            damp: LPF::with_alpha(ALTITUDE_DAMP),
            filter: KalmanFilter::new(ACCELERATION_NOISE),
        }
    }

    pub fn set_sea_level_pressure(&mut self, pressure: f64) {
        self.raw_pressure = pressure;
        self.sea_level_pressure = pressure;
        self.damp.reset();
    }

    /// Feeds one pressure sample taken `dt` seconds after the previous one.
    /// `dt` must be greater than 0; for the first sample after a reset 1.0
    /// is a safe default.
    pub fn add_pressure(&mut self, pressure: f64, dt: f64) {
        self.raw_pressure = pressure;
        self.raw_altitude =
            BARO_SCALE * (1.0 - pow(self.raw_pressure / self.sea_level_pressure, BARO_EXPONENT));
        let damped = self.damp.filter(self.raw_altitude);
        self.filter.update(damped, POSITION_NOISE, dt);
    }

    /// Ground calibration: re-derives the sea-level pressure so the current
    /// raw pressure maps to the given altitude. Filter covariance is left
    /// untouched.
    pub fn set_altitude(&mut self, altitude: f64) {
        self.damp.set(altitude);
        self.sea_level_pressure = self.raw_pressure / pow(1.0 - altitude / BARO_SCALE, 5.255);
    }

    pub fn reset(&mut self, altitude: f64, climb_rate: f64) {
        self.filter.reset(altitude, climb_rate);
        self.damp.reset();
    }

    pub fn altitude(&self) -> f64 {
        self.filter.x_abs()
    }

    pub fn climb_rate(&self) -> f64 {
        self.filter.x_vel()
    }
}

mod test {
    #[test]
    fn test_constant_pressure_converges() {
        use super::Altimeter;

        let mut altimeter = Altimeter::new();
        // ~988 hPa is roughly 213 m in the standard atmosphere
        let pressure = 98800.0;
        altimeter.add_pressure(pressure, 1.0);
        for _ in 0..600 {
            altimeter.add_pressure(pressure, 0.2);
        }
        let expected = 44330.0 * (1.0 - libm::pow(pressure / 101325.0, 0.190295));
        assert!((altimeter.altitude() - expected).abs() < 0.5);
        assert!(altimeter.climb_rate().abs() < 0.05);
    }

    #[test]
    fn test_reset_snaps_to_observation() {
        use super::Altimeter;

        let mut altimeter = Altimeter::new();
        altimeter.add_pressure(101325.0, 1.0);
        altimeter.reset(0.0, 0.0);
        altimeter.add_pressure(101325.0, 1.0);
        assert!(altimeter.altitude().abs() < 1e-6);
    }

    #[test]
    fn test_ground_calibration() {
        use super::Altimeter;

        let mut altimeter = Altimeter::new();
        altimeter.add_pressure(98800.0, 1.0);
        altimeter.set_altitude(150.0);
        // with the recalibrated sea-level pressure the same raw pressure
        // now implies the calibrated altitude
        let expected = 150.0;
        for _ in 0..600 {
            altimeter.add_pressure(98800.0, 0.2);
        }
        assert!((altimeter.altitude() - expected).abs() < 1.0);
    }

    #[test]
    fn test_steady_climb_rate() {
        use super::Altimeter;

        let mut altimeter = Altimeter::new();
        let mut pressure = 101325.0;
        altimeter.add_pressure(pressure, 1.0);
        // ~12 Pa/s is close to 1 m/s of climb near sea level
        for _ in 0..300 {
            pressure -= 12.0 * 0.2;
            altimeter.add_pressure(pressure, 0.2);
        }
        assert!(altimeter.climb_rate() > 0.5);
    }
}
