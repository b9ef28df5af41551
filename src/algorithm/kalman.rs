/// Two-state recursive filter tracking an absolute value and its rate of
/// change, with acceleration modelled as process noise.
pub struct KalmanFilter {
    x_abs: f64,
    x_vel: f64,

    p_abs_abs: f64,
    p_abs_vel: f64,
    p_vel_vel: f64,

    var_accel: f64,
}

impl KalmanFilter {
    pub fn new(var_accel: f64) -> Self {
        let mut filter = Self {
            x_abs: 0.0,
            x_vel: 0.0,
            p_abs_abs: 0.0,
            p_abs_vel: 0.0,
            p_vel_vel: 0.0,
            var_accel,
        };
        filter.reset(0.0, 0.0);
        filter
    }

    /// Reinitializes the state around a seed value and velocity. Position
    /// uncertainty becomes effectively unbounded, velocity uncertainty the
    /// process noise variance.
    pub fn reset(&mut self, abs_value: f64, vel_value: f64) {
        self.x_abs = abs_value;
        self.x_vel = vel_value;
        self.p_abs_abs = 1e10;
        self.p_abs_vel = 0.0;
        self.p_vel_vel = self.var_accel;
    }

    /// Fuses a measurement of the absolute value given its variance and the
    /// interval since the previous measurement in seconds. The interval must
    /// be greater than 0; for the first measurement after `reset` it is safe
    /// to use 1.0.
    pub fn update(&mut self, z_abs: f64, var_z_abs: f64, dt: f64) {
        // Predict step.
        self.x_abs += self.x_vel * dt;
        // The last covariance term mixes in acceleration noise.
        self.p_abs_abs +=
            2.0 * dt * self.p_abs_vel + dt * dt * self.p_vel_vel + self.var_accel * dt * dt * dt * dt / 4.0;
        self.p_abs_vel += dt * self.p_vel_vel + self.var_accel * dt * dt * dt / 2.0;
        self.p_vel_vel += self.var_accel * dt * dt;

        // Update step.
        let y = z_abs - self.x_abs; // innovation
        let s_inv = 1.0 / (self.p_abs_abs + var_z_abs);
        let k_abs = self.p_abs_abs * s_inv;
        let k_vel = self.p_abs_vel * s_inv;
        self.x_abs += k_abs * y;
        self.x_vel += k_vel * y;
        self.p_vel_vel -= self.p_abs_vel * k_vel;
        self.p_abs_vel -= self.p_abs_vel * k_abs;
        self.p_abs_abs -= self.p_abs_abs * k_abs;
    }

    pub fn x_abs(&self) -> f64 {
        self.x_abs
    }

    pub fn x_vel(&self) -> f64 {
        self.x_vel
    }
}

mod test {
    #[test]
    fn test_snap_to_first_observation() {
        use super::KalmanFilter;

        let mut filter = KalmanFilter::new(1.0);
        filter.reset(123.4, 0.0);
        filter.update(123.4, 0.2, 1.0);
        assert!((filter.x_abs() - 123.4).abs() < 1e-6);
    }

    #[test]
    fn test_convergence_on_constant_input() {
        use super::KalmanFilter;

        let mut filter = KalmanFilter::new(1.0);
        filter.reset(0.0, 5.0);
        for _ in 0..100 {
            filter.update(250.0, 0.2, 0.1);
        }
        assert!((filter.x_abs() - 250.0).abs() < 0.1);
        assert!(filter.x_vel().abs() < 0.1);
    }

    #[test]
    fn test_tracks_linear_ramp() {
        use super::KalmanFilter;

        let mut filter = KalmanFilter::new(1.0);
        filter.reset(0.0, 0.0);
        let mut z = 0.0;
        for _ in 0..200 {
            z += 2.0 * 0.1; // 2 units per second
            filter.update(z, 0.2, 0.1);
        }
        assert!((filter.x_vel() - 2.0).abs() < 0.2);
    }
}
