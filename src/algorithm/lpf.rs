/// Single-pole low-pass filter. The first sample after construction or
/// `reset` passes through unfiltered so the output never has to slew from
/// zero to the operating point.
pub struct LPF {
    alpha: f64,
    value: f64,
    primed: bool,
}

impl LPF {
    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha, value: 0.0, primed: false }
    }

    pub fn filter(&mut self, sample: f64) -> f64 {
        if self.primed {
            self.value += self.alpha * (sample - self.value);
        } else {
            self.value = sample;
            self.primed = true;
        }
        self.value
    }

    /// Overrides the current output, keeping the filter primed.
    pub fn set(&mut self, value: f64) {
        self.value = value;
        self.primed = true;
    }

    pub fn reset(&mut self) {
        self.primed = false;
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

mod test {
    #[test]
    fn test_first_sample_passes_through() {
        use super::LPF;

        let mut lpf = LPF::with_alpha(0.05);
        assert_eq!(lpf.filter(812.5), 812.5);
    }

    #[test]
    fn test_damping() {
        use super::LPF;

        let mut lpf = LPF::with_alpha(0.05);
        lpf.set(3.335);
        let value0 = lpf.filter(3.295);
        let value1 = lpf.filter(3.295);
        assert!(3.295 < value1 && value1 < value0);
        let value2 = lpf.filter(3.295);
        assert!(3.295 < value2 && value2 < value1);
    }

    #[test]
    fn test_reset_reprimes() {
        use super::LPF;

        let mut lpf = LPF::with_alpha(0.05);
        lpf.filter(100.0);
        lpf.reset();
        assert_eq!(lpf.filter(0.0), 0.0);
    }
}
