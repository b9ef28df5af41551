use libm::fabs;

use crate::algorithm::piecewise::{PiecewiseLinear, Point};
use crate::sys::time;

// Tone frequency ramps: base + increment * climb rate, clamped around the
// base by the min/max ratios below.
const CLIMB_BASE_HZ: f64 = 1000.0;
const CLIMB_INCREMENT: f64 = 100.0;
const SINK_BASE_HZ: f64 = 500.0;
const SINK_INCREMENT: f64 = 100.0;
const MIN_RATIO: f64 = 0.5;
const MAX_RATIO: f64 = 2.0;

const DEFAULT_CLIMB_THRESHOLD: f64 = 0.1; // m/s, ~20 fpm
const DEFAULT_SINK_THRESHOLD: f64 = -2.0; // m/s, ~-400 fpm

const BEEP_SCALE_MS: f64 = 1200.0;

/// Cadence control points: climb-rate magnitude to beep-duration fraction.
/// Higher rates give shorter beeps, hence faster beeping.
const DURATION_POINTS: [Point; 6] = [
    Point { x: 0.135, y: 0.4755 },
    Point { x: 0.441, y: 0.3619 },
    Point { x: 1.029, y: 0.2238 },
    Point { x: 1.559, y: 0.1565 },
    Point { x: 2.471, y: 0.0985 },
    Point { x: 3.571, y: 0.0741 },
];

/// Tone intent handed to the audio boundary. Duration 0 means start and
/// hold.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Tone {
    Mute,
    Note { frequency: u16, duration_ms: u32 },
}

/// Classifies climb-rate values into climb/sink/neutral and schedules the
/// intermittent tone whose pitch and cadence encode the rate.
pub struct Beeper {
    value: f64,
    climbing: bool,
    sinking: bool,
    beeping: bool,
    climb_threshold: f64,
    sink_threshold: f64,
    duration: PiecewiseLinear<6>,

    started: bool,
    should_start: bool,
    should_stop: bool,
    can_start_at: u32,
    stop_at: u32,
}

impl Default for Beeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Beeper {
    pub fn new() -> Self {
        let mut duration = PiecewiseLinear::new();
        for point in DURATION_POINTS.iter() {
            duration.add_point(*point);
        }
        Self {
            value: 0.0,
            climbing: false,
            sinking: false,
            beeping: false,
            climb_threshold: DEFAULT_CLIMB_THRESHOLD,
            sink_threshold: DEFAULT_SINK_THRESHOLD,
            duration,
            started: false,
            should_start: true,
            should_stop: false,
            can_start_at: 0,
            stop_at: 0,
        }
    }

    /// Classifies a fresh climb-rate value. Values exactly at a threshold
    /// count as neutral.
    pub fn add_value(&mut self, value: f64) {
        self.value = value;
        if value > self.climb_threshold {
            self.climbing = true;
            self.sinking = false;
            self.beeping = true;
        } else if value < self.sink_threshold {
            self.climbing = false;
            self.sinking = true;
            self.beeping = true;
        } else {
            self.climbing = false;
            self.sinking = false;
            self.beeping = false;
        }
    }

    pub fn climbing(&self) -> bool {
        self.climbing
    }

    pub fn sinking(&self) -> bool {
        self.sinking
    }

    pub fn beeping(&self) -> bool {
        self.beeping
    }

    pub fn set_climb_threshold(&mut self, value: f64) {
        self.climb_threshold = value;
    }

    pub fn set_sink_threshold(&mut self, value: f64) {
        self.sink_threshold = value;
    }

    pub fn climb_threshold(&self) -> f64 {
        self.climb_threshold
    }

    pub fn sink_threshold(&self) -> f64 {
        self.sink_threshold
    }

    pub fn climb_tone(&self) -> u16 {
        scaled_tone(CLIMB_BASE_HZ, CLIMB_INCREMENT, self.value)
    }

    pub fn sink_tone(&self) -> u16 {
        scaled_tone(SINK_BASE_HZ, SINK_INCREMENT, self.value)
    }

    /// Beep length for the current rate magnitude, in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        (self.duration.value(fabs(self.value)) * BEEP_SCALE_MS) as u32
    }

    /// Runs the beep scheduler once per polling tick. Returns at most one
    /// tone intent; `None` leaves the output as it is.
    pub fn tick(&mut self, now: u32) -> Option<Tone> {
        if !self.beeping || !(self.climbing || self.sinking) {
            return Some(Tone::Mute);
        }
        let duration = self.duration_ms();
        let mut intent = None;
        if self.should_stop && time::reached(now, self.stop_at) {
            // Silencing on the stop edge only applies to climb cycles; a
            // sink tone runs through its driver-side duration.
            if self.climbing {
                intent = Some(Tone::Mute);
            }
            self.should_stop = false;
            self.should_start = true;
            self.started = false;
            self.can_start_at = now.wrapping_add(duration);
        } else if self.should_start && time::reached(now, self.can_start_at) {
            self.should_start = false;
            self.started = true;
            self.stop_at = now.wrapping_add(duration);
            self.should_stop = true;
        }
        if self.started {
            let frequency = if self.climbing { self.climb_tone() } else { self.sink_tone() };
            intent = Some(Tone::Note { frequency, duration_ms: duration });
        }
        intent
    }
}

/// Clamps `base + increment * value` to [base/2, base*2], nudging an exact
/// unity ratio off the boundary by one epsilon.
fn scaled_tone(base: f64, increment: f64, value: f64) -> u16 {
    let hz = base + increment * value;
    let mut ratio = hz / base;
    if ratio < MIN_RATIO {
        ratio = MIN_RATIO;
    } else if ratio > MAX_RATIO {
        ratio = MAX_RATIO;
    } else if ratio == 1.0 {
        ratio = 1.0 + f64::EPSILON;
    }
    (ratio * base) as u16
}

#[cfg(test)]
mod test {
    use super::{Beeper, Tone};

    #[test]
    fn test_threshold_classification() {
        let mut beeper = Beeper::new();

        beeper.add_value(0.1); // exactly at the climb threshold
        assert!(!beeper.climbing());
        assert!(!beeper.beeping());

        beeper.add_value(1.1);
        assert!(beeper.climbing());
        assert!(beeper.beeping());
        assert_eq!(beeper.climb_tone(), 1110);

        beeper.add_value(-2.0); // exactly at the sink threshold
        assert!(!beeper.sinking());

        beeper.add_value(-2.5);
        assert!(beeper.sinking());
        assert_eq!(beeper.sink_tone(), 250);
    }

    #[test]
    fn test_tone_clamping() {
        let mut beeper = Beeper::new();

        beeper.add_value(15.0);
        assert_eq!(beeper.climb_tone(), 2000);

        beeper.add_value(-8.0);
        assert_eq!(beeper.sink_tone(), 250);

        // zero rate sits exactly on the unity ratio; the guard keeps the
        // result at the base frequency instead of drifting past the clamp
        beeper.add_value(0.0);
        assert_eq!(beeper.climb_tone(), 1000);
        assert_eq!(beeper.sink_tone(), 500);
    }

    #[test]
    fn test_neutral_forces_mute() {
        let mut beeper = Beeper::new();
        beeper.add_value(0.05);
        assert_eq!(beeper.tick(0), Some(Tone::Mute));
    }

    #[test]
    fn test_beep_cadence() {
        let mut beeper = Beeper::new();
        beeper.add_value(1.0);
        let duration = beeper.duration_ms();
        assert!(0 < duration && duration < 1200);

        // first tick starts a beep
        let note = beeper.tick(0);
        match note {
            Some(Tone::Note { frequency, duration_ms }) => {
                assert_eq!(frequency, 1100);
                assert_eq!(duration_ms, duration);
            }
            other => panic!("expected note, got {:?}", other),
        }

        // while the beep is sounding the scheduler keeps re-issuing the note
        assert_eq!(beeper.tick(duration / 2), note);

        // at the stop deadline the climb tone is silenced and a gap begins
        assert_eq!(beeper.tick(duration), Some(Tone::Mute));
        assert_eq!(beeper.tick(duration + duration / 2), None);

        // after the gap the next beep starts
        match beeper.tick(duration * 2) {
            Some(Tone::Note { .. }) => (),
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_faster_beeping_at_higher_rates() {
        let mut beeper = Beeper::new();
        beeper.add_value(0.5);
        let slow = beeper.duration_ms();
        beeper.add_value(3.0);
        let fast = beeper.duration_ms();
        assert!(fast < slow);

        // sink cadence scales with magnitude as well
        beeper.add_value(-3.0);
        assert_eq!(beeper.duration_ms(), fast);
    }
}
