use crate::components::altimeter::Altimeter;
use crate::components::beeper::{Beeper, Tone};
use crate::config::Settings;
use crate::hal::buzzer::{Buzzer, Debounced};
use crate::sys::time;

/// Facade wiring the altitude estimator to the beep scheduler and the
/// audio boundary; one `update` per pressure sample from the polling loop.
pub struct Vario<B> {
    altimeter: Altimeter,
    beeper: Beeper,
    buzzer: Debounced<B>,
    last_update: u32,
    started: bool,
    silent: bool,
    beeps_on_lift: bool,
    beeps_on_sink: bool,
}

impl<B: Buzzer> Vario<B> {
    pub fn new(buzzer: B) -> Self {
        Self {
            altimeter: Altimeter::new(),
            beeper: Beeper::new(),
            buzzer: Debounced::new(buzzer),
            last_update: 0,
            started: false,
            silent: false,
            beeps_on_lift: true,
            beeps_on_sink: true,
        }
    }

    pub fn configure(&mut self, settings: &Settings) {
        self.beeper.set_climb_threshold(settings.climb_threshold);
        self.beeper.set_sink_threshold(settings.sink_threshold);
        self.silent = settings.sound_off;
        self.beeps_on_sink = settings.sink_alarm;
    }

    pub fn update(&mut self, pressure: f64, now: u32) {
        // The filter wants dt > 0; the first sample after startup gets the
        // documented 1.0 s default.
        let dt = if self.started {
            time::elapsed(now, self.last_update) as f64 / 1000.0
        } else {
            1.0
        };
        self.started = true;
        self.last_update = now;
        self.altimeter.add_pressure(pressure, dt);
        self.beeper.add_value(self.altimeter.climb_rate());
        if let Some(intent) = self.beeper.tick(now) {
            self.emit(intent);
        }
    }

    fn emit(&mut self, intent: Tone) {
        if self.silent {
            return;
        }
        match intent {
            Tone::Mute => self.buzzer.mute(),
            Tone::Note { frequency, duration_ms } => {
                let audible =
                    if self.beeper.climbing() { self.beeps_on_lift } else { self.beeps_on_sink };
                if audible {
                    self.buzzer.tone(frequency, duration_ms);
                }
            }
        }
    }

    pub fn altitude(&self) -> f64 {
        self.altimeter.altitude()
    }

    pub fn climb_rate(&self) -> f64 {
        self.altimeter.climb_rate()
    }

    /// Ground calibration; see [`Altimeter::set_altitude`].
    pub fn set_altitude(&mut self, altitude: f64) {
        self.altimeter.set_altitude(altitude);
    }

    pub fn set_climb_threshold(&mut self, value: f64) {
        self.beeper.set_climb_threshold(value);
    }

    pub fn set_sink_threshold(&mut self, value: f64) {
        self.beeper.set_sink_threshold(value);
    }

    pub fn climb_threshold(&self) -> f64 {
        self.beeper.climb_threshold()
    }

    pub fn sink_threshold(&self) -> f64 {
        self.beeper.sink_threshold()
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn set_beeps_on_sink(&mut self, value: bool) {
        self.beeps_on_sink = value;
    }

    pub fn force_stop_beep(&mut self) {
        self.buzzer.mute();
    }
}
