/// Hardware tone driver boundary. Duration 0 means start and hold the tone
/// until told otherwise, non-zero means sound for that many milliseconds.
pub trait Buzzer {
    fn tone(&mut self, frequency: u16, duration_ms: u32);
    fn mute(&mut self);
}

/// Wraps a buzzer with a quiet flag so repeated mutes do not chirp the
/// output. The flag lives here rather than in process-wide state so
/// instances never interfere.
pub struct Debounced<B> {
    buzzer: B,
    quiet: bool,
}

impl<B: Buzzer> Debounced<B> {
    pub fn new(buzzer: B) -> Self {
        Self { buzzer, quiet: false }
    }

    pub fn tone(&mut self, frequency: u16, duration_ms: u32) {
        self.buzzer.tone(frequency, duration_ms);
        self.quiet = false;
    }

    pub fn mute(&mut self) {
        if self.quiet {
            return;
        }
        self.quiet = true;
        self.buzzer.mute();
    }
}

#[cfg(test)]
mod test {
    #[derive(Default)]
    struct Recording {
        tones: std::vec::Vec<(u16, u32)>,
        mutes: usize,
    }

    impl super::Buzzer for Recording {
        fn tone(&mut self, frequency: u16, duration_ms: u32) {
            self.tones.push((frequency, duration_ms));
        }

        fn mute(&mut self) {
            self.mutes += 1;
        }
    }

    #[test]
    fn test_mute_debounce() {
        use super::Debounced;

        let mut buzzer = Debounced::new(Recording::default());
        buzzer.mute();
        buzzer.mute();
        buzzer.mute();
        assert_eq!(buzzer.buzzer.mutes, 1);

        buzzer.tone(1000, 0);
        buzzer.mute();
        assert_eq!(buzzer.buzzer.tones, vec![(1000, 0)]);
        assert_eq!(buzzer.buzzer.mutes, 2);
    }
}
