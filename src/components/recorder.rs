use core::fmt::Write;

use heapless::{Deque, String};
use libm::round;

use crate::config::Settings;
use crate::hal::storage::Storage;
use crate::igc;
use crate::protocol::nmea::Fix;
use crate::sys::time;

/// Sliding window of recent fixes, sized for ~10 seconds at the 1 Hz
/// update rate.
const WINDOW: usize = 10;

const UPDATE_INTERVAL_MS: u32 = 1000;
const DEFAULT_MIN_SPEED_KNOTS: i32 = 5;

const MANUFACTURER_RECORD: &str = "AXVR001 vario";

struct LogLine {
    sentence: String<48>,
    speed: i32,
}

/// Detects takeoff and landing from the ground-speed moving average and
/// appends IGC records to storage while a flight is in progress.
pub struct IgcRecorder<S> {
    storage: S,
    window: Deque<LogLine, WINDOW>,
    write_timer: u32,
    timer_started: bool,
    min_speed: i32,

    recording: bool,
    show_results: bool,
    line_count: u32,
    highest_altitude: f64,
    first_sentence: String<48>,
    current_file: String<24>,

    date: String<8>,
    pilot_name: String<32>,
    glider_type: String<32>,
}

impl<S: Storage> IgcRecorder<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            window: Deque::new(),
            write_timer: 0,
            timer_started: false,
            min_speed: DEFAULT_MIN_SPEED_KNOTS,
            recording: false,
            show_results: false,
            line_count: 0,
            highest_altitude: 0.0,
            first_sentence: String::new(),
            current_file: String::new(),
            date: String::new(),
            pilot_name: String::new(),
            glider_type: String::new(),
        }
    }

    /// Applies pilot and threshold settings. Consumed once at configuration
    /// time, not re-read mid-flight.
    pub fn configure(&mut self, settings: &Settings) {
        self.min_speed = settings.min_speed_knots;
        self.pilot_name.clear();
        self.pilot_name.push_str(&settings.pilot_name).ok();
        self.glider_type.clear();
        self.glider_type.push_str(&settings.glider_model).ok();
    }

    /// Called from the polling loop; internally rate-limited to one
    /// eligible tick per second and a no-op without a valid fix.
    pub fn update(&mut self, now: u32, fix: &Fix, altitude: f64) {
        if self.timer_started && time::elapsed(now, self.write_timer) < UPDATE_INTERVAL_MS {
            return;
        }
        self.write_timer = now;
        self.timer_started = true;
        if !fix.fixed() {
            return;
        }

        let sentence = igc::encode(fix, altitude);
        let speed = round(fix.knots()) as i32;
        if self.window.is_full() {
            self.window.pop_front();
        }
        self.window.push_back(LogLine { sentence: sentence.clone(), speed }).ok();
        if !self.window.is_full() {
            return;
        }

        let speed_sum: i32 = self.window.iter().map(|line| line.speed).sum();
        let average = speed_sum / WINDOW as i32;

        if average < self.min_speed {
            if self.recording {
                self.stop_recording();
            }
            return;
        }

        if !self.recording {
            self.start_recording(fix);
            return;
        }

        let mut line: String<56> = String::new();
        line.push_str(&sentence).ok();
        line.push_str("\r\n").ok();
        self.append(&line);
        self.line_count += 1;
        if altitude > self.highest_altitude {
            self.highest_altitude = altitude;
        }
    }

    pub fn recording(&self) -> bool {
        self.recording
    }

    /// Raised once when a landing closes out the flight; cleared by
    /// `reset`.
    pub fn show_results(&self) -> bool {
        self.show_results
    }

    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    pub fn highest_altitude(&self) -> f64 {
        self.highest_altitude
    }

    /// Great-circle kilometers between the first recorded fix and the most
    /// recent one.
    pub fn travelled_distance(&self) -> f64 {
        let last = match self.window.back() {
            Some(line) => &line.sentence,
            None => return 0.0,
        };
        let (lat1, lon1) = igc::record_coordinates(&self.first_sentence);
        let (lat2, lon2) = igc::record_coordinates(last);
        igc::distance_km(lat1, lon1, lat2, lon2)
    }

    /// Elapsed flight time as `HH:MM:SS`; one recorded line is one second.
    pub fn total_time(&self) -> String<9> {
        let seconds = self.line_count;
        let mut text = String::new();
        write!(text, "{:02}:{:02}:{:02}", seconds / 3600 % 60, seconds / 60 % 60, seconds % 60)
            .ok();
        text
    }

    pub fn reset(&mut self) {
        self.line_count = 0;
        self.highest_altitude = 0.0;
        self.current_file.clear();
        self.show_results = false;
    }

    fn stop_recording(&mut self) {
        self.recording = false;
        self.show_results = true;
    }

    /// Walks the window back to the launch point and flushes the header
    /// plus every buffered line from there on, so the log starts at the
    /// moment of takeoff rather than at detection.
    fn start_recording(&mut self, fix: &Fix) {
        self.recording = true;
        self.current_file = self.file_name(fix);
        self.first_sentence.clear();
        if let Some(first) = self.window.front() {
            self.first_sentence.push_str(&first.sentence).ok();
        }

        let mut block: String<640> = String::new();
        self.write_header(&mut block);
        let launch = self.window.iter().position(|line| line.speed > 0);
        if let Some(launch) = launch {
            for line in self.window.iter().skip(launch.saturating_sub(1)) {
                block.push_str(&line.sentence).ok();
                block.push_str("\r\n").ok();
                self.line_count += 1;
            }
        }
        self.append(&block);
    }

    fn write_header(&self, block: &mut String<640>) {
        block.push_str(MANUFACTURER_RECORD).ok();
        block.push_str("\r\nHFDTE").ok();
        block.push_str(&self.date).ok();
        block.push_str("\r\nHFPLTPILOT:").ok();
        block.push_str(&self.pilot_name).ok();
        block.push_str("\r\nHFGTYGLIDERTYPE:").ok();
        block.push_str(&self.glider_type).ok();
        block.push_str("\r\n").ok();
    }

    fn file_name(&mut self, fix: &Fix) -> String<24> {
        self.date.clear();
        self.date.push_str(fix.date()).ok();
        let mut name = String::new();
        write!(name, "{}_{}.igc", fix.date(), fix.timestamp()).ok();
        name
    }

    fn append(&mut self, data: &str) {
        if let Err(error) = self.storage.append(&self.current_file, data.as_bytes()) {
            warn!("flight log append failed: {:?}", error);
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::string::String;
    use std::vec::Vec;

    use crate::config::Settings;
    use crate::protocol::nmea::NmeaDecoder;

    use super::IgcRecorder;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        appends: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl crate::hal::storage::Storage for MemoryStorage {
        type Error = ();

        fn append(&mut self, path: &str, bytes: &[u8]) -> Result<(), ()> {
            let data = String::from_utf8(bytes.to_vec()).unwrap();
            self.appends.borrow_mut().push((path.into(), data));
            Ok(())
        }
    }

    fn decoder_with_speed(knots: f64) -> NmeaDecoder {
        let mut decoder = NmeaDecoder::new();
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
        let rmc = std::format!(
            "$GPRMC,123519,A,4807.038,N,01131.000,E,{:05.1},084.4,230394,003.1,W*6A\r\n",
            knots
        );
        decoder.receive(gga.as_bytes());
        decoder.receive(rmc.as_bytes());
        decoder.receive(b"$");
        decoder
    }

    fn setup() -> (IgcRecorder<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::default();
        let mut recorder = IgcRecorder::new(storage.clone());
        let mut settings = Settings::default();
        settings.pilot_name.push_str("A Pilot").ok();
        settings.glider_model.push_str("Test Wing 42").ok();
        recorder.configure(&settings);
        (recorder, storage)
    }

    #[test]
    fn test_slow_fixes_never_record() {
        let (mut recorder, storage) = setup();
        let decoder = decoder_with_speed(2.0);
        for i in 0..20 {
            recorder.update(i * 1000, decoder.fix(), 545.0);
        }
        assert!(!recorder.recording());
        assert!(storage.appends.borrow().is_empty());
    }

    #[test]
    fn test_takeoff_writes_header_and_buffered_lines() {
        let (mut recorder, storage) = setup();
        let decoder = decoder_with_speed(20.0);
        for i in 0..10 {
            recorder.update(i * 1000, decoder.fix(), 545.0);
        }
        assert!(recorder.recording());
        let appends = storage.appends.borrow();
        assert_eq!(appends.len(), 1);
        let (path, block) = &appends[0];
        assert_eq!(path, "230394_123519.igc");
        assert!(block.starts_with("AXVR001 vario\r\n"));
        assert!(block.contains("HFDTE230394\r\n"));
        assert!(block.contains("HFPLTPILOT:A Pilot\r\n"));
        assert!(block.contains("HFGTYGLIDERTYPE:Test Wing 42\r\n"));
        // every positive-speed entry in the window is flushed
        assert_eq!(block.matches("B123519").count(), 10);
        assert_eq!(recorder.line_count(), 10);
    }

    #[test]
    fn test_steady_recording_appends_one_line_per_tick() {
        let (mut recorder, storage) = setup();
        let decoder = decoder_with_speed(20.0);
        for i in 0..12 {
            recorder.update(i * 1000, decoder.fix(), 500.0 + i as f64);
        }
        let appends = storage.appends.borrow();
        assert_eq!(appends.len(), 3); // start block + two steady lines
        assert_eq!(recorder.line_count(), 12);
        assert_eq!(recorder.highest_altitude(), 511.0);
        assert_eq!(recorder.total_time(), "00:00:12");
    }

    #[test]
    fn test_rate_limit_and_invalid_fix() {
        let (mut recorder, storage) = setup();
        let decoder = decoder_with_speed(20.0);
        for i in 0..50 {
            recorder.update(i * 100, decoder.fix(), 545.0); // 10 Hz polling
        }
        // only every tenth call is eligible, so the window never fills
        assert!(!recorder.recording());
        assert!(storage.appends.borrow().is_empty());

        let mut unfixed = NmeaDecoder::new();
        unfixed.receive(b"$GPGGA,123520,,,,,0,00,,,M,,M,,*66\r\n$");
        let (mut recorder, storage) = setup();
        for i in 0..20 {
            recorder.update(i * 1000, unfixed.fix(), 545.0);
        }
        assert!(storage.appends.borrow().is_empty());
    }

    #[test]
    fn test_landing_stops_and_raises_results() {
        let (mut recorder, _storage) = setup();
        let flying = decoder_with_speed(20.0);
        let landed = decoder_with_speed(0.0);
        let mut now = 0;
        for _ in 0..15 {
            recorder.update(now, flying.fix(), 545.0);
            now += 1000;
        }
        assert!(recorder.recording());
        for _ in 0..10 {
            recorder.update(now, landed.fix(), 545.0);
            now += 1000;
        }
        assert!(!recorder.recording());
        assert!(recorder.show_results());
        recorder.reset();
        assert!(!recorder.show_results());
        assert_eq!(recorder.line_count(), 0);
    }

    #[test]
    fn test_travelled_distance_zero_for_identical_fixes() {
        let (mut recorder, _storage) = setup();
        let decoder = decoder_with_speed(20.0);
        for i in 0..15 {
            recorder.update(i * 1000, decoder.fix(), 545.0);
        }
        assert_eq!(recorder.travelled_distance(), 0.0);
    }
}
