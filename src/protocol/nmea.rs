//! Decoder for the `$`-delimited NMEA sentence stream produced by the
//! positioning receiver. Only the three sentences the core consumes are
//! recognized; everything else passes through untouched.

use heapless::{String, Vec};

use crate::igc;

const MIN_SENTENCE: usize = 7;
const MAX_SENTENCE: usize = 96;
const MAX_FIELDS: usize = 24;

#[derive(Copy, Clone, Debug, PartialEq)]
enum Sentence {
    PositionFix,        // $GPGGA
    SatelliteStatus,    // $GPGSA
    RecommendedMinimum, // $GPRMC
}

impl Sentence {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "$GPGGA" => Some(Self::PositionFix),
            "$GPGSA" => Some(Self::SatelliteStatus),
            "$GPRMC" => Some(Self::RecommendedMinimum),
            _ => None,
        }
    }
}

/// Most recent decoded positioning state. Superseded field by field as
/// sentences arrive; a sentence missing a field leaves the prior value.
pub struct Fix {
    timestamp: String<6>,   // HHMMSS
    date: String<6>,        // DDMMYY
    latitude: String<9>,    // DDMMmmm + hemisphere
    longitude: String<10>,  // DDDMMmmm + hemisphere
    altitude: String<12>,   // GNSS altitude, meters
    igc_altitude: String<5>,
    accuracy: String<12>, // vertical dilution of precision
    speed: String<12>,    // ground speed, knots
    heading: String<12>,  // degrees true
    fixed: bool,
}

fn set<const N: usize>(field: &mut String<N>, value: &str) {
    field.clear();
    field.push_str(value).ok();
}

fn non_empty(field: &str) -> &str {
    if field.is_empty() {
        "0"
    } else {
        field
    }
}

impl Default for Fix {
    fn default() -> Self {
        let mut fix = Self {
            timestamp: String::new(),
            date: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            altitude: String::new(),
            igc_altitude: String::new(),
            accuracy: String::new(),
            speed: String::new(),
            heading: String::new(),
            fixed: false,
        };
        set(&mut fix.timestamp, "000000");
        set(&mut fix.date, "0");
        fix.reset_values();
        fix
    }
}

impl Fix {
    fn reset_values(&mut self) {
        set(&mut self.igc_altitude, "00000");
        set(&mut self.altitude, "0.0");
        set(&mut self.accuracy, "1000");
        set(&mut self.latitude, "0000000N");
        set(&mut self.longitude, "00000000W");
        set(&mut self.heading, "0.0");
        set(&mut self.speed, "0.0");
    }

    pub fn fixed(&self) -> bool {
        self.fixed
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn date(&self) -> &str {
        non_empty(&self.date)
    }

    pub fn latitude(&self) -> &str {
        non_empty(&self.latitude)
    }

    pub fn longitude(&self) -> &str {
        non_empty(&self.longitude)
    }

    pub fn altitude_field(&self) -> &str {
        non_empty(&self.altitude)
    }

    pub fn igc_altitude(&self) -> &str {
        &self.igc_altitude
    }

    pub fn heading_field(&self) -> &str {
        non_empty(&self.heading)
    }

    pub fn speed_field(&self) -> &str {
        non_empty(&self.speed)
    }

    pub fn altitude_meters(&self) -> f64 {
        self.altitude.parse().unwrap_or(0.0)
    }

    pub fn altitude_accuracy(&self) -> f64 {
        self.accuracy.parse().unwrap_or(0.0)
    }

    pub fn knots(&self) -> f64 {
        self.speed.parse().unwrap_or(0.0)
    }

    pub fn heading_degrees(&self) -> f64 {
        self.heading.parse().unwrap_or(0.0)
    }
}

pub struct NmeaDecoder {
    sentence: String<MAX_SENTENCE>,
    fix: Fix,
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self { sentence: String::new(), fix: Fix::default() }
    }

    pub fn fix(&self) -> &Fix {
        &self.fix
    }

    pub fn receive(&mut self, bytes: &[u8]) {
        for &byte in bytes.iter() {
            self.feed(byte);
        }
    }

    /// A sentence is complete when the next `$` arrives. Non-ASCII line
    /// noise is dropped so field extraction stays on character boundaries.
    pub fn feed(&mut self, byte: u8) {
        if !byte.is_ascii() {
            return;
        }
        if byte == b'$' {
            self.parse();
            self.sentence.clear();
        }
        self.sentence.push(byte as char).ok();
    }

    fn parse(&mut self) {
        if self.sentence.len() < MIN_SENTENCE {
            return;
        }
        let sentence = match Sentence::from_tag(&self.sentence[..6]) {
            Some(sentence) => sentence,
            None => return,
        };
        let mut fields: Vec<&str, MAX_FIELDS> = Vec::new();
        for field in self.sentence.split(',') {
            if fields.push(field).is_err() {
                break;
            }
        }
        match sentence {
            Sentence::PositionFix => Self::handle_gga(&mut self.fix, &fields),
            Sentence::SatelliteStatus => Self::handle_gsa(&mut self.fix, &fields),
            Sentence::RecommendedMinimum => Self::handle_rmc(&mut self.fix, &fields),
        }
    }

    /// `$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47`
    fn handle_gga(fix: &mut Fix, fields: &[&str]) {
        if let Some(time) = fields.get(1) {
            if time.len() > 5 {
                set(&mut fix.timestamp, &time[..6]);
            }
        }
        if let (Some(number), Some(hemisphere)) = (fields.get(2), fields.get(3)) {
            if number.len() > 7 {
                compact_coordinate(&mut fix.latitude, number, 8, hemisphere);
            }
        }
        if let (Some(number), Some(hemisphere)) = (fields.get(4), fields.get(5)) {
            if number.len() > 8 {
                compact_coordinate(&mut fix.longitude, number, 9, hemisphere);
            }
        }
        if let Some(quality) = fields.get(6) {
            fix.fixed = *quality != "0";
            if !fix.fixed {
                fix.reset_values();
            }
        }
        if let Some(altitude) = fields.get(9) {
            let meters = if altitude.is_empty() { "0.0" } else { altitude };
            set(&mut fix.altitude, meters);
            fix.igc_altitude = igc::meters_field(meters);
        }
    }

    /// `$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39` — only the VDOP
    /// tail field is of interest.
    fn handle_gsa(fix: &mut Fix, fields: &[&str]) {
        if let Some(field) = fields.get(17) {
            let accuracy = field.split('*').next().unwrap_or("");
            set(&mut fix.accuracy, if accuracy.is_empty() { "999" } else { accuracy });
        }
    }

    /// `$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A`
    /// Latitude/longitude here are ignored in favor of the fix-quality
    /// sentence's values.
    fn handle_rmc(fix: &mut Fix, fields: &[&str]) {
        if let Some(speed) = fields.get(7) {
            set(&mut fix.speed, speed);
        }
        if let Some(heading) = fields.get(8) {
            set(&mut fix.heading, heading);
        }
        if let Some(date) = fields.get(9) {
            set(&mut fix.date, date);
        }
    }
}

/// Collapses `4807.038` + `N` into the IGC degrees-minutes-fraction form
/// `4807038N`, taking `digits` characters before dropping the point.
fn compact_coordinate<const N: usize>(field: &mut String<N>, number: &str, digits: usize, hemisphere: &str) {
    field.clear();
    for c in number.chars().take(digits) {
        if c != '.' {
            field.push(c).ok();
        }
    }
    field.push_str(hemisphere).ok();
}
