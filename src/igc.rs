//! IGC-style flight-log records: fixed-width B-record encoding plus the
//! coordinate math the post-flight statistics need.

use core::fmt::Write;

use heapless::String;
use libm::{asin, cos, sin, sqrt};

use crate::protocol::nmea::Fix;

/// Length of a well-formed B record:
/// `B` + time(6) + latitude(8) + longitude(9) + `A` + baro(5) + gnss(5).
pub const RECORD_LENGTH: usize = 35;

/// Marker prefixing a record that failed the length check. The record is
/// kept rather than dropped to preserve evidence for debugging.
pub const BAD_RECORD_MARKER: &str = "BAD - ";

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Renders a meter value as the 5-digit zero-padded IGC altitude field.
/// Anything after a decimal point is dropped, not rounded.
pub fn meters_field(meters: &str) -> String<5> {
    let integer = meters.split('.').next().unwrap_or("0");
    let integer = &integer[..integer.len().min(5)];
    let mut field = String::new();
    for _ in integer.len()..5 {
        field.push('0').ok();
    }
    field.push_str(integer).ok();
    field
}

/// Encodes the current fix and barometric altitude as a B record. A record
/// of unexpected total length is flagged with [`BAD_RECORD_MARKER`].
pub fn encode(fix: &Fix, baro_meters: f64) -> String<48> {
    let mut meters: String<16> = String::new();
    write!(meters, "{}", baro_meters).ok();

    let mut record: String<48> = String::new();
    record.push('B').ok();
    record.push_str(fix.timestamp()).ok();
    record.push_str(fix.latitude()).ok();
    record.push_str(fix.longitude()).ok();
    record.push('A').ok();
    record.push_str(&meters_field(&meters)).ok();
    record.push_str(fix.igc_altitude()).ok();
    if record.len() != RECORD_LENGTH {
        let mut flagged: String<48> = String::new();
        flagged.push_str(BAD_RECORD_MARKER).ok();
        flagged.push_str(&record).ok();
        return flagged;
    }
    record
}

/// Latitude and longitude fields of a B record, in decimal degrees.
pub fn record_coordinates(record: &str) -> (f64, f64) {
    let latitude = record.get(7..15).map(coordinate_to_decimal).unwrap_or(0.0);
    let longitude = record.get(15..24).map(coordinate_to_decimal).unwrap_or(0.0);
    (latitude, longitude)
}

/// Converts a compact degrees-minutes-fraction field (`3718157N` or
/// `12153538W`) to decimal degrees, negative for south/west.
pub fn coordinate_to_decimal(point: &str) -> f64 {
    if point == "0" {
        return 0.0;
    }
    let sign = if point.contains('S') || point.contains('W') { -1.0 } else { 1.0 };
    let (degrees, minutes, fraction) = if point.len() == 8 {
        (number(point, 0, 2), number(point, 2, 4), number(point, 4, 7))
    } else {
        (number(point, 0, 3), number(point, 3, 5), number(point, 5, 8))
    };
    (degrees + (minutes + fraction / 1000.0) / 60.0) * sign
}

fn number(point: &str, start: usize, end: usize) -> f64 {
    point.get(start..end).and_then(|s| s.parse().ok()).unwrap_or(0.0)
}

/// Great-circle distance between two points in kilometers, by the haversine
/// formula.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1r = radians(lat1);
    let lat2r = radians(lat2);
    let u = sin((lat2r - lat1r) / 2.0);
    let v = sin((radians(lon2) - radians(lon1)) / 2.0);
    2.0 * EARTH_RADIUS_KM * asin(sqrt(u * u + cos(lat1r) * cos(lat2r) * v * v))
}

fn radians(degrees: f64) -> f64 {
    degrees * core::f64::consts::PI / 180.0
}

#[cfg(test)]
mod test {
    use crate::protocol::nmea::NmeaDecoder;

    #[test]
    fn test_meters_field() {
        assert_eq!(super::meters_field("545.4"), "00545");
        assert_eq!(super::meters_field("0.0"), "00000");
        assert_eq!(super::meters_field("12345"), "12345");
    }

    #[test]
    fn test_encode_record() {
        let mut decoder = NmeaDecoder::new();
        decoder
            .receive(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n$");
        let record = super::encode(decoder.fix(), 532.8);
        assert_eq!(&record, "B1235194807038N01131000EA0053200545");
        assert_eq!(record.len(), super::RECORD_LENGTH);
    }

    #[test]
    fn test_bad_record_flagged() {
        let decoder = NmeaDecoder::new();
        // the empty date/latitude sentinels still form a valid-length record
        let record = super::encode(decoder.fix(), 0.0);
        assert_eq!(record.len(), super::RECORD_LENGTH);

        let mut decoder = NmeaDecoder::new();
        // a blank hemisphere leaves the latitude one character short, so
        // the record cannot reach full length
        decoder.receive(b"$GPGGA,123519,4807.038,,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n$");
        let record = super::encode(decoder.fix(), 532.8);
        assert!(record.starts_with(super::BAD_RECORD_MARKER));
    }

    #[test]
    fn test_coordinate_round_trip() {
        let mut decoder = NmeaDecoder::new();
        decoder
            .receive(b"$GPGGA,123519,3718.157,N,12153.538,W,1,08,0.9,545.4,M,46.9,M,,*47\r\n$");
        let record = super::encode(decoder.fix(), 545.4);
        let (latitude, longitude) = super::record_coordinates(&record);
        assert!((latitude - (37.0 + 18.157 / 60.0)).abs() < 1e-9);
        assert!((longitude + (121.0 + 53.538 / 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_properties() {
        assert_eq!(super::distance_km(37.0, -121.0, 37.0, -121.0), 0.0);
        let one_degree = super::distance_km(37.0, -121.0, 38.0, -121.0);
        assert!((one_degree - 111.2).abs() < 0.3);
    }
}
