pub mod nmea;
