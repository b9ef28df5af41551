pub mod altimeter;
pub mod beeper;
pub mod recorder;
pub mod vario;
