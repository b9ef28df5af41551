pub mod kalman;
pub mod lpf;
pub mod piecewise;
