pub mod buzzer;
pub mod storage;
