#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate log;

pub mod algorithm;
pub mod components;
pub mod config;
pub mod hal;
pub mod igc;
pub mod protocol;
pub mod sys;

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;
