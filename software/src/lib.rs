//! Host side controller for the multichannel DAC board.
//!
//! The board takes single character commands over serial, optionally
//! followed by a decimal argument line, and plays back waveforms uploaded as
//! raw big-endian 16 bit codes. Waveforms are recorded as CSV voltage logs
//! and converted here before upload.

pub mod console;
pub mod control;
pub mod convert;
pub mod error;
pub mod link;
pub mod monitor;
pub mod settings;
pub mod upload;

#[cfg(test)]
mod testing;
