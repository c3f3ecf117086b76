//! Shared definitions between the host tool and the DAC firmware: the
//! voltage quantizer, the command protocol and the binary waveform layout.

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod dac;
pub mod wire;
