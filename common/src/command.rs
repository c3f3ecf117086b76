//! Command protocol understood by the DAC firmware.
//!
//! Every command is a single ASCII character. Commands that carry a number
//! (sample rate, channel count, single channel index) are followed by a
//! second write containing the decimal text, as typed, and a newline. The
//! firmware sends no acknowledgement.

use heapless::String;
use thiserror::Error;

use crate::wire::MAX_CHANNELS;

pub const CMD_SAMPLE_RATE: u8 = b'1';
pub const CMD_CHANNEL_COUNT: u8 = b'2';
pub const CMD_START: u8 = b'3';
pub const CMD_STOP: u8 = b'4';
pub const CMD_STATUS: u8 = b'5';
pub const CMD_SINGLE_CHANNEL: u8 = b'6';
pub const CMD_PREPARE_UPLOAD: u8 = b'U';

// Leading zeros are kept, so this is larger than the 10 digits of u32::MAX
pub const MAX_ARGUMENT_DIGITS: usize = 20;
pub const MAX_ARGUMENT_LINE: usize = MAX_ARGUMENT_DIGITS + 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("parameter must only contain decimal digits")]
    NotDecimal,
    #[error("parameter does not fit in 32 bits")]
    Overflow,
    #[error("parameter is longer than {max} digits")]
    TooLong { max: usize },
    #[error("parameter {value} is outside of {min}..={max}")]
    OutOfRange { value: u32, min: u32, max: u32 },
}

/// Accepts text made only of ASCII digits (at least one).
pub fn parse_decimal(text: &str) -> Result<u32, ParameterError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParameterError::NotDecimal);
    }
    // Only digits left, so the parse can only fail by overflowing
    text.parse().map_err(|_| ParameterError::Overflow)
}

/// A validated decimal parameter. The text goes on the wire unchanged, the
/// value is what range checks look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    value: u32,
    text: String<MAX_ARGUMENT_DIGITS>,
}

impl Decimal {
    pub fn parse(text: &str) -> Result<Self, ParameterError> {
        let value = parse_decimal(text)?;
        let mut digits = String::new();
        digits.push_str(text).map_err(|_| ParameterError::TooLong {
            max: MAX_ARGUMENT_DIGITS,
        })?;
        Ok(Self {
            value,
            text: digits,
        })
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetSampleRate(Decimal),
    SetChannelCount(Decimal),
    StartStreaming,
    StopStreaming,
    QueryStatus,
    SelectSingleChannel(Decimal),
    PrepareUpload,
}

impl Command {
    pub fn sample_rate(text: &str) -> Result<Self, ParameterError> {
        Ok(Command::SetSampleRate(Decimal::parse(text)?))
    }

    pub fn channel_count(text: &str) -> Result<Self, ParameterError> {
        Ok(Command::SetChannelCount(Decimal::parse(text)?))
    }

    pub fn single_channel(text: &str) -> Result<Self, ParameterError> {
        let channel = Decimal::parse(text)?;
        let max = (MAX_CHANNELS - 1) as u32;
        if channel.value() > max {
            return Err(ParameterError::OutOfRange {
                value: channel.value(),
                min: 0,
                max,
            });
        }
        Ok(Command::SelectSingleChannel(channel))
    }

    pub const fn code(&self) -> u8 {
        match self {
            Command::SetSampleRate(_) => CMD_SAMPLE_RATE,
            Command::SetChannelCount(_) => CMD_CHANNEL_COUNT,
            Command::StartStreaming => CMD_START,
            Command::StopStreaming => CMD_STOP,
            Command::QueryStatus => CMD_STATUS,
            Command::SelectSingleChannel(_) => CMD_SINGLE_CHANNEL,
            Command::PrepareUpload => CMD_PREPARE_UPLOAD,
        }
    }

    fn parameter(&self) -> Option<&Decimal> {
        match self {
            Command::SetSampleRate(d)
            | Command::SetChannelCount(d)
            | Command::SelectSingleChannel(d) => Some(d),
            _ => None,
        }
    }

    pub fn argument(&self) -> Option<u32> {
        self.parameter().map(Decimal::value)
    }

    /// The second write of a command frame, `"<digits>\n"`, if the command has one.
    pub fn argument_line(&self) -> Option<String<MAX_ARGUMENT_LINE>> {
        let digits = self.parameter()?;
        let mut line = String::new();
        line.push_str(digits.as_str()).ok()?;
        line.push('\n').ok()?;
        Some(line)
    }
}
