use std::path::PathBuf;
use std::time::Duration;

// Serial profile of the DAC board
pub const DEFAULT_BAUD: u32 = 921_600;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

// Inbound data is polled on this cadence, reading only what is buffered
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

// Constant send-side delay between upload chunks, the firmware performs no handshake
pub const DEFAULT_PACING: Duration = Duration::from_millis(2);

/// Conversion writes here and upload reads from here, relative to the working directory
pub const DEFAULT_BIN_NAME: &str = "all_channels.bin";

#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub port: String,
    pub baud: u32,
    pub timeout: Duration,
}

impl LinkSettings {
    pub fn new(port: String) -> Self {
        Self {
            port,
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub source: PathBuf,
    pub pacing: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_BIN_NAME),
            pacing: DEFAULT_PACING,
        }
    }
}
