//! High level operations on the DAC board, taking user text as input.
//!
//! Parameter text is validated before anything is written: a rejected value
//! is returned as an error and nothing reaches the port.

use common::command::Command;
use log::info;
use std::path::Path;
use std::time::Duration;

use crate::error::{CommandError, LinkError, UploadError};
use crate::link::{Dispatch, Link};
use crate::upload::{self, UploadReport};

pub struct Controller {
    link: Link,
    single_channel_enabled: bool,
}

fn into_command_error(e: LinkError) -> CommandError {
    match e {
        LinkError::Io(e) => CommandError::Io(e),
        other => CommandError::Io(std::io::Error::other(other)),
    }
}

impl Controller {
    pub fn new(link: Link) -> Self {
        Self {
            link,
            single_channel_enabled: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Single channel selection only makes sense after a channel count of 1 was sent.
    pub fn single_channel_enabled(&self) -> bool {
        self.single_channel_enabled
    }

    fn send(&mut self, command: &Command) -> Result<Dispatch, CommandError> {
        self.link.send(command).map_err(into_command_error)
    }

    pub fn set_sample_rate(&mut self, text: &str) -> Result<Dispatch, CommandError> {
        let command = Command::sample_rate(text)?;
        let dispatch = self.send(&command)?;
        if dispatch == Dispatch::Sent {
            info!("Sample rate set to {} Hz", text);
        }
        Ok(dispatch)
    }

    pub fn set_channel_count(&mut self, text: &str) -> Result<Dispatch, CommandError> {
        let command = Command::channel_count(text)?;
        let dispatch = self.send(&command)?;
        if dispatch == Dispatch::Sent {
            self.single_channel_enabled = command.argument() == Some(1);
            info!("Channel count set to {}", text);
        }
        Ok(dispatch)
    }

    pub fn set_single_channel(&mut self, text: &str) -> Result<Dispatch, CommandError> {
        let command = Command::single_channel(text)?;
        let dispatch = self.send(&command)?;
        if dispatch == Dispatch::Sent {
            info!("Single channel set to {}", text);
        }
        Ok(dispatch)
    }

    pub fn start(&mut self) -> Result<Dispatch, CommandError> {
        self.send(&Command::StartStreaming)
    }

    pub fn stop(&mut self) -> Result<Dispatch, CommandError> {
        self.send(&Command::StopStreaming)
    }

    pub fn status(&mut self) -> Result<Dispatch, CommandError> {
        self.send(&Command::QueryStatus)
    }

    /// Blocks until the whole file is written. Holding `&mut self` keeps any
    /// other write from interleaving with the chunks.
    pub fn upload<F: FnMut(u8)>(
        &mut self,
        source: &Path,
        pacing: Duration,
        progress: F,
    ) -> Result<UploadReport, UploadError> {
        upload::upload(&mut self.link, source, pacing, progress)
    }

    pub fn poll_inbound(&mut self) -> Result<Option<String>, LinkError> {
        self.link.poll_inbound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, TransportLog};
    use common::command::ParameterError;

    fn connected() -> (Controller, TransportLog) {
        let (transport, log) = RecordingTransport::new();
        (Controller::new(Link::with_transport(Box::new(transport))), log)
    }

    #[test]
    fn sample_rate_frames() {
        let (mut ctl, log) = connected();

        assert_eq!(ctl.set_sample_rate("1000").unwrap(), Dispatch::Sent);
        assert_eq!(log.writes(), vec![b"1".to_vec(), b"1000\n".to_vec()]);
    }

    #[test]
    fn parameter_text_goes_out_unchanged() {
        let (mut ctl, log) = connected();

        ctl.set_sample_rate("007").unwrap();
        ctl.set_single_channel("05").unwrap();

        assert_eq!(
            log.writes(),
            vec![b"1".to_vec(), b"007\n".to_vec(), b"6".to_vec(), b"05\n".to_vec()]
        );
    }

    #[test]
    fn non_digit_sample_rate_writes_nothing() {
        let (mut ctl, log) = connected();

        let err = ctl.set_sample_rate("12a3").unwrap_err();

        assert!(matches!(
            err,
            CommandError::InvalidParameter(ParameterError::NotDecimal)
        ));
        assert!(log.writes().is_empty());
    }

    #[test]
    fn channel_count_of_one_enables_single_channel() {
        let (mut ctl, log) = connected();
        assert!(!ctl.single_channel_enabled());

        ctl.set_channel_count("1").unwrap();
        assert!(ctl.single_channel_enabled());

        ctl.set_channel_count("40").unwrap();
        assert!(!ctl.single_channel_enabled());

        assert_eq!(
            log.writes(),
            vec![b"2".to_vec(), b"1\n".to_vec(), b"2".to_vec(), b"40\n".to_vec()]
        );
    }

    #[test]
    fn rejected_channel_count_keeps_enablement() {
        let (mut ctl, _) = connected();
        ctl.set_channel_count("1").unwrap();

        assert!(ctl.set_channel_count("x").is_err());
        assert!(ctl.single_channel_enabled());
    }

    #[test]
    fn single_channel_range_is_enforced() {
        let (mut ctl, log) = connected();

        assert!(ctl.set_single_channel("40").is_err());
        assert!(ctl.set_single_channel("-1").is_err());
        assert!(log.writes().is_empty());

        ctl.set_single_channel("39").unwrap();
        assert_eq!(log.writes(), vec![b"6".to_vec(), b"39\n".to_vec()]);
    }

    #[test]
    fn streaming_commands_are_single_bytes() {
        let (mut ctl, log) = connected();

        ctl.start().unwrap();
        ctl.stop().unwrap();
        ctl.status().unwrap();

        assert_eq!(log.bytes(), b"345".to_vec());
        assert_eq!(log.writes().len(), 3);
    }

    #[test]
    fn disconnected_controller_reports_noop() {
        let mut ctl = Controller::new(Link::disconnected());
        assert!(!ctl.is_connected());

        assert_eq!(ctl.start().unwrap(), Dispatch::NotConnected);
        assert_eq!(ctl.set_channel_count("1").unwrap(), Dispatch::NotConnected);
        assert!(!ctl.single_channel_enabled());
    }
}
