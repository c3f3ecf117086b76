//! Serial link towards the DAC board.
//!
//! The link owns at most one open transport. Writes go out in call order,
//! and the firmware never acknowledges, so a command is done once written.

use common::command::Command;
use log::{debug, info};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, ErrorKind, Read, Write};

use crate::error::LinkError;
use crate::settings::LinkSettings;

/// Byte channel to the board. Reads must not block when `bytes_available` is 0.
pub trait Transport: Read + Write + Send {
    fn bytes_available(&mut self) -> io::Result<usize>;
}

impl Transport for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.bytes_to_read()? as usize)
    }
}

/// Called after every command frame is written. The firmware does not reply
/// today, so the default does nothing, but a handshake can be plugged here.
pub trait Acknowledge: Send {
    fn await_ack(&mut self, transport: &mut dyn Transport, command: &Command) -> io::Result<()>;
}

pub struct NoAck;

impl Acknowledge for NoAck {
    fn await_ack(&mut self, _: &mut dyn Transport, _: &Command) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    // No open transport, nothing was written
    NotConnected,
}

pub struct Link {
    transport: Option<Box<dyn Transport>>,
    ack: Box<dyn Acknowledge>,
}

impl Link {
    pub fn disconnected() -> Self {
        Self {
            transport: None,
            ack: Box::new(NoAck),
        }
    }

    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Some(transport),
            ack: Box::new(NoAck),
        }
    }

    pub fn open(settings: &LinkSettings) -> Result<Self, LinkError> {
        let port = serialport::new(&settings.port, settings.baud)
            .timeout(settings.timeout)
            .flow_control(FlowControl::None)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .data_bits(DataBits::Eight)
            .open()
            .map_err(|source| LinkError::Open {
                port: settings.port.clone(),
                source,
            })?;

        info!("Connected to {} at {} baud", settings.port, settings.baud);
        Ok(Self::with_transport(Box::new(port)))
    }

    pub fn set_ack(&mut self, ack: Box<dyn Acknowledge>) {
        self.ack = ack;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Link closed");
        }
    }

    pub fn transport_mut(&mut self) -> Option<&mut (dyn Transport + 'static)> {
        self.transport.as_deref_mut()
    }

    /// Writes a command frame: the command character, then the argument
    /// line as a separate write if the command carries one.
    pub fn send(&mut self, command: &Command) -> Result<Dispatch, LinkError> {
        let Some(transport) = self.transport.as_deref_mut() else {
            debug!("Dropping {:?}, link not connected", command);
            return Ok(Dispatch::NotConnected);
        };

        transport.write_all(&[command.code()])?;
        if let Some(line) = command.argument_line() {
            transport.write_all(line.as_bytes())?;
        }
        transport.flush()?;
        debug!("Sent {:?}", command);

        self.ack.await_ack(transport, command)?;
        Ok(Dispatch::Sent)
    }

    /// Returns whatever inbound text is already buffered, without waiting for more.
    pub fn poll_inbound(&mut self) -> Result<Option<String>, LinkError> {
        let Some(transport) = self.transport.as_deref_mut() else {
            return Ok(None);
        };

        let available = transport.bytes_available()?;
        if available == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; available];
        let read = match transport.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => 0,
            Err(e) => return Err(e.into()),
        };
        if read == 0 {
            return Ok(None);
        }

        buf.truncate(read);
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use std::sync::{Arc, Mutex};

    #[test]
    fn argument_goes_in_second_write() {
        let (transport, log) = RecordingTransport::new();
        let mut link = Link::with_transport(Box::new(transport));

        let outcome = link.send(&Command::sample_rate("1000").unwrap()).unwrap();

        assert_eq!(outcome, Dispatch::Sent);
        assert_eq!(log.writes(), vec![b"1".to_vec(), b"1000\n".to_vec()]);
    }

    #[test]
    fn plain_command_is_one_byte() {
        let (transport, log) = RecordingTransport::new();
        let mut link = Link::with_transport(Box::new(transport));

        link.send(&Command::QueryStatus).unwrap();
        link.send(&Command::StartStreaming).unwrap();

        assert_eq!(log.writes(), vec![b"5".to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn disconnected_send_is_a_reported_noop() {
        let mut link = Link::disconnected();
        assert_eq!(
            link.send(&Command::StopStreaming).unwrap(),
            Dispatch::NotConnected
        );
        assert!(link.poll_inbound().unwrap().is_none());
    }

    #[test]
    fn closed_link_stops_writing() {
        let (transport, log) = RecordingTransport::new();
        let mut link = Link::with_transport(Box::new(transport));
        link.close();

        assert_eq!(
            link.send(&Command::QueryStatus).unwrap(),
            Dispatch::NotConnected
        );
        assert!(log.writes().is_empty());
    }

    #[test]
    fn write_error_is_surfaced() {
        let (mut transport, _) = RecordingTransport::new();
        transport.fail_after(0);
        let mut link = Link::with_transport(Box::new(transport));

        assert!(matches!(
            link.send(&Command::QueryStatus),
            Err(LinkError::Io(_))
        ));
    }

    #[test]
    fn ack_hook_runs_after_each_frame() {
        struct Counting(Arc<Mutex<Vec<u8>>>);
        impl Acknowledge for Counting {
            fn await_ack(&mut self, _: &mut dyn Transport, command: &Command) -> io::Result<()> {
                self.0.lock().unwrap().push(command.code());
                Ok(())
            }
        }

        let (transport, _) = RecordingTransport::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut link = Link::with_transport(Box::new(transport));
        link.set_ack(Box::new(Counting(seen.clone())));

        link.send(&Command::channel_count("40").unwrap()).unwrap();
        link.send(&Command::QueryStatus).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![b'2', b'5']);
    }

    #[test]
    fn poll_reads_only_buffered_bytes() {
        let (transport, log) = RecordingTransport::new();
        let mut link = Link::with_transport(Box::new(transport));

        assert!(link.poll_inbound().unwrap().is_none());

        log.push_inbound(b"rate=1000\n");
        assert_eq!(link.poll_inbound().unwrap().as_deref(), Some("rate=1000\n"));
        assert!(link.poll_inbound().unwrap().is_none());
    }

    #[test]
    fn poll_decodes_lossily() {
        let (transport, log) = RecordingTransport::new();
        let mut link = Link::with_transport(Box::new(transport));

        log.push_inbound(&[b'o', b'k', 0xFF]);
        let text = link.poll_inbound().unwrap().unwrap();
        assert!(text.starts_with("ok"));
    }
}
