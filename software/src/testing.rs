// In-memory transport used by the unit tests. Every write call is kept
// separately so command framing can be checked.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use crate::link::Transport;

#[derive(Default)]
struct Shared {
    writes: Vec<Vec<u8>>,
    inbound: VecDeque<u8>,
    flushes: usize,
}

pub struct RecordingTransport {
    shared: Arc<Mutex<Shared>>,
    fail_after: Option<usize>,
    max_write: Option<usize>,
}

/// Handle that stays with the test after the transport is moved into a link.
#[derive(Clone)]
pub struct TransportLog {
    shared: Arc<Mutex<Shared>>,
}

impl RecordingTransport {
    pub fn new() -> (Self, TransportLog) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let transport = Self {
            shared: shared.clone(),
            fail_after: None,
            max_write: None,
        };
        (transport, TransportLog { shared })
    }

    /// Write calls after the first `writes` ones fail.
    pub fn fail_after(&mut self, writes: usize) {
        self.fail_after = Some(writes);
    }

    /// Accept at most `bytes` per write call, like a congested port would.
    pub fn short_writes(&mut self, bytes: usize) {
        self.max_write = Some(bytes);
    }
}

impl Write for RecordingTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock().unwrap();
        if let Some(limit) = self.fail_after {
            if shared.writes.len() >= limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "port unplugged"));
            }
        }
        let n = self.max_write.map_or(buf.len(), |max| buf.len().min(max));
        shared.writes.push(buf[..n].to_vec());
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.shared.lock().unwrap().flushes += 1;
        Ok(())
    }
}

impl Read for RecordingTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock().unwrap();
        let n = buf.len().min(shared.inbound.len());
        for (dst, src) in buf.iter_mut().zip(shared.inbound.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }
}

impl Transport for RecordingTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.shared.lock().unwrap().inbound.len())
    }
}

impl TransportLog {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.shared.lock().unwrap().writes.clone()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.writes().concat()
    }

    pub fn flushes(&self) -> usize {
        self.shared.lock().unwrap().flushes
    }

    pub fn push_inbound(&self, data: &[u8]) {
        self.shared.lock().unwrap().inbound.extend(data);
    }
}
