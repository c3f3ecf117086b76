//! Chunked upload of a binary waveform to the board.
//!
//! The file is read into memory first. The board is then told to enter
//! receive mode with the prepare command, and the whole file is written in chunks of at most 256 bytes with a fixed pause
//! between them. There is no handshake and no resume: a failed upload must be
//! restarted from the prepare command.

use common::command::Command;
use common::wire::UPLOAD_CHUNK_SIZE;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::error::{LinkError, UploadError};
use crate::link::{Dispatch, Link};

/// Progress of one upload. Lives only for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct TransferSession {
    total: usize,
    sent: usize,
}

impl TransferSession {
    pub fn new(total: usize) -> Self {
        Self { total, sent: 0 }
    }

    pub fn advance(&mut self, bytes: usize) {
        self.sent = (self.sent + bytes).min(self.total);
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Completion in whole percent, rounded down. An empty payload is complete.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.sent * 100 / self.total) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub bytes: usize,
    pub chunks: usize,
}

/// Writes `data` to `sink` in order, in chunks, reporting progress after each one.
pub fn send_payload<W, F>(
    sink: &mut W,
    data: &[u8],
    pacing: Duration,
    mut progress: F,
) -> io::Result<UploadReport>
where
    W: Write + ?Sized,
    F: FnMut(u8),
{
    let mut session = TransferSession::new(data.len());
    let mut chunks = 0;

    for chunk in data.chunks(UPLOAD_CHUNK_SIZE) {
        if chunks > 0 && !pacing.is_zero() {
            thread::sleep(pacing);
        }
        sink.write_all(chunk)?;
        session.advance(chunk.len());
        chunks += 1;
        progress(session.percent());
    }
    sink.flush()?;
    progress(100);

    debug!("Sent {} bytes in {} chunks", session.sent(), chunks);
    Ok(UploadReport {
        bytes: session.sent(),
        chunks,
    })
}

pub fn upload<F: FnMut(u8)>(
    link: &mut Link,
    source: &Path,
    pacing: Duration,
    progress: F,
) -> Result<UploadReport, UploadError> {
    if !source.exists() {
        return Err(UploadError::SourceMissing(source.to_path_buf()));
    }
    if !link.is_connected() {
        return Err(UploadError::NotConnected);
    }

    // Nothing is written until the whole source has been read
    let data = fs::read(source).map_err(|e| UploadError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    })?;

    match link.send(&Command::PrepareUpload) {
        Ok(Dispatch::Sent) => {}
        Ok(Dispatch::NotConnected) => return Err(UploadError::NotConnected),
        Err(LinkError::Io(e)) => return Err(UploadError::Failed(e)),
        Err(other) => return Err(UploadError::Failed(io::Error::other(other))),
    }

    info!("Uploading {} ({} bytes)", source.display(), data.len());

    let transport = link.transport_mut().ok_or(UploadError::NotConnected)?;
    let report = send_payload(transport, &data, pacing, progress).map_err(UploadError::Failed)?;

    info!("Upload complete");
    Ok(report)
}
