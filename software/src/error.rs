use common::command::ParameterError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("failed to send command: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed reading source: {0}")]
    Read(#[source] io::Error),
    #[error("failed writing output: {0}")]
    Write(#[source] io::Error),
    #[error("source has no header row")]
    EmptySource,
    #[error("row {row} has {columns} voltage columns, the board only has {max}")]
    TooManyChannels { row: usize, columns: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("binary file {0} not found, convert a CSV first")]
    SourceMissing(PathBuf),
    #[error("cannot read binary file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serial port not connected")]
    NotConnected,
    #[error("upload failed: {0}")]
    Failed(#[source] io::Error),
}
