//! Conversion of recorded voltage logs (CSV) into the binary waveform the
//! firmware plays back.
//!
//! The first CSV row is a header and is discarded unread. Every other row is
//! a sample index followed by one voltage per channel. Rows can be narrower
//! than the board; each row emits exactly as many codes as it has voltage
//! columns. A cell that does not parse reuses the last voltage accepted on
//! that channel (0V before any), so one bad cell never aborts a run.

use common::dac::voltage_to_dac;
use common::wire::{CODE_WIDTH, MAX_CHANNELS, encode_code};
use csv::{ByteRecord, ReaderBuilder};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::ConvertError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub rows_written: usize,
    pub rows_skipped: usize,
    pub cells_substituted: usize,
    pub bytes_written: usize,
}

/// Last accepted voltage of every channel, for carrying values forward.
#[derive(Debug, Clone)]
pub struct ChannelState {
    last: [f64; MAX_CHANNELS],
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            last: [0.0; MAX_CHANNELS],
        }
    }
}

impl ChannelState {
    pub fn last(&self, channel: usize) -> f64 {
        self.last[channel]
    }
}

// Blank, garbage, non UTF-8 and NaN cells all count as unparsable
fn parse_voltage(cell: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(cell).ok()?.trim();
    let voltage: f64 = text.parse().ok()?;
    if voltage.is_nan() { None } else { Some(voltage) }
}

#[derive(Default)]
pub struct Converter {
    state: ChannelState,
    report: ConversionReport,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn report(&self) -> ConversionReport {
        self.report
    }

    /// Appends the codes of one data row to `out`. Returns false if the row
    /// had no voltage columns and was skipped.
    pub fn push_row(
        &mut self,
        row: usize,
        record: &ByteRecord,
        out: &mut Vec<u8>,
    ) -> Result<bool, ConvertError> {
        let num_voltage_cols = record.len().saturating_sub(1);
        if num_voltage_cols == 0 {
            warn!("Skipping row {} - no voltage columns", row);
            self.report.rows_skipped += 1;
            return Ok(false);
        }
        if num_voltage_cols > MAX_CHANNELS {
            return Err(ConvertError::TooManyChannels {
                row,
                columns: num_voltage_cols,
                max: MAX_CHANNELS,
            });
        }

        // Column 0 is the sample index
        for (ch, cell) in record.iter().skip(1).enumerate() {
            let voltage = match parse_voltage(cell) {
                Some(v) => {
                    self.state.last[ch] = v;
                    v
                }
                None => {
                    debug!(
                        "Row {} channel {}: unparsable cell {:?}, reusing {}V",
                        row,
                        ch,
                        String::from_utf8_lossy(cell),
                        self.state.last[ch]
                    );
                    self.report.cells_substituted += 1;
                    self.state.last[ch]
                }
            };
            out.extend_from_slice(&encode_code(voltage_to_dac(voltage)));
        }

        self.report.rows_written += 1;
        self.report.bytes_written += num_voltage_cols * CODE_WIDTH;
        Ok(true)
    }
}

fn read_error(e: csv::Error) -> ConvertError {
    let io_kind = match e.kind() {
        csv::ErrorKind::Io(source) => Some(source.kind()),
        _ => None,
    };
    match io_kind {
        Some(kind) => ConvertError::Read(io::Error::new(kind, e)),
        None => ConvertError::Csv(e),
    }
}

/// Converts a whole CSV stream in a single forward pass, writing codes to `sink`.
pub fn convert<R: Read, W: Write>(source: R, mut sink: W) -> Result<ConversionReport, ConvertError> {
    // The csv reader skips blank lines, but a blank first line is still the
    // header, so the first line is looked at before handing over the rest.
    let mut source = BufReader::new(source);
    let mut first_line = Vec::new();
    if source
        .read_until(b'\n', &mut first_line)
        .map_err(ConvertError::Read)?
        == 0
    {
        return Err(ConvertError::EmptySource);
    }
    let blank_header = first_line == b"\n" || first_line == b"\r\n";
    let replay: &[u8] = if blank_header { &[] } else { &first_line };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(replay.chain(source));
    let mut records = reader.byte_records();

    if !blank_header {
        match records.next() {
            None => return Err(ConvertError::EmptySource),
            Some(header) => {
                header.map_err(read_error)?;
            }
        }
    }

    let mut converter = Converter::new();
    let mut row_bytes = Vec::with_capacity(MAX_CHANNELS * CODE_WIDTH);
    for (row, record) in records.enumerate() {
        let record = record.map_err(read_error)?;
        row_bytes.clear();
        if converter.push_row(row, &record, &mut row_bytes)? {
            sink.write_all(&row_bytes).map_err(ConvertError::Write)?;
        }
    }
    sink.flush().map_err(ConvertError::Write)?;

    Ok(converter.report())
}

/// Convenience wrapper over [`convert`] for in-memory use.
pub fn convert_to_vec<R: Read>(source: R) -> Result<Vec<u8>, ConvertError> {
    let mut out = Vec::new();
    convert(source, &mut out)?;
    Ok(out)
}

pub fn convert_file(csv_path: &Path, bin_path: &Path) -> Result<ConversionReport, ConvertError> {
    let source = File::open(csv_path).map_err(|source| ConvertError::ReadSource {
        path: csv_path.to_path_buf(),
        source,
    })?;
    let output = File::create(bin_path).map_err(|source| ConvertError::WriteOutput {
        path: bin_path.to_path_buf(),
        source,
    })?;

    info!("Converting {} into {}", csv_path.display(), bin_path.display());
    let report = convert(source, BufWriter::new(output)).map_err(|e| match e {
        ConvertError::Read(source) => ConvertError::ReadSource {
            path: csv_path.to_path_buf(),
            source,
        },
        ConvertError::Write(source) => ConvertError::WriteOutput {
            path: bin_path.to_path_buf(),
            source,
        },
        other => other,
    })?;

    info!(
        "Wrote {} rows ({} bytes), skipped {} rows, substituted {} cells",
        report.rows_written, report.bytes_written, report.rows_skipped, report.cells_substituted
    );
    Ok(report)
}
