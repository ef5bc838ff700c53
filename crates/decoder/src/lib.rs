//! # Roster Decoder
//!
//! Turns a header-bearing, delimited roster file into an ordered list of
//! [`StudentRecord`]s.
//!
//! Columns are mapped by position (name, age, grade, gender) rather than by
//! header text, so files with localized headers decode the same way. Rows that
//! fail to decode are either collected and skipped or end the run, depending
//! on the [`MalformedRowPolicy`].

pub mod error;

pub use error::DecodeError;

use core_types::{DecodeFailure, MalformedRowPolicy, StudentRecord};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io;
use std::path::Path;

/// Number of columns every roster row must have.
pub const EXPECTED_COLUMNS: usize = 4;

/// The result of decoding one input source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Successfully decoded rows, in file order.
    pub records: Vec<StudentRecord>,
    /// Rows that were dropped, in file order.
    pub failures: Vec<DecodeFailure>,
}

impl DecodeOutcome {
    /// Number of data rows read, excluding the header.
    pub fn rows_seen(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    delimiter: u8,
    policy: MalformedRowPolicy,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(b',', MalformedRowPolicy::default())
    }
}

impl Decoder {
    pub fn new(delimiter: u8, policy: MalformedRowPolicy) -> Self {
        Self { delimiter, policy }
    }

    /// Opens `path` and decodes it. A missing or unreadable file is fatal.
    pub fn decode_path(&self, path: &Path) -> Result<DecodeOutcome, DecodeError> {
        let file = File::open(path).map_err(|source| DecodeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Decoding roster file.");
        self.decode_reader(file)
    }

    /// Decodes every data row from `reader`.
    ///
    /// Empty input (not even a header) is not an error and yields an empty outcome.
    pub fn decode_reader<R: io::Read>(&self, reader: R) -> Result<DecodeOutcome, DecodeError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header_len = rdr.byte_headers()?.len();
        if header_len != 0 && header_len != EXPECTED_COLUMNS {
            tracing::warn!(
                columns = header_len,
                expected = EXPECTED_COLUMNS,
                "Header has an unexpected number of columns; decoding by position anyway."
            );
        }

        let mut outcome = DecodeOutcome::default();
        let mut raw = ByteRecord::new();
        loop {
            match rdr.read_byte_record(&mut raw) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(DecodeError::Io(e)),
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or_default();
                    self.reject(&mut outcome, line, String::new(), e.to_string())?;
                    continue;
                }
            }

            let line = raw.position().map(|p| p.line()).unwrap_or_default();
            match decode_row(&raw) {
                Ok(record) => outcome.records.push(record),
                Err(reason) => {
                    let rendered = self.render(&raw);
                    self.reject(&mut outcome, line, rendered, reason)?;
                }
            }
        }

        tracing::info!(
            decoded = outcome.records.len(),
            dropped = outcome.failures.len(),
            "Finished decoding roster."
        );
        Ok(outcome)
    }

    /// Applies the malformed-row policy to a row that failed to decode.
    fn reject(
        &self,
        outcome: &mut DecodeOutcome,
        line: u64,
        raw: String,
        reason: String,
    ) -> Result<(), DecodeError> {
        let failure = DecodeFailure { line, raw, reason };
        if self.policy.is_fatal() {
            return Err(DecodeError::MalformedRow(failure));
        }
        tracing::warn!(line = failure.line, reason = %failure.reason, "Skipping malformed row.");
        outcome.failures.push(failure);
        Ok(())
    }

    fn render(&self, raw: &ByteRecord) -> String {
        let separator = (self.delimiter as char).to_string();
        raw.iter()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

/// Converts one raw row into a record, or explains why it can't be.
fn decode_row(raw: &ByteRecord) -> Result<StudentRecord, String> {
    if raw.len() != EXPECTED_COLUMNS {
        return Err(format!(
            "expected {EXPECTED_COLUMNS} fields, found {}",
            raw.len()
        ));
    }
    let record = StringRecord::from_byte_record(raw.clone())
        .map_err(|e| format!("row is not valid UTF-8: {}", e.utf8_error()))?;
    // No headers are passed, so fields bind to struct members by position.
    record
        .deserialize::<StudentRecord>(None)
        .map_err(|e| match e.kind() {
            csv::ErrorKind::Deserialize { err, .. } => match err.field() {
                Some(field) => format!("field {}: {}", field + 1, err.kind()),
                None => err.kind().to_string(),
            },
            _ => e.to_string(),
        })
}
