//! Trace file codec and the file-export driver
//!
//! One line per operation, comma separated, keys zero-padded to ten digits:
//!
//! ```text
//! 0,<key>                 READ
//! 1,<key>[,<value>]       WRITE (insert or update)
//! 2,<key>,<scan_length>   SCAN
//! ```
//!
//! Values may themselves contain commas, so a WRITE line is split at most
//! twice and everything after the second comma is the value.
//!
//! # Example
//!
//! ```
//! use tracegen_common::Operation;
//! use tracegen_core::export::{encode_line, parse_line};
//!
//! let line = encode_line(&Operation::scan(42, 7)).unwrap();
//! assert_eq!(line, "2,0000000042,7");
//! assert_eq!(parse_line(&line).unwrap(), Operation::scan(42, 7));
//! ```

use crate::error::{Error, Result};
use crate::progress::ProgressHandle;
use crate::workload::WorkloadGenerator;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracegen_common::{Operation, OperationType};

/// Minimum printed width of a key.
pub const KEY_WIDTH: usize = 10;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Render one operation as a trace line (without the trailing newline).
pub fn encode_line(op: &Operation) -> Result<String> {
    let code = op.kind.code();
    match op.kind {
        OperationType::Read => Ok(format!("{code},{:0width$}", op.key, width = KEY_WIDTH)),
        OperationType::Write => match op.value.as_deref() {
            Some(value) if !value.is_empty() => {
                Ok(format!("{code},{:0width$},{value}", op.key, width = KEY_WIDTH))
            }
            _ => Ok(format!("{code},{:0width$}", op.key, width = KEY_WIDTH)),
        },
        OperationType::Scan => {
            Ok(format!("{code},{:0width$},{}", op.key, op.scan_length, width = KEY_WIDTH))
        }
        OperationType::Update | OperationType::Delete => {
            Err(Error::Other(format!("{} operations have no trace encoding", op.kind)))
        }
    }
}

/// Parse one trace line back into an operation.
pub fn parse_line(line: &str) -> Result<Operation> {
    let parse_error = |reason: String| Error::Parse { line: line.to_string(), reason };

    let mut fields = line.splitn(3, ',');
    let code = fields.next().unwrap_or_default();
    let key = fields.next().ok_or_else(|| parse_error("missing key".into()))?;
    let rest = fields.next();

    let code: u8 = code.parse().map_err(|_| parse_error(format!("bad operation code '{code}'")))?;
    let kind = OperationType::from_code(code)
        .ok_or_else(|| parse_error(format!("unknown operation code {code}")))?;

    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(parse_error(format!("bad key '{key}'")));
    }
    let key: u64 = key.parse().map_err(|_| parse_error(format!("key '{key}' out of range")))?;

    match (kind, rest) {
        (OperationType::Read, None) => Ok(Operation::read(key)),
        (OperationType::Read, Some(_)) => Err(parse_error("READ takes no further fields".into())),
        (OperationType::Write, value) => {
            Ok(Operation::write(key, value.filter(|v| !v.is_empty()).map(str::to_string)))
        }
        (OperationType::Scan, Some(length)) => {
            let length = length
                .parse()
                .map_err(|_| parse_error(format!("bad scan length '{length}'")))?;
            Ok(Operation::scan(key, length))
        }
        (OperationType::Scan, None) => Err(parse_error("SCAN requires a length".into())),
        (kind, _) => Err(parse_error(format!("{kind} never appears in a trace"))),
    }
}

/// Buffered line writer counting the records it has written
pub struct TraceWriter<W: Write> {
    inner: BufWriter<W>,
    records: u64,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: BufWriter::with_capacity(WRITE_BUFFER_SIZE, inner), records: 0 }
    }

    pub fn write_operation(&mut self, op: &Operation) -> Result<()> {
        let line = encode_line(op)?;
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.inner.into_inner().map_err(|e| Error::Io(e.into_error()))
    }
}

/// Totals of one completed export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub export_path: PathBuf,
    pub records_written: u64,
    /// Operations-phase requests with scans expanded to their length
    pub requests_emitted: u64,
}

impl WorkloadGenerator {
    /// Drain the workload into `writer`, acknowledging every WRITE once written.
    ///
    /// Initializes the generator first if needed. Returns the number of
    /// records written by this call.
    pub fn generate_into<W: Write>(
        &mut self,
        writer: &mut TraceWriter<W>,
        progress: Option<&ProgressHandle>,
    ) -> Result<u64> {
        self.initialize()?;
        let start = writer.records_written();

        while let Some(op) = self.next_operation()? {
            writer.write_operation(&op)?;
            if op.is_write() {
                self.acknowledge(op.key)?;
            }
            if let Some(progress) = progress {
                progress.advance(1);
            }
        }
        writer.flush()?;

        Ok(writer.records_written() - start)
    }

    /// Write the whole workload to the configured `export_path`.
    pub fn generate_to_file(&mut self) -> Result<GenerationSummary> {
        self.export(None)
    }

    /// Same as [`generate_to_file`](Self::generate_to_file), reporting each
    /// record to `progress`.
    pub fn generate_to_file_with_progress(
        &mut self,
        progress: &ProgressHandle,
    ) -> Result<GenerationSummary> {
        self.export(Some(progress))
    }

    fn export(&mut self, progress: Option<&ProgressHandle>) -> Result<GenerationSummary> {
        let export_path = self.config().export_path.clone();
        tracing::info!(
            path = %export_path.display(),
            records = self.config().n_records,
            operations = self.config().n_operations,
            "generating trace"
        );

        if let Some(parent) = export_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = TraceWriter::new(File::create(&export_path)?);
        let records_written = self.generate_into(&mut writer, progress)?;
        let requests_emitted = self.requests_emitted()?;

        tracing::info!(records_written, requests_emitted, "trace generation finished");
        Ok(GenerationSummary { export_path, records_written, requests_emitted })
    }
}
