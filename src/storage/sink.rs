//! Serialization of requirement records to the line-based output format.
//!
//! Each record becomes one line: the statement and the present optional
//! fields joined by a separator token, followed by a terminator token.
//!
//! ```text
//! The system shall boot in 2s.[SEP]verified by test[END]
//! The system shall log faults.[END]
//! ```

use std::{
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::instrument;

use crate::domain::{Config, RequirementRecord};

/// Formats records as delimited lines and writes them to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serializer {
    separator: String,
    terminator: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new("[SEP]", "[END]")
    }
}

impl From<&Config> for Serializer {
    fn from(config: &Config) -> Self {
        Self::new(config.separator.clone(), config.terminator.clone())
    }
}

impl Serializer {
    /// Creates a serializer with the given separator and terminator tokens.
    #[must_use]
    pub fn new(separator: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            terminator: terminator.into(),
        }
    }

    /// Formats a single record as one physical line.
    ///
    /// Embedded line breaks are removed and empty optional fields are
    /// skipped.
    #[must_use]
    pub fn line(&self, record: &RequirementRecord) -> String {
        let mut line = strip_line_breaks(record.statement());
        for (_, value) in record.fields() {
            let value = strip_line_breaks(value);
            if !value.is_empty() {
                line.push_str(&self.separator);
                line.push_str(&value);
            }
        }
        line.push_str(&self.terminator);
        line
    }

    /// Formats every record, preserving order.
    #[must_use]
    pub fn serialize(&self, records: &[RequirementRecord]) -> Vec<String> {
        records.iter().map(|record| self.line(record)).collect()
    }

    /// Writes lines to `path`, one per line, replacing any existing file.
    ///
    /// The content is written to a temporary file in the destination
    /// directory which is then moved over `path`, so a failed write never
    /// leaves a partial file behind. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created or written.
    #[instrument(level = "debug", skip(self, lines), fields(lines = lines.len()))]
    pub fn write(&self, path: &Path, lines: &[String]) -> Result<(), SinkError> {
        let error = |source| SinkError {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(error)?;

        let file = NamedTempFile::new_in(parent).map_err(error)?;
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer.write_all(line.as_bytes()).map_err(error)?;
            writer.write_all(b"\n").map_err(error)?;
        }
        let file = writer.into_inner().map_err(|e| error(e.into_error()))?;
        file.as_file().sync_all().map_err(error)?;
        file.persist(path).map_err(|e| error(e.error))?;
        Ok(())
    }
}

fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// The output file could not be written.
#[derive(Debug, thiserror::Error)]
#[error("failed to write requirements to '{}'", path.display())]
pub struct SinkError {
    /// The destination path.
    pub path: PathBuf,
    /// The underlying I/O error.
    pub source: io::Error,
}
