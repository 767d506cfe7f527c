//! Raw text providers.
//!
//! A [`TextSource`] turns a document path into the ordered text of its pages.
//! Layout analysis is out of scope: the pipeline only needs the page text in
//! reading order.

use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use tracing::instrument;

/// Supplies the page-level text of a source document.
pub trait TextSource: Sync {
    /// Returns the text of every page, in page order.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist or cannot be read.
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError>;
}

/// Extracts page text from PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfSource;

impl TextSource for PdfSource {
    #[instrument(level = "debug", skip(self))]
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }

        let document = lopdf::Document::load(path).map_err(|source| SourceError::Pdf {
            path: path.to_path_buf(),
            source,
        })?;

        if document.is_encrypted() {
            return Err(SourceError::Encrypted(path.to_path_buf()));
        }

        let pages: Vec<String> = document
            .get_pages()
            .into_keys()
            .map(|number| {
                document.extract_text(&[number]).unwrap_or_else(|e| {
                    tracing::warn!(page = number, "failed to extract page text: {e}");
                    String::new()
                })
            })
            .collect();

        tracing::debug!(pages = pages.len(), "read pdf");
        Ok(pages)
    }
}

/// Reads pre-extracted text, with pages separated by form feeds (`\x0c`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    #[instrument(level = "debug", skip(self))]
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            _ => SourceError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(content.split('\x0c').map(str::to_string).collect())
    }
}

/// Chooses a source by file extension: PDF for `.pdf`, plain text otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSource;

impl TextSource for AutoSource {
    fn pages(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let is_pdf = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            PdfSource.pages(path)
        } else {
            PlainTextSource.pages(path)
        }
    }
}

/// Joins page text in page order, leaving out the last `drop_last` pages.
#[must_use]
pub fn concatenate(pages: &[String], drop_last: usize) -> String {
    let kept = pages.len().saturating_sub(drop_last);
    pages[..kept].concat()
}

/// Errors raised while reading a source document.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The document does not exist.
    #[error("source document '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// The document could not be read.
    #[error("failed to read source document '{}'", path.display())]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The PDF is corrupt or uses unsupported features.
    #[error("failed to parse pdf '{}'", path.display())]
    Pdf {
        /// Path of the document.
        path: PathBuf,
        /// The underlying PDF error.
        source: lopdf::Error,
    },

    /// The PDF is encrypted and its content cannot be read.
    #[error("pdf '{}' is encrypted", .0.display())]
    Encrypted(PathBuf),
}
