//! Acronym glossaries.
//!
//! A glossary file lists one `abbreviation,expansion` pair per line. Entries
//! are applied in file order as literal substring replacements, so an
//! expansion can itself be rewritten by a later entry.

use std::{io, path::Path};

use tracing::instrument;

use crate::domain::RequirementRecord;

/// An abbreviation and the text it expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcronymEntry {
    /// The abbreviation as it appears in requirement text.
    pub abbreviation: String,
    /// The full text substituted for the abbreviation.
    pub expansion: String,
}

/// An ordered list of acronym entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    entries: Vec<AcronymEntry>,
}

impl Glossary {
    /// Reads a glossary from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read and
    /// [`Error::Format`] if a line is not an `abbreviation,expansion` pair.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses glossary text.
    ///
    /// A single trailing blank line is ignored; any other line without a
    /// comma, or with an empty abbreviation, is rejected. Only the first
    /// comma separates the fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] naming the first malformed line.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut lines: Vec<&str> = content.split('\n').collect();
        if lines.last().is_some_and(|line| line.trim_end_matches('\r').is_empty()) {
            lines.pop();
        }

        let entries = lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| {
                let line = line.trim_end_matches('\r');
                match line.split_once(',') {
                    Some((abbreviation, expansion)) if !abbreviation.is_empty() => {
                        Ok(AcronymEntry {
                            abbreviation: abbreviation.to_string(),
                            expansion: expansion.to_string(),
                        })
                    }
                    _ => Err(Error::Format {
                        line: index + 1,
                        content: line.to_string(),
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    /// The entries in application order.
    #[must_use]
    pub fn entries(&self) -> &[AcronymEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the glossary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expands every abbreviation in `text`, in entry order.
    #[must_use]
    pub fn expand(&self, text: &str) -> String {
        self.entries.iter().fold(text.to_string(), |text, entry| {
            if text.contains(entry.abbreviation.as_str()) {
                text.replace(entry.abbreviation.as_str(), &entry.expansion)
            } else {
                text
            }
        })
    }

    /// Expands abbreviations in every field of every record.
    ///
    /// Returns the number of fields that changed.
    #[instrument(level = "debug", skip_all, fields(entries = self.entries.len()))]
    pub fn resolve(&self, records: &mut [RequirementRecord]) -> usize {
        let mut changed = 0;
        for record in records.iter_mut() {
            record.map_values(|value| {
                let expanded = self.expand(value);
                (expanded != value).then(|| {
                    changed += 1;
                    expanded
                })
            });
        }
        tracing::debug!(changed, "resolved acronyms");
        changed
    }
}

/// Applies an optional glossary to a record set.
///
/// Without a glossary the records are returned unchanged.
#[must_use]
pub fn resolve(
    mut records: Vec<RequirementRecord>,
    glossary: Option<&Glossary>,
) -> Vec<RequirementRecord> {
    if let Some(glossary) = glossary {
        glossary.resolve(&mut records);
    }
    records
}

/// Errors raised while reading a glossary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The glossary file could not be read.
    #[error("failed to read glossary '{path}'")]
    Read {
        /// Path of the glossary file.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A line is not an `abbreviation,expansion` pair.
    #[error("glossary line {line} is not an 'abbreviation,expansion' pair: '{content}'")]
    Format {
        /// The 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::FieldKind;

    fn record(statement: &str) -> RequirementRecord {
        RequirementRecord::new(statement).unwrap()
    }

    #[test]
    fn expands_known_abbreviation() {
        let glossary = Glossary::parse("OBC,On-Board Computer\n").unwrap();
        let records = resolve(vec![record("The OBC shall reset.")], Some(&glossary));

        assert_eq!(records[0].statement(), "The On-Board Computer shall reset.");
    }

    #[test]
    fn absent_abbreviation_leaves_records_unchanged() {
        let glossary = Glossary::parse("TM,Telemetry\n").unwrap();
        let original = vec![
            record("The OBC shall reset.").with_field(FieldKind::Remark, "after boot"),
            record("RAM shall be scrubbed."),
        ];

        let resolved = resolve(original.clone(), Some(&glossary));
        assert_eq!(resolved, original);
    }

    #[test]
    fn no_glossary_is_a_no_op() {
        let original = vec![record("The OBC shall reset.")];
        assert_eq!(resolve(original.clone(), None), original);
    }

    #[test]
    fn every_field_is_resolved() {
        let glossary = Glossary::parse("TC,Telecommand\n").unwrap();
        let mut records = vec![record("Accept TC").with_field(FieldKind::Remark, "TC only")];

        let changed = glossary.resolve(&mut records);

        assert_eq!(changed, 2);
        assert_eq!(records[0].statement(), "Accept Telecommand");
        assert_eq!(records[0].field(FieldKind::Remark), Some("Telecommand only"));
    }

    #[test]
    fn substitution_is_literal_and_in_file_order() {
        // The second entry rewrites text produced by the first.
        let glossary = Glossary::parse("SW,S/W unit\nS/W,Software\n").unwrap();
        assert_eq!(glossary.expand("SW and S/W"), "Software unit and Software");

        // Not word-boundary aware.
        let glossary = Glossary::parse("OS,Operating System\n").unwrap();
        assert_eq!(glossary.expand("POSIX"), "POperating SystemIX");
    }

    #[test]
    fn resolving_twice_is_idempotent_without_overlap() {
        let glossary = Glossary::parse("OBC,On-Board Computer\nTM,Telemetry\n").unwrap();
        let once = resolve(vec![record("The OBC emits TM.")], Some(&glossary));
        let twice = resolve(once.clone(), Some(&glossary));

        assert_eq!(once, twice);
    }

    #[test]
    fn trailing_blank_line_is_ignored() {
        let glossary = Glossary::parse("A,Alpha\r\nB,Beta\r\n").unwrap();
        assert_eq!(glossary.len(), 2);
        assert_eq!(glossary.entries()[1].expansion, "Beta");

        let glossary = Glossary::parse("A,Alpha").unwrap();
        assert_eq!(glossary.len(), 1);
    }

    #[test]
    fn expansion_may_contain_commas() {
        let glossary = Glossary::parse("FDIR,Fault Detection, Isolation and Recovery\n").unwrap();
        assert_eq!(
            glossary.entries()[0].expansion,
            "Fault Detection, Isolation and Recovery"
        );
    }

    #[test]
    fn line_without_separator_is_a_format_error() {
        let error = Glossary::parse("A,Alpha\nBeta\nC,Gamma\n").unwrap_err();
        assert!(matches!(error, Error::Format { line: 2, .. }));
    }

    #[test]
    fn empty_abbreviation_is_a_format_error() {
        let error = Glossary::parse(",nothing\n").unwrap_err();
        assert!(matches!(error, Error::Format { line: 1, .. }));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"OBC,On-Board Computer\n").unwrap();

        let glossary = Glossary::load(file.path()).unwrap();
        assert_eq!(glossary.len(), 1);
    }

    #[test]
    fn load_missing_file_is_a_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let error = Glossary::load(&tmp.path().join("missing.txt")).unwrap_err();
        assert!(matches!(error, Error::Read { .. }));
    }
}
