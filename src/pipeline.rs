//! End-to-end extraction of a single document.
//!
//! [`extract`] runs the in-memory stages (normalize, segment, recordize,
//! split) over raw text. [`run`] wraps it with the I/O boundaries: reading the
//! source document, resolving acronyms and writing the output file.
//!
//! Structural anomalies (chapters without requirements, placeholder blocks,
//! unmatched markers) are not errors. They are counted in
//! [`ExtractionStats`] so callers can audit them.

use std::{
    fmt, io,
    path::{Component, Path, PathBuf},
};

use serde::Serialize;
use tracing::instrument;

use crate::{
    domain::{glossary, registry, DocumentProfile, Glossary, RequirementRecord},
    parse::{self, Split},
    storage::{concatenate, Serializer, SinkError, SourceError, TextSource},
};

/// Counts gathered while extracting a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    /// Chapter delimiter matches across all levels.
    pub chapter_delimiters: usize,
    /// Leading chapters discarded as front matter.
    pub chapters_discarded: usize,
    /// Chapters processed.
    pub chapters: usize,
    /// Requirement blocks found (one per requirement delimiter match).
    pub blocks: usize,
    /// Blocks dropped as placeholders.
    pub dropped: usize,
    /// Records emitted.
    pub emitted: usize,
}

/// Per-chapter counts, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterReport {
    /// Position of the chapter in the document.
    pub index: usize,
    /// The delimiter that opened the chapter.
    pub heading: String,
    /// Requirement blocks found in the chapter.
    pub blocks: usize,
    /// Blocks dropped as placeholders.
    pub dropped: usize,
}

/// The records extracted from a document, with diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Records in document order.
    pub records: Vec<RequirementRecord>,
    /// Aggregate counts.
    pub stats: ExtractionStats,
    /// Counts for each chapter, in document order.
    pub chapters: Vec<ChapterReport>,
}

/// Extracts requirement records from raw document text.
///
/// # Errors
///
/// Returns [`StageError::EmptySegmentation`] if no chapter remains after the
/// front matter is discarded.
#[instrument(level = "debug", skip_all, fields(profile = profile.id()))]
pub fn extract(raw: &str, profile: &DocumentProfile) -> Result<Extraction, StageError> {
    let text = parse::normalize(raw, profile);
    let segmentation = parse::segment(&text, profile);

    if segmentation.chapters.is_empty() {
        return Err(StageError::EmptySegmentation {
            found: segmentation.discarded,
            discarded: segmentation.discarded,
        });
    }

    let mut stats = ExtractionStats {
        chapter_delimiters: segmentation.delimiter_matches,
        chapters_discarded: segmentation.discarded,
        chapters: segmentation.chapters.len(),
        ..ExtractionStats::default()
    };
    let mut records = Vec::new();
    let mut chapters = Vec::with_capacity(segmentation.chapters.len());

    for chapter in &segmentation.chapters {
        let blocks = parse::recordize(chapter, profile);
        let mut report = ChapterReport {
            index: chapter.index,
            heading: chapter.heading.to_string(),
            blocks: blocks.len(),
            dropped: 0,
        };

        for block in &blocks {
            match parse::split(block, profile) {
                Split::Record(record) => records.push(record),
                Split::Placeholder => {
                    tracing::trace!(
                        chapter = block.chapter,
                        block = block.index,
                        "dropped placeholder block"
                    );
                    report.dropped += 1;
                }
            }
        }

        stats.blocks += report.blocks;
        stats.dropped += report.dropped;
        chapters.push(report);
    }
    stats.emitted = records.len();

    tracing::debug!(
        chapters = stats.chapters,
        blocks = stats.blocks,
        dropped = stats.dropped,
        emitted = stats.emitted,
        "extracted records"
    );

    Ok(Extraction {
        records,
        stats,
        chapters,
    })
}

/// A single document to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// The source document.
    pub input: PathBuf,
    /// Where the extracted requirements are written.
    pub output: PathBuf,
    /// Optional acronym glossary.
    pub glossary: Option<GlossarySource>,
}

/// Where a job's glossary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlossarySource {
    /// Supplied by the user. Failing to load it fails the document.
    Explicit(PathBuf),
    /// Found next to the document. Failing to load it is logged and
    /// acronym resolution is skipped.
    Discovered(PathBuf),
}

impl GlossarySource {
    /// Path of the glossary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Discovered(path) => path,
        }
    }

    fn load(&self) -> Result<Option<Glossary>, glossary::Error> {
        match self {
            Self::Explicit(path) => Glossary::load(path).map(Some),
            Self::Discovered(path) => match Glossary::load(path) {
                Ok(glossary) => Ok(Some(glossary)),
                Err(e) => {
                    tracing::warn!(
                        glossary = %path.display(),
                        "ignoring unusable glossary, acronyms are not resolved: {e}"
                    );
                    Ok(None)
                }
            },
        }
    }
}

/// The summary of a successfully processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The document identifier (its file name).
    pub document: String,
    /// The profile used.
    pub profile: String,
    /// Where the output was written.
    pub output: PathBuf,
    /// Pages read from the source.
    pub pages: usize,
    /// Extraction counts.
    pub stats: ExtractionStats,
    /// Record fields changed by acronym resolution.
    pub acronyms_resolved: usize,
}

/// Reads a document and concatenates its pages as the profile requires.
///
/// Returns the text and the number of pages read.
///
/// # Errors
///
/// Returns an error if the source document cannot be read.
pub fn read_text(
    path: &Path,
    profile: &DocumentProfile,
    source: &dyn TextSource,
) -> Result<(String, usize), SourceError> {
    let pages = source.pages(path)?;
    Ok((concatenate(&pages, profile.drop_last_pages()), pages.len()))
}

/// Processes one document from source file to output file.
///
/// The glossary is loaded before the source is read so a bad explicit
/// glossary fails fast. The output is written atomically; on any error no
/// output file is created or modified.
///
/// # Errors
///
/// Returns an [`ExtractError`] naming the document and the stage that failed.
#[instrument(skip_all, fields(document = %document_id(&job.input), profile = profile.id()))]
pub fn run(
    job: &Job,
    profile: &DocumentProfile,
    source: &dyn TextSource,
    serializer: &Serializer,
) -> Result<Report, ExtractError> {
    let document = document_id(&job.input);
    let fail = |source: StageError| ExtractError::new(document.clone(), source);

    if same_file(&job.input, &job.output) {
        return Err(fail(
            SinkError {
                path: job.output.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "output path is the source document",
                ),
            }
            .into(),
        ));
    }

    let glossary = match &job.glossary {
        Some(glossary) => glossary.load().map_err(|e| fail(e.into()))?,
        None => None,
    };

    let (raw, pages) = read_text(&job.input, profile, source).map_err(|e| fail(e.into()))?;

    let Extraction {
        mut records,
        stats,
        ..
    } = extract(&raw, profile).map_err(fail)?;

    let acronyms_resolved = glossary
        .as_ref()
        .map_or(0, |glossary| glossary.resolve(&mut records));

    let lines = serializer.serialize(&records);
    serializer
        .write(&job.output, &lines)
        .map_err(|e| fail(e.into()))?;

    tracing::info!(
        records = stats.emitted,
        dropped = stats.dropped,
        output = %job.output.display(),
        "{} requirements extracted",
        stats.emitted
    );

    Ok(Report {
        document,
        profile: profile.id().to_string(),
        output: job.output.clone(),
        pages,
        stats,
        acronyms_resolved,
    })
}

/// Whether two paths name the same file.
///
/// Existing files are compared by canonical path; otherwise the paths are
/// compared with `.` components removed.
fn same_file(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        return a == b;
    }
    let lexical = |path: &Path| -> PathBuf {
        path.components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect()
    };
    lexical(a) == lexical(b)
}

/// The identifier used for a document in diagnostics: its file name.
#[must_use]
pub fn document_id(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// The pipeline stage at which a document failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Selecting the document profile.
    ProfileLookup,
    /// Reading the source document.
    SourceRead,
    /// Splitting the document into chapters.
    Segmentation,
    /// Reading the acronym glossary.
    GlossaryRead,
    /// Writing the output file.
    OutputWrite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProfileLookup => "profile lookup",
            Self::SourceRead => "source read",
            Self::Segmentation => "segmentation",
            Self::GlossaryRead => "glossary read",
            Self::OutputWrite => "output write",
        })
    }
}

/// A fatal error in one pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// No profile is registered for the document.
    #[error(transparent)]
    Profile(#[from] registry::Error),

    /// The source document could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Every chapter was discarded as front matter.
    #[error("segmentation produced zero chapters ({discarded} of {found} discarded as front matter)")]
    EmptySegmentation {
        /// Chapters found by the top-level delimiter.
        found: usize,
        /// Chapters discarded.
        discarded: usize,
    },

    /// The glossary could not be read or parsed.
    #[error(transparent)]
    Glossary(#[from] glossary::Error),

    /// The output could not be written.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl StageError {
    /// The stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Profile(_) => Stage::ProfileLookup,
            Self::Source(_) => Stage::SourceRead,
            Self::EmptySegmentation { .. } => Stage::Segmentation,
            Self::Glossary(_) => Stage::GlossaryRead,
            Self::Sink(_) => Stage::OutputWrite,
        }
    }
}

/// A fatal error while processing a document.
#[derive(Debug, thiserror::Error)]
#[error("{document}: {stage} failed")]
pub struct ExtractError {
    /// The document that failed.
    pub document: String,
    /// The stage that failed.
    pub stage: Stage,
    /// The underlying error.
    pub source: StageError,
}

impl ExtractError {
    /// Attributes a stage error to a document.
    #[must_use]
    pub const fn new(document: String, source: StageError) -> Self {
        Self {
            document,
            stage: source.stage(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::{domain::FieldKind, storage::PlainTextSource};

    fn remark_profile() -> DocumentProfile {
        DocumentProfile::from_toml(
            r#"
            _version = "1"
            id = "ROUND-TRIP"
            fields = ["remark"]
            placeholders = ["NA", "Deleted"]

            [[chapters]]
            pattern = '5\.[0-9]+\s'

            [requirements]
            pattern = 'REQ-\d+'

            [[markers]]
            pattern = 'Remark:'
            field = "remark"

            [[cleanup]]
            literal = "[END-marker]"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn round_trip_with_remark_and_placeholder() {
        let text =
            "REQ-001 The system shall boot in 2s. Remark: verified by test[END-marker]REQ-002 NA";
        let extraction = extract(text, &remark_profile()).unwrap();

        assert_eq!(extraction.records.len(), 1);
        let record = &extraction.records[0];
        assert_eq!(record.statement(), "The system shall boot in 2s.");
        assert_eq!(record.field(FieldKind::Remark), Some("verified by test"));
        assert_eq!(extraction.stats.blocks, 2);
        assert_eq!(extraction.stats.dropped, 1);
        assert_eq!(extraction.stats.emitted, 1);
    }

    #[test]
    fn placeholder_chapter_yields_no_records() {
        let extraction = extract("5.1 NA 5.2 NA", &remark_profile()).unwrap();

        assert_eq!(extraction.stats.chapters, 3);
        assert!(extraction.records.is_empty());
    }

    #[test]
    fn records_preserve_chapter_then_block_order() {
        let text = "5.1 REQ-1 first REQ-2 second 5.2 intro REQ-3 third 5.3 NA 5.4 REQ-4 fourth";
        let extraction = extract(text, &remark_profile()).unwrap();

        let statements: Vec<_> = extraction.records.iter().map(|r| r.statement()).collect();
        assert_eq!(statements, vec!["first", "second", "third", "fourth"]);

        let per_chapter: Vec<_> = extraction.chapters.iter().map(|c| c.blocks).collect();
        assert_eq!(per_chapter, vec![0, 2, 1, 0, 1]);
    }

    #[test]
    fn blocks_never_straddle_chapters() {
        let text = "5.1 REQ-1 end of chapter one 5.2 chapter two prose";
        let extraction = extract(text, &remark_profile()).unwrap();

        assert_eq!(extraction.records[0].statement(), "end of chapter one");
    }

    #[test]
    fn records_never_exceed_delimiter_matches_and_are_never_blank() {
        let profile = remark_profile();
        let delimiter = Regex::new(r"REQ-\d+").unwrap();
        let samples = [
            "",
            "REQ-1",
            "REQ-1 REQ-2 REQ-3",
            "5.1 REQ-1 a Remark: b 5.2 REQ-2 Remark: only remark",
            "prose without requirements 5.1 more prose",
            "5.1 REQ-1 Deleted REQ-2   \n  REQ-3 kept",
        ];

        for sample in samples {
            let extraction = extract(sample, &profile).unwrap();
            let matches = delimiter.find_iter(sample).count();

            assert!(extraction.records.len() <= matches, "sample: {sample:?}");
            assert_eq!(extraction.stats.blocks, matches, "sample: {sample:?}");
            assert_eq!(
                extraction.stats.emitted + extraction.stats.dropped,
                extraction.stats.blocks
            );
            for record in &extraction.records {
                assert!(!record.statement().trim().is_empty());
            }
        }
    }

    #[test]
    fn terminated_requirements_with_builtin_profile() {
        let registry = crate::Registry::builtin().unwrap();
        let profile = registry.profile_for("e1356-gtd-srs").unwrap();
        let text = "Copyright European Space Agency,Page1of40 5.1.1 REQ-BL-0010 The library \
                    shall provide sin./T Remark: IEEE 754/square REQ-BL-0020 The library shall \
                    provide cos./T/square trailing text";

        let extraction = extract(text, profile).unwrap();
        let lines = Serializer::default().serialize(&extraction.records);

        assert_eq!(
            lines,
            vec![
                "The library shall provide sin.[SEP]IEEE 754[END]",
                "The library shall provide cos.[END]",
            ]
        );
    }

    #[test]
    fn nested_chapters_with_builtin_profile() {
        let registry = crate::Registry::builtin().unwrap();
        let profile = registry.profile_for("SAVOIR-GS-001").unwrap();
        let text = "front matter 7.1.1 Scope Requirement Number : SAVOIR.OBC.FUN.10 The OBC \
                    shall boot. Note : within 5 s Requirement Number : SAVOIR.OBC.FUN.20 Deleted \
                    7.1.2 Requirement Number : SAVOIR.OBC.FUN.30 The OBC shall log. Requirement \
                    Rationale : audit";

        let extraction = extract(text, profile).unwrap();

        assert_eq!(extraction.stats.chapters_discarded, 1);
        assert_eq!(extraction.stats.chapters, 2);
        assert_eq!(extraction.stats.dropped, 1);
        let statements: Vec<_> = extraction.records.iter().map(|r| r.statement()).collect();
        assert_eq!(statements, vec!["The OBC shall boot.", "The OBC shall log."]);
        assert_eq!(
            extraction.records[0].field(FieldKind::Remark),
            Some("within 5 s")
        );
        assert_eq!(extraction.records[1].fields().count(), 0);
    }

    #[test]
    fn run_together_titles_are_cut_with_builtin_profile() {
        let registry = crate::Registry::builtin().unwrap();
        let profile = registry.profile_for("SAVOIR-GS-DSSnIRD").unwrap();
        let text = "front 7.1 Storage 7.1.1 SAVOIR.MMS.FUN.10 Storage capacityThe DSS shall \
                    provide 2 TB. Rationale: mission data SAVOIR.MMS.FUN.20 The DSS shall \
                    support SpaceWire links. Comment: see ECSS 8.1 Services 8.1.1 8.1.1.1 \
                    SAVOIR.MMS.SRV.10 Each PacketUtilization report shall be logged. Parent: \
                    SAVOIR.MMS.FUN.10";

        let extraction = extract(text, profile).unwrap();

        let statements: Vec<_> = extraction.records.iter().map(|r| r.statement()).collect();
        assert_eq!(
            statements,
            vec![
                "The DSS shall provide 2 TB.",
                "The DSS shall support SpaceWire links.",
                "Each PacketUtilization report shall be logged.",
            ]
        );
        assert_eq!(
            extraction.records[0].field(FieldKind::Rationale),
            Some("mission data")
        );
    }

    #[test]
    fn front_matter_consuming_everything_is_an_error() {
        let profile = DocumentProfile::from_toml(
            r#"
            _version = "1"
            id = "GREEDY"
            front_matter = 3

            [[chapters]]
            pattern = '5\.[0-9]+\s'

            [requirements]
            pattern = 'REQ'
            "#,
        )
        .unwrap();

        let error = extract("toc 5.1 REQ x", &profile).unwrap_err();
        assert_eq!(error.stage(), Stage::Segmentation);
    }

    fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join("input").join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn run_writes_resolved_records() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(
            tmp.path(),
            "doc.txt",
            "5.1 REQ-1 The OBC shall boot.\x0c Remark: OBC tested\x0c5.2 REQ-2 Deleted",
        );
        let glossary = tmp.path().join("glossary.txt");
        std::fs::write(&glossary, "OBC,On-Board Computer\n").unwrap();
        let job = Job {
            input,
            output: tmp.path().join("output").join("doc.txt"),
            glossary: Some(GlossarySource::Explicit(glossary)),
        };

        let report = run(
            &job,
            &remark_profile(),
            &PlainTextSource,
            &Serializer::default(),
        )
        .unwrap();

        assert_eq!(report.document, "doc.txt");
        assert_eq!(report.pages, 3);
        assert_eq!(report.stats.emitted, 1);
        assert_eq!(report.stats.dropped, 1);
        assert_eq!(report.acronyms_resolved, 2);
        assert_eq!(
            std::fs::read_to_string(&job.output).unwrap(),
            "The On-Board Computer shall boot.[SEP]On-Board Computer tested[END]\n"
        );
    }

    #[test]
    fn run_reports_failing_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(tmp.path(), "doc.txt", "5.1 REQ-1 text");
        let output = tmp.path().join("output").join("doc.txt");

        let missing_source = Job {
            input: tmp.path().join("input").join("missing.txt"),
            output: output.clone(),
            glossary: None,
        };
        let error = run(
            &missing_source,
            &remark_profile(),
            &PlainTextSource,
            &Serializer::default(),
        )
        .unwrap_err();
        assert_eq!(error.stage, Stage::SourceRead);
        assert_eq!(error.document, "missing.txt");

        let bad_glossary = tmp.path().join("glossary.txt");
        std::fs::write(&bad_glossary, "no separator here\n").unwrap();
        let job = Job {
            input,
            output: output.clone(),
            glossary: Some(GlossarySource::Explicit(bad_glossary)),
        };
        let error = run(&job, &remark_profile(), &PlainTextSource, &Serializer::default())
            .unwrap_err();
        assert_eq!(error.stage, Stage::GlossaryRead);
        assert_eq!(error.to_string(), "doc.txt: glossary read failed");

        assert!(!output.exists());
    }

    #[test]
    fn unusable_discovered_glossary_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(tmp.path(), "doc.txt", "5.1 REQ-1 The OBC shall boot.");
        let glossary = tmp.path().join("input").join("doc Acronyms.txt");
        std::fs::write(&glossary, "no separator here\n").unwrap();
        let job = Job {
            input,
            output: tmp.path().join("output").join("doc.txt"),
            glossary: Some(GlossarySource::Discovered(glossary)),
        };

        let report = run(&job, &remark_profile(), &PlainTextSource, &Serializer::default())
            .unwrap();

        assert_eq!(report.acronyms_resolved, 0);
        assert_eq!(
            std::fs::read_to_string(&job.output).unwrap(),
            "The OBC shall boot.[END]\n"
        );
    }

    #[test]
    fn output_never_overwrites_source() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(tmp.path(), "doc.txt", "5.1 REQ-1 text");
        let job = Job {
            input: input.clone(),
            output: input.clone(),
            glossary: None,
        };

        let error = run(&job, &remark_profile(), &PlainTextSource, &Serializer::default())
            .unwrap_err();

        assert_eq!(error.stage, Stage::OutputWrite);
        assert_eq!(std::fs::read_to_string(input).unwrap(), "5.1 REQ-1 text");
    }

    #[test]
    fn output_never_overwrites_source_under_another_spelling() {
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(tmp.path(), "doc.txt", "5.1 REQ-1 text");
        let job = Job {
            input: input.clone(),
            output: tmp.path().join("input").join(".").join("doc.txt"),
            glossary: None,
        };

        let error = run(&job, &remark_profile(), &PlainTextSource, &Serializer::default())
            .unwrap_err();

        assert_eq!(error.stage, Stage::OutputWrite);
        assert_eq!(std::fs::read_to_string(input).unwrap(), "5.1 REQ-1 text");
    }

    #[test]
    fn paths_differing_only_by_current_dir_are_the_same_file() {
        assert!(same_file(
            Path::new("./input/doc.txt"),
            Path::new("input/doc.txt")
        ));
        assert!(!same_file(
            Path::new("input/doc.txt"),
            Path::new("output/doc.txt")
        ));
    }

    #[test]
    fn drop_last_pages_excludes_appendix() {
        let profile = DocumentProfile::from_toml(
            r#"
            _version = "1"
            id = "APPENDIX"
            drop_last_pages = 1

            [[chapters]]
            pattern = '5\.[0-9]+\s'

            [requirements]
            pattern = 'REQ-\d+'
            "#,
        )
        .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let input = write_source(tmp.path(), "doc.txt", "REQ-1 kept\x0cREQ-2 appendix");

        let (text, pages) = read_text(&input, &profile, &PlainTextSource).unwrap();
        assert_eq!(pages, 2);
        assert_eq!(text, "REQ-1 kept");
    }
}
