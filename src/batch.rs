//! Processing many documents at once.
//!
//! Documents are independent, so they are processed in parallel on the
//! current rayon thread pool. Results come back in input order.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    domain::{registry, Config, DocumentProfile, Registry},
    pipeline::{self, document_id, ExtractError, GlossarySource, Job, Report, StageError},
    storage::{output_path, Serializer, TextSource},
};

/// A cooperative cancellation flag shared between a batch and its caller.
///
/// Cancellation is checked before each document starts. A document already
/// in progress runs to completion.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// Creates a flag that is not yet cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further documents are started.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What happened to one document of a batch.
#[derive(Debug)]
pub enum Outcome {
    /// The document was extracted and written.
    Completed(Report),
    /// The document failed; other documents are unaffected.
    Failed(ExtractError),
    /// The batch was cancelled before the document started.
    Skipped,
}

/// Totals over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Documents written.
    pub completed: usize,
    /// Documents that failed.
    pub failed: usize,
    /// Documents never started.
    pub skipped: usize,
    /// Records written across all documents.
    pub records: usize,
}

impl Summary {
    /// Tallies a set of outcomes.
    #[must_use]
    pub fn of<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut summary, outcome| {
                match outcome {
                    Outcome::Completed(report) => {
                        summary.completed += 1;
                        summary.records += report.stats.emitted;
                    }
                    Outcome::Failed(_) => summary.failed += 1,
                    Outcome::Skipped => summary.skipped += 1,
                }
                summary
            })
    }
}

/// The glossary conventionally shipped next to a document:
/// `<stem> Acronyms.txt` in the same directory.
///
/// Returns `None` if no such file exists.
#[must_use]
fn sibling_glossary(input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_string_lossy();
    let candidate = input.with_file_name(format!("{stem} Acronyms.txt"));
    candidate.is_file().then_some(candidate)
}

/// Builds the job for a document, detecting its profile from the file name.
///
/// A sibling glossary is picked up when present. It was not asked for, so a
/// glossary that cannot be loaded does not fail the document.
///
/// # Errors
///
/// Returns a profile lookup error if no registered profile matches.
pub fn plan<'r>(
    input: &Path,
    registry: &'r Registry,
    config: &Config,
) -> Result<(Job, &'r DocumentProfile), ExtractError> {
    let profile = registry.detect(input).ok_or_else(|| {
        let stem = input
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        ExtractError::new(
            document_id(input),
            StageError::Profile(registry::Error::UnknownProfile(stem)),
        )
    })?;

    let job = Job {
        input: input.to_path_buf(),
        output: output_path(
            input,
            &config.input_area,
            &config.output_area,
            &config.output_extension,
        ),
        glossary: sibling_glossary(input).map(GlossarySource::Discovered),
    };
    Ok((job, profile))
}

/// Extracts every document in `inputs`.
///
/// A failing document never stops the others. `on_done` is called from the
/// worker thread as each document finishes, which makes it suitable for
/// progress reporting. The returned outcomes are in input order.
pub fn run_batch<F>(
    inputs: &[PathBuf],
    registry: &Registry,
    config: &Config,
    source: &dyn TextSource,
    cancellation: &Cancellation,
    on_done: F,
) -> Vec<Outcome>
where
    F: Fn(&Path, &Outcome) + Sync,
{
    let serializer = Serializer::from(config);

    inputs
        .par_iter()
        .map(|input| {
            let outcome = if cancellation.is_cancelled() {
                Outcome::Skipped
            } else {
                match plan(input, registry, config)
                    .and_then(|(job, profile)| pipeline::run(&job, profile, source, &serializer))
                {
                    Ok(report) => Outcome::Completed(report),
                    Err(error) => {
                        tracing::warn!(document = %error.document, stage = %error.stage, "{}", error.source);
                        Outcome::Failed(error)
                    }
                }
            };
            on_done(input, &outcome);
            outcome
        })
        .collect()
}
