use std::{ffi::OsStr, path::PathBuf, process, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqtract::{
    batch::{run_batch, Cancellation, Outcome, Summary},
    pipeline::document_id,
    storage::AutoSource,
};
use serde_json::json;
use tracing::instrument;
use walkdir::WalkDir;

use super::{
    terminal::{is_narrow, Colorize},
    Context, OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "Extract requirements from many documents in parallel")]
pub struct Batch {
    /// Source documents, or directories searched recursively for PDFs
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Stop starting new documents after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Batch {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let inputs = self.collect_inputs();
        if inputs.is_empty() {
            println!("No documents found.");
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()
            .context("failed to start worker threads")?;

        let progress = ProgressBar::new(inputs.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")?
                .progress_chars("=> "),
        );
        progress.enable_steady_tick(Duration::from_millis(120));

        let cancellation = Cancellation::new();
        let outcomes = pool.install(|| {
            run_batch(
                &inputs,
                &context.registry,
                &context.config,
                &AutoSource,
                &cancellation,
                |path, outcome| {
                    if self.fail_fast && matches!(outcome, Outcome::Failed(_)) {
                        cancellation.cancel();
                    }
                    progress.set_message(document_id(path));
                    progress.inc(1);
                },
            )
        });
        progress.finish_and_clear();

        let summary = Summary::of(&outcomes);
        match self.output {
            OutputFormat::Json => Self::output_json(&inputs, &outcomes, summary)?,
            OutputFormat::Table => Self::output_table(&inputs, &outcomes, summary),
        }

        if summary.failed > 0 {
            process::exit(1);
        }
        Ok(())
    }

    fn collect_inputs(&self) -> Vec<PathBuf> {
        let mut inputs = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(input)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .map(walkdir::DirEntry::into_path)
                    .filter(|path| {
                        path.extension()
                            .and_then(OsStr::to_str)
                            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
                    })
                    .collect();
                found.sort();
                inputs.extend(found);
            } else {
                inputs.push(input.clone());
            }
        }
        inputs
    }

    fn output_json(
        inputs: &[PathBuf],
        outcomes: &[Outcome],
        summary: Summary,
    ) -> anyhow::Result<()> {
        let documents: Vec<_> = inputs
            .iter()
            .zip(outcomes)
            .map(|(input, outcome)| match outcome {
                Outcome::Completed(report) => json!({
                    "document": report.document,
                    "status": "completed",
                    "profile": report.profile,
                    "output": report.output,
                    "stats": report.stats,
                }),
                Outcome::Failed(error) => json!({
                    "document": error.document,
                    "status": "failed",
                    "stage": error.stage,
                    "error": error.source.to_string(),
                }),
                Outcome::Skipped => json!({
                    "document": document_id(input),
                    "status": "skipped",
                }),
            })
            .collect();

        let output = json!({
            "documents": documents,
            "completed": summary.completed,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "records": summary.records,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(inputs: &[PathBuf], outcomes: &[Outcome], summary: Summary) {
        let narrow = is_narrow();

        for (input, outcome) in inputs.iter().zip(outcomes) {
            let document = document_id(input);
            match outcome {
                Outcome::Completed(report) if narrow => {
                    println!("{} {document}: {}", "✔".success(), report.stats.emitted);
                }
                Outcome::Completed(report) => println!(
                    "{} {document:<40} {:>5} requirements {:>4} dropped  [{}]",
                    "✔".success(),
                    report.stats.emitted,
                    report.stats.dropped,
                    report.profile.dim()
                ),
                Outcome::Failed(error) => println!(
                    "{} {document}: {} failed: {}",
                    "✘".warning(),
                    error.stage,
                    error.source
                ),
                Outcome::Skipped => println!("{} {document}", "–".dim()),
            }
        }

        println!();
        println!(
            "{} documents, {} failed, {} skipped, {} requirements",
            summary.completed.to_string().success(),
            if summary.failed == 0 {
                summary.failed.to_string()
            } else {
                summary.failed.to_string().warning()
            },
            summary.skipped,
            summary.records
        );
    }
}
