use std::path::PathBuf;

use clap::Parser;
use reqtract::{
    pipeline::{self, GlossarySource, Job},
    storage::{output_path, AutoSource},
    Serializer,
};
use tracing::instrument;

use super::{terminal::Colorize, Context};

#[derive(Debug, Parser)]
#[command(about = "Extract requirements from a single document")]
pub struct Extract {
    /// The document profile to apply (case-insensitive)
    profile: String,

    /// The source document (PDF, or plain text with form-feed page breaks)
    input: PathBuf,

    /// Acronym glossary with one 'abbreviation,expansion' pair per line
    ///
    /// Acronyms are left as they are if no glossary is given.
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Where to write the extracted requirements
    ///
    /// Defaults to the input path with the input area rewritten to the output
    /// area.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Extract {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let profile = context.registry.profile_for(&self.profile)?;
        let config = &context.config;

        let job = Job {
            output: self.output.unwrap_or_else(|| {
                output_path(
                    &self.input,
                    &config.input_area,
                    &config.output_area,
                    &config.output_extension,
                )
            }),
            glossary: self.glossary.map(GlossarySource::Explicit),
            input: self.input,
        };

        let report = pipeline::run(&job, profile, &AutoSource, &Serializer::from(config))?;

        println!(
            "{} {} requirements from {} ({} dropped) -> {}",
            "Extracted".success(),
            report.stats.emitted,
            report.document,
            report.stats.dropped,
            report.output.display()
        );
        if report.acronyms_resolved > 0 {
            println!(
                "{}",
                format!("Expanded acronyms in {} fields", report.acronyms_resolved).dim()
            );
        }
        Ok(())
    }
}
