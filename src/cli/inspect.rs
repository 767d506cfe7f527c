use std::path::PathBuf;

use clap::Parser;
use reqtract::{
    pipeline::{self, ChapterReport, Extraction},
    storage::AutoSource,
};
use serde_json::json;
use tracing::instrument;

use super::{
    terminal::{is_narrow, Colorize},
    Context, OutputFormat,
};

const MAX_HEADING_WIDTH: usize = 24;

#[derive(Debug, Parser)]
#[command(about = "Show how a document is segmented, without writing any output")]
pub struct Inspect {
    /// The document profile to apply (case-insensitive)
    profile: String,

    /// The source document
    input: PathBuf,

    /// Also print the extracted records
    #[arg(long)]
    records: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Inspect {
    #[instrument(level = "debug", skip(context))]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let profile = context.registry.profile_for(&self.profile)?;
        let (text, pages) = pipeline::read_text(&self.input, profile, &AutoSource)?;
        let extraction = pipeline::extract(&text, profile)?;

        match self.output {
            OutputFormat::Json => self.output_json(pages, &extraction)?,
            OutputFormat::Table => self.output_table(pages, &extraction),
        }
        Ok(())
    }

    fn output_json(&self, pages: usize, extraction: &Extraction) -> anyhow::Result<()> {
        let mut output = json!({
            "document": pipeline::document_id(&self.input),
            "pages": pages,
            "stats": extraction.stats,
            "chapters": extraction.chapters,
        });
        if self.records {
            output["records"] = extraction
                .records
                .iter()
                .map(|record| {
                    json!({
                        "statement": record.statement(),
                        "fields": record
                            .fields()
                            .map(|(kind, value)| (kind.to_string(), value.into()))
                            .collect::<serde_json::Map<String, serde_json::Value>>(),
                    })
                })
                .collect();
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(&self, pages: usize, extraction: &Extraction) {
        let stats = extraction.stats;

        println!(
            "{} ({pages} pages)",
            pipeline::document_id(&self.input).info()
        );
        println!("{}", "──────────────────".dim());
        println!(
            "Chapters: {} ({} delimiters, {} discarded as front matter)",
            stats.chapters, stats.chapter_delimiters, stats.chapters_discarded
        );
        println!(
            "Blocks:   {} ({} emitted, {} dropped)",
            stats.blocks, stats.emitted, stats.dropped
        );
        println!();

        if !is_narrow() {
            println!("{:<6} {:<MAX_HEADING_WIDTH$} Blocks Dropped", "#", "Heading");
            for chapter in &extraction.chapters {
                Self::print_chapter(chapter);
            }
        }

        let empty = extraction
            .chapters
            .iter()
            .filter(|chapter| chapter.blocks == 0)
            .count();
        if empty > 0 {
            println!(
                "{}",
                format!("{empty} chapters contain no requirements").warning()
            );
        }

        if self.records {
            println!();
            for record in &extraction.records {
                println!("{}", record.statement());
                for (kind, value) in record.fields() {
                    println!("    {}: {value}", kind.to_string().dim());
                }
            }
        }
    }

    fn print_chapter(chapter: &ChapterReport) {
        let heading: String = chapter.heading.chars().take(MAX_HEADING_WIDTH).collect();
        let line = format!(
            "{:<6} {heading:<MAX_HEADING_WIDTH$} {:>6} {:>7}",
            chapter.index, chapter.blocks, chapter.dropped
        );
        if chapter.blocks == 0 {
            println!("{}", line.dim());
        } else {
            println!("{line}");
        }
    }
}
