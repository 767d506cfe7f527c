//! Profile-driven requirement extraction
//!
//! Requirement statements are pulled out of specification documents whose
//! layout is described by a declarative [`DocumentProfile`]. The text passes
//! through a fixed pipeline (normalize, segment, recordize, split), optional
//! acronym resolution, and is serialized one record per line.

pub mod domain;
pub use domain::{Config, DocumentProfile, FieldKind, Glossary, Registry, RequirementRecord};

/// The text-processing stages of the pipeline.
pub mod parse;

/// Filesystem storage: source documents in, extracted requirements out.
pub mod storage;
pub use storage::{Serializer, TextSource};

pub mod pipeline;
pub use pipeline::{
    extract, ExtractError, Extraction, ExtractionStats, GlossarySource, Job, Report, Stage,
};

pub mod batch;
pub use batch::{run_batch, Cancellation, Outcome};
