//! Domain models for requirement extraction.
//!
//! This module contains the configuration-side types (document profiles, the
//! profile registry, tool configuration, acronym glossaries) and the
//! requirement records the pipeline produces.

mod config;
pub use config::Config;

/// Acronym glossaries and their resolution.
pub mod glossary;
pub use glossary::{AcronymEntry, Glossary};

/// Per-document-type extraction rules.
pub mod profile;
pub use profile::{DelimiterStyle, DocumentProfile, FieldMarker, RequirementDelimiter, Rule};

mod record;
pub use record::{FieldKind, RequirementRecord};

pub mod registry;
pub use registry::Registry;
