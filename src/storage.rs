//! Filesystem boundaries of the pipeline: reading source documents, writing
//! extracted requirements, and deriving output locations.

mod path;
pub mod sink;
pub mod source;

pub use path::output_path;
pub use sink::{Serializer, SinkError};
pub use source::{concatenate, AutoSource, PdfSource, PlainTextSource, SourceError, TextSource};
