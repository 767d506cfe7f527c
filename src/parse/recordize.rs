use regex::Captures;

use super::{split_with, Chapter};
use crate::domain::{DelimiterStyle, DocumentProfile};

/// The raw text of one requirement, before field splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementBlock<'a> {
    /// Index of the chapter the block belongs to.
    pub chapter: usize,
    /// Position of the block within its chapter.
    pub index: usize,
    /// The identifier taken from the delimiter, if the profile captures it.
    pub id: Option<&'a str>,
    /// The block text, excluding the delimiter.
    pub text: &'a str,
}

/// Splits a chapter into requirement blocks.
///
/// For leading delimiters the text before the first match (the chapter
/// header) is discarded; for terminating delimiters the text after the last
/// match is discarded. A chapter without any match yields no blocks.
#[must_use]
pub fn recordize<'a>(chapter: &Chapter<'a>, profile: &DocumentProfile) -> Vec<RequirementBlock<'a>> {
    let delimiter = profile.requirements();
    let pieces = split_with(delimiter.pattern(), chapter.text);
    let capture = |captures: Option<&Captures<'a>>| {
        if delimiter.capture_id() {
            captures.and_then(identifier)
        } else {
            None
        }
    };

    let spans: Vec<_> = match delimiter.style() {
        DelimiterStyle::Leading => pieces
            .iter()
            .skip(1)
            .map(|piece| (capture(piece.delimiter.as_ref()), piece.text))
            .collect(),
        DelimiterStyle::Terminator => pieces
            .windows(2)
            .map(|pair| (capture(pair[1].delimiter.as_ref()), pair[0].text))
            .collect(),
    };

    tracing::trace!(
        chapter = chapter.index,
        heading = chapter.heading,
        blocks = spans.len(),
        "recordized chapter"
    );

    spans
        .into_iter()
        .enumerate()
        .map(|(index, (id, text))| RequirementBlock {
            chapter: chapter.index,
            index,
            id,
            text,
        })
        .collect()
}

/// The first capture group if the pattern has one, else the whole match.
fn identifier<'a>(captures: &Captures<'a>) -> Option<&'a str> {
    let m = if captures.len() > 1 {
        captures.get(1)?
    } else {
        captures.get(0)?
    };
    Some(m.as_str().trim()).filter(|id| !id.is_empty())
}
