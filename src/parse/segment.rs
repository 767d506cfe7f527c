use tracing::instrument;

use super::{split_with, Piece};
use crate::domain::DocumentProfile;

/// A contiguous span of normalized text bounded by chapter delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chapter<'a> {
    /// Position of the chapter in the document, after front matter removal.
    pub index: usize,
    /// The delimiter match that opened the chapter, trimmed.
    ///
    /// Empty for text that precedes the first delimiter.
    pub heading: &'a str,
    /// The chapter body, excluding the heading.
    pub text: &'a str,
}

/// The result of segmenting a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation<'a> {
    /// Chapters in document order.
    pub chapters: Vec<Chapter<'a>>,
    /// Chapter delimiter matches found across all levels.
    pub delimiter_matches: usize,
    /// Leading chapters discarded as front matter.
    pub discarded: usize,
}

/// Splits normalized text into an ordered sequence of chapters.
///
/// The text is split by the outermost chapter delimiter and the declared
/// number of leading chapters is dropped. Each further level re-splits every
/// chapter of the level above and the result is flattened in order.
///
/// If the outermost delimiter never matches, the whole text is a single
/// chapter and nothing is dropped.
#[must_use]
#[instrument(level = "debug", skip_all, fields(profile = profile.id()))]
pub fn segment<'a>(text: &'a str, profile: &DocumentProfile) -> Segmentation<'a> {
    let levels = profile.chapter_levels();

    let top = split_with(&levels.head, text);
    let mut delimiter_matches = top.len() - 1;

    let (mut spans, discarded) = if delimiter_matches == 0 {
        tracing::debug!("no chapter delimiter matched, using whole text");
        (vec![("", text)], 0)
    } else {
        let discarded = profile.front_matter().min(top.len());
        let spans = top
            .into_iter()
            .skip(discarded)
            .map(|piece| (heading(&piece, ""), piece.text))
            .collect::<Vec<_>>();
        (spans, discarded)
    };

    for level in &levels.tail {
        let mut nested = Vec::with_capacity(spans.len());
        for (parent_heading, body) in spans {
            let pieces = split_with(level, body);
            delimiter_matches += pieces.len() - 1;
            nested.extend(
                pieces
                    .into_iter()
                    .map(|piece| (heading(&piece, parent_heading), piece.text)),
            );
        }
        spans = nested;
    }

    let chapters: Vec<_> = spans
        .into_iter()
        .enumerate()
        .map(|(index, (heading, text))| Chapter {
            index,
            heading,
            text,
        })
        .collect();

    tracing::debug!(
        chapters = chapters.len(),
        delimiter_matches,
        discarded,
        "segmented document"
    );

    Segmentation {
        chapters,
        delimiter_matches,
        discarded,
    }
}

fn heading<'a>(piece: &Piece<'a>, fallback: &'a str) -> &'a str {
    piece
        .delimiter
        .as_ref()
        .and_then(|captures| captures.get(0))
        .map_or(fallback, |m| m.as_str().trim())
}
