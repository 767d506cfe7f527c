//! The text-to-records pipeline stages.
//!
//! Each stage is a pure function of its input and the [`DocumentProfile`]:
//!
//! 1. [`normalize`] removes boilerplate,
//! 2. [`segment`] splits the text into chapters,
//! 3. [`recordize`] splits a chapter into requirement blocks,
//! 4. [`split`] turns a block into a record or a placeholder.
//!
//! [`DocumentProfile`]: crate::DocumentProfile

mod fields;
mod normalize;
mod recordize;
mod segment;

use regex::{Captures, Regex};

pub use fields::{split, Split};
pub use normalize::normalize;
pub(crate) use normalize::apply_rules;
pub use recordize::{recordize, RequirementBlock};
pub use segment::{segment, Chapter, Segmentation};

/// A span of text and the delimiter match that opened it.
///
/// The first piece of any split has no delimiter.
struct Piece<'a> {
    delimiter: Option<Captures<'a>>,
    text: &'a str,
}

/// Splits `text` at every match of `pattern`, keeping the matches.
///
/// Always returns one more piece than there were matches.
fn split_with<'a>(pattern: &Regex, text: &'a str) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut delimiter = None;

    for captures in pattern.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        pieces.push(Piece {
            delimiter: delimiter.take(),
            text: &text[last..whole.start()],
        });
        last = whole.end();
        delimiter = Some(captures);
    }

    pieces.push(Piece {
        delimiter,
        text: &text[last..],
    });
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_delimiters_with_following_text() {
        let pattern = Regex::new(r"REQ-\d+").unwrap();
        let pieces = split_with(&pattern, "intro REQ-1 one REQ-2 two");

        let texts: Vec<_> = pieces.iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["intro ", " one ", " two"]);

        let delimiters: Vec<_> = pieces
            .iter()
            .map(|p| p.delimiter.as_ref().and_then(|c| c.get(0)).map(|m| m.as_str()))
            .collect();
        assert_eq!(delimiters, vec![None, Some("REQ-1"), Some("REQ-2")]);
    }

    #[test]
    fn split_without_match_returns_whole_text() {
        let pattern = Regex::new(r"REQ-\d+").unwrap();
        let pieces = split_with(&pattern, "nothing here");

        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].text, "nothing here");
        assert!(pieces[0].delimiter.is_none());
    }
}
