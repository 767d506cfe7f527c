//! Document profiles.
//!
//! A [`DocumentProfile`] captures everything that differs between the layouts
//! of the supported specification documents: the boilerplate to remove, how
//! chapters and requirements are delimited, which annotation markers follow a
//! statement, and which blocks are placeholders.
//!
//! Profiles are authored as TOML:
//!
//! ```toml
//! _version = "1"
//! id = "EXAMPLE-SRS"
//! front_matter = 1
//! fields = ["remark"]
//! placeholders = ["Deleted", "NA"]
//!
//! [[boilerplate]]
//! pattern = 'Page [0-9]+ of [0-9]+'
//!
//! [[chapters]]
//! pattern = '5\.[0-9]+\s'
//!
//! [requirements]
//! pattern = 'REQ-[0-9]+'
//!
//! [[markers]]
//! pattern = 'Remark:'
//! field = "remark"
//! ```

use std::{borrow::Cow, io, path::Path};

use nonempty::NonEmpty;
use regex::Regex;
use serde::Deserialize;

use crate::domain::FieldKind;

/// A text substitution applied during normalization or cleanup.
#[derive(Debug, Clone)]
pub struct Rule {
    matcher: Matcher,
    replacement: String,
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Rule {
    /// A rule that replaces every verbatim occurrence of `text`.
    #[must_use]
    pub fn literal(text: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Literal(text.into()),
            replacement: replacement.into(),
        }
    }

    /// A rule that replaces every match of a regular expression.
    ///
    /// The replacement may reference capture groups (`$1`, `${name}`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn pattern(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: Matcher::Pattern(Regex::new(pattern)?),
            replacement: replacement.into(),
        })
    }

    /// Applies the rule to `text`, borrowing when nothing matched.
    #[must_use]
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.matcher {
            Matcher::Literal(literal) if literal.is_empty() || !text.contains(literal.as_str()) => {
                Cow::Borrowed(text)
            }
            Matcher::Literal(literal) => Cow::Owned(text.replace(literal.as_str(), &self.replacement)),
            Matcher::Pattern(pattern) => pattern.replace_all(text, self.replacement.as_str()),
        }
    }
}

/// Where a requirement delimiter sits relative to the requirement it marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelimiterStyle {
    /// The delimiter (usually an identifier) introduces the requirement.
    ///
    /// Text before the first delimiter in a chapter is discarded.
    #[default]
    Leading,
    /// The delimiter closes the requirement (an end-of-requirement symbol).
    ///
    /// Text after the last delimiter in a chapter is discarded.
    Terminator,
}

/// The pattern that separates requirements within a chapter.
#[derive(Debug, Clone)]
pub struct RequirementDelimiter {
    pattern: Regex,
    style: DelimiterStyle,
    capture_id: bool,
}

impl RequirementDelimiter {
    /// The compiled delimiter pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Whether the delimiter leads or terminates a requirement.
    #[must_use]
    pub const fn style(&self) -> DelimiterStyle {
        self.style
    }

    /// Whether the delimiter text is kept as the record's external id.
    #[must_use]
    pub const fn capture_id(&self) -> bool {
        self.capture_id
    }
}

/// A marker separating the statement from a trailing annotation.
#[derive(Debug, Clone)]
pub struct FieldMarker {
    pattern: Regex,
    field: Option<FieldKind>,
}

impl FieldMarker {
    /// The compiled marker pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// The field the text after this marker belongs to.
    ///
    /// `None` means the marker only ends the preceding field and the text
    /// following it is discarded.
    #[must_use]
    pub const fn field(&self) -> Option<FieldKind> {
        self.field
    }
}

/// The set of rules describing one document layout.
///
/// Profiles are immutable once constructed. Every pattern is compiled (and
/// therefore validated) when the profile is created.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Versions")]
pub struct DocumentProfile {
    id: String,
    description: String,
    prefixes: Vec<String>,
    drop_last_pages: usize,
    boilerplate: Vec<Rule>,
    chapters: NonEmpty<Regex>,
    front_matter: usize,
    requirements: RequirementDelimiter,
    markers: Vec<FieldMarker>,
    cleanup: Vec<Rule>,
    fields: Vec<FieldKind>,
    placeholders: Vec<String>,
    statement_start: Option<Regex>,
}

impl DocumentProfile {
    /// Parses a profile from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or any pattern in it fails
    /// to compile.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads a profile from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid profile.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| LoadError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The identifier the profile is registered under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A human readable summary of the documents this profile handles.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// File-stem prefixes that select this profile.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether a source file stem belongs to this profile.
    #[must_use]
    pub fn matches_stem(&self, stem: &str) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| stem.starts_with(prefix.as_str()))
    }

    pub(crate) fn matching_prefix_len(&self, stem: &str) -> usize {
        self.prefixes
            .iter()
            .filter(|prefix| stem.starts_with(prefix.as_str()))
            .map(String::len)
            .max()
            .unwrap_or(0)
    }

    /// Number of trailing pages excluded from the raw text.
    #[must_use]
    pub const fn drop_last_pages(&self) -> usize {
        self.drop_last_pages
    }

    /// Boilerplate rules, in application order.
    #[must_use]
    pub fn boilerplate(&self) -> &[Rule] {
        &self.boilerplate
    }

    /// Chapter delimiters, outermost level first.
    #[must_use]
    pub const fn chapter_levels(&self) -> &NonEmpty<Regex> {
        &self.chapters
    }

    /// Number of leading chapters discarded as front matter.
    #[must_use]
    pub const fn front_matter(&self) -> usize {
        self.front_matter
    }

    /// The requirement delimiter.
    #[must_use]
    pub const fn requirements(&self) -> &RequirementDelimiter {
        &self.requirements
    }

    /// Field markers, highest precedence first.
    #[must_use]
    pub fn markers(&self) -> &[FieldMarker] {
        &self.markers
    }

    /// Rules removing residual noise from each requirement block.
    #[must_use]
    pub fn cleanup(&self) -> &[Rule] {
        &self.cleanup
    }

    /// The optional fields emitted, in output order.
    #[must_use]
    pub fn fields(&self) -> &[FieldKind] {
        &self.fields
    }

    /// Pattern locating the real start of a statement, if any.
    #[must_use]
    pub const fn statement_start(&self) -> Option<&Regex> {
        self.statement_start.as_ref()
    }

    /// Whether a statement carries no requirement.
    ///
    /// A statement is a placeholder if it is blank or, once trimmed, exactly
    /// equals one of the configured placeholder tokens.
    #[must_use]
    pub fn is_placeholder(&self, statement: &str) -> bool {
        let trimmed = statement.trim();
        trimmed.is_empty() || self.placeholders.iter().any(|token| token == trimmed)
    }
}

/// Errors raised while building a profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// A pattern failed to compile.
    #[error("invalid {context} pattern '{pattern}': {source}")]
    Pattern {
        /// Which part of the profile the pattern belongs to.
        context: &'static str,
        /// The offending pattern.
        pattern: String,
        /// The underlying compilation error.
        source: regex::Error,
    },

    /// A pattern matches the empty string and would split or replace
    /// between every character.
    #[error("{context} pattern '{pattern}' matches the empty string")]
    EmptyMatch {
        /// Which part of the profile the pattern belongs to.
        context: &'static str,
        /// The offending pattern.
        pattern: String,
    },

    /// A rule declared both or neither of `literal` and `pattern`.
    #[error("{0} rule must set exactly one of 'literal' or 'pattern'")]
    AmbiguousRule(&'static str),

    /// No chapter delimiter was declared.
    #[error("profile '{0}' declares no chapter delimiters")]
    NoChapters(String),

    /// The profile identifier is blank.
    #[error("profile id must not be empty")]
    EmptyId,
}

/// Errors raised while loading a profile file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read profile '{path}'")]
    Read {
        /// Path of the profile file.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The file is not a valid profile.
    #[error("failed to parse profile '{path}'")]
    Parse {
        /// Path of the profile file.
        path: String,
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}

fn compile(context: &'static str, pattern: &str) -> Result<Regex, ProfileError> {
    let regex = Regex::new(pattern).map_err(|source| ProfileError::Pattern {
        context,
        pattern: pattern.to_string(),
        source,
    })?;
    if regex.is_match("") {
        return Err(ProfileError::EmptyMatch {
            context,
            pattern: pattern.to_string(),
        });
    }
    Ok(regex)
}

/// The serialized versions of a profile.
#[derive(Debug, Deserialize)]
#[serde(tag = "_version", deny_unknown_fields)]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        id: String,

        #[serde(default)]
        description: String,

        /// File stem prefixes used to detect the profile.
        #[serde(default, rename = "match")]
        prefixes: Vec<String>,

        #[serde(default)]
        drop_last_pages: usize,

        #[serde(default)]
        boilerplate: Vec<RuleDef>,

        #[serde(default)]
        chapters: Vec<PatternDef>,

        #[serde(default)]
        front_matter: usize,

        requirements: DelimiterDef,

        #[serde(default)]
        markers: Vec<MarkerDef>,

        #[serde(default)]
        cleanup: Vec<RuleDef>,

        #[serde(default)]
        fields: Vec<FieldKind>,

        #[serde(default)]
        placeholders: Vec<String>,

        #[serde(default)]
        statement_start: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDef {
    literal: Option<String>,
    pattern: Option<String>,
    #[serde(default)]
    replacement: String,
}

impl RuleDef {
    fn build(self, context: &'static str) -> Result<Rule, ProfileError> {
        match (self.literal, self.pattern) {
            (Some(literal), None) => Ok(Rule::literal(literal, self.replacement)),
            (None, Some(pattern)) => {
                let regex = compile(context, &pattern)?;
                Ok(Rule {
                    matcher: Matcher::Pattern(regex),
                    replacement: self.replacement,
                })
            }
            _ => Err(ProfileError::AmbiguousRule(context)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternDef {
    pattern: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DelimiterDef {
    pattern: String,
    #[serde(default)]
    style: DelimiterStyle,
    #[serde(default)]
    capture_id: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkerDef {
    pattern: String,
    field: Option<FieldKind>,
}

impl TryFrom<Versions> for DocumentProfile {
    type Error = ProfileError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                id,
                description,
                prefixes,
                drop_last_pages,
                boilerplate,
                chapters,
                front_matter,
                requirements,
                markers,
                cleanup,
                fields,
                placeholders,
                statement_start,
            } => {
                if id.trim().is_empty() {
                    return Err(ProfileError::EmptyId);
                }

                let boilerplate = boilerplate
                    .into_iter()
                    .map(|rule| rule.build("boilerplate"))
                    .collect::<Result<Vec<_>, _>>()?;

                let chapters = chapters
                    .iter()
                    .map(|level| compile("chapter", &level.pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                let chapters =
                    NonEmpty::from_vec(chapters).ok_or_else(|| ProfileError::NoChapters(id.clone()))?;

                let requirements = RequirementDelimiter {
                    pattern: compile("requirement", &requirements.pattern)?,
                    style: requirements.style,
                    capture_id: requirements.capture_id,
                };

                let markers = markers
                    .into_iter()
                    .map(|marker| {
                        Ok(FieldMarker {
                            pattern: compile("marker", &marker.pattern)?,
                            field: marker.field,
                        })
                    })
                    .collect::<Result<Vec<_>, ProfileError>>()?;

                let cleanup = cleanup
                    .into_iter()
                    .map(|rule| rule.build("cleanup"))
                    .collect::<Result<Vec<_>, _>>()?;

                let statement_start = statement_start
                    .as_deref()
                    .map(|pattern| compile("statement start", pattern))
                    .transpose()?;

                Ok(Self {
                    id,
                    description,
                    prefixes,
                    drop_last_pages,
                    boilerplate,
                    chapters,
                    front_matter,
                    requirements,
                    markers,
                    cleanup,
                    fields,
                    placeholders,
                    statement_start,
                })
            }
        }
    }
}
