use std::fmt;

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// An optional annotation field that can follow a requirement statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A remark or note attached to the requirement.
    Remark,
    /// The justification for the requirement.
    Rationale,
    /// A free-form comment.
    Comment,
    /// How the requirement is to be verified (test, analysis, ...).
    VerificationMethod,
    /// The identifier the source document assigns to the requirement.
    ExternalId,
}

impl FieldKind {
    /// The name used for this field in profile files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remark => "remark",
            Self::Rationale => "rationale",
            Self::Comment => "comment",
            Self::VerificationMethod => "verification_method",
            Self::ExternalId => "external_id",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted requirement.
///
/// The statement is guaranteed to be non-empty. Optional fields are kept in
/// the order the profile declares them, which is the order they are
/// serialized in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRecord {
    statement: NonEmptyString,
    fields: Vec<(FieldKind, String)>,
}

impl RequirementRecord {
    /// Creates a record with no optional fields.
    ///
    /// Returns `None` if the statement is empty or whitespace-only.
    #[must_use]
    pub fn new(statement: impl Into<String>) -> Option<Self> {
        let statement = statement.into();
        if statement.trim().is_empty() {
            return None;
        }
        NonEmptyString::new(statement).ok().map(|statement| Self {
            statement,
            fields: Vec::new(),
        })
    }

    /// Builder-style helper that appends an optional field.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_field(mut self, kind: FieldKind, value: impl Into<String>) -> Self {
        self.push_field(kind, value);
        self
    }

    pub(crate) fn push_field(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.push((kind, value));
        }
    }

    /// The requirement statement.
    #[must_use]
    pub fn statement(&self) -> &str {
        self.statement.as_str()
    }

    /// Returns the value of an optional field, if present.
    #[must_use]
    pub fn field(&self, kind: FieldKind) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the optional fields in output order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldKind, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Applies `f` to the statement and every optional field.
    ///
    /// The statement is left untouched if `f` would make it blank.
    pub(crate) fn map_values(&mut self, mut f: impl FnMut(&str) -> Option<String>) {
        if let Some(statement) = f(self.statement.as_str()) {
            if !statement.trim().is_empty() {
                if let Ok(statement) = NonEmptyString::new(statement) {
                    self.statement = statement;
                }
            }
        }
        for (_, value) in &mut self.fields {
            if let Some(updated) = f(value) {
                *value = updated;
            }
        }
    }
}
