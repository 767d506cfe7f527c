use std::collections::BTreeMap;

use super::{apply_rules, RequirementBlock};
use crate::domain::{DocumentProfile, FieldKind, RequirementRecord};

/// The outcome of splitting a requirement block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split {
    /// The block holds a requirement.
    Record(RequirementRecord),
    /// The block is empty or a "no requirement here" marker.
    Placeholder,
}

/// A marker occurrence accepted for a block.
#[derive(Debug, Clone, Copy)]
struct Accepted {
    start: usize,
    end: usize,
    field: Option<FieldKind>,
}

/// Separates a block into a statement and its annotation fields.
///
/// Cleanup rules run first. Markers are then located in precedence order:
/// each marker contributes its first occurrence that does not overlap an
/// occurrence already taken by a higher-precedence marker. The statement is
/// the text before the earliest occurrence, and each marker's value runs up
/// to the next occurrence.
///
/// Fields are emitted in the order the profile lists them, regardless of
/// where they appear in the source text.
#[must_use]
pub fn split(block: &RequirementBlock<'_>, profile: &DocumentProfile) -> Split {
    let cleaned = apply_rules(block.text, profile.cleanup());

    let mut accepted: Vec<Accepted> = Vec::new();
    for marker in profile.markers() {
        let occurrence = marker
            .pattern()
            .find_iter(&cleaned)
            .find(|m| !accepted.iter().any(|a| m.start() < a.end && a.start < m.end()));
        if let Some(m) = occurrence {
            accepted.push(Accepted {
                start: m.start(),
                end: m.end(),
                field: marker.field(),
            });
        }
    }
    accepted.sort_by_key(|a| a.start);

    let statement_end = accepted.first().map_or(cleaned.len(), |a| a.start);
    let statement = trim_statement(&cleaned[..statement_end], profile);

    if profile.is_placeholder(statement) {
        return Split::Placeholder;
    }
    let Some(mut record) = RequirementRecord::new(statement.trim()) else {
        return Split::Placeholder;
    };

    let mut values: BTreeMap<FieldKind, Vec<&str>> = BTreeMap::new();
    for (i, occurrence) in accepted.iter().enumerate() {
        let Some(field) = occurrence.field else {
            continue;
        };
        let value_end = accepted.get(i + 1).map_or(cleaned.len(), |next| next.start);
        let value = cleaned[occurrence.end..value_end].trim();
        if !value.is_empty() {
            values.entry(field).or_default().push(value);
        }
    }

    for &field in profile.fields() {
        if field == FieldKind::ExternalId {
            if let Some(id) = block.id {
                record.push_field(field, id);
            }
        } else if let Some(parts) = values.get(&field) {
            record.push_field(field, parts.join(" "));
        }
    }

    Split::Record(record)
}

/// Moves the start of the statement to the profile's statement-start match.
fn trim_statement<'a>(statement: &'a str, profile: &DocumentProfile) -> &'a str {
    let Some(pattern) = profile.statement_start() else {
        return statement;
    };
    pattern
        .captures(statement)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(0)))
        .map_or(statement, |m| &statement[m.start()..])
}
