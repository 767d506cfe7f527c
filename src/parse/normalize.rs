use std::borrow::Cow;

use tracing::instrument;

use crate::domain::{DocumentProfile, Rule};

/// Removes document boilerplate by applying the profile's rules in order.
///
/// A rule that matches nothing is a no-op.
#[must_use]
#[instrument(level = "debug", skip_all, fields(profile = profile.id(), len = raw.len()))]
pub fn normalize(raw: &str, profile: &DocumentProfile) -> String {
    apply_rules(raw, profile.boilerplate())
}

/// Applies a sequence of rules, each to the output of the previous one.
pub(crate) fn apply_rules(text: &str, rules: &[Rule]) -> String {
    let mut text = text.to_string();
    for rule in rules {
        let replaced = match rule.apply(&text) {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };
        if let Some(replaced) = replaced {
            text = replaced;
        }
    }
    text
}
