use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn placeholder_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").ok())
        .as_ref()
}

/// Replaces `{name}` tokens with the matching parameter value.
///
/// Substitution is a single pass, so values containing braces are never
/// expanded again. A token without a matching parameter is left literal.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    let Some(regex) = placeholder_regex() else {
        return template.to_string();
    };

    regex
        .replace_all(template, |captures: &Captures<'_>| {
            let name = &captures[1];
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

/// Names of all `{name}` tokens in `template`.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    let Some(regex) = placeholder_regex() else {
        return BTreeSet::new();
    };

    regex
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .collect()
}

#[cfg(test)]
#[path = "../tests/interpolate_tests.rs"]
mod tests;
