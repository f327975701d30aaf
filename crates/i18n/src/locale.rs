use crate::i18n_catalog::LocaleTable;

pub const SYSTEM_LOCALE_PREFERENCE: &str = "system";
pub const DEFAULT_LOCALE: &str = "en";

const SYSTEM_LOCALE_ENV_KEYS: [&str; 4] = ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleState {
    pub preference: String,
    pub resolved: String,
}

impl LocaleState {
    pub fn from_preference(preference: &str, table: &LocaleTable) -> Self {
        let preference = normalize_locale_preference(preference)
            .unwrap_or_else(|| SYSTEM_LOCALE_PREFERENCE.to_string());
        let resolved = resolve_locale(&preference, table);
        Self {
            preference,
            resolved,
        }
    }
}

pub fn normalize_locale_preference(value: &str) -> Option<String> {
    let normalized = value.trim();
    if normalized.eq_ignore_ascii_case(SYSTEM_LOCALE_PREFERENCE) {
        return Some(SYSTEM_LOCALE_PREFERENCE.to_string());
    }

    normalize_locale_value(normalized)
}

/// Maps a preference onto a locale the table actually carries.
///
/// `nl-BE` falls back to `nl` when only the language is loaded; anything
/// unsupported resolves to [`DEFAULT_LOCALE`].
pub fn resolve_locale(preference: &str, table: &LocaleTable) -> String {
    if preference == SYSTEM_LOCALE_PREFERENCE {
        return resolve_system_locale(table);
    }

    normalize_locale_value(preference)
        .and_then(|locale| match_supported(&locale, table))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

pub fn resolve_system_locale(table: &LocaleTable) -> String {
    resolve_system_locale_with(|key| std::env::var(key).ok(), table)
}

fn resolve_system_locale_with<F>(lookup: F, table: &LocaleTable) -> String
where
    F: Fn(&str) -> Option<String>,
{
    for key in SYSTEM_LOCALE_ENV_KEYS {
        let Some(value) = lookup(key) else {
            continue;
        };
        // LANGUAGE is a colon separated priority list.
        for candidate in value.split(':') {
            if let Some(locale) =
                normalize_locale_value(candidate).and_then(|locale| match_supported(&locale, table))
            {
                return locale;
            }
        }
    }

    DEFAULT_LOCALE.to_string()
}

fn match_supported(locale: &str, table: &LocaleTable) -> Option<String> {
    if table.contains_locale(locale) {
        return Some(locale.to_string());
    }

    let language = locale.split('-').next()?;
    table
        .contains_locale(language)
        .then(|| language.to_string())
}

fn normalize_locale_value(raw: &str) -> Option<String> {
    // Strip POSIX encoding and modifier suffixes: `nl_NL.UTF-8@euro`.
    let base = raw.trim().split(['.', '@']).next()?.replace('_', "-");
    if base.is_empty() {
        return None;
    }

    let mut parts = base.split('-');
    let language = parts.next()?.trim().to_ascii_lowercase();
    if language.len() != 2 || !language.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return None;
    }

    let region = parts
        .find(|part| part.len() == 2 && part.chars().all(|ch| ch.is_ascii_alphabetic()))
        .map(|part| part.to_ascii_uppercase());

    match region {
        Some(region) => Some(format!("{language}-{region}")),
        None => Some(language),
    }
}

#[cfg(test)]
#[path = "../tests/locale_tests.rs"]
mod tests;
