use crate::i18n_catalog::LocaleTable;
use crate::interpolate::{interpolate, placeholders};
use crate::locale::{DEFAULT_LOCALE, LocaleState};
use std::sync::Arc;

/// Translation front end bound to one active locale.
///
/// Lookups walk active locale, then the fallback locale, then return the raw
/// key. None of these paths fail.
#[derive(Debug, Clone)]
pub struct Localizer {
    table: Arc<LocaleTable>,
    active: String,
    fallback: String,
}

impl Localizer {
    pub fn new(table: Arc<LocaleTable>, state: &LocaleState) -> Self {
        Self {
            table,
            active: state.resolved.clone(),
            fallback: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(&self, locale: impl Into<String>) -> Self {
        Self {
            table: Arc::clone(&self.table),
            active: locale.into(),
            fallback: self.fallback.clone(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn active_locale(&self) -> &str {
        &self.active
    }

    pub fn fallback_locale(&self) -> &str {
        &self.fallback
    }

    pub fn table(&self) -> &Arc<LocaleTable> {
        &self.table
    }

    pub fn t(&self, key: &str) -> String {
        self.translate(key, &[])
    }

    pub fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self
            .table
            .lookup_with_fallback(&self.active, &self.fallback, key)
        else {
            tracing::warn!(event = "i18n_missing_key", locale = %self.active, key = key);
            return key.to_string();
        };

        let unresolved = placeholders(template)
            .into_iter()
            .filter(|name| !params.iter().any(|(param, _)| param == name))
            .collect::<Vec<_>>();
        if !unresolved.is_empty() {
            tracing::debug!(
                event = "i18n_placeholder_unresolved",
                locale = %self.active,
                key = key,
                fields = ?unresolved
            );
        }

        interpolate(template, params)
    }
}

#[cfg(test)]
#[path = "../tests/localizer_tests.rs"]
mod tests;
