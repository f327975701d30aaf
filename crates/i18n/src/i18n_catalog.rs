use crate::interpolate::placeholders;
use crate::locale::DEFAULT_LOCALE;
use anyhow::{Context, Result};
use protocol::{AppError, AppResult, ResultExt};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One namespace file of one locale, as raw JSON text.
#[derive(Debug, Clone, Copy)]
pub struct BundleSource<'a> {
    pub locale: &'a str,
    pub namespace: &'a str,
    pub content: &'a str,
}

macro_rules! builtin_bundle {
    ($locale:literal, $namespace:literal) => {
        BundleSource {
            locale: $locale,
            namespace: $namespace,
            content: include_str!(concat!(
                "../../../i18n/source/",
                $locale,
                "/",
                $namespace,
                ".json"
            )),
        }
    };
}

const BUILTIN_BUNDLES: &[BundleSource<'static>] = &[
    builtin_bundle!("en", "general"),
    builtin_bundle!("en", "validation"),
    builtin_bundle!("en", "menu"),
    builtin_bundle!("en", "login"),
    builtin_bundle!("en", "native"),
    builtin_bundle!("nl", "general"),
    builtin_bundle!("nl", "validation"),
    builtin_bundle!("nl", "menu"),
    builtin_bundle!("nl", "login"),
    builtin_bundle!("nl", "native"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CatalogLayer {
    values: HashMap<String, HashMap<String, String>>,
    namespaces: HashMap<String, BTreeSet<String>>,
}

impl CatalogLayer {
    fn insert_namespace(
        &mut self,
        locale: &str,
        namespace: &str,
        entries: HashMap<String, String>,
    ) {
        self.values
            .entry(locale.to_string())
            .or_default()
            .extend(entries);

        self.namespaces
            .entry(locale.to_string())
            .or_default()
            .insert(namespace.to_string());
    }

    fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.values
            .get(locale)
            .and_then(|bucket| bucket.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMismatch {
    pub locale: String,
    pub key: String,
    pub expected: BTreeSet<String>,
    pub found: BTreeSet<String>,
}

/// Differences between every locale and the reference locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletenessReport {
    pub reference: String,
    pub reference_present: bool,
    pub missing: BTreeMap<String, Vec<String>>,
    pub extra: BTreeMap<String, Vec<String>>,
    pub placeholder_mismatches: Vec<PlaceholderMismatch>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.reference_present
            && self.missing.is_empty()
            && self.extra.is_empty()
            && self.placeholder_mismatches.is_empty()
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.reference_present {
            problems.push(format!("reference locale {} is not loaded", self.reference));
        }
        for (locale, keys) in &self.missing {
            problems.push(format!("{locale} is missing keys: {}", keys.join(", ")));
        }
        for (locale, keys) in &self.extra {
            problems.push(format!(
                "{locale} has keys unknown to {}: {}",
                self.reference,
                keys.join(", ")
            ));
        }
        for mismatch in &self.placeholder_mismatches {
            problems.push(format!(
                "{} key={} placeholders {:?} differ from {:?}",
                mismatch.locale, mismatch.key, mismatch.found, mismatch.expected
            ));
        }
        problems
    }

    fn into_error(self) -> AppError {
        let problems = self.problems();
        AppError::new("locale_table_incomplete", "translation tables are incomplete")
            .with_context("referenceLocale", self.reference)
            .with_causes(problems)
    }
}

/// Translation strings keyed by locale, then by dotted key.
///
/// The builtin layer is compiled into the binary; an optional overlay read
/// from disk takes precedence per key. The table has no mutating API once
/// loaded and is meant to be shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleTable {
    builtin: CatalogLayer,
    overlay: CatalogLayer,
    overlay_files: u32,
    overlay_warnings: Vec<String>,
}

impl LocaleTable {
    pub fn builtin() -> AppResult<Self> {
        Self::from_bundles(BUILTIN_BUNDLES)
    }

    /// Builds a table from in-memory bundles, requiring every locale to carry
    /// the same keys and placeholders as [`DEFAULT_LOCALE`].
    pub fn from_bundles(bundles: &[BundleSource<'_>]) -> AppResult<Self> {
        let builtin = load_bundle_layer(bundles)
            .with_code("locale_bundle_invalid", "translation bundle is invalid")?;
        let table = Self {
            builtin,
            overlay: CatalogLayer::default(),
            overlay_files: 0,
            overlay_warnings: Vec::new(),
        };

        let report = table.completeness(DEFAULT_LOCALE);
        if !report.is_complete() {
            return Err(report.into_error());
        }
        Ok(table)
    }

    /// Loads the builtin bundles plus `<overlay_root>/<locale>/<namespace>.json`.
    ///
    /// A missing root is skipped. An unreadable root, unreadable or malformed
    /// overlay files are recorded as warnings; gaps in overlay locales are
    /// reported but not fatal. Only an invalid builtin layer fails the load.
    pub fn load(overlay_root: Option<&Path>) -> AppResult<Self> {
        let mut table = Self::builtin()?;
        let Some(root) = overlay_root else {
            return Ok(table);
        };

        let overlay = load_overlay_layer(root);
        table.overlay = overlay.layer;
        table.overlay_files = overlay.loaded_files;
        table.overlay_warnings = overlay.warnings;

        for warning in &table.overlay_warnings {
            tracing::warn!(event = "i18n_overlay_load_warning", detail = %warning);
        }

        let report = table.completeness(DEFAULT_LOCALE);
        for problem in report.problems() {
            tracing::warn!(event = "i18n_overlay_incomplete", detail = %problem);
        }

        tracing::info!(
            event = "i18n_catalog_loaded",
            locales = table.locales().len(),
            overlay_files = table.overlay_files
        );
        Ok(table)
    }

    pub fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.overlay
            .get(locale, key)
            .or_else(|| self.builtin.get(locale, key))
    }

    pub fn lookup_with_fallback(&self, locale: &str, fallback_locale: &str, key: &str) -> Option<&str> {
        self.lookup(locale, key)
            .or_else(|| self.lookup(fallback_locale, key))
    }

    pub fn contains_locale(&self, locale: &str) -> bool {
        self.builtin.values.contains_key(locale) || self.overlay.values.contains_key(locale)
    }

    pub fn locales(&self) -> BTreeSet<&str> {
        self.builtin
            .values
            .keys()
            .chain(self.overlay.values.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn namespaces(&self, locale: &str) -> BTreeSet<&str> {
        [&self.builtin, &self.overlay]
            .into_iter()
            .filter_map(|layer| layer.namespaces.get(locale))
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn keys(&self, locale: &str) -> BTreeSet<&str> {
        self.merged(locale).into_keys().collect()
    }

    pub fn overlay_files(&self) -> u32 {
        self.overlay_files
    }

    pub fn overlay_warnings(&self) -> &[String] {
        &self.overlay_warnings
    }

    pub fn completeness(&self, reference: &str) -> CompletenessReport {
        let mut report = CompletenessReport {
            reference: reference.to_string(),
            reference_present: self.contains_locale(reference),
            ..CompletenessReport::default()
        };

        let expected = self.merged(reference);
        for locale in self.locales() {
            if locale == reference {
                continue;
            }

            let actual = self.merged(locale);
            let missing = expected
                .keys()
                .filter(|key| !actual.contains_key(*key))
                .map(|key| key.to_string())
                .collect::<Vec<_>>();
            let extra = actual
                .keys()
                .filter(|key| !expected.contains_key(*key))
                .map(|key| key.to_string())
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                report.missing.insert(locale.to_string(), missing);
            }
            if !extra.is_empty() {
                report.extra.insert(locale.to_string(), extra);
            }

            for (key, template) in &actual {
                let Some(reference_template) = expected.get(key) else {
                    continue;
                };
                let expected_fields = placeholders(reference_template);
                let found_fields = placeholders(template);
                if expected_fields != found_fields {
                    report.placeholder_mismatches.push(PlaceholderMismatch {
                        locale: locale.to_string(),
                        key: key.to_string(),
                        expected: expected_fields,
                        found: found_fields,
                    });
                }
            }
        }

        report
    }

    fn merged(&self, locale: &str) -> BTreeMap<&str, &str> {
        let mut merged = BTreeMap::new();
        for layer in [&self.builtin, &self.overlay] {
            if let Some(bucket) = layer.values.get(locale) {
                for (key, value) in bucket {
                    merged.insert(key.as_str(), value.as_str());
                }
            }
        }
        merged
    }
}

#[derive(Debug, Default)]
struct OverlayLoadResult {
    layer: CatalogLayer,
    loaded_files: u32,
    warnings: Vec<String>,
}

fn load_bundle_layer(bundles: &[BundleSource<'_>]) -> Result<CatalogLayer> {
    let mut layer = CatalogLayer::default();
    for bundle in bundles {
        validate_locale_code(bundle.locale)?;
        validate_namespace(bundle.namespace)?;
        let entries = parse_translation_json(
            bundle.content,
            bundle.namespace,
            &format!("bundle:{}:{}", bundle.locale, bundle.namespace),
        )?;
        layer.insert_namespace(bundle.locale, bundle.namespace, entries);
    }
    Ok(layer)
}

fn load_overlay_layer(root: &Path) -> OverlayLoadResult {
    let mut result = OverlayLoadResult::default();

    let locale_dirs = match fs::read_dir(root) {
        Ok(value) => value,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::debug!(event = "i18n_overlay_missing", overlay_root = %root.display());
            return result;
        }
        Err(error) => {
            result.warnings.push(format!(
                "failed to read locale overlay directory {}: {error}",
                root.display()
            ));
            return result;
        }
    };
    for locale_entry in locale_dirs {
        let locale_entry = match locale_entry {
            Ok(value) => value,
            Err(error) => {
                result
                    .warnings
                    .push(format!("failed to read overlay entry: {error}"));
                continue;
            }
        };

        let path = locale_entry.path();
        if !path.is_dir() {
            continue;
        }

        let locale = locale_entry.file_name().to_string_lossy().to_string();
        if let Err(error) = validate_locale_code(&locale) {
            result
                .warnings
                .push(format!("skipping overlay directory {locale}: {error}"));
            continue;
        }

        let namespace_files = match fs::read_dir(&path) {
            Ok(value) => value,
            Err(error) => {
                result
                    .warnings
                    .push(format!("failed to read overlay locale {locale}: {error}"));
                continue;
            }
        };

        for namespace_entry in namespace_files.flatten() {
            let namespace_path = namespace_entry.path();
            if !namespace_path.is_file()
                || namespace_path.extension().and_then(|value| value.to_str()) != Some("json")
            {
                continue;
            }

            match load_overlay_namespace(&namespace_path, &locale) {
                Ok((namespace, entries)) => {
                    result.layer.insert_namespace(&locale, &namespace, entries);
                    result.loaded_files += 1;
                }
                Err(error) => result.warnings.push(format!(
                    "skipping overlay file {}: {error:#}",
                    namespace_path.display()
                )),
            }
        }
    }

    result
}

fn load_overlay_namespace(path: &Path, locale: &str) -> Result<(String, HashMap<String, String>)> {
    let namespace = path
        .file_stem()
        .and_then(|value| value.to_str())
        .map(|value| value.trim().to_string())
        .context("file name is not valid UTF-8")?;
    validate_namespace(&namespace)?;

    let content = fs::read_to_string(path).context("failed to read file")?;
    let entries = parse_translation_json(
        &content,
        &namespace,
        &format!("overlay:{locale}:{namespace}"),
    )?;
    Ok((namespace, entries))
}

fn parse_translation_json(
    content: &str,
    namespace: &str,
    context: &str,
) -> Result<HashMap<String, String>> {
    let value: Value =
        serde_json::from_str(content).with_context(|| format!("{context} is not valid JSON"))?;
    anyhow::ensure!(value.is_object(), "{context} must be a JSON object");

    let mut entries = HashMap::new();
    flatten_entries(namespace, &value, &mut entries, context)?;
    Ok(entries)
}

fn flatten_entries(
    prefix: &str,
    value: &Value,
    entries: &mut HashMap<String, String>,
    context: &str,
) -> Result<()> {
    match value {
        Value::String(text) => {
            entries.insert(prefix.to_string(), text.clone());
        }
        Value::Object(object) => {
            for (segment, nested) in object {
                validate_key_segment(segment)?;
                flatten_entries(&format!("{prefix}.{segment}"), nested, entries, context)?;
            }
        }
        _ => anyhow::bail!("{context} key={prefix} must be a string or an object"),
    }
    Ok(())
}

fn validate_key_segment(segment: &str) -> Result<()> {
    anyhow::ensure!(!segment.trim().is_empty(), "translation key segment is empty");
    anyhow::ensure!(
        segment
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'),
        "invalid translation key segment: {segment}"
    );
    Ok(())
}

fn validate_locale_code(locale: &str) -> Result<()> {
    let mut parts = locale.split('-');
    let language = parts.next().unwrap_or_default();
    anyhow::ensure!(
        language.len() == 2 && language.chars().all(|ch| ch.is_ascii_lowercase()),
        "invalid locale language: {locale}"
    );

    if let Some(region) = parts.next() {
        anyhow::ensure!(
            region.len() == 2 && region.chars().all(|ch| ch.is_ascii_uppercase()),
            "invalid locale region: {locale}"
        );
    }
    anyhow::ensure!(parts.next().is_none(), "invalid locale code: {locale}");
    Ok(())
}

fn validate_namespace(namespace: &str) -> Result<()> {
    let value = namespace.trim();
    anyhow::ensure!(!value.is_empty(), "namespace is empty");
    anyhow::ensure!(
        value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'),
        "invalid namespace: {namespace}"
    );
    Ok(())
}

#[cfg(test)]
#[path = "../tests/i18n_catalog_tests.rs"]
mod tests;
