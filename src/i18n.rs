//! Locale catalog for user-facing validator messages.
//!
//! Messages are resolved here by the hosting layer and handed to validators
//! at construction time; the form engine itself never translates.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::form::{RuleKind, ValidationMessage};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/rxform_i18n_generated.rs"));
}

#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub enum Locale {
    #[default]
    System,
    Tag(String),
}

impl From<String> for Locale {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("system") {
            return Self::System;
        }
        Self::Tag(value.trim().to_string())
    }
}

impl From<&str> for Locale {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

#[derive(Clone)]
pub struct I18nManager {
    catalog: Arc<I18nCatalog>,
    locale: Arc<RwLock<Locale>>,
}

impl Default for I18nManager {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nManager {
    pub fn new() -> Self {
        Self::with_locale(Locale::System)
    }

    pub fn with_locale(locale: impl Into<Locale>) -> Self {
        Self {
            catalog: Arc::new(I18nCatalog::load()),
            locale: Arc::new(RwLock::new(locale.into())),
        }
    }

    pub fn locale(&self) -> Locale {
        match self.locale.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_locale(&self, locale: impl Into<Locale>) {
        let mut guard = match self.locale.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = locale.into();
    }

    pub fn default_locale(&self) -> &'static str {
        self.catalog.default_locale
    }

    pub fn resolved_locale(&self) -> &'static str {
        self.catalog
            .resolve_locale(self.requested_locale().as_deref())
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Translation for `key`, or the key itself when no locale has it.
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    /// Like [`I18nManager::t`], substituting `{name}` placeholders.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.lookup(key).unwrap_or(key);
        if params.is_empty() {
            return template.to_string();
        }
        format_template(template, params)
    }

    pub fn message(&self, key: &str, kind: RuleKind) -> ValidationMessage {
        ValidationMessage::with_kind(self.t(key), kind)
    }

    pub fn message_with(
        &self,
        key: &str,
        kind: RuleKind,
        params: &[(&str, &str)],
    ) -> ValidationMessage {
        ValidationMessage::with_kind(self.t_with(key, params), kind)
    }

    fn requested_locale(&self) -> Option<String> {
        match self.locale() {
            Locale::System => system_locale(),
            Locale::Tag(tag) => Some(tag),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        let resolved = self.resolved_locale();
        self.catalog
            .lookup(resolved, key)
            .or_else(|| self.catalog.lookup(self.catalog.default_locale, key))
    }
}

#[cfg(feature = "i18n")]
fn system_locale() -> Option<String> {
    sys_locale::get_locale()
}

#[cfg(not(feature = "i18n"))]
fn system_locale() -> Option<String> {
    None
}

struct I18nCatalog {
    default_locale: &'static str,
    locales: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    normalized_locale_lookup: HashMap<String, &'static str>,
    language_lookup: HashMap<String, &'static str>,
}

impl I18nCatalog {
    fn load() -> Self {
        let mut locales = HashMap::new();
        let mut normalized_locale_lookup = HashMap::new();
        let mut language_lookup = HashMap::new();
        let mut ambiguous_languages = HashSet::new();

        for (locale, entries) in generated::LOCALES.iter().copied() {
            let normalized = normalize_locale_tag(locale);
            let language = primary_language(&normalized);
            normalized_locale_lookup.insert(normalized, locale);

            match language_lookup.get(&language) {
                Some(existing) if *existing != locale => {
                    ambiguous_languages.insert(language);
                }
                Some(_) => {}
                None => {
                    language_lookup.insert(language, locale);
                }
            }

            locales.insert(locale, entries.iter().copied().collect::<HashMap<_, _>>());
        }

        for language in ambiguous_languages {
            language_lookup.remove(&language);
        }

        Self {
            default_locale: generated::DEFAULT_LOCALE,
            locales,
            normalized_locale_lookup,
            language_lookup,
        }
    }

    fn resolve_locale(&self, requested: Option<&str>) -> &'static str {
        let Some(requested) = requested else {
            return self.default_locale;
        };

        let normalized = normalize_locale_tag(requested);
        if let Some(locale) = self.normalized_locale_lookup.get(&normalized) {
            return locale;
        }
        self.language_lookup
            .get(&primary_language(&normalized))
            .copied()
            .unwrap_or(self.default_locale)
    }

    fn lookup(&self, locale: &'static str, key: &str) -> Option<&'static str> {
        self.locales
            .get(locale)
            .and_then(|entries| entries.get(key).copied())
    }
}

fn primary_language(normalized: &str) -> String {
    normalized.split('-').next().unwrap_or_default().to_string()
}

fn normalize_locale_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    let without_encoding = trimmed.split('.').next().unwrap_or(trimmed);
    let without_variant = without_encoding
        .split('@')
        .next()
        .unwrap_or(without_encoding);
    without_variant
        .replace('_', "-")
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    let values = params.iter().copied().collect::<HashMap<&str, &str>>();
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            output.push_str(&rest[open..]);
            return output;
        };
        let token = &after_open[..close];
        match values.get(token) {
            Some(value) => output.push_str(value),
            None => output.push_str(&rest[open..open + close + 2]),
        }
        rest = &after_open[close + 1..];
    }

    output.push_str(rest);
    output
}
