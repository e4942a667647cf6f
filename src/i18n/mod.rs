//! Locale catalogs: translated labels, narration phrasing and alert texts.
//!
//! English and Spanish ship with the binary. A locale tag resolves to the
//! catalog of its primary language subtag, falling back to English.

use crate::error::Result;
use crate::events::Alert;
use serde::Deserialize;
use std::collections::HashMap;

const EN: &str = include_str!("en.toml");
const ES: &str = include_str!("es.toml");

/// Translations for one detector label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelText {
    /// Short name shown on the overlay.
    pub name: String,
    /// Spoken form, usually with an article ("a person").
    pub noun: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Catalog {
    pub language: String,
    pub identify_prefix: String,
    pub object_connector: String,
    #[serde(default)]
    alerts: HashMap<String, String>,
    #[serde(default)]
    labels: HashMap<String, LabelText>,
}

impl Catalog {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Languages with a built-in catalog.
    pub fn builtin_languages() -> &'static [&'static str] {
        &["en", "es"]
    }

    /// Built-in catalog for a locale tag such as `es-MX` or `en_US.UTF-8`.
    pub fn for_locale(locale: &str) -> Result<Self> {
        let source = match primary_language(locale).as_str() {
            "es" => ES,
            _ => EN,
        };
        Self::from_toml(source)
    }

    /// Overlay name for a label; the raw label if untranslated.
    pub fn display_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.labels.get(label).map_or(label, |t| t.name.as_str())
    }

    /// Spoken form of a label; the raw label if untranslated.
    pub fn noun<'a>(&'a self, label: &'a str) -> &'a str {
        self.labels.get(label).map_or(label, |t| t.noun.as_str())
    }

    pub fn alert(&self, alert: Alert) -> String {
        self.alerts
            .get(alert.key())
            .cloned()
            .unwrap_or_else(|| alert.key().replace('_', " "))
    }

    /// Join labels into a spoken list.
    ///
    /// One label is spoken alone. More are joined with `", "` and the last
    /// one is attached with `", <connector> "`.
    pub fn join_objects(&self, labels: &[String]) -> Option<String> {
        let nouns: Vec<&str> = labels.iter().map(|l| self.noun(l)).collect();
        match nouns.split_last() {
            None => None,
            Some((only, [])) => Some((*only).to_string()),
            Some((last, rest)) => Some(format!(
                "{}, {} {}",
                rest.join(", "),
                self.object_connector,
                last
            )),
        }
    }

    /// The full narration sentence, or `None` when nothing is pending.
    pub fn narration_sentence(&self, labels: &[String]) -> Option<String> {
        self.join_objects(labels)
            .map(|objects| format!("{} {}.", self.identify_prefix, objects))
    }
}

/// Normalize `en_US.UTF-8` style tags to BCP 47 form (`en-US`).
pub fn normalize_locale(tag: &str) -> String {
    let base = tag.split(['.', '@']).next().unwrap_or(tag).trim();
    let mut parts = base.split(['-', '_']).filter(|p| !p.is_empty());
    let Some(language) = parts.next() else {
        return String::new();
    };
    let mut out = language.to_ascii_lowercase();
    for part in parts {
        out.push('-');
        if part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()) {
            out.push_str(&part.to_ascii_uppercase());
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Primary language subtag, lowercased (`es-MX` → `es`).
pub fn primary_language(tag: &str) -> String {
    normalize_locale(tag)
        .split('-')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Locale from the process environment (`LC_ALL`, `LC_MESSAGES`, `LANG`).
///
/// The POSIX `C` locale counts as unset.
pub fn locale_from_env() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| normalize_locale(&value))
        .find(|tag| !tag.is_empty() && tag != "c" && tag != "posix")
}
