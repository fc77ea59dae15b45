//! Active language and its translation map.
//!
//! The store has a single writer (`App::update`); views only ever borrow it.
//! A language switch takes effect for request parameters immediately, while
//! the previously loaded map keeps rendering until the new one arrives, so the
//! UI never goes blank mid-switch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Serializes as the short code; deserializes through [`Language::parse`],
/// so shells and configs may send `telugu` or `te-IN` as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Language {
    #[default]
    En,
    Hi,
    Te,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Te];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Te => "te",
        }
    }

    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Hi => "हिंदी",
            Self::Te => "తెలుగు",
        }
    }

    /// Tag handed to the speech recognizer.
    #[must_use]
    pub const fn speech_tag(self) -> &'static str {
        match self {
            Self::En => "en-IN",
            Self::Hi => "hi-IN",
            Self::Te => "te-IN",
        }
    }

    /// Accepts short codes, English names and region-tagged forms
    /// (`te`, `telugu`, `te-IN`, `TE_in`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().replace('_', "-").to_ascii_lowercase();
        let primary = normalized.split('-').next().unwrap_or_default();
        match primary {
            "en" | "english" => Some(Self::En),
            "hi" | "hindi" => Some(Self::Hi),
            "te" | "telugu" => Some(Self::Te),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language '{0}'")]
pub struct UnknownLanguage(pub String);

impl TryFrom<String> for Language {
    type Error = UnknownLanguage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(UnknownLanguage(value))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A translation entry: either a label or a nested category map. Anything
/// else the backend sends is kept but never returned as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    Text(String),
    Nested(BTreeMap<String, TranslationValue>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Translations(BTreeMap<String, TranslationValue>);

impl Translations {
    #[must_use]
    pub fn new(entries: BTreeMap<String, TranslationValue>) -> Self {
        Self(entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up `key`; dotted keys descend into nested maps
    /// (`categories.agriculture`).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(TranslationValue::Text(text)) = self.0.get(key) {
            return Some(text);
        }

        let mut parts = key.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            match current {
                TranslationValue::Nested(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        match current {
            TranslationValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Minimal map compiled into the core. Installed when the backend map for
    /// a language cannot be loaded so navigation always has labels.
    #[must_use]
    pub fn builtin(language: Language) -> Self {
        let table: &[(&str, &str)] = match language {
            Language::En => EN_LABELS,
            Language::Hi => HI_LABELS,
            Language::Te => TE_LABELS,
        };
        Self(
            table
                .iter()
                .map(|(k, v)| ((*k).to_string(), TranslationValue::Text((*v).to_string())))
                .collect(),
        )
    }
}

const EN_LABELS: &[(&str, &str)] = &[
    ("dashboard_title", "Rural Education Dashboard"),
    ("refresh", "Refresh"),
    ("retry", "Retry"),
    ("loading", "Loading..."),
    ("last_updated", "Last Updated"),
    ("news_today", "Today's News"),
    ("prices_today", "Today's Prices"),
    ("read_more", "Read More"),
    ("per_kg", "per kg"),
    ("per_liter", "per liter"),
    ("per_dozen", "per dozen"),
    ("increase", "increase"),
    ("decrease", "decrease"),
    ("local_mandi", "Mandi"),
    ("location", "Location"),
    ("select_location", "Select Location"),
    ("state", "State"),
    ("city", "City"),
    ("tab_education", "Education"),
    ("tab_agriculture", "Agriculture"),
    ("tab_health", "Health"),
    ("tab_chat", "Chat"),
];

const HI_LABELS: &[(&str, &str)] = &[
    ("dashboard_title", "ग्रामीण शिक्षा डैशबोर्ड"),
    ("refresh", "ताज़ा करें"),
    ("retry", "पुनः प्रयास करें"),
    ("loading", "लोड हो रहा है..."),
    ("last_updated", "अंतिम अपडेट"),
    ("news_today", "आज की खबरें"),
    ("prices_today", "आज के भाव"),
    ("read_more", "पूरा पढ़ें"),
    ("per_kg", "प्रति किलो"),
    ("per_liter", "प्रति लीटर"),
    ("per_dozen", "प्रति दर्जन"),
    ("increase", "वृद्धि"),
    ("decrease", "कमी"),
    ("local_mandi", "मंडी"),
    ("location", "स्थान"),
    ("select_location", "स्थान चुनें"),
    ("state", "राज्य"),
    ("city", "शहर"),
    ("tab_education", "शिक्षा"),
    ("tab_agriculture", "कृषि"),
    ("tab_health", "स्वास्थ्य"),
    ("tab_chat", "चैट"),
];

const TE_LABELS: &[(&str, &str)] = &[
    ("dashboard_title", "గ్రామీణ విద్యా డాష్‌బోర్డ్"),
    ("refresh", "రిఫ్రెష్"),
    ("retry", "మళ్లీ ప్రయత్నించండి"),
    ("loading", "లోడ్ అవుతోంది..."),
    ("last_updated", "చివరిగా నవీకరించబడింది"),
    ("news_today", "నేటి వార్తలు"),
    ("prices_today", "నేటి ధరలు"),
    ("read_more", "మరింత చదవండి"),
    ("per_kg", "కిలోకు"),
    ("per_liter", "లీటరుకు"),
    ("per_dozen", "డజనుకు"),
    ("increase", "పెరుగుదల"),
    ("decrease", "తగ్గుదల"),
    ("local_mandi", "మండి"),
    ("location", "ప్రదేశం"),
    ("select_location", "ప్రదేశం ఎంచుకోండి"),
    ("state", "రాష్ట్రం"),
    ("city", "నగరం"),
    ("tab_education", "విద్య"),
    ("tab_agriculture", "వ్యవసాయం"),
    ("tab_health", "ఆరోగ్యం"),
    ("tab_chat", "చాట్"),
];

/// Request for a translation map, tagged so late answers can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleRequest {
    pub seq: u64,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleStore {
    language: Language,
    translations: Translations,
    translations_language: Language,
    last_seq: u64,
    pending: Option<u64>,
}

impl Default for LocaleStore {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl LocaleStore {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            translations: Translations::builtin(language),
            translations_language: language,
            last_seq: 0,
            pending: None,
        }
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Language of the map currently rendering; lags `language()` while a
    /// switch is in flight.
    #[must_use]
    pub const fn translations_language(&self) -> Language {
        self.translations_language
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Switches the active language. Returns the translation request to
    /// issue, or `None` when nothing changes.
    pub fn set_locale(&mut self, language: Language) -> Option<LocaleRequest> {
        if language == self.language && self.pending.is_none() && self.last_seq > 0 {
            return None;
        }
        self.language = language;
        Some(self.issue())
    }

    /// Unconditionally requests the map for the active language.
    pub fn reload(&mut self) -> LocaleRequest {
        self.issue()
    }

    fn issue(&mut self) -> LocaleRequest {
        self.last_seq += 1;
        self.pending = Some(self.last_seq);
        LocaleRequest {
            seq: self.last_seq,
            language: self.language,
        }
    }

    /// Installs a fetched map wholesale. Returns `false` when `seq` was
    /// superseded by a later switch.
    pub fn apply_translations(&mut self, seq: u64, translations: Translations) -> bool {
        if self.pending != Some(seq) {
            return false;
        }
        self.pending = None;
        self.translations = translations;
        self.translations_language = self.language;
        true
    }

    /// Falls back to the built-in map for the active language.
    pub fn apply_failure(&mut self, seq: u64) -> bool {
        self.apply_translations(seq, Translations::builtin(self.language))
    }

    /// `translations[key]`, or `fallback` when the key is missing.
    #[must_use]
    pub fn get_text<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.translations.get(key).unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod language_tests {
        use super::*;

        #[test]
        fn parse_accepts_aliases() {
            assert_eq!(Language::parse("en"), Some(Language::En));
            assert_eq!(Language::parse("english"), Some(Language::En));
            assert_eq!(Language::parse("Telugu"), Some(Language::Te));
            assert_eq!(Language::parse("te-IN"), Some(Language::Te));
            assert_eq!(Language::parse("hi_IN"), Some(Language::Hi));
            assert_eq!(Language::parse("fr"), None);
            assert_eq!(Language::parse(""), None);
        }

        #[test]
        fn serde_uses_codes() {
            assert_eq!(serde_json::to_string(&Language::Hi).unwrap(), "\"hi\"");
            let parsed: Language = serde_json::from_str("\"te\"").unwrap();
            assert_eq!(parsed, Language::Te);
        }

        #[test]
        fn serde_accepts_names_and_region_tags() {
            for (json, expected) in [
                ("\"english\"", Language::En),
                ("\"telugu\"", Language::Te),
                ("\"Hindi\"", Language::Hi),
                ("\"te-IN\"", Language::Te),
            ] {
                assert_eq!(serde_json::from_str::<Language>(json).unwrap(), expected, "{json}");
            }
            let err = serde_json::from_str::<Language>("\"fr\"").unwrap_err();
            assert!(err.to_string().contains("unsupported language 'fr'"));
        }
    }

    mod translations_tests {
        use super::*;

        #[test]
        fn nested_keys_resolve() {
            let json = r#"{
                "refresh": "Refresh",
                "categories": { "agriculture": "Agriculture", "health": "Health" },
                "version": 3
            }"#;
            let translations: Translations = serde_json::from_str(json).unwrap();
            assert_eq!(translations.get("refresh"), Some("Refresh"));
            assert_eq!(translations.get("categories.health"), Some("Health"));
            assert_eq!(translations.get("categories"), None);
            assert_eq!(translations.get("version"), None);
            assert_eq!(translations.get("refresh.more"), None);
        }

        #[test]
        fn builtin_maps_cover_navigation() {
            for language in Language::ALL {
                let map = Translations::builtin(language);
                for key in ["tab_education", "tab_agriculture", "tab_health", "tab_chat"] {
                    assert!(map.get(key).is_some(), "{language} missing {key}");
                }
            }
        }
    }

    mod store_tests {
        use super::*;

        fn map(entries: &[(&str, &str)]) -> Translations {
            Translations::new(
                entries
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), TranslationValue::Text((*v).to_string())))
                    .collect(),
            )
        }

        #[test]
        fn previous_map_stays_active_until_resolved() {
            let mut store = LocaleStore::new(Language::En);
            let first = store.reload();
            assert!(store.apply_translations(first.seq, map(&[("refresh", "Refresh")])));

            let request = store.set_locale(Language::Te).unwrap();
            assert_eq!(request.language, Language::Te);
            assert_eq!(store.language(), Language::Te);
            assert_eq!(store.translations_language(), Language::En);
            assert_eq!(store.get_text("refresh", "?"), "Refresh");

            assert!(store.apply_translations(request.seq, map(&[("refresh", "రిఫ్రెష్")])));
            assert_eq!(store.get_text("refresh", "?"), "రిఫ్రెష్");
            assert_eq!(store.translations_language(), Language::Te);
        }

        #[test]
        fn replacement_is_wholesale() {
            let mut store = LocaleStore::new(Language::En);
            let r1 = store.reload();
            store.apply_translations(r1.seq, map(&[("a", "A"), ("b", "B")]));
            let r2 = store.set_locale(Language::Hi).unwrap();
            store.apply_translations(r2.seq, map(&[("a", "अ")]));
            assert_eq!(store.get_text("a", "?"), "अ");
            assert_eq!(store.get_text("b", "fallback"), "fallback");
        }

        #[test]
        fn failure_installs_builtin_map() {
            let mut store = LocaleStore::new(Language::En);
            let request = store.set_locale(Language::Hi).unwrap();
            assert!(store.apply_failure(request.seq));
            assert_eq!(store.get_text("tab_health", "Health"), "स्वास्थ्य");
            assert!(!store.is_loading());
        }

        #[test]
        fn superseded_switch_is_discarded() {
            let mut store = LocaleStore::new(Language::En);
            let to_hi = store.set_locale(Language::Hi).unwrap();
            let to_te = store.set_locale(Language::Te).unwrap();

            assert!(store.apply_translations(to_te.seq, map(&[("refresh", "te")])));
            assert!(!store.apply_translations(to_hi.seq, map(&[("refresh", "hi")])));
            assert_eq!(store.get_text("refresh", "?"), "te");
        }

        #[test]
        fn same_language_after_load_is_noop() {
            let mut store = LocaleStore::new(Language::En);
            let request = store.reload();
            store.apply_translations(request.seq, Translations::default());
            assert!(store.set_locale(Language::En).is_none());
        }
    }

    proptest! {
        #[test]
        fn get_text_always_returns_translation_or_fallback(
            key in "[a-z_.]{0,24}",
            fallback in "\\PC{0,16}",
            lang_idx in 0usize..3,
        ) {
            let store = LocaleStore::new(Language::ALL[lang_idx]);
            let text = store.get_text(&key, &fallback);
            match store.translations().get(&key) {
                Some(found) => prop_assert_eq!(text, found),
                None => prop_assert_eq!(text, fallback.as_str()),
            }
        }
    }
}
