//! Presentation strings for MosaicFE.
//!
//! Two embedded `key=value` tables (`locales/en.txt`, `locales/ja.txt`).
//! `t!("key")` resolves against the active language, then English, then
//! returns the key itself. The language never influences editing behaviour.

use std::collections::HashMap;
use std::sync::RwLock;

/// Supported languages: (code, native_name)
pub const LANGUAGES: &[(&str, &str)] = &[("en", "English"), ("ja", "日本語")];

pub const FALLBACK_LANGUAGE: &str = "en";

static I18N: RwLock<Option<I18nState>> = RwLock::new(None);

struct I18nState {
    current_lang: String,
    table: StringTable,
}

/// Locale-keyed lookup table: lang_code → (key → string).
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    translations: HashMap<String, HashMap<String, String>>,
}

impl StringTable {
    /// Table with the embedded locale files.
    pub fn embedded() -> Self {
        let mut table = Self::default();
        table.insert("en", include_str!("../locales/en.txt"));
        table.insert("ja", include_str!("../locales/ja.txt"));
        table
    }

    pub fn insert(&mut self, lang: &str, data: &str) {
        self.translations
            .insert(lang.to_string(), parse_translations(data));
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.translations.contains_key(lang)
    }

    /// Resolve `key` in `lang`, falling back to English, then to `None`.
    pub fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.translations
            .get(lang)
            .and_then(|map| map.get(key))
            .or_else(|| {
                self.translations
                    .get(FALLBACK_LANGUAGE)
                    .and_then(|map| map.get(key))
            })
            .map(String::as_str)
    }
}

/// Install the embedded tables. Safe to call more than once.
pub fn init() {
    if let Ok(mut guard) = I18N.write()
        && guard.is_none()
    {
        *guard = Some(I18nState {
            current_lang: FALLBACK_LANGUAGE.to_string(),
            table: StringTable::embedded(),
        });
    }
}

/// Switch language. Unknown codes select English.
pub fn set_language(code: &str) {
    if let Ok(mut guard) = I18N.write()
        && let Some(state) = guard.as_mut()
    {
        state.current_lang = if state.table.has_language(code) {
            code.to_string()
        } else {
            FALLBACK_LANGUAGE.to_string()
        };
    }
}

pub fn current_language() -> String {
    if let Ok(guard) = I18N.read()
        && let Some(state) = guard.as_ref()
    {
        return state.current_lang.clone();
    }
    FALLBACK_LANGUAGE.to_string()
}

/// Look up `key` in the active language.
pub fn translate(key: &str) -> String {
    if let Ok(guard) = I18N.read()
        && let Some(state) = guard.as_ref()
        && let Some(val) = state.table.lookup(&state.current_lang, key)
    {
        return val.to_string();
    }
    key.to_string()
}

/// Best supported match for the `LANG` family of environment variables.
pub fn detect_system_language() -> String {
    for var in ["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"] {
        if let Ok(val) = std::env::var(var)
            && let Some(lang) = match_system_locale(&val)
        {
            return lang;
        }
    }
    FALLBACK_LANGUAGE.to_string()
}

/// Map "ja_JP.UTF-8", "en-GB", "ja" ... onto a supported code.
pub fn match_system_locale(locale: &str) -> Option<String> {
    let normalized = locale.to_lowercase().replace('_', "-");
    let lang_part = normalized
        .split(['.', '@'])
        .next()
        .unwrap_or(&normalized);
    let primary = lang_part.split('-').next().unwrap_or(lang_part);

    LANGUAGES
        .iter()
        .find(|(code, _)| *code == primary)
        .map(|(code, _)| code.to_string())
}

/// `key=value` per line; `#` comments and blank lines are skipped.
fn parse_translations(data: &str) -> HashMap<String, String> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, val)| (key.trim().to_string(), val.trim().to_string()))
        .collect()
}

/// Translation macro. Usage: `t!("menu.open")` or `t!("status.saved", path = p)`
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::translate($key)
    };
    ($key:expr, $($name:ident = $val:expr),+ $(,)?) => {{
        let mut s = $crate::i18n::translate($key);
        $(
            s = s.replace(concat!("{", stringify!($name), "}"), &format!("{}", $val));
        )+
        s
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_blank_lines() {
        let map = parse_translations("# header\n\nbutton.undo = Undo\nbroken line\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("button.undo").map(String::as_str), Some("Undo"));
    }

    #[test]
    fn lookup_falls_back_to_english() {
        let mut table = StringTable::default();
        table.insert("en", "a=Apple\nb=Banana");
        table.insert("ja", "a=りんご");
        assert_eq!(table.lookup("ja", "a"), Some("りんご"));
        assert_eq!(table.lookup("ja", "b"), Some("Banana"));
        assert_eq!(table.lookup("ja", "missing"), None);
    }

    #[test]
    fn embedded_tables_cover_the_same_keys() {
        let en = parse_translations(include_str!("../locales/en.txt"));
        let ja = parse_translations(include_str!("../locales/ja.txt"));
        let mut missing: Vec<_> = en.keys().filter(|k| !ja.contains_key(*k)).collect();
        missing.sort();
        assert!(missing.is_empty(), "ja.txt is missing {missing:?}");
    }

    #[test]
    fn system_locale_matching() {
        assert_eq!(match_system_locale("ja_JP.UTF-8").as_deref(), Some("ja"));
        assert_eq!(match_system_locale("en-GB").as_deref(), Some("en"));
        assert_eq!(match_system_locale("fr_FR"), None);
    }
}
