//! Supported UI and speech languages

use serde::Serialize;

/// A supported language
///
/// `code` is the ISO-639-1 UI code and is unique across the catalog.
/// `speech_code` is the BCP-47 tag handed to the speech engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Language {
    /// ISO-639-1 code (e.g. "en", "hi")
    pub code: &'static str,
    /// English display name
    pub display_name: &'static str,
    /// Name in the language itself
    pub native_name: &'static str,
    /// BCP-47 speech tag (e.g. "en-US")
    pub speech_code: &'static str,
}

/// Code of the default language
pub const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Fixed language catalog
pub static LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        display_name: "English",
        native_name: "English",
        speech_code: "en-US",
    },
    Language {
        code: "hi",
        display_name: "Hindi",
        native_name: "हिन्दी",
        speech_code: "hi-IN",
    },
    Language {
        code: "bn",
        display_name: "Bengali",
        native_name: "বাংলা",
        speech_code: "bn-IN",
    },
    Language {
        code: "te",
        display_name: "Telugu",
        native_name: "తెలుగు",
        speech_code: "te-IN",
    },
    Language {
        code: "mr",
        display_name: "Marathi",
        native_name: "मराठी",
        speech_code: "mr-IN",
    },
    Language {
        code: "ta",
        display_name: "Tamil",
        native_name: "தமிழ்",
        speech_code: "ta-IN",
    },
    Language {
        code: "gu",
        display_name: "Gujarati",
        native_name: "ગુજરાતી",
        speech_code: "gu-IN",
    },
    Language {
        code: "kn",
        display_name: "Kannada",
        native_name: "ಕನ್ನಡ",
        speech_code: "kn-IN",
    },
    Language {
        code: "ml",
        display_name: "Malayalam",
        native_name: "മലയാളം",
        speech_code: "ml-IN",
    },
    Language {
        code: "pa",
        display_name: "Punjabi",
        native_name: "ਪੰਜਾਬੀ",
        speech_code: "pa-IN",
    },
    Language {
        code: "es",
        display_name: "Spanish",
        native_name: "Español",
        speech_code: "es-ES",
    },
    Language {
        code: "fr",
        display_name: "French",
        native_name: "Français",
        speech_code: "fr-FR",
    },
];

impl Language {
    /// Look up a catalog entry by its UI code (case-insensitive)
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        LANGUAGES
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
            .copied()
    }

    /// The default language (English)
    #[must_use]
    pub fn default_language() -> Self {
        LANGUAGES[0]
    }

    /// Whether this is the default language
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.code == DEFAULT_LANGUAGE_CODE
    }

    /// All catalog entries in display order
    #[must_use]
    pub fn all() -> &'static [Self] {
        LANGUAGES
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::default_language()
    }
}

/// Derive a two-letter language prefix from a runtime locale string
///
/// Accepts POSIX (`hi_IN.UTF-8`, `ta_IN@latin`) and BCP-47 (`en-GB`) shapes.
/// Returns `None` for `C`/`POSIX` and anything shorter than two letters.
#[must_use]
pub fn locale_prefix(locale: &str) -> Option<String> {
    let locale = locale.trim();
    if locale.eq_ignore_ascii_case("c") || locale.eq_ignore_ascii_case("posix") {
        return None;
    }

    let prefix: String = locale.chars().take(2).collect();
    if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(prefix.to_ascii_lowercase())
    } else {
        None
    }
}

/// Read the process locale the way POSIX resolves it
#[must_use]
pub fn runtime_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_has_twelve_unique_codes() {
        assert_eq!(LANGUAGES.len(), 12);
        let codes: HashSet<_> = LANGUAGES.iter().map(|l| l.code).collect();
        assert_eq!(codes.len(), LANGUAGES.len());
    }

    #[test]
    fn default_is_english() {
        let lang = Language::default();
        assert_eq!(lang.code, "en");
        assert_eq!(lang.speech_code, "en-US");
        assert!(lang.is_default());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Language::from_code("HI").map(|l| l.code), Some("hi"));
        assert_eq!(Language::from_code(" ta ").map(|l| l.code), Some("ta"));
        assert!(Language::from_code("xx").is_none());
    }

    #[test]
    fn locale_prefix_shapes() {
        assert_eq!(locale_prefix("hi_IN.UTF-8").as_deref(), Some("hi"));
        assert_eq!(locale_prefix("en-GB").as_deref(), Some("en"));
        assert_eq!(locale_prefix("FR").as_deref(), Some("fr"));
        assert_eq!(locale_prefix("C"), None);
        assert_eq!(locale_prefix("POSIX"), None);
        assert_eq!(locale_prefix("e"), None);
    }
}
