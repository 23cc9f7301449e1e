//! Language catalog and translation tables

mod catalog;
mod translations;

pub use catalog::{DEFAULT_LANGUAGE_CODE, LANGUAGES, Language, locale_prefix, runtime_locale};
pub use translations::{
    LANGUAGE_PLACEHOLDER, LocalizationStore, Table, UNTRANSLATED_SAMPLE_KEYS,
};
