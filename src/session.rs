//! Active language session
//!
//! Owns the current [`Language`], persists it under the `language` key and
//! broadcasts changes over a [`watch`] channel. A session only exists once
//! initialized; build it with [`LanguageSession::builder`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::host::{LocaleSink, Notifier, Severity, TracingLocaleSink, TracingNotifier};
use crate::i18n::{LANGUAGE_PLACEHOLDER, Language, LocalizationStore, locale_prefix};
use crate::store::{LANGUAGE_KEY, PreferenceStore};

/// Shared handle to the language session
#[derive(Clone)]
pub struct LanguageSession {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn PreferenceStore>,
    locale_sink: Arc<dyn LocaleSink>,
    notifier: Arc<dyn Notifier>,
    localization: LocalizationStore,
    current: watch::Sender<Language>,
    speech_supported: bool,
}

/// Collects collaborators before the one-time initialization
pub struct SessionBuilder {
    store: Arc<dyn PreferenceStore>,
    locale_sink: Arc<dyn LocaleSink>,
    notifier: Arc<dyn Notifier>,
    localization: LocalizationStore,
    runtime_locale: Option<String>,
    speech_supported: bool,
}

impl SessionBuilder {
    /// Document locale attribute collaborator
    #[must_use]
    pub fn locale_sink(mut self, sink: Arc<dyn LocaleSink>) -> Self {
        self.locale_sink = sink;
        self
    }

    /// Toast collaborator for the untranslated-language advisory
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Translation tables (defaults to the built-in ones)
    #[must_use]
    pub const fn localization(mut self, localization: LocalizationStore) -> Self {
        self.localization = localization;
        self
    }

    /// Runtime locale used when nothing is stored (e.g. `hi_IN.UTF-8`)
    #[must_use]
    pub fn runtime_locale(mut self, locale: Option<String>) -> Self {
        self.runtime_locale = locale;
        self
    }

    /// Result of probing for a speech synthesis capability
    #[must_use]
    pub const fn speech_supported(mut self, supported: bool) -> Self {
        self.speech_supported = supported;
        self
    }

    /// Resolve the initial language and create the session
    ///
    /// Priority: stored code, then the runtime locale prefix, then English.
    /// A resolved code that is not in the catalog resets to English.
    #[must_use]
    pub fn initialize(self) -> LanguageSession {
        let stored = match self.store.get(LANGUAGE_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored language");
                None
            }
        };

        let candidate = stored.or_else(|| self.runtime_locale.as_deref().and_then(locale_prefix));
        let language = match candidate.as_deref() {
            Some(code) => Language::from_code(code).unwrap_or_else(|| {
                tracing::debug!(code, "unsupported language code, using default");
                Language::default()
            }),
            None => Language::default(),
        };

        self.locale_sink.set_locale(language.code);
        tracing::info!(
            language = language.code,
            speech_supported = self.speech_supported,
            "language session initialized"
        );

        let (current, _) = watch::channel(language);
        LanguageSession {
            inner: Arc::new(Inner {
                store: self.store,
                locale_sink: self.locale_sink,
                notifier: self.notifier,
                localization: self.localization,
                current,
                speech_supported: self.speech_supported,
            }),
        }
    }
}

impl LanguageSession {
    /// Start building a session over a durable store
    #[must_use]
    pub fn builder(store: Arc<dyn PreferenceStore>) -> SessionBuilder {
        SessionBuilder {
            store,
            locale_sink: Arc::new(TracingLocaleSink),
            notifier: Arc::new(TracingNotifier),
            localization: LocalizationStore::builtin(),
            runtime_locale: None,
            speech_supported: false,
        }
    }

    /// The active language
    #[must_use]
    pub fn current(&self) -> Language {
        *self.inner.current.borrow()
    }

    /// Replace the active language
    ///
    /// Persists the code, updates the document locale and wakes subscribers.
    /// Re-selecting the current language only re-persists it.
    pub fn set_current(&self, language: Language) {
        let Some(language) = Language::from_code(language.code) else {
            tracing::warn!(code = language.code, "ignoring language outside the catalog");
            return;
        };

        if let Err(e) = self.inner.store.set(LANGUAGE_KEY, language.code) {
            tracing::warn!(error = %e, language = language.code, "failed to persist language");
        }
        self.inner.locale_sink.set_locale(language.code);

        let changed = self.inner.current.send_if_modified(|current| {
            if current.code == language.code {
                false
            } else {
                *current = language;
                true
            }
        });

        if !changed {
            tracing::debug!(language = language.code, "language unchanged");
            return;
        }

        tracing::info!(language = language.code, "language changed");

        if self.inner.localization.is_mostly_untranslated(language.code) {
            let message = self.message_for(language, "language.partial");
            self.inner.notifier.notify(&message, Severity::Info);
        }
    }

    /// Translate `key` in the active language
    ///
    /// Falls back to English, then to the key itself.
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        self.inner
            .localization
            .resolve(self.current().code, key)
            .to_string()
    }

    /// Translate `key` for `language`, substituting its display name
    #[must_use]
    pub fn message_for(&self, language: Language, key: &str) -> String {
        self.inner
            .localization
            .resolve(language.code, key)
            .replace(LANGUAGE_PLACEHOLDER, language.display_name)
    }

    /// Whether speech synthesis was available at startup
    #[must_use]
    pub fn is_speech_supported(&self) -> bool {
        self.inner.speech_supported
    }

    /// Receive every subsequent language change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Language> {
        self.inner.current.subscribe()
    }
}

impl std::fmt::Debug for LanguageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageSession")
            .field("current", &self.current().code)
            .field("speech_supported", &self.inner.speech_supported)
            .finish_non_exhaustive()
    }
}
