//! Static translation tables
//!
//! The `en` table carries every key. Other tables are allowed to be partial;
//! callers fall back to English and then to the key itself.

/// One language's key/value table
pub type Table = &'static [(&'static str, &'static str)];

/// Sample keys used to decide whether a language is mostly untranslated
pub const UNTRANSLATED_SAMPLE_KEYS: [&str; 3] = ["nav.home", "nav.prescriptions", "nav.lab_tests"];

/// Placeholder substituted with a language's display name
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

const EN: Table = &[
    ("app.title", "CareVoice Health"),
    ("nav.home", "Home"),
    ("nav.dashboard", "Dashboard"),
    ("nav.prescriptions", "Prescriptions"),
    ("nav.lab_tests", "Lab Tests"),
    ("nav.reminders", "Reminders"),
    ("nav.exercises", "Exercises"),
    ("nav.profile", "Profile"),
    ("language.select", "Select language"),
    (
        "language.partial",
        "Some text in {language} is not translated yet and will appear in English.",
    ),
    ("speech.listen", "Listen"),
    ("speech.stop", "Stop"),
    (
        "speech.unsupported_language",
        "Speech is not available for {language}. Playback will be in English.",
    ),
    (
        "speech.not_supported",
        "Speech synthesis is not supported on this device.",
    ),
    ("voice.start", "Tap to speak"),
    ("voice.listening", "Listening..."),
    (
        "voice.not_supported",
        "Voice recognition is not supported on this device.",
    ),
    ("voice.no_speech", "No speech detected. Please try again."),
    ("voice.error", "Voice recognition error"),
    ("voice.unmatched", "Sorry, I didn't understand. Try saying:"),
    ("voice.navigating", "Opening"),
    ("prescription.upload", "Upload prescription"),
    ("lab.book", "Book a lab test"),
    ("reminder.add", "Add reminder"),
    ("exercise.start", "Start exercise"),
    ("exercise.posture_ok", "Good posture, keep going"),
    ("profile.edit", "Edit profile"),
];

const HI: Table = &[
    ("app.title", "केयरवॉइस हेल्थ"),
    ("nav.home", "होम"),
    ("nav.dashboard", "डैशबोर्ड"),
    ("nav.prescriptions", "पर्चे"),
    ("nav.lab_tests", "लैब टेस्ट"),
    ("nav.reminders", "रिमाइंडर"),
    ("nav.exercises", "व्यायाम"),
    ("nav.profile", "प्रोफ़ाइल"),
    ("language.select", "भाषा चुनें"),
    (
        "language.partial",
        "{language} में कुछ पाठ का अनुवाद अभी नहीं हुआ है और वह अंग्रेज़ी में दिखेगा।",
    ),
    ("speech.listen", "सुनें"),
    ("speech.stop", "रोकें"),
    (
        "speech.unsupported_language",
        "{language} के लिए आवाज़ उपलब्ध नहीं है। प्लेबैक अंग्रेज़ी में होगा।",
    ),
    (
        "speech.not_supported",
        "इस डिवाइस पर वाक् संश्लेषण समर्थित नहीं है।",
    ),
    ("voice.start", "बोलने के लिए टैप करें"),
    ("voice.listening", "सुन रहा है..."),
    (
        "voice.not_supported",
        "इस डिवाइस पर आवाज़ पहचान समर्थित नहीं है।",
    ),
    ("voice.no_speech", "कोई आवाज़ नहीं मिली। कृपया फिर से प्रयास करें।"),
    ("voice.error", "आवाज़ पहचान में त्रुटि"),
    ("voice.unmatched", "माफ़ कीजिए, मैं समझ नहीं पाया। ऐसे बोलकर देखें:"),
    ("voice.navigating", "खोल रहे हैं"),
];

const BN: Table = &[
    ("nav.home", "হোম"),
    ("nav.prescriptions", "প্রেসক্রিপশন"),
    ("nav.lab_tests", "ল্যাব টেস্ট"),
    ("nav.reminders", "রিমাইন্ডার"),
    ("nav.exercises", "ব্যায়াম"),
    ("nav.profile", "প্রোফাইল"),
    ("language.select", "ভাষা নির্বাচন করুন"),
];

const TE: Table = &[
    ("nav.home", "హోమ్"),
    ("nav.prescriptions", "ప్రిస్క్రిప్షన్లు"),
    ("nav.lab_tests", "ల్యాబ్ పరీక్షలు"),
    ("nav.reminders", "రిమైండర్లు"),
    ("language.select", "భాషను ఎంచుకోండి"),
];

const MR: Table = &[
    ("nav.home", "मुख्यपृष्ठ"),
    ("nav.prescriptions", "प्रिस्क्रिप्शन"),
    ("nav.lab_tests", "लॅब चाचण्या"),
    ("nav.exercises", "व्यायाम"),
    ("language.select", "भाषा निवडा"),
];

const TA: Table = &[
    ("nav.profile", "சுயவிவரம்"),
    ("language.select", "மொழியைத் தேர்ந்தெடுக்கவும்"),
];

const GU: Table = &[("language.select", "ભાષા પસંદ કરો")];

const KN: Table = &[("language.select", "ಭಾಷೆಯನ್ನು ಆಯ್ಕೆಮಾಡಿ")];

const ML: Table = &[("language.select", "ഭാഷ തിരഞ്ഞെടുക്കുക")];

const PA: Table = &[("language.select", "ਭਾਸ਼ਾ ਚੁਣੋ")];

const ES: Table = &[
    ("nav.home", "Inicio"),
    ("nav.dashboard", "Panel"),
    ("nav.prescriptions", "Recetas"),
    ("nav.lab_tests", "Análisis de laboratorio"),
    ("nav.reminders", "Recordatorios"),
    ("nav.exercises", "Ejercicios"),
    ("nav.profile", "Perfil"),
    ("language.select", "Seleccionar idioma"),
    ("voice.listening", "Escuchando..."),
    ("voice.no_speech", "No se detectó voz. Inténtalo de nuevo."),
];

const FR: Table = &[
    ("nav.home", "Accueil"),
    ("nav.dashboard", "Tableau de bord"),
    ("nav.prescriptions", "Ordonnances"),
    ("nav.lab_tests", "Analyses"),
    ("nav.reminders", "Rappels"),
    ("nav.exercises", "Exercices"),
    ("nav.profile", "Profil"),
    ("language.select", "Choisir la langue"),
    ("voice.listening", "Écoute..."),
];

static BUILTIN: &[(&str, Table)] = &[
    ("en", EN),
    ("hi", HI),
    ("bn", BN),
    ("te", TE),
    ("mr", MR),
    ("ta", TA),
    ("gu", GU),
    ("kn", KN),
    ("ml", ML),
    ("pa", PA),
    ("es", ES),
    ("fr", FR),
];

/// Read-only lookup over the translation tables
#[derive(Debug, Clone, Copy)]
pub struct LocalizationStore {
    tables: &'static [(&'static str, Table)],
}

impl Default for LocalizationStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LocalizationStore {
    /// Store over the tables compiled into the crate
    #[must_use]
    pub const fn builtin() -> Self {
        Self { tables: BUILTIN }
    }

    /// Store over caller-provided tables
    #[must_use]
    pub const fn new(tables: &'static [(&'static str, Table)]) -> Self {
        Self { tables }
    }

    fn table(&self, code: &str) -> Option<Table> {
        self.tables
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, table)| *table)
    }

    /// Look up `key` in the `code` table only; no fallback
    #[must_use]
    pub fn get(&self, code: &str, key: &str) -> Option<&'static str> {
        self.table(code)?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Look up `key` for `code`, falling back to English and then to the key
    #[must_use]
    pub fn resolve<'a>(&self, code: &str, key: &'a str) -> &'a str {
        self.get(code, key)
            .or_else(|| self.get(super::DEFAULT_LANGUAGE_CODE, key))
            .unwrap_or(key)
    }

    /// Keys defined for `code`, in table order
    #[must_use]
    pub fn keys(&self, code: &str) -> Vec<&'static str> {
        self.table(code)
            .map(|t| t.iter().map(|(k, _)| *k).collect())
            .unwrap_or_default()
    }

    /// Whether a language shows English for every sample key
    ///
    /// This is a proxy, not a completeness metric: three navigation labels
    /// are resolved with fallback and compared against their English text.
    #[must_use]
    pub fn is_mostly_untranslated(&self, code: &str) -> bool {
        if code == super::DEFAULT_LANGUAGE_CODE {
            return false;
        }

        UNTRANSLATED_SAMPLE_KEYS.iter().all(|key| {
            self.resolve(code, key) == self.resolve(super::DEFAULT_LANGUAGE_CODE, key)
        })
    }
}
